//! Expansion of compact interval blocks into concrete segments.

use crate::workouts::types::{Segment, SegmentKind};

/// Parse-time description of a repeating on/off block.
#[derive(Debug, Clone, PartialEq)]
pub struct IntervalSpec {
    /// Number of work blocks (at least 1)
    pub repeat: u32,
    /// Work block duration in seconds
    pub on_duration: u32,
    /// Recovery duration in seconds; 0 means back-to-back work blocks
    pub off_duration: u32,
    pub on_high: f64,
    pub on_low: f64,
    pub off_high: f64,
    pub off_low: f64,
}

impl Default for IntervalSpec {
    fn default() -> Self {
        Self {
            repeat: 1,
            on_duration: 60,
            off_duration: 60,
            on_high: 1.0,
            on_low: 1.0,
            off_high: 0.5,
            off_low: 0.5,
        }
    }
}

impl IntervalSpec {
    /// Number of segments [`expand`] produces for this spec.
    pub fn segment_count(&self) -> usize {
        let repeat = self.repeat.max(1) as usize;
        if self.off_duration > 0 {
            2 * repeat - 1
        } else {
            repeat
        }
    }

    /// Total duration of the expanded block, saturating at `u32::MAX`.
    pub fn total_duration(&self) -> u32 {
        let repeat = self.repeat.max(1);
        let recoveries = if self.off_duration > 0 { repeat - 1 } else { 0 };
        repeat
            .saturating_mul(self.on_duration)
            .saturating_add(recoveries.saturating_mul(self.off_duration))
    }
}

/// Expand an interval block starting at `start_time`.
///
/// Work blocks are always sampled at `on_high` and recoveries at `off_high`;
/// the low variants are carried for parsing only. No recovery follows the
/// last work block.
pub fn expand(spec: &IntervalSpec, start_time: u32) -> Vec<Segment> {
    let repeat = spec.repeat.max(1);
    let mut segments = Vec::with_capacity(spec.segment_count());
    let mut current_time = start_time;

    for i in 0..repeat {
        segments.push(Segment::flat(
            SegmentKind::IntervalOn,
            current_time,
            spec.on_duration,
            spec.on_high,
        ));
        current_time += spec.on_duration;

        if i < repeat - 1 && spec.off_duration > 0 {
            segments.push(Segment::flat(
                SegmentKind::IntervalOff,
                current_time,
                spec.off_duration,
                spec.off_high,
            ));
            current_time += spec.off_duration;
        }
    }

    segments
}
