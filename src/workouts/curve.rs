//! Power-curve sampling for charting.
//!
//! One sample roughly every ten seconds, never fewer than the two endpoints.
//! Powers come out as percentages of FTP; this is the only place the model's
//! fractions are converted.

use crate::workouts::types::{PowerSample, PowerShape, Segment};

/// Seconds between consecutive samples.
pub const SAMPLE_INTERVAL_SECONDS: u32 = 10;

/// Number of samples for a segment of the given duration.
pub fn point_count(duration: u32) -> usize {
    (duration / SAMPLE_INTERVAL_SECONDS).max(2) as usize
}

/// Lazy, finite sequence of evenly spaced samples over one segment.
#[derive(Debug, Clone)]
pub struct CurveSampler {
    start_time: f64,
    duration: f64,
    from: f64,
    to: f64,
    points: usize,
    next: usize,
}

impl CurveSampler {
    fn new(start_time: u32, duration: u32, from: f64, to: f64) -> Self {
        Self {
            start_time: start_time as f64,
            duration: duration as f64,
            from,
            to,
            points: point_count(duration),
            next: 0,
        }
    }
}

impl Iterator for CurveSampler {
    type Item = PowerSample;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.points {
            return None;
        }

        let i = self.next as f64;
        let last = (self.points - 1) as f64;
        let progress = i / last;
        let power = self.from + (self.to - self.from) * progress;

        self.next += 1;
        Some(PowerSample {
            time: self.start_time + (i * self.duration / last),
            power: power * 100.0,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.points - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for CurveSampler {}

/// Sample a constant-power block.
pub fn sample_steady(start_time: u32, duration: u32, power: f64) -> CurveSampler {
    CurveSampler::new(start_time, duration, power, power)
}

/// Sample a linear ramp from `low` to `high`.
pub fn sample_ramp(start_time: u32, duration: u32, low: f64, high: f64) -> CurveSampler {
    CurveSampler::new(start_time, duration, low, high)
}

/// Sample a segment according to its power shape.
pub fn sample_segment(segment: &Segment) -> CurveSampler {
    match segment.power {
        PowerShape::Flat { power } => sample_steady(segment.start_time, segment.duration, power),
        PowerShape::Ramp { low, high } => {
            sample_ramp(segment.start_time, segment.duration, low, high)
        }
    }
}
