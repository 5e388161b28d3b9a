//! Workout edit engine.
//!
//! Holds the single current workout, the snapshot taken at load time and a
//! bounded undo stack. Every operation validates first, snapshots, mutates,
//! and then regenerates curves and TSS, so callers only ever see a
//! consistent workout.

use crate::workouts::history::EditHistory;
use crate::workouts::types::{EngineError, PowerShape, Segment, ValidationError, Workout};

/// Shortest allowed segment, in seconds.
pub const MIN_DURATION_SECONDS: u32 = 1;
/// Longest allowed segment, in seconds.
pub const MAX_DURATION_SECONDS: u32 = 7200;
/// Lowest editable power, in percent of FTP.
pub const MIN_POWER_PERCENT: u32 = 1;
/// Highest editable power, in percent of FTP.
pub const MAX_POWER_PERCENT: u32 = 300;
/// Largest accepted scale factor.
pub const MAX_SCALE_FACTOR: f64 = 3.0;

/// Requested changes to one segment.
///
/// Powers are whole percentages of FTP; `None` keeps the current value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SegmentEdit {
    pub duration: u32,
    pub power: Option<u32>,
    pub power_low: Option<u32>,
    pub power_high: Option<u32>,
}

impl SegmentEdit {
    /// Change only the duration.
    pub fn duration(duration: u32) -> Self {
        Self {
            duration,
            ..Default::default()
        }
    }

    /// Set a flat power.
    pub fn with_power(mut self, percent: u32) -> Self {
        self.power = Some(percent);
        self
    }

    /// Set both ends of a ramp.
    pub fn with_range(mut self, low: u32, high: u32) -> Self {
        self.power_low = Some(low);
        self.power_high = Some(high);
        self
    }
}

fn check_power(field: &'static str, value: u32) -> Result<f64, ValidationError> {
    if (MIN_POWER_PERCENT..=MAX_POWER_PERCENT).contains(&value) {
        Ok(value as f64 / 100.0)
    } else {
        Err(ValidationError::PowerOutOfRange { field, value })
    }
}

fn percent(fraction: f64) -> u32 {
    (fraction * 100.0).round().max(0.0) as u32
}

/// Check an edit against a segment and return the power it would end up with.
pub fn validate_edit(segment: &Segment, edit: &SegmentEdit) -> Result<PowerShape, ValidationError> {
    if !(MIN_DURATION_SECONDS..=MAX_DURATION_SECONDS).contains(&edit.duration) {
        return Err(ValidationError::DurationOutOfRange(edit.duration));
    }

    match segment.power {
        PowerShape::Flat { power } => {
            let rejected = edit
                .power_low
                .map(|_| "power_low")
                .or(edit.power_high.map(|_| "power_high"));
            if let Some(field) = rejected {
                return Err(ValidationError::FieldNotApplicable {
                    field,
                    kind: segment.kind,
                });
            }

            let power = match edit.power {
                Some(value) => check_power("power", value)?,
                None => power,
            };
            Ok(PowerShape::Flat { power })
        }
        PowerShape::Ramp { low, high } => {
            if edit.power.is_some() {
                return Err(ValidationError::FieldNotApplicable {
                    field: "power",
                    kind: segment.kind,
                });
            }

            let low = match edit.power_low {
                Some(value) => check_power("power_low", value)?,
                None => low,
            };
            let high = match edit.power_high {
                Some(value) => check_power("power_high", value)?,
                None => high,
            };
            if low > high {
                return Err(ValidationError::InvertedRange {
                    low: percent(low),
                    high: percent(high),
                });
            }
            Ok(PowerShape::Ramp { low, high })
        }
    }
}

/// Edit engine for one workout.
#[derive(Debug, Default)]
pub struct EditEngine {
    current: Option<Workout>,
    original: Option<Workout>,
    history: EditHistory,
    selected_segment: Option<usize>,
}

impl EditEngine {
    /// Create an engine with nothing loaded.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine with a custom undo depth.
    pub fn with_history_capacity(capacity: usize) -> Self {
        Self {
            history: EditHistory::with_capacity(capacity),
            ..Default::default()
        }
    }

    /// Make `workout` both the current and the original workout.
    pub fn load(&mut self, workout: Workout) {
        tracing::info!(
            "Loaded {:?} ({} segments, {}s, TSS {})",
            workout.name,
            workout.segments.len(),
            workout.total_duration,
            workout.tss
        );
        self.original = Some(workout.clone());
        self.current = Some(workout);
        self.history.clear();
        self.selected_segment = None;
    }

    /// Current workout, if one is loaded.
    pub fn current(&self) -> Option<&Workout> {
        self.current.as_ref()
    }

    /// Workout as it was when loaded.
    pub fn original(&self) -> Option<&Workout> {
        self.original.as_ref()
    }

    /// Whether a workout is loaded.
    pub fn is_loaded(&self) -> bool {
        self.current.is_some()
    }

    /// Number of edits that can be undone.
    pub fn undo_depth(&self) -> usize {
        self.history.len()
    }

    /// Undo history, oldest first.
    pub fn history(&self) -> &EditHistory {
        &self.history
    }

    pub fn selected_segment(&self) -> Option<usize> {
        self.selected_segment
    }

    /// Select a segment for editing.
    pub fn select_segment(&mut self, index: usize) -> Result<(), EngineError> {
        let workout = self.current.as_ref().ok_or(EngineError::NoWorkoutLoaded)?;
        if index >= workout.segments.len() {
            return Err(ValidationError::SegmentOutOfRange {
                index,
                len: workout.segments.len(),
            }
            .into());
        }
        self.selected_segment = Some(index);
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.selected_segment = None;
    }

    /// Multiply the power of every segment except warmups and cooldowns.
    pub fn scale(&mut self, factor: f64) -> Result<(), EngineError> {
        let workout = self.current.as_mut().ok_or(EngineError::NoWorkoutLoaded)?;
        if !factor.is_finite() || factor <= 0.0 || factor > MAX_SCALE_FACTOR {
            return Err(ValidationError::InvalidScaleFactor(factor).into());
        }

        self.history
            .push(format!("Scale x{:.2}", factor), workout.clone());

        for segment in workout
            .segments
            .iter_mut()
            .filter(|s| !s.kind.is_warmup_or_cooldown())
        {
            segment.power = segment.power.scaled(factor);
        }
        workout.refresh_derived();

        tracing::info!("Scaled workout by {:.2}, TSS now {}", factor, workout.tss);
        Ok(())
    }

    /// Replace the duration and power of one segment.
    ///
    /// A duration change moves every following segment by the same amount.
    pub fn edit_segment(&mut self, index: usize, edit: SegmentEdit) -> Result<(), EngineError> {
        let workout = self.current.as_mut().ok_or(EngineError::NoWorkoutLoaded)?;
        let len = workout.segments.len();
        let segment = workout
            .segments
            .get(index)
            .ok_or(ValidationError::SegmentOutOfRange { index, len })?;
        let power = validate_edit(segment, &edit)?;

        self.history
            .push(format!("Edit segment {}", index + 1), workout.clone());

        let shift = i64::from(edit.duration) - i64::from(workout.segments[index].duration);
        let target = &mut workout.segments[index];
        target.duration = edit.duration;
        target.power = power;

        if shift != 0 {
            for following in workout.segments.iter_mut().skip(index + 1) {
                following.start_time = (i64::from(following.start_time) + shift).max(0) as u32;
            }
        }
        workout.refresh_derived();

        tracing::info!(
            "Edited segment {} ({}s), total {}s, TSS {}",
            index,
            edit.duration,
            workout.total_duration,
            workout.tss
        );
        Ok(())
    }

    /// Restore the workout as it was before the last edit.
    pub fn undo(&mut self) -> Result<(), EngineError> {
        if self.current.is_none() {
            return Err(EngineError::NoWorkoutLoaded);
        }
        let entry = self.history.pop().ok_or(EngineError::NothingToUndo)?;

        if let Some(index) = self.selected_segment {
            if index >= entry.snapshot.segments.len() {
                self.selected_segment = None;
            }
        }
        self.current = Some(entry.snapshot);

        tracing::info!("Undid {:?}", entry.label);
        Ok(())
    }

    /// Restore the workout captured at load time and forget all edits.
    pub fn reset(&mut self) -> Result<(), EngineError> {
        let original = self.original.as_ref().ok_or(EngineError::NoWorkoutLoaded)?;
        self.current = Some(original.clone());
        self.history.clear();
        self.selected_segment = None;

        tracing::info!("Reset workout to original");
        Ok(())
    }
}
