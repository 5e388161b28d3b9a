//! Workout types and enums.
//!
//! The model is a flat, time-ordered list of [`Segment`]s owned by a
//! [`Workout`]. Power is stored as a fraction of FTP; only the sampled curve
//! carries percentages.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::workouts::curve::sample_segment;
use crate::workouts::tss::compute_tss;

/// Power used for free rides and for segments that carry no power at all.
pub const DEFAULT_POWER: f64 = 0.6;

/// Longest workout accepted from any import path, in seconds (24 hours).
pub const MAX_WORKOUT_SECONDS: u32 = 86_400;

/// Kind of workout segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SegmentKind {
    /// Gradual power increase
    Warmup,
    /// Gradual power decrease
    Cooldown,
    /// Constant power
    SteadyState,
    /// Linear power change
    Ramp,
    /// Self-selected effort, planned at a fixed power
    FreeRide,
    /// Work block of an expanded interval set
    #[serde(rename = "Interval (On)", alias = "IntervalOn")]
    IntervalOn,
    /// Recovery block of an expanded interval set
    #[serde(rename = "Interval (Off)", alias = "IntervalOff")]
    IntervalOff,
    /// Anything the engine does not recognise (only reachable through JSON)
    #[serde(other)]
    Unknown,
}

impl SegmentKind {
    /// Warmup, cooldown and ramp segments carry a low/high power pair.
    pub fn is_ramp_shaped(&self) -> bool {
        matches!(
            self,
            SegmentKind::Warmup | SegmentKind::Cooldown | SegmentKind::Ramp
        )
    }

    /// Warmups and cooldowns are left alone by whole-workout scaling.
    pub fn is_warmup_or_cooldown(&self) -> bool {
        matches!(self, SegmentKind::Warmup | SegmentKind::Cooldown)
    }
}

impl std::fmt::Display for SegmentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SegmentKind::Warmup => write!(f, "Warmup"),
            SegmentKind::Cooldown => write!(f, "Cooldown"),
            SegmentKind::SteadyState => write!(f, "SteadyState"),
            SegmentKind::Ramp => write!(f, "Ramp"),
            SegmentKind::FreeRide => write!(f, "FreeRide"),
            SegmentKind::IntervalOn => write!(f, "Interval (On)"),
            SegmentKind::IntervalOff => write!(f, "Interval (Off)"),
            SegmentKind::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Planned power of a segment, as fractions of FTP (1.0 = 100% FTP).
///
/// Values are not clamped here; bounds are enforced by the edit engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PowerShape {
    /// One power for the whole segment
    Flat { power: f64 },
    /// Linear change from `low` at the start to `high` at the end
    Ramp { low: f64, high: f64 },
}

impl PowerShape {
    /// Power used by TSS and by single-value exports.
    pub fn representative(&self) -> f64 {
        match *self {
            PowerShape::Flat { power } => power,
            PowerShape::Ramp { low, high } => (low + high) / 2.0,
        }
    }

    /// Power at the first and last instant of the segment.
    pub fn bounds(&self) -> (f64, f64) {
        match *self {
            PowerShape::Flat { power } => (power, power),
            PowerShape::Ramp { low, high } => (low, high),
        }
    }

    /// True when both shapes describe the same power within a rounding slack.
    pub fn approx_eq(&self, other: &PowerShape) -> bool {
        let (a_low, a_high) = self.bounds();
        let (b_low, b_high) = other.bounds();
        (a_low - b_low).abs() < 1e-9 && (a_high - b_high).abs() < 1e-9
    }

    /// Multiply every power field, rounding to a whole percentage.
    pub fn scaled(&self, factor: f64) -> Self {
        let scale = |p: f64| (p * factor * 100.0).round() / 100.0;
        match *self {
            PowerShape::Flat { power } => PowerShape::Flat {
                power: scale(power),
            },
            PowerShape::Ramp { low, high } => PowerShape::Ramp {
                low: scale(low),
                high: scale(high),
            },
        }
    }
}

/// One point of a segment's power curve.
///
/// `time` is absolute seconds, `power` is a percentage of FTP.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerSample {
    #[serde(rename = "x")]
    pub time: f64,
    #[serde(rename = "y")]
    pub power: f64,
}

/// A single segment within a workout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SegmentRecord", into = "SegmentRecord")]
pub struct Segment {
    /// Kind of segment
    pub kind: SegmentKind,
    /// Absolute start within the workout, in seconds
    pub start_time: u32,
    /// Duration in seconds
    pub duration: u32,
    /// Planned power
    pub power: PowerShape,
    /// Sampled curve, regenerated whenever power or timing changes
    pub curve: Vec<PowerSample>,
}

impl Segment {
    /// Create a constant-power segment with its curve sampled.
    pub fn flat(kind: SegmentKind, start_time: u32, duration: u32, power: f64) -> Self {
        Self::with_shape(kind, start_time, duration, PowerShape::Flat { power })
    }

    /// Create a ramp-shaped segment with its curve sampled.
    pub fn ramp(kind: SegmentKind, start_time: u32, duration: u32, low: f64, high: f64) -> Self {
        Self::with_shape(kind, start_time, duration, PowerShape::Ramp { low, high })
    }

    /// Create a segment of any shape with its curve sampled.
    pub fn with_shape(kind: SegmentKind, start_time: u32, duration: u32, power: PowerShape) -> Self {
        let mut segment = Self {
            kind,
            start_time,
            duration,
            power,
            curve: Vec::new(),
        };
        segment.resample();
        segment
    }

    /// End of the segment in absolute seconds.
    pub fn end_time(&self) -> u32 {
        self.start_time + self.duration
    }

    /// Throw away the curve and sample it again from the current fields.
    pub fn resample(&mut self) {
        self.curve = sample_segment(self).collect();
    }
}

/// Wire shape of a segment in the workout JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SegmentRecord {
    #[serde(rename = "type")]
    kind: SegmentKind,
    #[serde(default)]
    start_time: u32,
    #[serde(default)]
    duration: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    power: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    power_low: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    power_high: Option<f64>,
    #[serde(default)]
    power_data: Vec<PowerSample>,
}

impl TryFrom<SegmentRecord> for Segment {
    type Error = String;

    fn try_from(record: SegmentRecord) -> Result<Self, Self::Error> {
        let end = u64::from(record.start_time) + u64::from(record.duration);
        if end > u64::from(MAX_WORKOUT_SECONDS) {
            return Err(format!(
                "segment ending at {}s exceeds the {}s limit",
                end, MAX_WORKOUT_SECONDS
            ));
        }

        let power = match (record.power, record.power_low, record.power_high) {
            (_, Some(low), Some(high)) => PowerShape::Ramp { low, high },
            (Some(power), _, _) => PowerShape::Flat { power },
            _ => PowerShape::Flat {
                power: DEFAULT_POWER,
            },
        };

        let mut segment = Segment {
            kind: record.kind,
            start_time: record.start_time,
            duration: record.duration,
            power,
            curve: record.power_data,
        };
        if segment.curve.is_empty() {
            segment.resample();
        }
        Ok(segment)
    }
}

impl From<Segment> for SegmentRecord {
    fn from(segment: Segment) -> Self {
        let (power, power_low, power_high) = match segment.power {
            PowerShape::Flat { power } => (Some(power), None, None),
            PowerShape::Ramp { low, high } => (None, Some(low), Some(high)),
        };
        SegmentRecord {
            kind: segment.kind,
            start_time: segment.start_time,
            duration: segment.duration,
            power,
            power_low,
            power_high,
            power_data: segment.curve,
        }
    }
}

/// Sport the workout is written for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sport {
    #[default]
    Bike,
    Run,
}

impl Sport {
    /// Map a `sportType` value, falling back to bike for anything unknown.
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "run" => Sport::Run,
            "bike" => Sport::Bike,
            other => {
                tracing::warn!("Unknown sport type {:?}, assuming bike", other);
                Sport::Bike
            }
        }
    }
}

impl std::fmt::Display for Sport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sport::Bike => write!(f, "bike"),
            Sport::Run => write!(f, "run"),
        }
    }
}

fn default_name() -> String {
    "Unnamed Workout".to_string()
}

fn default_description() -> String {
    "No description".to_string()
}

fn default_author() -> String {
    "Unknown".to_string()
}

/// A structured training workout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workout {
    /// Workout name
    #[serde(default = "default_name")]
    pub name: String,
    /// Free-text description
    #[serde(default = "default_description")]
    pub description: String,
    /// Workout creator
    #[serde(default = "default_author")]
    pub author: String,
    /// Sport type
    #[serde(rename = "sportType", default)]
    pub sport: Sport,
    /// Total duration in seconds (end of the last segment)
    pub total_duration: u32,
    /// Time-ordered, non-overlapping segments
    pub segments: Vec<Segment>,
    /// Training Stress Score
    pub tss: u32,
}

impl Workout {
    /// Create a workout from already-timed segments, deriving totals and TSS.
    pub fn new(name: String, segments: Vec<Segment>) -> Self {
        let mut workout = Self {
            name,
            description: default_description(),
            author: default_author(),
            sport: Sport::default(),
            total_duration: 0,
            segments,
            tss: 0,
        };
        workout.refresh_totals();
        workout
    }

    /// Recompute total duration and TSS from the segment list.
    pub fn refresh_totals(&mut self) {
        self.total_duration = self.segments.last().map(Segment::end_time).unwrap_or(0);
        self.tss = compute_tss(&self.segments);
    }

    /// Re-sample every curve, then recompute totals and TSS.
    pub fn refresh_derived(&mut self) {
        for segment in &mut self.segments {
            segment.resample();
        }
        self.refresh_totals();
    }
}

/// Errors produced while reading a workout document.
#[derive(Debug, Error)]
pub enum FormatError {
    /// Document is not well-formed
    #[error("Invalid XML: {0}")]
    InvalidXml(String),

    /// A required container element is absent
    #[error("Missing required element: {0}")]
    MissingElement(&'static str),

    /// Trainer file with fewer than two course points
    #[error("Course data has fewer than two points")]
    EmptyCourse,

    /// Segment timing would run past [`MAX_WORKOUT_SECONDS`]
    #[error("<{element}> would end at {end}s, past the {}s limit", MAX_WORKOUT_SECONDS)]
    TooLong { element: String, end: u64 },

    /// Course data point earlier than the one before it
    #[error("Course data goes back in time on line {line}")]
    NonMonotonicCourse { line: usize },

    /// IO error reading file
    #[error("IO error: {0}")]
    Io(String),
}

/// Errors raised by edit operations before anything is mutated.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Segment index past the end of the workout
    #[error("Segment {index} does not exist (workout has {len} segments)")]
    SegmentOutOfRange { index: usize, len: usize },

    /// Duration outside 1-7200 seconds
    #[error("Duration must be between 1 and 7200 seconds, got {0}")]
    DurationOutOfRange(u32),

    /// Power outside 1-300% FTP
    #[error("{field} must be between 1 and 300% FTP, got {value}")]
    PowerOutOfRange { field: &'static str, value: u32 },

    /// Ramp with low above high
    #[error("Power low ({low}%) must be less than or equal to power high ({high}%)")]
    InvertedRange { low: u32, high: u32 },

    /// Field does not exist on this kind of segment
    #[error("{field} cannot be set on a {kind} segment")]
    FieldNotApplicable { field: &'static str, kind: SegmentKind },

    /// Scale factor not finite or outside (0, 3]
    #[error("Scale factor must be greater than 0 and at most 3, got {0}")]
    InvalidScaleFactor(f64),
}

/// Errors related to the edit engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// No workout loaded
    #[error("No workout loaded")]
    NoWorkoutLoaded,

    /// Undo stack is empty
    #[error("Nothing to undo")]
    NothingToUndo,

    /// Edit rejected
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Errors from the text-to-workout collaborator.
#[derive(Debug, Error)]
pub enum CollaboratorError {
    /// Request could not be sent or the connection failed
    #[error("Generator unreachable: {0}")]
    Transport(String),

    /// Request took longer than the configured timeout
    #[error("Generator timed out")]
    Timeout,

    /// Non-success HTTP status
    #[error("Generator returned status {0}")]
    Status(u16),

    /// Response did not contain a workout JSON object
    #[error("Generator returned invalid JSON: {0}")]
    MalformedJson(String),

    /// Workout JSON without any segments
    #[error("Generated workout has no segments")]
    EmptyWorkout,
}

impl From<serde_json::Error> for CollaboratorError {
    fn from(err: serde_json::Error) -> Self {
        CollaboratorError::MalformedJson(err.to_string())
    }
}

/// Errors while writing an export payload.
#[derive(Debug, Error)]
pub enum ExportError {
    /// XML writer failure
    #[error("XML error: {0}")]
    Xml(String),

    /// Text writer failure
    #[error("Failed to write data: {0}")]
    Write(String),
}
