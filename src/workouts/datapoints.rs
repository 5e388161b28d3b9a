//! Course points and text cues shared by the ERG and MRC exporters.
//!
//! Trainer files interpolate linearly between listed points, so each segment
//! contributes only its start and end rather than a dense resampling.

use std::io::Write;

use crate::workouts::types::{ExportError, Segment, SegmentKind, Workout};

/// Power used to bridge gaps between segments.
pub const GAP_FILLER_POWER: f64 = 0.5;

/// How long a trainer shows each text cue, in seconds.
pub const CUE_DISPLAY_SECONDS: u32 = 10;

/// A point of the piecewise-linear power envelope.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DataPoint {
    /// Absolute time in seconds
    pub time: u32,
    /// Power as a fraction of FTP
    pub power: f64,
}

/// An on-screen message at a point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct TextCue {
    /// Absolute time in seconds
    pub time: u32,
    pub message: String,
}

fn time_sorted(workout: &Workout) -> Vec<&Segment> {
    let mut segments: Vec<&Segment> = workout.segments.iter().collect();
    segments.sort_by_key(|s| s.start_time);
    segments
}

/// Build the power envelope for a workout.
pub fn generate_data_points(workout: &Workout) -> Vec<DataPoint> {
    let mut points = Vec::with_capacity(workout.segments.len() * 2);
    let mut current_time = 0u32;

    for segment in time_sorted(workout) {
        let start = segment.start_time;
        let end = segment.end_time();

        if current_time < start {
            points.push(DataPoint {
                time: start,
                power: GAP_FILLER_POWER,
            });
        }

        let (from, to) = segment.power.bounds();
        points.push(DataPoint {
            time: start,
            power: from,
        });
        points.push(DataPoint {
            time: end,
            power: to,
        });

        current_time = end;
    }

    points
}

fn percent(fraction: f64) -> i64 {
    (fraction * 100.0).round() as i64
}

/// Human-readable cue for a segment, if its kind has one.
pub fn cue_message(segment: &Segment) -> Option<String> {
    let power = segment.power.representative();
    let message = match segment.kind {
        SegmentKind::Warmup => "Warmup - gradually increase effort".to_string(),
        SegmentKind::Cooldown => "Cooldown - gradually decrease effort".to_string(),
        SegmentKind::SteadyState => format!("Steady effort at {}% FTP", percent(power)),
        SegmentKind::IntervalOn => format!("Interval ON - {}% FTP", percent(power)),
        SegmentKind::IntervalOff => format!("Recovery - {}% FTP", percent(power)),
        SegmentKind::Ramp => {
            let (low, high) = segment.power.bounds();
            format!("Ramp from {}% to {}% FTP", percent(low), percent(high))
        }
        SegmentKind::FreeRide => "Free ride - choose your own effort".to_string(),
        SegmentKind::Unknown => return None,
    };
    Some(message)
}

/// One cue per segment, in workout order.
pub fn generate_text_cues(workout: &Workout) -> Vec<TextCue> {
    workout
        .segments
        .iter()
        .filter_map(|segment| {
            cue_message(segment).map(|message| TextCue {
                time: segment.start_time,
                message,
            })
        })
        .collect()
}

/// Body rows and cue block written by both course exporters.
pub(crate) fn write_course_body<F>(
    output: &mut Vec<u8>,
    workout: &Workout,
    include_cues: bool,
    mut value: F,
) -> Result<(), ExportError>
where
    F: FnMut(f64) -> i64,
{
    let rows: Vec<String> = generate_data_points(workout)
        .iter()
        .map(|point| format!("{:.2}\t{}", point.time as f64 / 60.0, value(point.power)))
        .collect();

    write!(output, "{}\n[END COURSE DATA]", rows.join("\n"))
        .map_err(|e| ExportError::Write(e.to_string()))?;

    let cues = if include_cues {
        generate_text_cues(workout)
    } else {
        Vec::new()
    };

    if !cues.is_empty() {
        let lines: Vec<String> = cues
            .iter()
            .map(|cue| format!("{}\t{}\t{}", cue.time, cue.message, CUE_DISPLAY_SECONDS))
            .collect();
        write!(
            output,
            "\n\n[COURSE TEXT]\n{}\n[END COURSE TEXT]",
            lines.join("\n")
        )
        .map_err(|e| ExportError::Write(e.to_string()))?;
    }

    Ok(())
}
