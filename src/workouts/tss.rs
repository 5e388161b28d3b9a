//! Training Stress Score from planned power.
//!
//! Normalized Power is approximated from the plan rather than from a ride:
//! the fourth root of the duration-weighted mean of each segment's
//! representative power raised to the fourth. FTP is normalised to 1.0, so
//! the intensity factor equals normalized power.

use crate::workouts::types::Segment;

/// Duration-weighted normalized power as a fraction of FTP.
///
/// Returns `None` when no segment has a positive duration.
pub fn normalized_power(segments: &[Segment]) -> Option<f64> {
    let mut weighted = 0.0f64;
    let mut total_duration = 0u64;

    for segment in segments.iter().filter(|s| s.duration > 0) {
        let power = segment.power.representative();
        weighted += power.powi(4) * segment.duration as f64;
        total_duration += segment.duration as u64;
    }

    if total_duration == 0 {
        return None;
    }

    Some((weighted / total_duration as f64).powf(0.25))
}

/// Training Stress Score for a list of segments.
pub fn compute_tss(segments: &[Segment]) -> u32 {
    let total_duration: u64 = segments.iter().map(|s| s.duration as u64).sum();

    let Some(np) = normalized_power(segments) else {
        return 0;
    };

    let intensity_factor = np;
    let tss = total_duration as f64 * np * intensity_factor / 3600.0 * 100.0;
    tss.round() as u32
}
