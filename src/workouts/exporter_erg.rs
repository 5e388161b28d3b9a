//! ERG export: course data in absolute watts for a given FTP.

use std::io::Write;

use crate::workouts::datapoints::write_course_body;
use crate::workouts::types::{ExportError, Workout};

/// File name an ERG export is saved under.
pub fn erg_file_name(workout: &Workout) -> String {
    format!("{}.erg", workout.name)
}

/// Export a workout to ERG format.
///
/// Watts are `round(power * ftp)` at every course point.
pub fn export_erg(workout: &Workout, ftp: u16, include_cues: bool) -> Result<String, ExportError> {
    let mut output = Vec::new();

    let header = [
        "[COURSE HEADER]".to_string(),
        "VERSION=2".to_string(),
        "UNITS=ENGLISH".to_string(),
        format!("DESCRIPTION={}", workout.description),
        format!("FILE NAME={}", erg_file_name(workout)),
        format!("FTP={}", ftp),
        "MINUTES\tWATTS".to_string(),
        "[END COURSE HEADER]".to_string(),
        String::new(),
        "[COURSE DATA]".to_string(),
    ];
    writeln!(output, "{}", header.join("\n")).map_err(|e| ExportError::Write(e.to_string()))?;

    let ftp = ftp as f64;
    write_course_body(&mut output, workout, include_cues, |power| {
        (power * ftp).round() as i64
    })?;

    tracing::info!("Exported {:?} as ERG at FTP {}", workout.name, ftp);
    String::from_utf8(output).map_err(|e| ExportError::Write(e.to_string()))
}
