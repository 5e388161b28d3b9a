//! MRC export: course data as percent of FTP.

use std::io::Write;

use crate::workouts::datapoints::write_course_body;
use crate::workouts::types::{ExportError, Workout};

/// File name an MRC export is saved under.
pub fn mrc_file_name(workout: &Workout) -> String {
    format!("{}.mrc", workout.name)
}

/// Export a workout to MRC format.
pub fn export_mrc(workout: &Workout, include_cues: bool) -> Result<String, ExportError> {
    let mut output = Vec::new();

    let header = [
        "[COURSE HEADER]".to_string(),
        "VERSION = 2".to_string(),
        "UNITS = ENGLISH".to_string(),
        format!("DESCRIPTION = {}", workout.description),
        format!("FILE NAME = {}", mrc_file_name(workout)),
        "MINUTES PERCENT".to_string(),
        "[END COURSE HEADER]".to_string(),
        String::new(),
        "[COURSE DATA]".to_string(),
    ];
    writeln!(output, "{}", header.join("\n")).map_err(|e| ExportError::Write(e.to_string()))?;

    write_course_body(&mut output, workout, include_cues, |power| {
        (power * 100.0).round() as i64
    })?;

    tracing::info!("Exported {:?} as MRC", workout.name);
    String::from_utf8(output).map_err(|e| ExportError::Write(e.to_string()))
}
