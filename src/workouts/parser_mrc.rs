//! MRC/ERG workout file parser.
//!
//! Both formats are text: a `[COURSE HEADER]` of `KEY = value` lines, a
//! `[COURSE DATA]` list of `minutes value` points, and an optional
//! `[COURSE TEXT]` block. MRC values are percent of FTP, ERG values are
//! watts. Consecutive points become one segment each.

use crate::workouts::types::{FormatError, Segment, SegmentKind, Workout, MAX_WORKOUT_SECONDS};

/// Unit of the second column of course data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CourseUnits {
    Percent,
    Watts,
}

/// A point in the course data.
#[derive(Debug, Clone)]
struct CoursePoint {
    /// 1-based line in the file
    line: usize,
    seconds: u32,
    value: f64,
}

#[derive(Debug, Default)]
struct CourseHeader {
    name: Option<String>,
    description: Option<String>,
    ftp: Option<f64>,
    units: Option<CourseUnits>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    Header,
    Data,
    Text,
}

/// Parse an MRC workout from text content.
pub fn parse_mrc(content: &str) -> Result<Workout, FormatError> {
    parse_course(content, CourseUnits::Percent, None)
}

/// Parse an ERG workout, using `fallback_ftp` if the header has no FTP.
pub fn parse_erg(content: &str, fallback_ftp: u16) -> Result<Workout, FormatError> {
    parse_course(content, CourseUnits::Watts, Some(fallback_ftp))
}

/// Parse a course file; a `MINUTES WATTS`/`MINUTES PERCENT` header line
/// overrides `default_units`.
pub fn parse_course(
    content: &str,
    default_units: CourseUnits,
    fallback_ftp: Option<u16>,
) -> Result<Workout, FormatError> {
    let mut header = CourseHeader::default();
    let mut points: Vec<CoursePoint> = Vec::new();
    let mut section = Section::None;

    for (index, line) in content.lines().enumerate() {
        let line = line.trim();

        if line.is_empty() {
            continue;
        }

        // Section markers
        match line {
            "[COURSE HEADER]" => {
                section = Section::Header;
                continue;
            }
            "[COURSE DATA]" => {
                section = Section::Data;
                continue;
            }
            "[COURSE TEXT]" => {
                section = Section::Text;
                continue;
            }
            "[END COURSE HEADER]" | "[END COURSE DATA]" | "[END COURSE TEXT]" => {
                section = Section::None;
                continue;
            }
            _ => {}
        }

        match section {
            Section::Header => parse_header_line(line, &mut header),
            Section::Data => {
                if let Some(point) = parse_course_point(index + 1, line) {
                    points.push(point);
                } else {
                    tracing::warn!("Skipping malformed course data line {:?}", line);
                }
            }
            Section::Text | Section::None => {}
        }
    }

    if points.len() < 2 {
        return Err(FormatError::EmptyCourse);
    }

    let units = header.units.unwrap_or(default_units);
    let divisor = match units {
        CourseUnits::Percent => 100.0,
        CourseUnits::Watts => header
            .ftp
            .or(fallback_ftp.map(f64::from))
            .filter(|ftp| *ftp > 0.0)
            .unwrap_or(250.0),
    };

    let segments = build_segments(&points, divisor)?;
    if segments.is_empty() {
        return Err(FormatError::EmptyCourse);
    }

    let name = header
        .name
        .map(|n| strip_extension(&n).to_string())
        .unwrap_or_else(|| "Unnamed Workout".to_string());
    let mut workout = Workout::new(name, segments);
    if let Some(description) = header.description {
        workout.description = description;
    }

    Ok(workout)
}

fn strip_extension(name: &str) -> &str {
    for ext in [".erg", ".mrc", ".ERG", ".MRC"] {
        if let Some(stem) = name.strip_suffix(ext) {
            return stem;
        }
    }
    name
}

/// Parse a header line like `KEY = value`, or the `MINUTES <unit>` line.
fn parse_header_line(line: &str, header: &mut CourseHeader) {
    if let Some((key, value)) = line.split_once('=') {
        let value = value.trim().to_string();
        match key.trim().to_uppercase().as_str() {
            "FILE NAME" => header.name = Some(value),
            "DESCRIPTION" => header.description = Some(value),
            "FTP" => header.ftp = value.parse().ok(),
            _ => {}
        }
        return;
    }

    let upper = line.to_uppercase();
    let mut words = upper.split_whitespace();
    if words.next() == Some("MINUTES") {
        header.units = match words.next() {
            Some("WATTS") => Some(CourseUnits::Watts),
            Some("PERCENT") => Some(CourseUnits::Percent),
            _ => header.units,
        };
    }
}

/// Parse a course data point like `5.00    75`.
fn parse_course_point(line_number: usize, line: &str) -> Option<CoursePoint> {
    let mut parts = line.split_whitespace();
    let minutes: f64 = parts.next()?.parse().ok()?;
    let value: f64 = parts.next()?.parse().ok()?;
    if !minutes.is_finite() || minutes < 0.0 {
        return None;
    }
    Some(CoursePoint {
        line: line_number,
        seconds: (minutes * 60.0).round() as u32,
        value,
    })
}

/// Build workout segments from consecutive course points.
///
/// Points must not go back in time; repeated times mark a step change.
fn build_segments(points: &[CoursePoint], divisor: f64) -> Result<Vec<Segment>, FormatError> {
    let mut segments = Vec::new();

    for pair in points.windows(2) {
        let (start, end) = (&pair[0], &pair[1]);
        if end.seconds < start.seconds {
            return Err(FormatError::NonMonotonicCourse { line: end.line });
        }
        if end.seconds > MAX_WORKOUT_SECONDS {
            return Err(FormatError::TooLong {
                element: "COURSE DATA".to_string(),
                end: u64::from(end.seconds),
            });
        }
        let duration = end.seconds - start.seconds;

        if duration == 0 {
            continue;
        }

        let from = start.value / divisor;
        let to = end.value / divisor;
        let segment = if (from - to).abs() < 1e-9 {
            Segment::flat(SegmentKind::SteadyState, start.seconds, duration, from)
        } else {
            Segment::ramp(SegmentKind::Ramp, start.seconds, duration, from, to)
        };
        segments.push(segment);
    }

    Ok(segments)
}

/// Parse an MRC or ERG file from disk, choosing by extension.
pub fn parse_course_file(path: &std::path::Path, ftp: u16) -> Result<Workout, FormatError> {
    let content =
        std::fs::read_to_string(path).map_err(|e| FormatError::Io(e.to_string()))?;

    let is_erg = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("erg"));

    let workout = if is_erg {
        parse_erg(&content, ftp)?
    } else {
        parse_mrc(&content)?
    };
    tracing::info!("Imported course {:?} from {}", workout.name, path.display());

    Ok(workout)
}
