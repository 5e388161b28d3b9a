//! Zwift workout (.zwo) file parser.
//!
//! ZWO files are XML: a `workout_file` root with metadata elements and a
//! `workout` container whose direct children are segments. Segments are
//! laid end to end; interval blocks are expanded in place.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::workouts::intervals::{expand, IntervalSpec};
use crate::workouts::types::{
    FormatError, Segment, SegmentKind, Sport, Workout, DEFAULT_POWER, MAX_WORKOUT_SECONDS,
};

const ROOT: &str = "workout_file";
const CONTAINER: &str = "workout";

/// Text metadata collected from direct children of the root.
#[derive(Debug, Default)]
struct Metadata {
    name: Option<String>,
    description: Option<String>,
    author: Option<String>,
    sport_type: Option<String>,
}

impl Metadata {
    fn slot(&mut self, element: &str) -> Option<&mut Option<String>> {
        match element {
            "name" => Some(&mut self.name),
            "description" => Some(&mut self.description),
            "author" => Some(&mut self.author),
            "sportType" => Some(&mut self.sport_type),
            _ => None,
        }
    }
}

/// Parse a ZWO workout from XML content.
pub fn parse_zwo(content: &str) -> Result<Workout, FormatError> {
    let mut reader = Reader::from_str(content);
    reader.trim_text(true);

    let mut metadata = Metadata::default();
    let mut segments: Vec<Segment> = Vec::new();
    let mut current_time = 0u32;

    let mut saw_root = false;
    let mut saw_container = false;
    let mut path: Vec<String> = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let name = element_name(e);
                open_element(
                    &name,
                    e,
                    &path,
                    &mut saw_root,
                    &mut saw_container,
                    &mut segments,
                    &mut current_time,
                )?;
                path.push(name);
            }
            Ok(Event::Empty(ref e)) => {
                let name = element_name(e);
                open_element(
                    &name,
                    e,
                    &path,
                    &mut saw_root,
                    &mut saw_container,
                    &mut segments,
                    &mut current_time,
                )?;
            }
            Ok(Event::Text(e)) => {
                if let [root, element] = path.as_slice() {
                    if root == ROOT {
                        if let Some(slot) = metadata.slot(element) {
                            let text = e.unescape().map_err(|e| {
                                FormatError::InvalidXml(format!("Failed to unescape text: {}", e))
                            })?;
                            slot.get_or_insert_with(String::new).push_str(&text);
                        }
                    }
                }
            }
            Ok(Event::End(_)) => {
                path.pop();
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(FormatError::InvalidXml(format!(
                    "XML parsing error at position {}: {}",
                    reader.buffer_position(),
                    e
                )));
            }
            _ => {}
        }
        buf.clear();
    }

    if !path.is_empty() {
        return Err(FormatError::InvalidXml(format!(
            "Unexpected end of document inside <{}>",
            path.join("/")
        )));
    }
    if !saw_root {
        return Err(FormatError::MissingElement(ROOT));
    }
    if !saw_container {
        return Err(FormatError::MissingElement(CONTAINER));
    }

    let trimmed = |value: Option<String>| {
        value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let name = trimmed(metadata.name).unwrap_or_else(|| "Unnamed Workout".to_string());
    let mut workout = Workout::new(name, segments);
    if let Some(description) = trimmed(metadata.description) {
        workout.description = description;
    }
    if let Some(author) = trimmed(metadata.author) {
        workout.author = author;
    }
    workout.sport = trimmed(metadata.sport_type)
        .map(|tag| Sport::from_tag(&tag))
        .unwrap_or_default();

    tracing::debug!(
        "Parsed workout {:?}: {} segments, {}s, TSS {}",
        workout.name,
        workout.segments.len(),
        workout.total_duration,
        workout.tss
    );

    Ok(workout)
}

fn element_name(event: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(event.name().as_ref()).to_string()
}

/// Track the root and container, and turn direct children of the container
/// into segments.
fn open_element(
    name: &str,
    event: &BytesStart<'_>,
    path: &[String],
    saw_root: &mut bool,
    saw_container: &mut bool,
    segments: &mut Vec<Segment>,
    current_time: &mut u32,
) -> Result<(), FormatError> {
    match path {
        [] if name == ROOT => *saw_root = true,
        [root] if root == ROOT && name == CONTAINER => *saw_container = true,
        [root, container] if root == ROOT && container == CONTAINER => {
            let parsed = parse_element(name, &SegmentAttributes::from_event(event), *current_time)?;
            for segment in parsed {
                *current_time = segment.end_time();
                segments.push(segment);
            }
        }
        _ => {}
    }
    Ok(())
}

/// Reject an element whose `length` seconds from `start_time` would run past
/// the workout limit.
fn check_length(element: &str, start_time: u32, length: u32) -> Result<(), FormatError> {
    let end = u64::from(start_time) + u64::from(length);
    if end > u64::from(MAX_WORKOUT_SECONDS) {
        return Err(FormatError::TooLong {
            element: element.to_string(),
            end,
        });
    }
    Ok(())
}

/// Attribute lookup for one segment element.
struct SegmentAttributes {
    element: String,
    values: Vec<(String, String)>,
}

impl SegmentAttributes {
    fn from_event(event: &BytesStart<'_>) -> Self {
        let values = event
            .attributes()
            .flatten()
            .map(|attr| {
                let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
                let value = attr
                    .unescape_value()
                    .map(|v| v.to_string())
                    .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).to_string());
                (key, value)
            })
            .collect();
        Self {
            element: element_name(event),
            values,
        }
    }

    fn raw(&self, key: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Numeric attribute; absent or unparseable values yield `None`.
    fn number(&self, key: &str) -> Option<f64> {
        let raw = self.raw(key)?;
        match raw.trim().parse::<f64>() {
            Ok(value) if value.is_finite() => Some(value),
            _ => {
                tracing::warn!(
                    "Ignoring unparseable {}={:?} on <{}>",
                    key,
                    raw,
                    self.element
                );
                None
            }
        }
    }

    fn fraction_or(&self, key: &str, default: f64) -> f64 {
        self.number(key).unwrap_or(default)
    }

    /// Whole seconds, truncating any fractional part.
    fn seconds(&self, key: &str) -> Option<u32> {
        self.number(key)
            .filter(|value| *value >= 0.0)
            .map(|value| value.trunc().min(u32::MAX as f64) as u32)
    }
}

/// Build the segments for one element of the `workout` container.
fn parse_element(
    name: &str,
    attrs: &SegmentAttributes,
    start_time: u32,
) -> Result<Vec<Segment>, FormatError> {
    let duration = attrs.seconds("Duration").unwrap_or(0);
    if matches!(name, "Warmup" | "Cooldown" | "SteadyState" | "Ramp" | "FreeRide") {
        check_length(name, start_time, duration)?;
    }

    let segment = match name {
        "Warmup" | "Cooldown" => {
            let kind = if name == "Warmup" {
                SegmentKind::Warmup
            } else {
                SegmentKind::Cooldown
            };
            Segment::ramp(
                kind,
                start_time,
                duration,
                attrs.fraction_or("PowerLow", 0.5),
                attrs.fraction_or("PowerHigh", 0.7),
            )
        }
        "SteadyState" => Segment::flat(
            SegmentKind::SteadyState,
            start_time,
            duration,
            attrs.fraction_or("Power", DEFAULT_POWER),
        ),
        "Ramp" => Segment::ramp(
            SegmentKind::Ramp,
            start_time,
            duration,
            attrs.fraction_or("PowerLow", 0.5),
            attrs.fraction_or("PowerHigh", 1.0),
        ),
        "FreeRide" => Segment::flat(SegmentKind::FreeRide, start_time, duration, DEFAULT_POWER),
        "IntervalsT" => return parse_intervals(attrs, start_time),
        other => {
            tracing::debug!("Skipping unsupported segment <{}>", other);
            return Ok(Vec::new());
        }
    };

    if segment.duration == 0 {
        tracing::warn!("Dropping zero-duration <{}> at {}s", name, start_time);
        return Ok(Vec::new());
    }

    Ok(vec![segment])
}

/// Read an `IntervalsT` element and expand it.
fn parse_intervals(attrs: &SegmentAttributes, start_time: u32) -> Result<Vec<Segment>, FormatError> {
    let defaults = IntervalSpec::default();

    let on_high = attrs
        .number("PowerOnHigh")
        .or_else(|| attrs.number("OnPower"))
        .unwrap_or(defaults.on_high);
    let off_high = attrs
        .number("PowerOffHigh")
        .or_else(|| attrs.number("OffPower"))
        .unwrap_or(defaults.off_high);

    let spec = IntervalSpec {
        repeat: attrs.seconds("Repeat").unwrap_or(defaults.repeat).max(1),
        on_duration: attrs.seconds("OnDuration").unwrap_or(defaults.on_duration),
        off_duration: attrs.seconds("OffDuration").unwrap_or(defaults.off_duration),
        on_high,
        on_low: attrs.fraction_or("PowerOnLow", on_high),
        off_high,
        off_low: attrs.fraction_or("PowerOffLow", off_high),
    };

    if spec.on_duration == 0 {
        tracing::warn!("Dropping <IntervalsT> with zero OnDuration at {}s", start_time);
        return Ok(Vec::new());
    }
    check_length("IntervalsT", start_time, spec.total_duration())?;

    Ok(expand(&spec, start_time))
}

/// Parse a ZWO file from disk.
pub fn parse_zwo_file(path: &std::path::Path) -> Result<Workout, FormatError> {
    let content =
        std::fs::read_to_string(path).map_err(|e| FormatError::Io(e.to_string()))?;

    let workout = parse_zwo(&content)?;
    tracing::info!("Loaded workout {:?} from {}", workout.name, path.display());

    Ok(workout)
}
