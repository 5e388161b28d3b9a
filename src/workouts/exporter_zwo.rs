//! ZWO re-emission of the current workout.
//!
//! Expanded interval segments are compacted back into `IntervalsT` elements
//! wherever a run of work/recovery blocks is uniform. A recovery block that
//! no run can absorb is written as a `SteadyState`. ZWO has no start times,
//! so a gap between segments is written as a `SteadyState` at the same 50%
//! FTP the trainer formats use for gaps.

use std::io::Cursor;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::workouts::datapoints::GAP_FILLER_POWER;
use crate::workouts::types::{ExportError, PowerShape, Segment, SegmentKind, Workout};

/// Recovery power written for runs that have no recovery blocks.
const DEFAULT_OFF_POWER: f64 = 0.5;

/// File name for a modified workout: non-alphanumerics become underscores.
pub fn zwo_file_name(workout: &Workout) -> String {
    let stem: String = workout
        .name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("{}_modified.zwo", stem)
}

/// A uniform run of interval segments.
#[derive(Debug, Clone, PartialEq)]
pub struct IntervalRun {
    pub repeat: u32,
    pub on_duration: u32,
    pub off_duration: u32,
    pub on_power: f64,
    pub off_power: f64,
}

/// One element of the re-emitted `workout` container.
#[derive(Debug, Clone, PartialEq)]
pub enum Block<'a> {
    Single(&'a Segment),
    Intervals(IntervalRun),
}

fn same_block(a: &Segment, b: &Segment) -> bool {
    a.kind == b.kind && a.duration == b.duration && a.power.approx_eq(&b.power)
}

/// Group segments into elements, compacting uniform interval runs.
pub fn compact(segments: &[Segment]) -> Vec<Block<'_>> {
    let mut blocks = Vec::new();
    let mut i = 0;

    while i < segments.len() {
        let first = &segments[i];
        if first.kind != SegmentKind::IntervalOn {
            blocks.push(Block::Single(first));
            i += 1;
            continue;
        }

        let mut repeat = 1u32;
        let mut off: Option<&Segment> = None;
        let mut j = i + 1;

        // Runs with recoveries: On (Off On)*
        while j + 1 < segments.len()
            && segments[j].kind == SegmentKind::IntervalOff
            && same_block(first, &segments[j + 1])
            && off.map_or(true, |o| same_block(o, &segments[j]))
        {
            off.get_or_insert(&segments[j]);
            repeat += 1;
            j += 2;
        }

        // Runs without recoveries: On On*
        if off.is_none() {
            while j < segments.len() && same_block(first, &segments[j]) {
                repeat += 1;
                j += 1;
            }
        }

        let run = IntervalRun {
            repeat,
            on_duration: first.duration,
            off_duration: off.map_or(0, |o| o.duration),
            on_power: first.power.representative(),
            off_power: off.map_or(DEFAULT_OFF_POWER, |o| o.power.representative()),
        };
        tracing::debug!("Compacted {} interval segments into {:?}", j - i, run);
        blocks.push(Block::Intervals(run));
        i = j;
    }

    blocks
}

/// Fraction attribute, rounded to four decimals.
fn fraction(value: f64) -> String {
    let rounded = (value * 10_000.0).round() / 10_000.0;
    format!("{}", rounded)
}

fn xml_err(e: impl std::fmt::Display) -> ExportError {
    ExportError::Xml(e.to_string())
}

/// Build the element for a single segment.
fn segment_element(segment: &Segment) -> BytesStart<'static> {
    let duration = segment.duration.to_string();
    let (low, high) = segment.power.bounds();

    let ramp = |tag: &'static str| {
        let mut element = BytesStart::new(tag);
        element.push_attribute(("Duration", duration.as_str()));
        element.push_attribute(("PowerLow", fraction(low).as_str()));
        element.push_attribute(("PowerHigh", fraction(high).as_str()));
        element
    };
    let steady = |power: f64| {
        let mut element = BytesStart::new("SteadyState");
        element.push_attribute(("Duration", duration.as_str()));
        element.push_attribute(("Power", fraction(power).as_str()));
        element
    };

    match segment.kind {
        SegmentKind::Warmup => ramp("Warmup"),
        SegmentKind::Cooldown => ramp("Cooldown"),
        SegmentKind::Ramp => ramp("Ramp"),
        SegmentKind::FreeRide => {
            let mut element = BytesStart::new("FreeRide");
            element.push_attribute(("Duration", duration.as_str()));
            element
        }
        SegmentKind::SteadyState | SegmentKind::IntervalOn | SegmentKind::IntervalOff => {
            steady(segment.power.representative())
        }
        SegmentKind::Unknown => match segment.power {
            PowerShape::Flat { power } => steady(power),
            ramp_shape => steady(ramp_shape.representative()),
        },
    }
}

fn gap_element(duration: u32) -> BytesStart<'static> {
    let mut element = BytesStart::new("SteadyState");
    element.push_attribute(("Duration", duration.to_string().as_str()));
    element.push_attribute(("Power", fraction(GAP_FILLER_POWER).as_str()));
    element
}

/// Split time-ordered segments at gaps.
///
/// Yields each contiguous slice together with the gap in seconds that
/// precedes it.
fn contiguous_chunks(segments: &[Segment]) -> Vec<(u32, &[Segment])> {
    let mut chunks = Vec::new();
    let mut chunk_start = 0;
    let mut gap_before = segments.first().map_or(0, |s| s.start_time);
    let mut cursor = segments.first().map_or(0, Segment::end_time);

    for (i, segment) in segments.iter().enumerate().skip(1) {
        if segment.start_time > cursor {
            chunks.push((gap_before, &segments[chunk_start..i]));
            gap_before = segment.start_time - cursor;
            chunk_start = i;
        }
        cursor = cursor.max(segment.end_time());
    }
    if chunk_start < segments.len() {
        chunks.push((gap_before, &segments[chunk_start..]));
    }

    chunks
}

fn intervals_element(run: &IntervalRun) -> BytesStart<'static> {
    let mut element = BytesStart::new("IntervalsT");
    element.push_attribute(("Repeat", run.repeat.to_string().as_str()));
    element.push_attribute(("OnDuration", run.on_duration.to_string().as_str()));
    element.push_attribute(("OffDuration", run.off_duration.to_string().as_str()));
    element.push_attribute(("PowerOnHigh", fraction(run.on_power).as_str()));
    element.push_attribute(("PowerOffHigh", fraction(run.off_power).as_str()));
    element
}

fn write_text_element<W: std::io::Write>(
    writer: &mut Writer<W>,
    name: &str,
    text: &str,
) -> Result<(), ExportError> {
    writer
        .write_event(Event::Start(BytesStart::new(name)))
        .map_err(xml_err)?;
    writer
        .write_event(Event::Text(BytesText::new(text)))
        .map_err(xml_err)?;
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(xml_err)?;
    Ok(())
}

/// Export a workout to ZWO format.
pub fn export_zwo(workout: &Workout) -> Result<String, ExportError> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 4);

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(xml_err)?;
    writer
        .write_event(Event::Start(BytesStart::new("workout_file")))
        .map_err(xml_err)?;

    write_text_element(&mut writer, "author", &workout.author)?;
    write_text_element(&mut writer, "name", &workout.name)?;
    write_text_element(&mut writer, "description", &workout.description)?;
    write_text_element(&mut writer, "sportType", &workout.sport.to_string())?;

    writer
        .write_event(Event::Start(BytesStart::new("workout")))
        .map_err(xml_err)?;

    for (gap, chunk) in contiguous_chunks(&workout.segments) {
        if gap > 0 {
            tracing::debug!("Filling {}s gap before segment at {}s", gap, chunk[0].start_time);
            writer
                .write_event(Event::Empty(gap_element(gap)))
                .map_err(xml_err)?;
        }
        for block in compact(chunk) {
            let element = match block {
                Block::Single(segment) => segment_element(segment),
                Block::Intervals(run) => intervals_element(&run),
            };
            writer.write_event(Event::Empty(element)).map_err(xml_err)?;
        }
    }

    writer
        .write_event(Event::End(BytesEnd::new("workout")))
        .map_err(xml_err)?;
    writer
        .write_event(Event::End(BytesEnd::new("workout_file")))
        .map_err(xml_err)?;

    let result = writer.into_inner().into_inner();
    tracing::info!("Exported {:?} as ZWO", workout.name);
    String::from_utf8(result).map_err(|e| ExportError::Write(e.to_string()))
}
