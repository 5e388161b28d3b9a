//! Unit tests for workout parsers.

use zwoforge::workouts::parser_mrc::{parse_erg, parse_mrc};
use zwoforge::workouts::parser_zwo::parse_zwo;
use zwoforge::workouts::types::{FormatError, PowerShape, SegmentKind, Sport};

/// Sample ZWO workout XML for testing.
const SAMPLE_ZWO: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<workout_file>
    <author>Test Author</author>
    <name>Test Workout</name>
    <description>A simple test workout</description>
    <sportType>bike</sportType>
    <tags>
        <tag name="Intervals"/>
        <tag name="FTP"/>
    </tags>
    <workout>
        <Warmup Duration="300" PowerLow="0.4" PowerHigh="0.7"/>
        <SteadyState Duration="600" Power="0.75" Cadence="90"/>
        <IntervalsT Repeat="4" OnDuration="30" OffDuration="30" OnPower="1.2" OffPower="0.5"/>
        <SteadyState Duration="300" Power="0.6"/>
        <Cooldown Duration="300" PowerLow="0.5" PowerHigh="0.3"/>
    </workout>
</workout_file>"#;

/// Sample MRC workout for testing.
const SAMPLE_MRC: &str = r#"[COURSE HEADER]
VERSION = 2
UNITS = ENGLISH
DESCRIPTION = Test MRC Workout
FILE NAME = test_workout
MINUTES PERCENT
[END COURSE HEADER]
[COURSE DATA]
0.00    50
5.00    50
5.00    75
10.00   75
10.00   100
15.00   100
15.00   50
20.00   50
[END COURSE DATA]
[COURSE TEXT]
0.00    "Warmup"
5.00    "Zone 3"
10.00   "Threshold"
15.00   "Cooldown"
[END COURSE TEXT]"#;

#[test]
fn test_parse_zwo_basic() {
    let workout = parse_zwo(SAMPLE_ZWO).expect("Should parse ZWO workout");

    assert_eq!(workout.name, "Test Workout");
    assert_eq!(workout.author, "Test Author");
    assert_eq!(workout.description, "A simple test workout");
    assert_eq!(workout.sport, Sport::Bike);
    assert_eq!(workout.segments.len(), 11);
}

#[test]
fn test_parse_zwo_warmup() {
    let workout = parse_zwo(SAMPLE_ZWO).expect("Should parse ZWO workout");

    let warmup = &workout.segments[0];
    assert_eq!(warmup.kind, SegmentKind::Warmup);
    assert_eq!(warmup.duration, 300);
    assert_eq!(warmup.power, PowerShape::Ramp { low: 0.4, high: 0.7 });
    assert_eq!(warmup.curve.len(), 30);
    assert!((warmup.curve[0].power - 40.0).abs() < 1e-9);
    assert!((warmup.curve[29].power - 70.0).abs() < 1e-9);
}

#[test]
fn test_parse_zwo_intervals_use_power_aliases() {
    let workout = parse_zwo(SAMPLE_ZWO).expect("Should parse ZWO workout");

    let intervals = &workout.segments[2..9];
    let kinds: Vec<SegmentKind> = intervals.iter().map(|s| s.kind).collect();
    assert_eq!(
        kinds,
        vec![
            SegmentKind::IntervalOn,
            SegmentKind::IntervalOff,
            SegmentKind::IntervalOn,
            SegmentKind::IntervalOff,
            SegmentKind::IntervalOn,
            SegmentKind::IntervalOff,
            SegmentKind::IntervalOn,
        ]
    );
    assert_eq!(intervals[0].power, PowerShape::Flat { power: 1.2 });
    assert_eq!(intervals[1].power, PowerShape::Flat { power: 0.5 });
    assert_eq!(intervals[0].start_time, 900);
    assert_eq!(intervals[6].end_time(), 1110);
}

#[test]
fn test_parse_zwo_totals() {
    let workout = parse_zwo(SAMPLE_ZWO).expect("Should parse ZWO workout");

    let sum: u32 = workout.segments.iter().map(|s| s.duration).sum();
    assert_eq!(workout.total_duration, 1710);
    assert_eq!(workout.total_duration, sum);
    for pair in workout.segments.windows(2) {
        assert_eq!(pair[0].end_time(), pair[1].start_time);
    }
    assert!(workout.tss > 0);
}

#[test]
fn test_parse_zwo_cooldown_keeps_descending_range() {
    let workout = parse_zwo(SAMPLE_ZWO).expect("Should parse ZWO workout");

    let cooldown = workout.segments.last().unwrap();
    assert_eq!(cooldown.kind, SegmentKind::Cooldown);
    assert_eq!(cooldown.power, PowerShape::Ramp { low: 0.5, high: 0.3 });
}

#[test]
fn test_parse_zwo_missing_container() {
    let zwo = "<workout_file><name>No body</name></workout_file>";
    assert!(matches!(
        parse_zwo(zwo),
        Err(FormatError::MissingElement(_))
    ));
}

#[test]
fn test_parse_zwo_missing_root() {
    let zwo = "<something><workout/></something>";
    assert!(matches!(
        parse_zwo(zwo),
        Err(FormatError::MissingElement(_))
    ));
}

#[test]
fn test_parse_zwo_defaults() {
    let zwo = r#"<workout_file>
    <workout>
        <SteadyState Duration="60"/>
        <Ramp Duration="60"/>
        <FreeRide Duration="60" Power="1.5"/>
        <MaxEffort Duration="30"/>
    </workout>
</workout_file>"#;

    let workout = parse_zwo(zwo).expect("Should parse ZWO workout");
    assert_eq!(workout.name, "Unnamed Workout");
    assert_eq!(workout.author, "Unknown");
    assert_eq!(workout.segments.len(), 3);
    assert_eq!(workout.segments[0].power, PowerShape::Flat { power: 0.6 });
    assert_eq!(workout.segments[1].power, PowerShape::Ramp { low: 0.5, high: 1.0 });
    assert_eq!(workout.segments[2].power, PowerShape::Flat { power: 0.6 });
    assert_eq!(workout.total_duration, 180);
}

#[test]
fn test_parse_zwo_intervals_without_recovery() {
    let zwo = r#"<workout_file>
    <workout>
        <IntervalsT Repeat="3" OnDuration="60" OffDuration="0" PowerOnHigh="1.1"/>
    </workout>
</workout_file>"#;

    let workout = parse_zwo(zwo).expect("Should parse ZWO workout");
    assert_eq!(workout.segments.len(), 3);
    assert!(workout
        .segments
        .iter()
        .all(|s| s.kind == SegmentKind::IntervalOn));
    let starts: Vec<u32> = workout.segments.iter().map(|s| s.start_time).collect();
    assert_eq!(starts, vec![0, 60, 120]);
    assert_eq!(workout.total_duration, 180);
}

#[test]
fn test_parse_zwo_zero_repeat_is_one_work_block() {
    let zwo = r#"<workout_file>
    <workout>
        <IntervalsT Repeat="0" OnDuration="90" OffDuration="30" PowerOnHigh="1.2"/>
        <SteadyState Duration="60" Power="0.5"/>
    </workout>
</workout_file>"#;

    let workout = parse_zwo(zwo).expect("Should parse ZWO workout");
    assert_eq!(workout.segments.len(), 2);
    assert_eq!(workout.segments[0].kind, SegmentKind::IntervalOn);
    assert_eq!(workout.segments[0].duration, 90);
    assert_eq!(workout.segments[1].start_time, 90);
    assert_eq!(workout.total_duration, 150);
}

#[test]
fn test_parse_zwo_rejects_workout_past_a_day() {
    let zwo = r#"<workout_file>
    <workout>
        <SteadyState Duration="4294967290" Power="0.7"/>
        <SteadyState Duration="10" Power="0.7"/>
    </workout>
</workout_file>"#;

    assert!(matches!(parse_zwo(zwo), Err(FormatError::TooLong { .. })));
}

#[test]
fn test_parse_mrc_rejects_backward_points() {
    let mrc = "[COURSE HEADER]\nFILE NAME = zigzag.mrc\n[END COURSE HEADER]\n\
               [COURSE DATA]\n0.00\t50\n10.00\t50\n5.00\t80\n15.00\t80\n[END COURSE DATA]";

    assert!(matches!(
        parse_mrc(mrc),
        Err(FormatError::NonMonotonicCourse { line: 7 })
    ));
}

#[test]
fn test_parse_mrc_basic() {
    let workout = parse_mrc(SAMPLE_MRC).expect("Should parse MRC workout");

    assert_eq!(workout.name, "test_workout");
    assert_eq!(workout.description, "Test MRC Workout");
    assert_eq!(workout.segments.len(), 4);
    assert_eq!(workout.total_duration, 1200);
}

#[test]
fn test_parse_mrc_segments() {
    let workout = parse_mrc(SAMPLE_MRC).expect("Should parse MRC workout");

    let powers: Vec<PowerShape> = workout.segments.iter().map(|s| s.power).collect();
    assert_eq!(
        powers,
        vec![
            PowerShape::Flat { power: 0.5 },
            PowerShape::Flat { power: 0.75 },
            PowerShape::Flat { power: 1.0 },
            PowerShape::Flat { power: 0.5 },
        ]
    );
    assert!(workout
        .segments
        .iter()
        .all(|s| s.kind == SegmentKind::SteadyState));
}

#[test]
fn test_parse_erg_watts() {
    let erg = "[COURSE HEADER]\nVERSION=2\nUNITS=ENGLISH\nDESCRIPTION=Build\n\
               FILE NAME=build.erg\nFTP=200\nMINUTES\tWATTS\n[END COURSE HEADER]\n\n\
               [COURSE DATA]\n0.00\t100\n10.00\t200\n10.00\t220\n20.00\t220\n[END COURSE DATA]";

    let workout = parse_erg(erg, 250).expect("Should parse ERG workout");
    assert_eq!(workout.name, "build");
    assert_eq!(workout.segments[0].kind, SegmentKind::Ramp);
    assert_eq!(workout.segments[0].power, PowerShape::Ramp { low: 0.5, high: 1.0 });
    assert_eq!(workout.segments[1].power, PowerShape::Flat { power: 1.1 });
}

#[test]
fn test_parse_mrc_single_point() {
    let mrc = "[COURSE DATA]\n0.00\t50\n[END COURSE DATA]";
    assert!(matches!(parse_mrc(mrc), Err(FormatError::EmptyCourse)));
}
