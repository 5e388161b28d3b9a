//! Unit tests for ZWO, ERG and MRC export.

use zwoforge::workouts::exporter_erg::export_erg;
use zwoforge::workouts::exporter_mrc::export_mrc;
use zwoforge::workouts::exporter_zwo::{export_zwo, zwo_file_name};
use zwoforge::workouts::intervals::{expand, IntervalSpec};
use zwoforge::workouts::types::{Segment, SegmentKind, Workout};

fn interval_workout() -> Workout {
    let mut segments = vec![Segment::ramp(SegmentKind::Warmup, 0, 600, 0.5, 0.75)];
    segments.extend(expand(
        &IntervalSpec {
            repeat: 3,
            on_duration: 120,
            off_duration: 60,
            on_high: 1.1,
            on_low: 1.1,
            off_high: 0.5,
            off_low: 0.5,
        },
        600,
    ));
    segments.push(Segment::ramp(SegmentKind::Cooldown, 1080, 300, 0.6, 0.4));

    let mut workout = Workout::new("VO2 Builder".to_string(), segments);
    workout.description = "Three hard efforts".to_string();
    workout.author = "Coach".to_string();
    workout
}

#[test]
fn test_zwo_compacts_intervals() {
    let xml = export_zwo(&interval_workout()).unwrap();

    assert!(xml.contains(r#"<Warmup Duration="600" PowerLow="0.5" PowerHigh="0.75"/>"#));
    assert!(xml.contains(
        r#"<IntervalsT Repeat="3" OnDuration="120" OffDuration="60" PowerOnHigh="1.1" PowerOffHigh="0.5"/>"#
    ));
    assert!(xml.contains(r#"<Cooldown Duration="300" PowerLow="0.6" PowerHigh="0.4"/>"#));
    assert_eq!(xml.matches("<IntervalsT").count(), 1);
    assert!(!xml.contains("SteadyState"));
}

#[test]
fn test_zwo_metadata_order() {
    let xml = export_zwo(&interval_workout()).unwrap();

    let author = xml.find("<author>Coach</author>").unwrap();
    let name = xml.find("<name>VO2 Builder</name>").unwrap();
    let description = xml.find("<description>Three hard efforts</description>").unwrap();
    let sport = xml.find("<sportType>bike</sportType>").unwrap();
    let body = xml.find("<workout>").unwrap();
    assert!(author < name && name < description && description < sport && sport < body);
}

#[test]
fn test_zwo_file_name() {
    assert_eq!(zwo_file_name(&interval_workout()), "VO2_Builder_modified.zwo");
}

#[test]
fn test_erg_body() {
    let erg = export_erg(&interval_workout(), 300, false).unwrap();

    let data: Vec<&str> = erg
        .lines()
        .skip_while(|line| *line != "[COURSE DATA]")
        .skip(1)
        .take_while(|line| *line != "[END COURSE DATA]")
        .collect();

    assert_eq!(data.len(), 14);
    assert_eq!(data[0], "0.00\t150");
    assert_eq!(data[1], "10.00\t225");
    assert_eq!(data[2], "10.00\t330");
    assert_eq!(data[3], "12.00\t330");
    assert_eq!(data[4], "12.00\t150");
    assert_eq!(data[13], "23.00\t120");
}

#[test]
fn test_erg_cues_use_fixed_display_time() {
    let erg = export_erg(&interval_workout(), 300, true).unwrap();

    assert!(erg.contains("600\tInterval ON - 110% FTP\t10"));
    assert!(erg.contains("720\tRecovery - 50% FTP\t10"));
    assert!(erg.contains("1080\tCooldown - gradually decrease effort\t10"));
    assert!(erg.ends_with("[END COURSE TEXT]"));
}

#[test]
fn test_mrc_does_not_depend_on_ftp() {
    let mrc = export_mrc(&interval_workout(), false).unwrap();

    assert!(mrc.contains("0.00\t50\n10.00\t75\n10.00\t110\n12.00\t110"));
    assert!(!mrc.contains("FTP"));
}

#[test]
fn test_gap_is_bridged_at_half_ftp() {
    let workout = Workout::new(
        "Gappy".to_string(),
        vec![
            Segment::flat(SegmentKind::SteadyState, 0, 60, 0.8),
            Segment::flat(SegmentKind::SteadyState, 120, 60, 0.9),
        ],
    );

    let mrc = export_mrc(&workout, false).unwrap();
    assert!(mrc.contains("0.00\t80\n1.00\t80\n2.00\t50\n2.00\t90\n3.00\t90"));
}
