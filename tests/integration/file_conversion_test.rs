//! Integration tests for moving workouts between ZWO, ERG and MRC files.

use zwoforge::workouts::exporter_erg::{erg_file_name, export_erg};
use zwoforge::workouts::exporter_mrc::{export_mrc, mrc_file_name};
use zwoforge::workouts::exporter_zwo::export_zwo;
use zwoforge::workouts::parser_mrc::parse_course_file;
use zwoforge::workouts::parser_zwo::parse_zwo;
use zwoforge::workouts::types::{FormatError, PowerShape, SegmentKind};

const TEMPO_ZWO: &str = r#"<workout_file>
    <name>Tempo</name>
    <description>Tempo with a build</description>
    <workout>
        <Warmup Duration="600" PowerLow="0.5" PowerHigh="0.7"/>
        <SteadyState Duration="1200" Power="0.8"/>
        <Ramp Duration="300" PowerLow="0.8" PowerHigh="1.0"/>
        <Cooldown Duration="300" PowerLow="0.6" PowerHigh="0.4"/>
    </workout>
</workout_file>"#;

#[test]
fn test_erg_export_reimports_with_same_envelope() {
    let workout = parse_zwo(TEMPO_ZWO).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(erg_file_name(&workout));
    std::fs::write(&path, export_erg(&workout, 250, true).unwrap()).unwrap();

    // FTP in the file wins over the fallback
    let imported = parse_course_file(&path, 400).unwrap();

    assert_eq!(imported.name, "Tempo");
    assert_eq!(imported.description, "Tempo with a build");
    assert_eq!(imported.total_duration, workout.total_duration);
    assert_eq!(imported.segments.len(), 4);
    for (original, reimported) in workout.segments.iter().zip(&imported.segments) {
        assert_eq!(original.start_time, reimported.start_time);
        assert_eq!(original.duration, reimported.duration);
        assert!(original.power.approx_eq(&reimported.power));
    }
    assert_eq!(imported.segments[1].kind, SegmentKind::SteadyState);
    assert_eq!(imported.segments[2].kind, SegmentKind::Ramp);
}

#[test]
fn test_mrc_export_reimports() {
    let workout = parse_zwo(TEMPO_ZWO).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(mrc_file_name(&workout));
    std::fs::write(&path, export_mrc(&workout, false).unwrap()).unwrap();

    let imported = parse_course_file(&path, 250).unwrap();

    assert_eq!(imported.total_duration, 2400);
    assert_eq!(imported.tss, workout.tss);
    assert_eq!(
        imported.segments[3].power,
        PowerShape::Ramp { low: 0.6, high: 0.4 }
    );
}

#[test]
fn test_convert_trainer_file_to_zwo() {
    let mrc = "[COURSE HEADER]\nFILE NAME = Over Unders.mrc\nMINUTES PERCENT\n[END COURSE HEADER]\n\
               [COURSE DATA]\n0.00\t95\n2.00\t95\n2.00\t105\n3.00\t105\n3.00\t95\n5.00\t95\n\
               [END COURSE DATA]";
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("over_unders.mrc");
    std::fs::write(&path, mrc).unwrap();

    let workout = parse_course_file(&path, 250).unwrap();
    let zwo = export_zwo(&workout).unwrap();
    let reparsed = parse_zwo(&zwo).unwrap();

    assert_eq!(reparsed.name, "Over Unders");
    assert_eq!(reparsed.total_duration, 300);
    assert_eq!(reparsed.segments.len(), 3);
    assert!(zwo.contains(r#"<SteadyState Duration="60" Power="1.05"/>"#));
}

#[test]
fn test_missing_course_file() {
    let dir = tempfile::tempdir().unwrap();
    let result = parse_course_file(&dir.path().join("absent.erg"), 250);
    assert!(matches!(result, Err(FormatError::Io(_))));
}
