//! Unit tests for TSS and interval expansion properties.

use zwoforge::workouts::intervals::{expand, IntervalSpec};
use zwoforge::workouts::parser_zwo::parse_zwo;
use zwoforge::workouts::tss::{compute_tss, normalized_power};
use zwoforge::workouts::types::{Segment, SegmentKind};

#[test]
fn test_warmup_and_steady_scenario() {
    let zwo = r#"<workout_file>
    <workout>
        <Warmup Duration="600" PowerLow="0.5" PowerHigh="0.75"/>
        <SteadyState Duration="1200" Power="0.65"/>
    </workout>
</workout_file>"#;

    let workout = parse_zwo(zwo).unwrap();
    assert_eq!(workout.total_duration, 1800);
    assert_eq!(workout.segments.len(), 2);

    let expected_np = ((0.625f64.powi(4) * 600.0 + 0.65f64.powi(4) * 1200.0) / 1800.0).powf(0.25);
    let np = normalized_power(&workout.segments).unwrap();
    assert!((np - expected_np).abs() < 1e-12);
    assert!((np - 0.642).abs() < 0.001);

    // 1800 * 0.642^2 / 3600 * 100 = 20.6
    assert_eq!(workout.tss, 21);
}

#[test]
fn test_tss_is_monotonic_in_power() {
    let mut previous = 0;
    for percent in (40..=150).step_by(5) {
        let power = percent as f64 / 100.0;
        let segments = vec![
            Segment::ramp(SegmentKind::Warmup, 0, 600, 0.5, 0.7),
            Segment::flat(SegmentKind::SteadyState, 600, 1200, power),
        ];
        let tss = compute_tss(&segments);
        assert!(tss >= previous, "TSS dropped at {}%", percent);
        previous = tss;
    }
}

#[test]
fn test_expanded_segment_count() {
    for repeat in 1..=8 {
        let with_recovery = IntervalSpec {
            repeat,
            ..Default::default()
        };
        assert_eq!(expand(&with_recovery, 0).len() as u32, 2 * repeat - 1);

        let without_recovery = IntervalSpec {
            repeat,
            off_duration: 0,
            ..Default::default()
        };
        assert_eq!(expand(&without_recovery, 0).len() as u32, repeat);
    }
}

#[test]
fn test_expanded_total_is_sum_of_durations() {
    let spec = IntervalSpec {
        repeat: 5,
        on_duration: 40,
        off_duration: 20,
        ..Default::default()
    };
    let segments = expand(&spec, 100);

    let sum: u32 = segments.iter().map(|s| s.duration).sum();
    assert_eq!(segments.last().unwrap().end_time() - 100, sum);
    assert_eq!(sum, spec.total_duration());
}

#[test]
fn test_on_low_is_not_rendered() {
    // Progressive intervals are parsed, but every work block runs at the high value
    let spec = IntervalSpec {
        repeat: 2,
        on_low: 0.8,
        on_high: 1.2,
        ..Default::default()
    };

    for segment in expand(&spec, 0)
        .iter()
        .filter(|s| s.kind == SegmentKind::IntervalOn)
    {
        assert!(segment.curve.iter().all(|p| (p.power - 120.0).abs() < 1e-9));
    }
}
