mod common;

use fall_sentinel::detection::tracker::{Signal, TemporalTracker};
use fall_sentinel::detection::types::{Joint, Landmark, Point, Severity};
use fall_sentinel::detection::DetectorConfig;

use common::fixtures::{
    engine, engine_with, lying, shifted, standing, with_nose_at, FRAME_HEIGHT,
};

#[test]
fn at_upright_torso_does_not_trigger() {
    let mut engine = engine();
    let result = engine.evaluate(&standing(), FRAME_HEIGHT, 0.0);

    let angle = result.torso_angle.expect("torso angle");
    assert!(angle.abs() < 1e-9);
    assert_eq!(result.severity, Severity::None);
    assert!(result.trigger_reasons.is_empty());
    assert!(!result.is_fall_detected);
}

#[test]
fn at_horizontal_torso_is_severe_with_angle_in_reason() {
    let mut engine = engine();
    let result = engine.evaluate(&lying(), FRAME_HEIGHT, 0.0);

    let angle = result.torso_angle.expect("torso angle");
    assert!(angle >= 50.0);
    assert_eq!(result.severity, Severity::Severe);
    assert_eq!(result.trigger_reasons.len(), 1);
    assert!(result.trigger_reasons[0].contains("76.0"));
    // one rule on the first frame is not enough on its own
    assert!(!result.is_fall_detected);
}

#[test]
fn at_sudden_nose_drop_triggers_head_rule() {
    let mut engine = engine();
    engine.evaluate(&with_nose_at(&standing(), 100), FRAME_HEIGHT, 0.0);
    let result = engine.evaluate(&with_nose_at(&standing(), 400), FRAME_HEIGHT, 0.1);

    let delta = engine
        .tracker()
        .last_delta(Signal::HeadHeight)
        .expect("head delta");
    assert!((delta - 0.625).abs() < 1e-9);
    assert_eq!(result.severity, Severity::Mild);
    assert_eq!(result.trigger_reasons.len(), 1);
    assert!(result.trigger_reasons[0].contains("head height dropped suddenly"));
    assert_eq!(engine.consecutive_detections(), 1);
}

#[test]
fn at_motionless_subject_never_alarms() {
    let mut engine = engine();
    for i in 0..50 {
        let result = engine.evaluate(&standing(), FRAME_HEIGHT, i as f64 * 0.1);
        assert!(!result.is_fall_detected);
        assert_eq!(result.confidence, 0.0);
    }
    assert_eq!(engine.consecutive_detections(), 0);
}

#[test]
fn at_single_rule_alarm_fires_exactly_at_threshold() {
    for threshold in [1_u32, 3, 5, 8] {
        let mut engine = engine_with(DetectorConfig {
            consecutive_frames_threshold: threshold,
            ..DetectorConfig::default()
        });
        let mut first_alarm = None;
        for frame in 1..=threshold + 2 {
            let result = engine.evaluate(&lying(), FRAME_HEIGHT, frame as f64 * 0.1);
            assert!(result.trigger_count() <= 1);
            if result.is_fall_detected && first_alarm.is_none() {
                first_alarm = Some(frame);
            }
        }
        assert_eq!(first_alarm, Some(threshold), "threshold {threshold}");
    }
}

#[test]
fn at_single_rule_confidence_at_threshold() {
    let mut engine = engine();
    let mut last = None;
    for frame in 1..=5 {
        last = Some(engine.evaluate(&lying(), FRAME_HEIGHT, frame as f64 * 0.1));
    }
    let result = last.expect("result");
    assert!(result.is_fall_detected);
    // (1/3) * 1.2 * (0.5 + 0.5 * 1)
    assert!((result.confidence - 0.4).abs() < 1e-9);
}

#[test]
fn at_cross_validated_rules_bypass_debounce() {
    let mut engine = engine();
    let first = engine.evaluate(&standing(), FRAME_HEIGHT, 0.0);
    assert!(first.trigger_reasons.is_empty());

    let fallen = with_nose_at(&shifted(&lying(), 300, 0), 400);
    let result = engine.evaluate(&fallen, FRAME_HEIGHT, 0.1);

    assert_eq!(result.trigger_count(), 3);
    assert_eq!(engine.consecutive_detections(), 1);
    assert!(result.is_fall_detected);
    assert_eq!(result.severity, Severity::Severe);
    // 1.0 * 1.2 * (0.5 + 0.5 * 1/5)
    assert!((result.confidence - 0.72).abs() < 1e-9);
    assert!(result.center_shift.expect("shift") > 150.0);
}

#[test]
fn at_cooldown_suppresses_repeat_alarms() {
    let mut engine = engine();
    let mut alarms = Vec::new();
    for t in 0..=40 {
        let now = t as f64;
        let result = engine.evaluate(&lying(), FRAME_HEIGHT, now);
        if result.is_fall_detected {
            alarms.push(now);
        }
        if t > 4 && t < 34 {
            assert!(engine.is_in_cooldown(now));
        }
    }
    assert_eq!(alarms, vec![4.0, 34.0]);
    // debounce keeps counting while the alarm is suppressed
    assert!(engine.consecutive_detections() > 5);
}

#[test]
fn at_force_reset_cooldown_reopens_alarm() {
    let mut engine = engine();
    for t in 0..=4 {
        engine.evaluate(&lying(), FRAME_HEIGHT, t as f64);
    }
    assert_eq!(engine.last_alert_time(), Some(4.0));

    engine.force_reset_cooldown();
    assert_eq!(engine.consecutive_detections(), 0);
    assert!(!engine.is_in_cooldown(5.0));

    let mut alarms = Vec::new();
    for t in 5..=12 {
        let result = engine.evaluate(&lying(), FRAME_HEIGHT, t as f64);
        if result.is_fall_detected {
            alarms.push(t);
        }
    }
    assert_eq!(alarms, vec![9]);
}

#[test]
fn at_debounce_decays_linearly() {
    let mut engine = engine();
    for t in 0..3 {
        engine.evaluate(&lying(), FRAME_HEIGHT, t as f64 * 0.1);
    }
    assert_eq!(engine.consecutive_detections(), 3);

    let mut seen = Vec::new();
    for t in 3..7 {
        engine.evaluate(&standing(), FRAME_HEIGHT, t as f64 * 0.1);
        seen.push(engine.consecutive_detections());
    }
    assert_eq!(seen, vec![2, 1, 0, 0]);
}

#[test]
fn at_missing_hip_disables_torso_and_center() {
    let mut engine = engine();
    let mut joints = lying();
    joints.remove(Joint::LeftHip);

    for t in 0..10 {
        let result = engine.evaluate(&joints, FRAME_HEIGHT, t as f64 * 0.1);
        assert!(result.torso_angle.is_none());
        assert!(result.body_center.is_none());
        assert!(result.center_shift.is_none());
        assert!(result.trigger_reasons.is_empty());
        assert!(!result.is_fall_detected);
    }
}

#[test]
fn at_stale_center_jump_does_not_fire_without_current_center() {
    let mut engine = engine();
    engine.evaluate(&standing(), FRAME_HEIGHT, 0.0);
    let jumped = shifted(&standing(), 300, 0);
    let result = engine.evaluate(&jumped, FRAME_HEIGHT, 0.1);
    assert_eq!(result.trigger_count(), 1);
    assert!(result.trigger_reasons[0].contains("body center shifted sharply"));

    let mut hipless = jumped;
    hipless.remove(Joint::LeftHip);
    for i in 2..12 {
        let result = engine.evaluate(&hipless, FRAME_HEIGHT, i as f64 * 0.1);
        assert!(result.body_center.is_none());
        assert!(result.center_shift.is_none());
        assert!(result
            .trigger_reasons
            .iter()
            .all(|r| !r.contains("body center")));
        assert!(!result.is_fall_detected);
    }
    assert_eq!(engine.consecutive_detections(), 0);
}

#[test]
fn at_empty_joint_map_is_not_an_error() {
    let mut engine = engine();
    let result = engine.evaluate(&Default::default(), FRAME_HEIGHT, 0.0);
    assert_eq!(result.severity, Severity::None);
    assert!(result.head_height_ratio.is_none());
    assert_eq!(result.confidence, 0.0);
}

#[test]
fn at_calibrated_baseline_catches_slow_sink() {
    let sunk = with_nose_at(&standing(), 300);

    let mut uncalibrated = engine();
    let result = uncalibrated.evaluate(&sunk, FRAME_HEIGHT, 0.0);
    assert!(result.trigger_reasons.is_empty());

    let mut calibrated = engine();
    let baseline = calibrated
        .calibrate_from_pose(&standing(), FRAME_HEIGHT)
        .expect("calibrate");
    assert!((baseline.head_height_ratio - 0.125).abs() < 1e-9);

    let result = calibrated.evaluate(&sunk, FRAME_HEIGHT, 0.0);
    assert_eq!(result.trigger_reasons.len(), 1);
    assert!(result.trigger_reasons[0].contains("baseline"));

    calibrated.reset_calibration();
    assert!(!calibrated.is_calibrated());
    assert_eq!(calibrated.tracker().center_len(), 0);
}

#[test]
fn at_low_visibility_joints_are_ignored() {
    let mut engine = engine_with(DetectorConfig {
        min_joint_visibility: 0.5,
        ..DetectorConfig::default()
    });
    let mut joints = lying();
    joints.insert(Joint::LeftHip, Landmark::with_visibility(300, 150, 0.2));

    let result = engine.evaluate(&joints, FRAME_HEIGHT, 0.0);
    assert!(result.torso_angle.is_none());
    assert!(result.head_height_ratio.is_some());
}

#[test]
fn at_backwards_timestamp_is_clamped() {
    let mut engine = engine();
    engine.evaluate(&standing(), FRAME_HEIGHT, 5.0);
    let result = engine.evaluate(&standing(), FRAME_HEIGHT, 4.0);
    assert_eq!(result.timestamp, 5.0);
}

#[test]
fn at_max_center_shift_is_largest_step_not_net_displacement() {
    let mut tracker = TemporalTracker::new(30);
    for x in [0.0, 500.0, 510.0, 520.0, 530.0, 540.0, 550.0] {
        tracker.update(None, Some(Point::new(x, 0.0)), None);
    }
    // the 500px jump is older than the last five steps
    let shift = tracker.max_center_shift(5).expect("shift");
    assert!((shift - 10.0).abs() < 1e-9);

    let mut tracker = TemporalTracker::new(30);
    for x in [0.0, 10.0, 20.0, 200.0, 210.0, 220.0] {
        tracker.update(None, Some(Point::new(x, 0.0)), None);
    }
    let shift = tracker.max_center_shift(5).expect("shift");
    assert!((shift - 180.0).abs() < 1e-9);
}
