mod common;

use std::fs::{self, File};
use std::io::{BufReader, Cursor, Write};

use fall_sentinel::detection::types::DetectionResult;
use fall_sentinel::detection::ManualClock;
use fall_sentinel::monitor::Monitor;
use fall_sentinel::notify::{FallAlert, JsonLinesNotifier, MemoryNotifier};
use fall_sentinel::replay::{self, ReplayError, StreamEvent};

use common::fixtures::{engine, frame, lying, standing};

fn event_line(event: &StreamEvent) -> String {
    let mut line = serde_json::to_string(event).expect("serialize event");
    line.push('\n');
    line
}

#[test]
fn at_replay_from_file_writes_results_and_alert_log() {
    let dir = tempfile::tempdir().expect("tempdir");
    let frames_path = dir.path().join("frames.jsonl");
    let alerts_path = dir.path().join("alerts.jsonl");

    {
        let mut file = File::create(&frames_path).expect("create frames");
        file.write_all(event_line(&StreamEvent::Calibrate(frame(standing(), 0.0))).as_bytes())
            .expect("write");
        for i in 0..3 {
            let event = StreamEvent::Frame(frame(standing(), i as f64 * 0.1));
            file.write_all(event_line(&event).as_bytes()).expect("write");
        }
        for i in 3..10 {
            let event = StreamEvent::Frame(frame(lying(), i as f64 * 0.1));
            file.write_all(event_line(&event).as_bytes()).expect("write");
        }
    }

    let alert_file = File::create(&alerts_path).expect("create alert log");
    let mut monitor = Monitor::new(engine(), Box::new(ManualClock::default()), "ward-1")
        .with_notifier(Box::new(JsonLinesNotifier::new(alert_file)));

    let reader = BufReader::new(File::open(&frames_path).expect("open frames"));
    let mut out = Vec::new();
    let summary = replay::run(&mut monitor, reader, &mut out, true).expect("replay");

    assert_eq!(summary.events, 11);
    assert_eq!(summary.frames, 10);
    assert_eq!(summary.calibrations, 1);
    assert_eq!(summary.alerts, 1);
    assert_eq!(monitor.stats().alerts_raised, 1);

    let results: Vec<DetectionResult> = String::from_utf8(out)
        .expect("utf8")
        .lines()
        .map(|l| serde_json::from_str(l).expect("result line"))
        .collect();
    assert_eq!(results.len(), 10);
    assert!(results.iter().take(3).all(|r| !r.is_fall_detected));
    assert_eq!(results.iter().filter(|r| r.is_fall_detected).count(), 1);

    let alerts = fs::read_to_string(&alerts_path).expect("read alert log");
    let alerts: Vec<FallAlert> = alerts
        .lines()
        .map(|l| serde_json::from_str(l).expect("alert line"))
        .collect();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].subject_id, "ward-1");
    assert!(alerts[0].torso_angle.expect("angle") > 50.0);
}

#[test]
fn at_operator_commands_reopen_alarm() {
    let mut input = String::new();
    for i in 0..5 {
        input.push_str(&event_line(&StreamEvent::Frame(frame(lying(), i as f64))));
    }
    input.push_str(&event_line(&StreamEvent::ResetCooldown));
    for i in 5..10 {
        input.push_str(&event_line(&StreamEvent::Frame(frame(lying(), i as f64))));
    }

    let memory = MemoryNotifier::new();
    let mut monitor = Monitor::new(engine(), Box::new(ManualClock::default()), "ward-2")
        .with_notifier(Box::new(memory.clone()));
    let summary =
        replay::run(&mut monitor, Cursor::new(input), std::io::sink(), false).expect("replay");

    assert_eq!(summary.alerts, 2);
    assert_eq!(monitor.stats().notify_failures, 0);
    let timestamps: Vec<f64> = memory.alerts().iter().map(|a| a.timestamp).collect();
    assert_eq!(timestamps, vec![4.0, 9.0]);
}

#[test]
fn at_frames_without_pose_are_passed_through() {
    let input = concat!(
        r#"{"type":"frame","timestamp":0.0,"frame_height":480}"#,
        "\n",
        r#"{"type":"frame","timestamp":0.1,"frame_height":480,"joints":null}"#,
        "\n",
    );
    let mut monitor = Monitor::new(engine(), Box::new(ManualClock::default()), "ward-3");
    let mut out = Vec::new();
    let summary = replay::run(&mut monitor, Cursor::new(input), &mut out, true).expect("replay");

    assert_eq!(summary.frames, 2);
    assert_eq!(monitor.stats().frames_without_pose, 2);
    assert_eq!(String::from_utf8(out).expect("utf8").lines().count(), 2);
}

#[test]
fn at_malformed_stream_is_rejected() {
    let input = "{\"type\":\"frame\",\"frame_height\":480}\nnot json\n";
    let mut monitor = Monitor::new(engine(), Box::new(ManualClock::default()), "ward-4");
    let err = replay::run(&mut monitor, Cursor::new(input), std::io::sink(), false)
        .expect_err("malformed line");
    match err {
        ReplayError::Parse { line, .. } => assert_eq!(line, 2),
        other => panic!("unexpected error: {other}"),
    }
}
