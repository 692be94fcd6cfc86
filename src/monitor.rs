use serde::Serialize;

use crate::detection::engine::{CalibrationError, FallDecisionEngine};
use crate::detection::types::{Baseline, DetectionResult, PoseFrame};
use crate::detection::Clock;
use crate::notify::{FallAlert, Notifier};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MonitorStats {
    pub frames: u64,
    pub frames_without_pose: u64,
    pub alerts_raised: u64,
    pub notify_failures: u64,
}

/// Drives one subject's engine from a frame stream and fans alarms out to notifiers.
pub struct Monitor {
    engine: FallDecisionEngine,
    clock: Box<dyn Clock>,
    subject_id: String,
    notifiers: Vec<Box<dyn Notifier>>,
    stats: MonitorStats,
}

impl Monitor {
    pub fn new(
        engine: FallDecisionEngine,
        clock: Box<dyn Clock>,
        subject_id: impl Into<String>,
    ) -> Self {
        Self {
            engine,
            clock,
            subject_id: subject_id.into(),
            notifiers: Vec::new(),
            stats: MonitorStats::default(),
        }
    }

    pub fn with_notifier(mut self, notifier: Box<dyn Notifier>) -> Self {
        self.add_notifier(notifier);
        self
    }

    pub fn add_notifier(&mut self, notifier: Box<dyn Notifier>) {
        tracing::debug!(notifier = notifier.name(), "Notifier registered");
        self.notifiers.push(notifier);
    }

    pub fn engine(&self) -> &FallDecisionEngine {
        &self.engine
    }

    pub fn subject_id(&self) -> &str {
        &self.subject_id
    }

    pub fn stats(&self) -> MonitorStats {
        self.stats
    }

    /// Evaluate a frame, using its own timestamp or the clock when it carries none.
    pub fn process(&mut self, frame: &PoseFrame) -> DetectionResult {
        let now = frame.timestamp.unwrap_or_else(|| self.clock.now());
        self.process_at(frame, now)
    }

    pub fn process_at(&mut self, frame: &PoseFrame, now: f64) -> DetectionResult {
        self.stats.frames += 1;

        let Some(joints) = frame.joints.as_ref() else {
            // no person: engine state (history, debounce, cooldown) is left untouched
            self.stats.frames_without_pose += 1;
            return DetectionResult::empty(now);
        };

        let result = self.engine.evaluate(joints, frame.frame_height, now);
        if let Some(alert) = FallAlert::from_result(&result, &self.subject_id) {
            self.stats.alerts_raised += 1;
            self.dispatch(&alert);
        }
        result
    }

    fn dispatch(&mut self, alert: &FallAlert) {
        for notifier in self.notifiers.iter_mut() {
            if let Err(e) = notifier.notify(alert) {
                self.stats.notify_failures += 1;
                tracing::warn!(
                    notifier = notifier.name(),
                    alert_id = %alert.alert_id,
                    error = %e,
                    "Failed to deliver fall alert"
                );
            }
        }
    }

    pub fn calibrate(&mut self, frame: &PoseFrame) -> Result<Baseline, CalibrationError> {
        let joints = frame
            .joints
            .as_ref()
            .ok_or(CalibrationError::MissingFeature { feature: "pose" })?;
        self.engine.calibrate_from_pose(joints, frame.frame_height)
    }

    pub fn reset_cooldown(&mut self) {
        self.engine.force_reset_cooldown();
    }

    pub fn reset_calibration(&mut self) {
        self.engine.reset_calibration();
    }
}
