use thiserror::Error;

use crate::constants::{RULE_COUNT, SEVERE_CONFIDENCE_BOOST};
use crate::detection::config::{ConfigError, DetectorConfig};
use crate::detection::geometry;
use crate::detection::rules::{self, RuleOutcome};
use crate::detection::tracker::{Signal, TemporalTracker};
use crate::detection::types::*;

#[derive(Debug, Error, PartialEq)]
pub enum CalibrationError {
    #[error("cannot calibrate: {feature} is not available from the current pose")]
    MissingFeature { feature: &'static str },
}

/// Per-subject fall decision state machine.
///
/// Owns the feature history, the debounce counter, the cooldown timestamp and
/// the optional upright baseline. Frames must be fed in timestamp order.
#[derive(Debug, Clone)]
pub struct FallDecisionEngine {
    config: DetectorConfig,
    tracker: TemporalTracker,
    baseline: Option<Baseline>,
    alert: AlertState,
    last_evaluated_at: Option<f64>,
}

impl FallDecisionEngine {
    pub fn new(config: DetectorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            tracker: TemporalTracker::new(config.history_capacity),
            config,
            baseline: None,
            alert: AlertState::default(),
            last_evaluated_at: None,
        })
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn tracker(&self) -> &TemporalTracker {
        &self.tracker
    }

    pub fn baseline(&self) -> Option<&Baseline> {
        self.baseline.as_ref()
    }

    pub fn is_calibrated(&self) -> bool {
        self.baseline.is_some()
    }

    pub fn alert_state(&self) -> AlertState {
        self.alert
    }

    pub fn consecutive_detections(&self) -> u32 {
        self.alert.consecutive_detections
    }

    pub fn last_alert_time(&self) -> Option<f64> {
        self.alert.last_alert_time
    }

    pub fn is_in_cooldown(&self, now: f64) -> bool {
        self.cooldown_remaining(now).is_some()
    }

    /// Seconds until another alarm may fire, `None` when not cooling down.
    pub fn cooldown_remaining(&self, now: f64) -> Option<f64> {
        let last = self.alert.last_alert_time?;
        let elapsed = now - last;
        if elapsed < self.config.cooldown_seconds {
            Some(self.config.cooldown_seconds - elapsed)
        } else {
            None
        }
    }

    /// Features for one frame after visibility gating.
    pub fn features(&self, joints: &JointMap, frame_height: u32) -> FeatureSet {
        if self.config.min_joint_visibility > 0.0 {
            let visible = joints.visible(self.config.min_joint_visibility);
            geometry::extract_features(&visible, frame_height)
        } else {
            geometry::extract_features(joints, frame_height)
        }
    }

    pub fn evaluate(&mut self, joints: &JointMap, frame_height: u32, now: f64) -> DetectionResult {
        let now = self.monotonic(now);
        let features = self.features(joints, frame_height);

        self.tracker.update(
            features.torso_angle,
            features.body_center,
            features.head_height_ratio,
        );

        let outcomes = self.evaluate_rules(&features);
        let severity = rules::overall_severity(&outcomes);
        let trigger_count = outcomes.len();

        self.update_debounce(trigger_count > 0);

        let mut should_alert = trigger_count >= 2
            || self.alert.consecutive_detections >= self.config.consecutive_frames_threshold;

        if should_alert {
            if let Some(remaining) = self.cooldown_remaining(now) {
                tracing::debug!(
                    remaining_secs = remaining,
                    triggers = trigger_count,
                    "Fall alarm suppressed by cooldown"
                );
                should_alert = false;
            }
        }

        let confidence = self.compute_confidence(trigger_count, severity);

        if should_alert {
            self.alert.last_alert_time = Some(now);
            tracing::info!(
                severity = %severity,
                confidence,
                triggers = trigger_count,
                consecutive = self.alert.consecutive_detections,
                torso_angle = ?features.torso_angle,
                "Fall alarm raised"
            );
        }

        DetectionResult {
            is_fall_detected: should_alert,
            severity,
            torso_angle: features.torso_angle,
            body_center: features.body_center,
            head_height_ratio: features.head_height_ratio,
            center_shift: features.body_center.and(self.tracker.last_center_shift()),
            trigger_reasons: outcomes.into_iter().map(|o| o.reason).collect(),
            confidence,
            timestamp: now,
        }
    }

    /// Store the upright reference posture, replacing any earlier one.
    pub fn calibrate(&mut self, head_height: f64, center: Point) {
        self.baseline = Some(Baseline {
            head_height_ratio: head_height,
            body_center: center,
        });
        tracing::info!(head_height, center_x = center.x, center_y = center.y, "Baseline calibrated");
    }

    /// Calibrate from a live pose; the subject is expected to be standing.
    pub fn calibrate_from_pose(
        &mut self,
        joints: &JointMap,
        frame_height: u32,
    ) -> Result<Baseline, CalibrationError> {
        let features = self.features(joints, frame_height);
        let head = features
            .head_height_ratio
            .ok_or(CalibrationError::MissingFeature {
                feature: "head_height_ratio",
            })?;
        let center = features.body_center.ok_or(CalibrationError::MissingFeature {
            feature: "body_center",
        })?;
        self.calibrate(head, center);
        Ok(Baseline {
            head_height_ratio: head,
            body_center: center,
        })
    }

    pub fn reset_calibration(&mut self) {
        self.baseline = None;
        self.tracker.reset();
        tracing::info!("Calibration and feature history reset");
    }

    pub fn force_reset_cooldown(&mut self) {
        self.alert.last_alert_time = None;
        self.alert.consecutive_detections = 0;
        tracing::info!("Alarm cooldown reset");
    }

    /// Multi-line operator summary of a result and the current debounce progress.
    pub fn status_text(&self, result: &DetectionResult) -> String {
        let mut lines = Vec::new();
        if let Some(angle) = result.torso_angle {
            lines.push(format!("Torso angle: {angle:.1}°"));
        }
        if let Some(head) = result.head_height_ratio {
            lines.push(format!("Head height: {head:.2}"));
        }
        if let Some(shift) = result.center_shift {
            lines.push(format!("Center shift: {shift:.1}px"));
        }
        lines.push(format!(
            "Consecutive: {}/{}",
            self.alert.consecutive_detections, self.config.consecutive_frames_threshold
        ));
        if result.is_fall_detected {
            lines.push(format!(
                "ALERT: {} ({:.0}%)",
                result.severity,
                result.confidence * 100.0
            ));
        }
        lines.join("\n")
    }

    fn monotonic(&mut self, now: f64) -> f64 {
        let last = self.last_evaluated_at;
        let now = match last {
            _ if !now.is_finite() => {
                tracing::warn!(now, "Non-finite frame timestamp, reusing last timestamp");
                last.unwrap_or(0.0)
            }
            Some(prev) if now < prev => {
                tracing::warn!(now, previous = prev, "Frame timestamp went backwards, clamping");
                prev
            }
            _ => now,
        };
        self.last_evaluated_at = Some(now);
        now
    }

    fn evaluate_rules(&self, features: &FeatureSet) -> Vec<RuleOutcome> {
        let cfg = &self.config;
        let mut outcomes = Vec::with_capacity(RULE_COUNT);

        if let Some(o) = rules::check_torso_angle(features.torso_angle, cfg) {
            outcomes.push(o);
        }
        if let Some(o) = rules::check_head_drop(
            features.head_height_ratio,
            self.tracker.last_delta(Signal::HeadHeight),
            self.baseline.as_ref(),
            cfg,
        ) {
            outcomes.push(o);
        }
        if let Some(o) = rules::check_center_shift(
            features.body_center,
            self.tracker.max_center_shift(cfg.shift_window),
            cfg,
        ) {
            outcomes.push(o);
        }

        outcomes
    }

    fn update_debounce(&mut self, triggered: bool) {
        let counter = &mut self.alert.consecutive_detections;
        if triggered {
            *counter = counter.saturating_add(1);
        } else {
            *counter = counter.saturating_sub(1);
        }
    }

    fn compute_confidence(&self, trigger_count: usize, severity: Severity) -> f64 {
        let mut confidence = trigger_count as f64 / RULE_COUNT as f64;

        if severity == Severity::Severe {
            confidence *= SEVERE_CONFIDENCE_BOOST;
        }

        let frame_ratio = (self.alert.consecutive_detections as f64
            / self.config.consecutive_frames_threshold as f64)
            .min(1.0);
        confidence *= 0.5 + 0.5 * frame_ratio;

        confidence.clamp(0.0, 1.0)
    }
}
