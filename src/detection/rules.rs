use serde::{Deserialize, Serialize};

use crate::constants::BASELINE_HEAD_DROP_MULTIPLIER;
use crate::detection::config::DetectorConfig;
use crate::detection::types::{Baseline, Point, Severity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleId {
    TorsoAngle,
    HeadDrop,
    CenterShift,
}

impl RuleId {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleId::TorsoAngle => "torso_angle",
            RuleId::HeadDrop => "head_drop",
            RuleId::CenterShift => "center_shift",
        }
    }
}

/// A rule that fired on the current frame.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleOutcome {
    pub rule: RuleId,
    pub severity: Severity,
    pub reason: String,
}

/// Torso tilt: SEVERE at or above `severe_angle_min`, MILD at or above `torso_angle_threshold`.
pub fn check_torso_angle(angle: Option<f64>, config: &DetectorConfig) -> Option<RuleOutcome> {
    let angle = angle?;
    let severity = if angle >= config.severe_angle_min {
        Severity::Severe
    } else if angle >= config.torso_angle_threshold {
        Severity::Mild
    } else {
        return None;
    };
    Some(RuleOutcome {
        rule: RuleId::TorsoAngle,
        severity,
        reason: format!("torso tilt abnormal: {angle:.1}°"),
    })
}

/// Head drop: a frame-to-frame rise of the nose ratio, or (once calibrated) a
/// sustained offset from the upright baseline. Either condition fires the rule.
pub fn check_head_drop(
    head_height: Option<f64>,
    last_delta: Option<f64>,
    baseline: Option<&Baseline>,
    config: &DetectorConfig,
) -> Option<RuleOutcome> {
    let current = head_height?;
    let threshold = config.head_drop_threshold;

    if let Some(delta) = last_delta {
        if delta > threshold {
            return Some(RuleOutcome {
                rule: RuleId::HeadDrop,
                severity: Severity::Mild,
                reason: format!("head height dropped suddenly: +{delta:.2} in one frame"),
            });
        }
    }

    if let Some(base) = baseline {
        let diff = current - base.head_height_ratio;
        if diff > threshold * BASELINE_HEAD_DROP_MULTIPLIER {
            return Some(RuleOutcome {
                rule: RuleId::HeadDrop,
                severity: Severity::Mild,
                reason: format!("head height {diff:.2} below calibrated baseline"),
            });
        }
    }

    None
}

/// Center shift: the largest adjacent-frame jump in the recent window exceeds the threshold.
/// A frame without its own body center never fires, whatever the history holds.
pub fn check_center_shift(
    center: Option<Point>,
    max_shift: Option<f64>,
    config: &DetectorConfig,
) -> Option<RuleOutcome> {
    center?;
    let shift = max_shift?;
    if shift > config.center_shift_threshold {
        return Some(RuleOutcome {
            rule: RuleId::CenterShift,
            severity: Severity::Mild,
            reason: format!("body center shifted sharply: {shift:.1}px"),
        });
    }
    None
}

/// Highest severity among fired rules, `None` when nothing fired.
pub fn overall_severity(outcomes: &[RuleOutcome]) -> Severity {
    outcomes
        .iter()
        .map(|o| o.severity)
        .max()
        .unwrap_or(Severity::None)
}
