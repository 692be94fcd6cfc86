use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    DEFAULT_CENTER_SHIFT_PX, DEFAULT_CONSECUTIVE_FRAMES, DEFAULT_COOLDOWN_SECS,
    DEFAULT_HEAD_DROP_PX, DEFAULT_HISTORY_CAPACITY, DEFAULT_SHIFT_WINDOW,
    REFERENCE_FRAME_HEIGHT_PX,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{field} must be a finite number")]
    NonFinite { field: &'static str },
    #[error("{field} must be {expected} (got {value})")]
    OutOfRange {
        field: &'static str,
        value: f64,
        expected: &'static str,
    },
    #[error("{field} is inverted: low={low} must be <= high={high}")]
    InvertedRange {
        field: &'static str,
        low: f64,
        high: f64,
    },
    #[error("{field} must be > 0")]
    Zero { field: &'static str },
    #[error("invalid detector config json: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Thresholds and window sizes for the fall-decision engine.
///
/// Angles are in degrees, `head_drop_threshold` is a fraction of frame height,
/// `center_shift_threshold` is in pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorConfig {
    #[serde(default = "default_torso_angle_threshold")]
    pub torso_angle_threshold: f64,
    #[serde(default = "default_mild_angle_range")]
    pub mild_angle_range: (f64, f64),
    #[serde(default = "default_severe_angle_min")]
    pub severe_angle_min: f64,
    #[serde(default = "default_head_drop_threshold")]
    pub head_drop_threshold: f64,
    #[serde(default = "default_center_shift_threshold")]
    pub center_shift_threshold: f64,
    #[serde(default = "default_consecutive_frames_threshold")]
    pub consecutive_frames_threshold: u32,
    #[serde(default = "default_cooldown_seconds")]
    pub cooldown_seconds: f64,
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
    #[serde(default = "default_shift_window")]
    pub shift_window: usize,
    /// Landmarks reporting a lower visibility are treated as missing. 0 accepts everything.
    #[serde(default)]
    pub min_joint_visibility: f64,
}

fn default_torso_angle_threshold() -> f64 {
    35.0
}
fn default_mild_angle_range() -> (f64, f64) {
    (35.0, 50.0)
}
fn default_severe_angle_min() -> f64 {
    50.0
}
fn default_head_drop_threshold() -> f64 {
    DEFAULT_HEAD_DROP_PX / REFERENCE_FRAME_HEIGHT_PX
}
fn default_center_shift_threshold() -> f64 {
    DEFAULT_CENTER_SHIFT_PX
}
fn default_consecutive_frames_threshold() -> u32 {
    DEFAULT_CONSECUTIVE_FRAMES
}
fn default_cooldown_seconds() -> f64 {
    DEFAULT_COOLDOWN_SECS
}
fn default_history_capacity() -> usize {
    DEFAULT_HISTORY_CAPACITY
}
fn default_shift_window() -> usize {
    DEFAULT_SHIFT_WINDOW
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            torso_angle_threshold: default_torso_angle_threshold(),
            mild_angle_range: default_mild_angle_range(),
            severe_angle_min: default_severe_angle_min(),
            head_drop_threshold: default_head_drop_threshold(),
            center_shift_threshold: default_center_shift_threshold(),
            consecutive_frames_threshold: default_consecutive_frames_threshold(),
            cooldown_seconds: default_cooldown_seconds(),
            history_capacity: default_history_capacity(),
            shift_window: default_shift_window(),
            min_joint_visibility: 0.0,
        }
    }
}

fn check_finite(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NonFinite { field })
    }
}

fn check_angle(field: &'static str, value: f64) -> Result<(), ConfigError> {
    check_finite(field, value)?;
    if !(0.0..=90.0).contains(&value) {
        return Err(ConfigError::OutOfRange {
            field,
            value,
            expected: "in [0,90] degrees",
        });
    }
    Ok(())
}

impl DetectorConfig {
    pub fn from_env(env_config: &crate::config::DetectionEnvConfig) -> Self {
        let mut config = Self::default();
        config.torso_angle_threshold = env_config.torso_angle_threshold;
        config.mild_angle_range.0 = env_config.torso_angle_threshold;
        if env_config.reference_frame_height > 0.0 {
            config.head_drop_threshold =
                env_config.head_drop_threshold_px / env_config.reference_frame_height;
        }
        config.center_shift_threshold = env_config.center_shift_threshold;
        config.consecutive_frames_threshold = env_config.consecutive_frames;
        config.cooldown_seconds = env_config.cooldown_secs;
        config
    }

    /// Parse a JSON object; missing keys take their defaults.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_angle("torso_angle_threshold", self.torso_angle_threshold)?;
        check_angle("severe_angle_min", self.severe_angle_min)?;
        check_angle("mild_angle_range.0", self.mild_angle_range.0)?;
        check_angle("mild_angle_range.1", self.mild_angle_range.1)?;

        if self.torso_angle_threshold > self.severe_angle_min {
            return Err(ConfigError::InvertedRange {
                field: "torso_angle_threshold..severe_angle_min",
                low: self.torso_angle_threshold,
                high: self.severe_angle_min,
            });
        }

        let (low, high) = self.mild_angle_range;
        if low > high {
            return Err(ConfigError::InvertedRange {
                field: "mild_angle_range",
                low,
                high,
            });
        }
        if high > self.severe_angle_min {
            return Err(ConfigError::InvertedRange {
                field: "mild_angle_range.1..severe_angle_min",
                low: high,
                high: self.severe_angle_min,
            });
        }

        check_finite("head_drop_threshold", self.head_drop_threshold)?;
        if self.head_drop_threshold <= 0.0 || self.head_drop_threshold > 1.0 {
            return Err(ConfigError::OutOfRange {
                field: "head_drop_threshold",
                value: self.head_drop_threshold,
                expected: "in (0,1] (fraction of frame height)",
            });
        }

        check_finite("center_shift_threshold", self.center_shift_threshold)?;
        if self.center_shift_threshold <= 0.0 {
            return Err(ConfigError::OutOfRange {
                field: "center_shift_threshold",
                value: self.center_shift_threshold,
                expected: "> 0 pixels",
            });
        }

        if self.consecutive_frames_threshold == 0 {
            return Err(ConfigError::Zero {
                field: "consecutive_frames_threshold",
            });
        }

        check_finite("cooldown_seconds", self.cooldown_seconds)?;
        if self.cooldown_seconds < 0.0 {
            return Err(ConfigError::OutOfRange {
                field: "cooldown_seconds",
                value: self.cooldown_seconds,
                expected: ">= 0 seconds",
            });
        }

        if self.history_capacity < 2 {
            return Err(ConfigError::OutOfRange {
                field: "history_capacity",
                value: self.history_capacity as f64,
                expected: ">= 2 samples",
            });
        }
        if self.shift_window == 0 {
            return Err(ConfigError::Zero {
                field: "shift_window",
            });
        }

        check_finite("min_joint_visibility", self.min_joint_visibility)?;
        if !(0.0..=1.0).contains(&self.min_joint_visibility) {
            return Err(ConfigError::OutOfRange {
                field: "min_joint_visibility",
                value: self.min_joint_visibility,
                expected: "in [0,1]",
            });
        }

        Ok(())
    }
}
