use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::constants::{
    DEFAULT_CENTER_SHIFT_PX, DEFAULT_CONSECUTIVE_FRAMES, DEFAULT_COOLDOWN_SECS,
    DEFAULT_HEAD_DROP_PX, DEFAULT_SUBJECT_ID, REFERENCE_FRAME_HEIGHT_PX,
};
use crate::logging::LogConfig;

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub enable_file_logs: bool,
    pub log_dir: String,
    pub subject_id: String,
    /// JSONL event stream to replay; stdin when unset.
    pub frames_path: Option<PathBuf>,
    /// Append fall alerts as JSON lines to this file.
    pub alert_log_path: Option<PathBuf>,
    /// Optional JSON detector config; overrides the env thresholds.
    pub detector_config_path: Option<PathBuf>,
    pub emit_results: bool,
    pub detection: DetectionEnvConfig,
}

#[derive(Debug, Clone)]
pub struct DetectionEnvConfig {
    pub torso_angle_threshold: f64,
    pub head_drop_threshold_px: f64,
    pub reference_frame_height: f64,
    pub center_shift_threshold: f64,
    pub consecutive_frames: u32,
    pub cooldown_secs: f64,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            log_level: env_or("RUST_LOG", "info"),
            enable_file_logs: env_or_bool("ENABLE_FILE_LOGS", false),
            log_dir: env_or("LOG_DIR", "./logs"),
            subject_id: env_or("SUBJECT_ID", DEFAULT_SUBJECT_ID),
            frames_path: env_or_path("FRAMES_PATH"),
            alert_log_path: env_or_path("ALERT_LOG_PATH"),
            detector_config_path: env_or_path("DETECTOR_CONFIG_PATH"),
            emit_results: env_or_bool("EMIT_RESULTS", true),
            detection: DetectionEnvConfig {
                torso_angle_threshold: env_or_parse("FALL_TORSO_ANGLE_THRESHOLD", 35.0_f64),
                head_drop_threshold_px: env_or_parse(
                    "FALL_HEAD_DROP_THRESHOLD_PX",
                    DEFAULT_HEAD_DROP_PX,
                ),
                reference_frame_height: env_or_parse(
                    "FALL_REFERENCE_FRAME_HEIGHT",
                    REFERENCE_FRAME_HEIGHT_PX,
                ),
                center_shift_threshold: env_or_parse(
                    "FALL_CENTER_SHIFT_THRESHOLD",
                    DEFAULT_CENTER_SHIFT_PX,
                ),
                consecutive_frames: env_or_parse(
                    "FALL_CONSECUTIVE_FRAMES",
                    DEFAULT_CONSECUTIVE_FRAMES,
                ),
                cooldown_secs: env_or_parse("FALL_COOLDOWN_SECS", DEFAULT_COOLDOWN_SECS),
            },
        }
    }

    pub fn log_config(&self) -> LogConfig {
        LogConfig {
            log_level: self.log_level.clone(),
            enable_file_logs: self.enable_file_logs,
            log_dir: self.log_dir.clone(),
        }
    }
}

pub fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

pub fn env_or_parse<T>(key: &str, default: T) -> T
where
    T: FromStr + Copy,
{
    match env::var(key) {
        Ok(raw) => match raw.trim().parse::<T>() {
            Ok(v) => v,
            Err(_) => {
                tracing::warn!(
                    key,
                    value = %raw,
                    "Failed to parse env var, using default"
                );
                default
            }
        },
        Err(_) => default,
    }
}

pub fn env_or_bool(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => default,
        },
        Err(_) => default,
    }
}

/// Unset and blank values both mean "no path".
pub fn env_or_path(key: &str) -> Option<PathBuf> {
    env::var(key)
        .ok()
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
        .map(PathBuf::from)
}
