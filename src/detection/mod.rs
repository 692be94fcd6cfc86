//! 跌倒判定核心
//!
//! - `geometry`: 关键点 → 姿态特征（纯函数）
//! - `tracker`: 特征时序缓冲与统计
//! - `rules`: 三条触发规则
//! - `engine`: 防抖、冷却、置信度与最终判定
//! - `clock`: 可注入的单调时钟

pub mod clock;
pub mod config;
pub mod engine;
pub mod geometry;
pub mod rules;
pub mod tracker;
pub mod types;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use config::{ConfigError, DetectorConfig};
pub use engine::{CalibrationError, FallDecisionEngine};
pub use tracker::{Signal, TemporalTracker};
pub use types::{DetectionResult, Joint, JointMap, Landmark, Point, PoseFrame, Severity};
