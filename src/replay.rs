//! JSONL 事件流回放
//!
//! 每行一个事件，`type` 字段区分：
//! - `frame`: 一帧姿态（`timestamp`、`frame_height`、`joints`）
//! - `calibrate`: 以该帧姿态作为站立基线
//! - `reset_cooldown` / `reset_calibration`: 操作员指令

use std::io::{BufRead, Write};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::detection::config::ConfigError;
use crate::detection::types::PoseFrame;
use crate::monitor::Monitor;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    Frame(PoseFrame),
    Calibrate(PoseFrame),
    ResetCooldown,
    ResetCalibration,
}

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("replay io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed event on line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReplaySummary {
    pub events: u64,
    pub frames: u64,
    pub alerts: u64,
    pub calibrations: u64,
    pub calibration_failures: u64,
}

/// Feed every event of `reader` through `monitor`.
///
/// With `emit_results`, each frame's `DetectionResult` is written to `writer` as one JSON line.
/// A failed calibration is logged and counted; a malformed line aborts the replay.
pub fn run<R, W>(
    monitor: &mut Monitor,
    reader: R,
    mut writer: W,
    emit_results: bool,
) -> Result<ReplaySummary, ReplayError>
where
    R: BufRead,
    W: Write,
{
    let mut summary = ReplaySummary::default();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let event: StreamEvent =
            serde_json::from_str(trimmed).map_err(|source| ReplayError::Parse {
                line: idx + 1,
                source,
            })?;
        summary.events += 1;

        match event {
            StreamEvent::Frame(frame) => {
                summary.frames += 1;
                let result = monitor.process(&frame);
                if result.is_fall_detected {
                    summary.alerts += 1;
                }
                if emit_results {
                    serde_json::to_writer(&mut writer, &result).map_err(std::io::Error::from)?;
                    writer.write_all(b"\n")?;
                }
            }
            StreamEvent::Calibrate(frame) => match monitor.calibrate(&frame) {
                Ok(_) => summary.calibrations += 1,
                Err(e) => {
                    summary.calibration_failures += 1;
                    tracing::warn!(line = idx + 1, error = %e, "Calibration event ignored");
                }
            },
            StreamEvent::ResetCooldown => monitor.reset_cooldown(),
            StreamEvent::ResetCalibration => monitor.reset_calibration(),
        }
    }

    writer.flush()?;
    tracing::info!(
        events = summary.events,
        frames = summary.frames,
        alerts = summary.alerts,
        "Replay finished"
    );
    Ok(summary)
}
