use std::io::Write;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::detection::types::{DetectionResult, Severity};

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notifier io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("alert serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("notifier rejected alert: {0}")]
    Rejected(String),
}

/// Alarm handed to notifiers. Only built for results with `is_fall_detected`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallAlert {
    pub alert_id: Uuid,
    pub subject_id: String,
    pub severity: Severity,
    pub torso_angle: Option<f64>,
    /// Monotonic evaluation timestamp, seconds.
    pub timestamp: f64,
    pub raised_at: DateTime<Utc>,
    pub confidence: f64,
    pub reasons: Vec<String>,
}

impl FallAlert {
    pub fn from_result(result: &DetectionResult, subject_id: &str) -> Option<Self> {
        if !result.is_fall_detected {
            return None;
        }
        Some(Self {
            alert_id: Uuid::new_v4(),
            subject_id: subject_id.to_string(),
            severity: result.severity,
            torso_angle: result.torso_angle,
            timestamp: result.timestamp,
            raised_at: Utc::now(),
            confidence: result.confidence,
            reasons: result.trigger_reasons.clone(),
        })
    }

    pub fn summary(&self) -> String {
        let angle = self
            .torso_angle
            .map(|a| format!("{a:.1}°"))
            .unwrap_or_else(|| "n/a".to_string());
        format!(
            "Possible fall ({}) for {}: torso {}, confidence {:.0}%, at {}",
            self.severity,
            self.subject_id,
            angle,
            self.confidence * 100.0,
            self.raised_at.format("%Y-%m-%d %H:%M:%S UTC")
        )
    }
}

/// Delivery channel for fall alarms.
pub trait Notifier: Send {
    fn name(&self) -> &str;
    fn notify(&mut self, alert: &FallAlert) -> Result<(), NotifyError>;
}

/// Emits alarms as structured `warn` events.
#[derive(Debug, Default, Clone)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn name(&self) -> &str {
        "tracing"
    }

    fn notify(&mut self, alert: &FallAlert) -> Result<(), NotifyError> {
        tracing::warn!(
            alert_id = %alert.alert_id,
            subject_id = %alert.subject_id,
            severity = %alert.severity,
            torso_angle = ?alert.torso_angle,
            confidence = alert.confidence,
            reasons = ?alert.reasons,
            "{}",
            alert.summary()
        );
        Ok(())
    }
}

/// Writes each alarm as one JSON object per line.
pub struct JsonLinesNotifier<W: Write + Send> {
    writer: W,
}

impl<W: Write + Send> JsonLinesNotifier<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> Notifier for JsonLinesNotifier<W> {
    fn name(&self) -> &str {
        "json-lines"
    }

    fn notify(&mut self, alert: &FallAlert) -> Result<(), NotifyError> {
        serde_json::to_writer(&mut self.writer, alert)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Keeps alarms in memory, up to an optional limit after which it rejects.
///
/// Clones share one store, so a caller can keep a handle after boxing a clone
/// into a `Monitor`.
#[derive(Debug, Default, Clone)]
pub struct MemoryNotifier {
    alerts: Arc<Mutex<Vec<FallAlert>>>,
    limit: Option<usize>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            alerts: Arc::default(),
            limit: Some(limit),
        }
    }

    fn store(&self) -> MutexGuard<'_, Vec<FallAlert>> {
        self.alerts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Snapshot of the alerts delivered so far, oldest first.
    pub fn alerts(&self) -> Vec<FallAlert> {
        self.store().clone()
    }

    pub fn len(&self) -> usize {
        self.store().len()
    }

    pub fn is_empty(&self) -> bool {
        self.store().is_empty()
    }
}

impl Notifier for MemoryNotifier {
    fn name(&self) -> &str {
        "memory"
    }

    fn notify(&mut self, alert: &FallAlert) -> Result<(), NotifyError> {
        let mut alerts = self.store();
        if let Some(limit) = self.limit {
            if alerts.len() >= limit {
                return Err(NotifyError::Rejected(format!(
                    "memory notifier full ({limit} alerts)"
                )));
            }
        }
        alerts.push(alert.clone());
        Ok(())
    }
}
