use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader};
use std::process::ExitCode;

use fall_sentinel::config::Config;
use fall_sentinel::detection::{DetectorConfig, FallDecisionEngine, MonotonicClock};
use fall_sentinel::logging::init_tracing;
use fall_sentinel::monitor::Monitor;
use fall_sentinel::notify::{JsonLinesNotifier, TracingNotifier};
use fall_sentinel::replay::{self, ReplayError, ReplaySummary};

fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let config = Config::from_env();
    init_tracing(&config.log_config());
    tracing::info!(subject_id = %config.subject_id, "Starting fall-sentinel");

    match run(&config) {
        Ok(summary) => {
            tracing::info!(
                frames = summary.frames,
                alerts = summary.alerts,
                calibrations = summary.calibrations,
                "fall-sentinel finished"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "fall-sentinel aborted");
            ExitCode::FAILURE
        }
    }
}

fn load_detector_config(config: &Config) -> Result<DetectorConfig, ReplayError> {
    match &config.detector_config_path {
        Some(path) => {
            let raw = fs::read_to_string(path)?;
            tracing::info!(path = %path.display(), "Loaded detector config file");
            Ok(DetectorConfig::from_json_str(&raw)?)
        }
        // range checks happen in FallDecisionEngine::new
        None => Ok(DetectorConfig::from_env(&config.detection)),
    }
}

fn run(config: &Config) -> Result<ReplaySummary, ReplayError> {
    let detector = load_detector_config(config)?;
    tracing::debug!(?detector, "Detector config");

    let engine = FallDecisionEngine::new(detector)?;
    let mut monitor = Monitor::new(engine, Box::new(MonotonicClock::new()), &config.subject_id)
        .with_notifier(Box::new(TracingNotifier));

    if let Some(path) = &config.alert_log_path {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        monitor.add_notifier(Box::new(JsonLinesNotifier::new(file)));
        tracing::info!(path = %path.display(), "Writing fall alerts to file");
    }

    let stdout = io::stdout().lock();
    let summary = match &config.frames_path {
        Some(path) => {
            let reader = BufReader::new(File::open(path)?);
            replay::run(&mut monitor, reader, stdout, config.emit_results)?
        }
        None => replay::run(&mut monitor, io::stdin().lock(), stdout, config.emit_results)?,
    };

    let stats = monitor.stats();
    if stats.notify_failures > 0 {
        tracing::warn!(failures = stats.notify_failures, "Some fall alerts were not delivered");
    }
    Ok(summary)
}
