use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub log_level: String,
    pub enable_file_logs: bool,
    pub log_dir: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            enable_file_logs: false,
            log_dir: "./logs".to_string(),
        }
    }
}

/// 控制台输出人类可读日志；开启文件日志时额外写入按天滚动的 JSON 文件。
/// 日志写到 stderr，stdout 留给检测结果流。
pub fn init_tracing(config: &LogConfig) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false);

    let registry = Registry::default().with(env_filter).with(console_layer);

    let result = if config.enable_file_logs {
        match RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix("fall-sentinel")
            .filename_suffix("log")
            .max_log_files(30)
            .build(&config.log_dir)
        {
            Ok(appender) => {
                let file_layer = fmt::layer()
                    .with_writer(appender)
                    .with_ansi(false)
                    .json();
                registry.with(file_layer).try_init()
            }
            Err(e) => {
                eprintln!(
                    "fall-sentinel: cannot open log dir {}: {e}; file logs disabled",
                    config.log_dir
                );
                registry.try_init()
            }
        }
    } else {
        registry.try_init()
    };

    // 全局 subscriber 已存在（测试或重复初始化）时忽略
    if let Err(e) = result {
        let msg = e.to_string();
        if !msg.contains("already been set") {
            panic!("Failed to initialize tracing: {e}");
        }
    }
}
