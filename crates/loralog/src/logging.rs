use clap::ValueEnum;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Environment variable holding extra filter directives, e.g.
/// `loralog_store=debug,hyper=warn`.
pub const LOG_FILTER_ENV: &str = "LORALOG_LOG";

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_filter(self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

fn build_filter(level: LogLevel, directives: Option<&str>) -> EnvFilter {
    let builder = EnvFilter::builder().with_default_directive(level.as_filter().into());
    match directives {
        Some(directives) if !directives.trim().is_empty() => builder.parse_lossy(directives),
        _ => builder.parse_lossy(""),
    }
}

/// Install the stderr subscriber. Stdout stays reserved for message output.
pub fn init_logging(format: LogFormat, level: LogLevel) {
    let directives = std::env::var(LOG_FILTER_ENV).ok();
    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(build_filter(level, directives.as_deref()))
        .with_ansi(false)
        .with_target(false);

    match format {
        LogFormat::Text => {
            let _ = builder.try_init();
        }
        LogFormat::Json => {
            let _ = builder.json().try_init();
        }
    }
}
