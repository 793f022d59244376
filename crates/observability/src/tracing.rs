//! Tracing/logging initialization.
//!
//! JSON lines by default so logs can be shipped as-is; `LOG_FORMAT=pretty`
//! switches to human-readable output for local runs.

use tracing_subscriber::EnvFilter;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

impl LogFormat {
    pub fn from_env() -> Self {
        std::env::var("LOG_FORMAT")
            .map(|v| Self::parse(&v))
            .unwrap_or_default()
    }

    /// Unknown values fall back to JSON.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Self::Pretty,
            _ => Self::Json,
        }
    }
}

/// Install the global subscriber. Filter comes from `RUST_LOG`, default `info`.
pub fn init(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(tracing_subscriber::fmt::time::SystemTime);

    let _ = match format {
        LogFormat::Json => builder.json().with_target(true).try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
    };
}
