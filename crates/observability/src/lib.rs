//! Process-wide tracing/logging setup shared by the binaries.

/// Tracing subscriber configuration.
pub mod tracing;

pub use tracing::LogFormat;

/// Initialize logging from the environment (`RUST_LOG`, `LOG_FORMAT`).
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init() {
    tracing::init(LogFormat::from_env());
}
