//! Logging setup for the `gantry` binary.
//!
//! Libraries only emit `tracing` events; the binary decides where they go.
//! The filter comes from `--log-level`, then `GANTRY_LOG`, then `RUST_LOG`,
//! defaulting to `info`. Output always goes to stderr so command output on
//! stdout stays pipeable.

use std::str::FromStr;

use anyhow::{Result, anyhow};
use tracing_subscriber::EnvFilter;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
  /// Single-line format
  #[default]
  Compact,
  /// Multi-line format with colors
  Pretty,
}

impl FromStr for LogFormat {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_lowercase().as_str() {
      "compact" => Ok(LogFormat::Compact),
      "pretty" => Ok(LogFormat::Pretty),
      _ => Err(format!("unknown log format: {s}")),
    }
  }
}

/// Install the global subscriber.
pub fn init_logging(level: Option<&str>, format: LogFormat) -> Result<()> {
  let directive = level
    .map(str::to_string)
    .or_else(|| std::env::var("GANTRY_LOG").ok())
    .or_else(|| std::env::var("RUST_LOG").ok())
    .unwrap_or_else(|| "info".to_string());

  let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("info"));

  let builder = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .with_target(false);

  let result = match format {
    LogFormat::Compact => builder.compact().try_init(),
    LogFormat::Pretty => builder.pretty().try_init(),
  };
  result.map_err(|e| anyhow!("failed to initialize logging: {e}"))
}
