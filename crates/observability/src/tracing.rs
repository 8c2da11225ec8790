//! `tracing-subscriber` installation.
//!
//! The filter comes from `RUST_LOG` (default `info`). Installing twice is a
//! no-op, so tests can call `init()` freely.

use tracing_subscriber::EnvFilter;

/// Output encoding of log lines.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per event.
    #[default]
    Json,
    /// Human-readable lines, for local runs.
    Pretty,
}

impl LogFormat {
    /// `STOCKROOM_LOG_FORMAT=pretty` selects [`LogFormat::Pretty`]; anything else is JSON.
    pub fn from_env() -> Self {
        match std::env::var("STOCKROOM_LOG_FORMAT").as_deref() {
            Ok("pretty") => LogFormat::Pretty,
            _ => LogFormat::Json,
        }
    }
}

pub fn init() {
    init_with(LogFormat::from_env(), "info");
}

/// Install a global subscriber. `default_directive` applies when `RUST_LOG` is unset.
pub fn init_with(format: LogFormat, default_directive: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false);

    let _ = match format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_init_is_harmless() {
        init_with(LogFormat::Json, "debug");
        init_with(LogFormat::Pretty, "warn");
        init();
    }
}
