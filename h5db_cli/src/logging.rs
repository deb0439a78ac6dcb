//! Logging setup for the command line tool.
//!
//! Installs a global tracing subscriber writing to stderr. `RUST_LOG` wins
//! when set; otherwise the level follows the `-v` count.

use tracing_subscriber::{EnvFilter, Registry, fmt, prelude::*};

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Failed to install global tracing subscriber: {0}")]
    SetGlobal(tracing::subscriber::SetGlobalDefaultError),
}

pub fn init(verbosity: u8) -> Result<(), LoggingError> {
    let stderr_layer = fmt::layer().with_target(false).with_writer(std::io::stderr);
    let subscriber = Registry::default()
        .with(build_env_filter(verbosity))
        .with(stderr_layer);
    tracing::subscriber::set_global_default(subscriber).map_err(LoggingError::SetGlobal)
}

fn build_env_filter(verbosity: u8) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level_for(verbosity)))
}

fn level_for(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_raises_level() {
        assert_eq!(level_for(0), "info");
        assert_eq!(level_for(1), "debug");
        assert_eq!(level_for(5), "trace");
    }
}
