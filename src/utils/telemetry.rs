//! Logging
//!
//! One global subscriber for the binary. The library only emits events.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

use crate::error::{ConsoleError, ConsoleResult};

pub const DEFAULT_FILTER: &str = "evidence_console=info";

/// `RUST_LOG` wins; otherwise `fallback`, otherwise `DEFAULT_FILTER`.
pub fn build_filter(fallback: Option<&str>) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let directives = fallback.filter(|f| !f.trim().is_empty()).unwrap_or(DEFAULT_FILTER);
        EnvFilter::try_new(directives).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    })
}

pub fn init_logging(fallback: Option<&str>) -> ConsoleResult<()> {
    Registry::default()
        .with(build_filter(fallback))
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .try_init()
        .map_err(|e| ConsoleError::Config(format!("logging already initialised: {}", e)))
}
