//! Logging setup for the sqlbind CLI
//!
//! Logs always go to stderr so that stdout carries nothing but the rendered
//! query. `RUST_LOG` takes precedence over the filter picked by `--verbose`.

use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Default log level filter, used when `RUST_LOG` is unset
    pub default_filter: String,

    /// Whether to include file/line information in logs
    pub include_location: bool,
}

impl LoggingConfig {
    pub fn new(verbose: bool) -> Self {
        if verbose {
            Self {
                default_filter: "info,sqlbind=debug,sqlbind_core=debug,sqlbind_templates=trace"
                    .to_string(),
                include_location: cfg!(debug_assertions),
            }
        } else {
            Self::default()
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default_filter: "warn".to_string(),
            include_location: false,
        }
    }
}

/// Initialize the logging system with the given configuration
pub fn init(config: &LoggingConfig) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_filter));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(config.include_location)
        .with_line_number(config.include_location)
        .with_filter(env_filter);

    tracing_subscriber::registry().with(stderr_layer).try_init()?;

    Ok(())
}
