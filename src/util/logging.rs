//! Structured logging setup for composebox
//!
//! Logs go to stderr through the `tracing` ecosystem, keeping stdout free for
//! workflow commands and `plan` output.
//!
//! # Environment
//!
//! - `COMPOSEBOX_LOG_LEVEL` - Log level (trace, debug, info, warn, error)
//! - `COMPOSEBOX_LOG_JSON` - Use JSON output (true/false)
//! - `RUNNER_DEBUG` - Set to `1` by the runner when step debug logging is on;
//!   raises the default level to debug
//! - `RUST_LOG` - Standard Rust log filtering
//!
//! # Example
//!
//! ```no_run
//! use composebox::util::{init_logging, LoggingConfig};
//! use tracing::Level;
//!
//! init_logging(LoggingConfig::with_level(Level::DEBUG));
//! tracing::info!(project = "shop", "Building compose services");
//! ```

use std::env;
use std::sync::Once;
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Ensures logging is only initialized once
static INIT: Once = Once::new();

/// Configuration for logging initialization
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Minimum log level to display
    pub level: Level,

    /// Use JSON output format
    pub use_json: bool,

    /// Include the module target (e.g., composebox::builder) in logs
    pub include_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            use_json: false,
            include_target: true,
        }
    }
}

impl LoggingConfig {
    pub fn with_level(level: Level) -> Self {
        Self {
            level,
            ..Default::default()
        }
    }

    /// Configuration derived from `COMPOSEBOX_LOG_*` and `RUNNER_DEBUG`
    pub fn from_env() -> Self {
        let level = match env::var("COMPOSEBOX_LOG_LEVEL") {
            Ok(level_str) => parse_level(&level_str),
            Err(_) if runner_debug_enabled() => Level::DEBUG,
            Err(_) => Level::INFO,
        };

        let use_json = env::var("COMPOSEBOX_LOG_JSON")
            .ok()
            .and_then(|v| v.parse::<bool>().ok())
            .unwrap_or(false);

        Self {
            level,
            use_json,
            ..Default::default()
        }
    }
}

/// Whether the runner asked for step debug logging
pub fn runner_debug_enabled() -> bool {
    env::var("RUNNER_DEBUG").map(|v| v == "1").unwrap_or(false)
}

/// Parses a log level from a string, defaulting to INFO
///
/// ```
/// use composebox::util::logging::parse_level;
/// use tracing::Level;
///
/// assert_eq!(parse_level("debug"), Level::DEBUG);
/// assert_eq!(parse_level("invalid"), Level::INFO);
/// ```
pub fn parse_level(level_str: &str) -> Level {
    match level_str.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => {
            eprintln!(
                "Invalid log level '{}', defaulting to INFO. Valid levels: trace, debug, info, warn, error",
                level_str
            );
            Level::INFO
        }
    }
}

fn build_filter(level: Level) -> EnvFilter {
    let mut filter = EnvFilter::from_default_env();

    if env::var("RUST_LOG").is_err() {
        for directive in [
            format!("composebox={}", level),
            "bollard=warn".to_string(),
            "hyper=warn".to_string(),
            "hyper_util=warn".to_string(),
        ] {
            if let Ok(directive) = directive.parse() {
                filter = filter.add_directive(directive);
            }
        }
    }

    filter
}

/// Initializes the logging system. Subsequent calls are ignored.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let filter = build_filter(config.level);

        if config.use_json {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .json()
                        .with_target(config.include_target)
                        .with_writer(std::io::stderr),
                )
                .init();
        } else {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_target(config.include_target)
                        .with_writer(std::io::stderr),
                )
                .init();
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("trace"), Level::TRACE);
        assert_eq!(parse_level("debug"), Level::DEBUG);
        assert_eq!(parse_level("info"), Level::INFO);
        assert_eq!(parse_level("warn"), Level::WARN);
        assert_eq!(parse_level("error"), Level::ERROR);
    }

    #[test]
    fn test_parse_level_case_insensitive() {
        assert_eq!(parse_level("TRACE"), Level::TRACE);
        assert_eq!(parse_level("Debug"), Level::DEBUG);
    }

    #[test]
    fn test_parse_level_invalid() {
        assert_eq!(parse_level("verbose"), Level::INFO);
        assert_eq!(parse_level(""), Level::INFO);
    }

    #[test]
    fn test_default_config() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, Level::INFO);
        assert!(!config.use_json);
        assert!(config.include_target);
    }

    #[test]
    #[serial]
    fn test_runner_debug_raises_level() {
        env::remove_var("COMPOSEBOX_LOG_LEVEL");
        env::set_var("RUNNER_DEBUG", "1");

        assert_eq!(LoggingConfig::from_env().level, Level::DEBUG);

        env::set_var("COMPOSEBOX_LOG_LEVEL", "warn");
        assert_eq!(LoggingConfig::from_env().level, Level::WARN);

        env::remove_var("COMPOSEBOX_LOG_LEVEL");
        env::remove_var("RUNNER_DEBUG");
        assert_eq!(LoggingConfig::from_env().level, Level::INFO);
    }

    #[test]
    #[serial]
    fn test_json_flag() {
        env::set_var("COMPOSEBOX_LOG_JSON", "true");
        assert!(LoggingConfig::from_env().use_json);
        env::remove_var("COMPOSEBOX_LOG_JSON");
    }
}
