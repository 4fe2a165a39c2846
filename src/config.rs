//! Configuration management for composebox
//!
//! Settings are read from action inputs through an
//! [`ActionEnvironment`](crate::action::ActionEnvironment), so the same
//! loader serves the container action (`INPUT_*` variables), the CLI flags
//! (passed as input overrides) and tests (in-memory inputs).
//!
//! # Inputs
//!
//! - `context`: Directory the compose file path is resolved against - default: "."
//! - `services`: Comma or newline separated service filter - default: all services
//! - `registry`: Registry (and optional namespace) images are pushed to - default: none
//! - `tags`: Comma or newline separated tags used for pushes - default: "latest"
//! - `push`: "true" or "false" - default: push iff a registry is set
//! - `username` / `password`: Registry credentials - default: none
//! - `timeout`: Seconds allowed per Docker operation - default: "300"
//!
//! The `compose-file` input is read by the action itself.
//!
//! # Example
//!
//! ```no_run
//! use composebox::action::MemoryEnvironment;
//! use composebox::ActionConfig;
//!
//! let env = MemoryEnvironment::new()
//!     .with_input("registry", "ghcr.io/acme")
//!     .with_input("tags", "latest, v1.2.0");
//!
//! let config = ActionConfig::from_environment(&env).expect("Invalid configuration");
//! assert!(config.push.is_some());
//! ```

use crate::action::ActionEnvironment;
use crate::builder::docker::DEFAULT_OPERATION_TIMEOUT;
use crate::builder::{PushSettings, RegistryCredentials};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Default values for configuration
const DEFAULT_CONTEXT: &str = ".";
const DEFAULT_TAG: &str = "latest";
const MAX_TIMEOUT_SECS: u64 = 6 * 60 * 60;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required input not provided
    #[error("Input required and not supplied: {0}")]
    MissingInput(String),

    /// Input present but unusable
    #[error("Invalid value '{value}' for input '{name}': {reason}")]
    InvalidInput {
        name: String,
        value: String,
        reason: String,
    },

    /// Inputs are individually valid but inconsistent
    #[error("Configuration validation failed: {0}")]
    Validation(String),
}

/// Settings for one action run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionConfig {
    /// Working directory for the compose file path
    pub context: PathBuf,

    /// Services to build; empty means all
    pub services: Vec<String>,

    /// Push destination, when pushing is enabled
    pub push: Option<PushSettings>,

    /// Limit for each Docker operation
    pub timeout: Duration,
}

impl Default for ActionConfig {
    fn default() -> Self {
        Self {
            context: PathBuf::from(DEFAULT_CONTEXT),
            services: Vec::new(),
            push: None,
            timeout: DEFAULT_OPERATION_TIMEOUT,
        }
    }
}

impl ActionConfig {
    /// Loads and validates configuration from action inputs
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for malformed values or inconsistent push settings
    pub fn from_environment(env: &dyn ActionEnvironment) -> Result<Self, ConfigError> {
        let context = env
            .get_input("context")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONTEXT));

        let services = env.get_input("services").map(|s| parse_list(&s)).unwrap_or_default();

        let timeout = match env.get_input("timeout") {
            Some(raw) => Duration::from_secs(parse_timeout(&raw)?),
            None => DEFAULT_OPERATION_TIMEOUT,
        };

        let registry = env.get_input("registry").unwrap_or_default();
        let push_enabled = match env.get_input("push") {
            Some(raw) => parse_bool("push", &raw)?,
            None => !registry.is_empty(),
        };

        let username = env.get_input("username");
        let password = env.get_input("password");

        let push = if push_enabled {
            let tags = env
                .get_input("tags")
                .map(|t| parse_list(&t))
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| vec![DEFAULT_TAG.to_string()]);

            let credentials = match (username, password) {
                (Some(username), Some(password)) => Some(RegistryCredentials {
                    username,
                    password,
                    server_address: registry_host(&registry),
                }),
                (None, None) => None,
                _ => {
                    return Err(ConfigError::Validation(
                        "username and password must be provided together".to_string(),
                    ))
                }
            };

            Some(PushSettings {
                registry,
                tags,
                credentials,
            })
        } else {
            None
        };

        let config = Self {
            context,
            services,
            push,
            timeout,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if any validation fails
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout.is_zero() {
            return Err(ConfigError::Validation(
                "timeout must be at least 1 second".to_string(),
            ));
        }

        if let Some(push) = &self.push {
            if push.registry.is_empty() {
                return Err(ConfigError::Validation(
                    "push is enabled but no registry is set".to_string(),
                ));
            }
            if let Some(tag) = push.tags.iter().find(|t| !is_valid_tag(t)) {
                return Err(ConfigError::InvalidInput {
                    name: "tags".to_string(),
                    value: tag.clone(),
                    reason: "tags may contain only letters, digits, '_', '.' and '-' and must not start with '.' or '-'".to_string(),
                });
            }
        }

        Ok(())
    }
}

/// Split a comma or newline separated input into trimmed, non-empty items
pub fn parse_list(raw: &str) -> Vec<String> {
    raw.split([',', '\n'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Boolean input, accepting the same spellings as the runner toolkit
pub fn parse_bool(name: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw {
        "true" | "True" | "TRUE" => Ok(true),
        "false" | "False" | "FALSE" => Ok(false),
        _ => Err(ConfigError::InvalidInput {
            name: name.to_string(),
            value: raw.to_string(),
            reason: "expected true or false".to_string(),
        }),
    }
}

fn parse_timeout(raw: &str) -> Result<u64, ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidInput {
        name: "timeout".to_string(),
        value: raw.to_string(),
        reason: reason.to_string(),
    };

    let secs = raw
        .parse::<u64>()
        .map_err(|_| invalid("expected a whole number of seconds"))?;
    if secs == 0 || secs > MAX_TIMEOUT_SECS {
        return Err(invalid("must be between 1 second and 6 hours"));
    }
    Ok(secs)
}

fn is_valid_tag(tag: &str) -> bool {
    !tag.is_empty()
        && tag.len() <= 128
        && !tag.starts_with(['.', '-'])
        && tag
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == '-')
}

/// Registry host for credential lookup, or `None` for Docker Hub namespaces
fn registry_host(registry: &str) -> Option<String> {
    let first = registry.split('/').next()?;
    if first.contains('.') || first.contains(':') || first == "localhost" {
        Some(first.to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::MemoryEnvironment;

    #[test]
    fn test_defaults() {
        let config = ActionConfig::from_environment(&MemoryEnvironment::new()).unwrap();
        assert_eq!(config, ActionConfig::default());
        assert_eq!(config.timeout, Duration::from_secs(300));
    }

    #[test]
    fn test_registry_enables_push() {
        let env = MemoryEnvironment::new()
            .with_input("registry", "ghcr.io/acme")
            .with_input("tags", "latest,\nv1.2.0\n")
            .with_input("username", "bot")
            .with_input("password", "token");

        let push = ActionConfig::from_environment(&env).unwrap().push.unwrap();

        assert_eq!(push.registry, "ghcr.io/acme");
        assert_eq!(push.tags, vec!["latest", "v1.2.0"]);
        let creds = push.credentials.unwrap();
        assert_eq!(creds.username, "bot");
        assert_eq!(creds.server_address.as_deref(), Some("ghcr.io"));
    }

    #[test]
    fn test_push_false_overrides_registry() {
        let env = MemoryEnvironment::new()
            .with_input("registry", "ghcr.io/acme")
            .with_input("push", "false");

        assert!(ActionConfig::from_environment(&env).unwrap().push.is_none());
    }

    #[test]
    fn test_push_without_registry() {
        let env = MemoryEnvironment::new().with_input("push", "true");

        let err = ActionConfig::from_environment(&env).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_invalid_push_value() {
        let env = MemoryEnvironment::new().with_input("push", "yes please");

        let err = ActionConfig::from_environment(&env).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidInput { ref name, .. } if name == "push"));
    }

    #[test]
    fn test_half_credentials_rejected() {
        let env = MemoryEnvironment::new()
            .with_input("registry", "docker.io/acme")
            .with_input("username", "bot");

        assert!(matches!(
            ActionConfig::from_environment(&env),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_invalid_tag() {
        let env = MemoryEnvironment::new()
            .with_input("registry", "ghcr.io/acme")
            .with_input("tags", "feature/login");

        let err = ActionConfig::from_environment(&env).unwrap_err();
        assert!(err.to_string().contains("feature/login"));
    }

    #[test]
    fn test_timeout_parsing() {
        let env = MemoryEnvironment::new().with_input("timeout", "45");
        assert_eq!(
            ActionConfig::from_environment(&env).unwrap().timeout,
            Duration::from_secs(45)
        );

        for bad in ["0", "-1", "ten", "999999"] {
            let env = MemoryEnvironment::new().with_input("timeout", bad);
            assert!(ActionConfig::from_environment(&env).is_err(), "{}", bad);
        }
    }

    #[test]
    fn test_services_and_context() {
        let env = MemoryEnvironment::new()
            .with_input("context", "deploy")
            .with_input("services", "web, worker");

        let config = ActionConfig::from_environment(&env).unwrap();
        assert_eq!(config.context, PathBuf::from("deploy"));
        assert_eq!(config.services, vec!["web", "worker"]);
    }

    #[test]
    fn test_parse_list() {
        assert_eq!(parse_list(" a ,b\n\nc,"), vec!["a", "b", "c"]);
        assert!(parse_list(" , ").is_empty());
    }

    #[test]
    fn test_registry_host() {
        assert_eq!(registry_host("ghcr.io/acme"), Some("ghcr.io".to_string()));
        assert_eq!(registry_host("localhost:5000"), Some("localhost:5000".to_string()));
        assert_eq!(registry_host("acme"), None);
    }
}
