//! Runner-facing inputs, outputs and log annotations

use super::commands::{file_command_entry, issue_command, issue_command_with_properties};
use super::error::ActionError;
use std::collections::HashMap;
use std::env;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, error};
use uuid::Uuid;

/// Variables read when an `INPUT_*` variable is absent
const LEGACY_INPUTS: &[(&str, &str)] = &[
    ("compose-file", "COMPOSE_FILE"),
    ("context", "COMPOSE_CONTEXT"),
    ("tags", "COMPOSE_TAGS"),
    ("registry", "COMPOSE_REGISTRY"),
    ("username", "COMPOSE_USERNAME"),
    ("password", "COMPOSE_PASSWORD"),
];

/// The invoking workflow, as seen by the action
pub trait ActionEnvironment: Send + Sync {
    /// Named input, trimmed. Blank values read as absent.
    fn get_input(&self, name: &str) -> Option<String>;

    /// Publish a named output for later workflow steps
    fn set_output(&self, name: &str, value: &str) -> Result<(), ActionError>;

    fn debug(&self, message: &str);

    fn error(&self, message: &str);
}

/// Environment variable carrying the value of input `name`
pub fn input_variable(name: &str) -> String {
    format!("INPUT_{}", name.replace(' ', "_").to_uppercase())
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Environment of a GitHub Actions runner
#[derive(Debug, Clone, Default)]
pub struct GithubEnvironment {
    overrides: HashMap<String, String>,
    output_file: Option<PathBuf>,
    annotate: bool,
}

impl GithubEnvironment {
    /// Read `GITHUB_OUTPUT` and `GITHUB_ACTIONS` from the process environment
    pub fn from_env() -> Self {
        Self {
            overrides: HashMap::new(),
            output_file: env::var_os("GITHUB_OUTPUT")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
            annotate: env::var("GITHUB_ACTIONS").map(|v| v == "true").unwrap_or(false),
        }
    }

    /// Inputs that win over anything in the process environment
    pub fn with_overrides(mut self, overrides: HashMap<String, String>) -> Self {
        self.overrides.extend(overrides);
        self
    }

    pub fn with_output_file(mut self, path: Option<PathBuf>) -> Self {
        self.output_file = path;
        self
    }

    /// Print workflow commands on stdout in addition to logging
    pub fn with_annotations(mut self, annotate: bool) -> Self {
        self.annotate = annotate;
        self
    }

    fn write_output_file(&self, path: &Path, name: &str, value: &str) -> io::Result<()> {
        let delimiter = format!("ghadelimiter_{}", Uuid::new_v4());
        let entry = file_command_entry(name, value, &delimiter)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        file.write_all(entry.as_bytes())
    }
}

impl ActionEnvironment for GithubEnvironment {
    fn get_input(&self, name: &str) -> Option<String> {
        if let Some(value) = self.overrides.get(name) {
            return non_blank(value.clone());
        }

        if let Some(value) = env::var(input_variable(name)).ok().and_then(non_blank) {
            return Some(value);
        }

        LEGACY_INPUTS
            .iter()
            .find(|(input, _)| *input == name)
            .and_then(|(_, var)| env::var(var).ok())
            .and_then(non_blank)
    }

    fn set_output(&self, name: &str, value: &str) -> Result<(), ActionError> {
        debug!(name, value, "Setting output");

        match &self.output_file {
            Some(path) => {
                self.write_output_file(path, name, value)
                    .map_err(|source| ActionError::Output {
                        name: name.to_string(),
                        source,
                    })
            }
            None => {
                println!(
                    "{}",
                    issue_command_with_properties("set-output", &[("name", name)], value)
                );
                Ok(())
            }
        }
    }

    fn debug(&self, message: &str) {
        debug!("{}", message);
        if self.annotate {
            println!("{}", issue_command("debug", message));
        }
    }

    fn error(&self, message: &str) {
        error!("{}", message);
        if self.annotate {
            println!("{}", issue_command("error", message));
        }
    }
}

/// Something the action told its environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvEvent {
    Debug(String),
    Error(String),
    Output { name: String, value: String },
}

/// In-memory environment recording every event in order
#[derive(Debug, Default)]
pub struct MemoryEnvironment {
    inputs: HashMap<String, String>,
    events: Mutex<Vec<EnvEvent>>,
}

impl MemoryEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_input(mut self, name: &str, value: &str) -> Self {
        self.inputs.insert(name.to_string(), value.to_string());
        self
    }

    pub fn events(&self) -> Vec<EnvEvent> {
        self.lock_events().clone()
    }

    pub fn outputs(&self) -> Vec<(String, String)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                EnvEvent::Output { name, value } => Some((name, value)),
                _ => None,
            })
            .collect()
    }

    pub fn debug_messages(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                EnvEvent::Debug(m) => Some(m),
                _ => None,
            })
            .collect()
    }

    pub fn error_messages(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                EnvEvent::Error(m) => Some(m),
                _ => None,
            })
            .collect()
    }

    fn record(&self, event: EnvEvent) {
        self.lock_events().push(event);
    }

    // A panic while holding the lock leaves the vector intact, so keep recording.
    fn lock_events(&self) -> MutexGuard<'_, Vec<EnvEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ActionEnvironment for MemoryEnvironment {
    fn get_input(&self, name: &str) -> Option<String> {
        self.inputs.get(name).cloned().and_then(non_blank)
    }

    fn set_output(&self, name: &str, value: &str) -> Result<(), ActionError> {
        self.record(EnvEvent::Output {
            name: name.to_string(),
            value: value.to_string(),
        });
        Ok(())
    }

    fn debug(&self, message: &str) {
        self.record(EnvEvent::Debug(message.to_string()));
    }

    fn error(&self, message: &str) {
        self.record(EnvEvent::Error(message.to_string()));
    }
}
