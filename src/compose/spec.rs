//! Compose data model

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::path::{Component, Path, PathBuf};

/// Dockerfile name used when a `build` section does not name one
pub const DEFAULT_DOCKERFILE: &str = "Dockerfile";

const DEFAULT_PROJECT: &str = "default";

/// A parsed compose document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComposeSpec {
    /// Project name; filled from the compose file's directory when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default)]
    pub services: BTreeMap<String, Service>,
}

/// One service entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    #[serde(
        default,
        deserialize_with = "deserialize_build",
        skip_serializing_if = "Option::is_none"
    )]
    pub build: Option<BuildConfig>,
}

/// Normalized `build` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildConfig {
    pub context: PathBuf,
    pub dockerfile: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub args: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            context: PathBuf::from("."),
            dockerfile: DEFAULT_DOCKERFILE.to_string(),
            args: BTreeMap::new(),
            target: None,
        }
    }
}

impl ComposeSpec {
    /// Project name used to derive default image names
    pub fn project_name(&self) -> &str {
        self.name.as_deref().unwrap_or(DEFAULT_PROJECT)
    }

    /// Services that declare a `build` section, in name order
    pub fn buildable_services(&self) -> impl Iterator<Item = (&str, &Service, &BuildConfig)> {
        self.services
            .iter()
            .filter_map(|(name, service)| service.build.as_ref().map(|b| (name.as_str(), service, b)))
    }
}

impl Service {
    /// Image reference for this service, lower-cased.
    ///
    /// Falls back to `<project>-<service>` when no `image` is given.
    pub fn image_name(&self, project: &str, service_name: &str) -> String {
        match &self.image {
            Some(image) if !image.trim().is_empty() => image.trim().to_lowercase(),
            _ => format!("{}-{}", project, service_name).to_lowercase(),
        }
    }
}

/// Normalize a project name the way compose does: lower-case, keep
/// `[a-z0-9_-]`, strip leading separators.
pub fn normalize_project_name(raw: &str) -> String {
    let name: String = raw
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect();
    let name = name.trim_start_matches(['_', '-']).to_string();

    if name.is_empty() {
        DEFAULT_PROJECT.to_string()
    } else {
        name
    }
}

/// Project name derived from the directory holding the compose file.
///
/// Relative paths are taken from the process working directory, so
/// `./docker-compose.yml` names the project after the directory it sits in.
pub fn project_name_from_path(compose_path: &Path) -> String {
    let dir = compose_path.parent().unwrap_or_else(|| Path::new(""));
    let dir = if dir.is_absolute() {
        dir.to_path_buf()
    } else {
        env::current_dir()
            .map(|cwd| cwd.join(dir))
            .unwrap_or_else(|_| dir.to_path_buf())
    };

    lexical_normalize(&dir)
        .file_name()
        .and_then(|n| n.to_str())
        .map(normalize_project_name)
        .unwrap_or_else(|| DEFAULT_PROJECT.to_string())
}

/// Drop `.` and resolve `..` without touching the file system
fn lexical_normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    normalized
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawBuild {
    Context(String),
    Detailed(RawBuildDetails),
}

#[derive(Deserialize)]
struct RawBuildDetails {
    #[serde(default)]
    context: Option<String>,
    #[serde(default)]
    dockerfile: Option<String>,
    #[serde(default)]
    args: Option<RawArgs>,
    #[serde(default)]
    target: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawArgs {
    List(Vec<String>),
    Map(BTreeMap<String, serde_yaml::Value>),
}

fn deserialize_build<'de, D>(deserializer: D) -> Result<Option<BuildConfig>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = match Option::<RawBuild>::deserialize(deserializer)? {
        Some(raw) => raw,
        None => return Ok(None),
    };

    let config = match raw {
        RawBuild::Context(context) => BuildConfig {
            context: PathBuf::from(context),
            ..Default::default()
        },
        RawBuild::Detailed(details) => BuildConfig {
            context: PathBuf::from(details.context.unwrap_or_else(|| ".".to_string())),
            dockerfile: details
                .dockerfile
                .filter(|d| !d.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_DOCKERFILE.to_string()),
            args: match details.args {
                Some(args) => normalize_args(args).map_err(D::Error::custom)?,
                None => BTreeMap::new(),
            },
            target: details.target,
        },
    };

    Ok(Some(config))
}

/// Build args arrive either as `KEY=VALUE` strings or as a map. A bare key
/// (or a null map value) takes its value from the process environment and is
/// dropped when the variable is unset.
fn normalize_args(args: RawArgs) -> Result<BTreeMap<String, String>, String> {
    let mut normalized = BTreeMap::new();

    match args {
        RawArgs::List(entries) => {
            for entry in entries {
                match entry.split_once('=') {
                    Some((key, value)) => {
                        normalized.insert(key.to_string(), value.to_string());
                    }
                    None => {
                        if let Ok(value) = std::env::var(&entry) {
                            normalized.insert(entry, value);
                        }
                    }
                }
            }
        }
        RawArgs::Map(entries) => {
            for (key, value) in entries {
                let value = match value {
                    serde_yaml::Value::Null => match std::env::var(&key) {
                        Ok(v) => v,
                        Err(_) => continue,
                    },
                    serde_yaml::Value::String(s) => s,
                    serde_yaml::Value::Number(n) => n.to_string(),
                    serde_yaml::Value::Bool(b) => b.to_string(),
                    _ => return Err(format!("build arg '{}' must be a scalar value", key)),
                };
                normalized.insert(key, value);
            }
        }
    }

    Ok(normalized)
}
