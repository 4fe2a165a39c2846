//! Compose file loading

use super::error::ComposeError;
use super::spec::{normalize_project_name, project_name_from_path, ComposeSpec};
use crate::fs::FileSystem;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Turns a compose file path into a [`ComposeSpec`]
pub trait ComposeParser: Send + Sync {
    fn parse(&self, path: &Path) -> Result<ComposeSpec, ComposeError>;
}

/// Parser reading compose files through a [`FileSystem`]
pub struct FileComposeParser<F: FileSystem> {
    fs: F,
    working_dir: PathBuf,
}

impl<F: FileSystem> FileComposeParser<F> {
    pub fn new(fs: F) -> Self {
        Self {
            fs,
            working_dir: PathBuf::new(),
        }
    }

    /// Resolve relative compose paths against `dir` instead of the process
    /// working directory.
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = dir.into();
        self
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() || self.working_dir.as_os_str().is_empty() {
            path.to_path_buf()
        } else {
            self.working_dir.join(path)
        }
    }
}

impl<F: FileSystem> ComposeParser for FileComposeParser<F> {
    fn parse(&self, path: &Path) -> Result<ComposeSpec, ComposeError> {
        let path = self.resolve(path);

        if !self.fs.exists(&path) {
            return Err(ComposeError::NotFound(path));
        }
        if !self.fs.is_file(&path) {
            return Err(ComposeError::Read {
                path,
                message: "not a regular file".to_string(),
            });
        }

        let content = self
            .fs
            .read_to_string(&path)
            .map_err(|e| ComposeError::Read {
                path: path.clone(),
                message: e.to_string(),
            })?;

        let mut spec = parse_str(&content, &path)?;

        let compose_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        for (name, service) in spec.services.iter_mut() {
            if let Some(build) = service.build.as_mut() {
                let context = build.context.to_string_lossy();
                if is_remote_context(&context) {
                    return Err(ComposeError::RemoteContext {
                        service: name.clone(),
                        context: context.into_owned(),
                    });
                }
                if build.context.is_relative() {
                    build.context = join_context(&compose_dir, &build.context);
                }
            }
        }

        debug!(
            path = %path.display(),
            project = spec.project_name(),
            services = spec.services.len(),
            "Parsed compose file"
        );

        Ok(spec)
    }
}

/// Deserialize compose YAML and fill in the project name.
///
/// Build contexts are left exactly as written.
pub fn parse_str(content: &str, path: &Path) -> Result<ComposeSpec, ComposeError> {
    let mut spec: ComposeSpec = serde_yaml::from_str(content).map_err(|source| ComposeError::Yaml {
        path: path.to_path_buf(),
        source,
    })?;

    if spec.services.is_empty() {
        return Err(ComposeError::NoServices(path.to_path_buf()));
    }

    spec.name = Some(match spec.name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => normalize_project_name(name),
        _ => project_name_from_path(path),
    });

    Ok(spec)
}

/// `base/context` without `.` components; an empty result means `.`
fn join_context(base: &Path, context: &Path) -> PathBuf {
    let joined: PathBuf = base
        .join(context)
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();

    if joined.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        joined
    }
}

fn is_remote_context(context: &str) -> bool {
    context.contains("://") || context.starts_with("git@") || context.starts_with("github.com/")
}
