use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading a compose file
#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("Compose file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read compose file {}: {message}", .path.display())]
    Read { path: PathBuf, message: String },

    #[error("Invalid compose file {}: {source}", .path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Compose file {} declares no services", .0.display())]
    NoServices(PathBuf),

    #[error("Service '{service}' uses a remote build context ({context}), only local directories are supported")]
    RemoteContext { service: String, context: String },
}
