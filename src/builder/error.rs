use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while building or pushing service images
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Failed to connect to Docker daemon: {0}")]
    Connect(String),

    #[error("Docker API error: {0}")]
    Docker(#[from] bollard::errors::Error),

    #[error("Docker reported an error for {image}: {message}")]
    Daemon { image: String, message: String },

    #[error("Invalid build context {}: {source}", .path.display())]
    Context {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{operation} timed out after {seconds} seconds")]
    Timeout { operation: String, seconds: u64 },

    #[error("Service '{0}' is not declared in the compose file")]
    UnknownService(String),

    #[error("Background task failed: {0}")]
    Task(String),
}
