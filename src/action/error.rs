use crate::builder::BuildError;
use crate::compose::ComposeError;
use crate::config::ConfigError;
use std::io;
use thiserror::Error;

/// Any failure of the action, by stage
#[derive(Debug, Error)]
pub enum ActionError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Compose(#[from] ComposeError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error("Failed to set output '{name}': {source}")]
    Output {
        name: String,
        #[source]
        source: io::Error,
    },
}
