//! composebox - build the images of a compose project from CI
//!
//! The crate packages a container action: it reads a compose file named by
//! the `compose-file` input, builds the image of every service that declares
//! a `build` section, and publishes the completion time as the `time` output.
//! The same sequence is available from a shell through the `composebox`
//! binary.
//!
//! # Example Usage
//!
//! ```no_run
//! use composebox::action::{self, MemoryEnvironment};
//! use composebox::builder::{BuildOrchestrator, DockerBuilder};
//! use composebox::compose::FileComposeParser;
//! use composebox::fs::RealFileSystem;
//! use composebox::ActionConfig;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let env = MemoryEnvironment::new().with_input("compose-file", "docker-compose.yml");
//! let config = ActionConfig::from_environment(&env)?;
//!
//! let parser = FileComposeParser::new(RealFileSystem).with_working_dir(&config.context);
//! let builder = BuildOrchestrator::new(DockerBuilder::new(config.timeout))
//!     .with_services(config.services.clone())
//!     .with_push(config.push.clone());
//!
//! let outcome = action::run(&env, &parser, &builder).await?;
//! println!("Finished at {}", outcome.time);
//! # Ok(())
//! # }
//! ```
//!
//! # Project Structure
//!
//! - [`action`]: The action sequence and the runner it talks to
//! - [`compose`]: Compose file model and parser
//! - [`builder`]: Image builds through the Docker Engine API
//! - [`progress`]: Build progress events
//! - [`config`]: Action inputs beyond `compose-file`

pub mod action;
pub mod builder;
pub mod cli;
pub mod compose;
pub mod config;
pub mod fs;
pub mod progress;
pub mod util;

pub use action::{run, ActionEnvironment, ActionError, ActionOutcome, GithubEnvironment};
pub use builder::{BuildError, BuildOrchestrator, DockerBuilder, ServiceBuilder};
pub use compose::{ComposeError, ComposeParser, ComposeSpec, FileComposeParser};
pub use config::{ActionConfig, ConfigError};
pub use util::{init_logging, LoggingConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_exists() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_name_is_composebox() {
        assert_eq!(NAME, "composebox");
    }
}
