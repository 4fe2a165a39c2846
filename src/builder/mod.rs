//! Image building for compose services
//!
//! [`BuildOrchestrator`] walks a [`ComposeSpec`](crate::compose::ComposeSpec)
//! and drives an [`ImageBuilder`] for every buildable service. The Docker
//! Engine implementation lives in [`docker`]; tests plug in recording fakes.

pub mod context;
pub mod docker;
pub mod error;
pub mod orchestrator;
pub mod reference;

pub use docker::DockerBuilder;
pub use error::BuildError;
pub use orchestrator::{
    plan, BuildOrchestrator, BuildReport, PlannedBuild, PushSettings, ServiceBuilder,
};
pub use reference::ImageRef;

use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Everything needed to build one service image
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildRequest {
    pub service: String,
    pub image: String,
    pub context: PathBuf,
    pub dockerfile: String,
    pub args: BTreeMap<String, String>,
    pub target: Option<String>,
}

/// Registry login used for pushes
#[derive(Clone, Default, PartialEq, Eq)]
pub struct RegistryCredentials {
    pub username: String,
    pub password: String,
    pub server_address: Option<String>,
}

impl std::fmt::Debug for RegistryCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("server_address", &self.server_address)
            .finish()
    }
}

/// Low-level image operations against a container engine
#[async_trait]
pub trait ImageBuilder: Send + Sync {
    /// Build `request.image` from its context directory
    async fn build(&self, request: &BuildRequest) -> Result<(), BuildError>;

    /// Add `target` as an additional name for the local image `source`
    async fn tag(&self, source: &str, target: &ImageRef) -> Result<(), BuildError>;

    /// Push `target` to its registry
    async fn push(
        &self,
        target: &ImageRef,
        credentials: Option<&RegistryCredentials>,
    ) -> Result<(), BuildError>;
}
