use super::context::archive_context;
use super::{BuildError, BuildRequest, ImageBuilder, ImageRef, RegistryCredentials};
use async_trait::async_trait;
use bollard::auth::DockerCredentials;
use bollard::image::{BuildImageOptions, PushImageOptions, TagImageOptions};
use bollard::Docker;
use bytes::Bytes;
use futures_util::StreamExt;
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info};

/// Default limit for a single daemon operation
pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(300);

async fn with_timeout<T>(
    operation: &str,
    limit: Duration,
    future: impl Future<Output = Result<T, BuildError>>,
) -> Result<T, BuildError> {
    tokio::time::timeout(limit, future)
        .await
        .map_err(|_| BuildError::Timeout {
            operation: operation.to_string(),
            seconds: limit.as_secs(),
        })?
}

/// [`ImageBuilder`] talking to the Docker Engine API
///
/// Nothing touches `DOCKER_HOST` or the socket until the first image
/// operation, so input and compose errors surface before daemon problems.
pub struct DockerBuilder {
    docker: OnceCell<Docker>,
    timeout: Duration,
}

impl DockerBuilder {
    pub fn new(timeout: Duration) -> Self {
        Self {
            docker: OnceCell::new(),
            timeout,
        }
    }

    /// Client for `DOCKER_HOST` or the local socket, checked with a version
    /// call the first time it is needed
    async fn client(&self) -> Result<&Docker, BuildError> {
        self.docker
            .get_or_try_init(|| async {
                let docker = Docker::connect_with_local_defaults()
                    .map_err(|e| BuildError::Connect(e.to_string()))?;

                let version = with_timeout("Docker version check", self.timeout, async {
                    docker
                        .version()
                        .await
                        .map_err(|e| BuildError::Connect(e.to_string()))
                })
                .await?;

                debug!(
                    api_version = version.api_version.as_deref().unwrap_or("unknown"),
                    engine = version.version.as_deref().unwrap_or("unknown"),
                    "Connected to Docker daemon"
                );
                Ok::<Docker, BuildError>(docker)
            })
            .await
    }
}

#[async_trait]
impl ImageBuilder for DockerBuilder {
    async fn build(&self, request: &BuildRequest) -> Result<(), BuildError> {
        let docker = self.client().await?;
        let tarball = archive_context(&request.context, &request.dockerfile).await?;

        let options = BuildImageOptions {
            dockerfile: request.dockerfile.clone(),
            t: request.image.clone(),
            rm: true,
            buildargs: request
                .args
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect::<HashMap<_, _>>(),
            target: request.target.clone().unwrap_or_default(),
            ..Default::default()
        };

        let image = request.image.as_str();
        with_timeout(&format!("Build of {}", image), self.timeout, async {
            let mut stream =
                Box::pin(docker.build_image(options, None, Some(Bytes::from(tarball))));
            while let Some(item) = stream.next().await {
                let item = item?;
                if let Some(message) = item.error {
                    return Err(BuildError::Daemon {
                        image: image.to_string(),
                        message,
                    });
                }
                if let Some(line) = item.stream {
                    let line = line.trim_end();
                    if !line.is_empty() {
                        info!(target: "composebox::build", image, "{}", line);
                    }
                }
            }
            Ok(())
        })
        .await
    }

    async fn tag(&self, source: &str, target: &ImageRef) -> Result<(), BuildError> {
        let docker = self.client().await?;
        let options = TagImageOptions {
            repo: target.repository.clone(),
            tag: target.tag.clone(),
        };

        with_timeout(&format!("Tag of {}", target), self.timeout, async {
            docker.tag_image(source, Some(options)).await?;
            Ok(())
        })
        .await
    }

    async fn push(
        &self,
        target: &ImageRef,
        credentials: Option<&RegistryCredentials>,
    ) -> Result<(), BuildError> {
        let docker = self.client().await?;
        let options = PushImageOptions {
            tag: target.tag.clone(),
        };
        let credentials = credentials.map(|c| DockerCredentials {
            username: Some(c.username.clone()),
            password: Some(c.password.clone()),
            serveraddress: c.server_address.clone(),
            ..Default::default()
        });
        let reference = target.to_string();

        with_timeout(&format!("Push of {}", reference), self.timeout, async {
            let mut stream = Box::pin(docker.push_image(
                &target.repository,
                Some(options),
                credentials,
            ));
            while let Some(item) = stream.next().await {
                let item = item?;
                if let Some(message) = item.error {
                    return Err(BuildError::Daemon {
                        image: reference.clone(),
                        message,
                    });
                }
                if let Some(status) = item.status {
                    debug!(target: "composebox::push", image = %reference, "{}", status);
                }
            }
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    #[tokio::test]
    async fn test_with_timeout_expires() {
        let result: Result<(), BuildError> = with_timeout("sleep", Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;

        assert!(matches!(
            result,
            Err(BuildError::Timeout { ref operation, seconds: 0 }) if operation == "sleep"
        ));
    }

    #[tokio::test]
    async fn test_with_timeout_passes_result_through() {
        let result = with_timeout("quick", Duration::from_secs(1), async {
            Err::<(), _>(BuildError::UnknownService("web".to_string()))
        })
        .await;

        assert!(matches!(result, Err(BuildError::UnknownService(_))));
    }

    #[tokio::test]
    #[serial]
    async fn test_missing_socket_fails_on_first_use() {
        let previous = env::var_os("DOCKER_HOST");
        env::set_var("DOCKER_HOST", "unix:///nonexistent/docker.sock");

        let builder = DockerBuilder::new(Duration::from_secs(5));
        let result = builder
            .tag("shop-web", &ImageRef::new("ghcr.io/acme/shop-web", "latest"))
            .await;

        match previous {
            Some(value) => env::set_var("DOCKER_HOST", value),
            None => env::remove_var("DOCKER_HOST"),
        }
        assert!(matches!(result, Err(BuildError::Connect(_))));
    }
}
