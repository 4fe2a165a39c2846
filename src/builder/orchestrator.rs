//! Builds every service of a compose project in order

use super::{BuildError, BuildRequest, ImageBuilder, ImageRef, RegistryCredentials};
use crate::compose::{BuildConfig, ComposeSpec};
use crate::progress::{LoggingHandler, ProgressEvent, ProgressHandler};
use async_trait::async_trait;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Builds all services declared in a parsed compose spec
#[async_trait]
pub trait ServiceBuilder: Send + Sync {
    async fn build_all_services(&self, spec: &ComposeSpec) -> Result<BuildReport, BuildError>;
}

/// Images produced by one run, in build order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildReport {
    pub built: Vec<String>,
    pub pushed: Vec<String>,
}

/// Where built images are pushed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushSettings {
    pub registry: String,
    pub tags: Vec<String>,
    pub credentials: Option<RegistryCredentials>,
}

impl PushSettings {
    /// Registry references `image` is pushed as, one per tag
    pub fn targets(&self, image: &str) -> Vec<ImageRef> {
        self.tags
            .iter()
            .map(|tag| ImageRef::in_registry(&self.registry, image, tag))
            .collect()
    }
}

/// One image a run would build, with the references it would be pushed as
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedBuild {
    pub service: String,
    pub image: String,
    pub context: PathBuf,
    pub dockerfile: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub push_targets: Vec<String>,
}

fn check_selection(spec: &ComposeSpec, services: &[String]) -> Result<(), BuildError> {
    match services
        .iter()
        .find(|s| !spec.services.contains_key(s.as_str()))
    {
        Some(unknown) => Err(BuildError::UnknownService(unknown.clone())),
        None => Ok(()),
    }
}

/// The builds `build_all_services` would run, without touching a daemon
pub fn plan(
    spec: &ComposeSpec,
    services: &[String],
    push: Option<&PushSettings>,
) -> Result<Vec<PlannedBuild>, BuildError> {
    check_selection(spec, services)?;

    let project = spec.project_name();
    Ok(spec
        .buildable_services()
        .filter(|(name, _, _)| services.is_empty() || services.iter().any(|s| s == name))
        .map(|(name, service, build)| {
            let image = service.image_name(project, name);
            let push_targets = push
                .map(|p| p.targets(&image).iter().map(ToString::to_string).collect())
                .unwrap_or_default();
            PlannedBuild {
                service: name.to_string(),
                image,
                context: build.context.clone(),
                dockerfile: build.dockerfile.clone(),
                target: build.target.clone(),
                push_targets,
            }
        })
        .collect())
}

/// [`ServiceBuilder`] that delegates each image operation to an [`ImageBuilder`]
pub struct BuildOrchestrator<B: ImageBuilder> {
    builder: B,
    push: Option<PushSettings>,
    services: Vec<String>,
    progress: Arc<dyn ProgressHandler>,
}

impl<B: ImageBuilder> BuildOrchestrator<B> {
    pub fn new(builder: B) -> Self {
        Self {
            builder,
            push: None,
            services: Vec::new(),
            progress: Arc::new(LoggingHandler),
        }
    }

    pub fn with_push(mut self, push: Option<PushSettings>) -> Self {
        self.push = push;
        self
    }

    /// Restrict the run to the named services. Empty means all.
    pub fn with_services(mut self, services: Vec<String>) -> Self {
        self.services = services;
        self
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressHandler>) -> Self {
        self.progress = progress;
        self
    }

    pub fn builder(&self) -> &B {
        &self.builder
    }

    fn is_selected(&self, service: &str) -> bool {
        self.services.is_empty() || self.services.iter().any(|s| s == service)
    }

    async fn build_service(
        &self,
        name: &str,
        image: &str,
        build: &BuildConfig,
        report: &mut BuildReport,
    ) -> Result<(), BuildError> {
        let request = BuildRequest {
            service: name.to_string(),
            image: image.to_string(),
            context: build.context.clone(),
            dockerfile: build.dockerfile.clone(),
            args: build.args.clone(),
            target: build.target.clone(),
        };

        let started = Instant::now();
        self.builder.build(&request).await?;
        report.built.push(image.to_string());
        self.progress.on_progress(&ProgressEvent::BuildComplete {
            service: name.to_string(),
            image: image.to_string(),
            build_time: started.elapsed(),
        });

        let Some(push) = &self.push else {
            return Ok(());
        };

        for target in push.targets(image) {
            let reference = target.to_string();
            self.progress.on_progress(&ProgressEvent::PushStarted {
                image: reference.clone(),
            });

            let started = Instant::now();
            self.builder.tag(image, &target).await?;
            self.builder
                .push(&target, push.credentials.as_ref())
                .await?;

            report.pushed.push(reference.clone());
            self.progress.on_progress(&ProgressEvent::PushComplete {
                image: reference,
                push_time: started.elapsed(),
            });
        }

        Ok(())
    }
}

#[async_trait]
impl<B: ImageBuilder> ServiceBuilder for BuildOrchestrator<B> {
    async fn build_all_services(&self, spec: &ComposeSpec) -> Result<BuildReport, BuildError> {
        check_selection(spec, &self.services)?;

        let started = Instant::now();
        let project = spec.project_name();
        let selected: Vec<_> = spec
            .services
            .iter()
            .filter(|(name, _)| self.is_selected(name))
            .collect();
        let total = selected.iter().filter(|(_, s)| s.build.is_some()).count();

        self.progress.on_progress(&ProgressEvent::Started {
            project: project.to_string(),
            services: total,
        });

        if total == 0 {
            warn!(project, "No selected service declares a build section");
        }

        let mut report = BuildReport::default();
        let mut index = 0;

        for (name, service) in selected {
            let Some(build) = &service.build else {
                self.progress.on_progress(&ProgressEvent::ServiceSkipped {
                    service: name.clone(),
                    reason: "no build section".to_string(),
                });
                continue;
            };

            index += 1;
            let image = service.image_name(project, name);
            debug!(service = %name, context = %build.context.display(), "Resolved build request");
            self.progress.on_progress(&ProgressEvent::BuildStarted {
                service: name.clone(),
                image: image.clone(),
                index,
                total,
            });

            if let Err(e) = self.build_service(name, &image, build, &mut report).await {
                self.progress.on_progress(&ProgressEvent::Failed {
                    service: name.clone(),
                    error: e.to_string(),
                });
                return Err(e);
            }
        }

        self.progress.on_progress(&ProgressEvent::Completed {
            built: report.built.len(),
            pushed: report.pushed.len(),
            total_time: started.elapsed(),
        });

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::{BuildConfig, Service};
    use std::collections::BTreeMap;
    use std::path::PathBuf;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingBuilder {
        calls: Mutex<Vec<String>>,
        fail_build_of: Option<String>,
    }

    impl RecordingBuilder {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ImageBuilder for RecordingBuilder {
        async fn build(&self, request: &BuildRequest) -> Result<(), BuildError> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("build {}", request.image));
            if self.fail_build_of.as_deref() == Some(request.service.as_str()) {
                return Err(BuildError::Daemon {
                    image: request.image.clone(),
                    message: "COPY failed".to_string(),
                });
            }
            Ok(())
        }

        async fn tag(&self, source: &str, target: &ImageRef) -> Result<(), BuildError> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("tag {} {}", source, target));
            Ok(())
        }

        async fn push(
            &self,
            target: &ImageRef,
            credentials: Option<&RegistryCredentials>,
        ) -> Result<(), BuildError> {
            let user = credentials.map(|c| c.username.as_str()).unwrap_or("-");
            self.calls
                .lock()
                .unwrap()
                .push(format!("push {} as {}", target, user));
            Ok(())
        }
    }

    #[derive(Default)]
    struct CollectingHandler {
        events: Mutex<Vec<ProgressEvent>>,
    }

    impl ProgressHandler for CollectingHandler {
        fn on_progress(&self, event: &ProgressEvent) {
            self.events.lock().unwrap().push(event.clone());
        }
    }

    fn buildable(image: Option<&str>, context: &str) -> Service {
        Service {
            image: image.map(str::to_string),
            build: Some(BuildConfig {
                context: PathBuf::from(context),
                ..Default::default()
            }),
        }
    }

    fn spec() -> ComposeSpec {
        let mut services = BTreeMap::new();
        services.insert("web".to_string(), buildable(Some("Acme/Web"), "/src/web"));
        services.insert("api".to_string(), buildable(None, "/src/api"));
        services.insert(
            "db".to_string(),
            Service {
                image: Some("postgres:16".to_string()),
                build: None,
            },
        );
        ComposeSpec {
            name: Some("shop".to_string()),
            services,
        }
    }

    #[tokio::test]
    async fn test_builds_buildable_services_in_name_order() {
        let orchestrator = BuildOrchestrator::new(RecordingBuilder::default());

        let report = orchestrator.build_all_services(&spec()).await.unwrap();

        assert_eq!(report.built, vec!["shop-api", "acme/web"]);
        assert!(report.pushed.is_empty());
        assert_eq!(
            orchestrator.builder().calls(),
            vec!["build shop-api", "build acme/web"]
        );
    }

    #[tokio::test]
    async fn test_tags_and_pushes_every_tag() {
        let orchestrator = BuildOrchestrator::new(RecordingBuilder::default())
            .with_services(vec!["web".to_string()])
            .with_push(Some(PushSettings {
                registry: "ghcr.io/acme".to_string(),
                tags: vec!["latest".to_string(), "v1".to_string()],
                credentials: Some(RegistryCredentials {
                    username: "bot".to_string(),
                    password: "secret".to_string(),
                    server_address: None,
                }),
            }));

        let report = orchestrator.build_all_services(&spec()).await.unwrap();

        assert_eq!(
            report.pushed,
            vec!["ghcr.io/acme/acme/web:latest", "ghcr.io/acme/acme/web:v1"]
        );
        assert_eq!(
            orchestrator.builder().calls(),
            vec![
                "build acme/web",
                "tag acme/web ghcr.io/acme/acme/web:latest",
                "push ghcr.io/acme/acme/web:latest as bot",
                "tag acme/web ghcr.io/acme/acme/web:v1",
                "push ghcr.io/acme/acme/web:v1 as bot",
            ]
        );
    }

    #[tokio::test]
    async fn test_stops_at_first_failure() {
        let builder = RecordingBuilder {
            fail_build_of: Some("api".to_string()),
            ..Default::default()
        };
        let handler = Arc::new(CollectingHandler::default());
        let orchestrator = BuildOrchestrator::new(builder).with_progress(handler.clone());

        let err = orchestrator.build_all_services(&spec()).await.unwrap_err();

        assert!(matches!(err, BuildError::Daemon { ref image, .. } if image == "shop-api"));
        assert_eq!(orchestrator.builder().calls(), vec!["build shop-api"]);

        let events = handler.events.lock().unwrap();
        assert!(matches!(
            events.last(),
            Some(ProgressEvent::Failed { service, .. }) if service == "api"
        ));
    }

    #[tokio::test]
    async fn test_unknown_service_filter() {
        let orchestrator = BuildOrchestrator::new(RecordingBuilder::default())
            .with_services(vec!["worker".to_string()]);

        let err = orchestrator.build_all_services(&spec()).await.unwrap_err();

        assert!(matches!(err, BuildError::UnknownService(ref s) if s == "worker"));
        assert!(orchestrator.builder().calls().is_empty());
    }

    #[tokio::test]
    async fn test_image_only_selection_builds_nothing() {
        let handler = Arc::new(CollectingHandler::default());
        let orchestrator = BuildOrchestrator::new(RecordingBuilder::default())
            .with_services(vec!["db".to_string()])
            .with_progress(handler.clone());

        let report = orchestrator.build_all_services(&spec()).await.unwrap();

        assert_eq!(report, BuildReport::default());
        let events = handler.events.lock().unwrap();
        assert_eq!(
            events[1],
            ProgressEvent::ServiceSkipped {
                service: "db".to_string(),
                reason: "no build section".to_string(),
            }
        );
    }

    #[test]
    fn test_push_targets() {
        let push = PushSettings {
            registry: "registry.local:5000".to_string(),
            tags: vec!["1.0".to_string()],
            credentials: None,
        };
        assert_eq!(
            push.targets("web:dev"),
            vec![ImageRef::new("registry.local:5000/web", "1.0")]
        );
    }

    #[test]
    fn test_plan_lists_builds_without_daemon() {
        let push = PushSettings {
            registry: "ghcr.io/acme".to_string(),
            tags: vec!["latest".to_string()],
            credentials: None,
        };

        let planned = plan(&spec(), &[], Some(&push)).unwrap();

        let services: Vec<_> = planned.iter().map(|p| p.service.as_str()).collect();
        assert_eq!(services, vec!["api", "web"]);
        assert_eq!(planned[0].image, "shop-api");
        assert_eq!(planned[0].context, PathBuf::from("/src/api"));
        assert_eq!(planned[0].dockerfile, "Dockerfile");
        assert_eq!(planned[0].push_targets, vec!["ghcr.io/acme/shop-api:latest"]);
    }

    #[test]
    fn test_plan_rejects_unknown_service() {
        let err = plan(&spec(), &["cache".to_string()], None).unwrap_err();
        assert!(matches!(err, BuildError::UnknownService(ref s) if s == "cache"));
    }
}
