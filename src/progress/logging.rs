//! Logging-based progress handler

use super::{ProgressEvent, ProgressHandler};
use tracing::{debug, error, info};

/// Handler that logs progress events using tracing
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingHandler;

impl ProgressHandler for LoggingHandler {
    fn on_progress(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::Started { project, services } => {
                info!(project = %project, services, "Building compose services");
            }
            ProgressEvent::ServiceSkipped { service, reason } => {
                debug!(service = %service, reason = %reason, "Skipping service");
            }
            ProgressEvent::BuildStarted {
                service,
                image,
                index,
                total,
            } => {
                info!(
                    service = %service,
                    progress = format!("{}/{}", index, total),
                    "Building: {}",
                    image
                );
            }
            ProgressEvent::BuildComplete {
                service,
                image,
                build_time,
            } => {
                info!(
                    service = %service,
                    image = %image,
                    build_time_ms = build_time.as_millis(),
                    "Build complete"
                );
            }
            ProgressEvent::PushStarted { image } => {
                info!("Pushing: {}", image);
            }
            ProgressEvent::PushComplete { image, push_time } => {
                info!(
                    image = %image,
                    push_time_ms = push_time.as_millis(),
                    "Push complete"
                );
            }
            ProgressEvent::Completed {
                built,
                pushed,
                total_time,
            } => {
                info!(
                    built,
                    pushed,
                    total_time_ms = total_time.as_millis(),
                    "All services processed"
                );
            }
            ProgressEvent::Failed { service, error } => {
                error!(service = %service, error = %error, "Service build failed");
            }
        }
    }
}
