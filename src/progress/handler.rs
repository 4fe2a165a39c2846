//! Progress handler trait and events

use std::time::Duration;

/// Events emitted while building compose services
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// Orchestration started
    Started { project: String, services: usize },

    /// Service has nothing to build
    ServiceSkipped { service: String, reason: String },

    /// Image build started
    BuildStarted {
        service: String,
        image: String,
        index: usize,
        total: usize,
    },

    /// Image build finished
    BuildComplete {
        service: String,
        image: String,
        build_time: Duration,
    },

    /// Push of one tag started
    PushStarted { image: String },

    /// Push of one tag finished
    PushComplete { image: String, push_time: Duration },

    /// All selected services were processed
    Completed {
        built: usize,
        pushed: usize,
        total_time: Duration,
    },

    /// Orchestration stopped on an error
    Failed { service: String, error: String },
}

/// Trait for handling progress events during a build run
pub trait ProgressHandler: Send + Sync {
    /// Called when a progress event occurs
    fn on_progress(&self, event: &ProgressEvent);
}
