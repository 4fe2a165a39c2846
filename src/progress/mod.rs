//! Progress reporting for service builds

mod handler;
mod logging;

pub use handler::{ProgressEvent, ProgressHandler};
pub use logging::LoggingHandler;
