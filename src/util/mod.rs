//! Utility modules for composebox

pub mod logging;

pub use logging::{init_logging, LoggingConfig};
