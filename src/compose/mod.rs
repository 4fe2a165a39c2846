//! Compose file model and parser
//!
//! Only the parts of the compose format needed to build images are modelled:
//! the top-level `name`, and each service's `image` and `build` sections.
//! Everything else in the document is accepted and ignored.

pub mod error;
pub mod parser;
pub mod spec;

pub use error::ComposeError;
pub use parser::{ComposeParser, FileComposeParser};
pub use spec::{BuildConfig, ComposeSpec, Service, DEFAULT_DOCKERFILE};
