//! Container action entry point
//!
//! [`run`] is the whole action: read the `compose-file` input, parse it,
//! build every service, and publish the `time` output. The runner-facing
//! side (inputs, outputs, log annotations) goes through
//! [`ActionEnvironment`] so the sequence can be driven without a runner.

pub mod commands;
pub mod environment;
pub mod error;
pub mod run;
pub mod timestamp;

pub use environment::{ActionEnvironment, EnvEvent, GithubEnvironment, MemoryEnvironment};
pub use error::ActionError;
pub use run::{run, ActionOutcome, COMPOSE_FILE_INPUT, TIME_OUTPUT};
pub use timestamp::timestamp;
