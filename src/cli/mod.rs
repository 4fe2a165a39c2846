pub mod commands;
pub mod output;

pub use commands::{CliArgs, Commands, InputArgs, PlanArgs, RunArgs};
pub use output::{OutputFormat, OutputFormatter};
