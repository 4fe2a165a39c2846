//! The action sequence

use super::environment::ActionEnvironment;
use super::error::ActionError;
use super::timestamp::timestamp;
use crate::builder::{BuildReport, ServiceBuilder};
use crate::compose::ComposeParser;
use crate::config::ConfigError;
use std::path::Path;

/// Input naming the compose file
pub const COMPOSE_FILE_INPUT: &str = "compose-file";

/// Output receiving the completion timestamp
pub const TIME_OUTPUT: &str = "time";

/// Result of a successful run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionOutcome {
    /// Value published as the `time` output
    pub time: String,
    pub report: BuildReport,
}

/// Parse the compose file named by the `compose-file` input, build all of
/// its services, and publish the `time` output.
///
/// A timestamp is logged at debug level right before parsing and right after
/// the build returns. Any failure is logged once as `Action error: ...`, the
/// output is left unset, and the error is returned so the caller can fail
/// the step.
pub async fn run(
    env: &dyn ActionEnvironment,
    parser: &dyn ComposeParser,
    builder: &dyn ServiceBuilder,
) -> Result<ActionOutcome, ActionError> {
    match execute(env, parser, builder).await {
        Ok(outcome) => Ok(outcome),
        Err(e) => {
            env.error(&format!("Action error: {}", e));
            Err(e)
        }
    }
}

async fn execute(
    env: &dyn ActionEnvironment,
    parser: &dyn ComposeParser,
    builder: &dyn ServiceBuilder,
) -> Result<ActionOutcome, ActionError> {
    let compose_file = env
        .get_input(COMPOSE_FILE_INPUT)
        .ok_or_else(|| ConfigError::MissingInput(COMPOSE_FILE_INPUT.to_string()))?;

    env.debug(&timestamp());
    let spec = parser.parse(Path::new(&compose_file))?;
    let report = builder.build_all_services(&spec).await?;
    env.debug(&timestamp());

    let time = timestamp();
    env.set_output(TIME_OUTPUT, &time)?;

    Ok(ActionOutcome { time, report })
}
