use clap::{Args, Parser, Subcommand, ValueEnum};
use std::collections::HashMap;

/// Build every service of a compose file, as a CI action or from a shell
#[derive(Parser, Debug)]
#[command(
    name = "composebox",
    about = "Build the images of a compose project",
    version,
    author,
    long_about = "composebox reads a compose file, builds the image of every service that \
                  declares a build section and optionally pushes the results to a registry. \
                  Inside a GitHub Actions runner the action inputs are read from INPUT_* \
                  variables and the completion time is published as the `time` output."
)]
pub struct CliArgs {
    /// Defaults to `run` with inputs taken from the environment
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(
        short = 'v',
        long,
        global = true,
        help = "Enable debug logging"
    )]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress non-error output"
    )]
    pub quiet: bool,

    #[arg(long, global = true, help = "Emit logs as JSON")]
    pub log_json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Build (and optionally push) all compose services",
        long_about = "Parses the compose file and builds every service with a build section.\n\n\
                      Flags override the matching action inputs.\n\n\
                      Examples:\n  \
                      composebox run --compose-file docker-compose.yml\n  \
                      composebox run --service web --registry ghcr.io/acme --tag v1.2.0"
    )]
    Run(RunArgs),

    #[command(
        about = "Show what would be built without contacting the Docker daemon",
        long_about = "Parses the compose file and prints the image, context and push targets \
                      of every service that would be built.\n\n\
                      Examples:\n  \
                      composebox plan --compose-file docker-compose.yml\n  \
                      composebox plan --format json"
    )]
    Plan(PlanArgs),
}

/// Inputs shared by `run` and `plan`
#[derive(Args, Debug, Clone, Default)]
pub struct InputArgs {
    #[arg(
        short = 'f',
        long,
        value_name = "FILE",
        help = "Compose file to build (input: compose-file)"
    )]
    pub compose_file: Option<String>,

    #[arg(
        short = 'C',
        long,
        value_name = "DIR",
        help = "Directory the compose file path is resolved against (input: context)"
    )]
    pub context: Option<String>,

    #[arg(
        short = 's',
        long = "service",
        value_name = "NAME",
        help = "Only build this service; repeatable (input: services)"
    )]
    pub services: Vec<String>,

    #[arg(long, value_name = "REGISTRY", help = "Registry to push to (input: registry)")]
    pub registry: Option<String>,

    #[arg(
        short = 't',
        long = "tag",
        value_name = "TAG",
        help = "Tag pushed images with TAG; repeatable (input: tags)"
    )]
    pub tags: Vec<String>,

    #[arg(long, overrides_with = "no_push", help = "Push built images (input: push)")]
    pub push: bool,

    #[arg(long, overrides_with = "push", help = "Never push built images")]
    pub no_push: bool,
}

impl InputArgs {
    /// Flags given on the command line, keyed by action input name
    pub fn overrides(&self) -> HashMap<String, String> {
        let mut inputs = HashMap::new();

        if let Some(file) = &self.compose_file {
            inputs.insert("compose-file".to_string(), file.clone());
        }
        if let Some(context) = &self.context {
            inputs.insert("context".to_string(), context.clone());
        }
        if !self.services.is_empty() {
            inputs.insert("services".to_string(), self.services.join(","));
        }
        if let Some(registry) = &self.registry {
            inputs.insert("registry".to_string(), registry.clone());
        }
        if !self.tags.is_empty() {
            inputs.insert("tags".to_string(), self.tags.join(","));
        }
        if self.push {
            inputs.insert("push".to_string(), "true".to_string());
        } else if self.no_push {
            inputs.insert("push".to_string(), "false".to_string());
        }

        inputs
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    #[command(flatten)]
    pub inputs: InputArgs,
}

#[derive(Args, Debug, Clone)]
pub struct PlanArgs {
    #[command(flatten)]
    pub inputs: InputArgs,

    #[arg(
        short = 'o',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormatArg {
    Json,
    Yaml,
    Human,
}

impl From<OutputFormatArg> for super::output::OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Json => super::output::OutputFormat::Json,
            OutputFormatArg::Yaml => super::output::OutputFormat::Yaml,
            OutputFormatArg::Human => super::output::OutputFormat::Human,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_args_verify() {
        CliArgs::command().debug_assert();
    }

    #[test]
    fn test_no_subcommand() {
        let args = CliArgs::parse_from(["composebox"]);
        assert!(args.command.is_none());
        assert!(!args.verbose);
    }

    #[test]
    fn test_run_overrides() {
        let args = CliArgs::parse_from([
            "composebox",
            "run",
            "--compose-file",
            "deploy/compose.yml",
            "--service",
            "web",
            "-s",
            "worker",
            "--registry",
            "ghcr.io/acme",
            "-t",
            "latest",
            "-t",
            "v1",
            "--no-push",
        ]);

        let Some(Commands::Run(run)) = args.command else {
            panic!("Expected Run command");
        };
        let inputs = run.inputs.overrides();
        assert_eq!(inputs["compose-file"], "deploy/compose.yml");
        assert_eq!(inputs["services"], "web,worker");
        assert_eq!(inputs["registry"], "ghcr.io/acme");
        assert_eq!(inputs["tags"], "latest,v1");
        assert_eq!(inputs["push"], "false");
        assert!(!inputs.contains_key("context"));
    }

    #[test]
    fn test_last_push_flag_wins() {
        let args = CliArgs::parse_from(["composebox", "run", "--no-push", "--push"]);
        let Some(Commands::Run(run)) = args.command else {
            panic!("Expected Run command");
        };
        assert_eq!(run.inputs.overrides()["push"], "true");
    }

    #[test]
    fn test_empty_run_has_no_overrides() {
        assert!(RunArgs::default().inputs.overrides().is_empty());
    }

    #[test]
    fn test_plan_format() {
        let args = CliArgs::parse_from(["composebox", "plan", "-f", "compose.yml", "-o", "json"]);
        match args.command {
            Some(Commands::Plan(plan)) => {
                assert_eq!(plan.format, OutputFormatArg::Json);
                assert_eq!(plan.inputs.compose_file.as_deref(), Some("compose.yml"));
            }
            _ => panic!("Expected Plan command"),
        }
    }

    #[test]
    fn test_global_flags() {
        let args = CliArgs::parse_from(["composebox", "plan", "-q", "--log-json"]);
        assert!(args.quiet);
        assert!(args.log_json);

        let args = CliArgs::parse_from(["composebox", "--log-level", "debug", "run"]);
        assert_eq!(args.log_level, Some("debug".to_string()));
    }
}
