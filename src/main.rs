use composebox::action::{self, ActionEnvironment, GithubEnvironment, COMPOSE_FILE_INPUT};
use composebox::builder::{self, BuildOrchestrator, DockerBuilder};
use composebox::cli::commands::{CliArgs, Commands, PlanArgs, RunArgs};
use composebox::cli::output::OutputFormatter;
use composebox::compose::{ComposeParser, FileComposeParser};
use composebox::fs::RealFileSystem;
use composebox::util::logging::parse_level;
use composebox::util::{init_logging, LoggingConfig};
use composebox::{ActionConfig, NAME, VERSION};

use clap::Parser;
use std::path::Path;
use std::process;
use tracing::{debug, info, Level};

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();
    init_logging_from_args(&args);

    debug!("{} v{} starting", NAME, VERSION);
    debug!("Arguments: {:?}", args);

    let exit_code = match &args.command {
        Some(Commands::Run(run_args)) => handle_run(run_args).await,
        Some(Commands::Plan(plan_args)) => handle_plan(plan_args),
        None => handle_run(&RunArgs::default()).await,
    };

    process::exit(exit_code);
}

fn init_logging_from_args(args: &CliArgs) {
    let mut config = LoggingConfig::from_env();

    if let Some(level_str) = &args.log_level {
        config.level = parse_level(level_str);
    } else if args.verbose {
        config.level = Level::DEBUG;
    } else if args.quiet {
        config.level = Level::ERROR;
    }
    config.use_json |= args.log_json;

    init_logging(config);
}

fn load_config(env: &GithubEnvironment) -> Option<ActionConfig> {
    match ActionConfig::from_environment(env) {
        Ok(config) => {
            debug!("Configuration: {:?}", config);
            Some(config)
        }
        Err(e) => {
            env.error(&format!("Action error: {}", e));
            None
        }
    }
}

async fn handle_run(args: &RunArgs) -> i32 {
    let env = GithubEnvironment::from_env().with_overrides(args.inputs.overrides());
    let Some(config) = load_config(&env) else {
        return 1;
    };

    let parser = FileComposeParser::new(RealFileSystem).with_working_dir(&config.context);
    let orchestrator = BuildOrchestrator::new(DockerBuilder::new(config.timeout))
        .with_services(config.services)
        .with_push(config.push);

    match action::run(&env, &parser, &orchestrator).await {
        Ok(outcome) => {
            info!(
                built = outcome.report.built.len(),
                pushed = outcome.report.pushed.len(),
                time = %outcome.time,
                "Action finished"
            );
            0
        }
        Err(_) => 1,
    }
}

fn handle_plan(args: &PlanArgs) -> i32 {
    let env = GithubEnvironment::from_env()
        .with_overrides(args.inputs.overrides())
        .with_annotations(false);
    let Some(config) = load_config(&env) else {
        return 1;
    };

    let Some(compose_file) = env.get_input(COMPOSE_FILE_INPUT) else {
        env.error(&format!(
            "Action error: Input required and not supplied: {}",
            COMPOSE_FILE_INPUT
        ));
        return 1;
    };

    let parser = FileComposeParser::new(RealFileSystem).with_working_dir(&config.context);
    let spec = match parser.parse(Path::new(&compose_file)) {
        Ok(spec) => spec,
        Err(e) => {
            env.error(&format!("Action error: {}", e));
            return 1;
        }
    };

    let planned = match builder::plan(&spec, &config.services, config.push.as_ref()) {
        Ok(planned) => planned,
        Err(e) => {
            env.error(&format!("Action error: {}", e));
            return 1;
        }
    };

    match OutputFormatter::new(args.format.into()).format_plan(spec.project_name(), &planned) {
        Ok(output) => {
            println!("{}", output.trim_end());
            0
        }
        Err(e) => {
            env.error(&format!("Failed to format plan: {}", e));
            1
        }
    }
}
