//! Output formatting for `plan`
//!
//! Renders the builds a run would perform as JSON, YAML or human-readable
//! text.
//!
//! # Example
//!
//! ```no_run
//! use composebox::cli::output::{OutputFormat, OutputFormatter};
//! use composebox::compose::{ComposeParser, FileComposeParser};
//! use composebox::fs::RealFileSystem;
//! use std::path::Path;
//!
//! let spec = FileComposeParser::new(RealFileSystem)
//!     .parse(Path::new("docker-compose.yml"))
//!     .unwrap();
//! let planned = composebox::builder::plan(&spec, &[], None).unwrap();
//! let output = OutputFormatter::new(OutputFormat::Json)
//!     .format_plan(spec.project_name(), &planned)
//!     .unwrap();
//! println!("{}", output);
//! ```

use anyhow::{Context, Result};
use serde::Serialize;
use std::fmt::Write;

use crate::builder::PlannedBuild;

/// Output format enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON format (machine-readable)
    Json,
    /// YAML format
    Yaml,
    /// Human-readable formatted text
    Human,
}

#[derive(Serialize)]
struct PlanDocument<'a> {
    project: &'a str,
    services: &'a [PlannedBuild],
}

/// Output formatter for build plans
pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats the builds planned for `project`
    pub fn format_plan(&self, project: &str, planned: &[PlannedBuild]) -> Result<String> {
        let document = PlanDocument {
            project,
            services: planned,
        };

        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(&document)
                .context("Failed to serialize build plan to JSON"),
            OutputFormat::Yaml => {
                serde_yaml::to_string(&document).context("Failed to serialize build plan to YAML")
            }
            OutputFormat::Human => Ok(self.format_human(project, planned)),
        }
    }

    fn format_human(&self, project: &str, planned: &[PlannedBuild]) -> String {
        let mut output = String::new();

        let _ = writeln!(output, "Project: {}", project);
        if planned.is_empty() {
            let _ = writeln!(output, "\nNo services to build.");
            return output;
        }

        for build in planned {
            let _ = writeln!(output, "\n{}", build.service);
            let _ = writeln!(output, "  Image:      {}", build.image);
            let _ = writeln!(output, "  Context:    {}", build.context.display());
            let _ = writeln!(output, "  Dockerfile: {}", build.dockerfile);
            if let Some(target) = &build.target {
                let _ = writeln!(output, "  Target:     {}", target);
            }
            for target in &build.push_targets {
                let _ = writeln!(output, "  Push:       {}", target);
            }
        }

        output
    }
}
