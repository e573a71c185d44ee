//! `stackres validate`: check that a component resolves and can be deployed.
//!
//! Validation runs the full resolution used by `describe component` and
//! additionally rejects abstract components.

use anyhow::Result;
use clap::{Args, Subcommand, ValueEnum};
use colored::Colorize;
use serde::Serialize;

use crate::component::ComponentType;
use crate::config::EngineConfig;
use crate::describe::{DescribeRequest, resolve_component};

#[derive(Args)]
pub struct ValidateCommand {
    #[command(subcommand)]
    target: ValidateTarget,
}

#[derive(Subcommand)]
enum ValidateTarget {
    /// Validate one component in one stack.
    Component(ComponentArgs),
}

#[derive(Args)]
struct ComponentArgs {
    component: String,

    #[arg(short, long)]
    stack: String,

    #[arg(long = "type", value_enum, default_value_t = ComponentType::Terraform)]
    component_type: ComponentType,

    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    format: ReportFormat,
}

/// Output format of the validation report.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Text,
    Json,
}

#[derive(Serialize)]
struct ValidationReport<'a> {
    valid: bool,
    component: &'a str,
    stack: &'a str,
    stack_file: &'a str,
    workspace: &'a str,
}

impl ValidateCommand {
    pub fn execute(self, config: &EngineConfig) -> Result<()> {
        let ValidateTarget::Component(args) = self.target;
        let request = DescribeRequest {
            component: &args.component,
            stack: &args.stack,
            component_type: args.component_type,
            deployable: true,
        };
        let description = resolve_component(config, &request)?;

        match args.format {
            ReportFormat::Text => {
                println!("{} component validated successfully", "✓".green());
            }
            ReportFormat::Json => {
                let report = ValidationReport {
                    valid: true,
                    component: &args.component,
                    stack: &args.stack,
                    stack_file: &description.stack_file,
                    workspace: &description.workspace,
                };
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
        }
        Ok(())
    }
}
