//! `stackres describe`: print resolved configuration.

use anyhow::Result;
use clap::{Args, Subcommand};

use super::OutputFormat;
use crate::component::ComponentType;
use crate::config::EngineConfig;
use crate::describe::{DescribeRequest, describe_component, describe_stacks};
use crate::value::ConfigValue;

/// Show the resolved configuration of a component or of every stack.
#[derive(Args)]
pub struct DescribeCommand {
    #[command(subcommand)]
    target: DescribeTarget,
}

#[derive(Subcommand)]
enum DescribeTarget {
    /// Describe one component in one stack.
    Component(ComponentArgs),
    /// Describe every stack.
    Stacks(StacksArgs),
}

#[derive(Args)]
struct ComponentArgs {
    /// Component name, e.g. `vpc` or `infra/vpc`.
    component: String,

    /// Stack name or stack manifest path, e.g. `plat-ue2-dev` or `orgs/plat/dev`.
    #[arg(short, long)]
    stack: String,

    #[arg(long = "type", value_enum, default_value_t = ComponentType::Terraform)]
    component_type: ComponentType,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Yaml)]
    format: OutputFormat,
}

#[derive(Args)]
struct StacksArgs {
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Yaml)]
    format: OutputFormat,
}

impl DescribeCommand {
    pub fn execute(self, config: &EngineConfig) -> Result<()> {
        let (value, format) = match self.target {
            DescribeTarget::Component(args) => {
                let request = DescribeRequest {
                    component: &args.component,
                    stack: &args.stack,
                    component_type: args.component_type,
                    deployable: false,
                };
                (describe_component(config, &request)?, args.format)
            }
            DescribeTarget::Stacks(args) => (describe_stacks(config)?, args.format),
        };

        let rendered = format.render(&ConfigValue::from(value))?;
        print!("{rendered}");
        if !rendered.ends_with('\n') {
            println!();
        }
        Ok(())
    }
}
