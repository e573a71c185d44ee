//! Command-line interface for stack-resolver.
//!
//! A thin layer over the library: it parses arguments, loads the engine
//! configuration, sets up logging and prints results. All resolution logic lives
//! in [`crate::describe`] and the modules below it.
//!
//! # Commands
//!
//! - `describe component <name> -s <stack>` - print the resolved component
//! - `describe stacks` - print every resolved stack
//! - `validate component <name> -s <stack>` - resolve a component for deployment
//!
//! # Global Options
//!
//! - `--config <path>` - engine configuration file (default: `stackres.yaml` if present)
//! - `--base-path <path>` - override `base_path` from the configuration
//! - `--verbose` / `--quiet` - log level `debug` / `error` (default `warn`)
//!
//! `RUST_LOG` takes precedence over both flags. Logs go to stderr, so stdout only
//! ever carries command output.
//!
//! # Examples
//!
//! ```bash
//! stackres describe component vpc -s plat-ue2-dev
//! stackres --config infra/stackres.yaml describe component app -s plat-ue2-dev --type helmfile --format json
//! RUST_LOG=stack_resolver=trace stackres describe component vpc -s plat-ue2-prod
//! ```

pub mod describe;
pub mod validate;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::config::EngineConfig;
use crate::constants::DEFAULT_CONFIG_FILE;
use crate::value::ConfigValue;

/// Settings derived from global flags, applied before a command runs.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Log filter used when `RUST_LOG` is not set.
    pub log_level: String,
    pub config_path: Option<PathBuf>,
    pub base_path: Option<PathBuf>,
}

impl CliConfig {
    /// Install the global tracing subscriber.
    ///
    /// Installing twice is harmless; the second attempt is ignored.
    pub fn init_logging(&self) {
        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            EnvFilter::new(&self.log_level)
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }

    /// Load the engine configuration named by the flags.
    ///
    /// Without `--config`, `stackres.yaml` in the working directory is used when it
    /// exists, and built-in defaults otherwise.
    pub fn load_engine_config(&self) -> Result<EngineConfig> {
        let default_path = Path::new(DEFAULT_CONFIG_FILE);
        let mut config = match &self.config_path {
            Some(path) => EngineConfig::load(path)?,
            None if default_path.is_file() => EngineConfig::load(default_path)?,
            None => EngineConfig::default(),
        };

        if let Some(base_path) = &self.base_path {
            config.base_path.clone_from(base_path);
        }
        config.validate()?;

        debug!("Stacks directory: {}", config.stacks_base_dir().display());
        Ok(config)
    }
}

/// Resolve layered stack manifests into component configuration.
#[derive(Parser)]
#[command(
    name = "stackres",
    version,
    about = "Resolve layered infrastructure stack manifests",
    long_about = "Resolves stack manifests, with their imports and component inheritance, into the \
                  final configuration of one component in one stack."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors.
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to the engine configuration file.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Override `base_path` from the configuration.
    #[arg(long, global = true, value_name = "PATH")]
    base_path: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show resolved configuration.
    ///
    /// See [`describe::DescribeCommand`].
    Describe(describe::DescribeCommand),

    /// Check that a component can be deployed.
    ///
    /// See [`validate::ValidateCommand`].
    Validate(validate::ValidateCommand),
}

/// How structured output is printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Yaml,
    Json,
}

impl OutputFormat {
    /// Render a value in this format.
    pub fn render(self, value: &ConfigValue) -> Result<String> {
        Ok(match self {
            Self::Yaml => value.to_yaml_string()?,
            Self::Json => value.to_json_string(true)?,
        })
    }
}

impl Cli {
    pub fn execute(self) -> Result<()> {
        let config = self.build_config();
        self.execute_with_config(config)
    }

    /// Translate global flags into a [`CliConfig`].
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            "warn"
        };

        CliConfig {
            log_level: log_level.to_string(),
            config_path: self.config.clone(),
            base_path: self.base_path.clone(),
        }
    }

    /// Run the command with an explicit configuration.
    pub fn execute_with_config(self, config: CliConfig) -> Result<()> {
        config.init_logging();
        let engine_config = config.load_engine_config()?;

        match self.command {
            Commands::Describe(cmd) => cmd.execute(&engine_config),
            Commands::Validate(cmd) => cmd.execute(&engine_config),
        }
    }
}
