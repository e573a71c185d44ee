//! Engine configuration file parsing.
//!
//! Configuration files are accepted in two formats, selected by extension:
//!
//! - `.toml` is parsed with `toml`
//! - `.yaml` and `.yml` are parsed with `serde_yaml`
//!
//! Errors carry the file path so a broken configuration can be located from the
//! CLI output alone:
//!
//! ```text
//! Configuration error: failed to parse /repo/stackres.yaml: stacks.name_pattern: invalid type: sequence, expected a string
//! ```

use serde::de::DeserializeOwned;
use std::path::Path;

use crate::core::{FileOperation, FileResultExt, Result, StackError};

/// Parse a configuration file into the specified type.
///
/// Files without a recognized extension are parsed as YAML, which is the format
/// the stack manifests themselves use.
///
/// # Examples
///
/// ```rust,no_run
/// use stack_resolver::config::{EngineConfig, parse_config};
/// use std::path::Path;
///
/// # fn example() -> stack_resolver::core::Result<()> {
/// let config: EngineConfig = parse_config(Path::new("stackres.yaml"))?;
/// println!("stacks live under {}", config.stacks_base_dir().display());
/// # Ok(())
/// # }
/// ```
///
/// # Errors
///
/// - [`StackError::File`] if the file cannot be read
/// - [`StackError::Config`] if the content does not deserialize into `T`
pub fn parse_config<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path).with_file_context(
        FileOperation::Read,
        path,
        "loading engine configuration",
    )?;

    let is_toml = path.extension().and_then(|ext| ext.to_str()) == Some("toml");
    let parsed = if is_toml {
        toml::from_str(&content).map_err(|e| e.to_string())
    } else {
        serde_yaml::from_str(&content).map_err(|e| e.to_string())
    };

    parsed.map_err(|reason| {
        StackError::config(format!("failed to parse {}: {}", path.display(), reason.trim_end()))
    })
}
