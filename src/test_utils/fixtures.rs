//! Temporary stack repositories for tests.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::config::EngineConfig;
use crate::constants::{DEFAULT_CONFIG_FILE, DEFAULT_STACKS_BASE_PATH};

/// Root manifests live under `orgs/`; `_defaults` files are imported, never roots.
pub const FIXTURE_INCLUDED_PATHS: &str = "orgs/**/*";
pub const FIXTURE_EXCLUDED_PATHS: &str = "**/_defaults*";

/// A repository in a temporary directory with a `stacks/` directory.
///
/// The directory is removed when the fixture is dropped.
pub struct StackFixture {
    pub temp_dir: TempDir,
}

impl StackFixture {
    pub fn new() -> Result<Self> {
        super::init_test_logging(None);

        let temp_dir = TempDir::new()?;
        fs::create_dir_all(temp_dir.path().join(DEFAULT_STACKS_BASE_PATH))?;
        Ok(Self { temp_dir })
    }

    /// Repository root.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn stacks_dir(&self) -> PathBuf {
        self.path().join(DEFAULT_STACKS_BASE_PATH)
    }

    /// Write a manifest relative to the stacks directory, creating parent directories.
    pub fn write_manifest(&self, relative: &str, content: &str) -> Result<PathBuf> {
        let path = self.stacks_dir().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }

    /// Write `stackres.yaml` at the repository root.
    pub fn write_config(&self, content: &str) -> Result<PathBuf> {
        let path = self.path().join(DEFAULT_CONFIG_FILE);
        fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }

    /// Write a `stackres.yaml` equivalent to [`config`](Self::config), with a custom
    /// name pattern.
    pub fn write_default_config(&self, name_pattern: &str) -> Result<PathBuf> {
        self.write_config(&format!(
            "base_path: {}\nstacks:\n  base_path: {DEFAULT_STACKS_BASE_PATH}\n  included_paths: ['{FIXTURE_INCLUDED_PATHS}']\n  excluded_paths: ['{FIXTURE_EXCLUDED_PATHS}']\n  name_pattern: '{name_pattern}'\n",
            self.path().display()
        ))
    }

    /// Engine configuration rooted at this fixture.
    pub fn config(&self) -> EngineConfig {
        let mut config = EngineConfig {
            base_path: self.path().to_path_buf(),
            ..EngineConfig::default()
        };
        config.stacks.included_paths = vec![FIXTURE_INCLUDED_PATHS.to_string()];
        config.stacks.excluded_paths = vec![FIXTURE_EXCLUDED_PATHS.to_string()];
        config
    }
}
