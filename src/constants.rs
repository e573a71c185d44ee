//! Section names and defaults shared across the engine.
//!
//! Stack manifests are loosely structured YAML, so every recognized key is
//! defined once here instead of as string literals scattered through the code.

/// Top-level key listing the manifests a manifest imports.
pub const IMPORT_SECTION: &str = "import";
/// Key under which the resolved, transitive import list is published.
pub const IMPORTS_SECTION: &str = "imports";
pub const COMPONENTS_SECTION: &str = "components";
pub const VARS_SECTION: &str = "vars";
pub const SETTINGS_SECTION: &str = "settings";
pub const ENV_SECTION: &str = "env";
pub const OVERRIDES_SECTION: &str = "overrides";
pub const BACKEND_SECTION: &str = "backend";
pub const BACKEND_TYPE_SECTION: &str = "backend_type";
pub const COMMAND_SECTION: &str = "command";
pub const METADATA_SECTION: &str = "metadata";
pub const INHERITANCE_SECTION: &str = "inheritance";
/// Base component reference, at component level or under `metadata`.
pub const COMPONENT_SECTION: &str = "component";
/// Multiple-inheritance list under `metadata`.
pub const INHERITS_SECTION: &str = "inherits";

/// `metadata.type` value marking a template-only component.
pub const ABSTRACT_COMPONENT_TYPE: &str = "abstract";
/// `metadata` key holding an explicit workspace name.
pub const WORKSPACE_OVERRIDE_KEY: &str = "terraform_workspace";
/// `metadata` key holding a workspace name pattern.
pub const WORKSPACE_PATTERN_KEY: &str = "terraform_workspace_pattern";

/// Keys added to the final component description.
pub const WORKSPACE_KEY: &str = "workspace";
pub const ATMOS_COMPONENT_KEY: &str = "atmos_component";
pub const ATMOS_STACK_KEY: &str = "atmos_stack";
pub const ATMOS_STACK_FILE_KEY: &str = "atmos_stack_file";
pub const ATMOS_CLI_CONFIG_KEY: &str = "atmos_cli_config";
pub const SPACELIFT_STACK_KEY: &str = "spacelift_stack";
pub const ATLANTIS_PROJECT_KEY: &str = "atlantis_project";
pub const COMPONENT_INFO_KEY: &str = "component_info";
pub const SOURCES_KEY: &str = "sources";
pub const DEPS_KEY: &str = "deps";
pub const DEPS_ALL_KEY: &str = "deps_all";

/// Default stack name pattern.
pub const DEFAULT_NAME_PATTERN: &str = "{tenant}-{environment}-{stage}";
/// Delimiter between stack name pattern segments.
pub const NAME_PATTERN_DELIMITER: char = '-';
/// Default glob selecting stack manifests under the stacks base path.
pub const DEFAULT_INCLUDED_PATH: &str = "**/*";
pub const DEFAULT_STACKS_BASE_PATH: &str = "stacks";
pub const DEFAULT_TERRAFORM_BASE_PATH: &str = "components/terraform";
pub const DEFAULT_HELMFILE_BASE_PATH: &str = "components/helmfile";
/// Configuration file picked up from the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "stackres.yaml";

/// Manifest file extensions, in lookup order.
pub const MANIFEST_EXTENSIONS: [&str; 2] = ["yaml", "yml"];
