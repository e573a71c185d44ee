//! Final component descriptions.
//!
//! [`resolve_component`] runs a full resolution for one `(component, stack)` pair:
//! stacks are loaded and merged, the token is matched to a stack, and the derived
//! names and dependencies are computed. [`ComponentDescription::to_map`] renders
//! the result as the mapping handed to an external tool invoker.
//!
//! The output `component` key is the section's own `component` attribute, or the
//! requested name when it has none. `metadata.component` only moves the module
//! path reported in `component_info`.
//!
//! Every call resolves from disk again. Nothing is cached between calls.

use serde::Serialize;
use std::path::Path;
use tracing::debug;

use crate::component::{ComponentRecord, ComponentType};
use crate::config::{ComponentsConfig, EngineConfig, StacksConfig};
use crate::constants::{
    ATLANTIS_PROJECT_KEY, ATMOS_CLI_CONFIG_KEY, ATMOS_COMPONENT_KEY, ATMOS_STACK_FILE_KEY,
    ATMOS_STACK_KEY, COMMAND_SECTION, COMPONENT_INFO_KEY, COMPONENT_SECTION, COMPONENTS_SECTION,
    DEPS_ALL_KEY, DEPS_KEY, ENV_SECTION, IMPORTS_SECTION, SETTINGS_SECTION, SOURCES_KEY,
    SPACELIFT_STACK_KEY, VARS_SECTION, WORKSPACE_KEY,
};
use crate::context::{ContextIdentity, atlantis_project_name, derive_workspace, spacelift_stack_name};
use crate::core::{Result, StackError};
use crate::deps::{DependencySet, extract_dependencies, section_sources};
use crate::stack::{StackMatch, find_stack, resolve_stacks};
use crate::value::{ConfigMap, ConfigMapExt, ConfigValue};

/// What to describe.
#[derive(Debug, Clone, Copy)]
pub struct DescribeRequest<'a> {
    pub component: &'a str,
    pub stack: &'a str,
    pub component_type: ComponentType,
    /// Reject abstract components, as a provisioning command would.
    pub deployable: bool,
}

/// A component resolved in one stack, with everything derived from it.
#[derive(Debug, Clone)]
pub struct ComponentDescription {
    /// The stack token as requested.
    pub stack: String,
    /// Root manifest the stack token resolved to.
    pub stack_file: String,
    pub component_type: ComponentType,
    pub record: ComponentRecord,
    pub identity: ContextIdentity,
    /// Empty for component types without workspaces.
    pub workspace: String,
    pub spacelift_stack: Option<String>,
    pub atlantis_project: Option<String>,
    pub component_path: String,
    /// `<section> -> <key> -> contributing manifests`.
    pub sources: ConfigMap,
    pub dependencies: DependencySet,
}

#[derive(Serialize)]
struct CliConfigView<'a> {
    base_path: &'a Path,
    components: &'a ComponentsConfig,
    stacks: &'a StacksConfig,
}

/// Resolve one component in one stack.
///
/// # Errors
///
/// Every resolution error is returned as is. A [`StackError::Validation`] error is
/// added for abstract components when `request.deployable` is set.
pub fn resolve_component(
    config: &EngineConfig,
    request: &DescribeRequest<'_>,
) -> Result<ComponentDescription> {
    let component_type = request.component_type.as_str();
    let resolved = resolve_stacks(config, Some(request.stack))?;
    let name_pattern = config.stacks.name_pattern.as_str();

    let StackMatch {
        stack_key,
        record,
        mut identity,
    } = find_stack(&resolved, request.stack, component_type, request.component, name_pattern)?;
    debug!(
        "Component '{}' of the stack '{}' comes from '{}'",
        request.component, request.stack, stack_key
    );

    if request.deployable && record.is_abstract {
        return Err(StackError::validation(format!(
            "the component '{}' in the stack '{}' is abstract ('metadata.type: abstract') and cannot be provisioned",
            request.component, request.stack
        )));
    }

    let workspace = match request.component_type {
        ComponentType::Terraform => {
            derive_workspace(request.stack, name_pattern, &record.metadata, &identity)?
        }
        ComponentType::Helmfile => String::new(),
    };
    identity.workspace.clone_from(&workspace);

    let spacelift_stack =
        spacelift_stack_name(&record.settings, &identity, request.stack, name_pattern)?;
    let atlantis_project = atlantis_project_name(
        &record.settings,
        &identity,
        &config.integrations.atlantis.project_templates,
    );

    let base_path = config.base_path.to_string_lossy();
    let component_path = record
        .module_location()
        .module_path(&base_path, config.tool_base_path(request.component_type));

    let prefixes = resolved.source_prefixes(&stack_key, component_type, request.component);
    let mut sources = ConfigMap::new();
    if let Some(provenance) = resolved.provenance.get(&stack_key) {
        for section in [VARS_SECTION, SETTINGS_SECTION, ENV_SECTION] {
            sources.insert(
                section.to_string(),
                section_sources(provenance, prefixes, section).into(),
            );
        }
    }

    let provenance = resolved.component_provenance(&stack_key, component_type, request.component);
    let dependencies = extract_dependencies(&stack_key, &provenance);

    Ok(ComponentDescription {
        stack: request.stack.to_string(),
        stack_file: stack_key,
        component_type: request.component_type,
        record,
        identity,
        workspace,
        spacelift_stack,
        atlantis_project,
        component_path,
        sources,
        dependencies,
    })
}

impl ComponentDescription {
    /// Render as the final output mapping, without `strip_sections` applied.
    pub fn to_map(&self, config: &EngineConfig) -> Result<ConfigMap> {
        let mut map = self.record.section.clone();
        let record = &self.record;

        map.insert(VARS_SECTION.to_string(), record.vars.clone().into());
        map.insert(ENV_SECTION.to_string(), record.env.clone().into());
        if !self.workspace.is_empty() {
            map.insert(WORKSPACE_KEY.to_string(), self.workspace.as_str().into());
        }
        map.insert(IMPORTS_SECTION.to_string(), record.imports.clone().into());
        map.insert(ATMOS_COMPONENT_KEY.to_string(), record.component.as_str().into());
        map.insert(ATMOS_STACK_KEY.to_string(), self.stack.as_str().into());
        map.insert(ATMOS_STACK_FILE_KEY.to_string(), self.stack_file.as_str().into());
        map.insert(
            ATMOS_CLI_CONFIG_KEY.to_string(),
            ConfigValue::from_serialize(&CliConfigView {
                base_path: &config.base_path,
                components: &config.components,
                stacks: &config.stacks,
            })?,
        );

        let mut component = record.section.string_or_empty(COMPONENT_SECTION);
        if component.is_empty() {
            component.clone_from(&record.component);
        }
        map.insert(COMPONENT_SECTION.to_string(), component.into());
        let command = if record.command.is_empty() {
            self.component_type.as_str()
        } else {
            record.command.as_str()
        };
        map.insert(COMMAND_SECTION.to_string(), command.into());

        if let Some(name) = &self.spacelift_stack {
            map.insert(SPACELIFT_STACK_KEY.to_string(), name.as_str().into());
        }
        if let Some(name) = &self.atlantis_project {
            map.insert(ATLANTIS_PROJECT_KEY.to_string(), name.as_str().into());
        }

        let mut info = ConfigMap::new();
        info.insert("component_type".to_string(), self.component_type.as_str().into());
        info.insert("component_path".to_string(), self.component_path.as_str().into());
        map.insert(COMPONENT_INFO_KEY.to_string(), info.into());

        map.insert(SOURCES_KEY.to_string(), self.sources.clone().into());
        map.insert(DEPS_KEY.to_string(), self.dependencies.direct.clone().into());
        map.insert(DEPS_ALL_KEY.to_string(), self.dependencies.transitive.clone().into());

        Ok(map)
    }
}

/// Describe one component in one stack as the final output mapping.
pub fn describe_component(config: &EngineConfig, request: &DescribeRequest<'_>) -> Result<ConfigMap> {
    let description = resolve_component(config, request)?;
    let mut map = description.to_map(config)?;
    strip_sections(&mut map, &config.strip_sections);
    Ok(map)
}

/// Every resolved stack, keyed by root manifest.
///
/// `strip_sections` is applied to each component.
pub fn describe_stacks(config: &EngineConfig) -> Result<ConfigMap> {
    let mut resolved = resolve_stacks(config, None)?;
    if !config.strip_sections.is_empty() {
        for stack in resolved.stacks.values_mut() {
            let Some(types) = stack
                .as_mapping_mut()
                .and_then(|stack| stack.get_mut(COMPONENTS_SECTION))
                .and_then(ConfigValue::as_mapping_mut)
            else {
                continue;
            };
            for components in types.values_mut().filter_map(ConfigValue::as_mapping_mut) {
                for component in components.values_mut().filter_map(ConfigValue::as_mapping_mut) {
                    strip_sections(component, &config.strip_sections);
                }
            }
        }
    }
    Ok(resolved.stacks)
}

fn strip_sections(map: &mut ConfigMap, sections: &[String]) {
    for section in sections {
        map.remove(section);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::StackFixture;

    const CATALOG: &str = r"
components:
  terraform:
    vpc-defaults:
      metadata: {type: abstract}
      vars: {cidr: 10.0.0.0/16, nat: false}
    vpc:
      metadata: {inherits: [vpc-defaults]}
      vars: {nat: true}
      env: {TF_LOG: ~, AWS_PROFILE: dev}
    vpc-blue:
      component: vpc
      vars: {color: blue}
    vpc-green:
      metadata: {component: vpc}
      vars: {color: green}
";

    fn fixture() -> StackFixture {
        let fixture = StackFixture::new().unwrap();
        fixture.write_manifest("catalog/vpc.yaml", CATALOG).unwrap();
        fixture
            .write_manifest(
                "orgs/plat/_defaults.yaml",
                "vars: {tenant: plat, region: us-east-2}\n",
            )
            .unwrap();
        fixture
            .write_manifest(
                "orgs/plat/dev.yaml",
                "import: [orgs/plat/_defaults, catalog/vpc]\nvars: {environment: ue2, stage: dev}\n",
            )
            .unwrap();
        fixture
    }

    fn request<'a>(component: &'a str, stack: &'a str) -> DescribeRequest<'a> {
        DescribeRequest {
            component,
            stack,
            component_type: ComponentType::Terraform,
            deployable: false,
        }
    }

    #[test]
    fn test_describe_component_output() {
        let fixture = fixture();
        let map = describe_component(&fixture.config(), &request("vpc", "plat-ue2-dev")).unwrap();

        assert_eq!(map["workspace"], ConfigValue::from("plat-ue2-dev"));
        assert_eq!(map["atmos_stack"], ConfigValue::from("plat-ue2-dev"));
        assert_eq!(map["atmos_stack_file"], ConfigValue::from("orgs/plat/dev"));
        assert_eq!(map["component"], ConfigValue::from("vpc"));
        assert_eq!(map["command"], ConfigValue::from("terraform"));
        assert_eq!(map["vars"].get("nat"), Some(&ConfigValue::Bool(true)));
        assert_eq!(map["vars"].get("cidr"), Some(&ConfigValue::from("10.0.0.0/16")));
        assert_eq!(map["env"].as_mapping().map(ConfigMap::len), Some(1));
        assert_eq!(map["imports"].string_list(), vec!["catalog/vpc", "orgs/plat/_defaults"]);
        assert_eq!(
            map["deps_all"].string_list(),
            vec!["catalog/vpc", "orgs/plat/_defaults", "orgs/plat/dev"]
        );
        assert_eq!(
            map["sources"].get_path(&["vars", "tenant"]).map(ConfigValue::string_list),
            Some(vec!["orgs/plat/_defaults".to_string()])
        );
        assert_eq!(
            map["component_info"].get("component_path"),
            Some(&ConfigValue::from(
                format!("{}/components/terraform/vpc", fixture.path().display()).as_str()
            ))
        );
    }

    #[test]
    fn test_derived_component_workspace() {
        let fixture = fixture();
        let description =
            resolve_component(&fixture.config(), &request("vpc-blue", "plat-ue2-dev")).unwrap();
        assert_eq!(description.workspace, "plat-ue2-dev-vpc-blue");
        assert_eq!(description.record.base_component, "vpc");
        assert_eq!(description.record.vars.get("nat"), Some(&ConfigValue::Bool(true)));
    }

    #[test]
    fn test_component_key_keeps_section_attribute() {
        let fixture = fixture();
        let config = fixture.config();
        let module = format!("{}/components/terraform/vpc", fixture.path().display());

        let blue = describe_component(&config, &request("vpc-blue", "plat-ue2-dev")).unwrap();
        assert_eq!(blue["component"], ConfigValue::from("vpc"));

        let green = describe_component(&config, &request("vpc-green", "plat-ue2-dev")).unwrap();
        assert_eq!(green["component"], ConfigValue::from("vpc-green"));
        assert_eq!(
            green["component_info"].get("component_path"),
            Some(&ConfigValue::from(module.as_str()))
        );
    }

    #[test]
    fn test_abstract_component() {
        let fixture = fixture();
        let config = fixture.config();
        assert!(describe_component(&config, &request("vpc-defaults", "plat-ue2-dev")).is_ok());

        let deployable = DescribeRequest {
            deployable: true,
            ..request("vpc-defaults", "plat-ue2-dev")
        };
        let err = describe_component(&config, &deployable).unwrap_err();
        assert!(matches!(err, StackError::Validation { .. }));
    }

    #[test]
    fn test_strip_sections() {
        let fixture = fixture();
        let mut config = fixture.config();
        config.strip_sections = vec!["sources".to_string(), "atmos_cli_config".to_string()];

        let map = describe_component(&config, &request("vpc", "plat-ue2-dev")).unwrap();
        assert!(!map.contains_key("sources"));
        assert!(!map.contains_key("atmos_cli_config"));
        assert!(map.contains_key("deps"));
    }

    #[test]
    fn test_describe_is_idempotent() {
        let fixture = fixture();
        let config = fixture.config();
        let first = describe_component(&config, &request("vpc", "plat-ue2-dev")).unwrap();
        let second = describe_component(&config, &request("vpc", "plat-ue2-dev")).unwrap();
        assert_eq!(
            ConfigValue::from(first).to_yaml_string().unwrap(),
            ConfigValue::from(second).to_yaml_string().unwrap()
        );
    }

    #[test]
    fn test_describe_stacks() {
        let fixture = fixture();
        let stacks = describe_stacks(&fixture.config()).unwrap();
        let names: Vec<&String> = stacks.keys().collect();
        assert_eq!(names, vec!["orgs/plat/dev"]);
        assert!(stacks["orgs/plat/dev"].get_path(&["components", "terraform", "vpc-blue"]).is_some());
    }
}
