//! Final component descriptions over the sample repository.

use stack_resolver::component::ComponentType;
use stack_resolver::core::StackError;
use stack_resolver::describe::{DescribeRequest, describe_component, resolve_component};
use stack_resolver::value::ConfigValue;

use crate::common::sample_repo;

fn terraform<'a>(component: &'a str, stack: &'a str) -> DescribeRequest<'a> {
    DescribeRequest {
        component,
        stack,
        component_type: ComponentType::Terraform,
        deployable: false,
    }
}

#[test]
fn test_inherited_and_overridden_vars() {
    let fixture = sample_repo().unwrap();
    let description = resolve_component(&fixture.config(), &terraform("vpc", "plat-ue2-dev")).unwrap();

    let vars = &description.record.vars;
    assert_eq!(vars["cidr"], ConfigValue::from("10.0.0.0/16"));
    assert_eq!(vars["nat_gateway_enabled"], ConfigValue::Bool(true));
    assert_eq!(vars["tenant"], ConfigValue::from("plat"));
    assert_eq!(vars["region"], ConfigValue::from("us-east-2"));
    assert_eq!(description.record.inheritance, vec!["vpc-defaults"]);

    let prod = resolve_component(&fixture.config(), &terraform("vpc", "plat-ue2-prod")).unwrap();
    assert_eq!(prod.record.vars["cidr"], ConfigValue::from("10.1.0.0/16"));
}

#[test]
fn test_null_env_is_unset() {
    let fixture = sample_repo().unwrap();
    let description = resolve_component(&fixture.config(), &terraform("vpc", "plat-ue2-dev")).unwrap();
    assert_eq!(description.record.env_list(), vec!["AWS_PROFILE=default"]);

    // prod does not unset TF_LOG
    let prod = resolve_component(&fixture.config(), &terraform("vpc", "plat-ue2-prod")).unwrap();
    assert_eq!(prod.record.env_list(), vec!["AWS_PROFILE=default", "TF_LOG=DEBUG"]);
}

#[test]
fn test_backend_from_type_level_section() {
    let fixture = sample_repo().unwrap();
    let description = resolve_component(&fixture.config(), &terraform("vpc", "plat-ue2-dev")).unwrap();

    assert_eq!(description.record.backend_type, "s3");
    assert_eq!(description.record.backend["bucket"], ConfigValue::from("plat-tfstate"));

    let core = resolve_component(&fixture.config(), &terraform("vpc", "core-ue2-dev")).unwrap();
    assert_eq!(core.record.backend_type, "");
    assert!(core.record.backend.is_empty());
}

#[test]
fn test_derived_names() {
    let fixture = sample_repo().unwrap();
    let config = fixture.config();

    let vpc = resolve_component(&config, &terraform("vpc", "plat-ue2-dev")).unwrap();
    assert_eq!(vpc.workspace, "plat-ue2-dev");
    assert_eq!(vpc.spacelift_stack.as_deref(), Some("plat-ue2-dev-vpc"));
    assert_eq!(vpc.atlantis_project, None);

    let blue = resolve_component(&config, &terraform("eks/blue", "plat-ue2-dev")).unwrap();
    assert_eq!(blue.workspace, "plat-ue2-dev-eks-blue");
    assert_eq!(blue.record.base_component, "eks/cluster");
    assert_eq!(blue.record.vars["node_count"], ConfigValue::Integer(3));
    assert!(blue.component_path.ends_with("components/terraform/eks/cluster"));
}

#[test]
fn test_helmfile_component() {
    let fixture = sample_repo().unwrap();
    let request = DescribeRequest {
        component_type: ComponentType::Helmfile,
        ..terraform("nginx", "plat-ue2-dev")
    };
    let map = describe_component(&fixture.config(), &request).unwrap();

    assert!(!map.contains_key("workspace"));
    assert_eq!(map["command"], ConfigValue::from("helmfile"));
    assert_eq!(
        map["component_info"].get("component_type"),
        Some(&ConfigValue::from("helmfile"))
    );
    assert_eq!(map["vars"].get("replicas"), Some(&ConfigValue::Integer(2)));
}

#[test]
fn test_dependencies() {
    let fixture = sample_repo().unwrap();
    let description = resolve_component(&fixture.config(), &terraform("vpc", "plat-ue2-dev")).unwrap();

    assert_eq!(
        description.dependencies.transitive,
        vec![
            "catalog/vpc",
            "mixins/region/us-east-2",
            "orgs/plat/_defaults",
            "orgs/plat/dev"
        ]
    );
    // catalog/eks only defines other components
    assert!(!description.dependencies.transitive.contains(&"catalog/eks".to_string()));

    let mut sorted = description.dependencies.direct.clone();
    sorted.sort();
    sorted.dedup();
    assert_eq!(description.dependencies.direct, sorted);
}

#[test]
fn test_resolution_is_idempotent() {
    let fixture = sample_repo().unwrap();
    let config = fixture.config();
    let request = terraform("vpc", "plat-ue2-dev");

    let render = || {
        ConfigValue::from(describe_component(&config, &request).unwrap())
            .to_yaml_string()
            .unwrap()
    };
    assert_eq!(render(), render());

    let first = resolve_component(&config, &request).unwrap();
    let second = resolve_component(&config, &request).unwrap();
    assert_eq!(first.record, second.record);
    assert_eq!(first.dependencies, second.dependencies);
}

#[test]
fn test_abstract_component_is_not_deployable() {
    let fixture = sample_repo().unwrap();
    let request = DescribeRequest {
        deployable: true,
        ..terraform("vpc-defaults", "plat-ue2-dev")
    };

    let err = resolve_component(&fixture.config(), &request).unwrap_err();
    assert!(matches!(err, StackError::Validation { .. }));
    assert!(err.to_string().contains("abstract"));
}
