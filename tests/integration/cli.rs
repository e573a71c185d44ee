//! The `stackres` binary.

use predicates::prelude::*;

use crate::common::{sample_repo, stackres};

#[test]
fn test_describe_component_yaml() {
    let fixture = sample_repo().unwrap();
    let mut cmd = stackres(&fixture).unwrap();
    cmd.args(["describe", "component", "vpc", "-s", "plat-ue2-dev"]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("workspace: plat-ue2-dev"))
        .stdout(predicate::str::contains("atmos_stack_file: orgs/plat/dev"))
        .stdout(predicate::str::contains("spacelift_stack: plat-ue2-dev-vpc"))
        .stdout(predicate::str::contains("AWS_PROFILE: default"));
}

#[test]
fn test_describe_component_json() {
    let fixture = sample_repo().unwrap();
    let mut cmd = stackres(&fixture).unwrap();
    cmd.args(["describe", "component", "nginx", "-s", "orgs/plat/dev"])
        .args(["--type", "helmfile", "--format", "json"]);

    let output = cmd.assert().success().get_output().stdout.clone();
    let json: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(json["command"], "helmfile");
    assert_eq!(json["vars"]["replicas"], 2);
    assert_eq!(json["atmos_stack"], "orgs/plat/dev");
    assert!(json.get("workspace").is_none());
}

#[test]
fn test_describe_stacks() {
    let fixture = sample_repo().unwrap();
    let mut cmd = stackres(&fixture).unwrap();
    cmd.args(["describe", "stacks"]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("orgs/core/dev:"))
        .stdout(predicate::str::contains("orgs/plat/prod:"))
        .stdout(predicate::str::contains("catalog/vpc:").not());
}

#[test]
fn test_validate_component() {
    let fixture = sample_repo().unwrap();
    let mut cmd = stackres(&fixture).unwrap();
    cmd.args(["validate", "component", "vpc", "-s", "plat-ue2-prod"]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("component validated successfully"));
}

#[test]
fn test_validate_component_json_report() {
    let fixture = sample_repo().unwrap();
    let mut cmd = stackres(&fixture).unwrap();
    cmd.args(["validate", "component", "eks/blue", "-s", "plat-ue2-dev", "--format", "json"]);

    let output = cmd.assert().success().get_output().stdout.clone();
    let report: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(report["valid"], true);
    assert_eq!(report["stack_file"], "orgs/plat/dev");
    assert_eq!(report["workspace"], "plat-ue2-dev-eks-blue");
}

#[test]
fn test_validate_abstract_component_fails() {
    let fixture = sample_repo().unwrap();
    let mut cmd = stackres(&fixture).unwrap();
    cmd.args(["validate", "component", "vpc-defaults", "-s", "plat-ue2-dev"]);

    cmd.assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("abstract"))
        .stderr(predicate::str::contains("suggestion"));
}

#[test]
fn test_unknown_stack_fails() {
    let fixture = sample_repo().unwrap();
    let mut cmd = stackres(&fixture).unwrap();
    cmd.args(["describe", "component", "vpc", "-s", "plat-ue2-qa"]);

    cmd.assert()
        .failure()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("error"))
        .stderr(predicate::str::contains("plat-ue2-qa"));
}

#[test]
fn test_duplicate_stack_identity_fails() {
    let fixture = sample_repo().unwrap();
    // Renders to plat-ue2-dev as well
    fixture
        .write_manifest(
            "orgs/plat/dev-copy.yaml",
            "import: [orgs/plat/_defaults, catalog/vpc]\nvars: {stage: dev}\n",
        )
        .unwrap();
    let mut cmd = stackres(&fixture).unwrap();
    cmd.args(["describe", "component", "vpc", "-s", "plat-ue2-dev"]);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("orgs/plat/dev"))
        .stderr(predicate::str::contains("orgs/plat/dev-copy"));
}

#[test]
fn test_missing_config_file_fails() {
    let fixture = sample_repo().unwrap();
    let mut cmd = stackres(&fixture).unwrap();
    cmd.args(["--config", "missing.yaml", "describe", "stacks"]);

    cmd.assert().failure().stderr(predicate::str::contains("missing.yaml"));
}

#[test]
fn test_verbose_and_quiet_conflict() {
    let fixture = sample_repo().unwrap();
    let mut cmd = stackres(&fixture).unwrap();
    cmd.args(["--verbose", "--quiet", "describe", "stacks"]);

    cmd.assert().failure().code(2);
}
