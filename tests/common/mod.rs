//! Common test utilities and fixtures for stack-resolver integration tests

// Not every test module uses every helper
#![allow(dead_code)]

use anyhow::Result;
use assert_cmd::Command;
use stack_resolver::test_utils::StackFixture;

pub const NAME_PATTERN: &str = "{tenant}-{environment}-{stage}";

/// A small organization: two tenants' stacks sharing a catalog and mixins.
///
/// Roots: `orgs/plat/dev`, `orgs/plat/prod`, `orgs/core/dev`.
pub fn sample_repo() -> Result<StackFixture> {
    let fixture = StackFixture::new()?;

    fixture.write_manifest(
        "catalog/vpc.yaml",
        r"
components:
  terraform:
    vpc-defaults:
      metadata:
        type: abstract
      vars:
        cidr: 10.0.0.0/16
        nat_gateway_enabled: false
        availability_zones: [a, b, c]
      settings:
        spacelift:
          workspace_enabled: true
    vpc:
      metadata:
        inherits: [vpc-defaults]
      vars:
        nat_gateway_enabled: true
      env:
        TF_LOG: DEBUG
        AWS_PROFILE: default
",
    )?;
    fixture.write_manifest(
        "catalog/eks.yaml",
        r"
components:
  terraform:
    eks/cluster:
      vars:
        node_count: 3
    eks/blue:
      component: eks/cluster
      vars:
        color: blue
  helmfile:
    nginx:
      vars:
        replicas: 2
",
    )?;
    fixture.write_manifest(
        "mixins/region/us-east-2.yaml",
        "vars:\n  region: us-east-2\n  environment: ue2\n",
    )?;
    fixture.write_manifest(
        "orgs/plat/_defaults.yaml",
        r"
import:
  - mixins/region/us-east-2
vars:
  tenant: plat
terraform:
  backend_type: s3
  backend:
    s3:
      bucket: plat-tfstate
      encrypt: true
",
    )?;
    fixture.write_manifest(
        "orgs/plat/dev.yaml",
        r"
import:
  - orgs/plat/_defaults
  - catalog/vpc
  - catalog/eks
vars:
  stage: dev
components:
  terraform:
    vpc:
      vars:
        availability_zones: [a]
      env:
        TF_LOG: null
",
    )?;
    fixture.write_manifest(
        "orgs/plat/prod.yaml",
        r"
import:
  - orgs/plat/_defaults
  - catalog/vpc
vars:
  stage: prod
components:
  terraform:
    vpc:
      vars:
        cidr: 10.1.0.0/16
",
    )?;
    fixture.write_manifest(
        "orgs/core/dev.yaml",
        r"
import:
  - mixins/region/us-east-2
  - catalog/vpc
vars:
  tenant: core
  stage: dev
",
    )?;

    Ok(fixture)
}

/// The `stackres` binary, run from the fixture root with its config written.
pub fn stackres(fixture: &StackFixture) -> Result<Command> {
    fixture.write_default_config(NAME_PATTERN)?;
    let mut cmd = Command::cargo_bin("stackres")?;
    cmd.current_dir(fixture.path())
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1");
    Ok(cmd)
}
