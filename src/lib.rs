//! stack-resolver - layered stack configuration resolution
//!
//! Resolves infrastructure "stack" manifests (YAML documents describing tenants,
//! environments, stages and the Terraform or Helmfile components deployed into
//! them) into one merged, provenance-tracked configuration per
//! `(stack, component)` pair.
//!
//! # Architecture Overview
//!
//! Data flows leaf-first through the modules:
//!
//! 1. [`manifest`] discovers root manifests and resolves `import:` directives into
//!    an ordered document list per stack
//! 2. [`merge`] deep-merges the documents, recording which file set every key
//! 3. [`stack`] processes component inheritance and matches a stack token to
//!    exactly one stack
//! 4. [`component`] extracts a component's sections and classifies it
//! 5. [`context`] renders stack names, workspaces and remote execution names
//! 6. [`deps`] turns provenance into sorted dependency lists
//! 7. [`describe`] assembles the final description handed to a tool invoker
//!
//! # Manifest Format
//!
//! ```yaml
//! import:
//!   - orgs/plat/_defaults
//!   - catalog/vpc
//!
//! vars:
//!   environment: ue2
//!   stage: dev
//!
//! terraform:
//!   backend_type: s3
//!   backend:
//!     s3:
//!       bucket: tfstate
//!
//! components:
//!   terraform:
//!     vpc:
//!       metadata:
//!         inherits: [vpc-defaults]
//!       vars:
//!         cidr: 10.0.0.0/16
//!       env:
//!         TF_LOG: null   # unset
//! ```
//!
//! # Merge Policy
//!
//! Mappings merge recursively; scalars and sequences are replaced wholly. Later
//! documents win, and the importing manifest wins over everything it imports.
//!
//! # Example
//!
//! ```rust,no_run
//! use stack_resolver::component::ComponentType;
//! use stack_resolver::config::EngineConfig;
//! use stack_resolver::describe::{DescribeRequest, describe_component};
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = EngineConfig::load(std::path::Path::new("stackres.yaml"))?;
//! let description = describe_component(
//!     &config,
//!     &DescribeRequest {
//!         component: "vpc",
//!         stack: "plat-ue2-dev",
//!         component_type: ComponentType::Terraform,
//!         deployable: false,
//!     },
//! )?;
//! println!("{:?}", description.get("workspace"));
//! # Ok(())
//! # }
//! ```
//!
//! The engine performs no network I/O and never runs external processes. File
//! system access is read-only.

pub mod cli;
pub mod component;
pub mod config;
pub mod constants;
pub mod context;
pub mod core;
pub mod deps;
pub mod describe;
pub mod manifest;
pub mod merge;
pub mod stack;
pub mod value;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
