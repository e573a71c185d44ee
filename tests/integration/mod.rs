//! Integration test suite for stack-resolver
//!
//! End-to-end tests over manifests written to temporary directories.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **resolve**: import ordering, merge precedence and provenance
//! - **locate**: stack token matching in directory and logical mode
//! - **describe**: final component descriptions, derived names and dependencies
//! - **cli**: the `stackres` binary

// Shared test utilities (from parent tests/ directory)
#[path = "../common/mod.rs"]
mod common;

mod cli;
mod describe;
mod locate;
mod resolve;
