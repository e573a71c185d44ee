//! Stack token matching over resolved manifests.

use stack_resolver::core::StackError;
use stack_resolver::stack::{find_stack, resolve_stacks};
use stack_resolver::test_utils::StackFixture;

use crate::common::{NAME_PATTERN, sample_repo};

/// Three roots rendering to `a-b-c`, `a-b-c` and `x-y-z`.
fn ambiguous_repo() -> StackFixture {
    let fixture = StackFixture::new().unwrap();
    fixture
        .write_manifest("catalog/vpc.yaml", "components: {terraform: {vpc: {vars: {}}}}\n")
        .unwrap();
    for (file, tenant, environment, stage) in [
        ("orgs/first.yaml", "a", "b", "c"),
        ("orgs/second.yaml", "a", "b", "c"),
        ("orgs/third.yaml", "x", "y", "z"),
    ] {
        fixture
            .write_manifest(
                file,
                &format!(
                    "import: [catalog/vpc]\nvars: {{tenant: {tenant}, environment: {environment}, stage: {stage}}}\n"
                ),
            )
            .unwrap();
    }
    fixture
}

#[test]
fn test_duplicate_identity_lists_every_file() {
    let fixture = ambiguous_repo();
    let resolved = resolve_stacks(&fixture.config(), Some("a-b-c")).unwrap();

    let err = find_stack(&resolved, "a-b-c", "terraform", "vpc", NAME_PATTERN).unwrap_err();
    assert!(err.is_fatal());
    let message = err.to_string();
    assert!(message.contains("orgs/first, orgs/second"), "{message}");
    assert!(!message.contains("orgs/third"));
}

#[test]
fn test_unmatched_token_is_not_found() {
    let fixture = ambiguous_repo();
    let resolved = resolve_stacks(&fixture.config(), Some("q-q-q")).unwrap();

    let err = find_stack(&resolved, "q-q-q", "terraform", "vpc", NAME_PATTERN).unwrap_err();
    assert!(matches!(err, StackError::NotFound { .. }));
    assert!(err.to_string().contains(NAME_PATTERN));
    assert!(err.to_string().contains("Did you forget an import?"));
}

#[test]
fn test_unique_identity_resolves() {
    let fixture = ambiguous_repo();
    let resolved = resolve_stacks(&fixture.config(), Some("x-y-z")).unwrap();

    let found = find_stack(&resolved, "x-y-z", "terraform", "vpc", NAME_PATTERN).unwrap();
    assert_eq!(found.stack_key, "orgs/third");
}

#[test]
fn test_manifest_path_token_uses_directory_mode() {
    let fixture = ambiguous_repo();
    let resolved = resolve_stacks(&fixture.config(), Some("orgs/second")).unwrap();

    let found = find_stack(&resolved, "orgs/second", "terraform", "vpc", NAME_PATTERN).unwrap();
    assert_eq!(found.stack_key, "orgs/second");
    assert_eq!(found.identity.tenant, "a");
}

#[test]
fn test_level_specific_errors_in_directory_mode() {
    let fixture = sample_repo().unwrap();
    let resolved = resolve_stacks(&fixture.config(), Some("orgs/plat/prod")).unwrap();

    let err = find_stack(&resolved, "orgs/plat/prod", "helmfile", "nginx", NAME_PATTERN)
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "'components/helmfile' section is missing in the stack file 'orgs/plat/prod'"
    );

    let err = find_stack(&resolved, "orgs/plat/prod", "terraform", "vpcc", NAME_PATTERN)
        .unwrap_err();
    match err {
        StackError::NotFound { message, suggestions } => {
            assert_eq!(
                message,
                "no config found for the component 'vpcc' in the stack file 'orgs/plat/prod'"
            );
            assert_eq!(suggestions, vec!["vpc"]);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_missing_vars_is_structure_error() {
    let fixture = StackFixture::new().unwrap();
    fixture
        .write_manifest("orgs/dev.yaml", "components:\n  terraform:\n    vpc:\n      settings: {}\n")
        .unwrap();
    let resolved = resolve_stacks(&fixture.config(), Some("orgs/dev")).unwrap();

    let err = find_stack(&resolved, "orgs/dev", "terraform", "vpc", NAME_PATTERN).unwrap_err();
    assert!(matches!(err, StackError::Structure { .. }));
    assert_eq!(
        err.to_string(),
        "missing 'vars' section for the component 'vpc' in the stack file 'orgs/dev'"
    );
}

#[test]
fn test_stack_missing_context_does_not_block_lookup() {
    let fixture = ambiguous_repo();
    fixture
        .write_manifest("orgs/legacy.yaml", "import: [catalog/vpc]\nvars: {environment: y, stage: z}\n")
        .unwrap();
    let resolved = resolve_stacks(&fixture.config(), Some("x-y-z")).unwrap();

    let found = find_stack(&resolved, "x-y-z", "terraform", "vpc", NAME_PATTERN).unwrap();
    assert_eq!(found.stack_key, "orgs/third");

    let err = find_stack(&resolved, "q-q-q", "terraform", "vpc", NAME_PATTERN).unwrap_err();
    assert!(matches!(err, StackError::NotFound { .. }));
    assert!(err.to_string().contains("orgs/legacy"));
}
