//! Import ordering, merge precedence and provenance across real manifests.

use stack_resolver::core::StackError;
use stack_resolver::merge::KeyPath;
use stack_resolver::stack::{StackMode, StackResolver, resolve_stacks};
use stack_resolver::test_utils::StackFixture;
use stack_resolver::value::ConfigValue;

use crate::common::sample_repo;

#[test]
fn test_importer_overrides_import_and_provenance_is_ordered() {
    let fixture = StackFixture::new().unwrap();
    fixture.write_manifest("catalog/a.yaml", "vars:\n  x: from-a\n").unwrap();
    fixture.write_manifest("orgs/b.yaml", "import: [catalog/a]\nvars:\n  x: from-b\n").unwrap();

    let resolved = resolve_stacks(&fixture.config(), None).unwrap();
    let stack = &resolved.stacks["orgs/b"];
    assert_eq!(stack.get_path(&["vars", "x"]), Some(&ConfigValue::from("from-b")));

    let provenance = &resolved.provenance["orgs/b"];
    assert_eq!(
        provenance.sources(&KeyPath::new(["vars", "x"])),
        Some(&["catalog/a".to_string(), "orgs/b".to_string()][..])
    );
}

#[test]
fn test_later_import_overrides_earlier() {
    let fixture = StackFixture::new().unwrap();
    fixture.write_manifest("mixins/one.yaml", "vars: {x: 1, y: 1}\n").unwrap();
    fixture.write_manifest("mixins/two.yaml", "vars: {x: 2}\n").unwrap();
    fixture
        .write_manifest("orgs/dev.yaml", "import: [mixins/two, mixins/one]\n")
        .unwrap();

    let resolved = resolve_stacks(&fixture.config(), None).unwrap();
    let vars = resolved.stacks["orgs/dev"].get("vars").unwrap();
    assert_eq!(vars.get("x"), Some(&ConfigValue::Integer(1)));
}

#[test]
fn test_diamond_import_winner_is_last_contributor() {
    let fixture = StackFixture::new().unwrap();
    fixture.write_manifest("catalog/shared.yaml", "vars: {x: shared}\n").unwrap();
    fixture
        .write_manifest("catalog/a.yaml", "import: [catalog/shared]\nvars: {x: a}\n")
        .unwrap();
    fixture.write_manifest("catalog/b.yaml", "import: [catalog/shared]\n").unwrap();
    fixture
        .write_manifest("orgs/dev.yaml", "import: [catalog/a, catalog/b]\n")
        .unwrap();

    let resolved = resolve_stacks(&fixture.config(), None).unwrap();
    let stack = &resolved.stacks["orgs/dev"];
    assert_eq!(stack.get_path(&["vars", "x"]), Some(&ConfigValue::from("shared")));

    let sources = resolved.provenance["orgs/dev"]
        .sources(&KeyPath::new(["vars", "x"]))
        .unwrap();
    assert_eq!(sources.first().map(String::as_str), Some("catalog/shared"));
    assert_eq!(sources.last().map(String::as_str), Some("catalog/shared"));
    assert!(sources.contains(&"catalog/a".to_string()));
}

#[test]
fn test_sequences_are_replaced_not_concatenated() {
    let fixture = sample_repo().unwrap();
    let resolved = resolve_stacks(&fixture.config(), None).unwrap();

    let zones = resolved.stacks["orgs/plat/dev"]
        .get_path(&["components", "terraform", "vpc", "vars", "availability_zones"])
        .unwrap();
    assert_eq!(zones.string_list(), vec!["a"]);
}

#[test]
fn test_every_root_resolved_in_logical_mode() {
    let fixture = sample_repo().unwrap();
    let resolved = resolve_stacks(&fixture.config(), Some("plat-ue2-dev")).unwrap();

    assert_eq!(resolved.mode, StackMode::Logical);
    let names: Vec<&str> = resolved.stack_names().collect();
    assert_eq!(names, vec!["orgs/core/dev", "orgs/plat/dev", "orgs/plat/prod"]);
}

#[test]
fn test_imports_are_transitive_and_sorted() {
    let fixture = sample_repo().unwrap();
    let resolved = resolve_stacks(&fixture.config(), Some("orgs/plat/prod")).unwrap();

    assert_eq!(resolved.mode, StackMode::Directory);
    assert_eq!(
        resolved.stacks["orgs/plat/prod"].get("imports").unwrap().string_list(),
        vec!["catalog/vpc", "mixins/region/us-east-2", "orgs/plat/_defaults"]
    );
}

#[test]
fn test_missing_import_fails_unless_tolerated() {
    let fixture = StackFixture::new().unwrap();
    fixture
        .write_manifest("orgs/dev.yaml", "import: [catalog/gone]\nvars: {stage: dev}\n")
        .unwrap();
    let mut config = fixture.config();

    let err = resolve_stacks(&config, None).unwrap_err();
    assert!(matches!(err, StackError::ImportResolution { .. }));

    config.ignore_missing_files = true;
    let resolved = resolve_stacks(&config, None).unwrap();
    let provenance = &resolved.provenance["orgs/dev"];
    assert!(provenance.iter().all(|(_, files)| files == ["orgs/dev".to_string()]));
}

#[test]
fn test_malformed_manifest_is_merge_error() {
    let fixture = StackFixture::new().unwrap();
    fixture.write_manifest("orgs/dev.yaml", "vars: [unclosed\n").unwrap();

    let err = resolve_stacks(&fixture.config(), None).unwrap_err();
    assert!(matches!(err, StackError::Merge { .. }), "{err:?}");
}

#[test]
fn test_excluded_manifests_are_not_roots() {
    let fixture = sample_repo().unwrap();
    let roots: Vec<String> = StackResolver::from_config(&fixture.config())
        .unwrap()
        .discover()
        .unwrap()
        .into_iter()
        .map(|(id, _)| id)
        .collect();
    assert!(!roots.iter().any(|id| id.contains("_defaults")));
    assert!(!roots.iter().any(|id| id.starts_with("catalog")));
}
