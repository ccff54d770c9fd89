use ir::{Dependency, DependencyKind, GeneratedCode, GeneratedFile};
use merge::{merge_all, merge_code, merge_dependencies, MergeError, MergeStrategy};

fn code(files: &[(&str, &str)], dependencies: Vec<Dependency>) -> GeneratedCode {
    GeneratedCode {
        files: files.iter().map(|(p, c)| GeneratedFile::new(*p, *c)).collect(),
        dependencies,
        metadata: None,
    }
}

fn content<'a>(code: &'a GeneratedCode, path: &str) -> Option<&'a str> {
    code.file(path).map(|f| f.content.as_str())
}

#[test]
fn test_merge_with_empty_is_identity() {
    let a = code(
        &[("src/index.ts", "export {}"), ("package.json", "{}")],
        vec![Dependency::new("express", "^4.18.2"), Dependency::new("zod", "^3.22.0")],
    );

    for strategy in [MergeStrategy::LastWins, MergeStrategy::FirstWins, MergeStrategy::Error] {
        let right = merge_code(a.clone(), GeneratedCode::default(), strategy).expect("merge");
        assert_eq!(right, a, "{} with empty on the right", strategy);

        let left = merge_code(GeneratedCode::default(), a.clone(), strategy).expect("merge");
        assert_eq!(left, a, "{} with empty on the left", strategy);
    }
}

#[test]
fn test_last_wins_replaces_colliding_file() {
    let a = code(&[("index.ts", "A")], vec![]);
    let b = code(&[("index.ts", "B")], vec![]);

    let merged = merge_code(a, b, MergeStrategy::LastWins).expect("merge");
    assert_eq!(merged.files.len(), 1);
    assert_eq!(content(&merged, "index.ts"), Some("B"));
}

#[test]
fn test_first_wins_keeps_earlier_file() {
    let a = code(&[("index.ts", "A")], vec![]);
    let b = code(&[("index.ts", "B"), ("routes.ts", "R")], vec![]);

    let merged = merge_code(a, b, MergeStrategy::FirstWins).expect("merge");
    assert_eq!(content(&merged, "index.ts"), Some("A"));
    assert_eq!(content(&merged, "routes.ts"), Some("R"));
}

#[test]
fn test_error_strategy_names_conflicting_path() {
    let a = code(&[("index.ts", "A")], vec![]);
    let b = code(&[("index.ts", "B")], vec![]);

    let err = merge_code(a, b, MergeStrategy::Error).expect_err("conflict");
    assert_eq!(err, MergeError::FileConflict { path: "index.ts".to_string() });
    assert!(err.to_string().contains("index.ts"));
}

#[test]
fn test_higher_major_wins_and_keeps_operator() {
    let merged = merge_dependencies(
        vec![Dependency::new("lodash", "^3.0.0")],
        vec![Dependency::new("lodash", "^4.0.0")],
    );
    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].version, "^4.0.0");

    let reversed = merge_dependencies(
        vec![Dependency::new("lodash", "^4.0.0")],
        vec![Dependency::new("lodash", "^3.0.0")],
    );
    assert_eq!(reversed[0].version, "^4.0.0");
}

#[test]
fn test_operator_is_ignored_when_comparing() {
    let merged = merge_dependencies(
        vec![Dependency::new("express", "~4.18.2")],
        vec![Dependency::new("express", "^4.17.0")],
    );
    assert_eq!(merged[0].version, "~4.18.2");
}

#[test]
fn test_release_beats_prerelease_in_either_order() {
    let merged = merge_dependencies(
        vec![Dependency::new("pkg", "1.0.0-beta")],
        vec![Dependency::new("pkg", "1.0.0")],
    );
    assert_eq!(merged[0].version, "1.0.0");

    let merged = merge_dependencies(
        vec![Dependency::new("pkg", "1.0.0")],
        vec![Dependency::new("pkg", "1.0.0-beta")],
    );
    assert_eq!(merged[0].version, "1.0.0");
}

#[test]
fn test_caret_release_beats_dotted_prerelease() {
    let merged = merge_dependencies(
        vec![Dependency::new("next", "^1.0.0-beta.1")],
        vec![Dependency::new("next", "^1.0.0")],
    );
    assert_eq!(merged, vec![Dependency::new("next", "^1.0.0")]);

    let merged = merge_dependencies(
        vec![Dependency::new("next", "^1.0.0")],
        vec![Dependency::new("next", "^1.0.0-beta.1")],
    );
    assert_eq!(merged, vec![Dependency::new("next", "^1.0.0")]);
}

#[test]
fn test_equal_versions_keep_existing_entry() {
    let existing = Dependency::peer("zod", "^3.22.0");
    let merged = merge_dependencies(vec![existing.clone()], vec![Dependency::new("zod", "3.22.0")]);
    assert_eq!(merged, vec![existing]);
}

#[test]
fn test_runtime_flag_is_sticky() {
    let mut runtime = Dependency::new("typescript", "^5.0.0");
    runtime.dev = Some(false);
    let dev = Dependency::dev("typescript", "^5.3.0");

    let merged = merge_dependencies(vec![runtime.clone()], vec![dev.clone()]);
    assert_eq!(merged[0].version, "^5.3.0");
    assert_eq!(merged[0].dev, Some(false));
    assert!(!merged[0].is_dev());
    assert_ne!(merged[0].kind, Some(DependencyKind::DevDependencies));

    let merged = merge_dependencies(vec![dev], vec![runtime]);
    assert_eq!(merged[0].dev, Some(false));
}

#[test]
fn test_unset_dev_flag_does_not_override() {
    let dev = Dependency::dev("vitest", "^1.0.0");
    let plain = Dependency::new("vitest", "^0.34.0");

    let merged = merge_dependencies(vec![dev], vec![plain]);
    assert!(merged[0].is_dev());
}

#[test]
fn test_dependencies_keep_first_seen_order() {
    let merged = merge_dependencies(
        vec![Dependency::new("a", "1.0.0"), Dependency::new("b", "1.0.0")],
        vec![Dependency::new("c", "1.0.0"), Dependency::new("a", "2.0.0")],
    );
    let names: Vec<_> = merged.iter().map(|d| (d.name.as_str(), d.version.as_str())).collect();
    assert_eq!(names, vec![("a", "2.0.0"), ("b", "1.0.0"), ("c", "1.0.0")]);
}

#[test]
fn test_merge_all_folds_in_order() {
    let outputs = vec![
        code(&[("common.ts", "low")], vec![Dependency::new("zod", "^3.0.0")]),
        code(&[("common.ts", "mid"), ("mid.ts", "m")], vec![]),
        code(&[("common.ts", "high")], vec![Dependency::new("zod", "^3.22.0")]),
    ];

    let merged = merge_all(outputs, MergeStrategy::LastWins).expect("merge");
    assert_eq!(content(&merged, "common.ts"), Some("high"));
    assert_eq!(merged.paths(), vec!["common.ts", "mid.ts"]);
    assert_eq!(merged.dependency("zod").map(|d| d.version.as_str()), Some("^3.22.0"));
}
