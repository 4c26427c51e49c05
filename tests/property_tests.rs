//! Property-based tests for use-pkg-version
//!
//! These use proptest to check the update engine's invariants over generated
//! file contents, versions and templates.

use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

use use_pkg_version::{Outcome, UpdateError, UpdateRequest, update_version};

// Import proptest macro
use proptest::prelude::*;

/// Writes `content` to `test.file` and a manifest with `version`.
fn setup(content: &str, version: &str) -> (TempDir, PathBuf, UpdateRequest) {
    let temp_dir = TempDir::new().unwrap();
    let file_path = temp_dir.path().join("test.file");
    let package_path = temp_dir.path().join("package.json");
    fs::write(&file_path, content).unwrap();
    fs::write(&package_path, format!("{{\"version\": \"{}\"}}", version)).unwrap();

    let request = UpdateRequest {
        update_file: Some(file_path.clone()),
        package_file: Some(package_path),
        search_for: Some(r"v[0-9]+\.[0-9]+\.[0-9]+".to_string()),
        replace_with: Some("v{{version}}".to_string()),
        quiet: true,
        ..Default::default()
    };

    (temp_dir, file_path, request)
}

fn version_strategy() -> impl Strategy<Value = String> {
    (0u32..100, 0u32..100, 0u32..1000).prop_map(|(a, b, c)| format!("{}.{}.{}", a, b, c))
}

// ============================================================================
// Property 1: Dry run never writes
// ============================================================================

proptest! {
    #[test]
    fn prop_dry_run_never_mutates(
        prefix in "[a-z \n]{0,40}",
        old_version in version_strategy(),
        new_version in version_strategy(),
        suffix in "[a-z \n]{0,40}",
    ) {
        let content = format!("{}v{}{}", prefix, old_version, suffix);
        let (_dir, file_path, mut request) = setup(&content, &new_version);
        request.dry_run = true;

        let outcome = update_version(&request).unwrap();

        prop_assert!(outcome.is_dry_run());
        prop_assert_eq!(outcome, Outcome::DryRunWouldUpdate { replacements: 1 });
        prop_assert_eq!(fs::read_to_string(&file_path).unwrap(), content);
    }
}

// ============================================================================
// Property 2: No match means no change
// ============================================================================

proptest! {
    #[test]
    fn prop_no_match_leaves_content_unchanged(
        text in "[a-z \n]{0,200}",
        version in version_strategy(),
    ) {
        let (_dir, file_path, request) = setup(&text, &version);

        let outcome = update_version(&request).unwrap();

        prop_assert_eq!(outcome, Outcome::NoMatch);
        prop_assert_eq!(fs::read_to_string(&file_path).unwrap(), text);
    }
}

// ============================================================================
// Property 3: Running twice gives the same bytes as running once
// ============================================================================

proptest! {
    #[test]
    fn prop_second_run_is_idempotent(
        parts in prop::collection::vec(("[a-z ]{0,10}", version_strategy()), 1..8),
        new_version in version_strategy(),
    ) {
        let content: String = parts
            .iter()
            .map(|(text, version)| format!("{}v{}\n", text, version))
            .collect();
        let (_dir, file_path, request) = setup(&content, &new_version);

        let first = update_version(&request).unwrap();
        let after_first = fs::read_to_string(&file_path).unwrap();
        let second = update_version(&request).unwrap();
        let after_second = fs::read_to_string(&file_path).unwrap();

        prop_assert_eq!(first, Outcome::Updated { replacements: parts.len() });
        prop_assert_eq!(second, first);
        prop_assert_eq!(&after_first, &after_second);
        let expected = format!("v{}", new_version);
        prop_assert_eq!(after_first.matches(expected.as_str()).count(), parts.len());
    }
}

// ============================================================================
// Property 4: A template without the placeholder is always rejected
// ============================================================================

proptest! {
    #[test]
    fn prop_missing_placeholder_always_rejected(
        template in "[a-z0-9 .]{1,30}",
        pattern in prop_oneof![Just("v[0-9.]+".to_string()), Just("(unclosed".to_string()), "[a-z]{1,5}"],
    ) {
        let (_dir, file_path, mut request) = setup("v1.0.0", "2.0.0");
        request.search_for = Some(pattern.clone());
        request.replace_with = Some(template);

        let err = update_version(&request).unwrap_err();

        if pattern == "(unclosed" {
            prop_assert!(matches!(err, UpdateError::InvalidSearchPattern(_)));
        } else {
            prop_assert!(
                matches!(&err, UpdateError::PlaceholderMissing { placeholder } if placeholder == "{{version}}"),
                "unexpected error: {}",
                err
            );
        }
        prop_assert_eq!(fs::read_to_string(&file_path).unwrap(), "v1.0.0");
    }
}
