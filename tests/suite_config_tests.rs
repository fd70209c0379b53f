//! Conformance suite configuration resolution.

use std::path::Path;

use inkc::cli::suite::{SuiteLayout, TestSuiteConfig};

#[test]
fn suite_identity_is_fixed() {
    let config = TestSuiteConfig::new(Path::new("/proof"), SuiteLayout::BuildTree);
    assert_eq!(config.name, "Ink Proof");
    assert_eq!(config.suffixes, [".ink"]);
    assert_eq!(config.required_tools, ["FileCheck"]);
}

#[test]
fn build_tree_resolves_under_build_bin() {
    let config = TestSuiteConfig::new(Path::new("/home/ci/ink"), SuiteLayout::BuildTree);
    assert_eq!(
        config.source_root.as_deref(),
        Some(Path::new("/home/ci/ink"))
    );
    assert_eq!(config.exec_root, Path::new("/home/ci/ink/build/bin"));
}

#[test]
fn dist_resolves_under_dist_without_sources() {
    let config = TestSuiteConfig::new(Path::new("/opt/ink"), SuiteLayout::Dist);
    assert_eq!(config.source_root, None);
    assert_eq!(config.exec_root, Path::new("/opt/ink/dist"));
}

#[test]
fn timing_data_lives_in_the_exec_root() {
    for layout in [SuiteLayout::BuildTree, SuiteLayout::Dist] {
        let config = TestSuiteConfig::new(Path::new("/proof"), layout);
        assert_eq!(
            config.test_times_file.parent(),
            Some(config.exec_root.as_path())
        );
        assert_eq!(
            config.test_times_file.file_name().and_then(|n| n.to_str()),
            Some(".lit_test_times.txt")
        );
    }
}

#[test]
fn compiler_substitution_targets_the_exec_root_binary() {
    let config = TestSuiteConfig::new(Path::new("/proof"), SuiteLayout::BuildTree);
    let (token, replacement) = &config.substitutions[0];
    assert_eq!(token, "%ink-compiler");
    assert_eq!(replacement, &config.exec_root.join("inkc"));
}

#[test]
fn resolution_is_deterministic() {
    let a = TestSuiteConfig::new(Path::new("/proof"), SuiteLayout::BuildTree);
    let b = TestSuiteConfig::new(Path::new("/proof"), SuiteLayout::BuildTree);
    assert_eq!(a, b);
}
