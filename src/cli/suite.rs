//! Conformance test-suite configuration.
//!
//! The Ink conformance corpus is driven by an external lit-style harness.
//! This module computes the suite parameters that harness needs for a given
//! checkout or installed distribution. Resolution is pure path arithmetic:
//! nothing here touches the filesystem.

use std::path::{Path, PathBuf};

/// Display name of the conformance suite.
pub const SUITE_NAME: &str = "Ink Proof";
/// File extension that marks a test case.
pub const TEST_SUFFIX: &str = ".ink";
/// External tool the suite cannot run without.
pub const REQUIRED_TOOL: &str = "FileCheck";
/// Per-test timing data, kept beside the executables.
pub const TEST_TIMES_FILE: &str = ".lit_test_times.txt";
/// Substitution token test scripts use to invoke the compiler under test.
pub const COMPILER_SUBSTITUTION: &str = "%ink-compiler";

const COMPILER_BIN: &str = "inkc";

/// Where the suite's executables live relative to the configuration
/// directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuiteLayout {
    /// A source checkout: binaries under `build/bin`, test sources beside
    /// the configuration file.
    BuildTree,
    /// An installed distribution: binaries under `dist`, no source tree.
    Dist,
}

/// Resolved parameters for one run of the conformance suite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestSuiteConfig {
    pub name: String,
    pub suffixes: Vec<String>,
    pub required_tools: Vec<String>,
    /// Root of the test sources; absent for distributions, which carry no
    /// sources of their own.
    pub source_root: Option<PathBuf>,
    pub exec_root: PathBuf,
    pub test_times_file: PathBuf,
    /// `(token, replacement)` pairs applied to test scripts.
    pub substitutions: Vec<(String, PathBuf)>,
}

impl TestSuiteConfig {
    /// Resolve the suite configuration for one configuration directory.
    ///
    /// Resolution is deterministic: the same directory and layout always
    /// yield an identical configuration.
    pub fn new(config_dir: &Path, layout: SuiteLayout) -> Self {
        let (source_root, exec_root) = match layout {
            SuiteLayout::BuildTree => (
                Some(config_dir.to_path_buf()),
                config_dir.join("build").join("bin"),
            ),
            SuiteLayout::Dist => (None, config_dir.join("dist")),
        };
        let test_times_file = exec_root.join(TEST_TIMES_FILE);
        let substitutions = vec![(
            COMPILER_SUBSTITUTION.to_string(),
            exec_root.join(COMPILER_BIN),
        )];
        Self {
            name: SUITE_NAME.to_string(),
            suffixes: vec![TEST_SUFFIX.to_string()],
            required_tools: vec![REQUIRED_TOOL.to_string()],
            source_root,
            exec_root,
            test_times_file,
            substitutions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_tree_layout_points_into_the_checkout() {
        let config = TestSuiteConfig::new(Path::new("/proof"), SuiteLayout::BuildTree);
        assert_eq!(config.source_root.as_deref(), Some(Path::new("/proof")));
        assert_eq!(config.exec_root, Path::new("/proof/build/bin"));
    }

    #[test]
    fn dist_layout_has_no_source_root() {
        let config = TestSuiteConfig::new(Path::new("/opt/ink"), SuiteLayout::Dist);
        assert_eq!(config.source_root, None);
        assert_eq!(config.exec_root, Path::new("/opt/ink/dist"));
    }

    #[test]
    fn test_times_live_beside_the_executables() {
        let config = TestSuiteConfig::new(Path::new("/proof"), SuiteLayout::BuildTree);
        assert_eq!(config.test_times_file.parent(), Some(config.exec_root.as_path()));
    }
}
