//! Test coverage advice for impacted modules
//!
//! Function names are found with a regex over `def` statements, not a parse,
//! so both test and ordinary functions are picked up. A function counts as
//! covered when it is itself a test (`test_` prefix) or when a test named
//! after it exists, either in the same module or in the module's guessed test
//! file if that file is part of the change set (`test_add` and
//! `test_add_negative` both cover `add`). Everything else gets a suggestion.
//! Source that does not parse as Python contributes no functions.

use crate::config::{ConfigError, CoverageSettings};
use crate::indexer::python::PythonExtractor;
use crate::indexer::test_detection::{
    DEFAULT_TEST_FILE_PREFIX, DEFAULT_TEST_NAME_PREFIX, guess_test_file, is_test_function,
};
use crate::model::{DependencyContext, FileMap, ImpactedModuleSet, TestSuggestionSet};
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::{debug, warn};

/// Captures the identifier after `def` (including `async def`). `\w` is
/// Unicode-aware, matching Python 3 identifiers.
pub const DEFAULT_FUNCTION_PATTERN: &str = r"\bdef\s+(\w+)";

pub const ALL_TESTED_NOTE: &str = "All major functions appear tested. Review manually if needed.";

static DEFAULT_FUNCTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(DEFAULT_FUNCTION_PATTERN).expect("valid regex"));

/// Finds candidate function names; capture group 1 is the name.
#[derive(Debug, Clone)]
pub struct FunctionScanner {
    pattern: Regex,
}

impl Default for FunctionScanner {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_FUNCTION_RE.clone(),
        }
    }
}

impl FunctionScanner {
    pub fn new(pattern: &str) -> Result<Self, ConfigError> {
        let pattern = Regex::new(pattern).map_err(|err| ConfigError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: err.to_string(),
        })?;
        if pattern.captures_len() < 2 {
            return Err(ConfigError::InvalidPattern {
                pattern: pattern.as_str().to_string(),
                reason: "needs a capture group for the function name".into(),
            });
        }
        Ok(Self { pattern })
    }

    pub fn as_str(&self) -> &str {
        self.pattern.as_str()
    }

    /// Candidate names in textual order, duplicates kept.
    pub fn scan<'a>(&self, source: &'a str) -> Vec<&'a str> {
        self.pattern
            .captures_iter(source)
            .filter_map(|caps| caps.get(1))
            .map(|name| name.as_str())
            .collect()
    }
}

/// Whether `test_name` is a test targeting `func`: `test_func` or `test_func_*`.
fn covers(test_name: &str, func: &str, prefix: &str) -> bool {
    test_name.strip_prefix(prefix).is_some_and(|target| {
        target == func
            || target
                .strip_prefix(func)
                .is_some_and(|rest| rest.starts_with('_'))
    })
}

#[derive(Debug, Clone)]
pub struct TestAdvisor {
    scanner: FunctionScanner,
    test_prefix: String,
    test_file_prefix: String,
}

impl Default for TestAdvisor {
    fn default() -> Self {
        Self::new(FunctionScanner::default(), DEFAULT_TEST_NAME_PREFIX)
    }
}

impl TestAdvisor {
    pub fn new(scanner: FunctionScanner, test_prefix: impl Into<String>) -> Self {
        Self {
            scanner,
            test_prefix: test_prefix.into(),
            test_file_prefix: DEFAULT_TEST_FILE_PREFIX.to_string(),
        }
    }

    pub fn with_test_file_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.test_file_prefix = prefix.into();
        self
    }

    pub fn from_settings(settings: &CoverageSettings) -> Result<Self, ConfigError> {
        Ok(Self::new(
            FunctionScanner::new(&settings.function_pattern)?,
            settings.test_name_prefix.clone(),
        )
        .with_test_file_prefix(settings.test_file_prefix.clone()))
    }

    /// Test function names found in `source`.
    pub fn test_functions<'a>(&self, source: &'a str) -> Vec<&'a str> {
        self.scanner
            .scan(source)
            .into_iter()
            .filter(|name| is_test_function(name, &self.test_prefix))
            .collect()
    }

    /// Functions in `source` with no covering test, first occurrence only.
    pub fn untested_functions<'a>(&self, source: &'a str) -> Vec<&'a str> {
        self.untested_with(source, &[])
    }

    /// Like `untested_functions`, also honouring tests found elsewhere.
    pub fn untested_with<'a>(&self, source: &'a str, known_tests: &[&str]) -> Vec<&'a str> {
        let names = self.scanner.scan(source);
        let tests: Vec<&str> = names
            .iter()
            .copied()
            .filter(|name| is_test_function(name, &self.test_prefix))
            .chain(known_tests.iter().copied())
            .collect();
        let mut seen = HashSet::new();
        names
            .into_iter()
            .filter(|name| !is_test_function(name, &self.test_prefix))
            .filter(|name| !tests.iter().any(|test| covers(test, name, &self.test_prefix)))
            // A redefined name is reported once, at its first `def`.
            .filter(|name| seen.insert(*name))
            .collect()
    }

    /// One entry per impacted path, never empty.
    pub fn suggest(&self, impacted: &ImpactedModuleSet, files: &FileMap) -> TestSuggestionSet {
        self.suggest_checked(impacted, files, &mut SyntaxCheck::new(None))
    }

    /// Like `suggest`, reusing the syntax verdicts recorded in `context` for
    /// paths it covers instead of parsing them again.
    pub fn suggest_with_context(
        &self,
        impacted: &ImpactedModuleSet,
        files: &FileMap,
        context: &DependencyContext,
    ) -> TestSuggestionSet {
        self.suggest_checked(impacted, files, &mut SyntaxCheck::new(Some(context)))
    }

    fn suggest_checked(
        &self,
        impacted: &ImpactedModuleSet,
        files: &FileMap,
        syntax: &mut SyntaxCheck<'_>,
    ) -> TestSuggestionSet {
        let mut suggestions = TestSuggestionSet::new();

        for path in impacted {
            let source = match files.get(path) {
                Some(source) => source.as_str(),
                None => {
                    debug!(path = %path, "no content for impacted module");
                    ""
                }
            };
            let untested = if syntax.well_formed(path, source) {
                let hinted = guess_test_file(path, &self.test_file_prefix);
                let known_tests = match files.get(&hinted) {
                    Some(test_source)
                        if hinted != *path && syntax.well_formed(&hinted, test_source) =>
                    {
                        self.test_functions(test_source)
                    }
                    _ => Vec::new(),
                };
                self.untested_with(source, &known_tests)
            } else {
                warn!(path = %path, "syntax error, skipping function scan");
                Vec::new()
            };

            let entries = if untested.is_empty() {
                vec![ALL_TESTED_NOTE.to_string()]
            } else {
                untested
                    .iter()
                    .map(|func| format!("Add test for `{func}` function in `{path}`"))
                    .collect()
            };
            debug!(path = %path, suggestions = entries.len(), "test advice ready");
            suggestions.insert(path.clone(), entries);
        }
        suggestions
    }
}

/// Well-formedness per path: taken from a built context when it knows the
/// path, otherwise parsed on demand with a lazily created extractor.
struct SyntaxCheck<'a> {
    known: Option<&'a DependencyContext>,
    extractor: Option<Option<PythonExtractor>>,
}

impl<'a> SyntaxCheck<'a> {
    fn new(known: Option<&'a DependencyContext>) -> Self {
        Self {
            known,
            extractor: None,
        }
    }

    fn well_formed(&mut self, path: &str, source: &str) -> bool {
        if let Some(context) = self.known.filter(|context| context.contains(path)) {
            return !context.is_malformed(path);
        }
        let extractor = self.extractor.get_or_insert_with(|| match PythonExtractor::new() {
            Ok(extractor) => Some(extractor),
            Err(err) => {
                warn!(error = %err, "python grammar unavailable, scanning without syntax check");
                None
            }
        });
        extractor
            .as_mut()
            .is_none_or(|extractor| extractor.is_well_formed(source))
    }
}

/// Advice with the default pattern and `test_` prefix.
pub fn suggest_tests(impacted: &ImpactedModuleSet, files: &FileMap) -> TestSuggestionSet {
    TestAdvisor::default().suggest(impacted, files)
}
