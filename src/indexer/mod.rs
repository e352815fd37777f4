use crate::model::{DependencyContext, FileMap};
use tracing::{debug, warn};

pub mod python;
pub mod test_detection;

/// Builds the dependency context for a change set.
///
/// One parser is shared across the batch and each file is parsed once. A file
/// that fails to parse gets an empty import list and is recorded as malformed;
/// the others are unaffected.
pub struct ContextBuilder {
    test_file_prefix: String,
}

impl Default for ContextBuilder {
    fn default() -> Self {
        Self::new(test_detection::DEFAULT_TEST_FILE_PREFIX)
    }
}

impl ContextBuilder {
    pub fn new(test_file_prefix: impl Into<String>) -> Self {
        Self {
            test_file_prefix: test_file_prefix.into(),
        }
    }

    pub fn build(&self, files: &FileMap) -> DependencyContext {
        let mut context = DependencyContext::default();
        let mut extractor = match python::PythonExtractor::new() {
            Ok(extractor) => Some(extractor),
            Err(err) => {
                warn!(error = %err, "python grammar unavailable, imports left empty");
                None
            }
        };

        for (path, source) in files {
            let imports = match extractor.as_mut().map(|e| e.parse_imports(source)) {
                Some(Some(imports)) => imports,
                Some(None) => {
                    warn!(path = %path, "syntax error, no imports recorded");
                    context.malformed.insert(path.clone());
                    Vec::new()
                }
                None => Vec::new(),
            };
            debug!(path = %path, imports = imports.len(), "extracted imports");
            context.dependencies.insert(path.clone(), imports);
            context.test_coverage_hints.insert(
                path.clone(),
                vec![test_detection::guess_test_file(path, &self.test_file_prefix)],
            );
        }
        context
    }
}

/// Dependency context with the default test file prefix.
pub fn build_context(files: &FileMap) -> DependencyContext {
    ContextBuilder::default().build(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn files(entries: &[(&str, &str)]) -> FileMap {
        entries
            .iter()
            .map(|(path, source)| (path.to_string(), source.to_string()))
            .collect()
    }

    #[test]
    fn empty_input_gives_empty_context() {
        let context = build_context(&FileMap::new());
        assert!(context.dependencies.is_empty());
        assert!(context.test_coverage_hints.is_empty());
    }

    #[test]
    fn every_path_has_both_entries() {
        let input = files(&[
            ("billing/pay.py", "import os\ndef charge(): pass"),
            ("broken.py", "def (:"),
            ("empty.py", ""),
        ]);
        let context = build_context(&input);
        assert_eq!(context.len(), 3);
        for path in input.keys() {
            assert!(context.dependencies.contains_key(path));
            assert_eq!(context.test_coverage_hints[path].len(), 1);
        }
        assert_eq!(context.imports_of("billing/pay.py"), ["os"]);
        assert!(context.imports_of("broken.py").is_empty());
        assert!(context.is_malformed("broken.py"));
        assert!(!context.is_malformed("empty.py"));
        assert!(!context.is_malformed("billing/pay.py"));
        assert_eq!(
            context.test_coverage_hints["billing/pay.py"],
            vec!["tests/test_pay.py"]
        );
    }

    #[test]
    fn custom_prefix() {
        let context = ContextBuilder::new("spec/").build(&files(&[("a/b.py", "")]));
        assert_eq!(context.test_coverage_hints["a/b.py"], vec!["spec/b.py"]);
    }

    #[test]
    fn idempotent() {
        let input = files(&[
            ("a.py", "import b\nimport c\nimport b"),
            ("b.py", "from a import x"),
        ]);
        assert_eq!(build_context(&input), build_context(&input));
    }
}
