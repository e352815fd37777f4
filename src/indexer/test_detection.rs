//! Test file and test function naming conventions
//!
//! Everything here is name-based guessing. Nothing checks that a guessed test
//! file exists in the repository.

/// Default location guess for a module's test file.
pub const DEFAULT_TEST_FILE_PREFIX: &str = "tests/test_";

/// Default pytest-style test function prefix.
pub const DEFAULT_TEST_NAME_PREFIX: &str = "test_";

/// Final path segment after the last `/` or `\`.
pub fn base_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// Guess a test file for `path`: `prefix` + base file name.
///
/// - `billing/pay.py` -> `tests/test_pay.py`
/// - `main.py` -> `tests/test_main.py`
pub fn guess_test_file(path: &str, prefix: &str) -> String {
    format!("{prefix}{}", base_name(path))
}

/// Whether a function name follows the test naming convention.
pub fn is_test_function(name: &str, prefix: &str) -> bool {
    name.starts_with(prefix)
}

/// Whether a path looks like a Python test module.
pub fn is_test_file(path: &str) -> bool {
    let path_lower = path.to_lowercase().replace('\\', "/");
    let name = base_name(&path_lower);
    path_lower.starts_with("tests/")
        || path_lower.starts_with("test/")
        || path_lower.contains("/tests/")
        || path_lower.contains("/test/")
        || name.starts_with("test_")
        || name.ends_with("_test.py")
        || name == "conftest.py"
}
