use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Changed file contents keyed by repo-relative path.
pub type FileMap = BTreeMap<String, String>;

/// Suggestions per impacted module, in module path order.
pub type TestSuggestionSet = BTreeMap<String, Vec<String>>;

/// Per-file imports and guessed test files for one change set.
///
/// Both maps always carry exactly the keys of the input file map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DependencyContext {
    pub dependencies: BTreeMap<String, Vec<String>>,
    #[serde(rename = "test_coverage")]
    pub test_coverage_hints: BTreeMap<String, Vec<String>>,
    /// Paths whose source is not valid Python; kept out of the serialized form.
    #[serde(skip)]
    pub malformed: BTreeSet<String>,
}

impl DependencyContext {
    pub fn imports_of(&self, path: &str) -> &[String] {
        self.dependencies
            .get(path)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn contains(&self, path: &str) -> bool {
        self.dependencies.contains_key(path)
    }

    pub fn is_malformed(&self, path: &str) -> bool {
        self.malformed.contains(path)
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.dependencies.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.dependencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty()
    }
}

/// Ordered, duplicate-free list of impacted module paths.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct ImpactedModuleSet(Vec<String>);

impl ImpactedModuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `path` unless already present. Returns whether it was added.
    pub fn insert(&mut self, path: impl Into<String>) -> bool {
        let path = path.into();
        if self.0.contains(&path) {
            return false;
        }
        self.0.push(path);
        true
    }

    pub fn contains(&self, path: &str) -> bool {
        self.0.iter().any(|entry| entry == path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

impl<S: Into<String>> FromIterator<S> for ImpactedModuleSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = ImpactedModuleSet::new();
        for path in iter {
            set.insert(path);
        }
        set
    }
}

impl<'a> IntoIterator for &'a ImpactedModuleSet {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RiskReport {
    pub score: u32,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// Externally maintained notes about one module, as kept in a `context.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ModuleNotes {
    /// Modules known to be affected when this one changes.
    #[serde(default)]
    pub related_modules: Vec<String>,
    /// Free-form coverage level ("low", "medium", "high", ...).
    #[serde(default)]
    pub test_coverage: Option<String>,
}

/// Module notes keyed by repo-relative path.
pub type ModuleLookup = BTreeMap<String, ModuleNotes>;

/// Coverage level reported for impacted paths the lookup says nothing about.
pub const UNKNOWN_COVERAGE: &str = "unknown";

/// One recent commit touching a changed file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CommitSummary {
    pub hash: String,
    pub author: String,
    pub summary: String,
}

/// One change set handed to the analysis: changed paths plus fetched contents.
///
/// Paths whose content could not be fetched are absent from `files`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ChangeSet {
    #[serde(default)]
    pub changed: Vec<String>,
    #[serde(default)]
    pub files: FileMap,
    /// Recent commits per changed path, newest first. Optional.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub history: BTreeMap<String, Vec<CommitSummary>>,
}

impl ChangeSet {
    pub fn new(changed: Vec<String>, files: FileMap) -> Self {
        Self {
            changed,
            files,
            history: BTreeMap::new(),
        }
    }

    pub fn with_history(mut self, history: BTreeMap<String, Vec<CommitSummary>>) -> Self {
        self.history = history;
        self
    }
}
