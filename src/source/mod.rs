//! Change set sources
//!
//! Everything that gathers changed paths and their contents lives here, outside
//! the analysis itself. Sources hand back a fully assembled `ChangeSet`; a file
//! that cannot be read is left out of `files` rather than failing the load.

mod git;

pub use git::{DEFAULT_HISTORY_DEPTH, GitWorkTree, parse_log, parse_name_status};

use crate::model::{ChangeSet, ModuleLookup};
use crate::util;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Anything able to produce a change set for analysis.
pub trait ChangeSource {
    /// Short label for logs ("git", "json", ...).
    fn name(&self) -> &'static str;

    fn load(&self) -> Result<ChangeSet>;
}

impl ChangeSource for ChangeSet {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn load(&self) -> Result<ChangeSet> {
        Ok(self.clone())
    }
}

/// Where a JSON change set is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JsonInput {
    Stdin,
    File(PathBuf),
}

impl JsonInput {
    /// `-` means stdin.
    pub fn from_arg(arg: Option<PathBuf>) -> Self {
        match arg {
            Some(path) if path.as_os_str() != "-" => JsonInput::File(path),
            _ => JsonInput::Stdin,
        }
    }
}

/// `{"changed": [...], "files": {"path": "source", ...}}`
#[derive(Debug, Clone)]
pub struct JsonChangeSet {
    input: JsonInput,
}

impl JsonChangeSet {
    pub fn new(input: JsonInput) -> Self {
        Self { input }
    }

    pub fn parse(raw: &str) -> Result<ChangeSet> {
        let changes: ChangeSet = serde_json::from_str(raw).context("parse change set JSON")?;
        Ok(changes)
    }
}

impl ChangeSource for JsonChangeSet {
    fn name(&self) -> &'static str {
        "json"
    }

    fn load(&self) -> Result<ChangeSet> {
        let raw = match &self.input {
            JsonInput::Stdin => util::read_stdin_to_string()?,
            JsonInput::File(path) => util::read_to_string(path)?,
        };
        Self::parse(&raw)
    }
}

/// Load a module lookup (`{"path": {"related_modules": [...], "test_coverage": "..."}}`).
///
/// A missing file is an empty lookup; a file that exists but does not parse is
/// an error.
pub fn load_lookup(path: &Path) -> Result<ModuleLookup> {
    if !path.exists() {
        warn!(path = %path.display(), "module lookup not found, continuing without it");
        return Ok(ModuleLookup::new());
    }
    let raw = util::read_to_string(path)?;
    let lookup = parse_lookup(&raw).with_context(|| format!("parse {}", path.display()))?;
    debug!(path = %path.display(), modules = lookup.len(), "loaded module lookup");
    Ok(lookup)
}

pub fn parse_lookup(raw: &str) -> Result<ModuleLookup> {
    if raw.trim().is_empty() {
        return Ok(ModuleLookup::new());
    }
    let lookup: ModuleLookup = serde_json::from_str(raw).context("parse module lookup JSON")?;
    Ok(lookup)
}
