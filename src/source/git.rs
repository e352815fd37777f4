use crate::model::{ChangeSet, CommitSummary, FileMap};
use crate::source::ChangeSource;
use crate::util;
use anyhow::Result;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Recent commits fetched per changed file.
pub const DEFAULT_HISTORY_DEPTH: usize = 5;

/// Working tree of a local git repository compared against a base revision.
///
/// Repository location and base are explicit values; nothing is read from the
/// environment.
#[derive(Debug, Clone)]
pub struct GitWorkTree {
    repo: PathBuf,
    base: String,
    history_depth: usize,
}

impl GitWorkTree {
    pub fn new(repo: impl Into<PathBuf>, base: impl Into<String>) -> Self {
        Self {
            repo: repo.into(),
            base: base.into(),
            history_depth: DEFAULT_HISTORY_DEPTH,
        }
    }

    /// Commits to fetch per changed file; 0 skips history.
    pub fn with_history_depth(mut self, depth: usize) -> Self {
        self.history_depth = depth;
        self
    }

    /// Latest commits touching `path`, newest first.
    pub fn recent_commits(&self, path: &str) -> Result<Vec<CommitSummary>> {
        let limit = format!("-n{}", self.history_depth);
        let output = util::git_output(
            &self.repo,
            &["log", limit.as_str(), "--format=%h%x09%an%x09%s", "--", path],
        )?;
        Ok(parse_log(&output))
    }

    fn read_history(&self, changed: &[String]) -> BTreeMap<String, Vec<CommitSummary>> {
        let mut history = BTreeMap::new();
        if self.history_depth == 0 {
            return history;
        }
        for path in changed {
            match self.recent_commits(path) {
                Ok(commits) if commits.is_empty() => {}
                Ok(commits) => {
                    history.insert(path.clone(), commits);
                }
                Err(err) => {
                    warn!(path = %path, error = %err, "commit history unavailable");
                }
            }
        }
        history
    }

    pub fn changed_paths(&self) -> Result<Vec<String>> {
        let output = util::git_output(
            &self.repo,
            &["diff", "--name-status", "-z", self.base.as_str(), "--"],
        )?;
        Ok(parse_name_status(&output))
    }

    fn read_files(&self, changed: &[String]) -> FileMap {
        let mut files = FileMap::new();
        for path in changed {
            let abs = self.repo.join(path);
            let bytes = match fs::read(&abs) {
                Ok(bytes) => bytes,
                Err(err) => {
                    warn!(path = %path, error = %err, "unreadable changed file, skipped");
                    continue;
                }
            };
            match String::from_utf8(bytes) {
                Ok(text) => {
                    files.insert(path.clone(), text);
                }
                Err(_) => warn!(path = %path, "changed file is not UTF-8, skipped"),
            }
        }
        files
    }
}

impl ChangeSource for GitWorkTree {
    fn name(&self) -> &'static str {
        "git"
    }

    fn load(&self) -> Result<ChangeSet> {
        let changed = self.changed_paths()?;
        let files = self.read_files(&changed);
        let history = self.read_history(&changed);
        info!(
            repo = %self.repo.display(),
            base = %self.base,
            changed = changed.len(),
            fetched = files.len(),
            with_history = history.len(),
            "loaded change set"
        );
        Ok(ChangeSet::new(changed, files).with_history(history))
    }
}

/// Parse `git diff --name-status -z` output into non-deleted paths.
///
/// Renames and copies report the destination path.
pub fn parse_name_status(output: &str) -> Vec<String> {
    let mut paths = Vec::new();
    let mut tokens = output.split('\0').filter(|token| !token.is_empty());
    while let Some(status) = tokens.next() {
        let kind = status.chars().next().unwrap_or(' ');
        let path = match kind {
            'R' | 'C' => {
                let _from = tokens.next();
                tokens.next()
            }
            _ => tokens.next(),
        };
        let Some(path) = path else {
            break;
        };
        if kind == 'D' {
            debug!(path, "removed file ignored");
            continue;
        }
        if !paths.iter().any(|existing: &String| existing == path) {
            paths.push(path.to_string());
        }
    }
    paths
}

/// Parse `git log --format=%h%x09%an%x09%s` output. Lines without a hash are
/// skipped; a missing author or subject is left empty.
pub fn parse_log(output: &str) -> Vec<CommitSummary> {
    output
        .lines()
        .filter_map(|line| {
            let mut fields = line.splitn(3, '\t');
            let hash = fields.next()?.trim();
            if hash.is_empty() {
                return None;
            }
            Some(CommitSummary {
                hash: hash.to_string(),
                author: fields.next().unwrap_or("").to_string(),
                summary: fields.next().unwrap_or("").to_string(),
            })
        })
        .collect()
}
