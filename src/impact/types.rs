//! Type definitions for impact resolution

use crate::model::ImpactedModuleSet;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// How far impact spreads from the changed files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ImpactPolicy {
    /// Only the changed files themselves.
    #[default]
    ChangedOnly,
    /// Changed files plus files importing them, up to `max_depth` hops.
    Transitive {
        max_depth: usize,
        #[serde(default)]
        include_tests: bool,
    },
}

/// Why a path ended up in the impacted set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ImpactReason {
    Changed,
    /// Listed as a related module of a changed file in the module lookup.
    Related { via: String },
    Dependent {
        /// Impacted path whose module this file imports.
        via: String,
        depth: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct ImpactEntry {
    pub path: String,
    pub reason: ImpactReason,
}

impl ImpactEntry {
    /// Hops from the changed files; related modules count as one hop.
    pub fn depth(&self) -> usize {
        match self.reason {
            ImpactReason::Changed => 0,
            ImpactReason::Related { .. } => 1,
            ImpactReason::Dependent { depth, .. } => depth,
        }
    }
}

/// Impacted paths in discovery order, with the reason each was included.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, JsonSchema)]
pub struct ImpactTrace {
    pub entries: Vec<ImpactEntry>,
    /// Set when the depth bound stopped further dependents from being added.
    pub truncated: bool,
}

impl ImpactTrace {
    pub fn modules(&self) -> ImpactedModuleSet {
        self.entries.iter().map(|entry| entry.path.as_str()).collect()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.iter().any(|entry| entry.path == path)
    }

    pub fn related(&self) -> impl Iterator<Item = &ImpactEntry> {
        self.entries
            .iter()
            .filter(|entry| matches!(entry.reason, ImpactReason::Related { .. }))
    }

    pub fn dependents(&self) -> impl Iterator<Item = &ImpactEntry> {
        self.entries
            .iter()
            .filter(|entry| matches!(entry.reason, ImpactReason::Dependent { .. }))
    }
}
