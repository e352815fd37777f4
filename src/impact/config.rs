//! Configuration for impact resolution

use crate::impact::types::ImpactPolicy;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_DEPTH: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ImpactSettings {
    /// Follow reverse import edges past the changed files.
    pub transitive: bool,
    pub max_depth: usize,
    /// Let test modules count as dependents.
    pub include_tests: bool,
}

impl Default for ImpactSettings {
    fn default() -> Self {
        Self {
            transitive: false,
            max_depth: DEFAULT_MAX_DEPTH,
            include_tests: false,
        }
    }
}

impl ImpactSettings {
    pub fn transitive(max_depth: usize) -> Self {
        Self {
            transitive: true,
            max_depth,
            ..Default::default()
        }
    }

    pub fn include_tests(mut self, include: bool) -> Self {
        self.include_tests = include;
        self
    }

    pub fn policy(&self) -> ImpactPolicy {
        if self.transitive {
            ImpactPolicy::Transitive {
                max_depth: self.max_depth,
                include_tests: self.include_tests,
            }
        } else {
            ImpactPolicy::ChangedOnly
        }
    }
}
