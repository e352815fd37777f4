//! Impacted module derivation
//!
//! Answers "which modules does this change touch?". The default policy is the
//! changed files themselves; the transitive policy also walks reverse import
//! edges from the dependency context. An optional module lookup can name
//! related modules up front.

pub mod config;
pub mod transitive;
pub mod types;

pub use config::ImpactSettings;
pub use types::{ImpactEntry, ImpactPolicy, ImpactReason, ImpactTrace};

use crate::model::{DependencyContext, ImpactedModuleSet, ModuleLookup};
use std::collections::HashSet;

/// Changed paths, de-duplicated in first-seen order.
pub fn resolve_impact(changed: &[String], context: &DependencyContext) -> ImpactedModuleSet {
    resolve_impact_with(changed, context, ImpactPolicy::ChangedOnly)
}

pub fn resolve_impact_with(
    changed: &[String],
    context: &DependencyContext,
    policy: ImpactPolicy,
) -> ImpactedModuleSet {
    trace_impact(changed, context, policy).modules()
}

/// Resolve impact and keep the reason for every entry.
pub fn trace_impact(
    changed: &[String],
    context: &DependencyContext,
    policy: ImpactPolicy,
) -> ImpactTrace {
    trace_impact_with_lookup(changed, context, policy, &ModuleLookup::new())
}

/// As `trace_impact`, also adding the related modules `lookup` lists for each
/// changed path. Under the transitive policy those seed the walk one hop out.
pub fn trace_impact_with_lookup(
    changed: &[String],
    context: &DependencyContext,
    policy: ImpactPolicy,
    lookup: &ModuleLookup,
) -> ImpactTrace {
    let mut trace = ImpactTrace::default();
    let mut seen: HashSet<&str> = HashSet::new();
    for path in changed {
        if seen.insert(path.as_str()) {
            trace.entries.push(ImpactEntry {
                path: path.clone(),
                reason: ImpactReason::Changed,
            });
        }
    }
    for path in changed {
        let Some(notes) = lookup.get(path) else {
            continue;
        };
        for related in &notes.related_modules {
            if seen.insert(related.as_str()) {
                trace.entries.push(ImpactEntry {
                    path: related.clone(),
                    reason: ImpactReason::Related { via: path.clone() },
                });
            }
        }
    }

    if let ImpactPolicy::Transitive {
        max_depth,
        include_tests,
    } = policy
    {
        transitive::expand(&mut trace, context, max_depth, include_tests);
    }
    trace
}
