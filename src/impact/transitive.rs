//! Transitive impact over reverse import edges
//!
//! A file D depends on P when one of D's imports names P's module
//! (`pkg/sub/mod.py` is module `pkg.sub.mod`). Expansion is breadth-first from
//! the changed files, so discovery order is level by level, and within a level
//! follows the path order of the dependency context.

use crate::impact::types::{ImpactEntry, ImpactReason, ImpactTrace};
use crate::indexer::python::module_name_from_rel_path;
use crate::indexer::test_detection::is_test_file;
use crate::model::DependencyContext;
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::debug;

/// Index from imported module name to the files importing it.
fn importers_by_module(context: &DependencyContext) -> HashMap<&str, Vec<&str>> {
    let mut importers: HashMap<&str, Vec<&str>> = HashMap::new();
    for (path, imports) in &context.dependencies {
        for module in imports {
            let entry = importers.entry(module.as_str()).or_default();
            if entry.last() != Some(&path.as_str()) {
                entry.push(path.as_str());
            }
        }
    }
    importers
}

/// Append dependents of the entries already in `trace`, each seeded at its
/// own depth.
pub fn expand(
    trace: &mut ImpactTrace,
    context: &DependencyContext,
    max_depth: usize,
    include_tests: bool,
) {
    let importers = importers_by_module(context);
    let mut visited: HashSet<String> = trace.entries.iter().map(|e| e.path.clone()).collect();
    let mut queue: VecDeque<(String, usize)> = trace
        .entries
        .iter()
        .map(|entry| (entry.path.clone(), entry.depth()))
        .collect();

    while let Some((path, depth)) = queue.pop_front() {
        let module = module_name_from_rel_path(&path);
        let Some(dependents) = importers.get(module.as_str()) else {
            continue;
        };
        for &dependent in dependents {
            if visited.contains(dependent) {
                continue;
            }
            if !include_tests && is_test_file(dependent) {
                continue;
            }
            if depth >= max_depth {
                trace.truncated = true;
                continue;
            }
            debug!(path = dependent, via = %path, depth = depth + 1, "dependent impacted");
            visited.insert(dependent.to_string());
            trace.entries.push(ImpactEntry {
                path: dependent.to_string(),
                reason: ImpactReason::Dependent {
                    via: path.clone(),
                    depth: depth + 1,
                },
            });
            queue.push_back((dependent.to_string(), depth + 1));
        }
    }
}
