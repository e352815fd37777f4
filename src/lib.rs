//! Blast radius and risk assessment for source change sets.
//!
//! Given changed paths and their contents, `prisk` extracts Python imports,
//! derives the impacted modules, scores the change by how critical those
//! modules look, and lists functions that appear to lack tests. The analysis is
//! a pure in-memory computation; gathering the change set is left to
//! [`source`].

pub mod advisor;
pub mod cli;
pub mod config;
pub mod impact;
pub mod indexer;
pub mod model;
pub mod pipeline;
pub mod risk;
pub mod source;
pub mod util;

pub use advisor::suggest_tests;
pub use impact::resolve_impact;
pub use indexer::build_context;
pub use indexer::python::extract_imports;
pub use pipeline::{AnalysisReport, Analyzer, analyze};
pub use risk::score_risk;
