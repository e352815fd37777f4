//! Sequential analysis driver
//!
//! file map -> dependency context -> impacted modules -> {risk, test advice}.
//! Every stage builds a new value from the previous one; the input change set
//! is only read.

use crate::advisor::TestAdvisor;
use crate::config::{Config, ConfigError};
use crate::impact::{self, ImpactTrace};
use crate::indexer::ContextBuilder;
use crate::model::{
    ChangeSet, DependencyContext, FileMap, ImpactedModuleSet, ModuleLookup, RiskLevel,
    RiskReport, TestSuggestionSet, UNKNOWN_COVERAGE,
};
use crate::risk;
use blake3::Hasher;
use schemars::JsonSchema;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::info;

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct AnalysisReport {
    /// Identifies the analysed input; equal inputs give equal fingerprints.
    pub fingerprint: String,
    pub impacted: ImpactedModuleSet,
    pub risk: RiskReport,
    pub risk_level: RiskLevel,
    /// Criticality keywords matched per impacted path.
    pub critical: BTreeMap<String, Vec<String>>,
    pub suggestions: TestSuggestionSet,
    /// Coverage level per impacted path, present only when a module lookup
    /// was supplied.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub coverage_levels: BTreeMap<String, String>,
    /// Number of recent commits per impacted path with known history.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub recent_commits: BTreeMap<String, usize>,
    pub context: DependencyContext,
    pub trace: ImpactTrace,
}

pub struct Analyzer {
    config: Config,
    context_builder: ContextBuilder,
    advisor: TestAdvisor,
    lookup: ModuleLookup,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self {
            config: Config::default(),
            context_builder: ContextBuilder::default(),
            advisor: TestAdvisor::default(),
            lookup: ModuleLookup::new(),
        }
    }
}

impl Analyzer {
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        config.validate()?;
        let advisor = TestAdvisor::from_settings(&config.coverage)?;
        let context_builder = ContextBuilder::new(config.coverage.test_file_prefix.clone());
        Ok(Self {
            config,
            context_builder,
            advisor,
            lookup: ModuleLookup::new(),
        })
    }

    /// Use `lookup` for related modules and known coverage levels.
    pub fn with_lookup(mut self, lookup: ModuleLookup) -> Self {
        self.lookup = lookup;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn build_context(&self, files: &FileMap) -> DependencyContext {
        self.context_builder.build(files)
    }

    pub fn analyze(&self, changes: &ChangeSet) -> AnalysisReport {
        let context = self.context_builder.build(&changes.files);
        let trace = impact::trace_impact_with_lookup(
            &changes.changed,
            &context,
            self.config.impact.policy(),
            &self.lookup,
        );
        let impacted = trace.modules();
        let risk = self.config.risk.score(&impacted);
        let risk_level = self.config.risk.level(risk.score);
        let critical = risk::critical_matches(&impacted, &self.config.risk);
        let suggestions = self
            .advisor
            .suggest_with_context(&impacted, &changes.files, &context);

        let coverage_levels = self.coverage_levels(&impacted);
        let recent_commits: BTreeMap<String, usize> = impacted
            .iter()
            .filter_map(|path| {
                let commits = changes.history.get(path)?;
                Some((path.to_string(), commits.len()))
            })
            .collect();

        info!(
            changed = changes.changed.len(),
            impacted = impacted.len(),
            score = risk.score,
            "analysis complete"
        );

        AnalysisReport {
            fingerprint: fingerprint(changes),
            impacted,
            risk,
            risk_level,
            critical,
            suggestions,
            coverage_levels,
            recent_commits,
            context,
            trace,
        }
    }

    fn coverage_levels(&self, impacted: &ImpactedModuleSet) -> BTreeMap<String, String> {
        if self.lookup.is_empty() {
            return BTreeMap::new();
        }
        impacted
            .iter()
            .map(|path| {
                let level = self
                    .lookup
                    .get(path)
                    .and_then(|notes| notes.test_coverage.as_deref())
                    .unwrap_or(UNKNOWN_COVERAGE);
                (path.to_string(), level.to_string())
            })
            .collect()
    }
}

/// Analyse with default settings.
pub fn analyze(changed: &[String], files: &FileMap) -> AnalysisReport {
    Analyzer::default().analyze(&ChangeSet::new(changed.to_vec(), files.clone()))
}

/// First 16 hex chars of a blake3 hash over changed paths and file contents.
///
/// Every field is length-prefixed, so contents holding separator bytes cannot
/// make two different change sets hash alike.
pub fn fingerprint(changes: &ChangeSet) -> String {
    let mut hasher = Hasher::new();
    hasher.update(&(changes.changed.len() as u64).to_le_bytes());
    for path in &changes.changed {
        update_field(&mut hasher, path);
    }
    hasher.update(&(changes.files.len() as u64).to_le_bytes());
    for (path, source) in &changes.files {
        update_field(&mut hasher, path);
        update_field(&mut hasher, source);
    }
    let hash = hasher.finalize();
    hash.to_hex()[..16].to_string()
}

fn update_field(hasher: &mut Hasher, field: &str) {
    hasher.update(&(field.len() as u64).to_le_bytes());
    hasher.update(field.as_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impact::ImpactSettings;

    fn change_set(changed: &[&str], files: &[(&str, &str)]) -> ChangeSet {
        ChangeSet::new(
            changed.iter().map(|s| s.to_string()).collect(),
            files
                .iter()
                .map(|(p, s)| (p.to_string(), s.to_string()))
                .collect(),
        )
    }

    #[test]
    fn fingerprint_tracks_content() {
        let a = change_set(&["a.py"], &[("a.py", "x = 1")]);
        let b = change_set(&["a.py"], &[("a.py", "x = 2")]);
        assert_eq!(fingerprint(&a), fingerprint(&a.clone()));
        assert_ne!(fingerprint(&a), fingerprint(&b));
        assert_eq!(fingerprint(&a).len(), 16);
    }

    #[test]
    fn fingerprint_separates_fields_with_embedded_nul() {
        let merged = change_set(&[], &[("a", "x\0b\0y")]);
        let split = change_set(&[], &[("a", "x"), ("b", "y")]);
        assert_ne!(fingerprint(&merged), fingerprint(&split));

        let joined = change_set(&["a\0b"], &[]);
        let pair = change_set(&["a", "b"], &[]);
        assert_ne!(fingerprint(&joined), fingerprint(&pair));
    }

    #[test]
    fn lookup_and_history_reach_the_report() {
        let mut lookup = ModuleLookup::new();
        lookup.insert(
            "billing/pay.py".into(),
            crate::model::ModuleNotes {
                related_modules: vec!["core/ledger.py".into()],
                test_coverage: Some("low".into()),
            },
        );
        let commit = crate::model::CommitSummary {
            hash: "a1b2c3d".into(),
            author: "dev".into(),
            summary: "tweak fees".into(),
        };
        let changes = change_set(
            &["billing/pay.py"],
            &[
                ("billing/pay.py", "def charge(): pass\n"),
                ("core/ledger.py", "def post(): pass\n"),
            ],
        )
        .with_history(BTreeMap::from([(
            "billing/pay.py".to_string(),
            vec![commit.clone(), commit],
        )]));

        let report = Analyzer::default().with_lookup(lookup).analyze(&changes);
        assert_eq!(report.impacted.as_slice(), ["billing/pay.py", "core/ledger.py"]);
        // base 1 + billing 3 + plain 1
        assert_eq!(report.risk.score, 5);
        assert_eq!(report.coverage_levels["billing/pay.py"], "low");
        assert_eq!(report.coverage_levels["core/ledger.py"], UNKNOWN_COVERAGE);
        assert_eq!(report.recent_commits["billing/pay.py"], 2);
        assert!(!report.recent_commits.contains_key("core/ledger.py"));
        assert_eq!(report.suggestions.len(), 2);
    }

    #[test]
    fn optional_sections_are_omitted_when_empty() {
        let report = Analyzer::default().analyze(&change_set(&["a.py"], &[("a.py", "x = 1")]));
        let value = serde_json::to_value(&report).unwrap();
        assert!(value.get("coverage_levels").is_none());
        assert!(value.get("recent_commits").is_none());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = Config::default();
        config.risk.max_score = 0;
        assert!(Analyzer::new(config).is_err());
    }

    #[test]
    fn transitive_config_reaches_dependents() {
        let config = Config {
            impact: ImpactSettings::transitive(2),
            ..Config::default()
        };
        let analyzer = Analyzer::new(config).unwrap();
        let report = analyzer.analyze(&change_set(
            &["auth/session.py"],
            &[
                ("auth/session.py", "def open_session(): pass\n"),
                ("api/login.py", "from auth.session import open_session\ndef login(): pass\n"),
            ],
        ));
        assert_eq!(report.impacted.as_slice(), ["auth/session.py", "api/login.py"]);
        assert_eq!(report.risk.score, 5);
        assert_eq!(report.risk_level, RiskLevel::Medium);
        assert_eq!(report.critical.len(), 1);
        assert_eq!(
            report.suggestions["api/login.py"],
            vec!["Add test for `login` function in `api/login.py`"]
        );
    }
}
