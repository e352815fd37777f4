//! Risk scoring for impacted modules
//!
//! Each impacted path adds its weight to a base score: the largest weight of
//! any criticality keyword found in the lower-cased path, or the default
//! weight when none matches. The total is clamped to `[1, max_score]`.
//! Scoring is a plain sum, so the order of the impacted set never matters.

use crate::config::ConfigError;
use crate::model::{ImpactedModuleSet, RiskLevel, RiskReport};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_BASE: u32 = 1;
pub const DEFAULT_WEIGHT: u32 = 1;
pub const DEFAULT_MAX_SCORE: u32 = 10;
pub const DEFAULT_KEYWORDS: &[(&str, u32)] = &[("auth", 3), ("billing", 3), ("payment", 3)];

/// Keyword weights and bounds used by the scorer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct RiskRules {
    pub base: u32,
    pub default_weight: u32,
    pub max_score: u32,
    /// Criticality keyword -> weight, matched case-insensitively against paths.
    pub keywords: BTreeMap<String, u32>,
}

impl Default for RiskRules {
    fn default() -> Self {
        Self {
            base: DEFAULT_BASE,
            default_weight: DEFAULT_WEIGHT,
            max_score: DEFAULT_MAX_SCORE,
            keywords: DEFAULT_KEYWORDS
                .iter()
                .map(|(keyword, weight)| (keyword.to_string(), *weight))
                .collect(),
        }
    }
}

impl RiskRules {
    /// Keywords contained in `path`, in keyword order.
    ///
    /// ```
    /// use prisk::risk::RiskRules;
    ///
    /// let rules = RiskRules::default();
    /// assert_eq!(rules.matched_keywords("src/Billing/PaymentAPI.py"), vec!["billing", "payment"]);
    /// assert!(rules.matched_keywords("utils/math.py").is_empty());
    /// ```
    pub fn matched_keywords(&self, path: &str) -> Vec<&str> {
        let lower = path.to_lowercase();
        self.keywords
            .keys()
            .filter(|keyword| lower.contains(&keyword.to_lowercase()))
            .map(String::as_str)
            .collect()
    }

    /// Weight one impacted path contributes to the score.
    ///
    /// ```
    /// use prisk::risk::RiskRules;
    ///
    /// let rules = RiskRules::default();
    /// assert_eq!(rules.weight_of("core/auth.py"), 3);
    /// assert_eq!(rules.weight_of("utils/math.py"), 1);
    /// ```
    pub fn weight_of(&self, path: &str) -> u32 {
        let lower = path.to_lowercase();
        self.keywords
            .iter()
            .filter(|(keyword, _)| lower.contains(&keyword.to_lowercase()))
            .map(|(_, weight)| *weight)
            .max()
            .unwrap_or(self.default_weight)
    }

    pub fn score(&self, impacted: &ImpactedModuleSet) -> RiskReport {
        let raw = impacted
            .iter()
            .fold(self.base, |acc, path| acc.saturating_add(self.weight_of(path)));
        let score = raw.clamp(1, self.max_score.max(1));
        RiskReport {
            score,
            reason: format!(
                "Risk score {score}/{} due to changes in {} modules",
                self.max_score,
                impacted.len()
            ),
        }
    }

    /// Bucket a score relative to `max_score`: up to 30% low, up to 60% medium.
    pub fn level(&self, score: u32) -> RiskLevel {
        let max = u64::from(self.max_score.max(1));
        let scaled = u64::from(score) * 10;
        if scaled <= 3 * max {
            RiskLevel::Low
        } else if scaled <= 6 * max {
            RiskLevel::Medium
        } else {
            RiskLevel::High
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base == 0 {
            return Err(ConfigError::InvalidRisk("base must be at least 1".into()));
        }
        if self.default_weight == 0 {
            return Err(ConfigError::InvalidRisk(
                "default_weight must be at least 1".into(),
            ));
        }
        if self.max_score < self.base {
            return Err(ConfigError::InvalidRisk(format!(
                "max_score {} is below base {}",
                self.max_score, self.base
            )));
        }
        for (keyword, weight) in &self.keywords {
            if keyword.trim().is_empty() {
                return Err(ConfigError::InvalidRisk("empty criticality keyword".into()));
            }
            if *weight <= self.default_weight {
                return Err(ConfigError::InvalidRisk(format!(
                    "keyword `{keyword}` weight {weight} must exceed default_weight {}",
                    self.default_weight
                )));
            }
        }
        Ok(())
    }
}

/// Score with the default keyword set.
///
/// ```
/// use prisk::model::ImpactedModuleSet;
/// use prisk::risk::score_risk;
///
/// let impacted: ImpactedModuleSet = ["billing/pay.py"].into_iter().collect();
/// let report = score_risk(&impacted);
/// assert_eq!(report.score, 4);
/// assert_eq!(report.reason, "Risk score 4/10 due to changes in 1 modules");
/// ```
pub fn score_risk(impacted: &ImpactedModuleSet) -> RiskReport {
    RiskRules::default().score(impacted)
}

/// Matched keywords per impacted path; paths with no match are left out.
pub fn critical_matches(
    impacted: &ImpactedModuleSet,
    rules: &RiskRules,
) -> BTreeMap<String, Vec<String>> {
    impacted
        .iter()
        .filter_map(|path| {
            let matched = rules.matched_keywords(path);
            if matched.is_empty() {
                None
            } else {
                Some((
                    path.to_string(),
                    matched.into_iter().map(str::to_string).collect(),
                ))
            }
        })
        .collect()
}
