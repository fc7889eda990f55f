// src/result.rs
//! Output shape of an analysis, plus the typed partial payload a remote
//! scorer may return.
//!
//! `ClassificationResult` is what the session stores as "current analysis"
//! and what the API serializes. Field names are camelCase on the wire.

use serde::{Deserialize, Serialize};

use crate::analyze::additives::AdditiveFamily;
use crate::analyze::nova::NovaGroup;
use crate::analyze::reasoning;
use crate::analyze::scoring::health_score;

/// Default product category when the caller doesn't give one.
pub const DEFAULT_CATEGORY: &str = "alimentaire";

/// Risk tier of an additive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    #[serde(alias = "faible", alias = "LOW", alias = "Low")]
    Low,
    #[serde(alias = "moyen", alias = "MEDIUM", alias = "Medium")]
    Medium,
    #[serde(alias = "eleve", alias = "élevé", alias = "HIGH", alias = "High")]
    High,
}

impl RiskLevel {
    /// Extra penalty on top of the flat per-additive one.
    pub fn penalty(self) -> i32 {
        match self {
            RiskLevel::Low => 0,
            RiskLevel::Medium => 8,
            RiskLevel::High => 15,
        }
    }
}

/// An additive found in an ingredient list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedAdditive {
    pub code: String,
    pub name: String,
    pub risk_level: RiskLevel,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<AdditiveFamily>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AdditiveSummary {
    pub detected: Vec<DetectedAdditive>,
    pub total: usize,
}

impl AdditiveSummary {
    /// Keeps `total` in sync with `detected`.
    pub fn from_detected(detected: Vec<DetectedAdditive>) -> Self {
        let total = detected.len();
        Self { detected, total }
    }
}

/// Optional diagnostic breakdown of what the matcher saw.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalysisBreakdown {
    pub ultra_processing_markers: Vec<String>,
    pub industrial_ingredients: Vec<String>,
    pub additive_codes: Vec<String>,
    pub natural_ingredients: Vec<String>,
    pub suspicious_terms: Vec<String>,
}

/// Which path produced the core fields of a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultSource {
    Remote,
    Local,
}

impl ResultSource {
    pub fn as_str(self) -> &'static str {
        match self {
            ResultSource::Remote => "remote",
            ResultSource::Local => "local",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationResult {
    pub product_name: String,
    /// Always in 1..=4.
    pub nova_group: u8,
    /// In [0.0, 1.0].
    pub confidence: f32,
    pub reasoning: String,
    pub additives: AdditiveSummary,
    pub recommendations: Vec<String>,
    /// Always in 0..=100.
    pub health_score: u8,
    pub is_processed: bool,
    pub category: String,
    /// RFC 3339, UTC.
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<AnalysisBreakdown>,
    pub source: ResultSource,
}

impl ClassificationResult {
    /// Checks the record-level invariants; the message names the first breach.
    pub fn check_invariants(&self) -> Result<(), String> {
        if !(1..=4).contains(&self.nova_group) {
            return Err(format!("NOVA group {} outside 1..=4", self.nova_group));
        }
        if self.health_score > 100 {
            return Err(format!("health score {} above 100", self.health_score));
        }
        if self.additives.total != self.additives.detected.len() {
            return Err(format!(
                "additive total {} != {} detected",
                self.additives.total,
                self.additives.detected.len()
            ));
        }
        if self.is_processed != (self.nova_group >= 3) {
            return Err("isProcessed disagrees with NOVA group".to_string());
        }
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(format!("confidence {} outside [0,1]", self.confidence));
        }
        Ok(())
    }
}

/// Remote payload: every field optional, merged over a locally computed
/// result so the final record is always fully populated.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PartialResult {
    pub nova_group: Option<i64>,
    pub confidence: Option<f64>,
    pub reasoning: Option<String>,
    pub additives: Option<PartialAdditives>,
    pub recommendations: Option<Vec<String>>,
    pub health_score: Option<f64>,
    pub is_processed: Option<bool>,
    pub category: Option<String>,
    pub analysis: Option<AnalysisBreakdown>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PartialAdditives {
    pub detected: Option<Vec<DetectedAdditive>>,
    /// Ignored on merge; the count is recomputed from `detected`.
    pub total: Option<i64>,
}

impl PartialResult {
    /// Field-by-field merge over `local`. Remote values breaking an
    /// invariant are dropped in favour of the local value.
    ///
    /// Fields the remote omitted are functions of the NOVA group and the
    /// additive list; when either changed they are recomputed from the
    /// final values and `ingredients`, so the record never mixes verdicts.
    pub fn merge_over(self, mut local: ClassificationResult, ingredients: &str) -> ClassificationResult {
        let local_group = local.nova_group;
        let mut additives_changed = false;

        if let Some(g) = self.nova_group {
            if (1..=4).contains(&g) {
                local.nova_group = g as u8;
            } else {
                tracing::warn!(nova_group = g, "remote NOVA group out of range, keeping local");
            }
        }

        if let Some(c) = self.confidence.and_then(normalize_confidence) {
            local.confidence = c;
        }

        if let Some(detected) = self.additives.and_then(|a| a.detected) {
            local.additives = AdditiveSummary::from_detected(detected);
            additives_changed = true;
        }

        if let Some(cat) = self.category.filter(|c| !c.trim().is_empty()) {
            local.category = cat;
        }

        if let Some(a) = self.analysis {
            local.analysis = Some(a);
        }

        let stale = additives_changed || local.nova_group != local_group;
        let group = NovaGroup::try_from(local.nova_group).ok().filter(|_| stale);
        let additive_count = local.additives.total;

        match self.reasoning.filter(|r| !r.trim().is_empty()) {
            Some(r) => local.reasoning = r,
            None => {
                if let Some(g) = group {
                    local.reasoning = reasoning::reasoning(g, additive_count);
                }
            }
        }

        match self.recommendations.filter(|r| !r.is_empty()) {
            Some(recs) => local.recommendations = recs,
            None => {
                if let Some(g) = group {
                    local.recommendations = reasoning::recommendations(g, additive_count);
                }
            }
        }

        match self.health_score.filter(|s| s.is_finite()) {
            Some(s) => local.health_score = s.round().clamp(0.0, 100.0) as u8,
            None => {
                if let Some(g) = group {
                    local.health_score = health_score(g, &local.additives.detected, ingredients);
                }
            }
        }

        // Derived from the final group; a contradicting remote flag is ignored.
        if let Some(p) = self.is_processed {
            if p != (local.nova_group >= 3) {
                tracing::debug!(remote = p, "remote isProcessed disagrees with NOVA group");
            }
        }
        local.is_processed = local.nova_group >= 3;
        local.source = ResultSource::Remote;
        local
    }
}

/// Accepts either a ratio (0..=1) or a percentage (1..=100).
fn normalize_confidence(raw: f64) -> Option<f32> {
    if !raw.is_finite() || raw < 0.0 {
        return None;
    }
    let ratio = if raw <= 1.0 {
        raw
    } else if raw <= 100.0 {
        raw / 100.0
    } else {
        return None;
    };
    Some(ratio as f32)
}
