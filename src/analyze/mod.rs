// src/analyze/mod.rs
//! Local analysis pipeline: matcher → NOVA classifier → additive detector →
//! health score → reasoning. Pure apart from the timestamp.

pub mod additives;
pub mod nova;
pub mod patterns;
pub mod reasoning;
pub mod remote;
pub mod scoring;

use crate::result::{AdditiveSummary, AnalysisBreakdown, ClassificationResult, ResultSource};

// Re-export convenient types.
pub use crate::analyze::additives::{additive_table, detect_additives, AdditiveDefinition};
pub use crate::analyze::nova::{classify, NovaGroup};
pub use crate::analyze::patterns::{match_markers, MarkerTally};
pub use crate::analyze::remote::{DynRemoteScorer, RemoteRequest, RemoteScorer};
pub use crate::analyze::scoring::{health_score, local_confidence};

/// Run the whole heuristic engine on one product.
pub fn analyze_locally(product_name: &str, ingredients: &str, category: &str) -> ClassificationResult {
    let tally = match_markers(ingredients);
    let group = classify(&tally);
    let detected = detect_additives(ingredients);
    let score = health_score(group, &detected, ingredients);
    let confidence = local_confidence(&tally, detected.len());
    let breakdown = breakdown(ingredients, &tally);

    ClassificationResult {
        product_name: product_name.trim().to_string(),
        nova_group: group.as_u8(),
        confidence,
        reasoning: reasoning::reasoning(group, detected.len()),
        recommendations: reasoning::recommendations(group, detected.len()),
        additives: AdditiveSummary::from_detected(detected),
        health_score: score,
        is_processed: group.is_processed(),
        category: category.to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        analysis: Some(breakdown),
        source: ResultSource::Local,
    }
}

fn breakdown(ingredients: &str, tally: &MarkerTally) -> AnalysisBreakdown {
    let owned = |v: &[&str]| v.iter().map(|s| s.to_string()).collect::<Vec<_>>();

    let mut natural = owned(&tally.nova2_terms);
    natural.extend(scoring::matched_bonuses(ingredients).into_iter().map(String::from));

    AnalysisBreakdown {
        ultra_processing_markers: owned(&tally.processing_markers),
        industrial_ingredients: owned(&tally.industrial_ingredients),
        additive_codes: additives::extract_codes(ingredients),
        natural_ingredients: natural,
        suspicious_terms: owned(&tally.nova3_terms),
    }
}
