// src/analyze/scoring.rs
//! Health score and local confidence.
//!
//! Health score (integer, clamped to [0,100]):
//! 100
//!  − NOVA penalty (4: 60, 3: 30, 2: 10, 1: 0)
//!  − 4 per detected additive
//!  − 15 per high-risk / 8 per medium-risk additive (on top of the flat 4)
//!  + 15 "bio"/"biologique", + 10 "naturel", + 5 "ferments lactiques", + 5 "complet"
//!
//! Confidence of the local heuristic grows with the amount of evidence the
//! matcher saw and stays below what the remote scorer usually reports.

use once_cell::sync::Lazy;
use regex::Regex;

use super::nova::NovaGroup;
use super::patterns::{normalize, MarkerTally};
use crate::result::DetectedAdditive;

pub const BASE_SCORE: i32 = 100;
pub const PER_ADDITIVE_PENALTY: i32 = 4;

pub const LOCAL_CONFIDENCE_BASE: f32 = 0.60;
pub const LOCAL_CONFIDENCE_STEP: f32 = 0.05;
pub const LOCAL_CONFIDENCE_MAX: f32 = 0.85;

/// A positive lexical signal and its bonus.
#[derive(Debug)]
pub struct Bonus {
    pub label: &'static str,
    pub points: i32,
    re: Regex,
}

static BONUSES: Lazy<Vec<Bonus>> = Lazy::new(|| {
    [
        ("bio", 15, r"\b(?:bio|biologiques?)\b"),
        ("naturel", 10, r"\bnaturel(?:le)?s?\b"),
        ("ferments lactiques", 5, r"\bferments? lactiques?\b"),
        ("complet", 5, r"\bcompl[eè]te?s?\b"),
    ]
    .into_iter()
    .map(|(label, points, pattern)| Bonus {
        label,
        points,
        re: Regex::new(pattern).expect("bonus regex"),
    })
    .collect()
});

/// Bonus labels present in `text` (each at most once), in table order.
pub fn matched_bonuses(text: &str) -> Vec<&'static str> {
    let norm = normalize(text);
    BONUSES
        .iter()
        .filter(|b| b.re.is_match(&norm))
        .map(|b| b.label)
        .collect()
}

fn bonus_points(norm: &str) -> i32 {
    BONUSES
        .iter()
        .filter(|b| b.re.is_match(norm))
        .map(|b| b.points)
        .sum()
}

/// Additive burden: flat per-additive penalty plus the risk-tier penalty.
pub fn additive_penalty(additives: &[DetectedAdditive]) -> i32 {
    additives
        .iter()
        .map(|a| PER_ADDITIVE_PENALTY + a.risk_level.penalty())
        .sum()
}

/// Deterministic function of (group, additives, raw text).
pub fn health_score(group: NovaGroup, additives: &[DetectedAdditive], text: &str) -> u8 {
    let norm = normalize(text);
    let raw = BASE_SCORE - group.penalty() - additive_penalty(additives) + bonus_points(&norm);
    raw.clamp(0, 100) as u8
}

/// Confidence of a locally computed result, in [0.60, 0.85].
pub fn local_confidence(tally: &MarkerTally, additive_count: usize) -> f32 {
    let evidence = tally.nova4 + tally.nova3 + tally.nova2 + additive_count;
    let steps = evidence.min(5) as f32;
    (LOCAL_CONFIDENCE_BASE + LOCAL_CONFIDENCE_STEP * steps).min(LOCAL_CONFIDENCE_MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::additives::detect_additives;

    #[test]
    fn nova_penalties_alone() {
        assert_eq!(health_score(NovaGroup::UltraProcessed, &[], "x"), 40);
        assert_eq!(health_score(NovaGroup::Processed, &[], "x"), 70);
        assert_eq!(health_score(NovaGroup::CulinaryIngredient, &[], "x"), 90);
        assert_eq!(health_score(NovaGroup::Unprocessed, &[], "x"), 100);
    }

    #[test]
    fn risk_penalties_stack_on_flat_penalty() {
        // E330 low (4), E211 medium (4+8), E951 high (4+15)
        let adds = detect_additives("E330 E211 E951");
        assert_eq!(additive_penalty(&adds), 4 + 12 + 19);
        assert_eq!(health_score(NovaGroup::UltraProcessed, &adds, ""), 40 - 35);
    }

    #[test]
    fn bonuses_stack_and_count_once() {
        let text = "lait bio, ferments lactiques, farine complète, arôme naturel, bio";
        assert_eq!(
            matched_bonuses(text),
            vec!["bio", "naturel", "ferments lactiques", "complet"]
        );
        // 70 + 15 + 10 + 5 + 5
        assert_eq!(health_score(NovaGroup::Processed, &[], text), 100);
        assert_eq!(health_score(NovaGroup::UltraProcessed, &[], text), 75);
    }

    #[test]
    fn bonus_words_are_bounded() {
        assert!(matched_bonuses("biologie, surnaturel").is_empty());
        assert_eq!(matched_bonuses("agriculture biologique"), vec!["bio"]);
    }

    #[test]
    fn clamped_to_zero() {
        let adds = detect_additives("E102 E129 E171 E250 E320 E951 E952");
        assert_eq!(health_score(NovaGroup::UltraProcessed, &adds, ""), 0);
    }

    #[test]
    fn confidence_grows_with_evidence_and_caps() {
        let none = MarkerTally::default();
        assert!((local_confidence(&none, 0) - 0.60).abs() < 1e-6);
        let some = MarkerTally {
            nova3: 2,
            ..Default::default()
        };
        assert!((local_confidence(&some, 0) - 0.70).abs() < 1e-6);
        let lots = MarkerTally {
            nova4: 9,
            ..Default::default()
        };
        assert!((local_confidence(&lots, 4) - LOCAL_CONFIDENCE_MAX).abs() < 1e-6);
    }
}
