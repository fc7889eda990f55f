// src/analyze/additives.rs
//! Curated additive table and E-code detector.
//!
//! Detection works on normalized code tokens, not raw substrings: the text
//! is scanned for word-bounded E-numbers (`E150d`, `e 150d`, `E-150d`), each
//! normalized to uppercase without separators, and table entries are kept
//! when their own normalized code is present. `E1500` never hits `E150`,
//! and a separated number followed by a unit (`E 400 mg`) is a dose.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::result::{DetectedAdditive, RiskLevel};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdditiveFamily {
    Colorant,
    Preservative,
    Antioxidant,
    Acidifier,
    Emulsifier,
    Thickener,
    FlavourEnhancer,
    Sweetener,
}

/// Static reference entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdditiveDefinition {
    pub code: &'static str,
    pub name: &'static str,
    pub risk_level: RiskLevel,
    pub description: &'static str,
    pub family: AdditiveFamily,
}

impl AdditiveDefinition {
    pub fn to_detected(&self) -> DetectedAdditive {
        DetectedAdditive {
            code: self.code.to_string(),
            name: self.name.to_string(),
            risk_level: self.risk_level,
            description: self.description.to_string(),
            family: Some(self.family),
        }
    }
}

const fn def(
    code: &'static str,
    name: &'static str,
    risk_level: RiskLevel,
    family: AdditiveFamily,
    description: &'static str,
) -> AdditiveDefinition {
    AdditiveDefinition {
        code,
        name,
        risk_level,
        description,
        family,
    }
}

use self::AdditiveFamily::*;
use crate::result::RiskLevel::{High, Low, Medium};

static ADDITIVES: [AdditiveDefinition; 15] = [
    def("E102", "Tartrazine", High, Colorant,
        "Colorant azoïque jaune, lié à des troubles de l'attention chez l'enfant."),
    def("E129", "Rouge allura AC", High, Colorant,
        "Colorant azoïque rouge, mention d'avertissement obligatoire en UE."),
    def("E150d", "Caramel au sulfite d'ammonium", Medium, Colorant,
        "Colorant caramel pouvant contenir du 4-MEI, composé sous surveillance."),
    def("E171", "Dioxyde de titane", High, Colorant,
        "Colorant blanc interdit dans l'alimentation en UE depuis 2022."),
    def("E211", "Benzoate de sodium", Medium, Preservative,
        "Conservateur pouvant former du benzène en présence de vitamine C."),
    def("E250", "Nitrite de sodium", High, Preservative,
        "Conservateur des charcuteries, associé à la formation de nitrosamines."),
    def("E320", "BHA (butylhydroxyanisole)", High, Antioxidant,
        "Antioxydant synthétique classé cancérogène possible."),
    def("E330", "Acide citrique", Low, Acidifier,
        "Acidifiant courant, généralement bien toléré."),
    def("E338", "Acide phosphorique", Medium, Acidifier,
        "Acidifiant des sodas, consommation excessive défavorable à la santé osseuse."),
    def("E407", "Carraghénanes", Medium, Thickener,
        "Épaississant extrait d'algues, suspecté d'effets inflammatoires intestinaux."),
    def("E433", "Polysorbate 80", Medium, Emulsifier,
        "Émulsifiant de synthèse pouvant altérer le microbiote intestinal."),
    def("E471", "Mono- et diglycérides d'acides gras", Low, Emulsifier,
        "Émulsifiant très répandu, marqueur d'ultra-transformation."),
    def("E621", "Glutamate monosodique", Medium, FlavourEnhancer,
        "Exhausteur de goût, peut provoquer des réactions chez les personnes sensibles."),
    def("E951", "Aspartame", High, Sweetener,
        "Édulcorant intense classé cancérogène possible par le CIRC."),
    def("E952", "Cyclamate", High, Sweetener,
        "Édulcorant intense interdit dans plusieurs pays."),
];

// Group 1: attached digits, group 2: digits after a space or hyphen,
// group 3: letter suffix, group 4: a dose unit right after the number.
static E_CODE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?iu)\be(?:(\d{3,4})|[\s\-](\d{3,4}))([a-z])?\b(?:\s*(mg|µg|mcg|ug|ui|iu|kg|g)\b)?",
    )
    .expect("E-code regex")
});

/// Normalized code tokens in `text`, repeats included. A spaced or
/// hyphenated number followed by a unit ("vitamine E 400 mg") is a dose.
fn code_tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    E_CODE.captures_iter(text).filter_map(|caps| {
        let (digits, separated) = match (caps.get(1), caps.get(2)) {
            (Some(d), _) => (d.as_str(), false),
            (None, Some(d)) => (d.as_str(), true),
            (None, None) => return None,
        };
        if separated && caps.get(4).is_some() {
            return None;
        }
        let suffix = caps.get(3).map_or("", |m| m.as_str());
        Some(format!("E{}{}", digits, suffix.to_ascii_uppercase()))
    })
}

/// The whole table, in its fixed order.
pub fn additive_table() -> &'static [AdditiveDefinition] {
    &ADDITIVES
}

/// Looks a definition up by code (`"e150d"`, `"E 150d"` and `"E150D"` all match).
pub fn find_additive(code: &str) -> Option<&'static AdditiveDefinition> {
    let wanted = normalize_code(code)?;
    ADDITIVES
        .iter()
        .find(|d| normalize_code(d.code).as_deref() == Some(wanted.as_str()))
}

/// Every E-code token in `text`, normalized (`E150D`), in order of first appearance.
pub fn extract_codes(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for code in code_tokens(text) {
        if seen.insert(code.clone()) {
            out.push(code);
        }
    }
    out
}

/// Number of E-code occurrences in `text`, repeats included.
pub fn count_codes(text: &str) -> usize {
    code_tokens(text).count()
}

/// Table entries whose code appears in `text`, in table order.
pub fn detect_additives(text: &str) -> Vec<DetectedAdditive> {
    let present: HashSet<String> = extract_codes(text).into_iter().collect();
    if present.is_empty() {
        return Vec::new();
    }
    ADDITIVES
        .iter()
        .filter(|d| {
            normalize_code(d.code)
                .map(|c| present.contains(&c))
                .unwrap_or(false)
        })
        .map(AdditiveDefinition::to_detected)
        .collect()
}

fn normalize_code(code: &str) -> Option<String> {
    code_tokens(code.trim()).next()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codes(found: &[DetectedAdditive]) -> Vec<&str> {
        found.iter().map(|d| d.code.as_str()).collect()
    }

    #[test]
    fn detects_in_table_order_not_text_order() {
        let found = detect_additives("conservateur E211, colorant E150d, édulcorant E952");
        assert_eq!(codes(&found), vec!["E150d", "E211", "E952"]);
    }

    #[test]
    fn case_and_separator_insensitive() {
        let found = detect_additives("acidifiant e-330 ; émulsifiant E 471");
        assert_eq!(codes(&found), vec!["E330", "E471"]);
    }

    #[test]
    fn anchored_on_full_code() {
        // E1500 is not E150d, E150 alone is not E150d, E3300 is not E330.
        assert!(detect_additives("amidon E1500, caramel E150, E3300").is_empty());
        assert_eq!(codes(&detect_additives("E150d")), vec!["E150d"]);
    }

    #[test]
    fn vitamin_doses_are_not_codes() {
        let text = "huile de tournesol, vitamine E 400 mg, vitamine e-200 UI";
        assert!(extract_codes(text).is_empty());
        assert_eq!(count_codes(text), 0);
        // attached codes and unit-less spaced codes still count
        assert_eq!(extract_codes("E 330 guar, E400, E-471"), vec!["E330", "E400", "E471"]);
        assert_eq!(count_codes("E 330 guar, E400, E-471"), 3);
    }

    #[test]
    fn duplicates_count_once() {
        let found = detect_additives("E330, E330, e330");
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn unknown_codes_are_extracted_but_not_detected() {
        let text = "E160a, E300";
        assert_eq!(extract_codes(text), vec!["E160A", "E300"]);
        assert!(detect_additives(text).is_empty());
    }

    #[test]
    fn lookup_by_code() {
        let d = find_additive("e 951").unwrap();
        assert_eq!(d.name, "Aspartame");
        assert_eq!(d.risk_level, RiskLevel::High);
        assert!(find_additive("E999").is_none());
        assert!(find_additive("sucre").is_none());
    }

    #[test]
    fn table_codes_are_unique() {
        let set: HashSet<_> = additive_table()
            .iter()
            .filter_map(|d| normalize_code(d.code))
            .collect();
        assert_eq!(set.len(), additive_table().len());
    }
}
