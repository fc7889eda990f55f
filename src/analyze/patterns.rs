// src/analyze/patterns.rs
//! Lexical marker matcher over free-text ingredient lists.
//!
//! The text is normalized first (Unicode lowercase, typographic apostrophes
//! folded, whitespace condensed), then scanned with word-bounded regexes:
//! - NOVA-4 markers accumulate by match count (every occurrence counts),
//!   E-codes included.
//! - NOVA-2 and NOVA-3 markers count once per rule (presence, not count).
//!
//! NOVA-2 phrases are masked out before the NOVA-3 pass, so "sel marin"
//! doesn't also count as "sel" and "huile d'olive" not as "huile".

use once_cell::sync::Lazy;
use regex::Regex;

use super::additives;

/// How a NOVA-4 marker is reported in the diagnostic breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    /// Functional class on the label (colorant, émulsifiant, ...).
    Processing,
    /// Ingredient only made industrially (sirop de glucose, maltodextrine, ...).
    Industrial,
}

#[derive(Debug)]
pub struct MarkerRule {
    pub label: &'static str,
    pub kind: MarkerKind,
    re: Regex,
}

#[derive(Debug)]
pub struct PresenceRule {
    pub label: &'static str,
    re: Regex,
}

fn rx(pattern: &str) -> Regex {
    Regex::new(pattern).expect("marker regex")
}

static NOVA4_RULES: Lazy<Vec<MarkerRule>> = Lazy::new(|| {
    use MarkerKind::*;
    [
        ("sirop de glucose-fructose", Industrial, r"\bsirops? de glucose(?:[\s\-]fructose)?\b"),
        ("huile de palme", Industrial, r"\bhuiles? de palm(?:e|iste)\b"),
        ("maltodextrine", Industrial, r"\bmaltodextrines?\b"),
        ("amidon modifié", Industrial, r"\bamidons? modifi[ée]s?\b"),
        ("protéines hydrolysées", Industrial, r"\bprot[ée]ines? hydrolys[ée]es?\b"),
        ("sirop de maïs", Industrial, r"\bsirops? de ma[iï]s\b"),
        (
            "matière grasse hydrogénée",
            Industrial,
            r"\b(?:graisses?|huiles?|mati[èe]res? grasses?) (?:v[ée]g[ée]tales? )?(?:partiellement )?hydrog[ée]n[ée]es?\b",
        ),
        ("dextrose", Industrial, r"\bdextrose\b"),
        ("exhausteur de goût", Processing, r"\bexhausteurs? de go[uû]t\b"),
        ("colorant", Processing, r"\bcolorants?\b"),
        ("conservateur", Processing, r"\bconservateurs?\b"),
        ("émulsifiant", Processing, r"\b[ée]mulsifiants?\b"),
        ("arôme artificiel", Processing, r"\bar[oô]mes? artificiels?\b"),
        ("édulcorant", Processing, r"\b[ée]dulcorants?\b"),
        ("stabilisant", Processing, r"\bstabilisants?\b"),
        ("gélifiant", Processing, r"\bg[ée]lifiants?\b"),
    ]
    .into_iter()
    .map(|(label, kind, pattern)| MarkerRule {
        label,
        kind,
        re: rx(pattern),
    })
    .collect()
});

static NOVA3_RULES: Lazy<Vec<PresenceRule>> = Lazy::new(|| {
    [
        ("sucre", r"\bsucres?\b"),
        ("sel", r"\bsel\b"),
        ("huile", r"\bhuiles?\b"),
        ("levure", r"\blevures?\b"),
        ("beurre", r"\bbeurres?\b"),
        ("fromage", r"\bfromages?\b"),
        ("vinaigre", r"\bvinaigres?\b"),
    ]
    .into_iter()
    .map(|(label, pattern)| PresenceRule {
        label,
        re: rx(pattern),
    })
    .collect()
});

static NOVA2_RULES: Lazy<Vec<PresenceRule>> = Lazy::new(|| {
    [
        ("huile d'olive", r"\bhuiles? d'olive\b"),
        ("sel marin", r"\bsel marin\b"),
        ("miel", r"\bmiel\b"),
        ("vinaigre de cidre", r"\bvinaigre de cidre\b"),
    ]
    .into_iter()
    .map(|(label, pattern)| PresenceRule {
        label,
        re: rx(pattern),
    })
    .collect()
});

static ITEM_SEP: Lazy<Regex> = Lazy::new(|| rx(r"[,;]"));

/// What the matcher found in one ingredient text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkerTally {
    /// NOVA-4 occurrences, E-codes included.
    pub nova4: usize,
    /// Number of NOVA-3 rules present.
    pub nova3: usize,
    /// Number of NOVA-2 rules present.
    pub nova2: usize,
    /// Non-empty comma/semicolon separated items.
    pub item_count: usize,
    pub processing_markers: Vec<&'static str>,
    pub industrial_ingredients: Vec<&'static str>,
    pub nova3_terms: Vec<&'static str>,
    pub nova2_terms: Vec<&'static str>,
}

impl MarkerTally {
    pub fn is_empty(&self) -> bool {
        self.nova4 == 0 && self.nova3 == 0 && self.nova2 == 0
    }

    /// Only culinary-ingredient markers, in a list of exactly one item.
    pub fn is_single_culinary_ingredient(&self) -> bool {
        self.item_count == 1 && self.nova2 > 0 && self.nova3 == 0 && self.nova4 == 0
    }
}

/// Scan `text` for markers of every tier. Pure; empty input gives an empty tally.
pub fn match_markers(text: &str) -> MarkerTally {
    let norm = normalize(text);
    if norm.is_empty() {
        return MarkerTally::default();
    }

    let mut tally = MarkerTally {
        item_count: count_items(&norm),
        ..Default::default()
    };

    tally.nova4 += additives::count_codes(&norm);
    for rule in NOVA4_RULES.iter() {
        let hits = rule.re.find_iter(&norm).count();
        if hits == 0 {
            continue;
        }
        tally.nova4 += hits;
        match rule.kind {
            MarkerKind::Processing => tally.processing_markers.push(rule.label),
            MarkerKind::Industrial => tally.industrial_ingredients.push(rule.label),
        }
    }

    let mut masked = norm.clone();
    for rule in NOVA2_RULES.iter() {
        if rule.re.is_match(&masked) {
            tally.nova2 += 1;
            tally.nova2_terms.push(rule.label);
            masked = rule.re.replace_all(&masked, " ").into_owned();
        }
    }

    for rule in NOVA3_RULES.iter() {
        if rule.re.is_match(&masked) {
            tally.nova3 += 1;
            tally.nova3_terms.push(rule.label);
        }
    }

    tally
}

/// Lowercase (Unicode), fold typographic apostrophes, condense whitespace.
pub fn normalize(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut last_space = false;
    for ch in input.chars() {
        let ch = match ch {
            '\u{2019}' | '\u{2018}' | '`' | '\u{00b4}' => '\'',
            c => c,
        };
        if ch.is_whitespace() {
            if !last_space {
                out.push(' ');
                last_space = true;
            }
        } else {
            out.extend(ch.to_lowercase());
            last_space = false;
        }
    }
    out.trim().to_string()
}

fn count_items(norm: &str) -> usize {
    ITEM_SEP
        .split(norm)
        .filter(|item| !item.trim().is_empty())
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_whitespace_give_nothing() {
        assert!(match_markers("").is_empty());
        assert!(match_markers("  \t\n ").is_empty());
        assert_eq!(match_markers("   ").item_count, 0);
    }

    #[test]
    fn nova4_counts_every_occurrence() {
        let t = match_markers("colorant E150d, colorant E102, conservateur");
        // 2 E-codes + 2 colorant + 1 conservateur
        assert_eq!(t.nova4, 5);
        assert_eq!(t.processing_markers, vec!["colorant", "conservateur"]);
    }

    #[test]
    fn nova3_counts_presence_not_occurrences() {
        let t = match_markers("sucre, sucre de canne, sel, sel");
        assert_eq!(t.nova3, 2);
        assert_eq!(t.nova3_terms, vec!["sucre", "sel"]);
    }

    #[test]
    fn nova2_phrases_shadow_nova3_words() {
        let t = match_markers("Huile d’olive, SEL MARIN");
        assert_eq!(t.nova2, 2);
        assert_eq!(t.nova3, 0);
        assert_eq!(t.item_count, 2);
    }

    #[test]
    fn plain_salt_next_to_sea_salt_still_counts() {
        let t = match_markers("sel marin, sel");
        assert_eq!(t.nova2, 1);
        assert_eq!(t.nova3, 1);
    }

    #[test]
    fn word_boundaries_hold() {
        // "selle" is not "sel", "huileux" is not "huile".
        let t = match_markers("selle d'agneau, aspect huileux");
        assert_eq!(t.nova3, 0);
    }

    #[test]
    fn accents_are_optional_in_markers() {
        let t = match_markers("EMULSIFIANT: lécithine; exhausteur de gout");
        assert_eq!(t.nova4, 2);
    }

    #[test]
    fn industrial_ingredients_are_reported_separately() {
        let t = match_markers("sirop de glucose-fructose, huile de palme, maltodextrine");
        assert_eq!(t.nova4, 3);
        assert_eq!(
            t.industrial_ingredients,
            vec!["sirop de glucose-fructose", "huile de palme", "maltodextrine"]
        );
        assert!(t.processing_markers.is_empty());
    }

    #[test]
    fn single_culinary_ingredient() {
        assert!(match_markers("Miel 100% naturel").is_single_culinary_ingredient());
        assert!(!match_markers("miel, noix").is_single_culinary_ingredient());
    }

    #[test]
    fn normalize_condenses_and_lowercases() {
        assert_eq!(normalize("  Crème   FRAÎCHE\t"), "crème fraîche");
        assert_eq!(normalize("huile d’olive"), "huile d'olive");
    }
}
