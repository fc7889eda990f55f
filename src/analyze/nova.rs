// src/analyze/nova.rs
//! NOVA group assignment from matcher tallies.
//!
//! Ordered policy, first match wins, heaviest transformation dominates:
//! 1. any NOVA-4 marker                      → 4
//! 2. at least two NOVA-3 markers            → 3
//! 3. a NOVA-2 marker or one NOVA-3 marker   → 2
//!    (a one-item list made only of a culinary ingredient is that
//!    ingredient itself, e.g. "Miel 100% naturel" → 1)
//! 4. otherwise                              → 1

use serde::{Deserialize, Serialize};

use super::patterns::MarkerTally;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum NovaGroup {
    Unprocessed = 1,
    CulinaryIngredient = 2,
    Processed = 3,
    UltraProcessed = 4,
}

impl NovaGroup {
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn is_processed(self) -> bool {
        self >= NovaGroup::Processed
    }

    /// Score penalty subtracted from 100.
    pub fn penalty(self) -> i32 {
        match self {
            NovaGroup::UltraProcessed => 60,
            NovaGroup::Processed => 30,
            NovaGroup::CulinaryIngredient => 10,
            NovaGroup::Unprocessed => 0,
        }
    }
}

impl TryFrom<u8> for NovaGroup {
    type Error = String;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            1 => Ok(NovaGroup::Unprocessed),
            2 => Ok(NovaGroup::CulinaryIngredient),
            3 => Ok(NovaGroup::Processed),
            4 => Ok(NovaGroup::UltraProcessed),
            other => Err(format!("NOVA group must be 1..=4, got {other}")),
        }
    }
}

impl From<NovaGroup> for u8 {
    fn from(g: NovaGroup) -> u8 {
        g.as_u8()
    }
}

/// Never fails; degenerate tallies land in group 1.
pub fn classify(tally: &MarkerTally) -> NovaGroup {
    if tally.nova4 >= 1 {
        NovaGroup::UltraProcessed
    } else if tally.nova3 >= 2 {
        NovaGroup::Processed
    } else if tally.is_single_culinary_ingredient() {
        NovaGroup::Unprocessed
    } else if tally.nova2 >= 1 || tally.nova3 >= 1 {
        NovaGroup::CulinaryIngredient
    } else {
        NovaGroup::Unprocessed
    }
}
