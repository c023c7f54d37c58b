//! Fallout: what taking the blow actually costs.
//!
//! Every time an actor covers an offer with three or more dice the offer's
//! dice are set aside as a [`FalloutGroup`]. When the conflict ends, each of
//! those dice is rolled again from scratch (the bid values are not reused),
//! the two highest fresh rolls are summed, and the sum is graded.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::dice::Die;
use crate::escalation::EscalationLevel;

/// The offer absorbed by a "took the blow" match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FalloutGroup {
    /// Dice of the offer that was taken.
    pub dice: Vec<Die>,
    /// The raiser's escalation level when the blow landed.
    pub level: EscalationLevel,
}

/// Graded consequence of a conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    None,
    Minor,
    Serious,
    Deadly,
    Death,
}

impl Severity {
    pub fn name(&self) -> &'static str {
        match self {
            Severity::None => "None",
            Severity::Minor => "Minor",
            Severity::Serious => "Serious",
            Severity::Deadly => "Deadly",
            Severity::Death => "Death",
        }
    }

    /// Whether the character layer may mint a new trait from this result.
    ///
    /// The calculator never does so itself; this only answers the question
    /// for whoever consumes the result.
    pub fn generates_trait(&self) -> bool {
        matches!(self, Severity::Minor | Severity::Serious | Severity::Deadly)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Lowest total that reaches each grade. Anything below `minor` is `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FalloutThresholds {
    pub minor: u32,
    pub serious: u32,
    pub deadly: u32,
    pub death: u32,
}

impl Default for FalloutThresholds {
    fn default() -> Self {
        Self {
            minor: 5,
            serious: 9,
            deadly: 13,
            death: 17,
        }
    }
}

impl FalloutThresholds {
    /// Bands must be non-empty and non-overlapping.
    pub fn is_strictly_increasing(&self) -> bool {
        0 < self.minor && self.minor < self.serious && self.serious < self.deadly && self.deadly < self.death
    }

    pub fn grade(&self, total: u32) -> Severity {
        if total >= self.death {
            Severity::Death
        } else if total >= self.deadly {
            Severity::Deadly
        } else if total >= self.serious {
            Severity::Serious
        } else if total >= self.minor {
            Severity::Minor
        } else {
            Severity::None
        }
    }
}

/// Outcome of the fallout roll. Built once, when a conflict resolves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FalloutResult {
    pub severity: Severity,
    /// Every fresh roll, in the order the dice were absorbed.
    pub rolled: Vec<u32>,
    /// Sum of the two highest rolls.
    pub total: u32,
}

impl FalloutResult {
    /// No blow was ever taken.
    pub fn none() -> Self {
        Self {
            severity: Severity::None,
            rolled: Vec::new(),
            total: 0,
        }
    }
}

/// Roll and grade the fallout for a finished conflict.
///
/// An empty group list returns [`FalloutResult::none`] without touching `rng`.
pub fn calculate_fallout<R: Rng + ?Sized>(
    groups: &[FalloutGroup],
    thresholds: &FalloutThresholds,
    rng: &mut R,
) -> FalloutResult {
    if groups.iter().all(|g| g.dice.is_empty()) {
        return FalloutResult::none();
    }

    let rolled: Vec<u32> = groups
        .iter()
        .flat_map(|g| g.dice.iter())
        .map(|die| die.kind.roll(rng))
        .collect();

    let mut sorted = rolled.clone();
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    let total: u32 = sorted.iter().take(2).sum();

    FalloutResult {
        severity: thresholds.grade(total),
        rolled,
        total,
    }
}
