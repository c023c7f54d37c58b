//! Escalation levels and the dice each one grants.
//!
//! A conflict opens with both actors talking. Either side may escalate to a
//! strictly higher level at any point; the first time an actor reaches a level
//! it receives that level's fixed bundle of dice.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::dice::{self, Die, DieKind};

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown escalation level: {0}")]
pub struct EscalationParseError(pub String);

/// How far a confrontation has gone. Ordered from least to most dangerous.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub enum EscalationLevel {
    #[default]
    Verbal,
    Physical,
    Violent,
    Lethal,
}

/// The dice granted on reaching a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grant {
    pub count: u32,
    pub kind: DieKind,
}

impl Grant {
    pub fn roll<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<Die> {
        dice::roll_many(self.count, self.kind, rng)
    }
}

impl fmt::Display for Grant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.count, self.kind)
    }
}

impl EscalationLevel {
    pub const ALL: [EscalationLevel; 4] = [
        EscalationLevel::Verbal,
        EscalationLevel::Physical,
        EscalationLevel::Violent,
        EscalationLevel::Lethal,
    ];

    /// Fixed grant table. Verbal is never granted mid-conflict since everyone
    /// starts there; its bundle doubles as the default opening pool.
    pub fn grant(&self) -> Grant {
        match self {
            EscalationLevel::Verbal => Grant {
                count: 2,
                kind: DieKind::Small,
            },
            EscalationLevel::Physical => Grant {
                count: 2,
                kind: DieKind::Medium,
            },
            EscalationLevel::Violent => Grant {
                count: 2,
                kind: DieKind::Large,
            },
            EscalationLevel::Lethal => Grant {
                count: 2,
                kind: DieKind::Huge,
            },
        }
    }

    /// Position in the total order, starting at 0.
    pub fn rank(&self) -> u8 {
        match self {
            EscalationLevel::Verbal => 0,
            EscalationLevel::Physical => 1,
            EscalationLevel::Violent => 2,
            EscalationLevel::Lethal => 3,
        }
    }

    pub fn next(&self) -> Option<EscalationLevel> {
        match self {
            EscalationLevel::Verbal => Some(EscalationLevel::Physical),
            EscalationLevel::Physical => Some(EscalationLevel::Violent),
            EscalationLevel::Violent => Some(EscalationLevel::Lethal),
            EscalationLevel::Lethal => None,
        }
    }

    /// True if moving from `self` to `target` is an escalation.
    pub fn escalates_to(&self, target: EscalationLevel) -> bool {
        target.rank() > self.rank()
    }

    /// Levels strictly above this one, lowest first.
    pub fn above(self) -> impl Iterator<Item = EscalationLevel> {
        Self::ALL.into_iter().filter(move |l| self.escalates_to(*l))
    }

    pub fn name(&self) -> &'static str {
        match self {
            EscalationLevel::Verbal => "Verbal",
            EscalationLevel::Physical => "Physical",
            EscalationLevel::Violent => "Violent",
            EscalationLevel::Lethal => "Lethal",
        }
    }
}

impl fmt::Display for EscalationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for EscalationLevel {
    type Err = EscalationParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "verbal" | "talk" => Ok(EscalationLevel::Verbal),
            "physical" => Ok(EscalationLevel::Physical),
            "violent" | "fight" => Ok(EscalationLevel::Violent),
            "lethal" | "deadly" => Ok(EscalationLevel::Lethal),
            other => Err(EscalationParseError(other.to_string())),
        }
    }
}

/// The conflict's "temperature": the higher of the two actors' levels.
pub fn highest(a: EscalationLevel, b: EscalationLevel) -> EscalationLevel {
    a.max(b)
}
