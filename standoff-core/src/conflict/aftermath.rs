use serde::{Deserialize, Serialize};

use super::{Outcome, ResolvedConflict};
use crate::escalation::EscalationLevel;
use crate::fallout::{FalloutResult, Severity};

/// What the character and NPC-memory layers need once a conflict is over.
///
/// The engine does not act on any of this; applying the condition penalty,
/// recording witnesses and minting traits is left to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aftermath {
    pub opponent_id: String,
    pub stakes: String,
    pub outcome: Outcome,
    pub protagonist_won: bool,
    pub fallout: FalloutResult,
    pub highest_level: EscalationLevel,
    /// Severity allows the character layer to attach a new trait.
    pub trait_eligible: bool,
    pub turns: usize,
}

impl Aftermath {
    pub fn from_resolved(resolved: &ResolvedConflict) -> Self {
        Self {
            opponent_id: resolved.opponent_id.clone(),
            stakes: resolved.stakes.clone(),
            outcome: resolved.outcome,
            protagonist_won: resolved.outcome.protagonist_won(),
            fallout: resolved.fallout.clone(),
            highest_level: resolved.highest_level(),
            trait_eligible: resolved.fallout.severity.generates_trait(),
            turns: resolved.log.len(),
        }
    }

    pub fn severity(&self) -> Severity {
        self.fallout.severity
    }

    /// One-line summary for logs and terminals.
    pub fn summary(&self) -> String {
        let fallout = match self.fallout.severity {
            Severity::None => "no fallout".to_string(),
            severity => format!("{} fallout ({})", severity, self.fallout.total),
        };
        format!(
            "{} over {}. {}, highest escalation {}.",
            self.outcome, self.stakes, fallout, self.highest_level
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolved(outcome: Outcome, fallout: FalloutResult) -> ResolvedConflict {
        ResolvedConflict {
            opponent_id: "sheriff".to_string(),
            stakes: "the stolen horse".to_string(),
            outcome,
            fallout,
            fallout_groups: Vec::new(),
            log: Vec::new(),
            protagonist_level: EscalationLevel::Physical,
            opponent_level: EscalationLevel::Violent,
        }
    }

    #[test]
    fn test_aftermath_from_resolved() {
        let fallout = FalloutResult {
            severity: Severity::Serious,
            rolled: vec![6, 4, 1],
            total: 10,
        };
        let aftermath = resolved(Outcome::OpponentYielded, fallout).aftermath();
        assert!(aftermath.protagonist_won);
        assert!(aftermath.trait_eligible);
        assert_eq!(aftermath.highest_level, EscalationLevel::Violent);
        assert!(aftermath.summary().contains("Serious fallout (10)"));
    }

    #[test]
    fn test_no_trait_without_fallout() {
        let aftermath = resolved(Outcome::ProtagonistYielded, FalloutResult::none()).aftermath();
        assert!(!aftermath.protagonist_won);
        assert!(!aftermath.trait_eligible);
        assert!(aftermath.summary().contains("no fallout"));
    }
}
