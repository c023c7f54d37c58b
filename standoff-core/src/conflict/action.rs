use serde::{Deserialize, Serialize};

use super::Actor;
use crate::dice::{Die, DieId};
use crate::escalation::EscalationLevel;
use crate::invocation::Invocation;

/// Everything a caller can ask the engine to do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    /// Open a conflict. Only valid while inactive.
    Start {
        opponent_id: String,
        stakes: String,
        protagonist_pool: Vec<Die>,
        opponent_pool: Vec<Die>,
    },

    /// Put exactly two dice forward.
    Raise {
        actor: Actor,
        dice: Vec<DieId>,
        note: String,
    },

    /// Cover the pending raise with one or more dice.
    Match {
        actor: Actor,
        dice: Vec<DieId>,
        note: String,
    },

    /// Move to a strictly higher level and take its dice.
    Escalate { actor: Actor, level: EscalationLevel },

    /// Give. Ends the conflict.
    Yield { actor: Actor },

    /// Add bonus dice to the protagonist's pool.
    Invoke(Invocation),
}

impl Action {
    pub fn start(
        opponent_id: impl Into<String>,
        stakes: impl Into<String>,
        protagonist_pool: Vec<Die>,
        opponent_pool: Vec<Die>,
    ) -> Self {
        Action::Start {
            opponent_id: opponent_id.into(),
            stakes: stakes.into(),
            protagonist_pool,
            opponent_pool,
        }
    }

    pub fn raise(actor: Actor, dice: Vec<DieId>, note: impl Into<String>) -> Self {
        Action::Raise {
            actor,
            dice,
            note: note.into(),
        }
    }

    pub fn match_offer(actor: Actor, dice: Vec<DieId>, note: impl Into<String>) -> Self {
        Action::Match {
            actor,
            dice,
            note: note.into(),
        }
    }

    pub fn escalate(actor: Actor, level: EscalationLevel) -> Self {
        Action::Escalate { actor, level }
    }

    pub fn yield_by(actor: Actor) -> Self {
        Action::Yield { actor }
    }

    /// The side taking the action, if the action has one.
    pub fn actor(&self) -> Option<Actor> {
        match self {
            Action::Start { .. } => None,
            Action::Raise { actor, .. }
            | Action::Match { actor, .. }
            | Action::Escalate { actor, .. }
            | Action::Yield { actor } => Some(*actor),
            Action::Invoke(_) => Some(Actor::Protagonist),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Action::Start { .. } => "start",
            Action::Raise { .. } => "raise",
            Action::Match { .. } => "match",
            Action::Escalate { .. } => "escalate",
            Action::Yield { .. } => "yield",
            Action::Invoke(_) => "invoke",
        }
    }
}
