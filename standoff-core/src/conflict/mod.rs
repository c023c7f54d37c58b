//! The conflict state machine.
//!
//! A conflict moves `Inactive → Active → Resolved`. While active, the two
//! actors alternate between raising (putting two dice forward) and matching
//! (covering the raise with one or more dice). Escalation and yielding can
//! happen at any point. Every state transition goes through
//! [`ConflictEngine::reduce`], which treats illegal actions as no-ops.

mod action;
mod aftermath;
mod engine;

pub use action::Action;
pub use aftermath::Aftermath;
pub use engine::{ConflictEngine, Rejection};

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::dice::{self, Die, DieId};
use crate::escalation::{self, EscalationLevel};
use crate::fallout::{FalloutGroup, FalloutResult};
use crate::invocation::UsedInvocations;

/// The two sides of a conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Actor {
    Protagonist,
    Opponent,
}

impl Actor {
    pub fn other(&self) -> Actor {
        match self {
            Actor::Protagonist => Actor::Opponent,
            Actor::Opponent => Actor::Protagonist,
        }
    }

    /// The turn in which this actor raises.
    pub fn raise_turn(&self) -> Turn {
        match self {
            Actor::Protagonist => Turn::ProtagonistRaise,
            Actor::Opponent => Turn::OpponentRaise,
        }
    }

    /// The turn in which this actor must answer a raise.
    pub fn match_turn(&self) -> Turn {
        match self {
            Actor::Protagonist => Turn::ProtagonistMatch,
            Actor::Opponent => Turn::OpponentMatch,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Actor::Protagonist => "Protagonist",
            Actor::Opponent => "Opponent",
        }
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Whose move it is, and what kind of move is expected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Turn {
    ProtagonistRaise,
    OpponentMatch,
    OpponentRaise,
    ProtagonistMatch,
}

impl Turn {
    pub fn actor(&self) -> Actor {
        match self {
            Turn::ProtagonistRaise | Turn::ProtagonistMatch => Actor::Protagonist,
            Turn::OpponentRaise | Turn::OpponentMatch => Actor::Opponent,
        }
    }

    pub fn is_raise(&self) -> bool {
        matches!(self, Turn::ProtagonistRaise | Turn::OpponentRaise)
    }

    pub fn is_match(&self) -> bool {
        !self.is_raise()
    }
}

/// Position of a record in the turn log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TurnId(pub u32);

impl fmt::Display for TurnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How a raise was covered, by number of dice used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchKind {
    /// One die: the raise is turned back on the raiser.
    Reversed,
    /// Two dice: blocked or dodged.
    Blocked,
    /// Three or more: the blow lands and leaves fallout.
    TookTheBlow,
}

impl MatchKind {
    pub fn from_count(count: usize) -> MatchKind {
        match count {
            0 | 1 => MatchKind::Reversed,
            2 => MatchKind::Blocked,
            _ => MatchKind::TookTheBlow,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            MatchKind::Reversed => "reversed the blow",
            MatchKind::Blocked => "blocked or dodged",
            MatchKind::TookTheBlow => "took the blow",
        }
    }
}

/// What a turn record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnAction {
    Raise,
    Match(MatchKind),
    Escalate {
        from: EscalationLevel,
        to: EscalationLevel,
        /// Number of dice granted into the actor's pool.
        granted: u32,
    },
    Yield,
}

impl TurnAction {
    pub fn label(&self) -> &'static str {
        match self {
            TurnAction::Raise => "raise",
            TurnAction::Match(_) => "match",
            TurnAction::Escalate { .. } => "escalate",
            TurnAction::Yield => "yield",
        }
    }
}

/// One entry of the append-only conflict log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnRecord {
    pub id: TurnId,
    pub actor: Actor,
    pub action: TurnAction,
    /// Dice committed by a raise or match. Empty for escalate and yield.
    pub dice: Vec<Die>,
    pub total: Option<u32>,
    pub note: String,
    /// The acting side's escalation level once this record was written.
    pub level: EscalationLevel,
}

/// The raise waiting to be answered.
///
/// The dice themselves stay with the raise record; this only points at it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingOffer {
    pub raise: TurnId,
    pub raiser: Actor,
    pub total: u32,
}

/// One actor's dice and escalation level.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Side {
    pub pool: Vec<Die>,
    pub level: EscalationLevel,
}

impl Side {
    pub fn new(pool: Vec<Die>) -> Self {
        Self {
            pool,
            level: EscalationLevel::Verbal,
        }
    }

    pub fn pool_total(&self) -> u32 {
        dice::total(&self.pool)
    }

    pub fn contains(&self, id: DieId) -> bool {
        self.pool.iter().any(|d| d.id == id)
    }
}

/// Everything a running conflict tracks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveConflict {
    pub opponent_id: String,
    pub stakes: String,
    pub protagonist: Side,
    pub opponent: Side,
    pub turn: Turn,
    pub pending: Option<PendingOffer>,
    pub log: Vec<TurnRecord>,
    pub fallout: Vec<FalloutGroup>,
    pub used: UsedInvocations,
}

impl ActiveConflict {
    pub(crate) fn new(
        opponent_id: String,
        stakes: String,
        protagonist_pool: Vec<Die>,
        opponent_pool: Vec<Die>,
    ) -> Self {
        Self {
            opponent_id,
            stakes,
            protagonist: Side::new(protagonist_pool),
            opponent: Side::new(opponent_pool),
            turn: Turn::ProtagonistRaise,
            pending: None,
            log: Vec::new(),
            fallout: Vec::new(),
            used: UsedInvocations::new(),
        }
    }

    pub fn side(&self, actor: Actor) -> &Side {
        match actor {
            Actor::Protagonist => &self.protagonist,
            Actor::Opponent => &self.opponent,
        }
    }

    pub(crate) fn side_mut(&mut self, actor: Actor) -> &mut Side {
        match actor {
            Actor::Protagonist => &mut self.protagonist,
            Actor::Opponent => &mut self.opponent,
        }
    }

    pub fn pool(&self, actor: Actor) -> &[Die] {
        &self.side(actor).pool
    }

    pub fn level(&self, actor: Actor) -> EscalationLevel {
        self.side(actor).level
    }

    /// Higher of the two sides' levels. Presentation only.
    pub fn highest_level(&self) -> EscalationLevel {
        escalation::highest(self.protagonist.level, self.opponent.level)
    }

    pub fn is_turn_of(&self, actor: Actor) -> bool {
        self.turn.actor() == actor
    }

    /// Dice of the pending raise, if there is one.
    pub fn pending_dice(&self) -> Option<&[Die]> {
        let offer = self.pending?;
        self.record(offer.raise).map(|r| r.dice.as_slice())
    }

    pub fn record(&self, id: TurnId) -> Option<&TurnRecord> {
        self.log.get(id.0 as usize).filter(|r| r.id == id)
    }

    /// Levels the actor could still escalate to.
    pub fn available_escalations(&self, actor: Actor) -> Vec<EscalationLevel> {
        self.level(actor).above().collect()
    }

    /// Whether a raise by `actor` would currently be accepted with some pair of dice.
    pub fn can_raise(&self, actor: Actor) -> bool {
        self.turn == actor.raise_turn() && self.pool(actor).len() >= 2
    }

    /// Whether `actor` holds dice enough to cover the pending raise right now.
    pub fn can_match(&self, actor: Actor) -> bool {
        match self.pending {
            Some(offer) if self.turn == actor.match_turn() => {
                dice::cheapest_cover(self.pool(actor), offer.total).is_some()
            }
            _ => false,
        }
    }

    /// Whether the protagonist may call on bonus dice right now.
    pub fn can_invoke(&self) -> bool {
        self.is_turn_of(Actor::Protagonist)
    }

    /// Whether `id` is held anywhere in this conflict.
    pub(crate) fn knows_die(&self, id: DieId) -> bool {
        self.protagonist.contains(id)
            || self.opponent.contains(id)
            || self.log.iter().any(|r| r.dice.iter().any(|d| d.id == id))
    }

    pub(crate) fn next_turn_id(&self) -> TurnId {
        TurnId(self.log.len() as u32)
    }
}

/// How a conflict ended, from the protagonist's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    ProtagonistYielded,
    /// The protagonist won.
    OpponentYielded,
}

impl Outcome {
    pub fn from_yielder(actor: Actor) -> Outcome {
        match actor {
            Actor::Protagonist => Outcome::ProtagonistYielded,
            Actor::Opponent => Outcome::OpponentYielded,
        }
    }

    pub fn winner(&self) -> Actor {
        match self {
            Outcome::ProtagonistYielded => Actor::Opponent,
            Outcome::OpponentYielded => Actor::Protagonist,
        }
    }

    pub fn protagonist_won(&self) -> bool {
        self.winner() == Actor::Protagonist
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::ProtagonistYielded => write!(f, "You gave"),
            Outcome::OpponentYielded => write!(f, "Your opponent gave"),
        }
    }
}

/// A finished conflict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedConflict {
    pub opponent_id: String,
    pub stakes: String,
    pub outcome: Outcome,
    pub fallout: FalloutResult,
    pub fallout_groups: Vec<FalloutGroup>,
    pub log: Vec<TurnRecord>,
    pub protagonist_level: EscalationLevel,
    pub opponent_level: EscalationLevel,
}

impl ResolvedConflict {
    pub fn highest_level(&self) -> EscalationLevel {
        escalation::highest(self.protagonist_level, self.opponent_level)
    }

    pub fn aftermath(&self) -> Aftermath {
        Aftermath::from_resolved(self)
    }
}

/// Lifecycle of one conflict.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConflictState {
    #[default]
    Inactive,
    Active(ActiveConflict),
    Resolved(ResolvedConflict),
}

impl ConflictState {
    pub fn is_inactive(&self) -> bool {
        matches!(self, ConflictState::Inactive)
    }

    pub fn is_active(&self) -> bool {
        matches!(self, ConflictState::Active(_))
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, ConflictState::Resolved(_))
    }

    pub fn active(&self) -> Option<&ActiveConflict> {
        match self {
            ConflictState::Active(conflict) => Some(conflict),
            _ => None,
        }
    }

    pub fn resolved(&self) -> Option<&ResolvedConflict> {
        match self {
            ConflictState::Resolved(resolved) => Some(resolved),
            _ => None,
        }
    }

    /// Turn log of an active or resolved conflict.
    pub fn log(&self) -> &[TurnRecord] {
        match self {
            ConflictState::Inactive => &[],
            ConflictState::Active(conflict) => &conflict.log,
            ConflictState::Resolved(resolved) => &resolved.log,
        }
    }
}
