use rand::Rng;
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, info, trace};

use super::{
    Action, ActiveConflict, Actor, ConflictState, MatchKind, Outcome, PendingOffer,
    ResolvedConflict, Turn, TurnAction, TurnId, TurnRecord,
};
use crate::config::EngineConfig;
use crate::dice::{self, Die, DieId};
use crate::escalation::EscalationLevel;
use crate::fallout::{calculate_fallout, FalloutGroup};
use crate::invocation::{Invocation, InvocationSource};

/// Why an action was turned away.
///
/// The engine never surfaces this from [`ConflictEngine::reduce`]; a rejected
/// action leaves the state untouched. It exists for logging and for UI code
/// that wants to grey out a button via [`ConflictEngine::check`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    NotStarted,
    AlreadyActive,
    AlreadyResolved,
    WrongTurn { actor: Actor, turn: Turn },
    RaiseNeedsTwoDice { got: usize },
    MatchNeedsDice,
    UnknownDie(DieId),
    DuplicateDie(DieId),
    NoPendingOffer,
    ShortMatch { offered: u32, matched: u32 },
    NotAnEscalation { from: EscalationLevel, to: EscalationLevel },
    EmptyInvocation,
    InvocationUsed { source: InvocationSource, source_id: String },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::NotStarted => write!(f, "no conflict is running"),
            Rejection::AlreadyActive => write!(f, "a conflict is already running"),
            Rejection::AlreadyResolved => write!(f, "the conflict is over"),
            Rejection::WrongTurn { actor, turn } => {
                write!(f, "{actor} cannot act that way during {turn:?}")
            }
            Rejection::RaiseNeedsTwoDice { got } => {
                write!(f, "a raise takes exactly two dice, got {got}")
            }
            Rejection::MatchNeedsDice => write!(f, "a match takes at least one die"),
            Rejection::UnknownDie(id) => write!(f, "die {id} is not available"),
            Rejection::DuplicateDie(id) => write!(f, "die {id} was named twice"),
            Rejection::NoPendingOffer => write!(f, "there is no raise to match"),
            Rejection::ShortMatch { offered, matched } => {
                write!(f, "{matched} does not cover a raise of {offered}")
            }
            Rejection::NotAnEscalation { from, to } => {
                write!(f, "{to} is not above {from}")
            }
            Rejection::EmptyInvocation => write!(f, "invocation carries no dice"),
            Rejection::InvocationUsed { source, source_id } => {
                write!(f, "{source} '{source_id}' was already invoked this conflict")
            }
        }
    }
}

/// Applies actions to conflict state.
///
/// Every transition is total: an action that fails its phase, turn or dice
/// guards returns the state exactly as it came in.
#[derive(Debug, Clone, Default)]
pub struct ConflictEngine {
    config: EngineConfig,
}

impl ConflictEngine {
    /// Callers hand over a validated config; see [`EngineConfig::validate`].
    pub fn new(config: EngineConfig) -> Self {
        debug_assert!(
            config.validate().is_ok(),
            "engine built from an invalid config: {config:?}"
        );
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// `(state, action) → state`. Illegal actions are the identity.
    pub fn reduce<R: Rng + ?Sized>(
        &self,
        mut state: ConflictState,
        action: Action,
        rng: &mut R,
    ) -> ConflictState {
        self.apply(&mut state, action, rng);
        state
    }

    /// In-place form of [`reduce`](Self::reduce). Returns whether the action was accepted.
    pub fn apply<R: Rng + ?Sized>(
        &self,
        state: &mut ConflictState,
        action: Action,
        rng: &mut R,
    ) -> bool {
        match self.check(state, &action) {
            Ok(()) => {
                self.commit(state, action, rng);
                true
            }
            Err(reason) => {
                debug!(action = action.name(), %reason, "rejected conflict action");
                false
            }
        }
    }

    /// Run every guard for `action` without changing anything.
    pub fn check(&self, state: &ConflictState, action: &Action) -> Result<(), Rejection> {
        let conflict = match (state, action) {
            (
                ConflictState::Inactive,
                Action::Start {
                    protagonist_pool,
                    opponent_pool,
                    ..
                },
            ) => return check_distinct(protagonist_pool.iter().chain(opponent_pool).map(|d| d.id)),
            (ConflictState::Inactive, _) => return Err(Rejection::NotStarted),
            (ConflictState::Resolved(_), _) => return Err(Rejection::AlreadyResolved),
            (ConflictState::Active(_), Action::Start { .. }) => {
                return Err(Rejection::AlreadyActive)
            }
            (ConflictState::Active(conflict), _) => conflict,
        };

        match action {
            Action::Start { .. } => Err(Rejection::AlreadyActive),
            Action::Raise { actor, dice, .. } => check_raise(conflict, *actor, dice),
            Action::Match { actor, dice, .. } => check_match(conflict, *actor, dice),
            Action::Escalate { actor, level } => {
                let from = conflict.level(*actor);
                if from.escalates_to(*level) {
                    Ok(())
                } else {
                    Err(Rejection::NotAnEscalation { from, to: *level })
                }
            }
            Action::Yield { .. } => Ok(()),
            Action::Invoke(invocation) => check_invoke(conflict, invocation),
        }
    }

    fn commit<R: Rng + ?Sized>(&self, state: &mut ConflictState, action: Action, rng: &mut R) {
        match action {
            Action::Start {
                opponent_id,
                stakes,
                protagonist_pool,
                opponent_pool,
            } => {
                info!(
                    opponent = %opponent_id,
                    protagonist_dice = protagonist_pool.len(),
                    opponent_dice = opponent_pool.len(),
                    "conflict started"
                );
                *state = ConflictState::Active(ActiveConflict::new(
                    opponent_id,
                    stakes,
                    unassigned(protagonist_pool),
                    unassigned(opponent_pool),
                ));
            }
            Action::Yield { actor } => {
                if let ConflictState::Active(conflict) = std::mem::take(state) {
                    *state = ConflictState::Resolved(self.resolve(conflict, actor, rng));
                }
            }
            action => {
                let ConflictState::Active(conflict) = state else {
                    return;
                };
                match action {
                    Action::Raise { actor, dice, note } => commit_raise(conflict, actor, &dice, note),
                    Action::Match { actor, dice, note } => commit_match(conflict, actor, &dice, note),
                    Action::Escalate { actor, level } => commit_escalate(conflict, actor, level, rng),
                    Action::Invoke(invocation) => commit_invoke(conflict, invocation),
                    Action::Start { .. } | Action::Yield { .. } => {}
                }
            }
        }
    }

    fn resolve<R: Rng + ?Sized>(
        &self,
        mut conflict: ActiveConflict,
        actor: Actor,
        rng: &mut R,
    ) -> ResolvedConflict {
        let id = conflict.next_turn_id();
        let level = conflict.level(actor);
        conflict.log.push(TurnRecord {
            id,
            actor,
            action: TurnAction::Yield,
            dice: Vec::new(),
            total: None,
            note: format!("{actor} gives"),
            level,
        });

        let fallout = calculate_fallout(&conflict.fallout, &self.config.fallout, rng);
        let outcome = Outcome::from_yielder(actor);
        info!(
            opponent = %conflict.opponent_id,
            ?outcome,
            severity = %fallout.severity,
            fallout_total = fallout.total,
            turns = conflict.log.len(),
            "conflict resolved"
        );

        ResolvedConflict {
            opponent_id: conflict.opponent_id,
            stakes: conflict.stakes,
            outcome,
            fallout,
            fallout_groups: conflict.fallout,
            log: conflict.log,
            protagonist_level: conflict.protagonist.level,
            opponent_level: conflict.opponent.level,
        }
    }
}

fn unassigned(pool: Vec<Die>) -> Vec<Die> {
    pool.into_iter()
        .map(|mut die| {
            die.assignment = None;
            die
        })
        .collect()
}

fn check_distinct(ids: impl IntoIterator<Item = DieId>) -> Result<(), Rejection> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(Rejection::DuplicateDie(id));
        }
    }
    Ok(())
}

/// Confirm every id is distinct and in `pool`. Returns their combined face value.
fn select(pool: &[Die], ids: &[DieId]) -> Result<u32, Rejection> {
    check_distinct(ids.iter().copied())?;
    ids.iter().try_fold(0, |sum, id| {
        pool.iter()
            .find(|d| d.id == *id)
            .map(|d| sum + d.value)
            .ok_or(Rejection::UnknownDie(*id))
    })
}

fn check_turn(conflict: &ActiveConflict, actor: Actor, expected: Turn) -> Result<(), Rejection> {
    if conflict.turn == expected {
        Ok(())
    } else {
        Err(Rejection::WrongTurn {
            actor,
            turn: conflict.turn,
        })
    }
}

fn check_raise(conflict: &ActiveConflict, actor: Actor, ids: &[DieId]) -> Result<(), Rejection> {
    check_turn(conflict, actor, actor.raise_turn())?;
    if ids.len() != 2 {
        return Err(Rejection::RaiseNeedsTwoDice { got: ids.len() });
    }
    select(conflict.pool(actor), ids).map(|_| ())
}

fn check_match(conflict: &ActiveConflict, actor: Actor, ids: &[DieId]) -> Result<(), Rejection> {
    check_turn(conflict, actor, actor.match_turn())?;
    let offer = conflict.pending.ok_or(Rejection::NoPendingOffer)?;
    if ids.is_empty() {
        return Err(Rejection::MatchNeedsDice);
    }
    let matched = select(conflict.pool(actor), ids)?;
    if matched < offer.total {
        return Err(Rejection::ShortMatch {
            offered: offer.total,
            matched,
        });
    }
    Ok(())
}

fn check_invoke(conflict: &ActiveConflict, invocation: &Invocation) -> Result<(), Rejection> {
    if !conflict.can_invoke() {
        return Err(Rejection::WrongTurn {
            actor: Actor::Protagonist,
            turn: conflict.turn,
        });
    }
    if invocation.dice.is_empty() {
        return Err(Rejection::EmptyInvocation);
    }
    if conflict.used.is_used(invocation.source, &invocation.source_id) {
        return Err(Rejection::InvocationUsed {
            source: invocation.source,
            source_id: invocation.source_id.clone(),
        });
    }
    check_distinct(invocation.dice.iter().map(|d| d.id))?;
    match invocation.dice.iter().find(|d| conflict.knows_die(d.id)) {
        Some(die) => Err(Rejection::DuplicateDie(die.id)),
        None => Ok(()),
    }
}

/// Pull `ids` out of `pool` in the order named, tagging them with `turn`.
fn take_dice(pool: &mut Vec<Die>, ids: &[DieId], turn: TurnId) -> Vec<Die> {
    let mut taken = Vec::with_capacity(ids.len());
    for id in ids {
        if let Some(pos) = pool.iter().position(|d| d.id == *id) {
            taken.push(pool.remove(pos).committed_to(turn));
        }
    }
    taken
}

fn commit_raise(conflict: &mut ActiveConflict, actor: Actor, ids: &[DieId], note: String) {
    let id = conflict.next_turn_id();
    let side = conflict.side_mut(actor);
    let dice = take_dice(&mut side.pool, ids, id);
    let level = side.level;
    let total = dice::total(&dice);

    trace!(%actor, total, turn = %id, "raise");
    conflict.log.push(TurnRecord {
        id,
        actor,
        action: TurnAction::Raise,
        dice,
        total: Some(total),
        note,
        level,
    });
    conflict.pending = Some(PendingOffer {
        raise: id,
        raiser: actor,
        total,
    });
    conflict.turn = actor.other().match_turn();
}

fn commit_match(conflict: &mut ActiveConflict, actor: Actor, ids: &[DieId], note: String) {
    let Some(offer) = conflict.pending.take() else {
        return;
    };
    let id = conflict.next_turn_id();
    let kind = MatchKind::from_count(ids.len());
    let side = conflict.side_mut(actor);
    let dice = take_dice(&mut side.pool, ids, id);
    let level = side.level;
    let total = dice::total(&dice);

    if kind == MatchKind::TookTheBlow {
        let offered = conflict
            .record(offer.raise)
            .map(|r| r.dice.clone())
            .unwrap_or_default();
        let raiser_level = conflict.level(actor.other());
        trace!(%actor, dice = offered.len(), level = %raiser_level, "fallout group added");
        conflict.fallout.push(FalloutGroup {
            dice: offered,
            level: raiser_level,
        });
    }

    trace!(%actor, total, offered = offer.total, ?kind, turn = %id, "match");
    conflict.log.push(TurnRecord {
        id,
        actor,
        action: TurnAction::Match(kind),
        dice,
        total: Some(total),
        note,
        level,
    });
    conflict.turn = actor.raise_turn();
}

fn commit_escalate<R: Rng + ?Sized>(
    conflict: &mut ActiveConflict,
    actor: Actor,
    level: EscalationLevel,
    rng: &mut R,
) {
    let id = conflict.next_turn_id();
    let grant = level.grant();
    let side = conflict.side_mut(actor);
    let from = side.level;
    side.pool.extend(grant.roll(rng));
    side.level = level;

    trace!(%actor, %from, to = %level, %grant, "escalate");
    conflict.log.push(TurnRecord {
        id,
        actor,
        action: TurnAction::Escalate {
            from,
            to: level,
            granted: grant.count,
        },
        dice: Vec::new(),
        total: None,
        note: format!("{actor} escalates to {level} (+{grant})"),
        level,
    });
}

fn commit_invoke(conflict: &mut ActiveConflict, invocation: Invocation) {
    conflict
        .used
        .mark(invocation.source, &invocation.source_id);
    trace!(
        source = %invocation.source,
        source_id = %invocation.source_id,
        dice = invocation.dice.len(),
        "invocation"
    );
    conflict
        .protagonist
        .pool
        .extend(unassigned(invocation.dice));
}
