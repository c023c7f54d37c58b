//! Opponent decision making.
//!
//! [`decide`] looks at an active conflict and picks the opponent's next
//! action. It does not touch the state; the caller feeds the returned action
//! back through the engine, after whatever pause the presentation wants.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::conflict::{Action, ActiveConflict, Actor, ConflictState};
use crate::dice::{self, Die, DieId};

/// Tunables for the decision heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NpcPolicy {
    /// Chance of escalating instead of giving when a raise can't be covered.
    pub escalate_chance: f64,
}

impl Default for NpcPolicy {
    fn default() -> Self {
        Self {
            escalate_chance: 0.5,
        }
    }
}

impl NpcPolicy {
    pub fn new(escalate_chance: f64) -> Self {
        Self { escalate_chance }
    }

    /// An NPC that never gives while it still has a level to climb.
    pub fn stubborn() -> Self {
        Self::new(1.0)
    }

    /// An NPC that gives the moment it can't cover a raise.
    pub fn meek() -> Self {
        Self::new(0.0)
    }

    fn clamped_chance(&self) -> f64 {
        if self.escalate_chance.is_nan() {
            0.0
        } else {
            self.escalate_chance.clamp(0.0, 1.0)
        }
    }
}

/// The opponent's move, or `None` if it isn't the opponent's turn.
pub fn decide<R: Rng + ?Sized>(
    state: &ConflictState,
    policy: &NpcPolicy,
    rng: &mut R,
) -> Option<Action> {
    decide_for(Actor::Opponent, state.active()?, policy, rng)
}

/// Same heuristic for either side. Used to auto-play the protagonist as well.
pub fn decide_for<R: Rng + ?Sized>(
    actor: Actor,
    conflict: &ActiveConflict,
    policy: &NpcPolicy,
    rng: &mut R,
) -> Option<Action> {
    if !conflict.is_turn_of(actor) {
        return None;
    }

    let pool = conflict.pool(actor);
    let action = if conflict.turn.is_raise() {
        match strongest_pair(pool) {
            Some(pair) => {
                let note = describe(pool, &pair, "presses with");
                Action::raise(actor, pair, note)
            }
            None => Action::yield_by(actor),
        }
    } else {
        let target = conflict.pending.map(|offer| offer.total).unwrap_or(0);
        match dice::cheapest_cover(pool, target) {
            Some(cover) => {
                let note = describe(pool, &cover, "answers with");
                Action::match_offer(actor, cover, note)
            }
            None => match conflict.level(actor).next() {
                Some(level) if rng.gen_bool(policy.clamped_chance()) => {
                    Action::escalate(actor, level)
                }
                _ => Action::yield_by(actor),
            },
        }
    };

    trace!(%actor, decision = action.name(), "npc decision");
    Some(action)
}

/// The two highest dice, if the pool holds two.
fn strongest_pair(pool: &[Die]) -> Option<Vec<DieId>> {
    if pool.len() < 2 {
        return None;
    }
    let mut sorted: Vec<&Die> = pool.iter().collect();
    sorted.sort_by(|a, b| b.value.cmp(&a.value));
    Some(sorted.iter().take(2).map(|d| d.id).collect())
}

fn describe(pool: &[Die], ids: &[DieId], verb: &str) -> String {
    let faces: Vec<String> = ids
        .iter()
        .filter_map(|id| pool.iter().find(|d| d.id == *id))
        .map(|d| format!("{}={}", d.kind, d.value))
        .collect();
    format!("{verb} {}", faces.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conflict::{ConflictEngine, Turn};
    use crate::dice::DieKind;
    use crate::escalation::EscalationLevel;
    use crate::testing::{fixed_dice, ids};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    /// Start a conflict and have the protagonist raise with their first two dice.
    fn facing_raise(
        protagonist: &[(DieKind, u32)],
        opponent: &[(DieKind, u32)],
    ) -> (ConflictEngine, ConflictState) {
        let engine = ConflictEngine::default();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let state = engine.reduce(
            ConflictState::Inactive,
            Action::start("drifter", "water rights", fixed_dice(protagonist), fixed_dice(opponent)),
            &mut rng,
        );
        let raise = ids(&state.active().unwrap().protagonist.pool[..2]);
        let state = engine.reduce(state, Action::raise(Actor::Protagonist, raise, ""), &mut rng);
        (engine, state)
    }

    #[test]
    fn test_no_decision_on_protagonist_turn() {
        let engine = ConflictEngine::default();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let state = engine.reduce(
            ConflictState::Inactive,
            Action::start("drifter", "", fixed_dice(&[(DieKind::Medium, 3)]), Vec::new()),
            &mut rng,
        );
        assert_eq!(decide(&state, &NpcPolicy::default(), &mut rng), None);
        assert_eq!(decide(&ConflictState::Inactive, &NpcPolicy::default(), &mut rng), None);
    }

    #[test]
    fn test_matches_with_fewest_dice() {
        let (_, state) = facing_raise(
            &[(DieKind::Medium, 4), (DieKind::Medium, 3)],
            &[(DieKind::Small, 2), (DieKind::Large, 6), (DieKind::Medium, 1), (DieKind::Small, 4)],
        );
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let Some(Action::Match { actor, dice, .. }) = decide(&state, &NpcPolicy::default(), &mut rng)
        else {
            panic!("expected a match");
        };
        assert_eq!(actor, Actor::Opponent);
        let pool = state.active().unwrap().pool(Actor::Opponent);
        assert_eq!(dice, vec![pool[1].id, pool[3].id]);
    }

    #[test]
    fn test_uncoverable_raise_escalates_or_yields_by_policy() {
        let (_, state) = facing_raise(
            &[(DieKind::Medium, 4), (DieKind::Medium, 3), (DieKind::Large, 5)],
            &[(DieKind::Medium, 2), (DieKind::Medium, 4)],
        );
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        assert_eq!(
            decide(&state, &NpcPolicy::stubborn(), &mut rng),
            Some(Action::escalate(Actor::Opponent, EscalationLevel::Physical))
        );
        assert_eq!(
            decide(&state, &NpcPolicy::meek(), &mut rng),
            Some(Action::yield_by(Actor::Opponent))
        );
    }

    #[test]
    fn test_nothing_left_to_climb_at_lethal() {
        let (engine, state) = facing_raise(
            &[(DieKind::Huge, 10), (DieKind::Huge, 10)],
            &[(DieKind::Small, 1)],
        );
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let state = engine.reduce(state, Action::escalate(Actor::Opponent, EscalationLevel::Lethal), &mut rng);

        let conflict = state.active().unwrap();
        let decision = decide(&state, &NpcPolicy::stubborn(), &mut rng);
        match dice::cheapest_cover(conflict.pool(Actor::Opponent), 20) {
            Some(_) => assert!(matches!(decision, Some(Action::Match { .. }))),
            None => assert_eq!(decision, Some(Action::yield_by(Actor::Opponent))),
        }
    }

    #[test]
    fn test_raises_with_strongest_pair() {
        let (engine, state) = facing_raise(
            &[(DieKind::Medium, 2), (DieKind::Medium, 1)],
            &[(DieKind::Small, 3), (DieKind::Large, 7), (DieKind::Medium, 5)],
        );
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let cover = decide(&state, &NpcPolicy::default(), &mut rng).unwrap();
        let state = engine.reduce(state, cover, &mut rng);
        assert_eq!(state.active().unwrap().turn, Turn::OpponentRaise);

        let Some(Action::Raise { dice, .. }) = decide(&state, &NpcPolicy::default(), &mut rng) else {
            panic!("expected a raise");
        };
        let pool = state.active().unwrap().pool(Actor::Opponent);
        let mut values: Vec<u32> = dice
            .iter()
            .filter_map(|id| pool.iter().find(|d| d.id == *id))
            .map(|d| d.value)
            .collect();
        values.sort_unstable();
        assert_eq!(values, vec![3, 5]);
    }

    #[test]
    fn test_yields_when_it_cannot_raise() {
        let (engine, state) = facing_raise(
            &[(DieKind::Medium, 2), (DieKind::Medium, 1)],
            &[(DieKind::Large, 8)],
        );
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let cover = decide(&state, &NpcPolicy::default(), &mut rng).unwrap();
        let state = engine.reduce(state, cover, &mut rng);
        assert_eq!(
            decide(&state, &NpcPolicy::stubborn(), &mut rng),
            Some(Action::yield_by(Actor::Opponent))
        );
    }
}
