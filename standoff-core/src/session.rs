//! ConflictSession - the high-level API for running one conflict at a time.
//!
//! Wraps a [`ConflictEngine`], a seeded RNG and the current [`ConflictState`]
//! so callers don't have to thread all three through every call. The state
//! machine underneath is unchanged: every method is a single reducer step.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::time::Duration;

use crate::conflict::{
    Action, ActiveConflict, Actor, Aftermath, ConflictEngine, ConflictState, Rejection,
    ResolvedConflict,
};
use crate::config::{ConfigError, EngineConfig};
use crate::dice::{Die, DieId, PoolSpec};
use crate::escalation::EscalationLevel;
use crate::invocation::Invocation;
use crate::npc;

/// A game session's view of the conflict currently on screen.
pub struct ConflictSession {
    engine: ConflictEngine,
    rng: ChaCha8Rng,
    state: ConflictState,
}

impl ConflictSession {
    /// Create a session seeded from the OS.
    pub fn new(config: EngineConfig) -> Self {
        Self::from_rng(config, ChaCha8Rng::from_entropy())
    }

    /// Create a reproducible session.
    pub fn with_seed(config: EngineConfig, seed: u64) -> Self {
        Self::from_rng(config, ChaCha8Rng::seed_from_u64(seed))
    }

    /// Check `config` first, then seed from `seed` or the OS.
    pub fn validated(config: EngineConfig, seed: Option<u64>) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(match seed {
            Some(seed) => Self::with_seed(config, seed),
            None => Self::new(config),
        })
    }

    fn from_rng(config: EngineConfig, rng: ChaCha8Rng) -> Self {
        Self {
            engine: ConflictEngine::new(config),
            rng,
            state: ConflictState::Inactive,
        }
    }

    pub fn engine(&self) -> &ConflictEngine {
        &self.engine
    }

    pub fn config(&self) -> &EngineConfig {
        self.engine.config()
    }

    pub fn state(&self) -> &ConflictState {
        &self.state
    }

    pub fn active(&self) -> Option<&ActiveConflict> {
        self.state.active()
    }

    pub fn resolved(&self) -> Option<&ResolvedConflict> {
        self.state.resolved()
    }

    /// How long the presentation should wait before applying an NPC move.
    pub fn thinking_delay(&self) -> Duration {
        Duration::from_millis(self.config().thinking_delay_ms)
    }

    /// Run one reducer step. Returns whether the action was accepted.
    pub fn dispatch(&mut self, action: Action) -> bool {
        self.engine.apply(&mut self.state, action, &mut self.rng)
    }

    /// Would `action` be accepted right now?
    pub fn check(&self, action: &Action) -> Result<(), Rejection> {
        self.engine.check(&self.state, action)
    }

    /// Roll a pool using the session's RNG.
    pub fn roll_pool(&mut self, spec: &PoolSpec) -> Vec<Die> {
        spec.roll(&mut self.rng)
    }

    pub fn start(
        &mut self,
        opponent_id: impl Into<String>,
        stakes: impl Into<String>,
        protagonist_pool: Vec<Die>,
        opponent_pool: Vec<Die>,
    ) -> bool {
        self.dispatch(Action::start(opponent_id, stakes, protagonist_pool, opponent_pool))
    }

    /// Roll both pools from notation and start.
    pub fn start_rolled(
        &mut self,
        opponent_id: impl Into<String>,
        stakes: impl Into<String>,
        protagonist: &PoolSpec,
        opponent: &PoolSpec,
    ) -> bool {
        let protagonist_pool = self.roll_pool(protagonist);
        let opponent_pool = self.roll_pool(opponent);
        self.start(opponent_id, stakes, protagonist_pool, opponent_pool)
    }

    pub fn raise(&mut self, actor: Actor, dice: Vec<DieId>, note: impl Into<String>) -> bool {
        self.dispatch(Action::raise(actor, dice, note))
    }

    pub fn match_offer(&mut self, actor: Actor, dice: Vec<DieId>, note: impl Into<String>) -> bool {
        self.dispatch(Action::match_offer(actor, dice, note))
    }

    pub fn escalate(&mut self, actor: Actor, level: EscalationLevel) -> bool {
        self.dispatch(Action::escalate(actor, level))
    }

    pub fn yield_conflict(&mut self, actor: Actor) -> bool {
        self.dispatch(Action::yield_by(actor))
    }

    pub fn invoke(&mut self, invocation: Invocation) -> bool {
        self.dispatch(Action::Invoke(invocation))
    }

    /// The opponent's next move under the configured policy.
    pub fn npc_decision(&mut self) -> Option<Action> {
        let policy = self.config().npc;
        npc::decide(&self.state, &policy, &mut self.rng)
    }

    /// The same heuristic applied to either side.
    pub fn auto_decision(&mut self, actor: Actor) -> Option<Action> {
        let policy = self.config().npc;
        let conflict = self.state.active()?;
        npc::decide_for(actor, conflict, &policy, &mut self.rng)
    }

    /// Decide and apply the opponent's move without any delay.
    ///
    /// Returns `None` when it isn't the opponent's turn.
    pub fn apply_npc_turn(&mut self) -> Option<Action> {
        let action = self.npc_decision()?;
        self.dispatch(action.clone()).then_some(action)
    }

    pub fn aftermath(&self) -> Option<Aftermath> {
        self.state.resolved().map(ResolvedConflict::aftermath)
    }

    /// Hand back a finished conflict and go inactive, ready for the next start.
    pub fn finish(&mut self) -> Option<ResolvedConflict> {
        match std::mem::take(&mut self.state) {
            ConflictState::Resolved(resolved) => Some(resolved),
            other => {
                self.state = other;
                None
            }
        }
    }

    /// Drop whatever is running. The engine holds nothing that needs cleanup.
    pub fn abandon(&mut self) {
        self.state = ConflictState::Inactive;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conflict::Turn;
    use crate::fallout::FalloutThresholds;
    use crate::testing::d6s;

    #[test]
    fn test_session_round() {
        let mut session = ConflictSession::with_seed(EngineConfig::default(), 11);
        assert!(session.start("gambler", "a marked deck", d6s(&[6, 5, 1]), d6s(&[3, 3])));

        let pool: Vec<DieId> = session.active().unwrap().protagonist.pool[..2]
            .iter()
            .map(|d| d.id)
            .collect();
        assert!(session.raise(Actor::Protagonist, pool, "call it"));

        // 3 + 3 cannot cover 11, so the NPC escalates or gives.
        let action = session.apply_npc_turn().expect("opponent acts");
        assert!(matches!(action, Action::Escalate { .. } | Action::Yield { .. }));
    }

    #[test]
    fn test_finish_only_takes_resolved() {
        let mut session = ConflictSession::with_seed(EngineConfig::default(), 3);
        assert!(session.finish().is_none());

        assert!(session.start("gambler", "", d6s(&[2, 2]), d6s(&[2, 2])));
        assert!(session.finish().is_none());
        assert_eq!(session.active().map(|c| c.turn), Some(Turn::ProtagonistRaise));

        assert!(session.yield_conflict(Actor::Protagonist));
        let resolved = session.finish().expect("resolved conflict");
        assert!(!resolved.outcome.protagonist_won());
        assert!(session.state().is_inactive());

        // A fresh conflict starts clean.
        assert!(session.start("gambler", "rematch", d6s(&[2, 2]), d6s(&[2, 2])));
        assert!(session.active().unwrap().used.is_empty());
    }

    #[test]
    fn test_validated_refuses_bad_config() {
        let thresholds = FalloutThresholds {
            minor: 9,
            serious: 5,
            deadly: 13,
            death: 17,
        };
        let config = EngineConfig::new().with_fallout_thresholds(thresholds);
        assert_eq!(
            ConflictSession::validated(config, Some(1)).err(),
            Some(ConfigError::Thresholds(thresholds))
        );
        let config = EngineConfig::new().with_escalate_chance(-0.1);
        assert_eq!(
            ConflictSession::validated(config, None).err(),
            Some(ConfigError::EscalateChance(-0.1))
        );

        let session = ConflictSession::validated(EngineConfig::default(), Some(8)).unwrap();
        assert!(session.state().is_inactive());
    }

    #[test]
    fn test_start_rolled_uses_seed() {
        let spec = PoolSpec::parse("2d6+1d8").unwrap();
        let mut a = ConflictSession::with_seed(EngineConfig::default(), 99);
        let mut b = ConflictSession::with_seed(EngineConfig::default(), 99);
        assert!(a.start_rolled("x", "y", &spec, &spec));
        assert!(b.start_rolled("x", "y", &spec, &spec));
        assert_eq!(a.state(), b.state());
    }
}
