//! Confrontation engine for narrative games.
//!
//! This crate provides:
//! - A turn-based raise/match state machine for one confrontation
//! - Escalation levels that grant extra dice once per conflict
//! - Fallout rolled from every blow taken, graded into a severity
//! - A pure opponent decision function
//! - Once-per-conflict bonus dice from traits, items, relationships and convictions
//!
//! # Quick Start
//!
//! ```
//! use standoff_core::{Actor, ConflictSession, EngineConfig, PoolSpec};
//!
//! let mut session = ConflictSession::with_seed(EngineConfig::default(), 7);
//! let pool = PoolSpec::parse("3d6+1d8").unwrap();
//! session.start_rolled("sheriff", "the stolen horse", &pool, &pool);
//!
//! let conflict = session.active().unwrap();
//! let pair: Vec<_> = conflict.pool(Actor::Protagonist)[..2].iter().map(|d| d.id).collect();
//! assert!(session.raise(Actor::Protagonist, pair, "Give it back."));
//!
//! while session.state().is_active() {
//!     let Some(action) = session
//!         .npc_decision()
//!         .or_else(|| session.auto_decision(Actor::Protagonist))
//!     else {
//!         break;
//!     };
//!     session.dispatch(action);
//! }
//! println!("{}", session.aftermath().unwrap().summary());
//! ```

pub mod config;
pub mod conflict;
pub mod dice;
pub mod escalation;
pub mod fallout;
pub mod invocation;
pub mod npc;
pub mod session;
pub mod testing;

// Primary public API
pub use config::{ConfigError, EngineConfig};
pub use conflict::{
    Action, ActiveConflict, Actor, Aftermath, ConflictEngine, ConflictState, MatchKind, Outcome,
    Rejection, ResolvedConflict, Turn, TurnAction, TurnRecord,
};
pub use dice::{DiceError, Die, DieId, DieKind, PoolSpec, MAX_POOL_DICE};
pub use escalation::{EscalationLevel, EscalationParseError};
pub use fallout::{calculate_fallout, FalloutGroup, FalloutResult, FalloutThresholds, Severity};
pub use invocation::{Invocation, InvocationSource, InvocationSourceParseError};
pub use npc::NpcPolicy;
pub use session::ConflictSession;
