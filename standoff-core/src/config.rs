//! Engine configuration.
//!
//! Everything here is a tuning knob rather than a rule: the conflict rules
//! themselves are fixed. Loaded from TOML by the binary, or built in code.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::fallout::FalloutThresholds;
use crate::npc::NpcPolicy;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("NPC escalate chance must be within 0.0..=1.0, got {0}")]
    EscalateChance(f64),
    #[error("Fallout thresholds must be positive and strictly increasing: {0:?}")]
    Thresholds(FalloutThresholds),
    #[error("Could not read config: {0}")]
    Parse(String),
}

/// Tunables for one engine instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub npc: NpcPolicy,
    pub fallout: FalloutThresholds,
    /// Pause before an NPC decision is applied. Only the presentation layer reads it.
    pub thinking_delay_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            npc: NpcPolicy::default(),
            fallout: FalloutThresholds::default(),
            thinking_delay_ms: 600,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the chance an NPC that can't cover a raise escalates rather than gives.
    pub fn with_escalate_chance(mut self, chance: f64) -> Self {
        self.npc.escalate_chance = chance;
        self
    }

    pub fn with_fallout_thresholds(mut self, thresholds: FalloutThresholds) -> Self {
        self.fallout = thresholds;
        self
    }

    pub fn with_thinking_delay_ms(mut self, delay_ms: u64) -> Self {
        self.thinking_delay_ms = delay_ms;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let chance = self.npc.escalate_chance;
        if !(0.0..=1.0).contains(&chance) {
            return Err(ConfigError::EscalateChance(chance));
        }
        if !self.fallout.is_strictly_increasing() {
            return Err(ConfigError::Thresholds(self.fallout));
        }
        Ok(())
    }
}
