//! Bonus dice the protagonist can call on mid-conflict.
//!
//! Traits, items, relationships and convictions can each be invoked once per
//! conflict. The character layer decides what is eligible and rolls the dice;
//! the engine only tracks what has already been spent in this conflict.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::dice::{self, Die};

/// Where an invoked bonus comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InvocationSource {
    Trait,
    Item,
    Relationship,
    Conviction,
}

impl InvocationSource {
    pub fn name(&self) -> &'static str {
        match self {
            InvocationSource::Trait => "trait",
            InvocationSource::Item => "item",
            InvocationSource::Relationship => "relationship",
            InvocationSource::Conviction => "conviction",
        }
    }
}

impl fmt::Display for InvocationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown invocation source: {0}")]
pub struct InvocationSourceParseError(pub String);

impl FromStr for InvocationSource {
    type Err = InvocationSourceParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "trait" => Ok(InvocationSource::Trait),
            "item" | "gear" => Ok(InvocationSource::Item),
            "relationship" | "bond" => Ok(InvocationSource::Relationship),
            "conviction" | "belief" => Ok(InvocationSource::Conviction),
            other => Err(InvocationSourceParseError(other.to_string())),
        }
    }
}

/// A bonus payload handed over by the character layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invocation {
    pub source: InvocationSource,
    /// Stable id of the trait, item, NPC or conviction.
    pub source_id: String,
    pub dice: Vec<Die>,
}

impl Invocation {
    pub fn new(source: InvocationSource, source_id: impl Into<String>, dice: Vec<Die>) -> Self {
        Self {
            source,
            source_id: source_id.into(),
            dice,
        }
    }

    pub fn total(&self) -> u32 {
        dice::total(&self.dice)
    }
}

/// Per-conflict record of spent bonuses, one id set per source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsedInvocations {
    pub traits: HashSet<String>,
    pub items: HashSet<String>,
    pub relationships: HashSet<String>,
    pub convictions: HashSet<String>,
}

impl UsedInvocations {
    pub fn new() -> Self {
        Self::default()
    }

    fn set(&self, source: InvocationSource) -> &HashSet<String> {
        match source {
            InvocationSource::Trait => &self.traits,
            InvocationSource::Item => &self.items,
            InvocationSource::Relationship => &self.relationships,
            InvocationSource::Conviction => &self.convictions,
        }
    }

    fn set_mut(&mut self, source: InvocationSource) -> &mut HashSet<String> {
        match source {
            InvocationSource::Trait => &mut self.traits,
            InvocationSource::Item => &mut self.items,
            InvocationSource::Relationship => &mut self.relationships,
            InvocationSource::Conviction => &mut self.convictions,
        }
    }

    pub fn is_used(&self, source: InvocationSource, source_id: &str) -> bool {
        self.set(source).contains(source_id)
    }

    /// Record a spent bonus. Returns false if it was already spent.
    pub fn mark(&mut self, source: InvocationSource, source_id: &str) -> bool {
        self.set_mut(source).insert(source_id.to_string())
    }

    pub fn len(&self) -> usize {
        self.traits.len() + self.items.len() + self.relationships.len() + self.convictions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
