//! Conflict dice.
//!
//! Every bid in a standoff is made with dice rolled up front. A die keeps the
//! value it was rolled with for its whole life; only its location changes
//! (an actor's pool, then the turn record it was committed to).
//!
//! Pools are usually described with a small notation, `2d6+1d8`, parsed by
//! [`PoolSpec`] and rolled with an injected RNG.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::{Builder, Uuid};

use crate::conflict::TurnId;

/// Error type for pool notation parsing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DiceError {
    #[error("Invalid pool notation: {0}")]
    InvalidNotation(String),
    #[error("Unsupported die size: d{0}")]
    UnsupportedDieSize(u32),
    #[error("No dice specified")]
    NoDice,
    #[error("Too many dice: {0} (a pool holds at most {MAX_POOL_DICE})")]
    TooManyDice(u64),
}

/// Largest pool a single description may roll.
pub const MAX_POOL_DICE: u32 = 40;

/// The four die kinds a conflict deals in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DieKind {
    /// d4
    Small,
    /// d6
    Medium,
    /// d8
    Large,
    /// d10
    Huge,
}

impl DieKind {
    pub fn sides(&self) -> u32 {
        match self {
            DieKind::Small => 4,
            DieKind::Medium => 6,
            DieKind::Large => 8,
            DieKind::Huge => 10,
        }
    }

    pub fn from_sides(sides: u32) -> Option<DieKind> {
        match sides {
            4 => Some(DieKind::Small),
            6 => Some(DieKind::Medium),
            8 => Some(DieKind::Large),
            10 => Some(DieKind::Huge),
            _ => None,
        }
    }

    /// Roll a face of this kind.
    pub fn roll<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        rng.gen_range(1..=self.sides())
    }
}

impl fmt::Display for DieKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "d{}", self.sides())
    }
}

/// Unique identifier for a die.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DieId(pub Uuid);

impl DieId {
    /// Draw a new id from `rng`, so seeded runs produce the same ids.
    pub fn from_rng<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self(Builder::from_random_bytes(rng.gen()).into_uuid())
    }
}

impl fmt::Display for DieId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The first block is plenty for a human picking dice at a prompt.
        let full = self.0.simple().to_string();
        write!(f, "{}", &full[..8])
    }
}

/// A single rolled die.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Die {
    pub id: DieId,
    pub kind: DieKind,
    pub value: u32,
    /// The turn this die was committed to, once it has left a pool.
    pub assignment: Option<TurnId>,
}

impl Die {
    /// Roll a fresh die of `kind`.
    pub fn roll<R: Rng + ?Sized>(kind: DieKind, rng: &mut R) -> Self {
        let id = DieId::from_rng(rng);
        Self {
            id,
            kind,
            value: kind.roll(rng),
            assignment: None,
        }
    }

    /// Build a die with a known face. Values outside the kind's range are clamped.
    pub fn with_value<R: Rng + ?Sized>(kind: DieKind, value: u32, rng: &mut R) -> Self {
        Self {
            id: DieId::from_rng(rng),
            kind,
            value: value.clamp(1, kind.sides()),
            assignment: None,
        }
    }

    pub(crate) fn committed_to(mut self, turn: TurnId) -> Self {
        self.assignment = Some(turn);
        self
    }
}

impl fmt::Display for Die {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={} [{}]", self.kind, self.value, self.id)
    }
}

/// Sum the faces of a set of dice.
pub fn total(dice: &[Die]) -> u32 {
    dice.iter().map(|d| d.value).sum()
}

/// Roll `count` dice of `kind`.
pub fn roll_many<R: Rng + ?Sized>(count: u32, kind: DieKind, rng: &mut R) -> Vec<Die> {
    (0..count).map(|_| Die::roll(kind, rng)).collect()
}

/// Fewest dice from `pool` whose faces reach `target`, highest first.
///
/// Greedy by descending value, which is optimal for the count. Always picks
/// at least one die. Returns `None` when the whole pool falls short.
pub fn cheapest_cover(pool: &[Die], target: u32) -> Option<Vec<DieId>> {
    let mut sorted: Vec<&Die> = pool.iter().collect();
    sorted.sort_by(|a, b| b.value.cmp(&a.value));

    let mut picked = Vec::new();
    let mut sum = 0;
    for die in sorted {
        picked.push(die.id);
        sum += die.value;
        if sum >= target {
            return Some(picked);
        }
    }
    None
}

/// A `count × kind` group inside a pool description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolComponent {
    pub count: u32,
    pub kind: DieKind,
}

/// A pool description such as `2d6+1d8`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSpec {
    pub components: Vec<PoolComponent>,
}

impl PoolSpec {
    pub fn new(components: Vec<PoolComponent>) -> Self {
        Self { components }
    }

    /// Parse pool notation. Components are joined with `+` or `,`.
    pub fn parse(notation: &str) -> Result<Self, DiceError> {
        let notation = notation.trim().to_lowercase();
        if notation.is_empty() {
            return Err(DiceError::NoDice);
        }

        let mut components = Vec::new();
        for part in notation.split(['+', ',']) {
            let part: String = part.chars().filter(|c| !c.is_whitespace()).collect();
            if part.is_empty() {
                continue;
            }
            components.push(Self::parse_component(&part)?);
        }

        let count = Self::count_of(&components);
        if count == 0 {
            return Err(DiceError::NoDice);
        }
        if count > u64::from(MAX_POOL_DICE) {
            return Err(DiceError::TooManyDice(count));
        }

        Ok(Self { components })
    }

    fn parse_component(s: &str) -> Result<PoolComponent, DiceError> {
        let d_pos = s
            .find('d')
            .ok_or_else(|| DiceError::InvalidNotation(s.to_string()))?;
        let count_str = &s[..d_pos];
        let sides_str = &s[d_pos + 1..];

        let count: u32 = if count_str.is_empty() {
            1
        } else {
            count_str
                .parse()
                .map_err(|_| DiceError::InvalidNotation(s.to_string()))?
        };

        let sides: u32 = sides_str
            .parse()
            .map_err(|_| DiceError::InvalidNotation(s.to_string()))?;

        let kind = DieKind::from_sides(sides).ok_or(DiceError::UnsupportedDieSize(sides))?;
        Ok(PoolComponent { count, kind })
    }

    fn count_of(components: &[PoolComponent]) -> u64 {
        components.iter().map(|c| u64::from(c.count)).sum()
    }

    /// Number of dice the pool will roll.
    pub fn dice_count(&self) -> u64 {
        Self::count_of(&self.components)
    }

    /// Roll the whole pool.
    pub fn roll<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<Die> {
        self.components
            .iter()
            .flat_map(|c| roll_many(c.count, c.kind, rng))
            .collect()
    }
}

impl FromStr for PoolSpec {
    type Err = DiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PoolSpec::parse(s)
    }
}

impl fmt::Display for PoolSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .components
            .iter()
            .map(|c| format!("{}{}", c.count, c.kind))
            .collect();
        write!(f, "{}", parts.join("+"))
    }
}
