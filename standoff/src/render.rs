//! Plain-text rendering of conflict state for the headless driver.

use standoff_core::{
    Action, ActiveConflict, Actor, Aftermath, Die, DieId, TurnAction, TurnRecord,
};

/// One pool, numbered from 1 so a player can pick dice by position.
pub fn pool_line(pool: &[Die]) -> String {
    if pool.is_empty() {
        return "(empty)".to_string();
    }
    pool.iter()
        .enumerate()
        .map(|(i, die)| format!("{}:{}", i + 1, die))
        .collect::<Vec<_>>()
        .join("  ")
}

pub fn status_lines(conflict: &ActiveConflict) -> Vec<String> {
    let mut lines = vec![
        format!("  Opponent: {}", conflict.opponent_id),
        format!("  Stakes: {}", conflict.stakes),
        format!("  Turn: {:?}", conflict.turn),
    ];
    if let Some(offer) = conflict.pending {
        lines.push(format!("  To match: {} (raised by {})", offer.total, offer.raiser));
    }
    for actor in [Actor::Protagonist, Actor::Opponent] {
        lines.push(format!(
            "  {} [{}]: {}",
            actor,
            conflict.level(actor),
            pool_line(conflict.pool(actor))
        ));
    }
    let escalations = conflict.available_escalations(Actor::Protagonist);
    if !escalations.is_empty() {
        let names: Vec<&str> = escalations.iter().map(|l| l.name()).collect();
        lines.push(format!("  Can escalate to: {}", names.join(", ")));
    }
    if !conflict.fallout.is_empty() {
        lines.push(format!("  Blows taken: {}", conflict.fallout.len()));
    }
    lines
}

/// Describe a turn record as it lands in the log.
pub fn record_line(record: &TurnRecord) -> String {
    let dice = record
        .dice
        .iter()
        .map(|d| format!("{}={}", d.kind, d.value))
        .collect::<Vec<_>>()
        .join(" + ");
    match record.action {
        TurnAction::Raise => format!(
            "{} raises {} = {}",
            record.actor,
            dice,
            record.total.unwrap_or(0)
        ),
        TurnAction::Match(kind) => format!(
            "{} matches with {} = {} ({})",
            record.actor,
            dice,
            record.total.unwrap_or(0),
            kind.description()
        ),
        TurnAction::Escalate { from, to, granted } => format!(
            "{} escalates {} -> {} (+{} dice)",
            record.actor, from, to, granted
        ),
        TurnAction::Yield => format!("{} gives", record.actor),
    }
}

/// Short label for an action before the engine has seen it.
pub fn action_line(action: &Action) -> String {
    match action {
        Action::Start { opponent_id, .. } => format!("start against {opponent_id}"),
        Action::Raise { actor, dice, .. } => format!("{actor} raises with {}", ids(dice)),
        Action::Match { actor, dice, .. } => format!("{actor} matches with {}", ids(dice)),
        Action::Escalate { actor, level } => format!("{actor} escalates to {level}"),
        Action::Yield { actor } => format!("{actor} gives"),
        Action::Invoke(invocation) => format!(
            "invoke {} '{}' (+{})",
            invocation.source,
            invocation.source_id,
            invocation.total()
        ),
    }
}

fn ids(dice: &[DieId]) -> String {
    dice.iter().map(|id| id.to_string()).collect::<Vec<_>>().join(" ")
}

pub fn aftermath_lines(aftermath: &Aftermath) -> Vec<String> {
    let mut lines = vec![format!("  {}", aftermath.summary())];
    if !aftermath.fallout.rolled.is_empty() {
        let rolled: Vec<String> = aftermath.fallout.rolled.iter().map(u32::to_string).collect();
        lines.push(format!("  Fallout dice: {}", rolled.join(", ")));
    }
    if aftermath.trait_eligible {
        lines.push("  The experience may leave a new trait.".to_string());
    }
    lines
}
