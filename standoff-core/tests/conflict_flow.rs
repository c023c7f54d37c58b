//! Scripted conflicts driven end to end through the public API.

use standoff_core::testing::{d6s, fixed_dice, ids, ConflictHarness};
use standoff_core::{
    Action, Actor, ConflictSession, ConflictState, DieKind, EngineConfig, EscalationLevel,
    Invocation, InvocationSource, MatchKind, NpcPolicy, Outcome, PoolSpec, Severity, Turn,
    TurnAction,
};

// =============================================================================
// The outmatched opponent gives
// =============================================================================

#[test]
fn opponent_gives_when_outmatched_at_verbal() {
    // protagonist [d6=4, d6=3, d8=5], opponent [d6=2, d6=6]
    let mut protagonist = d6s(&[4, 3]);
    protagonist.extend(fixed_dice(&[(DieKind::Large, 5)]));
    let mut harness = ConflictHarness::started(1, protagonist, d6s(&[2, 6]));

    let raise = ids(&harness.active().protagonist.pool[..2]);
    assert!(harness.raise(Actor::Protagonist, &raise));
    assert_eq!(harness.active().pending.map(|p| p.total), Some(7));

    // A lone d6=6 falls short of 7.
    let six = vec![harness.active().opponent.pool[1].id];
    assert!(!harness.match_offer(Actor::Opponent, &six));

    assert!(harness.act(Action::yield_by(Actor::Opponent)));
    let resolved = harness.resolved();
    assert_eq!(resolved.outcome, Outcome::OpponentYielded);
    assert!(resolved.outcome.protagonist_won());
    assert_eq!(resolved.fallout.severity, Severity::None);
    assert!(resolved.fallout.rolled.is_empty());
    assert_eq!(resolved.fallout.total, 0);
    assert!(resolved.fallout_groups.is_empty());
}

// =============================================================================
// Taking the blow at Violent
// =============================================================================

#[test]
fn three_dice_match_at_violent_leaves_one_tagged_group() {
    let mut harness = ConflictHarness::started(
        2,
        d6s(&[5, 5]),
        fixed_dice(&[(DieKind::Small, 4), (DieKind::Small, 4), (DieKind::Small, 2)]),
    );
    assert!(harness.act(Action::escalate(Actor::Protagonist, EscalationLevel::Violent)));

    let raise = ids(&harness.active().protagonist.pool[..2]);
    assert!(harness.raise(Actor::Protagonist, &raise));

    let cover = harness.pool_ids(Actor::Opponent);
    assert_eq!(cover.len(), 3);
    assert!(harness.match_offer(Actor::Opponent, &cover));

    let conflict = harness.active();
    assert_eq!(conflict.fallout.len(), 1);
    assert_eq!(conflict.fallout[0].level, EscalationLevel::Violent);
    assert_eq!(conflict.fallout[0].dice.len(), 2);
    let last = conflict.log.last().unwrap();
    assert_eq!(last.action, TurnAction::Match(MatchKind::TookTheBlow));
    assert_eq!(last.actor, Actor::Opponent);
    assert_eq!(conflict.turn, Turn::OpponentRaise);
}

#[test]
fn fallout_rolls_once_at_yield() {
    let mut harness = ConflictHarness::started(
        3,
        fixed_dice(&[(DieKind::Huge, 9), (DieKind::Huge, 8)]),
        d6s(&[6, 6, 6]),
    );
    let raise = harness.pool_ids(Actor::Protagonist);
    assert!(harness.raise(Actor::Protagonist, &raise));
    let cover = harness.pool_ids(Actor::Opponent);
    assert!(harness.match_offer(Actor::Opponent, &cover));
    assert!(harness.act(Action::yield_by(Actor::Opponent)));

    let resolved = harness.resolved();
    assert_eq!(resolved.fallout.rolled.len(), 2);
    assert!(resolved.fallout.rolled.iter().all(|v| (1..=10).contains(v)));
    assert_eq!(resolved.fallout.total, resolved.fallout.rolled.iter().sum::<u32>());

    // Nothing recomputes it afterwards.
    let before = resolved.fallout.clone();
    assert!(!harness.act(Action::yield_by(Actor::Protagonist)));
    assert_eq!(harness.resolved().fallout, before);
}

// =============================================================================
// Turn order
// =============================================================================

#[test]
fn initiative_passes_back_and_forth() {
    let mut harness = ConflictHarness::started(4, d6s(&[6, 6, 1, 1, 6]), d6s(&[6, 6, 1, 1, 6]));

    let pair = harness.pool_ids(Actor::Protagonist)[..2].to_vec();
    assert!(harness.raise(Actor::Protagonist, &pair));
    assert_eq!(harness.active().turn, Turn::OpponentMatch);

    // Wrong actor, wrong phase.
    let protagonist_rest = harness.pool_ids(Actor::Protagonist);
    assert!(!harness.match_offer(Actor::Protagonist, &protagonist_rest));
    assert!(!harness.raise(Actor::Protagonist, &protagonist_rest[..2]));

    let opponent = harness.pool_ids(Actor::Opponent);
    assert!(harness.match_offer(Actor::Opponent, &opponent[..2]));
    assert_eq!(harness.active().turn, Turn::OpponentRaise);
    assert_eq!(
        harness.active().log[1].action,
        TurnAction::Match(MatchKind::Blocked)
    );

    let opponent = harness.pool_ids(Actor::Opponent);
    assert!(harness.raise(Actor::Opponent, &opponent[..2]));
    assert_eq!(harness.active().turn, Turn::ProtagonistMatch);

    let protagonist = harness.pool_ids(Actor::Protagonist);
    assert!(harness.match_offer(Actor::Protagonist, &protagonist));
    assert_eq!(harness.active().turn, Turn::ProtagonistRaise);
    assert_eq!(harness.rejected.len(), 2);
}

#[test]
fn escalation_does_not_pass_the_turn() {
    let mut harness = ConflictHarness::started(5, d6s(&[3, 3]), d6s(&[1]));
    let raise = harness.pool_ids(Actor::Protagonist);
    assert!(harness.raise(Actor::Protagonist, &raise));

    assert!(harness.act(Action::escalate(Actor::Opponent, EscalationLevel::Physical)));
    assert_eq!(harness.active().turn, Turn::OpponentMatch);
    assert_eq!(harness.active().pool(Actor::Opponent).len(), 3);
    assert_eq!(
        harness.active().available_escalations(Actor::Opponent),
        vec![EscalationLevel::Violent, EscalationLevel::Lethal]
    );
    assert_eq!(harness.active().highest_level(), EscalationLevel::Physical);

    // Skipping straight to Lethal grants only the Lethal bundle.
    assert!(harness.act(Action::escalate(Actor::Opponent, EscalationLevel::Lethal)));
    let granted: Vec<_> = harness.active().pool(Actor::Opponent)[3..]
        .iter()
        .map(|d| d.kind)
        .collect();
    assert_eq!(granted, vec![DieKind::Huge, DieKind::Huge]);
    assert!(harness.active().available_escalations(Actor::Opponent).is_empty());
    assert!(!harness.act(Action::escalate(Actor::Opponent, EscalationLevel::Violent)));
}

// =============================================================================
// Invocations
// =============================================================================

#[test]
fn each_bonus_once_per_conflict() {
    let mut harness = ConflictHarness::started(6, d6s(&[2, 2]), d6s(&[6, 6]));
    let trait_bonus = |value| {
        Invocation::new(
            InvocationSource::Trait,
            "never-backs-down",
            fixed_dice(&[(DieKind::Medium, value)]),
        )
    };

    assert!(harness.act(Action::Invoke(trait_bonus(5))));
    assert!(!harness.act(Action::Invoke(trait_bonus(6))));
    assert!(harness.act(Action::Invoke(Invocation::new(
        InvocationSource::Relationship,
        "never-backs-down",
        fixed_dice(&[(DieKind::Small, 3)]),
    ))));
    assert_eq!(harness.active().pool(Actor::Protagonist).len(), 4);
    assert!(harness.active().log.is_empty());

    // Dice that already live in the conflict can't be slipped in again.
    let existing = harness.active().opponent.pool[0].clone();
    assert!(!harness.act(Action::Invoke(Invocation::new(
        InvocationSource::Item,
        "stolen",
        vec![existing],
    ))));
}

#[test]
fn invoking_allowed_while_matching() {
    let mut harness = ConflictHarness::started(7, d6s(&[1, 1]), d6s(&[6, 5]));
    let raise = harness.pool_ids(Actor::Protagonist);
    assert!(harness.raise(Actor::Protagonist, &raise));
    let opponent = harness.pool_ids(Actor::Opponent);
    assert!(harness.match_offer(Actor::Opponent, &opponent[..1]));
    let opponent = harness.pool_ids(Actor::Opponent);
    assert!(!harness.raise(Actor::Opponent, &opponent));
    // Only one die left: the opponent escalates to raise.
    assert!(harness.act(Action::escalate(Actor::Opponent, EscalationLevel::Physical)));
    let opponent = harness.pool_ids(Actor::Opponent);
    assert!(harness.raise(Actor::Opponent, &opponent[..2]));
    assert_eq!(harness.active().turn, Turn::ProtagonistMatch);

    assert!(harness.act(Action::Invoke(Invocation::new(
        InvocationSource::Conviction,
        "protect-the-weak",
        fixed_dice(&[(DieKind::Huge, 10), (DieKind::Huge, 10)]),
    ))));
    assert!(harness.active().can_match(Actor::Protagonist));
}

// =============================================================================
// Lifecycle
// =============================================================================

#[test]
fn nothing_happens_before_start() {
    let mut harness = ConflictHarness::new(8);
    assert!(!harness.act(Action::yield_by(Actor::Protagonist)));
    assert!(!harness.act(Action::escalate(Actor::Opponent, EscalationLevel::Physical)));
    assert_eq!(harness.state, ConflictState::Inactive);
}

#[test]
fn seeded_sessions_play_out_identically() {
    let play = |seed| {
        let config = EngineConfig::default().with_escalate_chance(0.7);
        let mut session = ConflictSession::with_seed(config, seed);
        let spec = PoolSpec::parse("4d6+2d8").unwrap();
        assert!(session.start_rolled("bandit", "the payroll", &spec, &spec));
        while session.state().is_active() {
            let action = session
                .npc_decision()
                .or_else(|| session.auto_decision(Actor::Protagonist))
                .expect("someone always has a move");
            assert!(session.dispatch(action));
        }
        session.finish().unwrap()
    };

    assert_eq!(play(31), play(31));
}

#[test]
fn stubborn_opponents_escalate_before_giving() {
    let config = EngineConfig::default().with_escalate_chance(NpcPolicy::stubborn().escalate_chance);
    let mut session = ConflictSession::with_seed(config, 12);
    assert!(session.start("brawler", "the bar stool", d6s(&[6, 6]), d6s(&[1])));
    let raise = session.active().unwrap().protagonist.pool.iter().map(|d| d.id).collect();
    assert!(session.raise(Actor::Protagonist, raise, "move"));

    let first = session.apply_npc_turn().unwrap();
    assert_eq!(first, Action::escalate(Actor::Opponent, EscalationLevel::Physical));
}
