//! Play a handful of seeded conflicts with the opponent policy on both sides.
//!
//! Run with: `cargo run -p standoff-core --example auto_conflict`

use standoff_core::{Actor, ConflictSession, EngineConfig, PoolSpec, TurnAction};

struct Scenario {
    opponent: &'static str,
    stakes: &'static str,
    protagonist: &'static str,
    opponent_pool: &'static str,
    escalate_chance: f64,
}

fn scenarios() -> Vec<Scenario> {
    vec![
        Scenario {
            opponent: "the ferryman",
            stakes: "passage across the river",
            protagonist: "2d4+2d6",
            opponent_pool: "2d4+1d6",
            escalate_chance: 0.2,
        },
        Scenario {
            opponent: "a claim jumper",
            stakes: "the north creek claim",
            protagonist: "2d6+1d8",
            opponent_pool: "2d6+1d8",
            escalate_chance: 0.6,
        },
        Scenario {
            opponent: "the Dalton brothers",
            stakes: "the bank's gold",
            protagonist: "3d6",
            opponent_pool: "2d8+2d4",
            escalate_chance: 1.0,
        },
    ]
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    for (seed, scenario) in scenarios().into_iter().enumerate() {
        println!("=== {} over {} ===", scenario.opponent, scenario.stakes);

        let config = EngineConfig::new().with_escalate_chance(scenario.escalate_chance);
        config.validate()?;
        let mut session = ConflictSession::with_seed(config, seed as u64);
        session.start_rolled(
            scenario.opponent,
            scenario.stakes,
            &PoolSpec::parse(scenario.protagonist)?,
            &PoolSpec::parse(scenario.opponent_pool)?,
        );

        while session.state().is_active() {
            let Some(action) = session
                .npc_decision()
                .or_else(|| session.auto_decision(Actor::Protagonist))
            else {
                break;
            };
            session.dispatch(action);
        }

        for record in session.state().log() {
            let faces: Vec<String> = record.dice.iter().map(|d| d.value.to_string()).collect();
            match record.action {
                TurnAction::Escalate { to, .. } => println!("  {} escalates to {}", record.actor, to),
                action => println!(
                    "  {} {} [{}] {}",
                    record.actor,
                    action.label(),
                    faces.join(" "),
                    record.note
                ),
            }
        }
        if let Some(aftermath) = session.aftermath() {
            println!("  {}", aftermath.summary());
        }
        println!();
    }
    Ok(())
}
