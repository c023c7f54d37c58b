//! Headless mode for running a conflict.
//!
//! A simple line-oriented protocol on stdin/stdout, suitable for scripting
//! and automated testing:
//! - Lines starting with `#` are commands (`#raise 1 2`, `#match 3`, `#yield`, ...)
//! - Output lines are tagged (`[LOG]`, `[STATUS]`, `[REJECTED]`, `[ERROR]`, ...)
//!
//! Dice are picked by their position in the pool (`1`, `2`, ...) or by the
//! id prefix shown in brackets.

use anyhow::{anyhow, bail, Context};
use standoff_core::{
    Action, Actor, ConflictSession, Die, DieId, EngineConfig, EscalationLevel, Invocation,
    InvocationSource, PoolSpec,
};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use crate::render;

/// Everything needed to set up one headless conflict.
#[derive(Debug, Clone)]
pub struct HeadlessConfig {
    pub engine: EngineConfig,
    pub seed: Option<u64>,
    pub opponent: String,
    pub stakes: String,
    pub protagonist_pool: PoolSpec,
    pub opponent_pool: PoolSpec,
    /// The opponent policy plays the protagonist as well.
    pub auto: bool,
    /// Print the aftermath as JSON instead of text.
    pub json: bool,
}

/// A parsed `#` command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Raise { dice: Vec<String>, note: String },
    Match { dice: Vec<String>, note: String },
    Escalate(EscalationLevel),
    Yield,
    Invoke {
        source: InvocationSource,
        source_id: String,
        pool: PoolSpec,
    },
    Status,
    Log,
    Help,
    Quit,
}

pub fn parse_command(line: &str) -> anyhow::Result<Command> {
    let body = line
        .trim()
        .strip_prefix('#')
        .ok_or_else(|| anyhow!("Commands start with '#'. Type #help for help."))?;
    let (head, note) = match body.split_once("--") {
        Some((head, note)) => (head, note.trim().to_string()),
        None => (body, String::new()),
    };
    let parts: Vec<&str> = head.split_whitespace().collect();
    let args: Vec<String> = parts.iter().skip(1).map(|s| s.to_string()).collect();

    let command = match parts.first().copied() {
        Some("raise") | Some("r") => Command::Raise { dice: args, note },
        Some("match") | Some("m") => Command::Match { dice: args, note },
        Some("escalate") | Some("e") => {
            let level = args
                .first()
                .ok_or_else(|| anyhow!("Usage: #escalate <physical|violent|lethal>"))?;
            Command::Escalate(level.parse()?)
        }
        Some("yield") | Some("give") => Command::Yield,
        Some("invoke") | Some("i") => {
            let [source, source_id, pool] = args.as_slice() else {
                bail!("Usage: #invoke <trait|item|relationship|conviction> <id> <dice, e.g. 1d6>");
            };
            Command::Invoke {
                source: source.parse()?,
                source_id: source_id.clone(),
                pool: pool.parse()?,
            }
        }
        Some("status") => Command::Status,
        Some("log") => Command::Log,
        Some("help") => Command::Help,
        Some("quit") | Some("exit") => Command::Quit,
        Some(other) => bail!("Unknown command '#{other}'. Type #help for help."),
        None => bail!("Empty command. Type #help for help."),
    };
    Ok(command)
}

/// Turn position numbers or id prefixes into die ids from `pool`.
///
/// Names are resolved independently; naming a die twice is left for the
/// engine to refuse.
pub fn resolve_dice(pool: &[Die], tokens: &[String]) -> anyhow::Result<Vec<DieId>> {
    tokens
        .iter()
        .map(|token| -> anyhow::Result<DieId> {
            if let Ok(position) = token.parse::<usize>() {
                if (1..=pool.len()).contains(&position) {
                    return Ok(pool[position - 1].id);
                }
            }
            let token = token.to_lowercase();
            let mut found = pool
                .iter()
                .filter(|d| d.id.0.simple().to_string().starts_with(&token));
            match (found.next(), found.next()) {
                (Some(die), None) => Ok(die.id),
                (Some(_), Some(_)) => bail!("'{token}' matches more than one die"),
                (None, _) => bail!("No die '{token}' in your pool"),
            }
        })
        .collect()
}

/// Run one conflict in headless mode.
pub async fn run_headless(config: HeadlessConfig) -> anyhow::Result<()> {
    let mut session = ConflictSession::validated(config.engine.clone(), config.seed)?;
    if !session.start_rolled(
        config.opponent.as_str(),
        config.stakes.as_str(),
        &config.protagonist_pool,
        &config.opponent_pool,
    ) {
        bail!("Could not start the conflict");
    }
    info!(
        seed = ?config.seed,
        opponent = %config.opponent,
        protagonist_pool = %config.protagonist_pool,
        opponent_pool = %config.opponent_pool,
        auto = config.auto,
        "headless conflict started"
    );

    println!("=== Standoff ===");
    println!("{} vs {} over {}", Actor::Protagonist, config.opponent, config.stakes);
    print_status(&session);
    println!();
    if !config.auto {
        print_help();
        println!();
    }

    let mut stdout = std::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut printed = 0;

    loop {
        printed = print_new_records(&session, printed);
        let Some(conflict) = session.active() else {
            break;
        };
        let actor = conflict.turn.actor();

        if actor == Actor::Opponent || config.auto {
            print!("[THINKING] {actor}...");
            stdout.flush().ok();
            tokio::time::sleep(session.thinking_delay()).await;
            print!("\r                              \r");
            stdout.flush().ok();

            let action = match actor {
                Actor::Opponent => session.npc_decision(),
                Actor::Protagonist => session.auto_decision(actor),
            }
            .ok_or_else(|| anyhow!("No move available for {actor}"))?;
            let label = render::action_line(&action);
            if !session.dispatch(action) {
                warn!(%actor, action = %label, "policy move refused");
                bail!("Policy move was refused: {label}");
            }
            continue;
        }

        print!("> ");
        stdout.flush().ok();
        let Some(line) = lines.next_line().await.context("reading input")? else {
            println!("[ABANDONED] Input closed before the conflict ended.");
            session.abandon();
            return Ok(());
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let command = match parse_command(line) {
            Ok(command) => command,
            Err(e) => {
                println!("[ERROR] {e}");
                continue;
            }
        };
        if command == Command::Quit {
            println!("[ABANDONED] Goodbye!");
            session.abandon();
            return Ok(());
        }
        if let Err(e) = handle_command(&mut session, command) {
            println!("[ERROR] {e}");
        }
    }

    let aftermath = session
        .aftermath()
        .ok_or_else(|| anyhow!("Conflict ended without a resolution"))?;
    if config.json {
        println!("{}", serde_json::to_string_pretty(&aftermath)?);
    } else {
        println!("[AFTERMATH]");
        for line in render::aftermath_lines(&aftermath) {
            println!("{line}");
        }
    }
    Ok(())
}

fn handle_command(session: &mut ConflictSession, command: Command) -> anyhow::Result<()> {
    let pool = session
        .active()
        .map(|c| c.pool(Actor::Protagonist).to_vec())
        .unwrap_or_default();

    let action = match command {
        Command::Raise { dice, note } => {
            Action::raise(Actor::Protagonist, resolve_dice(&pool, &dice)?, note)
        }
        Command::Match { dice, note } => {
            Action::match_offer(Actor::Protagonist, resolve_dice(&pool, &dice)?, note)
        }
        Command::Escalate(level) => Action::escalate(Actor::Protagonist, level),
        Command::Yield => Action::yield_by(Actor::Protagonist),
        Command::Invoke {
            source,
            source_id,
            pool,
        } => {
            let dice = session.roll_pool(&pool);
            Action::Invoke(Invocation::new(source, source_id, dice))
        }
        Command::Status => {
            print_status(session);
            return Ok(());
        }
        Command::Log => {
            for record in session.state().log() {
                println!("[LOG] {}", render::record_line(record));
            }
            return Ok(());
        }
        Command::Help => {
            print_help();
            return Ok(());
        }
        Command::Quit => return Ok(()),
    };

    if let Err(reason) = session.check(&action) {
        println!("[REJECTED] {reason}");
        return Ok(());
    }
    let label = render::action_line(&action);
    let invoked = matches!(action, Action::Invoke(_));
    session.dispatch(action);
    if invoked {
        println!("[INVOKED] {label}");
        print_status(session);
    }
    Ok(())
}

/// Print log entries past `printed`. Returns the new count.
fn print_new_records(session: &ConflictSession, printed: usize) -> usize {
    let log = session.state().log();
    for record in log.iter().skip(printed) {
        println!("[LOG] {}", render::record_line(record));
    }
    let shown = log.len().max(printed);
    if shown > printed {
        if let Some(conflict) = session.active() {
            if conflict.is_turn_of(Actor::Protagonist) {
                print_status(session);
            }
        }
    }
    shown
}

fn print_status(session: &ConflictSession) {
    match session.active() {
        Some(conflict) => {
            println!("[STATUS]");
            for line in render::status_lines(conflict) {
                println!("{line}");
            }
        }
        None => println!("[STATUS] No conflict running."),
    }
}

fn print_help() {
    println!("[HELP]");
    println!("  #raise <die> <die> [-- note]   - Offer two dice");
    println!("  #match <die>... [-- note]      - Cover the raise (1 reverses, 2 blocks, 3+ takes the blow)");
    println!("  #escalate <level>              - physical, violent or lethal");
    println!("  #invoke <source> <id> <dice>   - e.g. #invoke trait quick-draw 1d6");
    println!("  #yield                         - Give");
    println!("  #status                        - Show pools and turn");
    println!("  #log                           - Show every turn so far");
    println!("  #help                          - Show this help");
    println!("  #quit                          - Walk away");
    println!("  Dice are named by position (1, 2, ...) or id prefix.");
}

#[cfg(test)]
mod tests {
    use super::*;
    use standoff_core::testing::d6s;

    #[test]
    fn test_parse_raise_with_note() {
        let command = parse_command("#raise 1 3 -- You'll hand it over.").unwrap();
        assert_eq!(
            command,
            Command::Raise {
                dice: vec!["1".to_string(), "3".to_string()],
                note: "You'll hand it over.".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_escalate_and_invoke() {
        assert_eq!(
            parse_command("#escalate violent").unwrap(),
            Command::Escalate(EscalationLevel::Violent)
        );
        let Command::Invoke {
            source,
            source_id,
            pool,
        } = parse_command("#invoke item lucky-coin 1d8").unwrap()
        else {
            panic!("expected invoke");
        };
        assert_eq!(source, InvocationSource::Item);
        assert_eq!(source_id, "lucky-coin");
        assert_eq!(pool.dice_count(), 1);
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_command("raise 1 2").is_err());
        assert!(parse_command("#escalate").is_err());
        assert!(parse_command("#escalate sideways").is_err());
        assert!(parse_command("#invoke trait").is_err());
        assert!(parse_command("#invoke trait x 4000000000d4").is_err());
        assert!(parse_command("#dance").is_err());
        assert_eq!(parse_command("#quit").unwrap(), Command::Quit);
    }

    #[test]
    fn test_resolve_by_position_and_prefix() {
        let pool = d6s(&[6, 5, 4]);
        let by_position = resolve_dice(&pool, &["3".to_string(), "1".to_string()]).unwrap();
        assert_eq!(by_position, vec![pool[2].id, pool[0].id]);

        let prefix = pool[1].id.0.simple().to_string()[..8].to_string();
        assert_eq!(resolve_dice(&pool, &[prefix]).unwrap(), vec![pool[1].id]);

        assert!(resolve_dice(&pool, &["zz".to_string()]).is_err());
    }

    #[test]
    fn test_invalid_move_is_reported_not_applied() {
        let mut session = ConflictSession::with_seed(EngineConfig::default(), 4);
        assert!(session.start("drifter", "the well", d6s(&[3, 3, 3]), d6s(&[2, 2])));
        let before = session.state().clone();
        handle_command(
            &mut session,
            Command::Raise {
                dice: vec!["1".to_string()],
                note: String::new(),
            },
        )
        .unwrap();
        assert_eq!(session.state(), &before);
    }
}
