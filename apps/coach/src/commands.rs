//! Line commands typed at the coaching prompt.

use anyhow::{anyhow, bail, Result};
use shared::domain::{CancellationReason, InjuryArea, RoutineId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Time(u32),
    Select(RoutineId),
    Next,
    Cancel {
        reason: CancellationReason,
        injury_area: Option<InjuryArea>,
    },
    Reset,
    Back,
    Show,
    Help,
    Quit,
}

pub const HELP: &str = "\
commands:
  time <minutes>            choose a workout length (20, 30, 40, 50, 60)
  select <routine id>       start coaching the routine
  next                      move to the next exercise
  cancel <reason> [area]    stop: too_hard | too_long | injury <area> | interrupted
  reset                     back to the routine list
  back                      back to the time selection
  show                      print the current state
  help                      this text
  quit                      leave";

pub fn parse(line: &str) -> Result<Option<Command>> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(None);
    };
    let command = match head.to_ascii_lowercase().as_str() {
        "time" | "t" => {
            let minutes = words
                .next()
                .ok_or_else(|| anyhow!("usage: time <minutes>"))?
                .parse::<u32>()
                .map_err(|_| anyhow!("minutes must be a whole number"))?;
            Command::Time(minutes)
        }
        "select" | "s" => {
            let id = words
                .next()
                .ok_or_else(|| anyhow!("usage: select <routine id>"))?;
            Command::Select(RoutineId::new(id))
        }
        "next" | "n" => Command::Next,
        "cancel" | "c" => {
            let raw_reason = words
                .next()
                .ok_or_else(|| anyhow!("usage: cancel <reason> [area]"))?;
            let reason = CancellationReason::parse(raw_reason)
                .ok_or_else(|| anyhow!("unknown cancellation reason '{raw_reason}'"))?;
            let injury_area = match words.next() {
                Some(raw_area) => Some(
                    InjuryArea::parse(raw_area)
                        .ok_or_else(|| anyhow!("unknown injury area '{raw_area}'"))?,
                ),
                None => None,
            };
            Command::Cancel {
                reason,
                injury_area,
            }
        }
        "reset" | "r" => Command::Reset,
        "back" | "b" => Command::Back,
        "show" | "ls" => Command::Show,
        "help" | "?" => Command::Help,
        "quit" | "q" | "exit" => Command::Quit,
        other => bail!("unknown command '{other}', try 'help'"),
    };
    Ok(Some(command))
}
