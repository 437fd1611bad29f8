//! Headless single-session run driven by a simple bot.

use std::time::Duration;

use anyhow::{Context, Result};
use dice_defense_core::{
    units::MAX_RANK, CellIndex, Deck, Event, PlayerCommand, SessionSnapshot, UnitKind,
};
use dice_defense_session::{Config, Session};
use serde::Serialize;
use tracing::{debug, info};

/// Simulated ticks between two bot decisions.
const THINK_EVERY: u64 = 15;

/// Outcome of a headless run.
#[derive(Debug, Default, Serialize)]
pub(crate) struct Report {
    pub(crate) ticks: u64,
    pub(crate) summons: u32,
    pub(crate) merges: u32,
    pub(crate) kills: u32,
    pub(crate) leaks: u32,
    pub(crate) waves_cleared: u32,
    pub(crate) state: Option<SessionSnapshot>,
}

/// Runs a session for `seconds` of simulated time at `tick_rate_hz`.
pub(crate) fn run(deck: &[UnitKind], seconds: f32, tick_rate_hz: f32, seed: u64) -> Result<Report> {
    anyhow::ensure!(tick_rate_hz > 0.0, "tick rate must be positive");
    anyhow::ensure!(seconds >= 0.0, "duration must not be negative");
    let deck = Deck::new(deck.to_vec()).context("invalid deck")?;
    let dt = Duration::from_secs_f32(1.0 / tick_rate_hz);
    let ticks = (seconds * tick_rate_hz).round() as u64;

    let mut session = Session::new(deck, Config::new(seed));
    let mut report = Report::default();
    for tick in 0..ticks {
        if tick % THINK_EVERY == 0 {
            if let Some(command) = plan(&session.snapshot()) {
                debug!(?command, "bot decision");
                session.submit(command);
            }
        }
        for event in session.tick(dt) {
            match event {
                Event::UnitSummoned { .. } => report.summons += 1,
                Event::UnitsMerged { .. } => report.merges += 1,
                Event::MobKilled { .. } => report.kills += 1,
                Event::MobEscaped { .. } => report.leaks += 1,
                Event::WaveAdvanced { wave } => {
                    report.waves_cleared += 1;
                    info!(wave, "wave cleared");
                }
                _ => {}
            }
        }
    }
    report.ticks = ticks;
    report.state = Some(session.snapshot());
    Ok(report)
}

/// Summons while affordable and space remains, otherwise merges the first matching pair.
fn plan(snapshot: &SessionSnapshot) -> Option<PlayerCommand> {
    let has_space = snapshot.grid.iter().any(Option::is_none);
    if has_space && snapshot.sp >= snapshot.spawn_cost {
        return Some(PlayerCommand::Summon);
    }

    for (index, slot) in snapshot.grid.iter().enumerate() {
        let Some(unit) = slot else {
            continue;
        };
        if unit.rank >= MAX_RANK {
            continue;
        }
        let partner = snapshot
            .grid
            .iter()
            .enumerate()
            .skip(index + 1)
            .find(|(_, other)| {
                other.is_some_and(|other| other.kind == unit.kind && other.rank == unit.rank)
            });
        if let Some((target, _)) = partner {
            return Some(PlayerCommand::Merge {
                source: CellIndex::new(index as u32),
                target: CellIndex::new(target as u32),
            });
        }
    }
    None
}
