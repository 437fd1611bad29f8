#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system driving the Normal, Gathering and Boss phases of each wave.
//!
//! The system only reads wave timers and emits commands; the world owns the
//! counters and ignores commands that do not match the active phase.

use dice_defense_core::{
    Command, Phase, WaveSnapshot, GATHERING_PHASE_SECONDS, HP_ESCALATION_SECONDS,
    NORMAL_PHASE_SECONDS,
};

/// Phase durations used by the wave system.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    normal_seconds: f32,
    gathering_seconds: f32,
    escalation_seconds: f32,
}

impl Config {
    /// Creates a configuration from explicit phase durations in seconds.
    #[must_use]
    pub const fn new(normal_seconds: f32, gathering_seconds: f32, escalation_seconds: f32) -> Self {
        Self {
            normal_seconds,
            gathering_seconds,
            escalation_seconds,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(
            NORMAL_PHASE_SECONDS,
            GATHERING_PHASE_SECONDS,
            HP_ESCALATION_SECONDS,
        )
    }
}

/// Wave progression system.
#[derive(Debug, Default)]
pub struct WaveProgression {
    config: Config,
}

impl WaveProgression {
    /// Creates a wave system using the supplied phase durations.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Emits the phase commands due for the provided wave timers.
    pub fn handle(&self, wave: &WaveSnapshot, out: &mut Vec<Command>) {
        match wave.phase {
            Phase::Normal => {
                if self.config.escalation_seconds > 0.0 {
                    let due = (wave.escalation_elapsed / self.config.escalation_seconds).floor();
                    for _ in 0..due as u32 {
                        out.push(Command::EscalateMobHp);
                    }
                }
                if wave.phase_elapsed >= self.config.normal_seconds {
                    out.push(Command::BeginGathering);
                }
            }
            Phase::Gathering => {
                if wave.phase_elapsed >= self.config.gathering_seconds {
                    out.push(Command::SummonBoss);
                }
            }
            Phase::Boss => {
                if !wave.boss_alive {
                    out.push(Command::AdvanceWave);
                }
            }
        }
    }
}
