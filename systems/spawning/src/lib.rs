#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic spawning system responsible for emitting mob spawn commands.

use std::time::Duration;

use dice_defense_core::{Command, Event, MobKind, Phase};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Relative spawn weights of the normal-phase mob kinds.
const SPAWN_WEIGHTS: [(MobKind, u32); 3] = [
    (MobKind::Normal, 70),
    (MobKind::Speed, 20),
    (MobKind::Big, 10),
];

/// Default cadence between two normal-phase spawns.
pub const DEFAULT_SPAWN_INTERVAL: Duration = Duration::from_secs(1);

/// Configuration parameters required to construct the spawning system.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    spawn_interval: Duration,
    rng_seed: u64,
}

impl Config {
    /// Creates a new configuration using the provided spawn cadence and seed.
    #[must_use]
    pub const fn new(spawn_interval: Duration, rng_seed: u64) -> Self {
        Self {
            spawn_interval,
            rng_seed,
        }
    }
}

/// Pure system that deterministically emits spawn commands during the normal phase.
#[derive(Debug)]
pub struct Spawning {
    spawn_interval: Duration,
    accumulator: Duration,
    rng: ChaCha8Rng,
}

impl Spawning {
    /// Creates a new spawning system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            spawn_interval: config.spawn_interval,
            accumulator: Duration::ZERO,
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
        }
    }

    /// Consumes events and the active phase to emit spawn commands.
    ///
    /// Outside the normal phase the accumulator is reset so a new wave starts
    /// with a full interval before its first spawn.
    pub fn handle(&mut self, events: &[Event], phase: Phase, out: &mut Vec<Command>) {
        if phase != Phase::Normal {
            self.accumulator = Duration::ZERO;
            return;
        }

        if self.spawn_interval.is_zero() {
            return;
        }

        let mut accumulated = Duration::ZERO;
        for event in events {
            if let Event::TimeAdvanced { dt } = event {
                accumulated = accumulated.saturating_add(*dt);
            }
        }

        if accumulated.is_zero() {
            return;
        }

        self.accumulator = self.accumulator.saturating_add(accumulated);
        let spawn_attempts = self.resolve_spawn_attempts();

        for _ in 0..spawn_attempts {
            let kind = self.roll_kind();
            out.push(Command::SpawnMob { kind });
        }
    }

    fn resolve_spawn_attempts(&mut self) -> usize {
        if self.spawn_interval.is_zero() {
            return 0;
        }

        let mut attempts = 0;
        while self.accumulator >= self.spawn_interval {
            self.accumulator -= self.spawn_interval;
            attempts += 1;
        }
        attempts
    }

    fn roll_kind(&mut self) -> MobKind {
        let total: u32 = SPAWN_WEIGHTS.iter().map(|(_, weight)| weight).sum();
        let mut roll = self.rng.gen_range(0..total);
        for (kind, weight) in SPAWN_WEIGHTS {
            if roll < weight {
                return kind;
            }
            roll -= weight;
        }
        MobKind::Normal
    }
}
