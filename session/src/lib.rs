#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Single-session simulation loop for Dice Defense.
//!
//! A [`Session`] owns one authoritative world together with the pure systems
//! that drive it. Player commands are only queued by [`Session::submit`]; every
//! mutation happens inside [`Session::tick`], which drains the queue in arrival
//! order before advancing the simulation.

use std::{collections::VecDeque, time::Duration};

use dice_defense_core::{
    CellIndex, Command, Deck, Event, MapLayout, PlayerCommand, SessionSnapshot, UnitKind,
    UnitTarget,
};
use dice_defense_system_combat::{ImpactResolver, UnitCombat};
use dice_defense_system_spawning::{self as spawning, Spawning, DEFAULT_SPAWN_INTERVAL};
use dice_defense_system_targeting::UnitTargeting;
use dice_defense_system_waves::{self as waves, WaveProgression};
use dice_defense_world::{self as world, query, World};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Tunables of a single session.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    seed: u64,
    spawn_interval: Duration,
    waves: waves::Config,
}

impl Config {
    /// Creates a configuration with default timings and the provided seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            spawn_interval: DEFAULT_SPAWN_INTERVAL,
            waves: waves::Config::default(),
        }
    }

    /// Overrides the cadence between two normal-phase spawns.
    #[must_use]
    pub fn with_spawn_interval(mut self, spawn_interval: Duration) -> Self {
        self.spawn_interval = spawn_interval;
        self
    }

    /// Overrides the wave phase durations.
    #[must_use]
    pub fn with_waves(mut self, waves: waves::Config) -> Self {
        self.waves = waves;
        self
    }
}

/// One running game: world, systems, command queue and dice rolls.
#[derive(Debug)]
pub struct Session {
    world: World,
    pending: VecDeque<PlayerCommand>,
    rng: ChaCha8Rng,
    spawning: Spawning,
    waves: WaveProgression,
    targeting: UnitTargeting,
    combat: UnitCombat,
    impacts: ImpactResolver,
    events: Vec<Event>,
    commands: Vec<Command>,
    targets: Vec<UnitTarget>,
    ticks: u64,
}

impl Session {
    /// Creates a session on the standard board for the provided deck.
    #[must_use]
    pub fn new(deck: Deck, config: Config) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let spawn_seed = rng.gen::<u64>();
        Self {
            world: World::new(deck),
            pending: VecDeque::new(),
            rng,
            spawning: Spawning::new(spawning::Config::new(config.spawn_interval, spawn_seed)),
            waves: WaveProgression::new(config.waves),
            targeting: UnitTargeting::new(),
            combat: UnitCombat::new(),
            impacts: ImpactResolver::new(),
            events: Vec::new(),
            commands: Vec::new(),
            targets: Vec::new(),
            ticks: 0,
        }
    }

    /// Queues a player command for the next tick.
    pub fn submit(&mut self, command: PlayerCommand) {
        self.pending.push_back(command);
    }

    /// Number of commands waiting for the next tick.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Number of ticks processed so far.
    #[must_use]
    pub const fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Advances the session by `dt` and returns the events raised in the tick.
    ///
    /// Queued commands are applied first in arrival order, then time advances,
    /// the wave and spawn timers fire, projectile impacts resolve, ready units
    /// attack and finally dead or finished mobs are swept.
    pub fn tick(&mut self, dt: Duration) -> &[Event] {
        self.events.clear();
        self.ticks += 1;

        while let Some(command) = self.pending.pop_front() {
            let command = self.roll(command);
            world::apply(&mut self.world, command, &mut self.events);
        }

        world::apply(&mut self.world, Command::Tick { dt }, &mut self.events);

        self.waves
            .handle(&query::wave_snapshot(&self.world), &mut self.commands);
        self.flush();

        self.spawning.handle(
            &self.events,
            query::phase(&self.world),
            &mut self.commands,
        );
        self.flush();

        let mobs = query::mob_view(&self.world);
        self.impacts.handle(&self.events, &mobs, &mut self.commands);
        self.flush();

        let units = query::unit_view(&self.world);
        let mobs = query::mob_view(&self.world);
        self.targeting.handle(&units, &mobs, &mut self.targets);
        self.combat.handle(&units, &self.targets, &mut self.commands);
        self.flush();

        world::apply(&mut self.world, Command::SweepCasualties, &mut self.events);

        &self.events
    }

    /// Serializable view of the current state.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        query::snapshot(&self.world)
    }

    /// Static board geometry.
    #[must_use]
    pub fn map_layout(&self) -> MapLayout {
        query::map_layout(&self.world)
    }

    /// Read-only access to the underlying world.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    fn flush(&mut self) {
        for command in self.commands.drain(..) {
            world::apply(&mut self.world, command, &mut self.events);
        }
    }

    /// Resolves the dice rolls a player command needs.
    fn roll(&mut self, command: PlayerCommand) -> Command {
        match command {
            PlayerCommand::Summon => {
                let kind = self.roll_kind();
                let empty = query::empty_cells(&self.world);
                let cell = self.pick_cell(&empty);
                Command::SummonUnit { cell, kind }
            }
            PlayerCommand::Merge { source, target } => Command::MergeUnits {
                source,
                target,
                result: self.roll_kind(),
            },
            PlayerCommand::PowerUp { kind } => Command::PowerUp { kind },
        }
    }

    fn roll_kind(&mut self) -> UnitKind {
        let kinds = query::deck(&self.world).kinds();
        kinds[self.rng.gen_range(0..kinds.len())]
    }

    fn pick_cell(&mut self, empty: &[CellIndex]) -> Option<CellIndex> {
        if empty.is_empty() {
            return None;
        }
        Some(empty[self.rng.gen_range(0..empty.len())])
    }
}
