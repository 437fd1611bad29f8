#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Dice Defense.
//!
//! The world owns the placement grid, the mob and projectile rosters, the
//! wave state and the economy. It is mutated exclusively through [`apply`],
//! which reports every outcome, including rejected requests, as [`Event`]s.

mod mobs;
mod projectiles;
mod units;

use std::collections::BTreeMap;

use dice_defense_core::{
    geometry::BoardLayout,
    mobs::{boss_hp, normal_mob_hp},
    units::{compute_damage, shot_origin, MAX_POWER_TIER, MAX_RANK},
    CellIndex, Command, Deck, Event, MergeError, MobId, MobKind, Phase, PowerUpError,
    ProjectileId, SummonError, UnitKind, HP_ESCALATION_SECONDS, POWER_UP_COST_PER_TIER,
    PROJECTILE_SPEED, STARTING_LIVES, STARTING_SP, STARTING_SUMMON_COST, SUMMON_COST_STEP,
};

use crate::{
    mobs::Mob,
    projectiles::Projectile,
    units::{PowerTiers, UnitGrid, UnitState},
};

/// Wave progression counters.
#[derive(Debug)]
struct WaveState {
    wave: u32,
    phase: Phase,
    phase_elapsed: f32,
    escalation_elapsed: f32,
    scaling_counter: u32,
}

impl WaveState {
    fn new() -> Self {
        Self {
            wave: 1,
            phase: Phase::Normal,
            phase_elapsed: 0.0,
            escalation_elapsed: 0.0,
            scaling_counter: 0,
        }
    }

    fn advance(&mut self, seconds: f32) {
        self.phase_elapsed += seconds;
        if self.phase == Phase::Normal {
            self.escalation_elapsed += seconds;
        }
    }

    fn enter(&mut self, phase: Phase) {
        self.phase = phase;
        self.phase_elapsed = 0.0;
    }
}

/// SP pool, summon cost and lives.
#[derive(Debug)]
struct Economy {
    sp: u32,
    summon_cost: u32,
    lives: i32,
}

/// Represents the authoritative Dice Defense world state.
#[derive(Debug)]
pub struct World {
    layout: BoardLayout,
    deck: Deck,
    power: PowerTiers,
    grid: UnitGrid,
    mobs: BTreeMap<MobId, Mob>,
    projectiles: BTreeMap<ProjectileId, Projectile>,
    next_mob_id: u32,
    next_projectile_id: u32,
    economy: Economy,
    waves: WaveState,
    clock: f32,
}

impl World {
    /// Creates a fresh world on the standard board for the provided deck.
    #[must_use]
    pub fn new(deck: Deck) -> Self {
        Self {
            layout: BoardLayout::standard(),
            power: PowerTiers::for_deck(&deck),
            deck,
            grid: UnitGrid::new(),
            mobs: BTreeMap::new(),
            projectiles: BTreeMap::new(),
            next_mob_id: 0,
            next_projectile_id: 0,
            economy: Economy {
                sp: STARTING_SP,
                summon_cost: STARTING_SUMMON_COST,
                lives: STARTING_LIVES,
            },
            waves: WaveState::new(),
            clock: 0.0,
        }
    }

    fn allocate_mob_id(&mut self) -> MobId {
        let id = MobId::new(self.next_mob_id);
        self.next_mob_id = self.next_mob_id.wrapping_add(1);
        id
    }

    fn allocate_projectile_id(&mut self) -> ProjectileId {
        let id = ProjectileId::new(self.next_projectile_id);
        self.next_projectile_id = self.next_projectile_id.wrapping_add(1);
        id
    }

    fn spawn_mob(&mut self, kind: MobKind, hp: f32) -> MobId {
        let id = self.allocate_mob_id();
        let mob = Mob::spawn(id, kind, hp, self.layout.path());
        let _ = self.mobs.insert(id, mob);
        id
    }

    fn alive_mob_mut(&mut self, id: MobId) -> Option<&mut Mob> {
        self.mobs.get_mut(&id).filter(|mob| mob.is_alive())
    }

    fn advance_mobs(&mut self, seconds: f32) {
        let path = self.layout.path();
        for mob in self.mobs.values_mut() {
            if !mob.is_alive() {
                continue;
            }
            mob.advance(seconds, path);
            mob.tick_statuses(seconds);
        }
    }

    fn advance_projectiles(&mut self, seconds: f32, out_events: &mut Vec<Event>) {
        let mut resolved = Vec::new();
        for (id, projectile) in self.projectiles.iter_mut() {
            let target = self
                .mobs
                .get(&projectile.target)
                .filter(|mob| mob.is_alive());
            match target {
                Some(mob) => {
                    if projectile.advance(mob.position, mob.hit_radius, seconds) {
                        resolved.push(*id);
                        out_events.push(Event::ProjectileImpacted {
                            projectile: *id,
                            kind: projectile.kind,
                            target: projectile.target,
                            damage: projectile.damage,
                        });
                    }
                }
                None => {
                    resolved.push(*id);
                    out_events.push(Event::ProjectileDiscarded { projectile: *id });
                }
            }
        }
        for id in resolved {
            let _ = self.projectiles.remove(&id);
        }
    }

    fn summon(
        &mut self,
        cell: Option<CellIndex>,
        kind: UnitKind,
    ) -> Result<(CellIndex, u32), SummonError> {
        if !self.deck.contains(kind) {
            return Err(SummonError::NotInDeck);
        }
        let cost = self.economy.summon_cost;
        if self.economy.sp < cost {
            return Err(SummonError::InsufficientSp);
        }
        let cell = cell.ok_or(SummonError::BoardFull)?;
        if !self.grid.contains(cell) {
            return Err(SummonError::OutOfBounds);
        }
        if self.grid.get(cell).is_some() {
            return Err(SummonError::CellOccupied);
        }

        self.economy.sp -= cost;
        self.economy.summon_cost = cost.saturating_add(SUMMON_COST_STEP);
        self.grid.place(cell, UnitState::new(kind, 1));
        Ok((cell, cost))
    }

    fn merge(
        &mut self,
        source: CellIndex,
        target: CellIndex,
        result: UnitKind,
    ) -> Result<u8, MergeError> {
        if !self.grid.contains(source) || !self.grid.contains(target) {
            return Err(MergeError::OutOfBounds);
        }
        if source == target {
            return Err(MergeError::SelfMerge);
        }
        let (Some(consumed), Some(kept)) = (self.grid.get(source), self.grid.get(target)) else {
            return Err(MergeError::EmptyCell);
        };
        if consumed.kind != kept.kind || consumed.rank != kept.rank {
            return Err(MergeError::Mismatch);
        }
        if kept.rank >= MAX_RANK {
            return Err(MergeError::MaxRank);
        }

        let rank = kept.rank + 1;
        let _ = self.grid.take(source);
        self.grid.place(target, UnitState::new(result, rank));
        Ok(rank)
    }

    fn power_up(&mut self, kind: UnitKind) -> Result<(u8, u32), PowerUpError> {
        let tier = self.power.tier(kind).ok_or(PowerUpError::NotInDeck)?;
        if tier >= MAX_POWER_TIER {
            return Err(PowerUpError::MaxTier);
        }
        let cost = POWER_UP_COST_PER_TIER * u32::from(tier);
        if self.economy.sp < cost {
            return Err(PowerUpError::InsufficientSp);
        }

        self.economy.sp -= cost;
        let tier = self.power.raise(kind).ok_or(PowerUpError::NotInDeck)?;
        Ok((tier, cost))
    }

    fn fire(&mut self, cell: CellIndex, target: MobId, out_events: &mut Vec<Event>) {
        if self.alive_mob_mut(target).is_none() {
            return;
        }
        let Some(geometry) = self.layout.cell(cell).copied() else {
            return;
        };
        let clock = self.clock;
        let Some(unit) = self.grid.get_mut(cell) else {
            return;
        };
        if !unit.ready(clock) {
            return;
        }

        let kind = unit.kind;
        let rank = unit.rank;
        let shot = unit.record_attack(clock);
        let power = self.power.tier(kind).unwrap_or(1);
        let id = self.allocate_projectile_id();
        let projectile = Projectile {
            id,
            kind,
            position: shot_origin(geometry.center(), geometry.size(), rank, shot),
            target,
            speed: PROJECTILE_SPEED,
            damage: compute_damage(kind, rank, power),
        };
        let _ = self.projectiles.insert(id, projectile);
        out_events.push(Event::ProjectileFired {
            projectile: id,
            cell,
            target,
        });
    }

    fn summon_boss(&mut self, out_events: &mut Vec<Event>) {
        let culled_hp: f32 = self
            .mobs
            .values()
            .filter(|mob| mob.is_alive() && !mob.kind.is_boss())
            .map(|mob| mob.hp)
            .sum();
        self.mobs.clear();

        let hp = boss_hp(self.waves.wave, culled_hp);
        let mob = self.spawn_mob(MobKind::Boss, hp);
        self.waves.enter(Phase::Boss);
        out_events.push(Event::BossSummoned { mob, hp, culled_hp });
        out_events.push(Event::PhaseChanged { phase: Phase::Boss });
    }

    fn sweep_casualties(&mut self, out_events: &mut Vec<Event>) {
        let casualties: Vec<MobId> = self
            .mobs
            .values()
            .filter(|mob| !mob.is_alive())
            .map(|mob| mob.id)
            .collect();
        for id in casualties {
            let Some(mob) = self.mobs.remove(&id) else {
                continue;
            };
            let profile = mob.kind.profile();
            if mob.hp <= 0.0 {
                self.economy.sp = self.economy.sp.saturating_add(profile.reward);
                out_events.push(Event::MobKilled {
                    mob: id,
                    kind: mob.kind,
                    reward: profile.reward,
                });
            } else {
                self.economy.lives -= profile.leak_penalty;
                out_events.push(Event::MobEscaped {
                    mob: id,
                    kind: mob.kind,
                    penalty: profile.leak_penalty,
                });
            }
        }
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => {
            let seconds = dt.as_secs_f32();
            world.clock += seconds;
            world.waves.advance(seconds);
            out_events.push(Event::TimeAdvanced { dt });

            world.advance_mobs(seconds);
            world.advance_projectiles(seconds, out_events);
        }
        Command::SummonUnit { cell, kind } => match world.summon(cell, kind) {
            Ok((cell, cost)) => out_events.push(Event::UnitSummoned { cell, kind, cost }),
            Err(reason) => out_events.push(Event::SummonRejected { reason }),
        },
        Command::MergeUnits {
            source,
            target,
            result,
        } => match world.merge(source, target, result) {
            Ok(rank) => out_events.push(Event::UnitsMerged {
                source,
                target,
                kind: result,
                rank,
            }),
            Err(reason) => out_events.push(Event::MergeRejected {
                source,
                target,
                reason,
            }),
        },
        Command::PowerUp { kind } => match world.power_up(kind) {
            Ok((tier, cost)) => out_events.push(Event::PowerUpApplied { kind, tier, cost }),
            Err(reason) => out_events.push(Event::PowerUpRejected { kind, reason }),
        },
        Command::SpawnMob { kind } => {
            if world.waves.phase != Phase::Normal || kind.is_boss() {
                return;
            }
            let hp = normal_mob_hp(kind, world.waves.wave, world.waves.scaling_counter);
            let mob = world.spawn_mob(kind, hp);
            out_events.push(Event::MobSpawned { mob, kind, hp });
        }
        Command::EscalateMobHp => {
            if world.waves.phase != Phase::Normal {
                return;
            }
            world.waves.escalation_elapsed =
                (world.waves.escalation_elapsed - HP_ESCALATION_SECONDS).max(0.0);
            world.waves.scaling_counter += 1;
            out_events.push(Event::HpEscalated {
                scaling_counter: world.waves.scaling_counter,
            });
        }
        Command::BeginGathering => {
            if world.waves.phase != Phase::Normal {
                return;
            }
            world.waves.enter(Phase::Gathering);
            out_events.push(Event::PhaseChanged {
                phase: Phase::Gathering,
            });
        }
        Command::SummonBoss => {
            if world.waves.phase != Phase::Gathering {
                return;
            }
            world.summon_boss(out_events);
        }
        Command::AdvanceWave => {
            let boss_alive = world.mobs.values().any(|mob| mob.kind.is_boss());
            if world.waves.phase != Phase::Boss || boss_alive {
                return;
            }
            world.waves.wave += 1;
            world.waves.scaling_counter = 0;
            world.waves.escalation_elapsed = 0.0;
            world.waves.enter(Phase::Normal);
            out_events.push(Event::WaveAdvanced {
                wave: world.waves.wave,
            });
            out_events.push(Event::PhaseChanged {
                phase: Phase::Normal,
            });
        }
        Command::FireProjectile { cell, target } => world.fire(cell, target, out_events),
        Command::DamageMob { mob, amount } => {
            if let Some(mob) = world.alive_mob_mut(mob) {
                mob.hp -= amount.max(0.0);
            }
        }
        Command::ApplyStatus { mob, effect } => {
            if let Some(mob) = world.alive_mob_mut(mob) {
                mob.apply_status(effect);
            }
        }
        Command::SweepCasualties => world.sweep_casualties(out_events),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use dice_defense_core::{
        geometry::{BoardLayout, BOARD_HEIGHT, BOARD_WIDTH},
        CellIndex, Deck, MapLayout, MobEntry, MobSnapshot, MobView, Phase, SessionSnapshot,
        UnitEntry, UnitKind, UnitSnapshot, UnitView, WaveSnapshot, NORMAL_PHASE_SECONDS,
    };

    use super::World;

    /// Provides read-only access to the immutable board geometry.
    #[must_use]
    pub fn layout(world: &World) -> &BoardLayout {
        &world.layout
    }

    /// Deck the world was created with.
    #[must_use]
    pub fn deck(world: &World) -> &Deck {
        &world.deck
    }

    /// Seconds of simulated time since the world was created.
    #[must_use]
    pub fn clock(world: &World) -> f32 {
        world.clock
    }

    /// SP currently in the pool.
    #[must_use]
    pub fn sp(world: &World) -> u32 {
        world.economy.sp
    }

    /// Cost of the next summon.
    #[must_use]
    pub fn summon_cost(world: &World) -> u32 {
        world.economy.summon_cost
    }

    /// Lives left; may be negative.
    #[must_use]
    pub fn lives(world: &World) -> i32 {
        world.economy.lives
    }

    /// Active wave phase.
    #[must_use]
    pub fn phase(world: &World) -> Phase {
        world.waves.phase
    }

    /// Normal-mob hp escalation steps accumulated in the current wave.
    #[must_use]
    pub fn scaling_counter(world: &World) -> u32 {
        world.waves.scaling_counter
    }

    /// Power tier of a deck kind, or `None` when the kind is not in the deck.
    #[must_use]
    pub fn power_tier(world: &World, kind: UnitKind) -> Option<u8> {
        world.power.tier(kind)
    }

    /// Captures the wave timers consumed by the wave system.
    #[must_use]
    pub fn wave_snapshot(world: &World) -> WaveSnapshot {
        WaveSnapshot {
            wave: world.waves.wave,
            phase: world.waves.phase,
            phase_elapsed: world.waves.phase_elapsed,
            escalation_elapsed: world.waves.escalation_elapsed,
            boss_alive: world.mobs.values().any(|mob| mob.kind.is_boss()),
        }
    }

    /// Cells without a unit, ordered by index.
    #[must_use]
    pub fn empty_cells(world: &World) -> Vec<CellIndex> {
        world.grid.empty_cells()
    }

    /// Captures a read-only view of the alive mobs.
    ///
    /// Dead mobs and mobs that reached the end of the path are excluded even
    /// before they are swept from the roster.
    #[must_use]
    pub fn mob_view(world: &World) -> MobView {
        let path = world.layout.path();
        let snapshots: Vec<MobSnapshot> = world
            .mobs
            .values()
            .filter(|mob| mob.is_alive())
            .map(|mob| mob.snapshot(path))
            .collect();
        MobView::from_snapshots(snapshots)
    }

    /// Captures a read-only view of the placed units.
    #[must_use]
    pub fn unit_view(world: &World) -> UnitView {
        let snapshots: Vec<UnitSnapshot> = world
            .grid
            .iter()
            .filter_map(|(cell, unit)| {
                let geometry = world.layout.cell(cell)?;
                Some(UnitSnapshot {
                    cell,
                    kind: unit.kind,
                    rank: unit.rank,
                    power: world.power.tier(unit.kind).unwrap_or(1),
                    center: geometry.center(),
                    ready: unit.ready(world.clock),
                })
            })
            .collect();
        UnitView::from_snapshots(snapshots)
    }

    /// Produces an owned, serializable snapshot of the session state.
    #[must_use]
    pub fn snapshot(world: &World) -> SessionSnapshot {
        let timer = match world.waves.phase {
            Phase::Normal => (NORMAL_PHASE_SECONDS - world.waves.phase_elapsed)
                .ceil()
                .max(0.0) as u32,
            Phase::Gathering | Phase::Boss => 0,
        };
        SessionSnapshot {
            sp: world.economy.sp,
            spawn_cost: world.economy.summon_cost,
            lives: world.economy.lives,
            wave: world.waves.wave,
            phase: world.waves.phase,
            timer,
            grid: world
                .grid
                .slots()
                .iter()
                .map(|slot| {
                    slot.as_ref().map(|unit| UnitEntry {
                        kind: unit.kind,
                        rank: unit.rank,
                        power: world.power.tier(unit.kind).unwrap_or(1),
                    })
                })
                .collect(),
            entities: world
                .mobs
                .values()
                .filter(|mob| mob.is_alive())
                .map(|mob| MobEntry {
                    id: mob.id,
                    kind: mob.kind,
                    x: mob.position.x,
                    y: mob.position.y,
                    hp: mob.hp,
                    max_hp: mob.max_hp,
                    radius: mob.hit_radius,
                })
                .collect(),
            projectiles: world
                .projectiles
                .values()
                .map(|projectile| projectile.entry())
                .collect(),
        }
    }

    /// Static board geometry sent to clients when they connect.
    #[must_use]
    pub fn map_layout(world: &World) -> MapLayout {
        MapLayout {
            width: BOARD_WIDTH,
            height: BOARD_HEIGHT,
            path: world.layout.path().waypoints().to_vec(),
            grid: world.layout.cells().to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use dice_defense_core::{StatusEffect, StatusKind};

    use super::*;

    fn deck() -> Deck {
        Deck::new(vec![
            UnitKind::Fire,
            UnitKind::Electric,
            UnitKind::Wind,
            UnitKind::Poison,
            UnitKind::Ice,
        ])
        .expect("valid deck")
    }

    fn tick(world: &mut World, seconds: f32, events: &mut Vec<Event>) {
        apply(
            world,
            Command::Tick {
                dt: Duration::from_secs_f32(seconds),
            },
            events,
        );
    }

    fn summon(world: &mut World, cell: u32, kind: UnitKind) -> Vec<Event> {
        let mut events = Vec::new();
        apply(
            world,
            Command::SummonUnit {
                cell: Some(CellIndex::new(cell)),
                kind,
            },
            &mut events,
        );
        events
    }

    #[test]
    fn summon_charges_growing_cost() {
        let mut world = World::new(deck());
        assert_eq!(
            summon(&mut world, 0, UnitKind::Fire),
            vec![Event::UnitSummoned {
                cell: CellIndex::new(0),
                kind: UnitKind::Fire,
                cost: 10,
            }]
        );
        let _ = summon(&mut world, 1, UnitKind::Ice);
        assert_eq!(query::sp(&world), 70);
        assert_eq!(query::summon_cost(&world), 30);
    }

    #[test]
    fn summon_rejections_leave_state_untouched() {
        let mut world = World::new(deck());
        let _ = summon(&mut world, 4, UnitKind::Fire);
        let before = query::snapshot(&world);

        assert_eq!(
            summon(&mut world, 4, UnitKind::Wind),
            vec![Event::SummonRejected {
                reason: SummonError::CellOccupied,
            }]
        );
        assert_eq!(
            summon(&mut world, 15, UnitKind::Wind),
            vec![Event::SummonRejected {
                reason: SummonError::OutOfBounds,
            }]
        );
        assert_eq!(
            summon(&mut world, 5, UnitKind::Iron),
            vec![Event::SummonRejected {
                reason: SummonError::NotInDeck,
            }]
        );

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::SummonUnit {
                cell: None,
                kind: UnitKind::Fire,
            },
            &mut events,
        );
        assert_eq!(
            events,
            vec![Event::SummonRejected {
                reason: SummonError::BoardFull,
            }]
        );
        assert_eq!(query::snapshot(&world), before);
    }

    #[test]
    fn merge_upgrades_target_and_empties_source() {
        let mut world = World::new(deck());
        let _ = summon(&mut world, 0, UnitKind::Fire);
        let _ = summon(&mut world, 1, UnitKind::Fire);

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::MergeUnits {
                source: CellIndex::new(0),
                target: CellIndex::new(1),
                result: UnitKind::Ice,
            },
            &mut events,
        );

        let snapshot = query::snapshot(&world);
        assert!(snapshot.grid[0].is_none());
        let merged = snapshot.grid[1].expect("merged unit");
        assert_eq!(merged.rank, 2);
        assert_eq!(merged.kind, UnitKind::Ice);
        assert!(matches!(events[0], Event::UnitsMerged { rank: 2, .. }));
    }

    #[test]
    fn invalid_merges_are_rejected_without_mutation() {
        let mut world = World::new(deck());
        let _ = summon(&mut world, 0, UnitKind::Fire);
        let _ = summon(&mut world, 1, UnitKind::Wind);
        let before = query::snapshot(&world);

        let cases = [
            (0, 0, MergeError::SelfMerge),
            (0, 1, MergeError::Mismatch),
            (0, 2, MergeError::EmptyCell),
            (0, 40, MergeError::OutOfBounds),
        ];
        for (source, target, expected) in cases {
            let mut events = Vec::new();
            apply(
                &mut world,
                Command::MergeUnits {
                    source: CellIndex::new(source),
                    target: CellIndex::new(target),
                    result: UnitKind::Fire,
                },
                &mut events,
            );
            assert_eq!(
                events,
                vec![Event::MergeRejected {
                    source: CellIndex::new(source),
                    target: CellIndex::new(target),
                    reason: expected,
                }]
            );
        }
        assert_eq!(query::snapshot(&world), before);
    }

    #[test]
    fn power_up_raises_tier_and_charges_sp() {
        let mut world = World::new(deck());
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::PowerUp {
                kind: UnitKind::Fire,
            },
            &mut events,
        );
        assert_eq!(
            events,
            vec![Event::PowerUpApplied {
                kind: UnitKind::Fire,
                tier: 2,
                cost: 100,
            }]
        );
        assert_eq!(query::sp(&world), 0);
        assert_eq!(query::power_tier(&world, UnitKind::Fire), Some(2));

        events.clear();
        apply(
            &mut world,
            Command::PowerUp {
                kind: UnitKind::Fire,
            },
            &mut events,
        );
        assert_eq!(
            events,
            vec![Event::PowerUpRejected {
                kind: UnitKind::Fire,
                reason: PowerUpError::InsufficientSp,
            }]
        );
    }

    #[test]
    fn spawned_mobs_use_wave_hp_and_walk_the_path() {
        let mut world = World::new(deck());
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::SpawnMob {
                kind: MobKind::Big,
            },
            &mut events,
        );
        assert_eq!(
            events,
            vec![Event::MobSpawned {
                mob: MobId::new(0),
                kind: MobKind::Big,
                hp: 300.0,
            }]
        );

        tick(&mut world, 1.0, &mut events);
        let view = query::mob_view(&world);
        let mob = view.get(MobId::new(0)).expect("mob alive");
        assert_eq!(mob.position.x, 120.0);
        assert!((mob.position.y - 1170.0).abs() < 1e-3);
    }

    #[test]
    fn projectile_against_removed_target_is_discarded() {
        let mut world = World::new(deck());
        let _ = summon(&mut world, 0, UnitKind::Fire);
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::SpawnMob {
                kind: MobKind::Normal,
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::FireProjectile {
                cell: CellIndex::new(0),
                target: MobId::new(0),
            },
            &mut events,
        );
        assert_eq!(query::snapshot(&world).projectiles.len(), 1);

        apply(
            &mut world,
            Command::DamageMob {
                mob: MobId::new(0),
                amount: 1000.0,
            },
            &mut events,
        );
        apply(&mut world, Command::SweepCasualties, &mut events);
        events.clear();

        tick(&mut world, 1.0 / 30.0, &mut events);
        assert!(events.contains(&Event::ProjectileDiscarded {
            projectile: ProjectileId::new(0),
        }));
        assert!(!events
            .iter()
            .any(|event| matches!(event, Event::ProjectileImpacted { .. })));
        assert!(query::snapshot(&world).projectiles.is_empty());
    }

    #[test]
    fn firing_respects_cooldown() {
        let mut world = World::new(deck());
        let _ = summon(&mut world, 0, UnitKind::Fire);
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::SpawnMob {
                kind: MobKind::Big,
            },
            &mut events,
        );
        let fire = Command::FireProjectile {
            cell: CellIndex::new(0),
            target: MobId::new(0),
        };
        events.clear();
        apply(&mut world, fire.clone(), &mut events);
        apply(&mut world, fire, &mut events);
        let fired = events
            .iter()
            .filter(|event| matches!(event, Event::ProjectileFired { .. }))
            .count();
        assert_eq!(fired, 1);
        assert!(!query::unit_view(&world).iter().any(|unit| unit.ready));
    }

    #[test]
    fn sweep_rewards_kills_and_penalises_leaks() {
        let mut world = World::new(deck());
        let mut events = Vec::new();
        for _ in 0..2 {
            apply(
                &mut world,
                Command::SpawnMob {
                    kind: MobKind::Normal,
                },
                &mut events,
            );
        }
        apply(
            &mut world,
            Command::DamageMob {
                mob: MobId::new(0),
                amount: 100.0,
            },
            &mut events,
        );
        apply(&mut world, Command::SweepCasualties, &mut events);
        assert_eq!(query::sp(&world), 110);

        for _ in 0..40 {
            tick(&mut world, 1.0, &mut events);
        }
        events.clear();
        apply(&mut world, Command::SweepCasualties, &mut events);
        assert_eq!(
            events,
            vec![Event::MobEscaped {
                mob: MobId::new(1),
                kind: MobKind::Normal,
                penalty: 1,
            }]
        );
        assert_eq!(query::lives(&world), 2);
    }

    #[test]
    fn boss_absorbs_remaining_normal_hp() {
        let mut world = World::new(deck());
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::SpawnMob {
                kind: MobKind::Normal,
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::ApplyStatus {
                mob: MobId::new(0),
                effect: StatusEffect::slow(0.3, 2.0),
            },
            &mut events,
        );
        assert!(query::mob_view(&world)
            .get(MobId::new(0))
            .is_some_and(|mob| mob.statuses.contains(StatusKind::Slow)));

        apply(&mut world, Command::SummonBoss, &mut events);
        assert_eq!(query::mob_view(&world).len(), 1, "boss needs gathering");

        apply(&mut world, Command::BeginGathering, &mut events);
        events.clear();
        apply(&mut world, Command::SummonBoss, &mut events);
        assert_eq!(
            events,
            vec![
                Event::BossSummoned {
                    mob: MobId::new(1),
                    hp: 1100.0,
                    culled_hp: 100.0,
                },
                Event::PhaseChanged { phase: Phase::Boss },
            ]
        );
        let view = query::mob_view(&world);
        assert_eq!(view.len(), 1);
        assert!(view.iter().all(|mob| mob.is_boss()));
    }

    #[test]
    fn advance_wave_waits_for_boss_removal() {
        let mut world = World::new(deck());
        let mut events = Vec::new();
        apply(&mut world, Command::EscalateMobHp, &mut events);
        apply(&mut world, Command::BeginGathering, &mut events);
        apply(&mut world, Command::SummonBoss, &mut events);

        apply(&mut world, Command::AdvanceWave, &mut events);
        assert_eq!(query::wave_snapshot(&world).wave, 1);

        apply(
            &mut world,
            Command::DamageMob {
                mob: MobId::new(0),
                amount: 5000.0,
            },
            &mut events,
        );
        apply(&mut world, Command::SweepCasualties, &mut events);
        apply(&mut world, Command::AdvanceWave, &mut events);

        let waves = query::wave_snapshot(&world);
        assert_eq!(waves.wave, 2);
        assert_eq!(waves.phase, Phase::Normal);
        assert_eq!(query::scaling_counter(&world), 0);
    }

    #[test]
    fn snapshot_reports_normal_phase_timer() {
        let mut world = World::new(deck());
        let mut events = Vec::new();
        assert_eq!(query::snapshot(&world).timer, 30);
        tick(&mut world, 2.5, &mut events);
        assert_eq!(query::snapshot(&world).timer, 28);
    }

    #[test]
    fn map_layout_exposes_path_and_cells() {
        let world = World::new(deck());
        let map = query::map_layout(&world);
        assert_eq!(map.path.len(), 4);
        assert_eq!(map.grid.len(), 15);
        assert_eq!(map.width, 1080.0);
    }
}
