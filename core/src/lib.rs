#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Dice Defense engine.
//!
//! This crate defines the message surface that connects the session loop, the
//! authoritative world, and pure systems. The session submits [`Command`]
//! values describing desired mutations, the world executes those commands via
//! its `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume event streams, query immutable
//! views, and respond exclusively with new command batches.

pub mod geometry;
pub mod mobs;
pub mod snapshot;
pub mod units;

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use geometry::{BoardLayout, GridMapper, LogicalPoint, Path, PlacementCell, WorldPoint};
pub use mobs::{MobKind, MobProfile, StatusEffect, StatusKind, StatusMask};
pub use snapshot::{MapLayout, MobEntry, ProjectileEntry, SessionSnapshot, UnitEntry};
pub use units::{OnHit, Targeting, UnitKind, UnitProfile, UnknownUnitKind};

/// Seconds the normal phase lasts before gathering starts.
pub const NORMAL_PHASE_SECONDS: f32 = 30.0;
/// Seconds the gathering phase lasts before the boss appears.
pub const GATHERING_PHASE_SECONDS: f32 = 2.0;
/// Seconds between two normal-mob hp escalations.
pub const HP_ESCALATION_SECONDS: f32 = 10.0;
/// SP available when a session starts.
pub const STARTING_SP: u32 = 100;
/// Cost of the first summon in a session.
pub const STARTING_SUMMON_COST: u32 = 10;
/// Amount the summon cost grows after every successful summon.
pub const SUMMON_COST_STEP: u32 = 10;
/// Lives available when a session starts.
pub const STARTING_LIVES: i32 = 3;
/// SP cost of a power-up per current power tier.
pub const POWER_UP_COST_PER_TIER: u32 = 100;
/// Travel speed of projectiles in pixels per second.
pub const PROJECTILE_SPEED: f32 = 900.0;
/// Slack added to a mob's hit radius when checking projectile impact.
pub const IMPACT_EPSILON: f32 = 5.0;
/// Largest number of unit kinds a deck may carry.
pub const MAX_DECK_SIZE: usize = 5;

/// Phase of the active wave.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Mobs spawn on a timer while their hp escalates.
    #[default]
    Normal,
    /// Spawning pauses before the boss arrives.
    Gathering,
    /// A single boss walks the path.
    Boss,
}

/// Gameplay actions submitted by players, queued until the next tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PlayerCommand {
    /// Summons a random deck unit into a random empty cell.
    Summon,
    /// Merges the unit in `source` into the unit in `target`.
    Merge {
        /// Cell holding the unit that is consumed.
        source: CellIndex,
        /// Cell receiving the upgraded unit.
        target: CellIndex,
    },
    /// Raises the power tier of a deck unit kind.
    PowerUp {
        /// Kind whose power tier should grow.
        kind: UnitKind,
    },
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Requests a summon of `kind`; `cell` is `None` when no empty cell exists.
    SummonUnit {
        /// Empty cell chosen for the unit.
        cell: Option<CellIndex>,
        /// Kind rolled from the deck.
        kind: UnitKind,
    },
    /// Requests a merge of two equal units, producing `result` in the target cell.
    MergeUnits {
        /// Cell holding the unit that is consumed.
        source: CellIndex,
        /// Cell receiving the upgraded unit.
        target: CellIndex,
        /// Kind rolled from the deck for the upgraded unit.
        result: UnitKind,
    },
    /// Requests a power-tier upgrade for a deck kind.
    PowerUp {
        /// Kind whose power tier should grow.
        kind: UnitKind,
    },
    /// Requests that a mob of `kind` enters at the start of the path.
    SpawnMob {
        /// Kind of mob to spawn.
        kind: MobKind,
    },
    /// Raises the hp of subsequently spawned normal-phase mobs by one step.
    EscalateMobHp,
    /// Ends the normal phase.
    BeginGathering,
    /// Absorbs the remaining normal mobs into a freshly spawned boss.
    SummonBoss,
    /// Starts the next wave once the boss roster is empty.
    AdvanceWave,
    /// Fires a projectile from the unit in `cell` at `target`.
    FireProjectile {
        /// Cell of the attacking unit.
        cell: CellIndex,
        /// Mob selected as the target.
        target: MobId,
    },
    /// Removes `amount` hp from a mob.
    DamageMob {
        /// Mob receiving the damage.
        mob: MobId,
        /// Hp to remove.
        amount: f32,
    },
    /// Attaches a status effect to a mob, replacing an active one of the same kind.
    ApplyStatus {
        /// Mob receiving the effect.
        mob: MobId,
        /// Effect to attach.
        effect: StatusEffect,
    },
    /// Removes dead and finished mobs, settling rewards and penalties.
    SweepCasualties,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that a unit was placed into a cell.
    UnitSummoned {
        /// Cell now holding the unit.
        cell: CellIndex,
        /// Kind of the new unit.
        kind: UnitKind,
        /// SP spent on the summon.
        cost: u32,
    },
    /// Reports that a summon request was rejected.
    SummonRejected {
        /// Reason for the rejection.
        reason: SummonError,
    },
    /// Confirms that two units merged.
    UnitsMerged {
        /// Cell emptied by the merge.
        source: CellIndex,
        /// Cell holding the upgraded unit.
        target: CellIndex,
        /// Kind of the upgraded unit.
        kind: UnitKind,
        /// Rank of the upgraded unit.
        rank: u8,
    },
    /// Reports that a merge request was rejected.
    MergeRejected {
        /// Cell named as the merge source.
        source: CellIndex,
        /// Cell named as the merge target.
        target: CellIndex,
        /// Reason for the rejection.
        reason: MergeError,
    },
    /// Confirms that a deck kind gained a power tier.
    PowerUpApplied {
        /// Kind that was upgraded.
        kind: UnitKind,
        /// Tier now active for the kind.
        tier: u8,
        /// SP spent on the upgrade.
        cost: u32,
    },
    /// Reports that a power-up request was rejected.
    PowerUpRejected {
        /// Kind named in the request.
        kind: UnitKind,
        /// Reason for the rejection.
        reason: PowerUpError,
    },
    /// Confirms that a mob entered the path.
    MobSpawned {
        /// Identifier assigned to the mob.
        mob: MobId,
        /// Kind of the mob.
        kind: MobKind,
        /// Hp assigned at spawn.
        hp: f32,
    },
    /// Announces that normal-phase mob hp escalated.
    HpEscalated {
        /// Escalation steps accumulated in the current wave.
        scaling_counter: u32,
    },
    /// Announces that the wave entered a new phase.
    PhaseChanged {
        /// Phase that became active.
        phase: Phase,
    },
    /// Confirms that the boss spawned after absorbing the remaining mobs.
    BossSummoned {
        /// Identifier assigned to the boss.
        mob: MobId,
        /// Hp assigned to the boss.
        hp: f32,
        /// Hp of the normal mobs removed from the roster.
        culled_hp: f32,
    },
    /// Announces that a new wave started.
    WaveAdvanced {
        /// Number of the wave that started.
        wave: u32,
    },
    /// Confirms that a unit fired a projectile.
    ProjectileFired {
        /// Identifier assigned to the projectile.
        projectile: ProjectileId,
        /// Cell of the attacking unit.
        cell: CellIndex,
        /// Mob targeted by the projectile.
        target: MobId,
    },
    /// Reports that a projectile reached its target and was removed.
    ProjectileImpacted {
        /// Identifier of the projectile.
        projectile: ProjectileId,
        /// Unit kind that fired the projectile.
        kind: UnitKind,
        /// Mob that was struck.
        target: MobId,
        /// Damage payload carried by the projectile.
        damage: f32,
    },
    /// Reports that a projectile lost its target and was removed without effect.
    ProjectileDiscarded {
        /// Identifier of the projectile.
        projectile: ProjectileId,
    },
    /// Reports that a mob died and its reward was paid out.
    MobKilled {
        /// Identifier of the mob.
        mob: MobId,
        /// Kind of the mob.
        kind: MobKind,
        /// SP awarded.
        reward: u32,
    },
    /// Reports that a mob reached the end of the path.
    MobEscaped {
        /// Identifier of the mob.
        mob: MobId,
        /// Kind of the mob.
        kind: MobKind,
        /// Lives removed.
        penalty: i32,
    },
}

/// Reasons a summon request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SummonError {
    /// The pool holds less SP than the current summon cost.
    InsufficientSp,
    /// Every placement cell is occupied.
    BoardFull,
    /// The chosen cell already holds a unit.
    CellOccupied,
    /// The chosen cell does not exist.
    OutOfBounds,
    /// The rolled kind is not part of the session deck.
    NotInDeck,
}

/// Reasons a merge request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MergeError {
    /// One of the cells does not exist.
    OutOfBounds,
    /// Source and target name the same cell.
    SelfMerge,
    /// One of the cells is empty.
    EmptyCell,
    /// The units differ in kind or rank.
    Mismatch,
    /// The units already have the highest rank.
    MaxRank,
}

/// Reasons a power-up request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerUpError {
    /// The kind is not part of the session deck.
    NotInDeck,
    /// The kind already has the highest power tier.
    MaxTier,
    /// The pool holds less SP than the upgrade cost.
    InsufficientSp,
}

/// Stable index of a placement cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CellIndex(u32);

impl CellIndex {
    /// Creates a new cell index wrapper.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the underlying index.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a mob.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MobId(u32);

impl MobId {
    /// Creates a new identifier wrapper.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the underlying numeric identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a projectile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectileId(u32);

impl ProjectileId {
    /// Creates a new identifier wrapper.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the underlying numeric identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Reasons a starting deck may be refused.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum DeckError {
    /// The deck holds no unit kinds.
    #[error("deck must contain at least one unit kind")]
    Empty,
    /// The deck holds more kinds than allowed.
    #[error("deck holds {0} unit kinds, at most {max} are allowed", max = MAX_DECK_SIZE)]
    TooLarge(usize),
    /// The same kind appears more than once.
    #[error("unit kind `{0}` appears more than once in the deck")]
    Duplicate(UnitKind),
}

/// Ordered set of unit kinds a session may summon.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Deck {
    kinds: Vec<UnitKind>,
}

impl Deck {
    /// Validates and wraps the provided unit kinds.
    pub fn new(kinds: Vec<UnitKind>) -> Result<Self, DeckError> {
        if kinds.is_empty() {
            return Err(DeckError::Empty);
        }
        if kinds.len() > MAX_DECK_SIZE {
            return Err(DeckError::TooLarge(kinds.len()));
        }
        for (position, kind) in kinds.iter().enumerate() {
            if kinds[..position].contains(kind) {
                return Err(DeckError::Duplicate(*kind));
            }
        }
        Ok(Self { kinds })
    }

    /// Unit kinds in deck order.
    #[must_use]
    pub fn kinds(&self) -> &[UnitKind] {
        &self.kinds
    }

    /// Reports whether the deck carries `kind`.
    #[must_use]
    pub fn contains(&self, kind: UnitKind) -> bool {
        self.kinds.contains(&kind)
    }
}

/// Immutable representation of a single mob's state used for queries.
#[derive(Clone, Debug, PartialEq)]
pub struct MobSnapshot {
    /// Unique identifier assigned to the mob.
    pub id: MobId,
    /// Kind of the mob.
    pub kind: MobKind,
    /// Remaining hp.
    pub hp: f32,
    /// Hp assigned at spawn.
    pub max_hp: f32,
    /// Current world position.
    pub position: WorldPoint,
    /// Index of the waypoint the mob is walking toward.
    pub path_index: usize,
    /// Remaining distance to that waypoint.
    pub distance_to_waypoint: f32,
    /// Radius used for impact checks.
    pub hit_radius: f32,
    /// Status kinds currently active.
    pub statuses: StatusMask,
}

impl MobSnapshot {
    /// Reports whether the mob is the wave boss.
    #[must_use]
    pub const fn is_boss(&self) -> bool {
        self.kind.is_boss()
    }
}

/// Read-only snapshot describing every alive mob on the path.
#[derive(Clone, Debug, Default)]
pub struct MobView {
    snapshots: Vec<MobSnapshot>,
}

impl MobView {
    /// Creates a new mob view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<MobSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured mob snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &MobSnapshot> {
        self.snapshots.iter()
    }

    /// Snapshot of the mob with the provided identifier, if it is alive.
    #[must_use]
    pub fn get(&self, id: MobId) -> Option<&MobSnapshot> {
        self.snapshots
            .binary_search_by_key(&id, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Number of captured mobs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view captured no mobs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<MobSnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a placed unit used for queries.
#[derive(Clone, Debug, PartialEq)]
pub struct UnitSnapshot {
    /// Cell occupied by the unit.
    pub cell: CellIndex,
    /// Kind of the unit.
    pub kind: UnitKind,
    /// Merge rank.
    pub rank: u8,
    /// Power tier of the unit's kind.
    pub power: u8,
    /// Center of the occupied cell.
    pub center: WorldPoint,
    /// Indicates whether the attack cooldown has elapsed.
    pub ready: bool,
}

/// Read-only snapshot describing every placed unit.
#[derive(Clone, Debug, Default)]
pub struct UnitView {
    snapshots: Vec<UnitSnapshot>,
}

impl UnitView {
    /// Creates a new unit view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<UnitSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.cell);
        Self { snapshots }
    }

    /// Iterator over the captured unit snapshots ordered by cell.
    pub fn iter(&self) -> impl Iterator<Item = &UnitSnapshot> {
        self.snapshots.iter()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<UnitSnapshot> {
        self.snapshots
    }
}

/// Target assignment computed for a placed unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UnitTarget {
    /// Cell of the unit that would fire.
    pub cell: CellIndex,
    /// Mob selected as the target.
    pub mob: MobId,
}

/// Wave timers exposed to the wave system.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WaveSnapshot {
    /// Current wave number, starting at one.
    pub wave: u32,
    /// Active phase.
    pub phase: Phase,
    /// Seconds spent in the active phase.
    pub phase_elapsed: f32,
    /// Seconds accumulated toward the next hp escalation.
    pub escalation_elapsed: f32,
    /// Indicates whether a boss is on the path.
    pub boss_alive: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mob(id: u32, hp: f32) -> MobSnapshot {
        MobSnapshot {
            id: MobId::new(id),
            kind: MobKind::Normal,
            hp,
            max_hp: hp,
            position: WorldPoint::default(),
            path_index: 1,
            distance_to_waypoint: 0.0,
            hit_radius: 30.0,
            statuses: StatusMask::EMPTY,
        }
    }

    #[test]
    fn deck_rejects_invalid_compositions() {
        assert_eq!(Deck::new(Vec::new()), Err(DeckError::Empty));
        assert_eq!(
            Deck::new(vec![UnitKind::Fire, UnitKind::Ice, UnitKind::Fire]),
            Err(DeckError::Duplicate(UnitKind::Fire))
        );
        assert_eq!(
            Deck::new(UnitKind::ALL.to_vec()),
            Err(DeckError::TooLarge(6))
        );
    }

    #[test]
    fn deck_preserves_order() {
        let deck = Deck::new(vec![UnitKind::Iron, UnitKind::Fire]).expect("valid deck");
        assert_eq!(deck.kinds(), &[UnitKind::Iron, UnitKind::Fire]);
        assert!(deck.contains(UnitKind::Fire));
        assert!(!deck.contains(UnitKind::Ice));
    }

    #[test]
    fn mob_view_orders_and_looks_up_by_id() {
        let view = MobView::from_snapshots(vec![mob(7, 1.0), mob(2, 2.0), mob(4, 3.0)]);
        let ids: Vec<u32> = view.iter().map(|snapshot| snapshot.id.get()).collect();
        assert_eq!(ids, vec![2, 4, 7]);
        assert_eq!(view.get(MobId::new(4)).map(|snapshot| snapshot.hp), Some(3.0));
        assert!(view.get(MobId::new(5)).is_none());
        assert_eq!(view.len(), 3);
    }

    #[test]
    fn phase_serializes_lowercase() {
        let encoded = serde_json::to_string(&Phase::Gathering).expect("serialize");
        assert_eq!(encoded, "\"gathering\"");
    }
}
