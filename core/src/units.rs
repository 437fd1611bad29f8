//! Static catalog of unit ("die") kinds and their combat formulas.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{geometry::WorldPoint, mobs::StatusKind};

/// Highest rank a unit can reach through merging.
pub const MAX_RANK: u8 = 7;
/// Highest in-session power tier a unit kind can reach.
pub const MAX_POWER_TIER: u8 = 5;
/// Lowest attack interval any unit may have, in seconds.
pub const MIN_ATTACK_INTERVAL: f32 = 0.3;

/// Pip offsets in quarter-cell units for ranks one through six.
const PIP_LAYOUTS: [&[(f32, f32)]; 6] = [
    &[(0.0, 0.0)],
    &[(-1.0, -1.0), (1.0, 1.0)],
    &[(-1.0, -1.0), (0.0, 0.0), (1.0, 1.0)],
    &[(-1.0, -1.0), (1.0, -1.0), (-1.0, 1.0), (1.0, 1.0)],
    &[(-1.0, -1.0), (1.0, -1.0), (0.0, 0.0), (-1.0, 1.0), (1.0, 1.0)],
    &[
        (-1.0, -1.0),
        (-1.0, 0.0),
        (-1.0, 1.0),
        (1.0, -1.0),
        (1.0, 0.0),
        (1.0, 1.0),
    ],
];

/// Kinds of units that may appear in a deck.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitKind {
    /// Splash damage around the struck mob.
    Fire,
    /// Chain lightning that jumps to nearby mobs with falloff.
    Electric,
    /// Plain single-target attacker that speeds up with rank.
    Wind,
    /// Applies damage over time, preferring mobs that are not yet poisoned.
    Poison,
    /// Slows the struck mob.
    Ice,
    /// Heavy hitter that deals bonus damage to bosses.
    Iron,
}

impl UnitKind {
    /// Every registered kind in catalog order.
    pub const ALL: [UnitKind; 6] = [
        UnitKind::Fire,
        UnitKind::Electric,
        UnitKind::Wind,
        UnitKind::Poison,
        UnitKind::Ice,
        UnitKind::Iron,
    ];

    /// Stable identifier used on the wire and by deck sources.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Fire => "fire",
            Self::Electric => "electric",
            Self::Wind => "wind",
            Self::Poison => "poison",
            Self::Ice => "ice",
            Self::Iron => "iron",
        }
    }

    /// Static combat profile registered for the kind.
    #[must_use]
    pub const fn profile(self) -> &'static UnitProfile {
        match self {
            Self::Fire => &FIRE,
            Self::Electric => &ELECTRIC,
            Self::Wind => &WIND,
            Self::Poison => &POISON,
            Self::Ice => &ICE,
            Self::Iron => &IRON,
        }
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Returned when a unit identifier does not match any registered kind.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("unknown unit kind `{0}`")]
pub struct UnknownUnitKind(pub String);

impl FromStr for UnitKind {
    type Err = UnknownUnitKind;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        UnitKind::ALL
            .into_iter()
            .find(|kind| kind.id() == value)
            .ok_or_else(|| UnknownUnitKind(value.to_owned()))
    }
}

/// Behaviour applied when a projectile reaches its target.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum OnHit {
    /// Full damage to the struck mob only.
    Single,
    /// Full damage to the struck mob plus `ratio` of it to every other mob within `radius`.
    Splash {
        /// Splash radius in pixels, measured from the struck mob.
        radius: f32,
        /// Fraction of the damage dealt to splashed mobs.
        ratio: f32,
    },
    /// Damage jumps to the closest unvisited mob within `range`, once per falloff entry.
    Chain {
        /// Maximum jump distance in pixels.
        range: f32,
        /// Damage fractions for each successive jump.
        falloff: [f32; 2],
    },
    /// Hit damage plus a poison effect dealing `ratio * damage` per second.
    DamageOverTime {
        /// Seconds the poison lasts.
        duration: f32,
        /// Damage per second as a fraction of the hit damage.
        ratio: f32,
    },
    /// Hit damage plus a slow reducing speed by `slow`.
    Frost {
        /// Seconds the slow lasts.
        duration: f32,
        /// Fraction of speed removed while slowed.
        slow: f32,
    },
    /// Damage multiplied by `boss_multiplier` when the target is a boss.
    ArmorPiercing {
        /// Multiplier applied against bosses.
        boss_multiplier: f32,
    },
}

/// Rule used to pick a target among the alive mobs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Targeting {
    /// Mob furthest along the path.
    Frontmost,
    /// Frontmost mob not carrying the status; falls back to [`Targeting::Frontmost`].
    FrontmostUnaffected(StatusKind),
    /// Closest mob to the unit within `radius` pixels.
    NearestInRadius {
        /// Search radius in pixels, measured from the unit's cell center.
        radius: f32,
    },
    /// Mob with the highest remaining hp, ties broken by path progress.
    Strongest,
}

/// Registry entry describing how a unit kind fights.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UnitProfile {
    /// Damage at rank one and power tier one.
    pub base_attack: f32,
    /// Damage added for every rank above one.
    pub class_up: f32,
    /// Damage added for every power tier above one.
    pub power_up: f32,
    /// Seconds between attacks at rank one.
    pub base_interval: f32,
    /// Seconds removed from the interval for every rank above one.
    pub interval_step: f32,
    /// On-hit behaviour of the kind's projectiles.
    pub on_hit: OnHit,
    /// Target selection rule.
    pub targeting: Targeting,
}

impl UnitProfile {
    /// Damage payload for the provided rank and power tier.
    ///
    /// Ranks and tiers below one are clamped to one.
    #[must_use]
    pub fn damage(&self, rank: u8, power: u8) -> f32 {
        let rank = f32::from(rank.max(1) - 1);
        let power = f32::from(power.max(1) - 1);
        self.base_attack + rank * self.class_up + power * self.power_up
    }

    /// Seconds between attacks at the provided rank, never below [`MIN_ATTACK_INTERVAL`].
    #[must_use]
    pub fn interval(&self, rank: u32) -> f32 {
        let steps = rank.max(1) - 1;
        let reduced = self.base_interval - steps as f32 * self.interval_step;
        reduced.max(MIN_ATTACK_INTERVAL)
    }
}

/// Damage of `kind` at `rank` and `power` tier.
#[must_use]
pub fn compute_damage(kind: UnitKind, rank: u8, power: u8) -> f32 {
    kind.profile().damage(rank, power)
}

/// Attack interval of `kind` at `rank`, in seconds.
#[must_use]
pub fn compute_interval(kind: UnitKind, rank: u8) -> f32 {
    kind.profile().interval(u32::from(rank))
}

/// Number of pip positions a unit of `rank` cycles through.
///
/// Ranks of seven and above fire from the cell center only.
#[must_use]
pub fn pip_count(rank: u8) -> usize {
    match rank {
        1..=6 => PIP_LAYOUTS[usize::from(rank - 1)].len(),
        _ => 1,
    }
}

/// Origin of the `shot`-th projectile fired by a unit of `rank` in a cell.
#[must_use]
pub fn shot_origin(center: WorldPoint, cell_size: f32, rank: u8, shot: usize) -> WorldPoint {
    let layout = match rank {
        1..=6 => PIP_LAYOUTS[usize::from(rank - 1)],
        _ => return center,
    };
    let (dx, dy) = layout[shot % layout.len()];
    let quarter = cell_size / 4.0;
    center.offset(dx * quarter, dy * quarter)
}

const FIRE: UnitProfile = UnitProfile {
    base_attack: 20.0,
    class_up: 5.0,
    power_up: 10.0,
    base_interval: 0.8,
    interval_step: 0.0,
    on_hit: OnHit::Splash {
        radius: 120.0,
        ratio: 0.5,
    },
    targeting: Targeting::Frontmost,
};

const ELECTRIC: UnitProfile = UnitProfile {
    base_attack: 15.0,
    class_up: 4.0,
    power_up: 8.0,
    base_interval: 0.7,
    interval_step: 0.0,
    on_hit: OnHit::Chain {
        range: 200.0,
        falloff: [0.7, 0.3],
    },
    targeting: Targeting::Frontmost,
};

const WIND: UnitProfile = UnitProfile {
    base_attack: 8.0,
    class_up: 2.0,
    power_up: 5.0,
    base_interval: 0.6,
    interval_step: 0.01,
    on_hit: OnHit::Single,
    targeting: Targeting::Frontmost,
};

const POISON: UnitProfile = UnitProfile {
    base_attack: 12.0,
    class_up: 3.0,
    power_up: 6.0,
    base_interval: 1.0,
    interval_step: 0.0,
    on_hit: OnHit::DamageOverTime {
        duration: 5.0,
        ratio: 0.5,
    },
    targeting: Targeting::FrontmostUnaffected(StatusKind::Poison),
};

const ICE: UnitProfile = UnitProfile {
    base_attack: 10.0,
    class_up: 2.0,
    power_up: 4.0,
    base_interval: 1.2,
    interval_step: 0.0,
    on_hit: OnHit::Frost {
        duration: 2.0,
        slow: 0.3,
    },
    targeting: Targeting::NearestInRadius { radius: 600.0 },
};

const IRON: UnitProfile = UnitProfile {
    base_attack: 30.0,
    class_up: 8.0,
    power_up: 15.0,
    base_interval: 1.0,
    interval_step: 0.0,
    on_hit: OnHit::ArmorPiercing {
        boss_multiplier: 2.0,
    },
    targeting: Targeting::Strongest,
};
