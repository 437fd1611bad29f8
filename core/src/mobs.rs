//! Mob catalog, status effects and hp formulas.

use serde::{Deserialize, Serialize};

/// Base hp gained by normal-phase mobs for every wave.
pub const BASE_HP_PER_WAVE: f32 = 100.0;
/// Hp added to normal-phase mobs for every escalation step.
pub const HP_ESCALATION_STEP: f32 = 100.0;
/// Boss hp gained for every wave.
pub const BOSS_HP_PER_WAVE: f32 = 1000.0;
/// Fraction of the culled normal-mob hp absorbed by the boss.
pub const BOSS_CARRYOVER_FACTOR: f32 = 1.0;

/// Kinds of mobs that walk the path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MobKind {
    /// Baseline mob.
    Normal,
    /// Fast, fragile mob.
    Speed,
    /// Slow, durable mob.
    Big,
    /// Single boss spawned at the end of the gathering phase.
    Boss,
}

impl MobKind {
    /// Static profile registered for the kind.
    #[must_use]
    pub const fn profile(self) -> MobProfile {
        match self {
            Self::Normal => MobProfile {
                hp_multiplier: 1.0,
                speed: 100.0,
                hit_radius: 30.0,
                reward: 10,
                leak_penalty: 1,
            },
            Self::Speed => MobProfile {
                hp_multiplier: 0.6,
                speed: 160.0,
                hit_radius: 24.0,
                reward: 10,
                leak_penalty: 1,
            },
            Self::Big => MobProfile {
                hp_multiplier: 3.0,
                speed: 70.0,
                hit_radius: 40.0,
                reward: 20,
                leak_penalty: 1,
            },
            Self::Boss => MobProfile {
                hp_multiplier: 1.0,
                speed: 50.0,
                hit_radius: 50.0,
                reward: 100,
                leak_penalty: 3,
            },
        }
    }

    /// Reports whether the kind is the wave boss.
    #[must_use]
    pub const fn is_boss(self) -> bool {
        matches!(self, Self::Boss)
    }
}

/// Movement and economy parameters of a mob kind.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MobProfile {
    /// Multiplier applied to the normal-phase hp formula.
    pub hp_multiplier: f32,
    /// Travel speed in pixels per second.
    pub speed: f32,
    /// Radius used for projectile impact checks.
    pub hit_radius: f32,
    /// SP awarded when the mob dies.
    pub reward: u32,
    /// Lives lost when the mob reaches the end of the path.
    pub leak_penalty: i32,
}

/// Hp of a normal-phase mob of `kind`.
#[must_use]
pub fn normal_mob_hp(kind: MobKind, wave: u32, scaling_counter: u32) -> f32 {
    let base = BASE_HP_PER_WAVE * wave as f32 + HP_ESCALATION_STEP * scaling_counter as f32;
    base * kind.profile().hp_multiplier
}

/// Hp of the boss for `wave`, absorbing `culled_hp` from the mobs cleared at the gathering phase.
#[must_use]
pub fn boss_hp(wave: u32, culled_hp: f32) -> f32 {
    BOSS_HP_PER_WAVE * wave as f32 + BOSS_CARRYOVER_FACTOR * culled_hp.max(0.0)
}

/// Kinds of status effects a mob can carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    /// Damage over time.
    Poison,
    /// Movement slow.
    Slow,
}

impl StatusKind {
    const fn bit(self) -> u8 {
        match self {
            Self::Poison => 0b01,
            Self::Slow => 0b10,
        }
    }
}

/// Timed effect attached to a mob.
///
/// Reapplying an effect of the same kind overwrites the remaining duration and
/// magnitudes of the active one instead of stacking.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StatusEffect {
    /// Kind of the effect.
    pub kind: StatusKind,
    /// Seconds left before the effect expires.
    pub remaining: f32,
    /// Hp removed per second while active.
    pub damage_per_second: f32,
    /// Fraction of speed removed while active.
    pub slow: f32,
}

impl StatusEffect {
    /// Poison dealing `damage_per_second` for `duration` seconds.
    #[must_use]
    pub const fn poison(damage_per_second: f32, duration: f32) -> Self {
        Self {
            kind: StatusKind::Poison,
            remaining: duration,
            damage_per_second,
            slow: 0.0,
        }
    }

    /// Slow removing `slow` of the speed for `duration` seconds.
    #[must_use]
    pub const fn slow(slow: f32, duration: f32) -> Self {
        Self {
            kind: StatusKind::Slow,
            remaining: duration,
            damage_per_second: 0.0,
            slow,
        }
    }
}

/// Compact set of status kinds carried by a mob.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct StatusMask(u8);

impl StatusMask {
    /// Mask without any status.
    pub const EMPTY: StatusMask = StatusMask(0);

    /// Returns the mask with `kind` added.
    #[must_use]
    pub const fn with(self, kind: StatusKind) -> Self {
        Self(self.0 | kind.bit())
    }

    /// Reports whether `kind` is present.
    #[must_use]
    pub const fn contains(self, kind: StatusKind) -> bool {
        self.0 & kind.bit() != 0
    }

    /// Reports whether no status is present.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl FromIterator<StatusKind> for StatusMask {
    fn from_iter<I: IntoIterator<Item = StatusKind>>(iter: I) -> Self {
        iter.into_iter().fold(Self::EMPTY, StatusMask::with)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal_hp_scales_with_wave_and_escalation() {
        assert_eq!(normal_mob_hp(MobKind::Normal, 1, 0), 100.0);
        assert_eq!(normal_mob_hp(MobKind::Normal, 2, 3), 500.0);
        assert_eq!(normal_mob_hp(MobKind::Big, 1, 1), 600.0);
    }

    #[test]
    fn boss_hp_absorbs_culled_hp() {
        assert_eq!(boss_hp(1, 0.0), 1000.0);
        assert_eq!(boss_hp(3, 450.0), 3450.0);
        assert_eq!(boss_hp(1, -10.0), 1000.0);
    }

    #[test]
    fn status_mask_tracks_kinds() {
        let mask: StatusMask = [StatusKind::Poison].into_iter().collect();
        assert!(mask.contains(StatusKind::Poison));
        assert!(!mask.contains(StatusKind::Slow));
        assert!(StatusMask::EMPTY.is_empty());
        assert!(!mask.with(StatusKind::Slow).is_empty());
    }

    #[test]
    fn only_boss_reports_is_boss() {
        assert!(MobKind::Boss.is_boss());
        assert!(!MobKind::Big.is_boss());
    }
}
