#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that computes deterministic unit targets from world views.

use std::cmp::Ordering;

use dice_defense_core::{
    geometry::WorldPoint, MobId, MobSnapshot, MobView, Targeting, UnitTarget, UnitView,
};

/// Unit targeting system resolving each unit's targeting rule against the alive mobs.
#[derive(Debug, Default)]
pub struct UnitTargeting {
    candidates: Vec<usize>,
}

impl UnitTargeting {
    /// Creates a new targeting system with an empty scratch buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Computes targets for every placed unit.
    ///
    /// The output buffer is cleared before populating it with the latest
    /// assignments. Units without an eligible mob produce no entry.
    pub fn handle(&mut self, units: &UnitView, mobs: &MobView, out: &mut Vec<UnitTarget>) {
        out.clear();

        if mobs.is_empty() {
            return;
        }

        let snapshots: Vec<&MobSnapshot> = mobs.iter().collect();
        for unit in units.iter() {
            let rule = unit.kind.profile().targeting;
            if let Some(mob) = self.select(rule, unit.center, &snapshots) {
                out.push(UnitTarget {
                    cell: unit.cell,
                    mob,
                });
            }
        }
    }

    fn select(
        &mut self,
        rule: Targeting,
        origin: WorldPoint,
        mobs: &[&MobSnapshot],
    ) -> Option<MobId> {
        self.candidates.clear();
        match rule {
            Targeting::Frontmost => frontmost(mobs.iter().copied()),
            Targeting::FrontmostUnaffected(status) => {
                self.candidates.extend(
                    mobs.iter()
                        .enumerate()
                        .filter(|(_, mob)| !mob.statuses.contains(status))
                        .map(|(index, _)| index),
                );
                if self.candidates.is_empty() {
                    frontmost(mobs.iter().copied())
                } else {
                    frontmost(self.candidates.iter().map(|index| mobs[*index]))
                }
            }
            Targeting::NearestInRadius { radius } => mobs
                .iter()
                .copied()
                .map(|mob| (mob.position.distance(origin), mob))
                .filter(|(distance, _)| *distance <= radius)
                .min_by(|(left_distance, left), (right_distance, right)| {
                    left_distance
                        .total_cmp(right_distance)
                        .then(left.id.cmp(&right.id))
                })
                .map(|(_, mob)| mob.id),
            Targeting::Strongest => mobs
                .iter()
                .copied()
                .min_by(|left, right| {
                    right
                        .hp
                        .total_cmp(&left.hp)
                        .then_with(|| path_order(left, right))
                })
                .map(|mob| mob.id),
        }
    }
}

/// Mob furthest along the path among `mobs`.
fn frontmost<'a>(mobs: impl Iterator<Item = &'a MobSnapshot>) -> Option<MobId> {
    mobs.min_by(|left, right| path_order(left, right)).map(|mob| mob.id)
}

/// Orders mobs by path progress, leading mob first.
///
/// A higher waypoint index leads; ties go to the smaller remaining distance to
/// that waypoint, then to the lower id.
fn path_order(left: &MobSnapshot, right: &MobSnapshot) -> Ordering {
    right
        .path_index
        .cmp(&left.path_index)
        .then(left.distance_to_waypoint.total_cmp(&right.distance_to_waypoint))
        .then(left.id.cmp(&right.id))
}
