//! Mob instances walking the path.

use dice_defense_core::{
    geometry::{Path, WorldPoint},
    MobId, MobKind, MobSnapshot, StatusEffect,
};

/// Authoritative state of a single mob.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Mob {
    pub(crate) id: MobId,
    pub(crate) kind: MobKind,
    pub(crate) hp: f32,
    pub(crate) max_hp: f32,
    pub(crate) position: WorldPoint,
    /// Index of the waypoint the mob is walking toward.
    pub(crate) path_index: usize,
    pub(crate) speed: f32,
    pub(crate) hit_radius: f32,
    statuses: Vec<StatusEffect>,
    pub(crate) finished: bool,
}

impl Mob {
    /// Places a new mob at the start of `path`.
    pub(crate) fn spawn(id: MobId, kind: MobKind, hp: f32, path: &Path) -> Self {
        let profile = kind.profile();
        Self {
            id,
            kind,
            hp,
            max_hp: hp,
            position: path.start(),
            path_index: 1,
            speed: profile.speed,
            hit_radius: profile.hit_radius,
            statuses: Vec::new(),
            finished: false,
        }
    }

    /// Alive mobs have hp left and have not reached the end of the path.
    pub(crate) fn is_alive(&self) -> bool {
        self.hp > 0.0 && !self.finished
    }

    /// Walks toward the next waypoint.
    ///
    /// Reaching a waypoint snaps the mob onto it and ends the step; leftover
    /// travel is not carried into the next segment.
    pub(crate) fn advance(&mut self, seconds: f32, path: &Path) {
        if self.finished {
            return;
        }
        let Some(waypoint) = path.waypoints().get(self.path_index).copied() else {
            self.finished = true;
            return;
        };
        let step = self.current_speed() * seconds;
        if self.position.distance(waypoint) <= step {
            self.position = waypoint;
            self.path_index += 1;
            if self.path_index >= path.waypoints().len() {
                self.finished = true;
            }
        } else {
            self.position = self.position.step_toward(waypoint, step);
        }
    }

    /// Applies damage over time and expires finished effects.
    pub(crate) fn tick_statuses(&mut self, seconds: f32) {
        for effect in &mut self.statuses {
            self.hp -= effect.damage_per_second * seconds;
            effect.remaining -= seconds;
        }
        self.statuses.retain(|effect| effect.remaining > 0.0);
    }

    /// Attaches `effect`, overwriting an active effect of the same kind.
    pub(crate) fn apply_status(&mut self, effect: StatusEffect) {
        match self
            .statuses
            .iter_mut()
            .find(|active| active.kind == effect.kind)
        {
            Some(active) => *active = effect,
            None => self.statuses.push(effect),
        }
    }

    fn current_speed(&self) -> f32 {
        let slow = self
            .statuses
            .iter()
            .map(|effect| effect.slow)
            .fold(0.0_f32, f32::max);
        self.speed * (1.0 - slow.clamp(0.0, 1.0))
    }

    pub(crate) fn snapshot(&self, path: &Path) -> MobSnapshot {
        let distance_to_waypoint = path
            .waypoints()
            .get(self.path_index)
            .map_or(0.0, |waypoint| self.position.distance(*waypoint));
        MobSnapshot {
            id: self.id,
            kind: self.kind,
            hp: self.hp,
            max_hp: self.max_hp,
            position: self.position,
            path_index: self.path_index,
            distance_to_waypoint,
            hit_radius: self.hit_radius,
            statuses: self.statuses.iter().map(|effect| effect.kind).collect(),
        }
    }

    #[cfg(test)]
    pub(crate) fn status_mask(&self) -> dice_defense_core::StatusMask {
        self.statuses.iter().map(|effect| effect.kind).collect()
    }
}
