//! Projectiles in flight toward their target mob.

use dice_defense_core::{
    geometry::WorldPoint, MobId, ProjectileEntry, ProjectileId, UnitKind, IMPACT_EPSILON,
};

/// Projectile state; the target is a weak reference resolved every tick.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Projectile {
    pub(crate) id: ProjectileId,
    pub(crate) kind: UnitKind,
    pub(crate) position: WorldPoint,
    pub(crate) target: MobId,
    pub(crate) speed: f32,
    pub(crate) damage: f32,
}

impl Projectile {
    /// Moves toward `target` and reports whether the projectile struck it.
    ///
    /// Impact happens when the projectile is within `hit_radius` plus a small
    /// slack of the target, or when the step would overshoot it.
    pub(crate) fn advance(&mut self, target: WorldPoint, hit_radius: f32, seconds: f32) -> bool {
        let reach = hit_radius + IMPACT_EPSILON;
        let remaining = self.position.distance(target);
        let step = self.speed * seconds;
        if remaining <= reach || step >= remaining {
            self.position = target;
            return true;
        }
        self.position = self.position.step_toward(target, step);
        self.position.distance(target) <= reach
    }

    pub(crate) fn entry(&self) -> ProjectileEntry {
        ProjectileEntry {
            id: self.id,
            kind: self.kind,
            x: self.position.x,
            y: self.position.y,
            target: self.target,
        }
    }
}
