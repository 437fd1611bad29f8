//! Translation of projectile impacts into damage and status commands.

use dice_defense_core::{
    Command, Event, MobId, MobSnapshot, MobView, OnHit, StatusEffect, UnitKind,
};

/// Resolves the on-hit behaviour of every impacted projectile.
#[derive(Debug, Default)]
pub struct ImpactResolver {
    visited: Vec<MobId>,
}

impl ImpactResolver {
    /// Creates a new resolver with an empty scratch buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Emits damage and status commands for `Event::ProjectileImpacted` entries.
    ///
    /// Impacts whose target is no longer part of `mobs` are ignored.
    pub fn handle(&mut self, events: &[Event], mobs: &MobView, out: &mut Vec<Command>) {
        for event in events {
            if let Event::ProjectileImpacted {
                kind,
                target,
                damage,
                ..
            } = event
            {
                if let Some(struck) = mobs.get(*target) {
                    self.resolve(*kind, struck, *damage, mobs, out);
                }
            }
        }
    }

    fn resolve(
        &mut self,
        kind: UnitKind,
        struck: &MobSnapshot,
        damage: f32,
        mobs: &MobView,
        out: &mut Vec<Command>,
    ) {
        match kind.profile().on_hit {
            OnHit::Single => out.push(damage_command(struck.id, damage)),
            OnHit::Splash { radius, ratio } => {
                out.push(damage_command(struck.id, damage));
                for other in mobs.iter() {
                    if other.id != struck.id && other.position.distance(struck.position) <= radius
                    {
                        out.push(damage_command(other.id, damage * ratio));
                    }
                }
            }
            OnHit::Chain { range, falloff } => {
                out.push(damage_command(struck.id, damage));
                self.visited.clear();
                self.visited.push(struck.id);
                let mut current = struck;
                for ratio in falloff {
                    let Some(next) = nearest_unvisited(current, range, &self.visited, mobs) else {
                        break;
                    };
                    out.push(damage_command(next.id, damage * ratio));
                    self.visited.push(next.id);
                    current = next;
                }
            }
            OnHit::DamageOverTime { duration, ratio } => {
                out.push(damage_command(struck.id, damage));
                out.push(Command::ApplyStatus {
                    mob: struck.id,
                    effect: StatusEffect::poison(damage * ratio, duration),
                });
            }
            OnHit::Frost { duration, slow } => {
                out.push(damage_command(struck.id, damage));
                out.push(Command::ApplyStatus {
                    mob: struck.id,
                    effect: StatusEffect::slow(slow, duration),
                });
            }
            OnHit::ArmorPiercing { boss_multiplier } => {
                let amount = if struck.is_boss() {
                    damage * boss_multiplier
                } else {
                    damage
                };
                out.push(damage_command(struck.id, amount));
            }
        }
    }
}

fn damage_command(mob: MobId, amount: f32) -> Command {
    Command::DamageMob { mob, amount }
}

/// Closest mob within `range` of `from` that the chain has not visited yet.
fn nearest_unvisited<'a>(
    from: &MobSnapshot,
    range: f32,
    visited: &[MobId],
    mobs: &'a MobView,
) -> Option<&'a MobSnapshot> {
    mobs.iter()
        .filter(|candidate| !visited.contains(&candidate.id))
        .map(|candidate| (candidate.position.distance(from.position), candidate))
        .filter(|(distance, _)| *distance <= range)
        .min_by(|(left_distance, left), (right_distance, right)| {
            left_distance
                .total_cmp(right_distance)
                .then(left.id.cmp(&right.id))
        })
        .map(|(_, candidate)| candidate)
}
