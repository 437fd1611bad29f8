//! Serializable session state pushed to connected clients.

use serde::{Deserialize, Serialize};

use crate::{
    geometry::{PlacementCell, WorldPoint},
    MobId, MobKind, Phase, ProjectileId, UnitKind,
};

/// Unit occupying a placement cell.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnitEntry {
    /// Kind of the unit.
    #[serde(rename = "type")]
    pub kind: UnitKind,
    /// Merge rank.
    pub rank: u8,
    /// Power tier of the unit's kind.
    pub power: u8,
}

/// Mob walking the path.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MobEntry {
    /// Identifier of the mob.
    pub id: MobId,
    /// Kind of the mob.
    #[serde(rename = "type")]
    pub kind: MobKind,
    /// Horizontal position in pixels.
    pub x: f32,
    /// Vertical position in pixels.
    pub y: f32,
    /// Remaining hp.
    pub hp: f32,
    /// Hp assigned at spawn.
    pub max_hp: f32,
    /// Hit radius in pixels.
    pub radius: f32,
}

/// Projectile in flight.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectileEntry {
    /// Identifier of the projectile.
    pub id: ProjectileId,
    /// Unit kind that fired the projectile.
    #[serde(rename = "type")]
    pub kind: UnitKind,
    /// Horizontal position in pixels.
    pub x: f32,
    /// Vertical position in pixels.
    pub y: f32,
    /// Mob the projectile is flying toward.
    pub target: MobId,
}

/// Full, owned view of a session's state.
///
/// `grid` is indexed by cell index and holds `None` for empty cells.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// SP in the pool.
    pub sp: u32,
    /// Cost of the next summon.
    pub spawn_cost: u32,
    /// Lives left; may be negative.
    pub lives: i32,
    /// Current wave number.
    pub wave: u32,
    /// Active phase.
    pub phase: Phase,
    /// Whole seconds left in the normal phase, zero in other phases.
    pub timer: u32,
    /// Cell contents ordered by index.
    pub grid: Vec<Option<UnitEntry>>,
    /// Alive mobs ordered by id.
    pub entities: Vec<MobEntry>,
    /// Projectiles in flight ordered by id.
    pub projectiles: Vec<ProjectileEntry>,
}

impl SessionSnapshot {
    /// Number of occupied placement cells.
    #[must_use]
    pub fn occupied_cells(&self) -> usize {
        self.grid.iter().filter(|cell| cell.is_some()).count()
    }
}

/// Static board geometry sent once when a client connects.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MapLayout {
    /// Board width in pixels.
    pub width: f32,
    /// Board height in pixels.
    pub height: f32,
    /// Path waypoints in travel order.
    pub path: Vec<WorldPoint>,
    /// Placement cells ordered by index.
    pub grid: Vec<PlacementCell>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_uses_wire_field_names() {
        let snapshot = SessionSnapshot {
            sp: 90,
            spawn_cost: 20,
            lives: -1,
            wave: 2,
            phase: Phase::Boss,
            timer: 0,
            grid: vec![
                Some(UnitEntry {
                    kind: UnitKind::Fire,
                    rank: 2,
                    power: 1,
                }),
                None,
            ],
            entities: Vec::new(),
            projectiles: Vec::new(),
        };
        let value = serde_json::to_value(&snapshot).expect("serialize");
        assert_eq!(value["spawn_cost"], 20);
        assert_eq!(value["lives"], -1);
        assert_eq!(value["phase"], "boss");
        assert_eq!(value["grid"][0]["type"], "fire");
        assert!(value["grid"][1].is_null());
        assert_eq!(snapshot.occupied_cells(), 1);
    }
}
