#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure combat systems: the attack cycle of placed units and the on-hit
//! behaviour applied when projectiles strike.

mod impacts;

pub use impacts::ImpactResolver;

use dice_defense_core::{CellIndex, Command, UnitSnapshot, UnitTarget, UnitView};

/// Unit combat system that queues firing commands for ready units.
#[derive(Debug, Default)]
pub struct UnitCombat {
    scratch: Vec<Command>,
}

impl UnitCombat {
    /// Creates a new unit combat system with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Emits `Command::FireProjectile` entries for units ready to fire.
    pub fn handle(&mut self, units: &UnitView, targets: &[UnitTarget], out: &mut Vec<Command>) {
        if targets.is_empty() {
            return;
        }

        let snapshots: Vec<&UnitSnapshot> = units.iter().collect();
        if snapshots.is_empty() {
            return;
        }

        self.scratch.clear();

        for target in targets {
            if let Some(unit) = find_unit(&snapshots, target.cell) {
                if unit.ready {
                    self.scratch.push(Command::FireProjectile {
                        cell: target.cell,
                        target: target.mob,
                    });
                }
            }
        }

        if self.scratch.is_empty() {
            return;
        }

        out.reserve(self.scratch.len());
        out.append(&mut self.scratch);
    }
}

fn find_unit<'a>(units: &[&'a UnitSnapshot], cell: CellIndex) -> Option<&'a UnitSnapshot> {
    units
        .binary_search_by_key(&cell, |snapshot| snapshot.cell)
        .ok()
        .map(|index| units[index])
}

#[cfg(test)]
mod tests {
    use super::*;
    use dice_defense_core::{geometry::WorldPoint, MobId, UnitKind};

    #[test]
    fn firing_respects_readiness() {
        let mut system = UnitCombat::new();
        let units = UnitView::from_snapshots(vec![snapshot(2, true), snapshot(5, false)]);
        let targets = vec![target(2, 4), target(5, 1)];
        let mut out = Vec::new();

        system.handle(&units, &targets, &mut out);

        assert_eq!(
            out,
            vec![Command::FireProjectile {
                cell: CellIndex::new(2),
                target: MobId::new(4),
            }],
        );
    }

    #[test]
    fn targets_without_units_are_skipped() {
        let mut system = UnitCombat::new();
        let units = UnitView::from_snapshots(vec![snapshot(8, true), snapshot(3, true)]);
        let targets = vec![target(3, 9), target(8, 2), target(12, 3)];
        let mut out = Vec::new();

        system.handle(&units, &targets, &mut out);

        assert_eq!(
            out,
            vec![
                Command::FireProjectile {
                    cell: CellIndex::new(3),
                    target: MobId::new(9),
                },
                Command::FireProjectile {
                    cell: CellIndex::new(8),
                    target: MobId::new(2),
                },
            ],
        );
    }

    #[test]
    fn no_targets_emit_nothing() {
        let mut system = UnitCombat::new();
        let units = UnitView::from_snapshots(vec![snapshot(0, true)]);
        let mut out = Vec::new();
        system.handle(&units, &[], &mut out);
        assert!(out.is_empty());
    }

    fn snapshot(cell: u32, ready: bool) -> UnitSnapshot {
        UnitSnapshot {
            cell: CellIndex::new(cell),
            kind: UnitKind::Wind,
            rank: 1,
            power: 1,
            center: WorldPoint::default(),
            ready,
        }
    }

    fn target(cell: u32, mob: u32) -> UnitTarget {
        UnitTarget {
            cell: CellIndex::new(cell),
            mob: MobId::new(mob),
        }
    }
}
