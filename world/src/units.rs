//! Authoritative unit state stored in the placement cells.

use std::collections::BTreeMap;

use dice_defense_core::{
    geometry::CELL_COUNT,
    units::{compute_interval, pip_count},
    CellIndex, Deck, UnitKind,
};

/// Slack absorbing clock rounding when comparing elapsed time to an interval.
const COOLDOWN_TOLERANCE: f32 = 1e-4;

/// Unit occupying a placement cell.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct UnitState {
    pub(crate) kind: UnitKind,
    pub(crate) rank: u8,
    /// Clock reading of the last attack; `None` until the unit fires.
    pub(crate) last_attack: Option<f32>,
    /// Index into the pip layout used for the next shot.
    pub(crate) shots: usize,
}

impl UnitState {
    /// Freshly summoned or merged unit, ready to fire immediately.
    pub(crate) const fn new(kind: UnitKind, rank: u8) -> Self {
        Self {
            kind,
            rank,
            last_attack: None,
            shots: 0,
        }
    }

    /// Reports whether the attack cooldown elapsed at `clock`.
    pub(crate) fn ready(&self, clock: f32) -> bool {
        match self.last_attack {
            Some(last) => {
                clock - last + COOLDOWN_TOLERANCE >= compute_interval(self.kind, self.rank)
            }
            None => true,
        }
    }

    /// Records an attack at `clock` and returns the pip slot used by it.
    pub(crate) fn record_attack(&mut self, clock: f32) -> usize {
        let shot = self.shots;
        self.shots = (self.shots + 1) % pip_count(self.rank);
        self.last_attack = Some(clock);
        shot
    }
}

/// Fixed collection of placement cells, each holding at most one unit.
#[derive(Debug)]
pub(crate) struct UnitGrid {
    cells: Vec<Option<UnitState>>,
}

impl UnitGrid {
    pub(crate) fn new() -> Self {
        Self {
            cells: vec![None; CELL_COUNT],
        }
    }

    pub(crate) fn contains(&self, cell: CellIndex) -> bool {
        (cell.get() as usize) < self.cells.len()
    }

    pub(crate) fn get(&self, cell: CellIndex) -> Option<&UnitState> {
        self.cells.get(cell.get() as usize).and_then(Option::as_ref)
    }

    pub(crate) fn get_mut(&mut self, cell: CellIndex) -> Option<&mut UnitState> {
        self.cells
            .get_mut(cell.get() as usize)
            .and_then(Option::as_mut)
    }

    /// Stores `unit` in `cell`, replacing any previous occupant.
    pub(crate) fn place(&mut self, cell: CellIndex, unit: UnitState) {
        if let Some(slot) = self.cells.get_mut(cell.get() as usize) {
            *slot = Some(unit);
        }
    }

    pub(crate) fn take(&mut self, cell: CellIndex) -> Option<UnitState> {
        self.cells.get_mut(cell.get() as usize).and_then(Option::take)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (CellIndex, &UnitState)> {
        self.cells.iter().enumerate().filter_map(|(index, slot)| {
            slot.as_ref()
                .map(|unit| (CellIndex::new(index as u32), unit))
        })
    }

    pub(crate) fn empty_cells(&self) -> Vec<CellIndex> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_none())
            .map(|(index, _)| CellIndex::new(index as u32))
            .collect()
    }

    pub(crate) fn slots(&self) -> &[Option<UnitState>] {
        &self.cells
    }
}

/// Power tiers tracked per deck kind for the session.
#[derive(Debug)]
pub(crate) struct PowerTiers {
    tiers: BTreeMap<UnitKind, u8>,
}

impl PowerTiers {
    pub(crate) fn for_deck(deck: &Deck) -> Self {
        Self {
            tiers: deck.kinds().iter().map(|kind| (*kind, 1)).collect(),
        }
    }

    /// Tier of `kind`, or `None` when the kind is not in the deck.
    pub(crate) fn tier(&self, kind: UnitKind) -> Option<u8> {
        self.tiers.get(&kind).copied()
    }

    pub(crate) fn raise(&mut self, kind: UnitKind) -> Option<u8> {
        self.tiers.get_mut(&kind).map(|tier| {
            *tier += 1;
            *tier
        })
    }
}
