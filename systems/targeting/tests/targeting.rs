use std::time::Duration;

use dice_defense_core::{
    CellIndex, Command, Deck, MobId, MobKind, StatusEffect, UnitKind, UnitTarget,
};
use dice_defense_system_targeting::UnitTargeting;
use dice_defense_world::{self as world, query, World};

fn setup() -> World {
    let deck = Deck::new(vec![UnitKind::Fire, UnitKind::Poison]).expect("valid deck");
    let mut world = World::new(deck);
    let mut events = Vec::new();
    for (cell, kind) in [(0, UnitKind::Fire), (1, UnitKind::Poison)] {
        world::apply(
            &mut world,
            Command::SummonUnit {
                cell: Some(CellIndex::new(cell)),
                kind,
            },
            &mut events,
        );
    }
    for kind in [MobKind::Normal, MobKind::Speed] {
        world::apply(&mut world, Command::SpawnMob { kind }, &mut events);
    }
    world::apply(
        &mut world,
        Command::Tick {
            dt: Duration::from_secs(1),
        },
        &mut events,
    );
    world
}

fn targets(world: &World) -> Vec<UnitTarget> {
    let mut system = UnitTargeting::new();
    let mut out = Vec::new();
    system.handle(&query::unit_view(world), &query::mob_view(world), &mut out);
    out
}

#[test]
fn faster_mob_becomes_the_frontmost_target() {
    let world = setup();
    assert_eq!(
        targets(&world),
        vec![
            UnitTarget {
                cell: CellIndex::new(0),
                mob: MobId::new(1),
            },
            UnitTarget {
                cell: CellIndex::new(1),
                mob: MobId::new(1),
            },
        ]
    );
}

#[test]
fn poison_moves_on_to_unpoisoned_mobs() {
    let mut world = setup();
    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::ApplyStatus {
            mob: MobId::new(1),
            effect: StatusEffect::poison(6.0, 5.0),
        },
        &mut events,
    );

    let assigned = targets(&world);
    assert_eq!(assigned[0].mob, MobId::new(1));
    assert_eq!(assigned[1].mob, MobId::new(0));
}
