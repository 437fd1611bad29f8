use std::time::Duration;

use dice_defense_core::{Command, Deck, Event, Phase, UnitKind};
use dice_defense_system_waves::WaveProgression;
use dice_defense_world::{self as world, query, World};

fn deck() -> Deck {
    Deck::new(vec![UnitKind::Fire, UnitKind::Iron]).expect("valid deck")
}

fn step(world: &mut World, waves: &WaveProgression, events: &mut Vec<Event>) {
    world::apply(
        world,
        Command::Tick {
            dt: Duration::from_secs(1),
        },
        events,
    );
    let mut commands = Vec::new();
    waves.handle(&query::wave_snapshot(world), &mut commands);
    for command in commands {
        world::apply(world, command, events);
    }
}

#[test]
fn hp_escalates_every_ten_seconds_of_normal_phase() {
    let mut world = World::new(deck());
    let waves = WaveProgression::default();
    let mut events = Vec::new();

    for _ in 0..25 {
        step(&mut world, &waves, &mut events);
    }

    assert_eq!(query::scaling_counter(&world), 2);
    assert_eq!(query::phase(&world), Phase::Normal);
}

#[test]
fn full_wave_cycle_returns_to_normal() {
    let mut world = World::new(deck());
    let waves = WaveProgression::default();
    let mut events = Vec::new();

    for _ in 0..30 {
        step(&mut world, &waves, &mut events);
    }
    assert_eq!(query::phase(&world), Phase::Gathering);

    for _ in 0..2 {
        step(&mut world, &waves, &mut events);
    }
    assert_eq!(query::phase(&world), Phase::Boss);
    let bosses: Vec<_> = query::mob_view(&world).into_vec();
    assert_eq!(bosses.len(), 1);
    assert!(bosses[0].is_boss());

    world::apply(
        &mut world,
        Command::DamageMob {
            mob: bosses[0].id,
            amount: bosses[0].hp,
        },
        &mut events,
    );
    world::apply(&mut world, Command::SweepCasualties, &mut events);
    step(&mut world, &waves, &mut events);

    let snapshot = query::wave_snapshot(&world);
    assert_eq!(snapshot.wave, 2);
    assert_eq!(snapshot.phase, Phase::Normal);
    assert_eq!(query::scaling_counter(&world), 0);
    assert!(events.contains(&Event::WaveAdvanced { wave: 2 }));
}
