use std::time::Duration;

use glam::Vec3;
use horde_core::{
    ArchetypeId, Command, DamageEvent, EncounterConfig, EnemyArchetype, EnemyId, Entity, Event,
    KindPools, LootKind, PickupConfig, PoolEntry, PoolKey, SpawnRejection,
};
use horde_world::{self as world, query, World};

fn encounter() -> EncounterConfig {
    EncounterConfig {
        archetypes: vec![
            EnemyArchetype {
                id: ArchetypeId::new("grunt"),
                move_speed: 0.0,
                ..EnemyArchetype::default()
            },
            EnemyArchetype {
                id: ArchetypeId::new("wraith"),
                pool: Some(PoolKey::new("ghosts")),
                ..EnemyArchetype::default()
            },
        ],
        pickups: PickupConfig {
            pool: Some(PoolKey::new("pickups")),
            ..PickupConfig::default()
        },
        pools: vec![PoolEntry {
            key: PoolKey::new("pickups"),
            initial_size: 4,
            max_size: 8,
        }],
        ..EncounterConfig::default()
    }
}

fn apply(world: &mut World, command: Command) -> Vec<Event> {
    let mut events = Vec::new();
    world::apply(world, command, &mut events);
    events
}

fn spawn(world: &mut World, archetype: &str, position: Vec3) -> EnemyId {
    let events = apply(
        world,
        Command::SpawnEnemy {
            archetype: ArchetypeId::new(archetype),
            position,
            power: 1.0,
        },
    );
    match events.as_slice() {
        [Event::EnemySpawned { enemy, .. }] => *enemy,
        other => panic!("unexpected spawn events: {other:?}"),
    }
}

fn tick(world: &mut World, millis: u64) -> Vec<Event> {
    apply(
        world,
        Command::Tick {
            dt: Duration::from_millis(millis),
        },
    )
}

fn damaged(events: &[Event]) -> Vec<Entity> {
    events
        .iter()
        .filter_map(|event| match event {
            Event::EntityDamaged { entity, .. } => Some(*entity),
            _ => None,
        })
        .collect()
}

#[test]
fn detonation_spares_the_bomber_and_hits_neighbours() {
    let mut world = World::new(&encounter(), 3);
    let bomber = spawn(&mut world, "grunt", Vec3::new(1.0, 0.0, 0.0));
    let neighbour = spawn(&mut world, "grunt", Vec3::new(2.0, 0.0, 0.0));
    let distant = spawn(&mut world, "grunt", Vec3::new(9.0, 0.0, 0.0));

    let events = apply(
        &mut world,
        Command::Detonate {
            enemy: bomber,
            radius: 3.0,
            damage: 10.0,
            knockback: 5.0,
        },
    );

    let hit = damaged(&events);
    assert!(hit.contains(&Entity::Player));
    assert!(hit.contains(&Entity::Enemy(neighbour)));
    assert!(!hit.contains(&Entity::Enemy(bomber)));
    assert!(!hit.contains(&Entity::Enemy(distant)));
    assert!(events.contains(&Event::EnemyKilled { enemy: bomber }));
    assert_eq!(query::enemy_count(&world), 2);
    assert_eq!(query::player(&world).health, 90.0);
}

#[test]
fn detonation_kills_the_bomber_even_when_alone() {
    let mut world = World::new(&encounter(), 3);
    let bomber = spawn(&mut world, "grunt", Vec3::new(40.0, 0.0, 0.0));

    let events = apply(
        &mut world,
        Command::Detonate {
            enemy: bomber,
            radius: 3.0,
            damage: 10.0,
            knockback: 5.0,
        },
    );

    assert!(damaged(&events).is_empty());
    assert_eq!(
        events,
        vec![
            Event::EntityDied {
                entity: Entity::Enemy(bomber),
                archetype: Some(ArchetypeId::new("grunt")),
                position: Vec3::new(40.0, 0.0, 0.0),
            },
            Event::EnemyKilled { enemy: bomber },
        ]
    );
}

#[test]
fn unconfigured_pool_rejects_spawn() {
    let mut world = World::new(&encounter(), 3);
    let events = apply(
        &mut world,
        Command::SpawnEnemy {
            archetype: ArchetypeId::new("wraith"),
            position: Vec3::ZERO,
            power: 1.0,
        },
    );
    assert_eq!(
        events,
        vec![Event::SpawnRejected {
            archetype: ArchetypeId::new("wraith"),
            reason: SpawnRejection::UnknownPool,
        }]
    );
    assert_eq!(query::enemy_count(&world), 0);
}

#[test]
fn nearby_xp_orb_is_collected_and_returned_to_pool() {
    let mut world = World::new(&encounter(), 3);
    let dropped = apply(
        &mut world,
        Command::DropLoot {
            kind: LootKind::XpOrb,
            position: Vec3::new(0.5, 0.0, 0.0),
        },
    );
    assert!(matches!(
        dropped.as_slice(),
        [Event::PickupDropped {
            kind: LootKind::XpOrb,
            ..
        }]
    ));
    assert_eq!(query::pool_stats(&world)[0].1.active, 1);

    let events = tick(&mut world, 16);
    assert!(events.contains(&Event::PickupCollected {
        kind: LootKind::XpOrb,
        amount: 10.0,
    }));
    assert!(query::pickups(&world).is_empty());
    assert_eq!(query::pool_stats(&world)[0].1.active, 0);
}

#[test]
fn pickup_kinds_use_their_own_pool() {
    let mut config = encounter();
    config.pickups.kind_pools = KindPools {
        health_pickup: Some(PoolKey::new("hearts")),
        ..KindPools::default()
    };
    config.pools.push(PoolEntry {
        key: PoolKey::new("hearts"),
        initial_size: 2,
        max_size: 2,
    });
    let mut world = World::new(&config, 3);

    for kind in [LootKind::HealthPickup, LootKind::Coin] {
        let _ = apply(
            &mut world,
            Command::DropLoot {
                kind,
                position: Vec3::new(20.0, 0.0, 0.0),
            },
        );
    }

    let active: Vec<(String, usize)> = query::pool_stats(&world)
        .into_iter()
        .map(|(key, stats)| (key.as_str().to_owned(), stats.active))
        .collect();
    assert_eq!(
        active,
        vec![("hearts".to_owned(), 1), ("pickups".to_owned(), 1)]
    );
}

#[test]
fn health_pickups_heal_up_to_maximum() {
    let mut world = World::new(&encounter(), 3);
    let _ = apply(
        &mut world,
        Command::ApplyDamage {
            target: Entity::Player,
            damage: DamageEvent::new(30.0, Vec3::X, 0.0),
        },
    );

    for expected in [(25.0, 95.0), (5.0, 100.0)] {
        let _ = apply(
            &mut world,
            Command::DropLoot {
                kind: LootKind::HealthPickup,
                position: Vec3::ZERO,
            },
        );
        let events = tick(&mut world, 16);
        assert!(events.contains(&Event::PlayerHealed {
            amount: expected.0,
            current: expected.1,
        }));
    }
}

#[test]
fn projectiles_hit_the_first_enemy_on_their_path() {
    let mut world = World::new(&encounter(), 3);
    let enemy = spawn(&mut world, "grunt", Vec3::new(3.0, 0.0, 0.0));

    let _ = apply(
        &mut world,
        Command::LaunchProjectile {
            origin: Vec3::ZERO,
            direction: Vec3::X,
            speed: 10.0,
            range: 10.0,
            damage: DamageEvent::new(20.0, Vec3::ZERO, 2.0),
        },
    );
    assert_eq!(query::projectiles(&world).len(), 1);

    assert!(damaged(&tick(&mut world, 200)).is_empty());
    let events = tick(&mut world, 100);
    assert_eq!(damaged(&events), vec![Entity::Enemy(enemy)]);
    assert!(query::projectiles(&world).is_empty());
}

fn launch_along_x(world: &mut World, speed: f32, range: f32) {
    let _ = apply(
        world,
        Command::LaunchProjectile {
            origin: Vec3::ZERO,
            direction: Vec3::X,
            speed,
            range,
            damage: DamageEvent::new(20.0, Vec3::ZERO, 2.0),
        },
    );
}

#[test]
fn fast_projectiles_hit_enemies_between_steps() {
    let mut world = World::new(&encounter(), 3);
    let enemy = spawn(&mut world, "grunt", Vec3::new(5.45, 0.0, 0.0));
    launch_along_x(&mut world, 12.0, 10.0);

    let mut hit = Vec::new();
    for _ in 0..12 {
        hit.extend(damaged(&tick(&mut world, 100)));
    }
    assert_eq!(hit, vec![Entity::Enemy(enemy)]);
    assert!(query::projectiles(&world).is_empty());
}

#[test]
fn projectiles_strike_the_nearest_enemy_along_the_path() {
    let mut world = World::new(&encounter(), 3);
    let far = spawn(&mut world, "grunt", Vec3::new(6.0, 0.0, 0.0));
    let near = spawn(&mut world, "grunt", Vec3::new(2.0, 0.0, 0.0));
    launch_along_x(&mut world, 10.0, 10.0);

    let events = tick(&mut world, 1_000);
    assert_eq!(damaged(&events), vec![Entity::Enemy(near)]);
    assert_eq!(
        query::enemy_view(&world).get(far).map(|enemy| enemy.health),
        Some(50.0)
    );
}

#[test]
fn projectiles_expire_at_their_range() {
    let mut world = World::new(&encounter(), 3);
    let _ = apply(
        &mut world,
        Command::LaunchProjectile {
            origin: Vec3::ZERO,
            direction: Vec3::new(0.0, 0.0, 3.0),
            speed: 10.0,
            range: 2.0,
            damage: DamageEvent::new(20.0, Vec3::ZERO, 2.0),
        },
    );

    let _ = tick(&mut world, 100);
    assert_eq!(query::projectiles(&world).len(), 1);
    let _ = tick(&mut world, 100);
    assert!(query::projectiles(&world).is_empty());
}

#[test]
fn player_death_is_reported_once() {
    let mut world = World::new(&encounter(), 3);
    let hit = DamageEvent::new(1_000.0, Vec3::X, 0.0);

    let first = apply(
        &mut world,
        Command::ApplyDamage {
            target: Entity::Player,
            damage: hit,
        },
    );
    assert!(first.contains(&Event::EntityDied {
        entity: Entity::Player,
        archetype: None,
        position: Vec3::ZERO,
    }));

    let _ = tick(&mut world, 1_000);
    let second = apply(
        &mut world,
        Command::ApplyDamage {
            target: Entity::Player,
            damage: hit,
        },
    );
    assert!(second.is_empty());
    assert!(!query::player(&world).alive);
}
