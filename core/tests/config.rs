use glam::Vec3;
use horde_core::{
    ArchetypeId, ConfigError, CurveId, EncounterConfig, LootKind, MovementPattern, PoolKey,
    SpawnGroup, WaveDefinition,
};

const ENCOUNTER: &str = r#"
[director]
base_difficulty = 0.4
window_seconds = 10.0

[director.curves]
enemy_health = [{ x = 0.0, y = 1.0 }, { x = 1.0, y = 3.0 }]

[waves]
loop = true
arena_radius = 12.0

[[waves.waves]]
delay_before_wave = 0.5

[[waves.waves.groups]]
archetype = "runner"
count = 3
interval = 0.25
spawn_zones = [[4.0, 0.0, 4.0]]

[[archetypes]]
id = "runner"
pattern = "zig_zag"
move_speed = 6.0
"#;

#[test]
fn parses_authored_encounter_with_defaults() {
    let config: EncounterConfig = toml::from_str(ENCOUNTER).expect("encounter parses");
    config.validate().expect("encounter is valid");

    assert!(config.waves.looping);
    assert_eq!(config.waves.arena_radius, 12.0);
    assert_eq!(config.director.base_difficulty, 0.4);
    assert_eq!(config.director.max_difficulty, 1.0, "unset fields keep defaults");

    let wave = &config.waves.waves[0];
    assert_eq!(wave.delay_between_groups, 3.0);
    assert_eq!(wave.groups[0].spawn_zones, vec![Vec3::new(4.0, 0.0, 4.0)]);

    let runner = config
        .archetype(&ArchetypeId::new("runner"))
        .expect("runner archetype");
    assert_eq!(runner.pattern, MovementPattern::ZigZag);
    assert_eq!(runner.max_health, 50.0);

    let health = config.director.curves.get(CurveId::EnemyHealth);
    assert_eq!(health.evaluate(0.5), 2.0);
}

#[test]
fn wave_definitions_survive_binary_encoding() {
    let wave = WaveDefinition {
        delay_before_wave: 1.5,
        delay_between_groups: 0.0,
        groups: vec![
            SpawnGroup {
                archetype: Some(ArchetypeId::new("brute")),
                count: 2,
                interval: 0.5,
                spawn_zones: vec![Vec3::new(1.0, 0.0, -1.0)],
            },
            SpawnGroup::default(),
        ],
    };

    let bytes = bincode::serialize(&wave).expect("wave serializes");
    let decoded: WaveDefinition = bincode::deserialize(&bytes).expect("wave deserializes");
    assert_eq!(decoded, wave);
}

const PICKUP_POOLS: &str = r#"
[pickups]
pool = "loot"

[pickups.kind_pools]
health_pickup = "hearts"

[[pools]]
key = "loot"

[[pools]]
key = "hearts"
"#;

#[test]
fn pickup_kinds_fall_back_to_the_shared_pool() {
    let config: EncounterConfig = toml::from_str(PICKUP_POOLS).expect("pickups parse");
    config.validate().expect("pickups are valid");

    let hearts = PoolKey::new("hearts");
    let loot = PoolKey::new("loot");
    assert_eq!(config.pickups.pool_for(LootKind::HealthPickup), Some(&hearts));
    assert_eq!(config.pickups.pool_for(LootKind::XpOrb), Some(&loot));
    assert_eq!(config.pickups.pool_for(LootKind::Artifact), Some(&loot));
}

#[test]
fn unknown_pickup_kind_pool_is_rejected() {
    let source = PICKUP_POOLS.replace("health_pickup = \"hearts\"", "coin = \"purse\"");
    let config: EncounterConfig = toml::from_str(&source).expect("pickups parse");
    assert!(matches!(
        config.validate(),
        Err(ConfigError::UnknownPool { pool, .. }) if pool == PoolKey::new("purse")
    ));
}
