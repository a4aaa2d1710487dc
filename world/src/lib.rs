#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative encounter state.
//!
//! The world owns the player, every enemy body, loose pickups, in-flight
//! projectiles and the shared object pool. It only changes through [`apply`],
//! which reports every observable change as an [`Event`]. Systems read the
//! world through the [`query`] module.

mod actors;
mod navigation;
mod pickups;
mod pool;

use std::{
    collections::{BTreeMap, HashMap},
    time::Duration,
};

use glam::Vec3;
use horde_core::{
    ArchetypeId, Command, DamageEvent, Damageable, EncounterConfig, EnemyArchetype, EnemyId,
    Entity, Event, HitOutcome, LootKind, Navigation, ObjectPool, PickupConfig, PoolKey,
    SpawnRejection,
};
use horde_system_combat::blast_targets;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use actors::{Enemy, Player};
use pickups::{sweep_entry, Pickup, Projectile, PROJECTILE_HIT_RADIUS};

pub use pool::{Pool, PoolStats};

/// Horizontal scatter applied to dropped loot on each axis.
const LOOT_SCATTER: f32 = 1.0;

/// Represents the authoritative encounter state.
#[derive(Debug)]
pub struct World {
    archetypes: HashMap<ArchetypeId, EnemyArchetype>,
    player: Player,
    enemies: BTreeMap<EnemyId, Enemy>,
    next_enemy: u32,
    pickups: Vec<Pickup>,
    projectiles: Vec<Projectile>,
    pool: Pool,
    pickup_config: PickupConfig,
    projectile_pool: Option<PoolKey>,
    elapsed: Duration,
    rng: ChaCha8Rng,
}

impl World {
    /// Creates a world for the provided encounter.
    #[must_use]
    pub fn new(config: &EncounterConfig, seed: u64) -> Self {
        Self {
            archetypes: config
                .archetypes
                .iter()
                .map(|archetype| (archetype.id.clone(), archetype.clone()))
                .collect(),
            player: Player::new(&config.player),
            enemies: BTreeMap::new(),
            next_enemy: 0,
            pickups: Vec::new(),
            projectiles: Vec::new(),
            pool: Pool::new(&config.pools),
            pickup_config: config.pickups.clone(),
            projectile_pool: config.weapon.projectile_pool.clone(),
            elapsed: Duration::ZERO,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    fn spawn_enemy(
        &mut self,
        archetype: ArchetypeId,
        position: Vec3,
        power: f32,
        out_events: &mut Vec<Event>,
    ) {
        let Some(definition) = self.archetypes.get(&archetype) else {
            log::warn!("cannot spawn unknown archetype `{archetype}`");
            out_events.push(Event::SpawnRejected {
                archetype,
                reason: SpawnRejection::UnknownArchetype,
            });
            return;
        };
        let stats = definition.stats();

        let handle = match definition.pool.as_ref() {
            Some(key) => match self.pool.acquire(key) {
                Some(handle) => Some(handle),
                None => {
                    out_events.push(Event::SpawnRejected {
                        archetype,
                        reason: SpawnRejection::UnknownPool,
                    });
                    return;
                }
            },
            None => None,
        };

        let id = EnemyId::new(self.next_enemy);
        self.next_enemy = self.next_enemy.wrapping_add(1);

        let mut enemy = Enemy::new(id, archetype.clone(), stats, position, handle);
        enemy.apply_power_up(power);
        out_events.push(Event::EnemySpawned {
            enemy: id,
            archetype,
            position,
            stats: enemy.stats,
        });
        let _ = self.enemies.insert(id, enemy);
    }

    fn damage(&mut self, target: Entity, damage: &DamageEvent, out_events: &mut Vec<Event>) {
        let (outcome, position) = match target {
            Entity::Player => (self.player.take_damage(damage), self.player.position),
            Entity::Enemy(id) => {
                let Some(enemy) = self.enemies.get_mut(&id) else {
                    log::trace!("ignoring damage to missing enemy {}", id.get());
                    return;
                };
                (enemy.take_damage(damage), enemy.position)
            }
        };

        match outcome {
            HitOutcome::Rejected => {
                log::trace!("{target:?} rejected a hit");
            }
            HitOutcome::Wounded {
                dealt, remaining, ..
            } => out_events.push(Event::EntityDamaged {
                entity: target,
                amount: dealt,
                critical: damage.critical,
                knockback: damage.knockback,
                remaining,
            }),
            HitOutcome::Killed { dealt, .. } => {
                out_events.push(Event::EntityDamaged {
                    entity: target,
                    amount: dealt,
                    critical: damage.critical,
                    knockback: damage.knockback,
                    remaining: 0.0,
                });
                match target {
                    Entity::Player => {
                        log::info!("player died at {position}");
                        out_events.push(Event::EntityDied {
                            entity: Entity::Player,
                            archetype: None,
                            position,
                        });
                    }
                    Entity::Enemy(id) => self.remove_enemy(id, true, out_events),
                }
            }
        }
    }

    fn detonate(
        &mut self,
        enemy: EnemyId,
        radius: f32,
        damage: f32,
        knockback: f32,
        out_events: &mut Vec<Event>,
    ) {
        let Some(bomber) = self.enemies.get_mut(&enemy) else {
            return;
        };
        if !bomber.vitals.kill() {
            return;
        }
        let center = bomber.position;

        let candidates = self
            .enemies
            .values()
            .filter(|other| other.is_alive())
            .map(|other| (Entity::Enemy(other.id), other.position))
            .chain(
                self.player
                    .is_alive()
                    .then_some((Entity::Player, self.player.position)),
            );
        let caught = blast_targets(center, radius, Entity::Enemy(enemy), candidates);
        log::debug!(
            "enemy {} detonated at {center}, catching {}",
            enemy.get(),
            caught.len()
        );

        let blast = DamageEvent::new(damage, center, knockback);
        for target in caught {
            self.damage(target, &blast, out_events);
        }
        self.remove_enemy(enemy, true, out_events);
    }

    fn remove_enemy(&mut self, id: EnemyId, killed: bool, out_events: &mut Vec<Event>) {
        let Some(enemy) = self.enemies.remove(&id) else {
            return;
        };
        if let Some(handle) = enemy.handle {
            self.pool.release(handle);
        }

        if killed {
            out_events.push(Event::EntityDied {
                entity: Entity::Enemy(id),
                archetype: Some(enemy.archetype),
                position: enemy.position,
            });
            out_events.push(Event::EnemyKilled { enemy: id });
        } else {
            out_events.push(Event::EnemyDespawned { enemy: id });
        }
    }

    fn drop_loot(&mut self, kind: LootKind, position: Vec3, out_events: &mut Vec<Event>) {
        let handle = match self.pickup_config.pool_for(kind) {
            Some(key) => match self.pool.acquire(key) {
                Some(handle) => Some(handle),
                None => return,
            },
            None => None,
        };

        let scatter = Vec3::new(
            self.rng.gen_range(-LOOT_SCATTER..=LOOT_SCATTER),
            0.0,
            self.rng.gen_range(-LOOT_SCATTER..=LOOT_SCATTER),
        );
        let position = position + scatter;
        self.pickups.push(Pickup {
            kind,
            position,
            handle,
        });
        out_events.push(Event::PickupDropped { kind, position });
    }

    fn launch(&mut self, projectile: Projectile) {
        let handle = match self.projectile_pool.as_ref() {
            Some(key) => match self.pool.acquire(key) {
                Some(handle) => Some(handle),
                None => return,
            },
            None => None,
        };
        self.projectiles.push(Projectile {
            handle,
            ..projectile
        });
    }

    fn heal_player(&mut self, amount: f32, out_events: &mut Vec<Event>) {
        let restored = self.player.vitals.heal(amount);
        if restored > 0.0 {
            out_events.push(Event::PlayerHealed {
                amount: restored,
                current: self.player.vitals.health(),
            });
        }
    }

    fn advance(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        self.player.advance(dt);
        for enemy in self.enemies.values_mut() {
            enemy.advance(dt);
        }
        self.advance_projectiles(dt, out_events);
        self.advance_pickups(dt, out_events);
    }

    fn advance_projectiles(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let mut hits = Vec::new();
        let mut in_flight = Vec::with_capacity(self.projectiles.len());

        for mut projectile in std::mem::take(&mut self.projectiles) {
            let start = projectile.position;
            let alive = projectile.advance(dt);
            let end = projectile.position;
            let struck = self
                .enemies
                .values()
                .filter(|enemy| enemy.is_alive())
                .filter_map(|enemy| {
                    sweep_entry(start, end, enemy.position, PROJECTILE_HIT_RADIUS)
                        .map(|entry| (entry, enemy.id))
                })
                .min_by(|a, b| a.0.total_cmp(&b.0))
                .map(|(_, id)| id);

            match struck {
                Some(enemy) => {
                    hits.push((enemy, projectile.damage));
                    if let Some(handle) = projectile.handle.take() {
                        self.pool.release(handle);
                    }
                }
                None if alive => in_flight.push(projectile),
                None => {
                    if let Some(handle) = projectile.handle.take() {
                        self.pool.release(handle);
                    }
                }
            }
        }
        self.projectiles = in_flight;

        for (enemy, damage) in hits {
            self.damage(Entity::Enemy(enemy), &damage, out_events);
        }
    }

    fn advance_pickups(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        if !self.player.is_alive() {
            return;
        }

        let player = self.player.position;
        let config = self.pickup_config.clone();
        let mut collected = Vec::new();
        let mut remaining = Vec::with_capacity(self.pickups.len());

        for mut pickup in std::mem::take(&mut self.pickups) {
            pickup.attract(player, config.attraction_range, config.attraction_speed, dt);
            let mut offset = player - pickup.position;
            offset.y = 0.0;
            if offset.length() <= config.pickup_range {
                collected.push(pickup);
            } else {
                remaining.push(pickup);
            }
        }
        self.pickups = remaining;

        for pickup in collected {
            let amount = match pickup.kind {
                LootKind::XpOrb => config.xp_amount,
                LootKind::HealthPickup => {
                    self.heal_player(config.heal_amount, out_events);
                    config.heal_amount
                }
                LootKind::Coin | LootKind::Artifact => 1.0,
            };
            if let Some(handle) = pickup.handle {
                self.pool.release(handle);
            }
            out_events.push(Event::PickupCollected {
                kind: pickup.kind,
                amount,
            });
        }
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => {
            world.elapsed = world.elapsed.saturating_add(dt);
            out_events.push(Event::TimeAdvanced { dt });
            world.advance(dt, out_events);
        }
        Command::SpawnEnemy {
            archetype,
            position,
            power,
        } => world.spawn_enemy(archetype, position, power, out_events),
        Command::SetDestination { enemy, destination } => {
            if let Some(enemy) = world.enemies.get_mut(&enemy) {
                enemy.agent.set_destination(destination);
            }
        }
        Command::SetSpeed { enemy, speed } => {
            if let Some(enemy) = world.enemies.get_mut(&enemy) {
                enemy.agent.set_speed(speed);
            }
        }
        Command::SetStopped { enemy, stopped } => {
            if let Some(enemy) = world.enemies.get_mut(&enemy) {
                enemy.agent.set_stopped(stopped);
            }
        }
        Command::OrientEnemy { enemy, heading } => {
            if let Some(enemy) = world.enemies.get_mut(&enemy) {
                let mut heading = heading;
                heading.y = 0.0;
                if let Some(heading) = heading.try_normalize() {
                    enemy.heading = heading;
                }
            }
        }
        Command::ApplyDamage { target, damage } => world.damage(target, &damage, out_events),
        Command::Detonate {
            enemy,
            radius,
            damage,
            knockback,
        } => world.detonate(enemy, radius, damage, knockback, out_events),
        Command::DespawnEnemy { enemy } => world.remove_enemy(enemy, false, out_events),
        Command::DropLoot { kind, position } => world.drop_loot(kind, position, out_events),
        Command::LaunchProjectile {
            origin,
            direction,
            speed,
            range,
            damage,
        } => {
            let mut direction = direction;
            direction.y = 0.0;
            let Some(direction) = direction.try_normalize() else {
                return;
            };
            world.launch(Projectile {
                position: origin,
                direction,
                speed,
                remaining: range.max(0.0),
                damage,
                handle: None,
            });
        }
        Command::MovePlayer { velocity } => world.player.steer(velocity),
        Command::HealPlayer { amount } => world.heal_player(amount, out_events),
        Command::RaisePlayerMaxHealth { amount } => world.player.vitals.raise_max(amount),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use glam::Vec3;
    use horde_core::{
        Damageable, EnemyId, EnemySnapshot, EnemyStats, EnemyView, LootKind, PlayerSnapshot,
        PoolKey,
    };

    use super::{PoolStats, World};

    /// Snapshot of the player.
    #[must_use]
    pub fn player(world: &World) -> PlayerSnapshot {
        world.player.snapshot()
    }

    /// Snapshots of every live enemy, ordered by identifier.
    #[must_use]
    pub fn enemy_view(world: &World) -> EnemyView {
        EnemyView::from_snapshots(
            world
                .enemies
                .values()
                .map(|enemy| EnemySnapshot {
                    id: enemy.id,
                    archetype: enemy.archetype.clone(),
                    position: enemy.position,
                    health: enemy.current_health(),
                    max_health: enemy.max_health(),
                })
                .collect(),
        )
    }

    /// Number of enemies present in the world.
    #[must_use]
    pub fn enemy_count(world: &World) -> usize {
        world.enemies.len()
    }

    /// Runtime stats of a single enemy.
    #[must_use]
    pub fn enemy_stats(world: &World, enemy: EnemyId) -> Option<EnemyStats> {
        world.enemies.get(&enemy).map(|enemy| enemy.stats)
    }

    /// Direction a single enemy is facing.
    #[must_use]
    pub fn enemy_heading(world: &World, enemy: EnemyId) -> Option<Vec3> {
        world.enemies.get(&enemy).map(|enemy| enemy.heading)
    }

    /// Kinds and positions of every loose pickup.
    #[must_use]
    pub fn pickups(world: &World) -> Vec<(LootKind, Vec3)> {
        world
            .pickups
            .iter()
            .map(|pickup| (pickup.kind, pickup.position))
            .collect()
    }

    /// Positions of every projectile in flight.
    #[must_use]
    pub fn projectiles(world: &World) -> Vec<Vec3> {
        world
            .projectiles
            .iter()
            .map(|projectile| projectile.position)
            .collect()
    }

    /// Usage counters of every configured free list.
    #[must_use]
    pub fn pool_stats(world: &World) -> Vec<(PoolKey, PoolStats)> {
        world.pool.stats()
    }

    /// Simulated time elapsed since the world was created.
    #[must_use]
    pub fn elapsed(world: &World) -> Duration {
        world.elapsed
    }
}
