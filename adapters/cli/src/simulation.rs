//! Headless host that wires the world and every system into a frame loop.

use std::{cell::RefCell, rc::Rc, time::Duration};

use glam::Vec3;
use horde_core::{Command, EncounterConfig, Entity, Event, EventBus, ModifierStat};
use horde_system_behavior::Behavior;
use horde_system_director::Director;
use horde_system_progression::Progression;
use horde_system_rewards::{Loot, PerkDeck};
use horde_system_spawning::Scheduler;
use horde_system_weapon::Weapon;
use horde_world::{self as world, query, World};
use serde::Serialize;

/// Distance at which a hurt autopilot starts backing away from an enemy.
const KITE_DISTANCE: f32 = 4.0;
/// Health fraction below which the autopilot retreats.
const RETREAT_HEALTH: f32 = 0.35;
/// Fraction of the weapon range the autopilot closes to before holding still.
const ENGAGE_FACTOR: f32 = 0.8;

const WORLD_STREAM: u64 = 0x9e37_79b9_7f4a_7c15;
const SCHEDULER_STREAM: u64 = 0xbf58_476d_1ce4_e5b9;
const WEAPON_STREAM: u64 = 0x94d0_49bb_1331_11eb;
const LOOT_STREAM: u64 = 0x2545_f491_4f6c_dd1d;
const PERK_STREAM: u64 = 0x5851_f42d_4c95_7f2d;

/// Limits of a single run.
#[derive(Clone, Copy, Debug)]
pub(crate) struct RunLimits {
    pub(crate) duration: Duration,
    pub(crate) tick: Duration,
    pub(crate) waves: Option<u32>,
}

/// Counters maintained by an event-bus observer.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub(crate) struct Tally {
    pub(crate) waves_started: u32,
    pub(crate) waves_completed: u32,
    pub(crate) spawns: u32,
    pub(crate) rejected_spawns: u32,
    pub(crate) kills: u32,
    pub(crate) despawns: u32,
    pub(crate) pickups_dropped: u32,
    pub(crate) pickups_collected: u32,
    pub(crate) critical_hits: u32,
    pub(crate) player_died: bool,
}

impl Tally {
    fn record(&mut self, event: &Event) {
        match event {
            Event::WaveStarted { .. } => self.waves_started += 1,
            Event::WaveCompleted { .. } => self.waves_completed += 1,
            Event::EnemySpawned { .. } => self.spawns += 1,
            Event::SpawnRejected { .. } => self.rejected_spawns += 1,
            Event::EnemyKilled { .. } => self.kills += 1,
            Event::EnemyDespawned { .. } => self.despawns += 1,
            Event::PickupDropped { .. } => self.pickups_dropped += 1,
            Event::PickupCollected { .. } => self.pickups_collected += 1,
            Event::EntityDamaged { critical: true, .. } => self.critical_hits += 1,
            Event::EntityDied {
                entity: Entity::Player,
                ..
            } => self.player_died = true,
            _ => {}
        }
    }
}

/// Usage counters of one pool, as reported in the summary.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub(crate) struct PoolSummary {
    pub(crate) key: String,
    pub(crate) idle: usize,
    pub(crate) active: usize,
    pub(crate) overflow_allocations: u64,
    pub(crate) destroyed: u64,
}

/// Outcome of a run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub(crate) struct Summary {
    pub(crate) seed: u64,
    pub(crate) elapsed_seconds: f32,
    pub(crate) tally: Tally,
    pub(crate) enemies_alive: u32,
    pub(crate) level: u32,
    pub(crate) xp: u32,
    pub(crate) perks: Vec<String>,
    pub(crate) difficulty: f32,
    pub(crate) player_health: f32,
    pub(crate) player_max_health: f32,
    pub(crate) pools: Vec<PoolSummary>,
}

/// Hosts one encounter.
pub(crate) struct Simulation {
    seed: u64,
    move_speed: f32,
    arena_radius: f32,
    spawn_origin: Vec3,
    world: World,
    director: Director,
    scheduler: Scheduler,
    behavior: Behavior,
    weapon: Weapon,
    loot: Loot,
    progression: Progression,
    perks: PerkDeck,
    bus: EventBus,
    tally: Rc<RefCell<Tally>>,
    exhausted: bool,
}

impl Simulation {
    pub(crate) fn new(config: &EncounterConfig, seed: u64) -> Self {
        let tally = Rc::new(RefCell::new(Tally::default()));
        let mut bus = EventBus::new();
        let recorder = Rc::clone(&tally);
        bus.subscribe(move |event: &Event| recorder.borrow_mut().record(event));
        bus.subscribe(|event: &Event| match event {
            Event::TimeAdvanced { .. } => {}
            Event::WaveStarted { .. } | Event::WaveCompleted { .. } | Event::LevelUp { .. } => {
                log::info!("{event:?}");
            }
            _ => log::trace!("{event:?}"),
        });

        Self {
            seed,
            move_speed: config.player.move_speed,
            arena_radius: config.waves.arena_radius,
            spawn_origin: config.waves.spawn_origin,
            world: World::new(config, seed ^ WORLD_STREAM),
            director: Director::new(config.director.clone()),
            scheduler: Scheduler::new(
                config.waves.clone(),
                &config.archetypes,
                seed ^ SCHEDULER_STREAM,
            ),
            behavior: Behavior::new(),
            weapon: Weapon::new(config.weapon.clone(), seed ^ WEAPON_STREAM),
            loot: Loot::new(&config.loot_tables, &config.archetypes, seed ^ LOOT_STREAM),
            progression: Progression::new(&config.progression),
            perks: PerkDeck::new(
                config.perks.clone(),
                config.rarity,
                &config.progression,
                seed ^ PERK_STREAM,
            ),
            bus,
            tally,
            exhausted: false,
        }
    }

    /// Runs frames until a limit is reached, the player dies or the waves run out.
    pub(crate) fn run(&mut self, limits: RunLimits) -> Summary {
        let mut elapsed = Duration::ZERO;
        while elapsed < limits.duration {
            self.frame(limits.tick);
            elapsed = elapsed.saturating_add(limits.tick);

            let tally = self.tally.borrow();
            if tally.player_died {
                log::info!("player died after {:.1}s", elapsed.as_secs_f32());
                break;
            }
            if limits
                .waves
                .is_some_and(|waves| tally.waves_completed >= waves)
            {
                break;
            }
            if self.exhausted && !self.scheduler.is_wave_active() {
                break;
            }
        }
        self.summary()
    }

    /// Advances the encounter by one frame.
    pub(crate) fn frame(&mut self, dt: Duration) {
        let mut events = Vec::new();
        let velocity = self.autopilot();
        world::apply(&mut self.world, Command::MovePlayer { velocity }, &mut events);
        world::apply(&mut self.world, Command::Tick { dt }, &mut events);
        self.pump(events);

        let player = query::player(&self.world);
        let now = query::elapsed(&self.world);
        self.director
            .record_sample(player.health_fraction(), player.alive, now);
        self.director.tick(dt, now);

        self.choose_perk();

        if !self.scheduler.is_wave_active() && !self.exhausted {
            let mut notes = Vec::new();
            if !self.scheduler.start_next_wave(&mut notes) {
                self.exhausted = notes.contains(&Event::WavesExhausted);
            }
            self.pump(notes);
        }
    }

    /// Feeds events to observers and systems until no further commands arise.
    fn pump(&mut self, initial: Vec<Event>) {
        let mut events = initial;
        while !events.is_empty() {
            self.bus.publish(&events);

            let view = query::enemy_view(&self.world);
            let player = Some(query::player(&self.world));
            let mut commands = Vec::new();
            let mut notes = Vec::new();

            self.scheduler
                .handle(&events, &self.director, &mut commands, &mut notes);
            self.behavior.handle(&events, &view, player, &mut commands);
            self.weapon.handle(&events, &view, player, &mut commands);
            self.loot.handle(&events, &self.director, &mut commands);
            self.progression.handle(&events, &mut notes);
            self.perks.handle(&events, &mut notes);

            for command in commands {
                world::apply(&mut self.world, command, &mut notes);
            }
            events = notes;
        }
    }

    /// Accepts the first perk of the oldest offer and routes its effects.
    fn choose_perk(&mut self) {
        let Some(first) = self
            .perks
            .pending_offer()
            .and_then(|offer| offer.first().cloned())
        else {
            return;
        };
        let Some(perk) = self.perks.choose(&first).cloned() else {
            return;
        };
        log::info!("chose perk `{}` ({})", perk.id, perk.name);

        let mut commands = Vec::new();
        for effect in perk.effects {
            if self.weapon.apply_modifier(effect) {
                continue;
            }
            match effect.stat {
                ModifierStat::MaxHealth => {
                    commands.push(Command::RaisePlayerMaxHealth {
                        amount: effect.value,
                    });
                    commands.push(Command::HealPlayer {
                        amount: effect.value,
                    });
                }
                other => log::debug!("perk stat {other:?} has no headless counterpart"),
            }
        }

        let mut events = Vec::new();
        for command in commands {
            world::apply(&mut self.world, command, &mut events);
        }
        self.pump(events);
    }

    /// Closes in on the nearest enemy, retreating when badly hurt, and
    /// sweeps up pickups once the arena is clear.
    fn autopilot(&self) -> Vec3 {
        let player = query::player(&self.world);
        if !player.alive {
            return Vec3::ZERO;
        }
        let heading = |target: Vec3| {
            let mut offset = target - player.position;
            offset.y = 0.0;
            offset.normalize_or_zero() * self.move_speed
        };

        let mut from_origin = player.position - self.spawn_origin;
        from_origin.y = 0.0;
        if from_origin.length() > self.arena_radius {
            return heading(self.spawn_origin);
        }

        let nearest = query::enemy_view(&self.world)
            .iter()
            .map(|enemy| enemy.position)
            .min_by(|a, b| {
                a.distance_squared(player.position)
                    .total_cmp(&b.distance_squared(player.position))
            });
        if let Some(enemy) = nearest {
            let distance = enemy.distance(player.position);
            if player.health_fraction() < RETREAT_HEALTH && distance < KITE_DISTANCE {
                return -heading(enemy);
            }
            if distance > self.weapon.range() * ENGAGE_FACTOR {
                return heading(enemy);
            }
            return Vec3::ZERO;
        }

        query::pickups(&self.world)
            .into_iter()
            .map(|(_, position)| position)
            .min_by(|a, b| {
                a.distance_squared(player.position)
                    .total_cmp(&b.distance_squared(player.position))
            })
            .map_or(Vec3::ZERO, heading)
    }

    pub(crate) fn summary(&self) -> Summary {
        let player = query::player(&self.world);
        Summary {
            seed: self.seed,
            elapsed_seconds: query::elapsed(&self.world).as_secs_f32(),
            tally: self.tally.borrow().clone(),
            enemies_alive: self.scheduler.enemies_alive(),
            level: self.progression.level(),
            xp: self.progression.xp(),
            perks: self
                .perks
                .chosen()
                .iter()
                .map(|perk| perk.as_str().to_owned())
                .collect(),
            difficulty: self.director.current_difficulty(),
            player_health: player.health,
            player_max_health: player.max_health,
            pools: query::pool_stats(&self.world)
                .into_iter()
                .map(|(key, stats)| PoolSummary {
                    key: key.as_str().to_owned(),
                    idle: stats.idle,
                    active: stats.active,
                    overflow_allocations: stats.overflow_allocations,
                    destroyed: stats.destroyed,
                })
                .collect(),
        }
    }
}
