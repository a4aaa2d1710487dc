#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Wave scheduler that turns the configured wave list into spawn commands.
//!
//! The scheduler is a timer-driven state machine stepped by `TimeAdvanced`
//! events. Every pending wait is a remaining-time field, so dropping the
//! scheduler mid-wave leaves nothing behind. A wave only completes once every
//! group has spawned and the alive counter, fed by death and despawn events,
//! drops to zero.

use std::time::Duration;

use glam::Vec3;
use horde_core::{
    ArchetypeId, Command, CurveId, DifficultySource, EnemyArchetype, Event, SpawnGroup,
    WaveDefinition, WaveSchedule,
};
use horde_system_rewards::WeightedTable;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, UnitDisc};
use sha2::{Digest, Sha256};

const RNG_STREAM_PLACEMENT: &str = "placement";

/// Observable phase of the wave state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// No wave has been started, or the schedule ran out.
    Idle,
    /// Waiting out the delay before the first group.
    Warmup {
        /// Time left before the first group begins.
        remaining: Duration,
    },
    /// Emitting the enemies of one group at its cadence.
    SpawningGroup {
        /// Index of the group within the wave.
        group: usize,
        /// Enemies of the group spawned so far.
        spawned: u32,
        /// Time left before the next spawn.
        until_next: Duration,
    },
    /// Waiting between two groups.
    BetweenGroups {
        /// Index of the group that starts once the wait elapses.
        next_group: usize,
        /// Time left before that group begins.
        remaining: Duration,
    },
    /// Every group has spawned; waiting for the alive counter to reach zero.
    AwaitingClear,
    /// The last wave was cleared and the next one has not been started yet.
    WaveComplete,
}

/// Pure system sequencing waves, groups and individual spawns.
#[derive(Debug)]
pub struct Scheduler {
    schedule: WaveSchedule,
    catalog: WeightedTable<ArchetypeId>,
    seed: u64,
    phase: Phase,
    next_wave: usize,
    active_wave: Option<usize>,
    cycle: u32,
    waves_started: u32,
    alive: u32,
    rng: ChaCha8Rng,
}

impl Scheduler {
    /// Creates an idle scheduler over the provided schedule.
    ///
    /// `archetypes` supplies the spawn weights used by groups that do not
    /// name an archetype.
    #[must_use]
    pub fn new(schedule: WaveSchedule, archetypes: &[EnemyArchetype], seed: u64) -> Self {
        Self {
            schedule,
            catalog: archetypes
                .iter()
                .map(|archetype| (archetype.id.clone(), archetype.spawn_weight))
                .collect(),
            seed,
            phase: Phase::Idle,
            next_wave: 0,
            active_wave: None,
            cycle: 0,
            waves_started: 0,
            alive: 0,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Number of waves started so far, counting every loop of the schedule.
    #[must_use]
    pub const fn current_wave_number(&self) -> u32 {
        self.waves_started
    }

    /// Enemies spawned by the scheduler that have not died or despawned yet.
    #[must_use]
    pub const fn enemies_alive(&self) -> u32 {
        self.alive
    }

    /// Reports whether a wave is between its start and its completion.
    #[must_use]
    pub fn is_wave_active(&self) -> bool {
        !matches!(self.phase, Phase::Idle | Phase::WaveComplete)
    }

    /// Current phase of the state machine.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Starts the next wave.
    ///
    /// Returns `false` without side effects when a wave is already running.
    /// When the schedule is exhausted and does not loop, emits
    /// `Event::WavesExhausted` and stays idle.
    pub fn start_next_wave(&mut self, out_events: &mut Vec<Event>) -> bool {
        if self.is_wave_active() {
            log::debug!("ignoring wave start while wave {} runs", self.waves_started);
            return false;
        }

        if self.next_wave >= self.schedule.waves.len() {
            if self.schedule.looping && !self.schedule.waves.is_empty() {
                self.next_wave = 0;
                self.cycle = self.cycle.saturating_add(1);
            } else {
                self.phase = Phase::Idle;
                out_events.push(Event::WavesExhausted);
                return false;
            }
        }

        let index = self.next_wave;
        self.active_wave = Some(index);
        self.waves_started = self.waves_started.saturating_add(1);
        self.rng = ChaCha8Rng::seed_from_u64(derive_wave_seed(self.seed, index, self.cycle));
        self.phase = Phase::Warmup {
            remaining: self.schedule.waves[index].warmup(),
        };

        log::info!(
            "wave {} started (definition {index}, cycle {})",
            self.waves_started,
            self.cycle
        );
        out_events.push(Event::WaveStarted {
            wave: self.waves_started,
        });
        true
    }

    /// Returns the scheduler to its initial state, abandoning any wave in flight.
    pub fn reset(&mut self) {
        self.phase = Phase::Idle;
        self.next_wave = 0;
        self.active_wave = None;
        self.cycle = 0;
        self.waves_started = 0;
        self.alive = 0;
        self.rng = ChaCha8Rng::seed_from_u64(self.seed);
    }

    /// Consumes world events, emitting spawn commands and wave notifications.
    pub fn handle(
        &mut self,
        events: &[Event],
        difficulty: &dyn DifficultySource,
        out_commands: &mut Vec<Command>,
        out_events: &mut Vec<Event>,
    ) {
        for event in events {
            match event {
                Event::TimeAdvanced { dt } => self.advance(*dt, difficulty, out_commands),
                Event::EnemyKilled { .. }
                | Event::EnemyDespawned { .. }
                | Event::SpawnRejected { .. } => {
                    self.alive = self.alive.saturating_sub(1);
                }
                _ => continue,
            }
            self.check_clear(out_events);
        }
    }

    fn wave(&self) -> Option<&WaveDefinition> {
        self.active_wave.and_then(|index| self.schedule.waves.get(index))
    }

    fn group(&self, group: usize) -> Option<&SpawnGroup> {
        self.wave().and_then(|wave| wave.groups.get(group))
    }

    fn advance(
        &mut self,
        dt: Duration,
        difficulty: &dyn DifficultySource,
        out: &mut Vec<Command>,
    ) {
        let mut budget = dt;

        loop {
            match self.phase {
                Phase::Warmup { remaining } => {
                    if budget < remaining {
                        self.phase = Phase::Warmup {
                            remaining: remaining - budget,
                        };
                        return;
                    }
                    budget -= remaining;
                    self.begin_group(0);
                }
                Phase::BetweenGroups {
                    next_group,
                    remaining,
                } => {
                    if budget < remaining {
                        self.phase = Phase::BetweenGroups {
                            next_group,
                            remaining: remaining - budget,
                        };
                        return;
                    }
                    budget -= remaining;
                    self.begin_group(next_group);
                }
                Phase::SpawningGroup {
                    group,
                    spawned,
                    until_next,
                } => {
                    if budget < until_next {
                        self.phase = Phase::SpawningGroup {
                            group,
                            spawned,
                            until_next: until_next - budget,
                        };
                        return;
                    }
                    budget -= until_next;
                    self.spawn_from(group, difficulty, out);
                    self.finish_spawn(group, spawned + 1);
                }
                Phase::Idle | Phase::AwaitingClear | Phase::WaveComplete => return,
            }
        }
    }

    fn begin_group(&mut self, mut group: usize) {
        loop {
            let Some((count, named)) = self
                .group(group)
                .map(|definition| (definition.count, definition.archetype.is_some()))
            else {
                log::debug!("wave {} finished spawning", self.waves_started);
                self.phase = Phase::AwaitingClear;
                return;
            };

            if count == 0 {
                log::warn!(
                    "skipping empty group {group} of wave {}",
                    self.waves_started
                );
            } else if !named && self.catalog.total_weight() <= 0.0 {
                log::warn!(
                    "skipping group {group} of wave {}: no archetype and no weighted catalog",
                    self.waves_started
                );
            } else {
                self.phase = Phase::SpawningGroup {
                    group,
                    spawned: 0,
                    until_next: Duration::ZERO,
                };
                return;
            }
            group += 1;
        }
    }

    fn finish_spawn(&mut self, group: usize, spawned: u32) {
        let Some((count, cadence)) = self
            .group(group)
            .map(|definition| (definition.count, definition.cadence()))
        else {
            self.phase = Phase::AwaitingClear;
            return;
        };

        if spawned < count {
            self.phase = Phase::SpawningGroup {
                group,
                spawned,
                until_next: cadence,
            };
            return;
        }

        let has_next = self.group(group + 1).is_some();
        if has_next {
            let remaining = self.wave().map_or(Duration::ZERO, WaveDefinition::group_gap);
            self.phase = Phase::BetweenGroups {
                next_group: group + 1,
                remaining,
            };
        } else {
            self.begin_group(group + 1);
        }
    }

    fn spawn_from(
        &mut self,
        group: usize,
        difficulty: &dyn DifficultySource,
        out: &mut Vec<Command>,
    ) {
        let Some(definition) = self.group(group) else {
            return;
        };
        let fixed = definition.archetype.clone();
        let zones = definition.spawn_zones.clone();

        let archetype = match fixed {
            Some(archetype) => archetype,
            None => match self.catalog.select(&mut self.rng) {
                Some(archetype) => archetype.clone(),
                None => {
                    log::warn!("weighted archetype pick failed for group {group}");
                    return;
                }
            },
        };

        let position = if zones.is_empty() {
            let [x, z]: [f32; 2] = UnitDisc.sample(&mut self.rng);
            self.schedule.spawn_origin + Vec3::new(x, 0.0, z) * self.schedule.arena_radius
        } else {
            zones[self.rng.gen_range(0..zones.len())]
        };

        let power = difficulty
            .multiplier(CurveId::EnemyHealth)
            .max(difficulty.multiplier(CurveId::EnemySpeed));

        self.alive = self.alive.saturating_add(1);
        log::trace!("spawning `{archetype}` at {position} with power {power}");
        out.push(Command::SpawnEnemy {
            archetype,
            position,
            power,
        });
    }

    fn check_clear(&mut self, out_events: &mut Vec<Event>) {
        if self.phase != Phase::AwaitingClear || self.alive > 0 {
            return;
        }

        self.phase = Phase::WaveComplete;
        self.active_wave = None;
        self.next_wave += 1;
        log::info!("wave {} cleared", self.waves_started);
        out_events.push(Event::WaveCompleted {
            wave: self.waves_started,
        });
    }
}

fn derive_wave_seed(seed: u64, wave: usize, cycle: u32) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(seed.to_le_bytes());
    hasher.update((wave as u64).to_le_bytes());
    hasher.update(cycle.to_le_bytes());
    hasher.update(RNG_STREAM_PLACEMENT.as_bytes());
    finalize_seed(hasher)
}

fn finalize_seed(hasher: Sha256) -> u64 {
    let digest = hasher.finalize();
    let mut bytes = [0_u8; 8];
    bytes.copy_from_slice(&digest[0..8]);
    u64::from_le_bytes(bytes)
}
