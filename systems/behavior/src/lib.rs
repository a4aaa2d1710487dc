#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that runs one behaviour state machine per enemy.
//!
//! Brains are created when the world confirms a spawn and dropped when the
//! enemy dies or is despawned. Every `TimeAdvanced` event ticks each brain in
//! identifier order, and brain intents are translated into navigation, damage
//! and detonation commands.

mod brain;

use std::{collections::BTreeMap, time::Duration};

use glam::Vec3;
use horde_core::{Command, EnemyId, EnemyView, Entity, Event, Navigation, PlayerSnapshot};

pub use brain::{BrainAction, EnemyBrain, EnemyState, Perception, STAGGER_DURATION};

/// Behaviour system hosting every live enemy brain.
#[derive(Debug, Default)]
pub struct Behavior {
    brains: BTreeMap<EnemyId, EnemyBrain>,
    clock: Duration,
    actions: Vec<BrainAction>,
}

impl Behavior {
    /// Creates a system with no brains.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// State of the brain driving `enemy`, if it is still tracked.
    #[must_use]
    pub fn state_of(&self, enemy: EnemyId) -> Option<EnemyState> {
        self.brains.get(&enemy).map(EnemyBrain::state)
    }

    /// Number of tracked brains.
    #[must_use]
    pub fn len(&self) -> usize {
        self.brains.len()
    }

    /// Whether no brains are tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.brains.is_empty()
    }

    /// Consumes world events and emits the commands produced by every brain.
    pub fn handle(
        &mut self,
        events: &[Event],
        enemies: &EnemyView,
        player: Option<PlayerSnapshot>,
        out: &mut Vec<Command>,
    ) {
        let target = player.filter(|player| player.alive).map(|player| player.position);

        for event in events {
            match event {
                Event::EnemySpawned { enemy, stats, .. } => {
                    let _ = self.brains.insert(*enemy, EnemyBrain::new(*stats));
                }
                Event::EntityDamaged {
                    entity: Entity::Enemy(enemy),
                    knockback,
                    ..
                } if *knockback != 0.0 => {
                    if let Some(brain) = self.brains.get_mut(enemy) {
                        let _ = brain.stagger(&mut CommandNavigator::new(*enemy, out));
                    }
                }
                Event::EntityDied {
                    entity: Entity::Enemy(enemy),
                    ..
                }
                | Event::EnemyDespawned { enemy } => {
                    let _ = self.brains.remove(enemy);
                }
                Event::TimeAdvanced { dt } => {
                    self.clock = self.clock.saturating_add(*dt);
                    self.tick(*dt, enemies, target, out);
                }
                _ => {}
            }
        }
    }

    fn tick(
        &mut self,
        dt: Duration,
        enemies: &EnemyView,
        target: Option<Vec3>,
        out: &mut Vec<Command>,
    ) {
        for (&enemy, brain) in &mut self.brains {
            let Some(snapshot) = enemies.get(enemy) else {
                continue;
            };

            let perception = Perception {
                now: self.clock,
                position: snapshot.position,
                health: snapshot.health,
                target,
            };
            brain.update(
                dt,
                &perception,
                &mut CommandNavigator::new(enemy, out),
                &mut self.actions,
            );

            for action in self.actions.drain(..) {
                out.push(match action {
                    BrainAction::Strike(damage) => Command::ApplyDamage {
                        target: Entity::Player,
                        damage,
                    },
                    BrainAction::Detonate {
                        radius,
                        damage,
                        knockback,
                    } => Command::Detonate {
                        enemy,
                        radius,
                        damage,
                        knockback,
                    },
                    BrainAction::Face(heading) => Command::OrientEnemy { enemy, heading },
                });
            }
        }
    }
}

/// Navigation adapter that turns steering calls into world commands.
struct CommandNavigator<'a> {
    enemy: EnemyId,
    out: &'a mut Vec<Command>,
}

impl<'a> CommandNavigator<'a> {
    fn new(enemy: EnemyId, out: &'a mut Vec<Command>) -> Self {
        Self { enemy, out }
    }
}

impl Navigation for CommandNavigator<'_> {
    fn set_destination(&mut self, destination: Vec3) {
        self.out.push(Command::SetDestination {
            enemy: self.enemy,
            destination,
        });
    }

    fn set_speed(&mut self, speed: f32) {
        self.out.push(Command::SetSpeed {
            enemy: self.enemy,
            speed,
        });
    }

    fn set_stopped(&mut self, stopped: bool) {
        self.out.push(Command::SetStopped {
            enemy: self.enemy,
            stopped,
        });
    }
}
