#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Player weapon that fires automatically whenever its cooldown allows.
//!
//! Melee weapons hit every living enemy within reach. Ranged weapons launch a
//! projectile at the nearest enemy within reach. Perk modifiers are folded in
//! whenever an effective stat is read.

use std::time::Duration;

use glam::Vec3;
use horde_core::{
    Command, DamageEvent, EnemySnapshot, EnemyView, Entity, Event, ModifierStat, PlayerSnapshot,
    StatModifier, WeaponConfig, WeaponKind,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Knockback of a melee swing.
pub const MELEE_KNOCKBACK: f32 = 5.0;
/// Knockback of a projectile hit.
pub const PROJECTILE_KNOCKBACK: f32 = 2.0;

/// Player weapon system.
#[derive(Debug)]
pub struct Weapon {
    config: WeaponConfig,
    modifiers: Vec<StatModifier>,
    clock: Duration,
    last_attack: Option<Duration>,
    rng: ChaCha8Rng,
}

impl Weapon {
    /// Creates an unmodified weapon ready to fire.
    #[must_use]
    pub fn new(config: WeaponConfig, seed: u64) -> Self {
        Self {
            config,
            modifiers: Vec::new(),
            clock: Duration::ZERO,
            last_attack: None,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Records a perk modifier.
    ///
    /// Returns `false` for stats the weapon does not own, which the host routes
    /// elsewhere.
    pub fn apply_modifier(&mut self, modifier: StatModifier) -> bool {
        match modifier.stat {
            ModifierStat::Damage
            | ModifierStat::DamageMultiplier
            | ModifierStat::CritChance
            | ModifierStat::AttackSpeed
            | ModifierStat::Range => {
                self.modifiers.push(modifier);
                true
            }
            ModifierStat::MoveSpeed | ModifierStat::MaxHealth => false,
        }
    }

    /// Modifiers recorded so far.
    #[must_use]
    pub fn modifiers(&self) -> &[StatModifier] {
        &self.modifiers
    }

    /// Damage of a non-critical hit.
    #[must_use]
    pub fn damage(&self) -> f32 {
        let flat = self.sum(ModifierStat::Damage);
        (self.config.base_damage + flat) * self.product(ModifierStat::DamageMultiplier)
    }

    /// Probability of a critical hit.
    #[must_use]
    pub fn crit_chance(&self) -> f32 {
        (self.config.crit_chance + self.sum(ModifierStat::CritChance)).clamp(0.0, 1.0)
    }

    /// Reach of swings and projectiles.
    #[must_use]
    pub fn range(&self) -> f32 {
        self.config.range * self.product(ModifierStat::Range)
    }

    /// Time between attacks.
    #[must_use]
    pub fn cooldown(&self) -> Duration {
        let speed = self.product(ModifierStat::AttackSpeed);
        if speed <= 0.0 {
            return Duration::MAX;
        }
        horde_core::duration_from_secs(self.config.cooldown / speed)
    }

    /// Reports whether the cooldown has elapsed.
    #[must_use]
    pub fn ready(&self) -> bool {
        self.last_attack
            .map_or(true, |last| self.clock >= last.saturating_add(self.cooldown()))
    }

    /// Consumes world events and fires whenever time advances and a target is in reach.
    pub fn handle(
        &mut self,
        events: &[Event],
        enemies: &EnemyView,
        player: Option<PlayerSnapshot>,
        out: &mut Vec<Command>,
    ) {
        for event in events {
            if let Event::TimeAdvanced { dt } = event {
                self.clock = self.clock.saturating_add(*dt);
                if let Some(player) = player {
                    let _ = self.try_attack(&player, enemies, out);
                }
            }
        }
    }

    /// Attacks if the cooldown allows and something is in reach.
    ///
    /// Returns `true` when an attack was made.
    pub fn try_attack(
        &mut self,
        player: &PlayerSnapshot,
        enemies: &EnemyView,
        out: &mut Vec<Command>,
    ) -> bool {
        if !player.alive || !self.ready() {
            return false;
        }

        let range = self.range();
        let fired = match self.config.kind {
            WeaponKind::Melee => self.swing(player.position, range, enemies, out),
            WeaponKind::Ranged => self.shoot(player.position, range, enemies, out),
        };
        if fired {
            self.last_attack = Some(self.clock);
        }
        fired
    }

    fn swing(
        &mut self,
        origin: Vec3,
        range: f32,
        enemies: &EnemyView,
        out: &mut Vec<Command>,
    ) -> bool {
        let mut hit = false;
        for enemy in enemies.iter().filter(|enemy| in_reach(enemy, origin, range)) {
            let damage = self.roll(origin, MELEE_KNOCKBACK);
            out.push(Command::ApplyDamage {
                target: Entity::Enemy(enemy.id),
                damage,
            });
            hit = true;
        }
        hit
    }

    fn shoot(
        &mut self,
        origin: Vec3,
        range: f32,
        enemies: &EnemyView,
        out: &mut Vec<Command>,
    ) -> bool {
        let nearest = enemies
            .iter()
            .filter(|enemy| in_reach(enemy, origin, range))
            .min_by(|a, b| {
                a.position
                    .distance_squared(origin)
                    .total_cmp(&b.position.distance_squared(origin))
            });
        let Some(target) = nearest else {
            return false;
        };

        let mut direction = target.position - origin;
        direction.y = 0.0;
        let Some(direction) = direction.try_normalize() else {
            log::trace!("target {} sits on the player, not firing", target.id.get());
            return false;
        };

        let damage = self.roll(origin, PROJECTILE_KNOCKBACK);
        out.push(Command::LaunchProjectile {
            origin,
            direction,
            speed: self.config.projectile_speed,
            range,
            damage,
        });
        true
    }

    fn roll(&mut self, origin: Vec3, knockback: f32) -> DamageEvent {
        let critical = self.rng.gen::<f32>() < self.crit_chance();
        let amount = if critical {
            self.damage() * self.config.crit_multiplier
        } else {
            self.damage()
        };
        DamageEvent::new(amount, origin, knockback).with_critical(critical)
    }

    fn sum(&self, stat: ModifierStat) -> f32 {
        self.modifiers
            .iter()
            .filter(|modifier| modifier.stat == stat)
            .map(|modifier| modifier.value)
            .sum()
    }

    fn product(&self, stat: ModifierStat) -> f32 {
        self.modifiers
            .iter()
            .filter(|modifier| modifier.stat == stat)
            .map(|modifier| modifier.value)
            .product()
    }
}

fn in_reach(enemy: &EnemySnapshot, origin: Vec3, range: f32) -> bool {
    enemy.health > 0.0 && enemy.position.distance(origin) <= range
}
