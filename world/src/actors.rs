//! The player and enemy bodies that receive damage.

use std::time::Duration;

use glam::Vec3;
use horde_core::{
    ArchetypeId, DamageEvent, Damageable, EnemyId, EnemyStats, HitOutcome, PlayerConfig,
    PlayerSnapshot, PoolHandle,
};
use horde_system_combat::{decay_impulse, Vitals};

use crate::navigation::{NavAgent, STOPPING_FACTOR};

fn absorb(outcome: HitOutcome, knockback: &mut Vec3) -> HitOutcome {
    if let HitOutcome::Wounded { impulse, .. } | HitOutcome::Killed { impulse, .. } = outcome {
        *knockback += impulse;
    }
    outcome
}

#[derive(Debug)]
pub(crate) struct Player {
    pub(crate) position: Vec3,
    pub(crate) velocity: Vec3,
    pub(crate) move_speed: f32,
    knockback: Vec3,
    pub(crate) vitals: Vitals,
}

impl Player {
    pub(crate) fn new(config: &PlayerConfig) -> Self {
        Self {
            position: config.spawn_position,
            velocity: Vec3::ZERO,
            move_speed: config.move_speed,
            knockback: Vec3::ZERO,
            vitals: Vitals::new(
                config.max_health,
                horde_core::duration_from_secs(config.invincibility),
            ),
        }
    }

    pub(crate) fn advance(&mut self, dt: Duration) {
        self.vitals.advance(dt);
        if !self.vitals.is_alive() {
            return;
        }
        let mut drift = self.velocity + self.knockback;
        drift.y = 0.0;
        self.position += drift * dt.as_secs_f32();
        self.knockback = decay_impulse(self.knockback, dt);
    }

    pub(crate) fn steer(&mut self, velocity: Vec3) {
        let mut velocity = velocity;
        velocity.y = 0.0;
        self.velocity = velocity.clamp_length_max(self.move_speed);
    }

    pub(crate) fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            position: self.position,
            health: self.vitals.health(),
            max_health: self.vitals.max_health(),
            alive: self.vitals.is_alive(),
        }
    }
}

impl Damageable for Player {
    fn take_damage(&mut self, damage: &DamageEvent) -> HitOutcome {
        absorb(self.vitals.take(damage, self.position), &mut self.knockback)
    }

    fn is_alive(&self) -> bool {
        self.vitals.is_alive()
    }

    fn current_health(&self) -> f32 {
        self.vitals.health()
    }

    fn max_health(&self) -> f32 {
        self.vitals.max_health()
    }
}

#[derive(Debug)]
pub(crate) struct Enemy {
    pub(crate) id: EnemyId,
    pub(crate) archetype: ArchetypeId,
    pub(crate) stats: EnemyStats,
    pub(crate) vitals: Vitals,
    pub(crate) position: Vec3,
    pub(crate) heading: Vec3,
    pub(crate) agent: NavAgent,
    pub(crate) handle: Option<PoolHandle>,
    knockback: Vec3,
}

impl Enemy {
    pub(crate) fn new(
        id: EnemyId,
        archetype: ArchetypeId,
        stats: EnemyStats,
        position: Vec3,
        handle: Option<PoolHandle>,
    ) -> Self {
        Self {
            id,
            archetype,
            stats,
            vitals: Vitals::new(stats.max_health, Duration::ZERO),
            position,
            heading: Vec3::Z,
            agent: NavAgent::new(stats.move_speed, stats.attack_range * STOPPING_FACTOR),
            handle,
            knockback: Vec3::ZERO,
        }
    }

    /// Scales health, speed and damage of this instance only.
    pub(crate) fn apply_power_up(&mut self, multiplier: f32) {
        if !multiplier.is_finite() || multiplier <= 0.0 {
            log::warn!("ignoring power-up {multiplier} for enemy {}", self.id.get());
            return;
        }
        self.stats.apply_power_up(multiplier);
        self.vitals.scale(multiplier);
        horde_core::Navigation::set_speed(&mut self.agent, self.stats.move_speed);
    }

    pub(crate) fn advance(&mut self, dt: Duration) {
        self.vitals.advance(dt);
        let step = self.agent.step(self.position, dt);
        let mut drift = self.knockback * dt.as_secs_f32();
        drift.y = 0.0;
        self.position += step + drift;
        self.knockback = decay_impulse(self.knockback, dt);
    }
}

impl Damageable for Enemy {
    fn take_damage(&mut self, damage: &DamageEvent) -> HitOutcome {
        absorb(self.vitals.take(damage, self.position), &mut self.knockback)
    }

    fn is_alive(&self) -> bool {
        self.vitals.is_alive()
    }

    fn current_health(&self) -> f32 {
        self.vitals.health()
    }

    fn max_health(&self) -> f32 {
        self.vitals.max_health()
    }
}

#[cfg(test)]
mod tests {
    use horde_core::MovementPattern;

    use super::*;

    fn enemy() -> Enemy {
        let stats = EnemyStats {
            max_health: 50.0,
            move_speed: 3.0,
            attack_damage: 5.0,
            attack_range: 2.0,
            detection_range: 10.0,
            attack_cooldown: Duration::from_secs(2),
            pattern: MovementPattern::Rusher,
        };
        Enemy::new(
            EnemyId::new(0),
            ArchetypeId::new("grunt"),
            stats,
            Vec3::new(2.0, 0.0, 0.0),
            None,
        )
    }

    fn player() -> Player {
        Player::new(&PlayerConfig {
            max_health: 50.0,
            ..PlayerConfig::default()
        })
    }

    fn overkill_dies_once(target: &mut dyn Damageable) {
        let hit = DamageEvent::new(60.0, Vec3::new(-1.0, 5.0, 0.0), 0.0);
        assert!(matches!(
            target.take_damage(&hit),
            HitOutcome::Killed { dealt, .. } if dealt == 50.0
        ));
        assert_eq!(target.current_health(), 0.0);
        assert!(!target.is_alive());
        assert_eq!(target.take_damage(&hit), HitOutcome::Rejected);
    }

    #[test]
    fn player_and_enemy_share_damage_rules() {
        overkill_dies_once(&mut player());
        overkill_dies_once(&mut enemy());
    }

    #[test]
    fn knockback_pushes_horizontally() {
        let mut enemy = enemy();
        let hit = DamageEvent::new(1.0, Vec3::new(0.0, 3.0, 0.0), 4.0);
        let _ = enemy.take_damage(&hit);
        enemy.advance(Duration::from_millis(100));

        assert!(enemy.position.x > 2.0);
        assert_eq!(enemy.position.y, 0.0);
    }

    #[test]
    fn power_up_scales_the_instance() {
        let mut enemy = enemy();
        enemy.apply_power_up(1.5);
        assert_eq!(enemy.max_health(), 75.0);
        assert_eq!(enemy.current_health(), 75.0);
        assert_eq!(enemy.stats.move_speed, 4.5);

        enemy.apply_power_up(f32::NAN);
        assert_eq!(enemy.max_health(), 75.0);
    }

    #[test]
    fn player_steering_is_capped() {
        let mut player = player();
        player.steer(Vec3::new(30.0, 9.0, 40.0));
        assert!((player.velocity.length() - player.move_speed).abs() < 1e-4);
        assert_eq!(player.velocity.y, 0.0);
    }
}
