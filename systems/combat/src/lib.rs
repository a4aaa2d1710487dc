#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Damage resolution shared by the player and every enemy.
//!
//! [`Vitals`] owns the health pool, the post-hit invincibility window and the
//! death latch. Entities embed it and forward the
//! [`Damageable`](horde_core::Damageable) capability to [`Vitals::take`], so
//! the rejection rules, the health clamp, the horizontal knockback impulse and
//! the exactly-once death report are identical for every receiver.

use std::time::Duration;

use glam::Vec3;
use horde_core::{DamageEvent, Entity, HitOutcome};

/// Exponential damping rate applied to knockback impulses, per second.
pub const KNOCKBACK_DAMPING: f32 = 8.0;

const IMPULSE_REST_SPEED: f32 = 0.01;

/// Health pool with an invincibility window and a one-shot death latch.
#[derive(Clone, Debug, PartialEq)]
pub struct Vitals {
    health: f32,
    max_health: f32,
    invincibility: Duration,
    invincible_for: Duration,
    dead: bool,
}

impl Vitals {
    /// Creates a full-health pool.
    ///
    /// Every accepted hit opens an invincibility window of `invincibility`;
    /// a zero window never blocks hits.
    #[must_use]
    pub fn new(max_health: f32, invincibility: Duration) -> Self {
        let max_health = max_health.max(0.0);
        Self {
            health: max_health,
            max_health,
            invincibility,
            invincible_for: Duration::ZERO,
            dead: max_health <= 0.0,
        }
    }

    /// Current health.
    #[must_use]
    pub const fn health(&self) -> f32 {
        self.health
    }

    /// Maximum health.
    #[must_use]
    pub const fn max_health(&self) -> f32 {
        self.max_health
    }

    /// Whether the death latch is still open.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        !self.dead
    }

    /// Whether a hit would currently be rejected by the invincibility window.
    #[must_use]
    pub fn is_invincible(&self) -> bool {
        !self.invincible_for.is_zero()
    }

    /// Counts down the invincibility window.
    pub fn advance(&mut self, dt: Duration) {
        self.invincible_for = self.invincible_for.saturating_sub(dt);
    }

    /// Restores health up to the maximum and returns the amount restored.
    ///
    /// Dead pools cannot be healed.
    pub fn heal(&mut self, amount: f32) -> f32 {
        if self.dead || amount <= 0.0 {
            return 0.0;
        }
        let before = self.health;
        self.health = (self.health + amount).min(self.max_health);
        self.health - before
    }

    /// Raises the maximum without touching current health.
    pub fn raise_max(&mut self, amount: f32) {
        if amount > 0.0 {
            self.max_health += amount;
        }
    }

    /// Scales current and maximum health together.
    pub fn scale(&mut self, multiplier: f32) {
        if self.dead || !multiplier.is_finite() || multiplier <= 0.0 {
            return;
        }
        self.health *= multiplier;
        self.max_health *= multiplier;
    }

    /// Closes the death latch regardless of remaining health.
    ///
    /// Returns `true` only for the call that actually killed the pool.
    pub fn kill(&mut self) -> bool {
        if self.dead {
            return false;
        }
        self.health = 0.0;
        self.dead = true;
        true
    }

    /// Applies a hit received at `position`.
    pub fn take(&mut self, damage: &DamageEvent, position: Vec3) -> HitOutcome {
        if self.dead || self.is_invincible() {
            return HitOutcome::Rejected;
        }

        let amount = damage.amount.max(0.0);
        let dealt = amount.min(self.health);
        self.health = (self.health - amount).max(0.0);
        self.invincible_for = self.invincibility;

        let impulse = knockback_impulse(damage.source, position, damage.knockback);
        if self.health <= 0.0 {
            self.dead = true;
            HitOutcome::Killed { dealt, impulse }
        } else {
            HitOutcome::Wounded {
                dealt,
                remaining: self.health,
                impulse,
            }
        }
    }
}

/// Impulse pushing `target` away from `source` on the horizontal plane.
///
/// The vertical component is always zero. Coincident positions yield no
/// direction and therefore no impulse.
#[must_use]
pub fn knockback_impulse(source: Vec3, target: Vec3, magnitude: f32) -> Vec3 {
    if magnitude == 0.0 || !magnitude.is_finite() {
        return Vec3::ZERO;
    }
    let mut away = target - source;
    away.y = 0.0;
    away.normalize_or_zero() * magnitude
}

/// Damps a knockback impulse over `dt`, snapping small residues to rest.
#[must_use]
pub fn decay_impulse(impulse: Vec3, dt: Duration) -> Vec3 {
    let decayed = impulse * (-KNOCKBACK_DAMPING * dt.as_secs_f32()).exp();
    if decayed.length_squared() < IMPULSE_REST_SPEED * IMPULSE_REST_SPEED {
        Vec3::ZERO
    } else {
        decayed
    }
}

/// Entities caught in a blast of `radius` around `center`, excluding `source`.
#[must_use]
pub fn blast_targets(
    center: Vec3,
    radius: f32,
    source: Entity,
    candidates: impl IntoIterator<Item = (Entity, Vec3)>,
) -> Vec<Entity> {
    candidates
        .into_iter()
        .filter(|(entity, position)| *entity != source && center.distance(*position) <= radius)
        .map(|(entity, _)| entity)
        .collect()
}

#[cfg(test)]
mod tests {
    use horde_core::EnemyId;

    use super::*;

    fn hit(amount: f32, knockback: f32) -> DamageEvent {
        DamageEvent::new(amount, Vec3::ZERO, knockback)
    }

    #[test]
    fn overkill_clamps_to_zero_and_kills_once() {
        let mut vitals = Vitals::new(50.0, Duration::ZERO);

        let first = vitals.take(&hit(60.0, 0.0), Vec3::X);
        assert_eq!(
            first,
            HitOutcome::Killed {
                dealt: 50.0,
                impulse: Vec3::ZERO
            }
        );
        assert_eq!(vitals.health(), 0.0);

        let second = vitals.take(&hit(60.0, 0.0), Vec3::X);
        assert_eq!(second, HitOutcome::Rejected);
        assert!(!vitals.kill(), "latch already closed");
    }

    #[test]
    fn invincibility_window_rejects_until_expired() {
        let mut vitals = Vitals::new(100.0, Duration::from_millis(500));

        assert!(matches!(
            vitals.take(&hit(10.0, 0.0), Vec3::X),
            HitOutcome::Wounded { remaining, .. } if remaining == 90.0
        ));
        assert_eq!(vitals.take(&hit(10.0, 0.0), Vec3::X), HitOutcome::Rejected);

        vitals.advance(Duration::from_millis(499));
        assert!(vitals.is_invincible());
        vitals.advance(Duration::from_millis(1));
        assert!(!vitals.is_invincible());

        assert!(matches!(
            vitals.take(&hit(10.0, 0.0), Vec3::X),
            HitOutcome::Wounded { remaining, .. } if remaining == 80.0
        ));
    }

    #[test]
    fn knockback_ignores_vertical_offset() {
        let impulse = knockback_impulse(Vec3::new(0.0, 5.0, 0.0), Vec3::new(3.0, 0.0, 4.0), 5.0);
        assert_eq!(impulse.y, 0.0);
        assert!((impulse.length() - 5.0).abs() < 1e-5);
        assert!((impulse.x - 3.0).abs() < 1e-5);
    }

    #[test]
    fn heal_clamps_to_maximum_and_skips_the_dead() {
        let mut vitals = Vitals::new(100.0, Duration::ZERO);
        let _ = vitals.take(&hit(30.0, 0.0), Vec3::X);
        assert_eq!(vitals.heal(50.0), 30.0);
        assert_eq!(vitals.health(), 100.0);

        assert!(vitals.kill());
        assert_eq!(vitals.heal(10.0), 0.0);
    }

    #[test]
    fn scale_multiplies_current_and_maximum() {
        let mut vitals = Vitals::new(50.0, Duration::ZERO);
        vitals.scale(1.5);
        assert_eq!(vitals.health(), 75.0);
        assert_eq!(vitals.max_health(), 75.0);
    }

    #[test]
    fn impulses_decay_to_rest() {
        let mut impulse = Vec3::new(5.0, 0.0, 0.0);
        for _ in 0..120 {
            impulse = decay_impulse(impulse, Duration::from_millis(16));
        }
        assert_eq!(impulse, Vec3::ZERO);
    }

    #[test]
    fn blast_excludes_its_source() {
        let bomber = Entity::Enemy(EnemyId::new(1));
        let targets = blast_targets(
            Vec3::ZERO,
            3.0,
            bomber,
            [
                (bomber, Vec3::ZERO),
                (Entity::Player, Vec3::new(2.0, 0.0, 0.0)),
                (Entity::Enemy(EnemyId::new(2)), Vec3::new(3.5, 0.0, 0.0)),
            ],
        );
        assert_eq!(targets, vec![Entity::Player]);
    }
}
