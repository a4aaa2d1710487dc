//! Loose pickups and in-flight projectiles.

use std::time::Duration;

use glam::Vec3;
use horde_core::{DamageEvent, LootKind, PoolHandle};

/// Distance at which a projectile connects with an enemy.
pub(crate) const PROJECTILE_HIT_RADIUS: f32 = 0.5;

#[derive(Debug)]
pub(crate) struct Pickup {
    pub(crate) kind: LootKind,
    pub(crate) position: Vec3,
    pub(crate) handle: Option<PoolHandle>,
}

impl Pickup {
    /// Drifts toward `player` when within `attraction_range`.
    pub(crate) fn attract(&mut self, player: Vec3, range: f32, speed: f32, dt: Duration) {
        let mut offset = player - self.position;
        offset.y = 0.0;
        let distance = offset.length();
        if distance > range || distance <= f32::EPSILON {
            return;
        }
        let travel = (speed * dt.as_secs_f32()).min(distance);
        self.position += offset / distance * travel;
    }
}

#[derive(Debug)]
pub(crate) struct Projectile {
    pub(crate) position: Vec3,
    pub(crate) direction: Vec3,
    pub(crate) speed: f32,
    pub(crate) remaining: f32,
    pub(crate) damage: DamageEvent,
    pub(crate) handle: Option<PoolHandle>,
}

impl Projectile {
    /// Moves the projectile and reports whether it still has range left.
    pub(crate) fn advance(&mut self, dt: Duration) -> bool {
        let travel = (self.speed * dt.as_secs_f32()).min(self.remaining);
        self.position += self.direction * travel;
        self.remaining -= travel;
        self.remaining > 0.0
    }
}

/// Fraction of the segment `start..end` at which it first comes within
/// `radius` of `point`, or `None` when it never does.
pub(crate) fn sweep_entry(start: Vec3, end: Vec3, point: Vec3, radius: f32) -> Option<f32> {
    let segment = end - start;
    let to_point = point - start;
    let length = segment.length();
    if length <= f32::EPSILON {
        return (to_point.length() <= radius).then_some(0.0);
    }

    let along = to_point.dot(segment) / length;
    let closest = start + segment * (along / length).clamp(0.0, 1.0);
    if closest.distance(point) > radius {
        return None;
    }
    let perpendicular = (to_point.length_squared() - along * along).max(0.0);
    let half_chord = (radius * radius - perpendicular).max(0.0).sqrt();
    Some(((along - half_chord) / length).clamp(0.0, 1.0))
}
