//! Kinematic steering agent owned by every enemy.

use std::time::Duration;

use glam::Vec3;
use horde_core::Navigation;

/// Fraction of the attack range at which an agent stops short of its destination.
pub(crate) const STOPPING_FACTOR: f32 = 0.8;

/// Moves an enemy across the horizontal plane toward its destination.
///
/// Agents start stopped and only travel once a brain resumes them.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct NavAgent {
    destination: Option<Vec3>,
    speed: f32,
    stopped: bool,
    stopping_distance: f32,
}

impl NavAgent {
    pub(crate) fn new(speed: f32, stopping_distance: f32) -> Self {
        Self {
            destination: None,
            speed,
            stopped: true,
            stopping_distance,
        }
    }

    /// Displacement the agent wants to cover this tick from `position`.
    pub(crate) fn step(&self, position: Vec3, dt: Duration) -> Vec3 {
        if self.stopped {
            return Vec3::ZERO;
        }
        let Some(destination) = self.destination else {
            return Vec3::ZERO;
        };

        let mut offset = destination - position;
        offset.y = 0.0;
        let distance = offset.length();
        let remaining = distance - self.stopping_distance;
        if remaining <= 0.0 {
            return Vec3::ZERO;
        }

        let travel = (self.speed * dt.as_secs_f32()).min(remaining);
        offset / distance * travel
    }
}

impl Navigation for NavAgent {
    fn set_destination(&mut self, destination: Vec3) {
        self.destination = Some(destination);
    }

    fn set_speed(&mut self, speed: f32) {
        self.speed = speed.max(0.0);
    }

    fn set_stopped(&mut self, stopped: bool) {
        self.stopped = stopped;
    }
}
