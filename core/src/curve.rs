use serde::{Deserialize, Serialize};

use crate::CurveId;

/// Control point of a [`Curve`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    /// Normalised difficulty in `[0, 1]`.
    pub x: f32,
    /// Multiplier produced at `x`.
    pub y: f32,
}

/// Piecewise-linear mapping from a difficulty scalar to a gameplay multiplier.
///
/// Control points are ordered by `x`. Inputs outside the first and last point
/// clamp to the nearest endpoint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Curve {
    points: Vec<CurvePoint>,
}

impl Curve {
    /// Creates a curve from control points, sorting them by `x`.
    #[must_use]
    pub fn new(mut points: Vec<CurvePoint>) -> Self {
        points.sort_by(|a, b| a.x.total_cmp(&b.x));
        Self { points }
    }

    /// Creates a straight line from `start` at `x = 0` to `end` at `x = 1`.
    #[must_use]
    pub fn linear(start: f32, end: f32) -> Self {
        Self {
            points: vec![CurvePoint { x: 0.0, y: start }, CurvePoint { x: 1.0, y: end }],
        }
    }

    /// Control points in ascending `x` order.
    #[must_use]
    pub fn points(&self) -> &[CurvePoint] {
        &self.points
    }

    /// Evaluates the curve by linear interpolation between neighbouring points.
    ///
    /// An empty curve evaluates to `1.0`, the neutral multiplier.
    #[must_use]
    pub fn evaluate(&self, x: f32) -> f32 {
        let (first, last) = match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return 1.0,
        };

        if x <= first.x {
            return first.y;
        }
        if x >= last.x {
            return last.y;
        }

        for pair in self.points.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if x <= b.x {
                let span = b.x - a.x;
                if span <= f32::EPSILON {
                    return b.y;
                }
                let t = (x - a.x) / span;
                return a.y + (b.y - a.y) * t;
            }
        }

        last.y
    }

    pub(crate) fn is_ordered(&self) -> bool {
        self.points.windows(2).all(|pair| pair[0].x <= pair[1].x)
    }
}

/// Curve set evaluated by the Difficulty Director.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DifficultyCurves {
    /// Enemy count multiplier.
    pub enemy_count: Curve,
    /// Enemy health multiplier.
    pub enemy_health: Curve,
    /// Enemy speed multiplier.
    pub enemy_speed: Curve,
    /// Spawn interval multiplier.
    pub spawn_interval: Curve,
    /// Heal drop probability.
    pub heal_drop_chance: Curve,
}

impl DifficultyCurves {
    /// Borrows the curve named by `id`.
    #[must_use]
    pub fn get(&self, id: CurveId) -> &Curve {
        match id {
            CurveId::EnemyCount => &self.enemy_count,
            CurveId::EnemyHealth => &self.enemy_health,
            CurveId::EnemySpeed => &self.enemy_speed,
            CurveId::SpawnInterval => &self.spawn_interval,
            CurveId::HealDropChance => &self.heal_drop_chance,
        }
    }
}

impl Default for DifficultyCurves {
    fn default() -> Self {
        Self {
            enemy_count: Curve::linear(0.5, 2.0),
            enemy_health: Curve::linear(0.5, 2.0),
            enemy_speed: Curve::linear(0.8, 1.5),
            spawn_interval: Curve::linear(1.5, 0.5),
            heal_drop_chance: Curve::linear(0.3, 0.1),
        }
    }
}
