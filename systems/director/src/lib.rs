#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Adaptive difficulty derived from a rolling window of player metrics.
//!
//! The host records one player sample per tick and then ticks the
//! [`Director`]. Each tick prunes samples that fell out of the window, derives
//! a target difficulty from the mean health fraction and the survival rate,
//! and eases the current difficulty toward that target. Every gameplay
//! multiplier is a pure curve evaluation of the current difficulty.

use std::{collections::VecDeque, time::Duration};

use horde_core::{CurveId, DifficultyCurves, DifficultySource, DirectorConfig};

const HEALTHY_THRESHOLD: f32 = 0.7;
const STRUGGLING_THRESHOLD: f32 = 0.3;
const HEALTH_DELTA: f32 = 0.2;
const SURVIVING_THRESHOLD: f32 = 0.8;
const DYING_THRESHOLD: f32 = 0.5;
const SURVIVAL_DELTA: f32 = 0.1;

/// Player metric captured at a point in simulated time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sample {
    /// Health as a fraction of the maximum, in `[0, 1]`.
    pub health_fraction: f32,
    /// Whether the player was alive.
    pub alive: bool,
    /// Simulated time the sample was taken at.
    pub timestamp: Duration,
}

/// Difficulty Director.
#[derive(Debug)]
pub struct Director {
    base: f32,
    min: f32,
    max: f32,
    adjustment_speed: f32,
    window: Duration,
    curves: DifficultyCurves,
    current: f32,
    target: f32,
    samples: VecDeque<Sample>,
}

impl Director {
    /// Creates a director resting at its baseline difficulty.
    #[must_use]
    pub fn new(config: DirectorConfig) -> Self {
        let window = config.window();
        let min = config.min_difficulty.min(config.max_difficulty);
        let max = config.max_difficulty.max(config.min_difficulty);
        let base = config.base_difficulty.clamp(min, max);
        Self {
            base,
            min,
            max,
            adjustment_speed: config.adjustment_speed.max(0.0),
            window,
            curves: config.curves,
            current: base,
            target: base,
            samples: VecDeque::new(),
        }
    }

    /// Records a player sample.
    ///
    /// Samples must arrive in timestamp order; a sample older than the newest
    /// one already held is discarded.
    pub fn record_sample(&mut self, health_fraction: f32, is_alive: bool, timestamp: Duration) {
        if let Some(last) = self.samples.back() {
            if timestamp < last.timestamp {
                log::warn!(
                    "discarding out-of-order sample at {timestamp:?} (newest is {:?})",
                    last.timestamp
                );
                return;
            }
        }

        let health_fraction = if health_fraction.is_finite() {
            health_fraction.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.samples.push_back(Sample {
            health_fraction,
            alive: is_alive,
            timestamp,
        });
    }

    /// Prunes expired samples and eases the current difficulty toward the target.
    ///
    /// Does nothing when the window holds no samples.
    pub fn tick(&mut self, dt: Duration, now: Duration) {
        if let Some(horizon) = now.checked_sub(self.window) {
            while self
                .samples
                .front()
                .is_some_and(|sample| sample.timestamp < horizon)
            {
                let _ = self.samples.pop_front();
            }
        }

        if self.samples.is_empty() {
            return;
        }

        let count = self.samples.len() as f32;
        let avg_health = self
            .samples
            .iter()
            .map(|sample| sample.health_fraction)
            .sum::<f32>()
            / count;
        let survival_rate =
            self.samples.iter().filter(|sample| sample.alive).count() as f32 / count;

        let mut target = self.base;
        if avg_health > HEALTHY_THRESHOLD {
            target += HEALTH_DELTA;
        } else if avg_health < STRUGGLING_THRESHOLD {
            target -= HEALTH_DELTA;
        }
        if survival_rate > SURVIVING_THRESHOLD {
            target += SURVIVAL_DELTA;
        } else if survival_rate < DYING_THRESHOLD {
            target -= SURVIVAL_DELTA;
        }
        self.target = target.clamp(self.min, self.max);

        let gain = (self.adjustment_speed * dt.as_secs_f32()).min(1.0);
        self.current = (self.current + (self.target - self.current) * gain).clamp(self.min, self.max);

        log::trace!(
            "difficulty {:.3} -> target {:.3} (health {avg_health:.2}, survival {survival_rate:.2})",
            self.current,
            self.target
        );
    }

    /// Current difficulty.
    #[must_use]
    pub const fn current_difficulty(&self) -> f32 {
        self.current
    }

    /// Target the current difficulty is easing toward.
    #[must_use]
    pub const fn target_difficulty(&self) -> f32 {
        self.target
    }

    /// Samples currently inside the window.
    #[must_use]
    pub fn samples(&self) -> impl ExactSizeIterator<Item = &Sample> {
        self.samples.iter()
    }

    /// Evaluates the named curve at the current difficulty.
    #[must_use]
    pub fn multiplier(&self, curve: CurveId) -> f32 {
        self.curves.get(curve).evaluate(self.current)
    }

    /// Overrides the current difficulty, bypassing smoothing.
    pub fn set_difficulty(&mut self, difficulty: f32) {
        if !difficulty.is_finite() {
            log::warn!("ignoring non-finite difficulty override");
            return;
        }
        self.current = difficulty.clamp(self.min, self.max);
        log::debug!("difficulty set to {:.3}", self.current);
    }

    /// Clears every sample and returns to the baseline.
    pub fn reset(&mut self) {
        self.samples.clear();
        self.current = self.base;
        self.target = self.base;
    }
}

impl DifficultySource for Director {
    fn multiplier(&self, curve: CurveId) -> f32 {
        Director::multiplier(self, curve)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn struggling_player_lowers_target() {
        let mut director = Director::new(DirectorConfig::default());
        director.record_sample(0.1, false, Duration::ZERO);
        director.tick(Duration::from_millis(100), Duration::from_millis(100));

        assert!((director.target_difficulty() - 0.2).abs() < 1e-6);
        assert!(director.current_difficulty() < 0.5);
    }

    #[test]
    fn middling_metrics_keep_baseline_target() {
        let mut director = Director::new(DirectorConfig::default());
        director.record_sample(0.5, true, Duration::ZERO);
        director.record_sample(0.5, false, Duration::from_secs(1));
        director.tick(Duration::from_secs(1), Duration::from_secs(1));

        assert_eq!(director.target_difficulty(), 0.5);
        assert_eq!(director.current_difficulty(), 0.5);
    }

    #[test]
    fn out_of_order_samples_are_dropped() {
        let mut director = Director::new(DirectorConfig::default());
        director.record_sample(1.0, true, Duration::from_secs(5));
        director.record_sample(1.0, true, Duration::from_secs(4));
        assert_eq!(director.samples().len(), 1);
    }

    #[test]
    fn reset_restores_baseline() {
        let mut director = Director::new(DirectorConfig::default());
        director.record_sample(1.0, true, Duration::ZERO);
        director.set_difficulty(0.9);
        director.reset();

        assert_eq!(director.current_difficulty(), 0.5);
        assert_eq!(director.samples().len(), 0);
    }
}
