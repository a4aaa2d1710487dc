use std::time::Duration;

use glam::Vec3;
use horde_core::{
    DamageEvent, EnemyStats, MovementPattern, Navigation, DETONATION_KNOCKBACK, DETONATION_RADIUS,
    ENEMY_STRIKE_KNOCKBACK,
};

/// Time a staggered enemy spends reeling before it resumes the chase.
pub const STAGGER_DURATION: Duration = Duration::from_millis(300);

/// Chase gives up once the target is this many detection ranges away.
const CHASE_RELEASE_FACTOR: f32 = 1.5;
/// Attack resumes the chase once the target is this many attack ranges away.
const ATTACK_RELEASE_FACTOR: f32 = 1.2;
const SUICIDE_SPEED_FACTOR: f32 = 1.5;
const SHOOTER_STANDOFF_FACTOR: f32 = 1.5;
const ZIGZAG_FREQUENCY: f32 = 3.0;
const ZIGZAG_AMPLITUDE: f32 = 2.0;
const TURN_RATE: f32 = 5.0;
const DETONATION_DAMAGE_FACTOR: f32 = 2.0;

/// Behavioural state of a single enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EnemyState {
    /// Waiting for a target to come within detection range.
    Idle,
    /// Travelling toward the target using the archetype's movement pattern.
    Chase,
    /// Standing still, facing the target and striking whenever the cooldown allows.
    Attack,
    /// Briefly reeling from a knockback hit.
    Stagger,
    /// Absorbing terminal state.
    Dead,
}

/// What an enemy knows about the encounter on a given tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Perception {
    /// Simulated time since the encounter began.
    pub now: Duration,
    /// Enemy's current position.
    pub position: Vec3,
    /// Enemy's current health.
    pub health: f32,
    /// Position of the tracked target, if any.
    pub target: Option<Vec3>,
}

/// Intent produced by a brain that the host routes to the world.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BrainAction {
    /// Hit the tracked target.
    Strike(DamageEvent),
    /// Explode, damaging everything nearby and dying.
    Detonate {
        /// Blast radius.
        radius: f32,
        /// Damage dealt to every entity in the blast.
        damage: f32,
        /// Knockback applied to every entity in the blast.
        knockback: f32,
    },
    /// Turn to face the provided direction.
    Face(Vec3),
}

/// Finite state machine driving one enemy.
#[derive(Clone, Debug, PartialEq)]
pub struct EnemyBrain {
    stats: EnemyStats,
    state: EnemyState,
    in_state: Duration,
    last_attack: Option<Duration>,
    facing: Vec3,
    waiting: bool,
}

impl EnemyBrain {
    /// Creates an idle brain for an enemy with the provided runtime stats.
    #[must_use]
    pub fn new(stats: EnemyStats) -> Self {
        Self {
            stats,
            state: EnemyState::Idle,
            in_state: Duration::ZERO,
            last_attack: None,
            facing: Vec3::Z,
            waiting: false,
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> EnemyState {
        self.state
    }

    /// Runtime stats the brain decides with.
    #[must_use]
    pub const fn stats(&self) -> &EnemyStats {
        &self.stats
    }

    /// Time spent in the current state.
    #[must_use]
    pub const fn time_in_state(&self) -> Duration {
        self.in_state
    }

    /// Speed used while chasing.
    #[must_use]
    pub fn chase_speed(&self) -> f32 {
        match self.stats.pattern {
            MovementPattern::Suicide => self.stats.move_speed * SUICIDE_SPEED_FACTOR,
            _ => self.stats.move_speed,
        }
    }

    /// Interrupts any alive state with a stagger.
    ///
    /// Returns `false` when the brain is dead or already staggering.
    pub fn stagger(&mut self, nav: &mut dyn Navigation) -> bool {
        match self.state {
            EnemyState::Dead | EnemyState::Stagger => false,
            _ => {
                self.enter(EnemyState::Stagger, nav);
                true
            }
        }
    }

    /// Advances the state machine by one tick.
    pub fn update(
        &mut self,
        dt: Duration,
        perception: &Perception,
        nav: &mut dyn Navigation,
        actions: &mut Vec<BrainAction>,
    ) {
        if self.state == EnemyState::Dead {
            return;
        }
        if perception.health <= 0.0 {
            self.enter(EnemyState::Dead, nav);
            return;
        }

        self.in_state = self.in_state.saturating_add(dt);

        if self.state == EnemyState::Stagger {
            if self.in_state >= STAGGER_DURATION {
                self.enter(EnemyState::Chase, nav);
            }
            return;
        }

        let Some(target) = perception.target else {
            if self.state == EnemyState::Chase && !self.waiting {
                nav.set_stopped(true);
            }
            self.waiting = true;
            return;
        };
        if std::mem::take(&mut self.waiting) && self.state == EnemyState::Chase {
            nav.set_stopped(false);
        }

        let distance = perception.position.distance(target);
        match self.state {
            EnemyState::Idle => {
                if distance <= self.stats.detection_range {
                    self.enter(EnemyState::Chase, nav);
                }
            }
            EnemyState::Chase => {
                if distance > self.stats.detection_range * CHASE_RELEASE_FACTOR {
                    self.enter(EnemyState::Idle, nav);
                } else if distance <= self.stats.attack_range {
                    self.enter(EnemyState::Attack, nav);
                } else {
                    nav.set_destination(self.chase_destination(perception, target));
                }
            }
            EnemyState::Attack => {
                if distance > self.stats.attack_range * ATTACK_RELEASE_FACTOR {
                    self.enter(EnemyState::Chase, nav);
                    return;
                }
                self.reorient(dt, perception.position, target, actions);
                if self.attack_ready(perception.now) {
                    self.last_attack = Some(perception.now);
                    self.attack(perception.position, nav, actions);
                }
            }
            EnemyState::Stagger | EnemyState::Dead => {}
        }
    }

    fn enter(&mut self, state: EnemyState, nav: &mut dyn Navigation) {
        log::trace!("enemy brain {:?} -> {state:?}", self.state);
        self.state = state;
        self.in_state = Duration::ZERO;
        match state {
            EnemyState::Chase => {
                nav.set_speed(self.chase_speed());
                nav.set_stopped(false);
            }
            EnemyState::Idle | EnemyState::Attack | EnemyState::Stagger | EnemyState::Dead => {
                nav.set_stopped(true);
            }
        }
    }

    fn attack_ready(&self, now: Duration) -> bool {
        self.last_attack
            .map_or(true, |last| now >= last.saturating_add(self.stats.attack_cooldown))
    }

    fn attack(&mut self, position: Vec3, nav: &mut dyn Navigation, actions: &mut Vec<BrainAction>) {
        actions.push(BrainAction::Strike(DamageEvent::new(
            self.stats.attack_damage,
            position,
            ENEMY_STRIKE_KNOCKBACK,
        )));

        if self.stats.pattern == MovementPattern::Suicide {
            actions.push(BrainAction::Detonate {
                radius: DETONATION_RADIUS,
                damage: self.stats.attack_damage * DETONATION_DAMAGE_FACTOR,
                knockback: DETONATION_KNOCKBACK,
            });
            self.enter(EnemyState::Dead, nav);
        }
    }

    fn reorient(
        &mut self,
        dt: Duration,
        position: Vec3,
        target: Vec3,
        actions: &mut Vec<BrainAction>,
    ) {
        let mut toward = target - position;
        toward.y = 0.0;
        let toward = toward.normalize_or_zero();
        if toward == Vec3::ZERO {
            return;
        }

        let blend = (TURN_RATE * dt.as_secs_f32()).min(1.0);
        let turned = self.facing.lerp(toward, blend).normalize_or_zero();
        self.facing = if turned == Vec3::ZERO { toward } else { turned };
        actions.push(BrainAction::Face(self.facing));
    }

    fn chase_destination(&self, perception: &Perception, target: Vec3) -> Vec3 {
        match self.stats.pattern {
            MovementPattern::Rusher | MovementPattern::Suicide => target,
            MovementPattern::ZigZag => {
                let phase = perception.now.as_secs_f32() * ZIGZAG_FREQUENCY;
                target
                    + Vec3::new(
                        phase.sin() * ZIGZAG_AMPLITUDE,
                        0.0,
                        phase.cos() * ZIGZAG_AMPLITUDE,
                    )
            }
            MovementPattern::Shooter => {
                let mut away = perception.position - target;
                away.y = 0.0;
                target
                    + away.normalize_or_zero() * self.stats.attack_range * SHOOTER_STANDOFF_FACTOR
            }
        }
    }
}
