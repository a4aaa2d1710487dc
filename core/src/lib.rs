#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the horde encounter simulator.
//!
//! This crate defines the message surface that connects the host shell, the
//! authoritative world, and pure systems. Hosts submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to synchronously and in emission order. Systems consume event
//! streams, read immutable snapshots, and respond exclusively with new command
//! batches (or, for the notifications they own, new events).

mod bus;
mod config;
mod curve;

use std::{fmt, time::Duration};

use glam::Vec3;
use serde::{Deserialize, Serialize};

pub use bus::{EventBus, Observer};
pub use config::{
    ConfigError, DirectorConfig, EncounterConfig, EnemyArchetype, KindPools, LootEntry, LootTable,
    PerkDef, PickupConfig, PlayerConfig, PoolEntry, ProgressionConfig, RarityWeights, SpawnGroup,
    WaveDefinition, WaveSchedule, WeaponConfig, WeaponKind,
};
pub use curve::{Curve, CurvePoint, DifficultyCurves};

/// Knockback magnitude applied by an enemy's regular strike.
pub const ENEMY_STRIKE_KNOCKBACK: f32 = 3.0;
/// Knockback magnitude applied by a suicide detonation.
pub const DETONATION_KNOCKBACK: f32 = 5.0;
/// Radius of the area covered by a suicide detonation.
pub const DETONATION_RADIUS: f32 = 3.0;

/// Converts an authored number of seconds into a [`Duration`], saturating
/// negative and non-finite values to zero.
#[must_use]
pub fn duration_from_secs(seconds: f32) -> Duration {
    if !seconds.is_finite() {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f32(seconds.max(0.0)).unwrap_or(Duration::ZERO)
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier from the provided name.
            #[must_use]
            pub fn new(name: impl Into<String>) -> Self {
                Self(name.into())
            }

            /// Borrows the identifier's textual name.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Names an immutable enemy archetype within the configuration.
    ArchetypeId
);
string_id!(
    /// Names a loot table within the configuration.
    LootTableId
);
string_id!(
    /// Names a perk definition within the configuration.
    PerkId
);
string_id!(
    /// Names a free list managed by the object pool.
    PoolKey
);

/// Unique identifier assigned to each enemy instance by the world.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct EnemyId(u32);

impl EnemyId {
    /// Creates a new enemy identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Anything in the encounter that can receive damage.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Entity {
    /// The single player character.
    Player,
    /// An enemy instance.
    Enemy(EnemyId),
}

/// Handle to an object checked out of the shared pool.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PoolHandle {
    key: PoolKey,
    slot: u32,
}

impl PoolHandle {
    /// Creates a handle for the provided free list and slot.
    #[must_use]
    pub const fn new(key: PoolKey, slot: u32) -> Self {
        Self { key, slot }
    }

    /// Free list that owns the handle.
    #[must_use]
    pub fn key(&self) -> &PoolKey {
        &self.key
    }

    /// Slot index within the free list.
    #[must_use]
    pub const fn slot(&self) -> u32 {
        self.slot
    }
}

/// Shared pooled-object allocator.
///
/// `acquire` transfers ownership of a handle to the caller and `release`
/// hands it back. A released handle must not be reused by the caller.
pub trait ObjectPool {
    /// Checks out a handle from the free list named by `key`.
    ///
    /// Returns `None` when no free list with that key is configured.
    fn acquire(&mut self, key: &PoolKey) -> Option<PoolHandle>;

    /// Returns a handle to its free list.
    fn release(&mut self, handle: PoolHandle);
}

/// Opaque steering capability used by enemy brains.
pub trait Navigation {
    /// Sets the world position the agent should travel toward.
    fn set_destination(&mut self, destination: Vec3);
    /// Sets the agent's travel speed in world units per second.
    fn set_speed(&mut self, speed: f32);
    /// Halts or resumes the agent's travel.
    fn set_stopped(&mut self, stopped: bool);
}

/// A single application of damage.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DamageEvent {
    /// Health removed from the receiver before clamping.
    pub amount: f32,
    /// World position the damage originated from.
    pub source: Vec3,
    /// Whether the hit rolled a critical.
    pub critical: bool,
    /// Magnitude of the horizontal impulse pushing the receiver away from `source`.
    pub knockback: f32,
}

impl DamageEvent {
    /// Creates a non-critical damage event.
    #[must_use]
    pub const fn new(amount: f32, source: Vec3, knockback: f32) -> Self {
        Self {
            amount,
            source,
            critical: false,
            knockback,
        }
    }

    /// Marks the event as critical.
    #[must_use]
    pub const fn with_critical(mut self, critical: bool) -> Self {
        self.critical = critical;
        self
    }
}

/// Result of offering a [`DamageEvent`] to a [`Damageable`] receiver.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum HitOutcome {
    /// The receiver was already dead or currently invincible.
    Rejected,
    /// The receiver lost health but survived.
    Wounded {
        /// Health removed by the hit after clamping.
        dealt: f32,
        /// Health remaining after the hit.
        remaining: f32,
        /// Horizontal knockback impulse applied to the receiver.
        impulse: Vec3,
    },
    /// The hit reduced the receiver's health to zero. Reported exactly once.
    Killed {
        /// Health removed by the hit after clamping.
        dealt: f32,
        /// Horizontal knockback impulse applied to the receiver.
        impulse: Vec3,
    },
}

/// Capability shared by every entity that can receive damage.
pub trait Damageable {
    /// Applies the damage event and reports what happened.
    fn take_damage(&mut self, damage: &DamageEvent) -> HitOutcome;
    /// Whether the entity is still alive.
    fn is_alive(&self) -> bool;
    /// Current health.
    fn current_health(&self) -> f32;
    /// Maximum health.
    fn max_health(&self) -> f32;
}

/// Movement policy applied while an enemy chases its target.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementPattern {
    /// Heads straight for the target.
    #[default]
    Rusher,
    /// Weaves toward the target along a sinusoidal offset.
    ZigZag,
    /// Keeps a standoff distance on the far side from the target.
    Shooter,
    /// Charges the target faster and detonates on attack.
    Suicide,
}

/// Runtime stat block owned by a single enemy instance.
///
/// Spawning clones these from the archetype, so scaling one instance never
/// touches the shared definition.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnemyStats {
    /// Health the enemy spawns with.
    pub max_health: f32,
    /// Base travel speed in world units per second.
    pub move_speed: f32,
    /// Damage dealt by a single strike.
    pub attack_damage: f32,
    /// Distance at which the enemy can strike.
    pub attack_range: f32,
    /// Distance at which the enemy notices its target.
    pub detection_range: f32,
    /// Minimum time between strikes.
    pub attack_cooldown: Duration,
    /// Movement policy used while chasing.
    pub pattern: MovementPattern,
}

impl EnemyStats {
    /// Scales health, speed and damage by a single multiplier.
    pub fn apply_power_up(&mut self, multiplier: f32) {
        self.max_health *= multiplier;
        self.move_speed *= multiplier;
        self.attack_damage *= multiplier;
    }

    /// Returns a copy scaled by [`EnemyStats::apply_power_up`].
    #[must_use]
    pub fn powered_up(mut self, multiplier: f32) -> Self {
        self.apply_power_up(multiplier);
        self
    }
}

/// Kinds of pickup a loot roll can produce.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LootKind {
    /// Grants experience on collection.
    XpOrb,
    /// Restores player health on collection.
    HealthPickup,
    /// Currency.
    Coin,
    /// Rare collectible.
    Artifact,
}

/// Rarity tier of a perk.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    /// Most frequently offered.
    #[default]
    Common,
    /// Offered less often.
    Rare,
    /// Offered rarely.
    Epic,
    /// Offered very rarely.
    Legendary,
}

/// Stat adjusted by a perk modifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModifierStat {
    /// Adds flat weapon damage.
    Damage,
    /// Multiplies weapon damage after flat bonuses.
    DamageMultiplier,
    /// Adds to the critical hit chance.
    CritChance,
    /// Multiplies attack speed; the weapon cooldown is divided by the product.
    AttackSpeed,
    /// Multiplies weapon range.
    Range,
    /// Adds to the player's movement speed.
    MoveSpeed,
    /// Raises the player's maximum health and heals by the same amount.
    MaxHealth,
}

/// Single stat adjustment granted by a perk.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatModifier {
    /// Stat being adjusted.
    pub stat: ModifierStat,
    /// Amount added to the stat, or factor applied for multiplicative stats.
    pub value: f32,
}

/// Tunable curves the Director exposes as multipliers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurveId {
    /// Scales how many enemies the host should field.
    EnemyCount,
    /// Scales enemy health.
    EnemyHealth,
    /// Scales enemy movement speed.
    EnemySpeed,
    /// Scales the delay between spawns.
    SpawnInterval,
    /// Probability that a rolled health pickup is actually dropped.
    HealDropChance,
}

impl CurveId {
    /// Every curve in declaration order.
    pub const ALL: [CurveId; 5] = [
        CurveId::EnemyCount,
        CurveId::EnemyHealth,
        CurveId::EnemySpeed,
        CurveId::SpawnInterval,
        CurveId::HealDropChance,
    ];
}

/// Read-only access to the current difficulty multipliers.
pub trait DifficultySource {
    /// Evaluates the named curve at the current difficulty.
    fn multiplier(&self, curve: CurveId) -> f32;
}

/// Reason a spawn request was refused by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum SpawnRejection {
    /// The requested archetype is not part of the configuration.
    UnknownArchetype,
    /// The archetype names a pool key the allocator does not know.
    UnknownPool,
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Requests that a new enemy instance enter the encounter.
    SpawnEnemy {
        /// Archetype the instance is cloned from.
        archetype: ArchetypeId,
        /// World position the instance appears at.
        position: Vec3,
        /// Power-up multiplier applied once at spawn.
        power: f32,
    },
    /// Points an enemy's navigation agent at a new destination.
    SetDestination {
        /// Enemy being steered.
        enemy: EnemyId,
        /// Destination in world space.
        destination: Vec3,
    },
    /// Sets an enemy's navigation speed.
    SetSpeed {
        /// Enemy being steered.
        enemy: EnemyId,
        /// Speed in world units per second.
        speed: f32,
    },
    /// Halts or resumes an enemy's navigation agent.
    SetStopped {
        /// Enemy being steered.
        enemy: EnemyId,
        /// Whether the agent should stand still.
        stopped: bool,
    },
    /// Turns an enemy to face the provided horizontal direction.
    OrientEnemy {
        /// Enemy being turned.
        enemy: EnemyId,
        /// Direction the enemy should face.
        heading: Vec3,
    },
    /// Offers a damage event to an entity.
    ApplyDamage {
        /// Entity receiving the damage.
        target: Entity,
        /// Damage being applied.
        damage: DamageEvent,
    },
    /// Detonates a suicide enemy, damaging everything around it and killing it.
    Detonate {
        /// Enemy that explodes.
        enemy: EnemyId,
        /// Radius of the blast.
        radius: f32,
        /// Damage dealt to every entity caught in the blast.
        damage: f32,
        /// Knockback applied to every entity caught in the blast.
        knockback: f32,
    },
    /// Removes an enemy without killing it.
    DespawnEnemy {
        /// Enemy being removed.
        enemy: EnemyId,
    },
    /// Places a pickup in the world.
    DropLoot {
        /// Kind of pickup to place.
        kind: LootKind,
        /// Position the pickup is scattered around.
        position: Vec3,
    },
    /// Fires a projectile from the player's weapon.
    LaunchProjectile {
        /// Point the projectile starts at.
        origin: Vec3,
        /// Direction of travel.
        direction: Vec3,
        /// Travel speed in world units per second.
        speed: f32,
        /// Distance the projectile may cover before expiring.
        range: f32,
        /// Damage delivered to the first enemy it reaches.
        damage: DamageEvent,
    },
    /// Sets the player's desired velocity.
    MovePlayer {
        /// Velocity in world units per second.
        velocity: Vec3,
    },
    /// Restores player health.
    HealPlayer {
        /// Health restored before clamping to the maximum.
        amount: f32,
    },
    /// Raises the player's maximum health without healing.
    RaisePlayerMaxHealth {
        /// Amount added to the maximum.
        amount: f32,
    },
}

/// Events broadcast after processing commands.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Announces that a wave began.
    WaveStarted {
        /// One-based number of the wave, counting every wave started so far.
        wave: u32,
    },
    /// Announces that a wave finished spawning and every enemy it spawned is gone.
    WaveCompleted {
        /// Number of the completed wave.
        wave: u32,
    },
    /// Reports that the schedule has no further waves and does not loop.
    WavesExhausted,
    /// Confirms that an enemy entered the encounter.
    EnemySpawned {
        /// Identifier assigned to the enemy.
        enemy: EnemyId,
        /// Archetype the enemy was cloned from.
        archetype: ArchetypeId,
        /// Position the enemy appeared at.
        position: Vec3,
        /// Runtime stats after the power-up.
        stats: EnemyStats,
    },
    /// Reports that a spawn request could not be honoured.
    SpawnRejected {
        /// Archetype that was requested.
        archetype: ArchetypeId,
        /// Why the request was refused.
        reason: SpawnRejection,
    },
    /// Reports that an entity lost health.
    EntityDamaged {
        /// Entity that was hit.
        entity: Entity,
        /// Health removed by the hit.
        amount: f32,
        /// Whether the hit was critical.
        critical: bool,
        /// Knockback magnitude carried by the hit.
        knockback: f32,
        /// Health remaining after the hit.
        remaining: f32,
    },
    /// Reports that an entity died. Fired exactly once per entity.
    EntityDied {
        /// Entity that died.
        entity: Entity,
        /// Archetype of the entity when it was an enemy.
        archetype: Option<ArchetypeId>,
        /// Position of the entity at death.
        position: Vec3,
    },
    /// Reports that an enemy was killed.
    EnemyKilled {
        /// Enemy that was killed.
        enemy: EnemyId,
    },
    /// Reports that an enemy was removed without dying.
    EnemyDespawned {
        /// Enemy that was removed.
        enemy: EnemyId,
    },
    /// Reports that the player regained health.
    PlayerHealed {
        /// Health actually restored.
        amount: f32,
        /// Health after healing.
        current: f32,
    },
    /// Reports that a pickup was placed in the world.
    PickupDropped {
        /// Kind of pickup placed.
        kind: LootKind,
        /// Final position of the pickup.
        position: Vec3,
    },
    /// Reports that the player collected a pickup.
    PickupCollected {
        /// Kind of pickup collected.
        kind: LootKind,
        /// Experience or health carried by the pickup; one for coins and artifacts.
        amount: f32,
    },
    /// Reports the player's experience after a change.
    ExperienceChanged {
        /// Experience accumulated toward the next level.
        current: u32,
        /// Experience required to reach the next level.
        required: u32,
        /// Level after the change.
        level: u32,
    },
    /// Reports that the player reached a new level.
    LevelUp {
        /// Level reached.
        level: u32,
    },
    /// Reports the perks offered to the player after a level-up.
    PerksOffered {
        /// Level that triggered the offer.
        level: u32,
        /// Perks offered, in draw order.
        perks: Vec<PerkId>,
    },
}

/// Immutable snapshot of a single enemy.
#[derive(Clone, Debug, PartialEq)]
pub struct EnemySnapshot {
    /// Identifier of the enemy.
    pub id: EnemyId,
    /// Archetype the enemy was cloned from.
    pub archetype: ArchetypeId,
    /// Current world position.
    pub position: Vec3,
    /// Current health.
    pub health: f32,
    /// Maximum health.
    pub max_health: f32,
}

/// Read-only view of every enemy in the encounter, ordered by identifier.
#[derive(Clone, Debug, Default)]
pub struct EnemyView {
    snapshots: Vec<EnemySnapshot>,
}

impl EnemyView {
    /// Creates a new view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<EnemySnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterates over the captured snapshots.
    pub fn iter(&self) -> impl Iterator<Item = &EnemySnapshot> {
        self.snapshots.iter()
    }

    /// Looks up a single enemy.
    #[must_use]
    pub fn get(&self, id: EnemyId) -> Option<&EnemySnapshot> {
        self.snapshots
            .binary_search_by_key(&id, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Number of enemies captured in the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Whether the view contains no enemies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

/// Immutable snapshot of the player.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlayerSnapshot {
    /// Current world position.
    pub position: Vec3,
    /// Current health.
    pub health: f32,
    /// Maximum health.
    pub max_health: f32,
    /// Whether the player is alive.
    pub alive: bool,
}

impl PlayerSnapshot {
    /// Current health as a fraction of the maximum, in `[0, 1]`.
    #[must_use]
    pub fn health_fraction(&self) -> f32 {
        if self.max_health <= 0.0 {
            return 0.0;
        }
        (self.health / self.max_health).clamp(0.0, 1.0)
    }
}
