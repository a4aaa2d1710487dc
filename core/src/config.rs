use std::{collections::HashSet, time::Duration};

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    duration_from_secs, ArchetypeId, DifficultyCurves, EnemyStats, LootKind, LootTableId,
    MovementPattern, PerkId, PoolKey, Rarity, StatModifier,
};

/// Problems detected while validating an [`EncounterConfig`].
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// Two archetypes share an identifier.
    #[error("archetype `{0}` is defined more than once")]
    DuplicateArchetype(ArchetypeId),
    /// Two loot tables share an identifier.
    #[error("loot table `{0}` is defined more than once")]
    DuplicateLootTable(LootTableId),
    /// Two perks share an identifier.
    #[error("perk `{0}` is defined more than once")]
    DuplicatePerk(PerkId),
    /// Two pool entries share a key.
    #[error("pool `{0}` is defined more than once")]
    DuplicatePool(PoolKey),
    /// A spawn group names an archetype that does not exist.
    #[error("wave {wave} group {group} references unknown archetype `{archetype}`")]
    UnknownGroupArchetype {
        /// Zero-based wave index.
        wave: usize,
        /// Zero-based group index within the wave.
        group: usize,
        /// Archetype that could not be resolved.
        archetype: ArchetypeId,
    },
    /// An archetype names a loot table that does not exist.
    #[error("archetype `{archetype}` references unknown loot table `{table}`")]
    UnknownLootTable {
        /// Archetype holding the reference.
        archetype: ArchetypeId,
        /// Table that could not be resolved.
        table: LootTableId,
    },
    /// Something names a pool key that is not configured.
    #[error("`{owner}` references unknown pool `{pool}`")]
    UnknownPool {
        /// Description of the referencing item.
        owner: String,
        /// Pool key that could not be resolved.
        pool: PoolKey,
    },
    /// A perk synergy names a perk that does not exist.
    #[error("perk `{perk}` lists unknown synergy `{synergy}`")]
    UnknownSynergy {
        /// Perk holding the reference.
        perk: PerkId,
        /// Synergy target that could not be resolved.
        synergy: PerkId,
    },
    /// A weight is negative or not finite.
    #[error("{0} has an invalid weight")]
    InvalidWeight(String),
    /// A numeric field is negative or not finite.
    #[error("{0} must be finite and non-negative")]
    InvalidValue(String),
    /// The difficulty bounds are inverted or the baseline lies outside them.
    #[error("difficulty bounds require min <= base <= max")]
    InvalidDifficultyBounds,
    /// A curve has no control points or unordered ones.
    #[error("curve `{0}` must have ordered control points")]
    InvalidCurve(&'static str),
    /// A pool's initial size exceeds its maximum.
    #[error("pool `{0}` has an initial size larger than its maximum")]
    InvalidPoolBounds(PoolKey),
}

/// Complete, read-only configuration for one encounter.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncounterConfig {
    /// Difficulty Director tuning.
    pub director: DirectorConfig,
    /// Player tuning.
    pub player: PlayerConfig,
    /// Player weapon.
    pub weapon: WeaponConfig,
    /// Pickup tuning.
    pub pickups: PickupConfig,
    /// Experience and perk offer tuning.
    pub progression: ProgressionConfig,
    /// Perk rarity weights.
    pub rarity: RarityWeights,
    /// Wave schedule.
    pub waves: WaveSchedule,
    /// Enemy archetypes.
    pub archetypes: Vec<EnemyArchetype>,
    /// Loot tables.
    pub loot_tables: Vec<LootTable>,
    /// Perk definitions.
    pub perks: Vec<PerkDef>,
    /// Pooled-object free lists.
    pub pools: Vec<PoolEntry>,
}

impl EncounterConfig {
    /// Looks up an archetype by identifier.
    #[must_use]
    pub fn archetype(&self, id: &ArchetypeId) -> Option<&EnemyArchetype> {
        self.archetypes.iter().find(|archetype| &archetype.id == id)
    }

    /// Checks cross references and numeric ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.director.validate()?;

        let mut pools = HashSet::new();
        for entry in &self.pools {
            if !pools.insert(&entry.key) {
                return Err(ConfigError::DuplicatePool(entry.key.clone()));
            }
            if entry.initial_size > entry.max_size {
                return Err(ConfigError::InvalidPoolBounds(entry.key.clone()));
            }
        }
        let check_pool = |owner: String, pool: &Option<PoolKey>| match pool {
            Some(key) if !pools.contains(key) => Err(ConfigError::UnknownPool {
                owner,
                pool: key.clone(),
            }),
            _ => Ok(()),
        };
        check_pool("weapon".to_owned(), &self.weapon.projectile_pool)?;
        check_pool("pickups".to_owned(), &self.pickups.pool)?;
        for kind in [
            LootKind::XpOrb,
            LootKind::HealthPickup,
            LootKind::Coin,
            LootKind::Artifact,
        ] {
            check_pool(
                format!("{kind:?} pickups"),
                &self.pickups.kind_pools.get(kind).cloned(),
            )?;
        }

        let mut tables = HashSet::new();
        for table in &self.loot_tables {
            if !tables.insert(&table.id) {
                return Err(ConfigError::DuplicateLootTable(table.id.clone()));
            }
            for entry in &table.entries {
                ensure_weight(entry.weight, || format!("loot table `{}`", table.id))?;
            }
        }

        let mut archetypes = HashSet::new();
        for archetype in &self.archetypes {
            if !archetypes.insert(&archetype.id) {
                return Err(ConfigError::DuplicateArchetype(archetype.id.clone()));
            }
            archetype.validate()?;
            if let Some(table) = &archetype.loot_table {
                if !tables.contains(table) {
                    return Err(ConfigError::UnknownLootTable {
                        archetype: archetype.id.clone(),
                        table: table.clone(),
                    });
                }
            }
            check_pool(format!("archetype `{}`", archetype.id), &archetype.pool)?;
        }

        for (wave_index, wave) in self.waves.waves.iter().enumerate() {
            ensure_value(wave.delay_before_wave, || format!("wave {wave_index} delay"))?;
            ensure_value(wave.delay_between_groups, || {
                format!("wave {wave_index} group delay")
            })?;
            for (group_index, group) in wave.groups.iter().enumerate() {
                ensure_value(group.interval, || {
                    format!("wave {wave_index} group {group_index} interval")
                })?;
                if let Some(archetype) = &group.archetype {
                    if !archetypes.contains(archetype) {
                        return Err(ConfigError::UnknownGroupArchetype {
                            wave: wave_index,
                            group: group_index,
                            archetype: archetype.clone(),
                        });
                    }
                }
            }
        }

        let mut perks = HashSet::new();
        for perk in &self.perks {
            if !perks.insert(&perk.id) {
                return Err(ConfigError::DuplicatePerk(perk.id.clone()));
            }
        }
        for perk in &self.perks {
            if let Some(synergy) = perk.synergies.iter().find(|id| !perks.contains(id)) {
                return Err(ConfigError::UnknownSynergy {
                    perk: perk.id.clone(),
                    synergy: synergy.clone(),
                });
            }
        }

        for (name, weight) in [
            ("common", self.rarity.common),
            ("rare", self.rarity.rare),
            ("epic", self.rarity.epic),
            ("legendary", self.rarity.legendary),
        ] {
            ensure_weight(weight, || format!("rarity `{name}`"))?;
        }

        Ok(())
    }
}

fn ensure_weight(weight: f32, describe: impl FnOnce() -> String) -> Result<(), ConfigError> {
    if weight.is_finite() && weight >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidWeight(describe()))
    }
}

fn ensure_value(value: f32, describe: impl FnOnce() -> String) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue(describe()))
    }
}

/// Difficulty Director tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectorConfig {
    /// Difficulty the target starts from before metric adjustments.
    pub base_difficulty: f32,
    /// Lower clamp.
    pub min_difficulty: f32,
    /// Upper clamp.
    pub max_difficulty: f32,
    /// Smoothing gain applied per second of elapsed time.
    pub adjustment_speed: f32,
    /// Length of the rolling sample window in seconds.
    pub window_seconds: f32,
    /// Multiplier curves.
    pub curves: DifficultyCurves,
}

impl DirectorConfig {
    /// Length of the rolling sample window.
    #[must_use]
    pub fn window(&self) -> Duration {
        duration_from_secs(self.window_seconds)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let finite = [
            self.base_difficulty,
            self.min_difficulty,
            self.max_difficulty,
        ]
        .iter()
        .all(|value| value.is_finite());
        if !finite
            || self.min_difficulty > self.max_difficulty
            || self.base_difficulty < self.min_difficulty
            || self.base_difficulty > self.max_difficulty
        {
            return Err(ConfigError::InvalidDifficultyBounds);
        }
        ensure_value(self.adjustment_speed, || "director adjustment speed".to_owned())?;
        ensure_value(self.window_seconds, || "director window".to_owned())?;

        for (name, curve) in [
            ("enemy_count", &self.curves.enemy_count),
            ("enemy_health", &self.curves.enemy_health),
            ("enemy_speed", &self.curves.enemy_speed),
            ("spawn_interval", &self.curves.spawn_interval),
            ("heal_drop_chance", &self.curves.heal_drop_chance),
        ] {
            if curve.points().is_empty() || !curve.is_ordered() {
                return Err(ConfigError::InvalidCurve(name));
            }
        }
        Ok(())
    }
}

impl Default for DirectorConfig {
    fn default() -> Self {
        Self {
            base_difficulty: 0.5,
            min_difficulty: 0.1,
            max_difficulty: 1.0,
            adjustment_speed: 0.1,
            window_seconds: 30.0,
            curves: DifficultyCurves::default(),
        }
    }
}

/// Ordered list of waves plus placement tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveSchedule {
    /// Whether the schedule wraps back to the first wave after the last.
    #[serde(rename = "loop")]
    pub looping: bool,
    /// Centre of the spawn disk used when a group has no zones.
    pub spawn_origin: Vec3,
    /// Radius of the spawn disk.
    pub arena_radius: f32,
    /// Waves in play order.
    pub waves: Vec<WaveDefinition>,
}

impl Default for WaveSchedule {
    fn default() -> Self {
        Self {
            looping: false,
            spawn_origin: Vec3::ZERO,
            arena_radius: 20.0,
            waves: Vec::new(),
        }
    }
}

/// One wave: ordered spawn groups separated by delays.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveDefinition {
    /// Seconds to wait after the wave starts before the first group.
    pub delay_before_wave: f32,
    /// Seconds to wait after a group drains before the next begins.
    pub delay_between_groups: f32,
    /// Groups in spawn order.
    pub groups: Vec<SpawnGroup>,
}

impl WaveDefinition {
    /// Delay before the first group.
    #[must_use]
    pub fn warmup(&self) -> Duration {
        duration_from_secs(self.delay_before_wave)
    }

    /// Delay between consecutive groups.
    #[must_use]
    pub fn group_gap(&self) -> Duration {
        duration_from_secs(self.delay_between_groups)
    }
}

impl Default for WaveDefinition {
    fn default() -> Self {
        Self {
            delay_before_wave: 2.0,
            delay_between_groups: 3.0,
            groups: Vec::new(),
        }
    }
}

/// A run of identical spawns at a fixed cadence.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnGroup {
    /// Archetype to spawn; `None` picks one per spawn by spawn weight.
    pub archetype: Option<ArchetypeId>,
    /// Number of enemies in the group.
    pub count: u32,
    /// Seconds between consecutive spawns.
    pub interval: f32,
    /// Fixed spawn positions; empty means "anywhere in the arena disk".
    pub spawn_zones: Vec<Vec3>,
}

impl SpawnGroup {
    /// Delay between consecutive spawns.
    #[must_use]
    pub fn cadence(&self) -> Duration {
        duration_from_secs(self.interval)
    }
}

impl Default for SpawnGroup {
    fn default() -> Self {
        Self {
            archetype: None,
            count: 5,
            interval: 1.0,
            spawn_zones: Vec::new(),
        }
    }
}

/// Immutable enemy template.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyArchetype {
    /// Unique identifier.
    pub id: ArchetypeId,
    /// Starting health.
    pub max_health: f32,
    /// Travel speed.
    pub move_speed: f32,
    /// Damage per strike.
    pub attack_damage: f32,
    /// Strike distance.
    pub attack_range: f32,
    /// Detection distance.
    pub detection_range: f32,
    /// Seconds between strikes.
    pub attack_cooldown: f32,
    /// Movement policy.
    pub pattern: MovementPattern,
    /// Loot table rolled on death.
    pub loot_table: Option<LootTableId>,
    /// Weight used when a group picks its archetype at random.
    pub spawn_weight: f32,
    /// Pool the instance is checked out of; `None` allocates directly.
    pub pool: Option<PoolKey>,
}

impl EnemyArchetype {
    /// Clones the runtime stat block for a new instance.
    #[must_use]
    pub fn stats(&self) -> EnemyStats {
        EnemyStats {
            max_health: self.max_health,
            move_speed: self.move_speed,
            attack_damage: self.attack_damage,
            attack_range: self.attack_range,
            detection_range: self.detection_range,
            attack_cooldown: duration_from_secs(self.attack_cooldown),
            pattern: self.pattern,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("max_health", self.max_health),
            ("move_speed", self.move_speed),
            ("attack_damage", self.attack_damage),
            ("attack_range", self.attack_range),
            ("detection_range", self.detection_range),
            ("attack_cooldown", self.attack_cooldown),
        ] {
            ensure_value(value, || format!("archetype `{}` {field}", self.id))?;
        }
        ensure_weight(self.spawn_weight, || format!("archetype `{}`", self.id))
    }
}

impl Default for EnemyArchetype {
    fn default() -> Self {
        Self {
            id: ArchetypeId::new("enemy"),
            max_health: 50.0,
            move_speed: 3.0,
            attack_damage: 5.0,
            attack_range: 2.0,
            detection_range: 10.0,
            attack_cooldown: 2.0,
            pattern: MovementPattern::Rusher,
            loot_table: None,
            spawn_weight: 1.0,
            pool: None,
        }
    }
}

/// Weighted list of pickups rolled when an enemy dies.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LootTable {
    /// Unique identifier.
    pub id: LootTableId,
    /// Entries in roll order.
    #[serde(default)]
    pub entries: Vec<LootEntry>,
}

/// Single weighted loot entry.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LootEntry {
    /// Pickup produced when the entry wins.
    pub kind: LootKind,
    /// Relative weight.
    pub weight: f32,
}

/// Perk definition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PerkDef {
    /// Unique identifier.
    pub id: PerkId,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Rarity tier providing the base offer weight.
    #[serde(default)]
    pub rarity: Rarity,
    /// Stat adjustments granted when chosen.
    #[serde(default)]
    pub effects: Vec<StatModifier>,
    /// Perks whose offer weight this perk boosts once chosen.
    #[serde(default)]
    pub synergies: Vec<PerkId>,
}

/// Base offer weight per rarity tier.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RarityWeights {
    /// Weight of common perks.
    pub common: f32,
    /// Weight of rare perks.
    pub rare: f32,
    /// Weight of epic perks.
    pub epic: f32,
    /// Weight of legendary perks.
    pub legendary: f32,
}

impl RarityWeights {
    /// Weight for the provided tier.
    #[must_use]
    pub const fn weight(&self, rarity: Rarity) -> f32 {
        match rarity {
            Rarity::Common => self.common,
            Rarity::Rare => self.rare,
            Rarity::Epic => self.epic,
            Rarity::Legendary => self.legendary,
        }
    }
}

impl Default for RarityWeights {
    fn default() -> Self {
        Self {
            common: 1.0,
            rare: 0.3,
            epic: 0.1,
            legendary: 0.03,
        }
    }
}

/// Player tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Starting and maximum health.
    pub max_health: f32,
    /// Travel speed.
    pub move_speed: f32,
    /// Seconds of invincibility after every accepted hit.
    pub invincibility: f32,
    /// Starting position.
    pub spawn_position: Vec3,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            max_health: 100.0,
            move_speed: 5.0,
            invincibility: 0.5,
            spawn_position: Vec3::ZERO,
        }
    }
}

/// How the player's weapon delivers damage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeaponKind {
    /// Hits every enemy within range.
    #[default]
    Melee,
    /// Fires a projectile at the nearest enemy within range.
    Ranged,
}

/// Player weapon tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponConfig {
    /// Delivery mode.
    pub kind: WeaponKind,
    /// Damage before modifiers.
    pub base_damage: f32,
    /// Probability of a critical hit.
    pub crit_chance: f32,
    /// Damage multiplier applied on a critical hit.
    pub crit_multiplier: f32,
    /// Seconds between attacks.
    pub cooldown: f32,
    /// Reach of melee swings and projectiles.
    pub range: f32,
    /// Projectile travel speed.
    pub projectile_speed: f32,
    /// Pool projectiles are checked out of.
    pub projectile_pool: Option<PoolKey>,
}

impl Default for WeaponConfig {
    fn default() -> Self {
        Self {
            kind: WeaponKind::Melee,
            base_damage: 10.0,
            crit_chance: 0.1,
            crit_multiplier: 2.0,
            cooldown: 1.0,
            range: 2.0,
            projectile_speed: 10.0,
            projectile_pool: None,
        }
    }
}

/// Pickup tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PickupConfig {
    /// Experience granted by an orb.
    pub xp_amount: f32,
    /// Health restored by a health pickup.
    pub heal_amount: f32,
    /// Distance at which the player collects a pickup.
    pub pickup_range: f32,
    /// Distance at which pickups start drifting toward the player.
    pub attraction_range: f32,
    /// Drift speed.
    pub attraction_speed: f32,
    /// Pool pickups are checked out of unless their kind names its own.
    pub pool: Option<PoolKey>,
    /// Pools dedicated to a single kind of pickup.
    pub kind_pools: KindPools,
}

impl PickupConfig {
    /// Pool a pickup of `kind` is checked out of.
    #[must_use]
    pub fn pool_for(&self, kind: LootKind) -> Option<&PoolKey> {
        self.kind_pools.get(kind).or(self.pool.as_ref())
    }
}

impl Default for PickupConfig {
    fn default() -> Self {
        Self {
            xp_amount: 10.0,
            heal_amount: 25.0,
            pickup_range: 2.0,
            attraction_range: 5.0,
            attraction_speed: 5.0,
            pool: None,
            kind_pools: KindPools::default(),
        }
    }
}

/// Per-kind pickup pool overrides.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KindPools {
    /// Pool for experience orbs.
    pub xp_orb: Option<PoolKey>,
    /// Pool for health pickups.
    pub health_pickup: Option<PoolKey>,
    /// Pool for coins.
    pub coin: Option<PoolKey>,
    /// Pool for artifacts.
    pub artifact: Option<PoolKey>,
}

impl KindPools {
    /// Dedicated pool of `kind`, if one is configured.
    #[must_use]
    pub fn get(&self, kind: LootKind) -> Option<&PoolKey> {
        match kind {
            LootKind::XpOrb => self.xp_orb.as_ref(),
            LootKind::HealthPickup => self.health_pickup.as_ref(),
            LootKind::Coin => self.coin.as_ref(),
            LootKind::Artifact => self.artifact.as_ref(),
        }
    }
}

/// Experience curve and perk offers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressionConfig {
    /// Experience required to leave level one.
    pub base_required: f32,
    /// Growth factor applied per level.
    pub growth_per_level: f32,
    /// Perks offered at every level-up.
    pub perks_per_level: usize,
    /// Multiplier applied per chosen perk that lists a candidate as a synergy.
    pub synergy_bonus: f32,
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            base_required: 100.0,
            growth_per_level: 1.2,
            perks_per_level: 3,
            synergy_bonus: 1.5,
        }
    }
}

/// Free list managed by the object pool.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PoolEntry {
    /// Key used to acquire from this free list.
    pub key: PoolKey,
    /// Handles created up front.
    #[serde(default = "default_initial_size")]
    pub initial_size: usize,
    /// Largest number of idle handles retained.
    #[serde(default = "default_max_size")]
    pub max_size: usize,
}

const fn default_initial_size() -> usize {
    10
}

const fn default_max_size() -> usize {
    50
}
