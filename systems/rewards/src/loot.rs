use std::collections::HashMap;

use horde_core::{
    ArchetypeId, Command, CurveId, DifficultySource, EnemyArchetype, Entity, Event, LootKind,
    LootTable, LootTableId,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::WeightedTable;

/// Loot tables indexed by identifier.
#[derive(Clone, Debug, Default)]
pub struct LootTables {
    tables: HashMap<LootTableId, WeightedTable<LootKind>>,
}

impl LootTables {
    /// Builds the index from configured tables.
    #[must_use]
    pub fn new(tables: &[LootTable]) -> Self {
        Self {
            tables: tables
                .iter()
                .map(|table| {
                    let entries: WeightedTable<LootKind> = table
                        .entries
                        .iter()
                        .map(|entry| (entry.kind, entry.weight))
                        .collect();
                    (table.id.clone(), entries)
                })
                .collect(),
        }
    }

    /// Rolls a table once.
    ///
    /// A health pickup survives the roll only when a second uniform draw falls
    /// below `heal_chance`. Unknown and empty tables produce nothing.
    pub fn roll<R: Rng + ?Sized>(
        &self,
        table: &LootTableId,
        heal_chance: f32,
        rng: &mut R,
    ) -> Option<LootKind> {
        let Some(entries) = self.tables.get(table) else {
            log::warn!("loot table `{table}` is not configured");
            return None;
        };

        let kind = *entries.select(rng)?;
        if kind == LootKind::HealthPickup && rng.gen::<f32>() >= heal_chance {
            return None;
        }
        Some(kind)
    }
}

/// Pure system that turns enemy deaths into pickup drops.
#[derive(Debug)]
pub struct Loot {
    tables: LootTables,
    by_archetype: HashMap<ArchetypeId, LootTableId>,
    rng: ChaCha8Rng,
}

impl Loot {
    /// Creates the system from configured tables and archetypes.
    #[must_use]
    pub fn new(tables: &[LootTable], archetypes: &[EnemyArchetype], seed: u64) -> Self {
        Self {
            tables: LootTables::new(tables),
            by_archetype: archetypes
                .iter()
                .filter_map(|archetype| {
                    archetype
                        .loot_table
                        .clone()
                        .map(|table| (archetype.id.clone(), table))
                })
                .collect(),
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Emits `Command::DropLoot` for every enemy death whose archetype has a table.
    pub fn handle(
        &mut self,
        events: &[Event],
        difficulty: &dyn DifficultySource,
        out: &mut Vec<Command>,
    ) {
        for event in events {
            let Event::EntityDied {
                entity: Entity::Enemy(_),
                archetype: Some(archetype),
                position,
            } = event
            else {
                continue;
            };

            let Some(table) = self.by_archetype.get(archetype) else {
                continue;
            };

            let heal_chance = difficulty.multiplier(CurveId::HealDropChance);
            if let Some(kind) = self.tables.roll(table, heal_chance, &mut self.rng) {
                out.push(Command::DropLoot {
                    kind,
                    position: *position,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use horde_core::LootEntry;

    use super::*;

    fn table(entries: &[(LootKind, f32)]) -> LootTables {
        LootTables::new(&[LootTable {
            id: LootTableId::new("drops"),
            entries: entries
                .iter()
                .map(|&(kind, weight)| LootEntry { kind, weight })
                .collect(),
        }])
    }

    #[test]
    fn empty_table_yields_nothing() {
        let tables = table(&[]);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(tables.roll(&LootTableId::new("drops"), 1.0, &mut rng), None);
    }

    #[test]
    fn unknown_table_yields_nothing() {
        let tables = table(&[(LootKind::Coin, 1.0)]);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(tables.roll(&LootTableId::new("missing"), 1.0, &mut rng), None);
    }

    #[test]
    fn heal_drops_are_gated_by_chance() {
        let tables = table(&[(LootKind::HealthPickup, 1.0)]);
        let id = LootTableId::new("drops");
        let mut rng = ChaCha8Rng::seed_from_u64(9);

        for _ in 0..200 {
            assert_eq!(tables.roll(&id, 0.0, &mut rng), None);
            assert_eq!(
                tables.roll(&id, 1.0, &mut rng),
                Some(LootKind::HealthPickup)
            );
        }
    }

    #[test]
    fn all_zero_table_falls_back_to_first_entry() {
        let tables = table(&[(LootKind::Artifact, 0.0), (LootKind::Coin, 0.0)]);
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        assert_eq!(
            tables.roll(&LootTableId::new("drops"), 1.0, &mut rng),
            Some(LootKind::Artifact)
        );
    }
}
