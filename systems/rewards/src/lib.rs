#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Weighted reward selection shared by loot drops, perk offers and random
//! archetype picks.

mod loot;
mod perks;
mod weighted;

pub use loot::{Loot, LootTables};
pub use perks::PerkDeck;
pub use weighted::{select_distinct_indices, select_index, WeightedItem, WeightedTable};
