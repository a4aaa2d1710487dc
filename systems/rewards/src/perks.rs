use std::collections::VecDeque;

use horde_core::{Event, PerkDef, PerkId, ProgressionConfig, RarityWeights};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::select_distinct_indices;

/// Perk catalogue, chosen perks and outstanding level-up offers.
#[derive(Debug)]
pub struct PerkDeck {
    perks: Vec<PerkDef>,
    rarity: RarityWeights,
    synergy_bonus: f32,
    per_level: usize,
    chosen: Vec<PerkId>,
    offers: VecDeque<Vec<PerkId>>,
    rng: ChaCha8Rng,
}

impl PerkDeck {
    /// Creates a deck over the provided catalogue.
    #[must_use]
    pub fn new(
        perks: Vec<PerkDef>,
        rarity: RarityWeights,
        progression: &ProgressionConfig,
        seed: u64,
    ) -> Self {
        Self {
            perks,
            rarity,
            synergy_bonus: progression.synergy_bonus,
            per_level: progression.perks_per_level,
            chosen: Vec::new(),
            offers: VecDeque::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Perks chosen so far, in choice order.
    #[must_use]
    pub fn chosen(&self) -> &[PerkId] {
        &self.chosen
    }

    /// Oldest offer still awaiting a choice.
    #[must_use]
    pub fn pending_offer(&self) -> Option<&[PerkId]> {
        self.offers.front().map(Vec::as_slice)
    }

    /// Offer weight of `perk` given the perks chosen so far.
    ///
    /// The rarity weight is multiplied by the synergy bonus once for every
    /// chosen perk that lists `perk` as a synergy.
    #[must_use]
    pub fn weight_of(&self, perk: &PerkDef) -> f32 {
        let boosts = self
            .chosen
            .iter()
            .filter_map(|id| self.definition(id))
            .filter(|chosen| chosen.synergies.contains(&perk.id))
            .count();
        let exponent = i32::try_from(boosts).unwrap_or(i32::MAX);
        self.rarity.weight(perk.rarity) * self.synergy_bonus.powi(exponent)
    }

    /// Draws up to `count` distinct perks using the current weights.
    pub fn draw<R: Rng + ?Sized>(&self, count: usize, rng: &mut R) -> Vec<PerkId> {
        let weights = self.weights();
        self.ids(select_distinct_indices(&weights, count, rng))
    }

    /// Answers every `LevelUp` with a fresh offer.
    pub fn handle(&mut self, events: &[Event], out_events: &mut Vec<Event>) {
        for event in events {
            let Event::LevelUp { level } = event else {
                continue;
            };
            if self.perks.is_empty() {
                continue;
            }

            let weights = self.weights();
            let picks = select_distinct_indices(&weights, self.per_level, &mut self.rng);
            let perks = self.ids(picks);

            log::debug!("offering perks {perks:?} for level {level}");
            self.offers.push_back(perks.clone());
            out_events.push(Event::PerksOffered {
                level: *level,
                perks,
            });
        }
    }

    /// Accepts a perk from the oldest pending offer.
    ///
    /// Returns the chosen definition so the host can route its effects, or
    /// `None` when no offer is pending or the perk was not part of it.
    pub fn choose(&mut self, perk: &PerkId) -> Option<&PerkDef> {
        let offered = self.offers.front()?.contains(perk);
        if !offered {
            log::debug!("perk `{perk}` is not part of the pending offer");
            return None;
        }
        let _ = self.offers.pop_front();
        self.chosen.push(perk.clone());
        self.definition(perk)
    }

    fn weights(&self) -> Vec<f32> {
        self.perks.iter().map(|perk| self.weight_of(perk)).collect()
    }

    fn ids(&self, indices: Vec<usize>) -> Vec<PerkId> {
        indices
            .into_iter()
            .map(|index| self.perks[index].id.clone())
            .collect()
    }

    fn definition(&self, id: &PerkId) -> Option<&PerkDef> {
        self.perks.iter().find(|perk| &perk.id == id)
    }
}
