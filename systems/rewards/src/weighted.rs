use rand::Rng;

/// Item paired with its selection weight.
#[derive(Clone, Debug, PartialEq)]
pub struct WeightedItem<T> {
    /// Value returned when the entry is drawn.
    pub item: T,
    /// Relative weight; negative and non-finite weights count as zero.
    pub weight: f32,
}

/// Ordered list of weighted items.
///
/// Draw order follows insertion order, so identical random streams always
/// select identical items.
#[derive(Clone, Debug, PartialEq)]
pub struct WeightedTable<T> {
    items: Vec<WeightedItem<T>>,
}

impl<T> Default for WeightedTable<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T> WeightedTable<T> {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an item.
    pub fn push(&mut self, item: T, weight: f32) {
        self.items.push(WeightedItem { item, weight });
    }

    /// Entries in table order.
    #[must_use]
    pub fn items(&self) -> &[WeightedItem<T>] {
        &self.items
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the table has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of all usable weights.
    #[must_use]
    pub fn total_weight(&self) -> f32 {
        self.items.iter().map(|entry| usable(entry.weight)).sum()
    }

    /// Draws a single item.
    ///
    /// Returns `None` only for an empty table. A table whose weights are all
    /// zero yields its first item.
    pub fn select<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&T> {
        let weights: Vec<f32> = self.items.iter().map(|entry| entry.weight).collect();
        select_index(&weights, rng).map(|index| &self.items[index].item)
    }

    /// Draws up to `count` distinct items without replacement.
    pub fn select_distinct<R: Rng + ?Sized>(&self, count: usize, rng: &mut R) -> Vec<&T> {
        let weights: Vec<f32> = self.items.iter().map(|entry| entry.weight).collect();
        select_distinct_indices(&weights, count, rng)
            .into_iter()
            .map(|index| &self.items[index].item)
            .collect()
    }
}

impl<T> FromIterator<(T, f32)> for WeightedTable<T> {
    fn from_iter<I: IntoIterator<Item = (T, f32)>>(iter: I) -> Self {
        Self {
            items: iter
                .into_iter()
                .map(|(item, weight)| WeightedItem { item, weight })
                .collect(),
        }
    }
}

fn usable(weight: f32) -> f32 {
    if weight.is_finite() && weight > 0.0 {
        weight
    } else {
        0.0
    }
}

/// Picks an index proportionally to `weights`.
///
/// Draws a value in `[0, total)` and walks the weights in order, returning the
/// first index whose cumulative weight reaches the draw. Zero-weight entries
/// are never chosen unless every weight is zero, in which case the first index
/// is returned. The same fallback covers a draw that lands past the cumulative
/// total through rounding. Returns `None` for an empty slice.
pub fn select_index<R: Rng + ?Sized>(weights: &[f32], rng: &mut R) -> Option<usize> {
    if weights.is_empty() {
        return None;
    }

    let total: f32 = weights.iter().copied().map(usable).sum();
    if !total.is_finite() || total <= 0.0 {
        return Some(0);
    }

    let draw = rng.gen_range(0.0..total);
    let mut cumulative = 0.0;
    for (index, weight) in weights.iter().copied().map(usable).enumerate() {
        if weight == 0.0 {
            continue;
        }
        cumulative += weight;
        if cumulative >= draw {
            return Some(index);
        }
    }

    Some(0)
}

/// Picks up to `count` distinct indices, recomputing the total after each pick.
pub fn select_distinct_indices<R: Rng + ?Sized>(
    weights: &[f32],
    count: usize,
    rng: &mut R,
) -> Vec<usize> {
    let mut candidates: Vec<usize> = (0..weights.len()).collect();
    let mut picked = Vec::with_capacity(count.min(weights.len()));

    while picked.len() < count && !candidates.is_empty() {
        let remaining: Vec<f32> = candidates.iter().map(|&index| weights[index]).collect();
        let Some(slot) = select_index(&remaining, rng) else {
            break;
        };
        picked.push(candidates.remove(slot));
    }

    picked
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    #[test]
    fn dominant_weight_always_wins() {
        let table: WeightedTable<&str> = [("a", 10.0), ("b", 0.0), ("c", 0.0)]
            .into_iter()
            .collect();
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        for _ in 0..1000 {
            assert_eq!(table.select(&mut rng), Some(&"a"));
        }
    }

    #[test]
    fn zero_weights_fall_back_to_first() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(select_index(&[0.0, 0.0, 0.0], &mut rng), Some(0));
        assert_eq!(select_index(&[], &mut rng), None);
    }

    #[test]
    fn zero_weight_entries_are_skipped() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for _ in 0..500 {
            assert_eq!(select_index(&[0.0, 2.0, 0.0], &mut rng), Some(1));
        }
    }

    #[test]
    fn negative_and_nan_weights_count_as_zero() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        for _ in 0..200 {
            assert_eq!(select_index(&[-5.0, f32::NAN, 1.0], &mut rng), Some(2));
        }
    }

    #[test]
    fn distinct_selection_returns_every_item_once() {
        let mut rng = ChaCha8Rng::seed_from_u64(99);
        for _ in 0..100 {
            let mut picked = select_distinct_indices(&[1.0, 0.3, 0.03], 3, &mut rng);
            picked.sort_unstable();
            assert_eq!(picked, vec![0, 1, 2]);
        }
    }

    #[test]
    fn distinct_selection_stops_when_exhausted() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        assert_eq!(select_distinct_indices(&[1.0, 1.0], 5, &mut rng).len(), 2);
        assert!(select_distinct_indices(&[], 3, &mut rng).is_empty());
    }

    #[test]
    fn frequencies_follow_weights() {
        let mut rng = ChaCha8Rng::seed_from_u64(2024);
        let mut hits = [0_u32; 2];
        for _ in 0..10_000 {
            if let Some(index) = select_index(&[3.0, 1.0], &mut rng) {
                hits[index] += 1;
            }
        }
        let share = f64::from(hits[0]) / 10_000.0;
        assert!((share - 0.75).abs() < 0.03, "observed share {share}");
    }
}
