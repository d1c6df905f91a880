//! A multiset of point references annotated with lazily-recomputed Gini and
//! best-split statistics (spec.md §4.1).

use std::cell::Cell;

use crate::arena::PointArena;
use crate::feature::{child_relevance, FeatureKind, FeatureKinds};

/// Cached positive-count / positive-fraction pair (tier T1).
#[derive(Debug, Clone, Copy)]
struct PositiveStats {
    count: u64,
    fraction: f64,
}

/// The cached best-split candidate (tier T3).
///
/// An all-zero value is the sentinel for "this pointset is empty" or "no
/// candidate split exists" — both are treated by callers as "cannot split"
/// (spec.md §4.1).
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct BestSplit {
    pub feature: usize,
    pub threshold: f32,
    pub gain_proxy: f64,
    pub under_count: u64,
    pub under_positive: u64,
    pub over_count: u64,
    pub over_positive: u64,
}

impl BestSplit {
    fn empty() -> Self {
        BestSplit {
            feature: 0,
            threshold: 0.0,
            gain_proxy: 0.0,
            under_count: 0,
            under_positive: 0,
            over_count: 0,
            over_positive: 0,
        }
    }

    fn seed() -> Self {
        BestSplit {
            gain_proxy: f64::NAN,
            ..Self::empty()
        }
    }
}

/// A multiset of point references (arena ids), plus the subtree's
/// feature-relevance vector and lazily-materialised Gini/best-split caches.
///
/// The three cache fields use `Cell` so that the read-only accessors
/// (`positive_fraction`, `gini`, `best_split`) can take `&self` — predicting
/// must not mutate tree *structure*, but lazily warming a cache is not a
/// structural mutation (spec.md §9 "Laziness flags").
#[derive(Debug, Clone)]
pub(crate) struct PointSet {
    indices: Vec<usize>,
    feature_kinds: FeatureKinds,
    feature_still_useful: Vec<bool>,
    positive: Cell<Option<PositiveStats>>,
    gini: Cell<Option<f64>>,
    best: Cell<Option<BestSplit>>,
}

impl PointSet {
    pub(crate) fn new(indices: Vec<usize>, feature_kinds: FeatureKinds, feature_still_useful: Vec<bool>) -> Self {
        PointSet {
            indices,
            feature_kinds,
            feature_still_useful,
            positive: Cell::new(None),
            gini: Cell::new(None),
            best: Cell::new(None),
        }
    }

    /// Builds a child pointset with its T1 cache pre-warmed from the parent's
    /// best-split counters, mirroring the original `split_at_best`, which
    /// sets `positive_proportion`/`is_positive_proportion_calculated` on
    /// each produced child directly instead of leaving them dirty.
    fn new_with_known_positives(
        indices: Vec<usize>,
        feature_kinds: FeatureKinds,
        feature_still_useful: Vec<bool>,
        count: u64,
        total: u64,
    ) -> Self {
        let fraction = if total == 0 { 0.0 } else { count as f64 / total as f64 };
        let set = Self::new(indices, feature_kinds, feature_still_useful);
        set.positive.set(Some(PositiveStats { count, fraction }));
        set
    }

    pub(crate) fn len(&self) -> usize {
        self.indices.len()
    }

    pub(crate) fn feature_kind(&self, feature: usize) -> FeatureKind {
        self.feature_kinds[feature]
    }

    pub(crate) fn feature_still_useful(&self) -> &[bool] {
        &self.feature_still_useful
    }

    /// Inserts `id`, keeping T1 current in O(1) if it was already valid,
    /// else marking it dirty; T2 and T3 are always invalidated.
    pub(crate) fn insert(&mut self, id: usize, arena: &PointArena) {
        self.indices.push(id);
        if let Some(mut stats) = self.positive.get() {
            if arena.get(id).label() {
                stats.count += 1;
            }
            stats.fraction = stats.count as f64 / self.indices.len() as f64;
            self.positive.set(Some(stats));
        }
        self.gini.set(None);
        self.best.set(None);
    }

    /// Removes one occurrence of `id` from this subset.
    ///
    /// Panics (programmer error) if `id` is not present — every caller
    /// reaches this only while descending along the path a point belongs
    /// to.
    pub(crate) fn remove(&mut self, id: usize, arena: &PointArena) {
        let position = self
            .indices
            .iter()
            .position(|&existing| existing == id)
            .expect("point was not a member of this subset");
        self.indices.swap_remove(position);
        if let Some(mut stats) = self.positive.get() {
            if arena.get(id).label() {
                stats.count -= 1;
            }
            stats.fraction = if self.indices.is_empty() {
                0.0
            } else {
                stats.count as f64 / self.indices.len() as f64
            };
            self.positive.set(Some(stats));
        }
        self.gini.set(None);
        self.best.set(None);
    }

    /// Materialises T1 (and caches it) if dirty. Empty sets yield `0.0`.
    pub(crate) fn positive_fraction(&self, arena: &PointArena) -> f64 {
        if let Some(stats) = self.positive.get() {
            return stats.fraction;
        }
        let count = self.indices.iter().filter(|&&id| arena.get(id).label()).count() as u64;
        let fraction = if self.indices.is_empty() {
            0.0
        } else {
            count as f64 / self.indices.len() as f64
        };
        self.positive.set(Some(PositiveStats { count, fraction }));
        fraction
    }

    /// Materialises T2 (and T1 transitively) if dirty.
    pub(crate) fn gini(&self, arena: &PointArena) -> f64 {
        if let Some(gini) = self.gini.get() {
            return gini;
        }
        let p = self.positive_fraction(arena);
        let gini = 2.0 * p * (1.0 - p);
        self.gini.set(Some(gini));
        gini
    }

    /// The number of points a majority-class leaf over this set would
    /// misclassify. Requires T1.
    pub(crate) fn training_error(&self, arena: &PointArena) -> u64 {
        self.positive_fraction(arena);
        let stats = self.positive.get().expect("positive_fraction warms the cache");
        stats.count.min(self.indices.len() as u64 - stats.count)
    }

    /// Materialises T3 if dirty: the best `(feature, threshold)` split over
    /// every still-relevant feature.
    pub(crate) fn best_split(&self, arena: &PointArena) -> BestSplit {
        if let Some(best) = self.best.get() {
            return best;
        }
        let best = self.compute_best_split(arena);
        self.best.set(Some(best));
        best
    }

    fn compute_best_split(&self, arena: &PointArena) -> BestSplit {
        if self.indices.is_empty() {
            return BestSplit::empty();
        }

        let total_count = self.indices.len() as u64;
        let total_positive = self.indices.iter().filter(|&&id| arena.get(id).label()).count() as u64;
        let mut best = BestSplit::seed();

        for (feature, &kind) in self.feature_kinds.iter().enumerate() {
            if !self.feature_still_useful[feature] {
                continue;
            }
            match kind {
                FeatureKind::Real => {
                    self.sweep_real_feature(arena, feature, total_count, total_positive, &mut best)
                }
                FeatureKind::Binary | FeatureKind::Categorical => {
                    self.sweep_discrete_feature(arena, feature, total_count, total_positive, &mut best)
                }
            }
        }

        if best.gain_proxy.is_nan() {
            // No feature offered a usable candidate (spec.md §9's
            // ArithmeticDegeneracy discussion): leave the sentinel, callers
            // treat a non-finite-positive gain proxy as "cannot split".
            log::warn!("best_split found no usable candidate over {total_count} points");
        }

        best
    }

    /// Sweeps distinct value boundaries of a `Real` feature once, as spec.md
    /// §4.1 describes, recording the split at the midpoint of each pair of
    /// adjacent distinct values.
    fn sweep_real_feature(
        &self,
        arena: &PointArena,
        feature: usize,
        total_count: u64,
        total_positive: u64,
        best: &mut BestSplit,
    ) {
        let mut sorted = self.indices.clone();
        sorted.sort_by(|&a, &b| {
            arena
                .get(a)
                .feature(feature)
                .partial_cmp(&arena.get(b).feature(feature))
                .expect("feature values must be finite")
        });

        let mut under_count = 0u64;
        let mut under_positive = 0u64;
        let mut i = 0;
        while i < sorted.len() {
            let value = arena.get(sorted[i]).feature(feature);
            let mut j = i;
            while j < sorted.len() && arena.get(sorted[j]).feature(feature) == value {
                under_count += 1;
                if arena.get(sorted[j]).label() {
                    under_positive += 1;
                }
                j += 1;
            }
            if j < sorted.len() {
                let next_value = arena.get(sorted[j]).feature(feature);
                let over_count = total_count - under_count;
                let over_positive = total_positive - under_positive;
                let gain = gain_proxy(under_count, under_positive, over_count, over_positive);
                if best.gain_proxy.is_nan() || gain > best.gain_proxy {
                    *best = BestSplit {
                        feature,
                        threshold: (value + next_value) / 2.0,
                        gain_proxy: gain,
                        under_count,
                        under_positive,
                        over_count,
                        over_positive,
                    };
                }
            }
            i = j;
        }
    }

    /// Considers, for each distinct value `v` of a `Binary`/`Categorical`
    /// feature, the split "== v" (over) vs "!= v" (under).
    fn sweep_discrete_feature(
        &self,
        arena: &PointArena,
        feature: usize,
        total_count: u64,
        total_positive: u64,
        best: &mut BestSplit,
    ) {
        let mut groups: Vec<(f32, u64, u64)> = Vec::new();
        for &id in &self.indices {
            let point = arena.get(id);
            let value = point.feature(feature);
            match groups.iter_mut().find(|(v, ..)| *v == value) {
                Some((_, count, positive)) => {
                    *count += 1;
                    if point.label() {
                        *positive += 1;
                    }
                }
                None => groups.push((value, 1, point.label() as u64)),
            }
        }
        groups.sort_by(|a, b| a.0.partial_cmp(&b.0).expect("feature values must be finite"));

        for (value, over_count, over_positive) in groups {
            let under_count = total_count - over_count;
            let under_positive = total_positive - over_positive;
            if under_count == 0 {
                // Single distinct value: no partition is possible. This is
                // the "non-empty empty-class counters" degeneracy noted in
                // spec.md §9 — pass it over rather than divide by zero.
                continue;
            }
            let gain = gain_proxy(under_count, under_positive, over_count, over_positive);
            // Groups are visited in ascending value order; ties (spec.md S3:
            // a pure binary split gives both candidate values the same proxy)
            // are broken in favor of the higher value via `>=`, so the
            // last-visited tied group wins and "== v → over" puts the
            // positive class on the over side.
            if best.gain_proxy.is_nan() || gain >= best.gain_proxy {
                *best = BestSplit {
                    feature,
                    threshold: value,
                    gain_proxy: gain,
                    under_count,
                    under_positive,
                    over_count,
                    over_positive,
                };
            }
        }
    }

    /// Partitions this subset by its cached best split. Left/under receives
    /// `feature <= threshold` for `Real`, `feature != threshold` otherwise;
    /// right/over gets the complement (spec.md §4.1 "Split materialisation").
    pub(crate) fn split_at_best(&self, arena: &PointArena) -> (PointSet, PointSet) {
        let best = self.best_split(arena);
        let kind = self.feature_kind(best.feature);

        let mut under_ids = Vec::new();
        let mut over_ids = Vec::new();
        for &id in &self.indices {
            let value = arena.get(id).feature(best.feature);
            let goes_over = match kind {
                FeatureKind::Real => value > best.threshold,
                FeatureKind::Binary | FeatureKind::Categorical => value == best.threshold,
            };
            if goes_over {
                over_ids.push(id);
            } else {
                under_ids.push(id);
            }
        }

        let (under_relevant, over_relevant) = child_relevance(&self.feature_still_useful, best.feature, kind);

        let under = PointSet::new_with_known_positives(
            under_ids,
            self.feature_kinds.clone(),
            under_relevant,
            best.under_positive,
            best.under_count,
        );
        let over = PointSet::new_with_known_positives(
            over_ids,
            self.feature_kinds.clone(),
            over_relevant,
            best.over_positive,
            best.over_count,
        );
        (under, over)
    }
}

/// The linear gain-proxy surrogate from spec.md §4.1:
/// `G = -[under_positive * (1 - under_fraction) + over_positive * (1 - over_fraction)]`.
fn gain_proxy(under_count: u64, under_positive: u64, over_count: u64, over_positive: u64) -> f64 {
    let under_fraction = under_positive as f64 / under_count as f64;
    let over_fraction = over_positive as f64 / over_count as f64;
    -(under_positive as f64 * (1.0 - under_fraction) + over_positive as f64 * (1.0 - over_fraction))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point::Point;
    use float_cmp::approx_eq;
    use std::rc::Rc;

    fn arena_of(points: Vec<(Vec<f32>, bool)>) -> (PointArena, Vec<usize>) {
        let mut arena = PointArena::new();
        let ids = points
            .into_iter()
            .map(|(features, label)| arena.insert(Point::new(features, label)))
            .collect();
        (arena, ids)
    }

    #[test]
    fn gini_matches_formula() {
        let (arena, ids) = arena_of(vec![
            (vec![0.0], false),
            (vec![1.0], false),
            (vec![2.0], true),
            (vec![3.0], true),
        ]);
        let kinds: FeatureKinds = Rc::from(vec![FeatureKind::Real]);
        let set = PointSet::new(ids, kinds, vec![true]);
        assert!(approx_eq!(f64, set.positive_fraction(&arena), 0.5));
        assert!(approx_eq!(f64, set.gini(&arena), 0.5));
    }

    #[test]
    fn empty_set_has_zero_fraction_and_gini() {
        let arena = PointArena::new();
        let kinds: FeatureKinds = Rc::from(vec![FeatureKind::Real]);
        let set = PointSet::new(Vec::new(), kinds, vec![true]);
        assert_eq!(set.positive_fraction(&arena), 0.0);
        assert_eq!(set.gini(&arena), 0.0);
        assert_eq!(set.best_split(&arena).gain_proxy, 0.0);
    }

    #[test]
    fn real_feature_split_ignores_ties_s4() {
        // spec.md S4: (1,true) (1,false) (2,true) (2,true)
        let (arena, ids) = arena_of(vec![
            (vec![1.0], true),
            (vec![1.0], false),
            (vec![2.0], true),
            (vec![2.0], true),
        ]);
        let kinds: FeatureKinds = Rc::from(vec![FeatureKind::Real]);
        let set = PointSet::new(ids, kinds, vec![true]);
        let best = set.best_split(&arena);
        assert_eq!(best.feature, 0);
        assert!(approx_eq!(f32, best.threshold, 1.5));
        assert_eq!(best.under_count, 2);
        assert_eq!(best.under_positive, 1);
        assert_eq!(best.over_count, 2);
        assert_eq!(best.over_positive, 2);
    }

    #[test]
    fn binary_feature_splits_on_equality() {
        let mut points = Vec::new();
        for _ in 0..5 {
            points.push((vec![0.0], false));
        }
        for _ in 0..5 {
            points.push((vec![1.0], true));
        }
        let (arena, ids) = arena_of(points);
        let kinds: FeatureKinds = Rc::from(vec![FeatureKind::Binary]);
        let set = PointSet::new(ids, kinds, vec![true]);
        let best = set.best_split(&arena);
        assert_eq!(best.feature, 0);
        assert_eq!(best.threshold, 1.0);
        assert_eq!(best.over_count, 5);
        assert_eq!(best.over_positive, 5);
        assert_eq!(best.under_count, 5);
        assert_eq!(best.under_positive, 0);
    }

    #[test]
    fn single_distinct_value_yields_no_split() {
        let (arena, ids) = arena_of(vec![(vec![1.0], true), (vec![1.0], false)]);
        let kinds: FeatureKinds = Rc::from(vec![FeatureKind::Categorical]);
        let set = PointSet::new(ids, kinds, vec![true]);
        assert!(set.best_split(&arena).gain_proxy.is_nan());
    }

    #[test]
    fn irrelevant_features_are_skipped() {
        let (arena, ids) = arena_of(vec![(vec![0.0, 0.0], false), (vec![1.0, 1.0], true)]);
        let kinds: FeatureKinds = Rc::from(vec![FeatureKind::Real, FeatureKind::Real]);
        let set = PointSet::new(ids, kinds, vec![false, true]);
        let best = set.best_split(&arena);
        assert_eq!(best.feature, 1);
    }
}
