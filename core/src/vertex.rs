//! A single node of a [`crate::Tree`]: either a leaf carrying a majority
//! vote, or an internal node carrying a split plus two children.
//!
//! Insert/delete/build/predict all live here rather than on `Tree`, mirroring
//! the original `Vertex` class; `Tree` only owns the root and the ambient
//! config/counter the whole recursion shares (spec.md §4.2-§4.3).

use crate::arena::PointArena;
use crate::counter::BuildCounter;
use crate::feature::FeatureKind;
use crate::pointset::PointSet;

enum NodeKind {
    Leaf,
    Internal(Box<InternalData>),
}

struct InternalData {
    split_feature: usize,
    split_threshold: f32,
    under: Vertex,
    over: Vertex,
}

/// The parameters a rebuild needs, threaded down from [`crate::TreeConfig`]
/// without the vertex needing a back-pointer to the tree that owns it
/// (spec.md §9 "Parent back-pointer").
#[derive(Debug, Clone, Copy)]
pub(crate) struct BuildParams {
    pub epsilon: f32,
    pub epsilon_transmission: f32,
    pub min_split_points: u64,
    pub min_split_gini: f64,
}

pub(crate) struct Vertex {
    pointset: PointSet,
    node: NodeKind,
    is_root: bool,
    remaining_height: u32,
    updates_since_build: u64,
    params: BuildParams,
}

impl Vertex {
    pub(crate) fn new_root(pointset: PointSet, remaining_height: u32, params: BuildParams) -> Self {
        Vertex {
            pointset,
            node: NodeKind::Leaf,
            is_root: true,
            remaining_height,
            updates_since_build: 0,
            params,
        }
    }

    fn new_child(pointset: PointSet, remaining_height: u32, params: BuildParams) -> Self {
        Vertex {
            pointset,
            node: NodeKind::Leaf,
            is_root: false,
            remaining_height,
            updates_since_build: 0,
            params,
        }
    }

    pub(crate) fn is_leaf(&self) -> bool {
        matches!(self.node, NodeKind::Leaf)
    }

    /// Deep-clones this subtree, substituting `params` at every vertex while
    /// keeping every already-computed split and pointset (spec.md §4.4
    /// "Clone-with-new-epsilon").
    pub(crate) fn clone_with_params(&self, params: BuildParams) -> Vertex {
        Vertex {
            pointset: self.pointset.clone(),
            node: match &self.node {
                NodeKind::Leaf => NodeKind::Leaf,
                NodeKind::Internal(data) => NodeKind::Internal(Box::new(InternalData {
                    split_feature: data.split_feature,
                    split_threshold: data.split_threshold,
                    under: data.under.clone_with_params(params),
                    over: data.over.clone_with_params(params),
                })),
            },
            is_root: self.is_root,
            remaining_height: self.remaining_height,
            updates_since_build: self.updates_since_build,
            params,
        }
    }

    /// (Re)computes this subtree from scratch: finds the best split over
    /// `self.pointset`, and if one clears the stop-rule, recurses into two
    /// fresh children. One call counts as one `BuildCounter` tick regardless
    /// of whether it produces a leaf or an internal node (spec.md §6).
    pub(crate) fn build(&mut self, arena: &PointArena, counter: &BuildCounter) {
        counter.increment();

        let gini = self.pointset.gini(arena);
        let size = self.pointset.len() as u64;
        let best = self.pointset.best_split(arena);

        // The stop-rule compares the *converted* gain (spec.md glossary:
        // "true gain = parent.gini + 2·proxy/|parent|"), not the raw proxy —
        // the raw proxy is non-positive by construction (it is the negated
        // sum of non-negative terms), so a literal "proxy ≤ 0" test would
        // reject every split, including perfectly pure ones. Grounded in the
        // original `PointSet::get_best_gain`, which applies this conversion
        // before `Vertex::build` compares it to zero.
        let true_gain = gini + 2.0 * best.gain_proxy / size as f64;

        let stop = self.remaining_height == 0
            || size <= self.params.min_split_points
            || gini <= self.params.min_split_gini
            || !(true_gain > 0.0);

        if stop {
            self.node = NodeKind::Leaf;
            log::trace!("built leaf: size={size} gini={gini:.4}");
        } else {
            let (under_set, over_set) = self.pointset.split_at_best(arena);
            let mut under = Vertex::new_child(under_set, self.remaining_height - 1, self.params);
            let mut over = Vertex::new_child(over_set, self.remaining_height - 1, self.params);
            under.build(arena, counter);
            over.build(arena, counter);
            log::trace!(
                "built internal: feature={} threshold={} size={size}",
                best.feature,
                best.threshold
            );
            self.node = NodeKind::Internal(Box::new(InternalData {
                split_feature: best.feature,
                split_threshold: best.threshold,
                under,
                over,
            }));
        }
        self.updates_since_build = 0;
    }

    /// Descends to a leaf without mutating tree structure, returning its
    /// majority-class decision (spec.md §4.2). Warming a memoized statistic
    /// is not a structural mutation, so this only needs `&self` (see
    /// `PointSet`'s `Cell` caches).
    pub(crate) fn predict(&self, arena: &PointArena, features: &[f32]) -> bool {
        match &self.node {
            NodeKind::Leaf => self.pointset.positive_fraction(arena) >= 0.5,
            NodeKind::Internal(data) => {
                if Self::goes_over(data, self.pointset.feature_kind(data.split_feature), features) {
                    data.over.predict(arena, features)
                } else {
                    data.under.predict(arena, features)
                }
            }
        }
    }

    fn goes_over(data: &InternalData, kind: FeatureKind, features: &[f32]) -> bool {
        let value = features[data.split_feature];
        match kind {
            FeatureKind::Real => value > data.split_threshold,
            FeatureKind::Binary | FeatureKind::Categorical => value == data.split_threshold,
        }
    }

    pub(crate) fn training_error(&self, arena: &PointArena) -> u64 {
        match &self.node {
            NodeKind::Leaf => self.pointset.training_error(arena),
            NodeKind::Internal(data) => data.under.training_error(arena) + data.over.training_error(arena),
        }
    }

    /// The transmission threshold from spec.md §4.3:
    /// `round((1+epsilon_tx)^ceil(log(n)/log(1+epsilon_tx)))`, the smallest
    /// power of `(1+epsilon_tx)` at or above `n`.
    fn transmission_threshold(&self, n: u64) -> u64 {
        if n == 0 {
            return 0;
        }
        let base = 1.0 + self.params.epsilon_transmission as f64;
        let exponent = ((n as f64).ln() / base.ln()).ceil();
        (base.powf(exponent) + 0.5).floor() as u64
    }

    /// Applies one insert (`is_insert = true`) or delete of the arena point
    /// `id` along the path its feature vector routes through, running the
    /// two-part amortized rebuild protocol of spec.md §4.3. Returns the
    /// *rebuild threshold* this vertex reports to its caller (0 = no further
    /// action needed above this point).
    pub(crate) fn apply_update(
        &mut self,
        arena: &PointArena,
        counter: &BuildCounter,
        features: &[f32],
        id: usize,
        is_insert: bool,
    ) -> u64 {
        // Step 1: apply the structural change to this vertex's own pointset.
        if is_insert {
            self.pointset.insert(id, arena);
        } else {
            self.pointset.remove(id, arena);
        }

        if is_insert {
            // Step 2: a leaf absorbs an insert silently; `updates_since_build`
            // is not even incremented (relabelling a leaf is always cheap).
            if self.is_leaf() {
                return 0;
            }
            self.updates_since_build += 1;
        } else {
            // Deletes count toward the budget even on a leaf.
            self.updates_since_build += 1;
            if self.is_leaf() {
                return 0;
            }
        }

        // Step 4: local eligibility check.
        let size = self.pointset.len() as u64;
        if self.updates_since_build as f64 >= self.params.epsilon as f64 * size as f64 {
            if self.is_root {
                self.build(arena, counter);
                return 0;
            }
            return self.transmission_threshold(size);
        }

        // Step 5: recurse into the appropriate child.
        let (split_feature, split_threshold, kind) = match &self.node {
            NodeKind::Internal(data) => (
                data.split_feature,
                data.split_threshold,
                self.pointset.feature_kind(data.split_feature),
            ),
            NodeKind::Leaf => unreachable!("non-leaf checked above"),
        };
        let goes_over = match kind {
            FeatureKind::Real => features[split_feature] > split_threshold,
            FeatureKind::Binary | FeatureKind::Categorical => features[split_feature] == split_threshold,
        };
        let child_threshold = match &mut self.node {
            NodeKind::Internal(data) => {
                let child = if goes_over { &mut data.over } else { &mut data.under };
                child.apply_update(arena, counter, features, id, is_insert)
            }
            NodeKind::Leaf => unreachable!("non-leaf checked above"),
        };

        // Steps 6-8: act on the child's reported threshold, if any.
        if child_threshold > 0 {
            if size < child_threshold {
                if self.is_root {
                    self.build(arena, counter);
                    return 0;
                }
                return child_threshold;
            }
            match &mut self.node {
                NodeKind::Internal(data) => {
                    let child = if goes_over { &mut data.over } else { &mut data.under };
                    child.build(arena, counter);
                }
                NodeKind::Leaf => unreachable!("non-leaf checked above"),
            }
        }
        0
    }

    /// Pre-order text dump, right subtree before left (spec.md §6). Returns
    /// one or more lines with no trailing newline; the caller joins them.
    pub(crate) fn render_lines(&self, arena: &PointArena) -> Vec<String> {
        match &self.node {
            NodeKind::Leaf => {
                let p = self.pointset.positive_fraction(arena);
                let s = self.pointset.len();
                // Fixed 6-decimal formatting matches the original's
                // `std::to_string` glyphs (spec.md §6: render output is
                // observable), e.g. `p=0.666667`.
                vec![format!("p={p:.6};s={s}")]
            }
            NodeKind::Internal(data) => {
                let p = self.pointset.positive_fraction(arena);
                let s = self.pointset.len();
                let basis = format!(
                    "f={};t={:.6};p={p:.6};s={s}",
                    data.split_feature, data.split_threshold
                );
                let indent = " ".repeat(basis.len().saturating_sub(1));

                let mut over_lines = data.over.render_lines(arena);
                let first_over = over_lines.remove(0);
                let mut lines = Vec::with_capacity(1 + over_lines.len() + 1);
                lines.push(format!("{basis}--{first_over}"));
                for line in over_lines {
                    lines.push(format!("{indent}|  {line}"));
                }

                let mut under_lines = data.under.render_lines(arena);
                let first_under = under_lines.remove(0);
                lines.push(format!("{indent}|--{first_under}"));
                let under_indent = " ".repeat(basis.len() + 2);
                for line in under_lines {
                    lines.push(format!("{under_indent}{line}"));
                }
                lines
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point::Point;
    use std::rc::Rc;

    fn params() -> BuildParams {
        BuildParams {
            epsilon: 0.5,
            epsilon_transmission: 0.5,
            min_split_points: 1,
            min_split_gini: 0.0,
        }
    }

    #[test]
    fn build_then_predict_separates_classes() {
        let mut arena = PointArena::new();
        let mut ids = Vec::new();
        for i in 0..4 {
            ids.push(arena.insert(Point::new(vec![i as f32], i >= 2)));
        }
        let kinds = Rc::from(vec![FeatureKind::Real]);
        let pointset = PointSet::new(ids, kinds, vec![true]);
        let mut root = Vertex::new_root(pointset, 4, params());
        let counter = BuildCounter::new();
        root.build(&arena, &counter);

        assert!(counter.get() >= 1);
        assert_eq!(root.predict(&arena, &[0.0]), false);
        assert_eq!(root.predict(&arena, &[3.0]), true);
    }

    #[test]
    fn leaf_with_pure_set_stays_leaf() {
        let mut arena = PointArena::new();
        let ids = vec![
            arena.insert(Point::new(vec![0.0], true)),
            arena.insert(Point::new(vec![1.0], true)),
        ];
        let kinds = Rc::from(vec![FeatureKind::Real]);
        let pointset = PointSet::new(ids, kinds, vec![true]);
        let mut root = Vertex::new_root(pointset, 4, params());
        let counter = BuildCounter::new();
        root.build(&arena, &counter);
        assert!(root.is_leaf());
    }

    #[test]
    fn insert_below_local_threshold_does_not_rebuild() {
        // Mirrors spec.md S2: inserting into a size-2 pure child with
        // epsilon=0.5 should not trigger a rebuild (1 < 1.5).
        let mut arena = PointArena::new();
        let ids = vec![
            arena.insert(Point::new(vec![1.0], true)),
            arena.insert(Point::new(vec![1.0], true)),
        ];
        let kinds = Rc::from(vec![FeatureKind::Real]);
        let pointset = PointSet::new(ids, kinds, vec![true]);
        let mut leaf = Vertex::new_child(pointset, 4, params());
        let counter = BuildCounter::new();
        leaf.build(&arena, &counter);
        assert!(leaf.is_leaf());

        let new_id = arena.insert(Point::new(vec![1.0], false));
        let reported = leaf.apply_update(&arena, &counter, &[1.0], new_id, true);
        assert_eq!(reported, 0);
        // A leaf silently absorbs inserts without even counting them.
        assert_eq!(leaf.updates_since_build, 0);
    }
}
