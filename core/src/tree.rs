//! The public façade: owns point storage and the root vertex, validates
//! configuration, and exposes insert/remove/predict/render (spec.md §4.4).

use std::rc::Rc;

use crate::arena::PointArena;
use crate::counter::BuildCounter;
use crate::error::TreeError;
use crate::feature::{FeatureKind, FeatureKinds};
use crate::point::Point;
use crate::pointset::PointSet;
use crate::render::render_tree;
use crate::vertex::{BuildParams, Vertex};

/// Immutable construction-time parameters (spec.md §3 "Tree").
#[derive(Debug, Clone)]
pub struct TreeConfig {
    pub dimension: usize,
    pub feature_kinds: Vec<FeatureKind>,
    pub max_height: u32,
    pub epsilon: f32,
    pub epsilon_transmission: f32,
    pub min_split_points: u64,
    pub min_split_gini: f64,
}

impl TreeConfig {
    fn validate(&self) -> Result<(), TreeError> {
        if self.feature_kinds.len() != self.dimension {
            return Err(TreeError::ConfigInvalid(format!(
                "feature_kinds has {} entries but dimension is {}",
                self.feature_kinds.len(),
                self.dimension
            )));
        }
        if self.max_height == 0 {
            return Err(TreeError::ConfigInvalid("max_height must be at least 1".into()));
        }
        Ok(())
    }

    fn build_params(&self) -> BuildParams {
        BuildParams {
            epsilon: self.epsilon,
            epsilon_transmission: self.epsilon_transmission,
            min_split_points: self.min_split_points,
            min_split_gini: self.min_split_gini,
        }
    }
}

/// An online binary decision tree: owns every [`Point`] it has ever been
/// given, a root [`Vertex`], and a [`BuildCounter`] shared by the whole
/// recursion.
pub struct Tree {
    arena: PointArena,
    root: Vertex,
    config: TreeConfig,
    feature_kinds: FeatureKinds,
    counter: BuildCounter,
}

impl Tree {
    /// Builds a tree over `initial_points`, running a full `build()` on the
    /// root immediately.
    ///
    /// Errors if `config` is malformed; one of `initial_points` having the
    /// wrong dimension is a programmer error and panics, consistent with
    /// every other out-of-range access in this crate (spec.md §7).
    pub fn new(config: TreeConfig, initial_points: Vec<Point>) -> Result<Tree, TreeError> {
        config.validate()?;
        for point in &initial_points {
            assert_eq!(
                point.dimension(),
                config.dimension,
                "initial point dimension does not match the configured dimension"
            );
        }

        let feature_kinds: FeatureKinds = Rc::from(config.feature_kinds.clone());
        let mut arena = PointArena::new();
        let ids: Vec<usize> = initial_points.into_iter().map(|p| arena.insert(p)).collect();

        let pointset = PointSet::new(ids, feature_kinds.clone(), vec![true; config.dimension]);
        let params = config.build_params();
        let mut root = Vertex::new_root(pointset, config.max_height, params);
        let counter = BuildCounter::new();
        root.build(&arena, &counter);

        Ok(Tree {
            arena,
            root,
            config,
            feature_kinds,
            counter,
        })
    }

    /// Inserts a new point, forwarding to the root (spec.md §4.3).
    pub fn insert(&mut self, features: Vec<f32>, label: bool) {
        assert_eq!(features.len(), self.config.dimension, "feature vector has the wrong dimension");
        let id = self.arena.insert(Point::new(features.clone(), label));
        self.root.apply_update(&self.arena, &self.counter, &features, id, true);
    }

    /// Removes the first point equal to `(features, label)` under the §3
    /// ordering. Fails with [`TreeError::NotFound`] if no such point exists.
    pub fn remove(&mut self, features: Vec<f32>, label: bool) -> Result<(), TreeError> {
        assert_eq!(features.len(), self.config.dimension, "feature vector has the wrong dimension");
        let id = self.arena.find(&features, label).ok_or(TreeError::NotFound)?;
        self.root.apply_update(&self.arena, &self.counter, &features, id, false);
        self.arena.release(id);
        Ok(())
    }

    pub fn predict(&self, features: &[f32]) -> bool {
        assert_eq!(features.len(), self.config.dimension, "feature vector has the wrong dimension");
        self.root.predict(&self.arena, features)
    }

    pub fn training_error(&self) -> u64 {
        self.root.training_error(&self.arena)
    }

    pub fn render(&self) -> String {
        render_tree(&self.root, &self.arena)
    }

    pub fn build_counter(&self) -> &BuildCounter {
        &self.counter
    }

    /// Produces an independent tree over the same points and structure but
    /// with different rebuild sensitivities, reusing every split already
    /// computed (spec.md §4.4 "Clone-with-new-epsilon"). The clone starts
    /// with its own zeroed `BuildCounter`.
    pub fn clone_with_epsilon(&self, epsilon: f32, epsilon_transmission: f32) -> Tree {
        let mut config = self.config.clone();
        config.epsilon = epsilon;
        config.epsilon_transmission = epsilon_transmission;
        let params = config.build_params();

        Tree {
            arena: self.arena.clone(),
            root: self.root.clone_with_params(params),
            config,
            feature_kinds: self.feature_kinds.clone(),
            counter: BuildCounter::new(),
        }
    }
}
