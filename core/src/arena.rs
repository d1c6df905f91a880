//! Slab storage for the points a [`crate::Tree`] owns.
//!
//! `PointSet`s and `Vertex`es never hold points directly; they hold `usize`
//! arena ids, the same pattern the teacher uses for `Cluster`, which stores
//! `Vec<usize>` indices into its `Dataset` rather than instances
//! (`Index::Indices` in `olwmc-clam/src/core/cluster.rs`). This sidesteps the
//! ordering dependency between dropping a vertex and dropping its points
//! that the original C++ destructor has to manage by hand (spec.md §9).

use std::collections::BTreeMap;

use crate::point::Point;

/// Owns every live [`Point`] in a tree and maintains a value-ordered index
/// so that `Tree::remove` can find a point by feature+label equality, the
/// analogue of the original `std::multiset<Point*>`.
#[derive(Debug, Clone, Default)]
pub struct PointArena {
    slots: Vec<Option<Point>>,
    free: Vec<usize>,
    by_value: BTreeMap<Point, Vec<usize>>,
}

impl PointArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `point`, returning the stable arena id it was assigned.
    pub fn insert(&mut self, point: Point) -> usize {
        let id = match self.free.pop() {
            Some(id) => {
                self.slots[id] = Some(point.clone());
                id
            }
            None => {
                self.slots.push(Some(point.clone()));
                self.slots.len() - 1
            }
        };
        self.by_value.entry(point).or_default().push(id);
        id
    }

    /// Finds the arena id of the first point equal to `(features, label)`
    /// under the §3 ordering, without removing it.
    ///
    /// Kept separate from [`Self::release`] so that a caller (`Tree::remove`)
    /// can traverse the tree structure — which still needs to read the
    /// point's label — before the slot is actually freed.
    pub fn find(&self, features: &[f32], label: bool) -> Option<usize> {
        let pattern = Point::new(features.to_vec(), label);
        self.by_value.get(&pattern)?.last().copied()
    }

    /// Frees the slot at `id`.
    ///
    /// Panics (programmer error) if `id` does not refer to a live point.
    pub fn release(&mut self, id: usize) {
        let point = self.slots[id].take().expect("releasing a point not present");
        if let Some(ids) = self.by_value.get_mut(&point) {
            ids.retain(|&existing| existing != id);
            if ids.is_empty() {
                self.by_value.remove(&point);
            }
        }
        self.free.push(id);
    }

    /// Finds and removes the first point equal to `(features, label)` under
    /// the §3 ordering, returning its former arena id.
    pub fn remove_matching(&mut self, features: &[f32], label: bool) -> Option<usize> {
        let id = self.find(features, label)?;
        self.release(id);
        Some(id)
    }

    /// Borrows the point at `id`.
    ///
    /// Panics (programmer error) if `id` does not refer to a live point.
    pub fn get(&self, id: usize) -> &Point {
        self.slots[id]
            .as_ref()
            .expect("arena id referenced a released point")
    }

    /// The number of currently live points.
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_then_remove_round_trips() {
        let mut arena = PointArena::new();
        let id = arena.insert(Point::new(vec![1.0, 2.0], true));
        assert_eq!(arena.len(), 1);
        assert_eq!(arena.get(id).label(), true);

        let removed = arena.remove_matching(&[1.0, 2.0], true);
        assert_eq!(removed, Some(id));
        assert_eq!(arena.len(), 0);
    }

    #[test]
    fn remove_of_absent_point_returns_none() {
        let mut arena = PointArena::new();
        arena.insert(Point::new(vec![0.0], false));
        assert_eq!(arena.remove_matching(&[9.0], true), None);
    }

    #[test]
    fn duplicate_values_are_kept_as_siblings() {
        let mut arena = PointArena::new();
        let a = arena.insert(Point::new(vec![1.0], true));
        let b = arena.insert(Point::new(vec![1.0], true));
        assert_ne!(a, b);
        assert_eq!(arena.len(), 2);

        arena.remove_matching(&[1.0], true).unwrap();
        assert_eq!(arena.len(), 1);
        arena.remove_matching(&[1.0], true).unwrap();
        assert_eq!(arena.len(), 0);
    }

    #[test]
    fn reuses_freed_slots() {
        let mut arena = PointArena::new();
        let first = arena.insert(Point::new(vec![0.0], false));
        arena.remove_matching(&[0.0], false).unwrap();
        let second = arena.insert(Point::new(vec![2.0], true));
        assert_eq!(first, second);
    }
}
