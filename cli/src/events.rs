//! Event-sequence generators: sliding window and random sampling (spec.md
//! §6), grounded in `window_from_file`/`random_from_file` in
//! `examples/original_source/main.cpp`.
//!
//! The original's deletion-candidate selection truncates
//! `rand() / RAND_MAX` as integer division before scaling by the candidate
//! count, which collapses to picking index 0 almost always — an artifact
//! of the C++, not a behaviour worth reproducing. Here deletion candidates
//! are chosen uniformly via `rng.gen_range`.

use std::collections::VecDeque;

use dynatree_core::Point;
use rand::seq::SliceRandom;
use rand::Rng;

/// A single step of a test sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum TreeEvent {
    Add(Point),
    Delete(Point),
    Eval(Point),
}

/// Builds a sliding-window test sequence: the first `window_size` rows seed
/// the tree, then every subsequent row deletes the oldest windowed point and
/// adds itself, with probability `eval_proba` of an `Eval` event
/// (classifying the incoming point) beforehand.
///
/// Returns `(initial_points, events)`.
pub fn sliding_window_events(
    rows: &[Point],
    window_size: usize,
    eval_proba: f64,
    rng: &mut impl Rng,
) -> (Vec<Point>, Vec<TreeEvent>) {
    let initial: Vec<Point> = rows.iter().take(window_size).cloned().collect();
    let mut window: VecDeque<Point> = initial.iter().cloned().collect();
    let mut events = Vec::new();

    for point in rows.iter().skip(window_size) {
        if rng.gen::<f64>() < eval_proba {
            events.push(TreeEvent::Eval(point.clone()));
        }
        if let Some(oldest) = window.pop_front() {
            events.push(TreeEvent::Delete(oldest));
        }
        events.push(TreeEvent::Add(point.clone()));
        window.push_back(point.clone());
    }

    (initial, events)
}

/// Builds a random-sampling test sequence: shuffles `rows`, seeds the tree
/// from the first `initial_size` of them (skipping exactly one row before
/// the update stream begins, matching the original), then emits up to
/// `number_of_updates` `Add`/`Delete` events biased by `insert_probability`,
/// each preceded with probability `eval_proba` by an `Eval` event.
///
/// Returns `(initial_points, events)`.
pub fn random_sampling_events(
    mut rows: Vec<Point>,
    initial_size: usize,
    eval_proba: f64,
    number_of_updates: usize,
    insert_probability: f64,
    rng: &mut impl Rng,
) -> (Vec<Point>, Vec<TreeEvent>) {
    rows.shuffle(rng);

    let initial: Vec<Point> = rows.iter().take(initial_size).cloned().collect();
    let mut already_added: Vec<Point> = initial.clone();

    let mut remaining = rows.into_iter().skip(initial_size);
    remaining.next();

    let mut events = Vec::new();
    for point in remaining.take(number_of_updates) {
        if rng.gen::<f64>() < eval_proba {
            events.push(TreeEvent::Eval(point.clone()));
        }
        if already_added.is_empty() || rng.gen::<f64>() < insert_probability {
            events.push(TreeEvent::Add(point.clone()));
            already_added.push(point);
        } else {
            let index = rng.gen_range(0..already_added.len());
            let removed = already_added.remove(index);
            events.push(TreeEvent::Delete(removed));
        }
    }

    (initial, events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn points(n: usize) -> Vec<Point> {
        (0..n).map(|i| Point::new(vec![i as f32], i % 2 == 0)).collect()
    }

    #[test]
    fn sliding_window_emits_one_add_one_delete_per_row_past_the_window() {
        let rows = points(10);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let (initial, events) = sliding_window_events(&rows, 4, 0.0, &mut rng);
        assert_eq!(initial.len(), 4);
        let adds = events.iter().filter(|e| matches!(e, TreeEvent::Add(_))).count();
        let deletes = events.iter().filter(|e| matches!(e, TreeEvent::Delete(_))).count();
        assert_eq!(adds, 6);
        assert_eq!(deletes, 6);
    }

    #[test]
    fn sliding_window_shorter_than_file_emits_no_events() {
        let rows = points(3);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let (initial, events) = sliding_window_events(&rows, 10, 0.0, &mut rng);
        assert_eq!(initial.len(), 3);
        assert!(events.is_empty());
    }

    #[test]
    fn random_sampling_always_inserts_when_nothing_added_yet() {
        let rows = points(5);
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let (initial, events) = random_sampling_events(rows, 0, 0.0, 3, 0.0, &mut rng);
        assert!(initial.is_empty());
        assert!(events.iter().all(|e| matches!(e, TreeEvent::Add(_))));
    }

    #[test]
    fn random_sampling_respects_update_budget() {
        let rows = points(200);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let (_, events) = random_sampling_events(rows, 20, 0.0, 15, 0.5, &mut rng);
        assert_eq!(events.len(), 15);
    }
}
