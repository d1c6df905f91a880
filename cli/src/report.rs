//! Running an event sequence against a tree and formatting the results
//! (spec.md §6), grounded in `test_iterations` and the CSV layout
//! documented in `main()`'s help text in
//! `examples/original_source/main.cpp`.

use std::time::Duration;

use dynatree_core::Tree;

use crate::events::TreeEvent;

/// Tally of `Eval` outcomes and accumulated training error over a run,
/// the analogue of `test_result` in `main.cpp`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TestResult {
    pub true_positive: u64,
    pub true_negative: u64,
    pub false_positive: u64,
    pub false_negative: u64,
    pub total_training_error: u64,
}

impl TestResult {
    pub fn total_evaluations(&self) -> u64 {
        self.true_positive + self.true_negative + self.false_positive + self.false_negative
    }

    pub fn mean_training_error(&self) -> f64 {
        let total = self.total_evaluations();
        if total == 0 {
            0.0
        } else {
            self.total_training_error as f64 / total as f64
        }
    }
}

/// Replays `events` against `tree`, tallying evaluation outcomes.
///
/// A `Delete` event is assumed to name a point added earlier in the same
/// sequence; this mirrors `test_iterations`, which does not check for a
/// missing point either.
pub fn run_events(tree: &mut Tree, events: &[TreeEvent]) -> TestResult {
    let mut result = TestResult::default();
    for event in events {
        match event {
            TreeEvent::Add(point) => tree.insert(point.features().to_vec(), point.label()),
            TreeEvent::Delete(point) => {
                let _ = tree.remove(point.features().to_vec(), point.label());
            }
            TreeEvent::Eval(point) => {
                let prediction = tree.predict(point.features());
                match (prediction, point.label()) {
                    (true, true) => result.true_positive += 1,
                    (true, false) => result.false_positive += 1,
                    (false, true) => result.false_negative += 1,
                    (false, false) => result.true_negative += 1,
                }
                result.total_training_error += tree.training_error();
            }
        }
    }
    result
}

fn millis(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

/// Human-readable report: the tree's render dump followed by counts,
/// timings, and build-counter lines.
pub fn render_human(tree: &Tree, result: &TestResult, init_time: Duration, iter_time: Duration, builds: u64) -> String {
    format!(
        "{}\nTP : {}; TN : {}\nFP : {}; FN : {}\nInitialization time (ms) : {:.3}\nIteration time (ms) : {:.3}\nNb builds : {}\nMean training error : {}\n",
        tree.render(),
        result.true_positive,
        result.true_negative,
        result.false_positive,
        result.false_negative,
        millis(init_time),
        millis(iter_time),
        builds,
        result.mean_training_error(),
    )
}

/// One CSV row: `seed;epsilon;TP;TN;FP;FN;init_ms;iter_ms;builds;mean_training_error`.
pub fn render_csv_row(seed: u64, epsilon: f32, result: &TestResult, init_time: Duration, iter_time: Duration, builds: u64) -> String {
    format!(
        "{seed};{epsilon};{};{};{};{};{:.3};{:.3};{builds};{}",
        result.true_positive,
        result.true_negative,
        result.false_positive,
        result.false_negative,
        millis(init_time),
        millis(iter_time),
        result.mean_training_error(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use dynatree_core::{FeatureKind, Point, TreeConfig};

    fn tree() -> Tree {
        Tree::new(
            TreeConfig {
                dimension: 1,
                feature_kinds: vec![FeatureKind::Real],
                max_height: 3,
                epsilon: 0.5,
                epsilon_transmission: 0.5,
                min_split_points: 0,
                min_split_gini: 0.0,
            },
            vec![Point::new(vec![0.0], false), Point::new(vec![1.0], true)],
        )
        .unwrap()
    }

    #[test]
    fn counts_evaluation_outcomes() {
        let mut tree = tree();
        let events = vec![
            TreeEvent::Eval(Point::new(vec![0.0], false)),
            TreeEvent::Eval(Point::new(vec![1.0], true)),
        ];
        let result = run_events(&mut tree, &events);
        assert_eq!(result.true_negative, 1);
        assert_eq!(result.true_positive, 1);
        assert_eq!(result.total_evaluations(), 2);
    }

    #[test]
    fn csv_row_has_ten_semicolon_separated_fields() {
        let mut tree = tree();
        let result = run_events(&mut tree, &[TreeEvent::Eval(Point::new(vec![0.0], false))]);
        let row = render_csv_row(1, 0.1, &result, Duration::ZERO, Duration::ZERO, 0);
        assert_eq!(row.split(';').count(), 10);
    }
}
