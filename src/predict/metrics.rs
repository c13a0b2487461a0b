//! Evaluation metrics
//!
//! Scores a classifier against the labelled rows of an augmented table.

use crate::features::AugmentedTable;
use crate::predict::input::PredictionInput;
use crate::predict::model::Classifier;
use crate::{FormError, ImputationPolicy, Outcome, Result};
use std::collections::BTreeMap;
use std::fmt;

/// Prediction quality over a set of labelled matches
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metrics {
    pub total_predictions: usize,
    pub correct: usize,
    /// Rows without a label or with unknown inputs under `reject`
    pub skipped: usize,
    pub predicted: BTreeMap<Outcome, usize>,
    pub actual: BTreeMap<Outcome, usize>,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one prediction against the actual result
    pub fn record(&mut self, predicted: Outcome, actual: Outcome) {
        self.total_predictions += 1;
        if predicted == actual {
            self.correct += 1;
        }
        *self.predicted.entry(predicted).or_default() += 1;
        *self.actual.entry(actual).or_default() += 1;
    }

    pub fn skip(&mut self) {
        self.skipped += 1;
    }

    /// Fraction of correct predictions (0-1)
    pub fn accuracy(&self) -> f64 {
        if self.total_predictions == 0 {
            0.0
        } else {
            self.correct as f64 / self.total_predictions as f64
        }
    }

    /// Reset all metrics
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Merge another metrics instance
    pub fn merge(&mut self, other: &Metrics) {
        self.total_predictions += other.total_predictions;
        self.correct += other.correct;
        self.skipped += other.skipped;
        for (outcome, n) in &other.predicted {
            *self.predicted.entry(*outcome).or_default() += n;
        }
        for (outcome, n) in &other.actual {
            *self.actual.entry(*outcome).or_default() += n;
        }
    }
}

impl fmt::Display for Metrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Acc: {:.2}% ({}/{}) | skipped: {}",
            self.accuracy() * 100.0,
            self.correct,
            self.total_predictions,
            self.skipped
        )?;
        for (outcome, n) in &self.predicted {
            write!(f, " | predicted {}: {}", outcome, n)?;
        }
        Ok(())
    }
}

/// Run `model` over every labelled row of `table`.
///
/// Rows whose inputs are unknown are skipped under `reject`; a schema
/// mismatch aborts the evaluation.
pub fn evaluate<C: Classifier>(
    model: &C,
    table: &AugmentedTable,
    excluded: &[String],
    policy: ImputationPolicy,
) -> Result<Metrics> {
    let mut metrics = Metrics::new();

    for row in table.rows() {
        let actual = match row.record.outcome() {
            Some(outcome) => outcome,
            None => {
                metrics.skip();
                continue;
            }
        };

        let input = PredictionInput::from_augmented(row, excluded)?;
        let features = match input.to_model_row(model.feature_names(), policy) {
            Ok(features) => features,
            Err(FormError::AbsentValue(name)) => {
                log::debug!("Skipping row {}: {} unknown", row.source_row, name);
                metrics.skip();
                continue;
            }
            Err(e) => return Err(e),
        };

        metrics.record(model.predict(&features)?, actual);
    }

    log::info!("Evaluation: {}", metrics);
    Ok(metrics)
}
