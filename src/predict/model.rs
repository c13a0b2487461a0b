//! Pre-trained classifier interface

use crate::{FormError, Outcome, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// An already-trained outcome classifier
pub trait Classifier {
    /// Ordered input schema the model was trained on
    fn feature_names(&self) -> &[String];

    /// Predict an outcome from a row laid out as `feature_names()`
    fn predict(&self, row: &[f64]) -> Result<Outcome>;
}

/// Linear one-vs-rest classifier exported from the training notebook.
///
/// Each class scores `intercept + coefficients · row`; the highest score wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub feature_names: Vec<String>,
    /// Class labels (1 home win, 0 draw, -1 away win)
    pub classes: Vec<i64>,
    pub coefficients: Vec<Vec<f64>>,
    pub intercepts: Vec<f64>,
}

impl LinearModel {
    /// Load a model exported as JSON
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            FormError::Model(format!("Failed to read model {}: {}", path.display(), e))
        })?;
        let model: LinearModel = serde_json::from_str(&content)?;
        model.validate()?;
        log::info!(
            "Loaded model with {} classes over {} features from {}",
            model.classes.len(),
            model.feature_names.len(),
            path.display()
        );
        Ok(model)
    }

    pub fn validate(&self) -> Result<()> {
        if self.classes.is_empty() {
            return Err(FormError::Model("model has no classes".to_string()));
        }
        if self.coefficients.len() != self.classes.len() || self.intercepts.len() != self.classes.len() {
            return Err(FormError::Model(format!(
                "expected {} coefficient rows and intercepts, got {} and {}",
                self.classes.len(),
                self.coefficients.len(),
                self.intercepts.len()
            )));
        }
        if let Some(row) = self
            .coefficients
            .iter()
            .find(|c| c.len() != self.feature_names.len())
        {
            return Err(FormError::Model(format!(
                "coefficient row has {} weights for {} features",
                row.len(),
                self.feature_names.len()
            )));
        }
        if let Some(label) = self.classes.iter().find(|&&c| Outcome::from_label(c).is_none()) {
            return Err(FormError::Model(format!("unknown class label {}", label)));
        }
        Ok(())
    }
}

impl Classifier for LinearModel {
    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn predict(&self, row: &[f64]) -> Result<Outcome> {
        if row.len() != self.feature_names.len() {
            return Err(FormError::Model(format!(
                "expected {} inputs, got {}",
                self.feature_names.len(),
                row.len()
            )));
        }
        if let Some((name, x)) = self
            .feature_names
            .iter()
            .zip(row)
            .find(|(_, x)| !x.is_finite())
        {
            return Err(FormError::Model(format!("input {} is not finite: {}", name, x)));
        }

        let mut best: Option<(i64, f64)> = None;
        for ((&label, weights), &intercept) in self
            .classes
            .iter()
            .zip(&self.coefficients)
            .zip(&self.intercepts)
        {
            let score = intercept + weights.iter().zip(row).map(|(w, x)| w * x).sum::<f64>();
            if !score.is_finite() {
                return Err(FormError::Model(format!(
                    "class {} scored {}",
                    label, score
                )));
            }
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((label, score));
            }
        }

        best.and_then(|(label, _)| Outcome::from_label(label))
            .ok_or_else(|| FormError::Model("model produced no prediction".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> LinearModel {
        LinearModel {
            feature_names: vec!["home_form".to_string(), "away_form".to_string()],
            classes: vec![-1, 1],
            coefficients: vec![vec![-1.0, 1.0], vec![1.0, -1.0]],
            intercepts: vec![0.0, 0.1],
        }
    }

    #[test]
    fn test_predict() {
        let m = model();
        assert_eq!(m.predict(&[5.0, 2.0]).unwrap(), Outcome::HomeWin);
        assert_eq!(m.predict(&[2.0, 5.0]).unwrap(), Outcome::AwayWin);
        // Tie broken by the intercept
        assert_eq!(m.predict(&[3.0, 3.0]).unwrap(), Outcome::HomeWin);
    }

    #[test]
    fn test_wrong_input_length() {
        assert!(matches!(model().predict(&[1.0]), Err(FormError::Model(_))));
    }

    #[test]
    fn test_non_finite_input_or_score() {
        let m = model();
        assert!(matches!(m.predict(&[f64::NAN, 2.0]), Err(FormError::Model(_))));
        assert!(matches!(m.predict(&[1.0, f64::INFINITY]), Err(FormError::Model(_))));

        // Finite inputs whose weighted sum overflows
        let mut huge = model();
        huge.coefficients[1] = vec![f64::MAX, f64::MAX];
        assert!(matches!(huge.predict(&[2.0, 2.0]), Err(FormError::Model(_))));
    }

    #[test]
    fn test_validate() {
        assert!(model().validate().is_ok());

        let mut bad = model();
        bad.coefficients[0].pop();
        assert!(bad.validate().is_err());

        let mut bad = model();
        bad.classes[0] = 7;
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_json_roundtrip() {
        let json = serde_json::to_string(&model()).unwrap();
        let parsed: LinearModel = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, model());
    }
}
