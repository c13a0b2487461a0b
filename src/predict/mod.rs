//! Prediction and evaluation
//!
//! Assemble model inputs from live form and run the pre-trained classifier.

pub mod inference;
pub mod input;
pub mod metrics;
pub mod model;

pub use inference::{format_prediction, Prediction, Predictor};
pub use input::{MatchOverrides, PredictionInput};
pub use metrics::{evaluate, Metrics};
pub use model::{Classifier, LinearModel};
