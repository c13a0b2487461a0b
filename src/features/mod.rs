//! Rolling team-form features
//!
//! Batch features for the historical dataset and live features for a single
//! upcoming fixture, both built on the same windowed mean.

pub mod live;
pub mod naming;
pub mod rolling;
pub mod window;

pub use live::{resolve_live_feature, resolve_live_features_before};
pub use naming::{feature_name, feature_names, FeatureVector};
pub use rolling::{compute_rolling_features, AugmentedMatch, AugmentedTable, RollingFeatureEngine};

use crate::data::MatchTable;
use crate::{FormError, Result};

/// Checks shared by batch and live requests
fn validate_request(table: &MatchTable, stat_names: &[String], window: usize) -> Result<()> {
    if window == 0 {
        return Err(FormError::InvalidConfig(
            "rolling window must be positive".to_string(),
        ));
    }
    if stat_names.is_empty() {
        return Err(FormError::InvalidConfig(
            "statistic list must not be empty".to_string(),
        ));
    }
    table.require_columns(stat_names)
}
