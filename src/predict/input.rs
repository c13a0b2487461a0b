//! Model input assembly
//!
//! Combines fixture details, user-entered match statistics and both teams'
//! live form into the single row the classifier consumes.

use crate::features::{AugmentedMatch, FeatureVector};
use crate::{FormError, ImputationPolicy, MatchRecord, Result, TeamId};
use std::collections::BTreeMap;

/// Values entered by the user for the fixture being predicted
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchOverrides {
    /// Kickoff hour (24h)
    pub hour: Option<u8>,
    /// Day of week, 0 = Monday
    pub day_code: Option<u8>,
    /// Per-match statistics keyed by column name (`Total_shots_home`)
    pub stats: BTreeMap<String, f64>,
}

impl MatchOverrides {
    /// Start from the configured per-match statistics
    pub fn with_defaults(defaults: &BTreeMap<String, f64>) -> Self {
        MatchOverrides {
            stats: defaults.clone(),
            ..Default::default()
        }
    }

    /// Apply a `NAME=VALUE` argument, replacing any default for NAME
    pub fn set_stat(&mut self, arg: &str) -> Result<()> {
        let (name, value) = Self::parse_stat(arg)?;
        self.stats.insert(name, value);
        Ok(())
    }

    /// Parse a `NAME=VALUE` statistic override
    pub fn parse_stat(arg: &str) -> Result<(String, f64)> {
        let (name, value) = arg.split_once('=').ok_or_else(|| {
            FormError::InvalidInput(format!("expected NAME=VALUE, got '{}'", arg))
        })?;
        let value: f64 = value.trim().parse().map_err(|_| {
            FormError::InvalidInput(format!("invalid value for {}: '{}'", name, value))
        })?;
        if !value.is_finite() {
            return Err(FormError::InvalidInput(format!(
                "{} must be a finite number, got {}",
                name, value
            )));
        }
        Ok((name.trim().to_string(), value))
    }
}

/// One assembled prediction row, keyed by feature name
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionInput {
    features: FeatureVector,
}

impl PredictionInput {
    /// Assemble the input for an upcoming fixture.
    ///
    /// `home_form` must be the home team's home features and `away_form` the
    /// away team's away features; any name collision is a `DuplicateFeature`.
    pub fn assemble(
        home: TeamId,
        away: TeamId,
        overrides: &MatchOverrides,
        home_form: FeatureVector,
        away_form: FeatureVector,
        excluded: &[String],
    ) -> Result<Self> {
        let base = FeatureVector::from_entries(
            fixture_entries(home, away, overrides.hour, overrides.day_code).chain(
                overrides
                    .stats
                    .iter()
                    .map(|(name, value)| (name.clone(), Some(*value))),
            ),
        )?;

        let features = base.merge(home_form)?.merge(away_form)?.without(excluded);
        Ok(PredictionInput { features })
    }

    /// The input a played match would have produced, from its batch features
    pub fn from_augmented(row: &AugmentedMatch, excluded: &[String]) -> Result<Self> {
        let record = &row.record;
        let base = FeatureVector::from_entries(
            fixture_entries(record.home_team, record.away_team, record.hour, record.day_code)
                .chain(recorded_stats(record)),
        )?;

        let features = base.merge(row.features.clone())?.without(excluded);
        Ok(PredictionInput { features })
    }

    pub fn features(&self) -> &FeatureVector {
        &self.features
    }

    /// Lay the input out in the model's schema order.
    ///
    /// A schema name with no entry is fatal; entries with unknown values are
    /// handled by `policy`. Names outside the schema are ignored.
    pub fn to_model_row(&self, schema: &[String], policy: ImputationPolicy) -> Result<Vec<f64>> {
        schema
            .iter()
            .map(|name| match self.features.get(name) {
                None => Err(FormError::MissingFeature(name.clone())),
                Some(Some(value)) => Ok(value),
                Some(None) => match policy {
                    ImputationPolicy::Reject => Err(FormError::AbsentValue(name.clone())),
                    ImputationPolicy::Constant { fill } => {
                        log::warn!("Imputing absent {} with {}", name, fill);
                        Ok(fill)
                    }
                },
            })
            .collect()
    }
}

fn fixture_entries(
    home: TeamId,
    away: TeamId,
    hour: Option<u8>,
    day_code: Option<u8>,
) -> impl Iterator<Item = (String, Option<f64>)> {
    [
        ("home_team_code".to_string(), Some(home.0 as f64)),
        ("away_team_code".to_string(), Some(away.0 as f64)),
        ("hour".to_string(), hour.map(f64::from)),
        ("day_code".to_string(), day_code.map(f64::from)),
    ]
    .into_iter()
}

fn recorded_stats(record: &MatchRecord) -> impl Iterator<Item = (String, Option<f64>)> + '_ {
    record.stats.iter().map(|(name, value)| (name.clone(), *value))
}
