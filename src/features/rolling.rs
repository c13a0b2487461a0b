//! Batch rolling features
//!
//! Attaches causal trailing averages to every row of the historical dataset,
//! per team, per venue role and per statistic.

use super::naming::{feature_name, FeatureVector};
use super::validate_request;
use super::window::shifted_means;
use crate::data::MatchTable;
use crate::{FeatureConfig, FormError, MatchRecord, Result, Venue};

/// A match row together with the rolling features attached to it
#[derive(Debug, Clone, PartialEq)]
pub struct AugmentedMatch {
    /// Position of the row in the input table
    pub source_row: usize,
    pub record: MatchRecord,
    pub features: FeatureVector,
}

/// The input table plus one rolling column per (venue, statistic)
#[derive(Debug, Clone, PartialEq)]
pub struct AugmentedTable {
    window: usize,
    stat_columns: Vec<String>,
    feature_columns: Vec<String>,
    /// Chronological, ties in input order
    rows: Vec<AugmentedMatch>,
    /// source_row -> position in `rows`
    positions: Vec<usize>,
}

impl AugmentedTable {
    pub fn window(&self) -> usize {
        self.window
    }

    pub fn stat_columns(&self) -> &[String] {
        &self.stat_columns
    }

    /// Rolling columns: home statistics first, then away, in configured order
    pub fn feature_columns(&self) -> &[String] {
        &self.feature_columns
    }

    /// Rows in chronological order; re-sort before relying on another order
    pub fn rows(&self) -> &[AugmentedMatch] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Features attached to the input row `source_row`
    pub fn feature_at(&self, source_row: usize) -> Option<&FeatureVector> {
        self.positions
            .get(source_row)
            .map(|&pos| &self.rows[pos].features)
    }
}

/// Batch rolling-feature computation
#[derive(Debug, Clone)]
pub struct RollingFeatureEngine {
    home_stats: Vec<String>,
    away_stats: Vec<String>,
    window: usize,
}

impl RollingFeatureEngine {
    pub fn new(home_stats: Vec<String>, away_stats: Vec<String>, window: usize) -> Result<Self> {
        for stats in [&home_stats, &away_stats] {
            if stats.is_empty() {
                return Err(FormError::InvalidConfig(
                    "statistic list must not be empty".to_string(),
                ));
            }
        }
        if window == 0 {
            return Err(FormError::InvalidConfig(
                "rolling window must be positive".to_string(),
            ));
        }
        Ok(RollingFeatureEngine {
            home_stats,
            away_stats,
            window,
        })
    }

    pub fn from_config(config: &FeatureConfig) -> Result<Self> {
        Self::new(
            config.home_stats.clone(),
            config.away_stats.clone(),
            config.window,
        )
    }

    fn stats_for(&self, venue: Venue) -> &[String] {
        match venue {
            Venue::Home => &self.home_stats,
            Venue::Away => &self.away_stats,
        }
    }

    /// Compute rolling features for every row of `table`
    pub fn compute(&self, table: &MatchTable) -> Result<AugmentedTable> {
        if table.is_empty() {
            return Err(FormError::InvalidInput(
                "cannot compute rolling features over an empty table".to_string(),
            ));
        }
        for venue in Venue::ALL {
            validate_request(table, self.stats_for(venue), self.window)?;
        }

        let mut per_row: Vec<Vec<(String, Option<f64>)>> = vec![Vec::new(); table.len()];
        let mut feature_columns = Vec::new();

        for venue in Venue::ALL {
            let stats = self.stats_for(venue);
            let teams = table.teams_at(venue);
            log::debug!(
                "Computing {} rolling features over {} team partitions",
                venue,
                teams.len()
            );

            for stat in stats {
                let name = feature_name(venue, stat, self.window);

                for &team in &teams {
                    let history = table.venue_history(team, venue);
                    let values: Vec<Option<f64>> =
                        history.iter().map(|&i| table.rows()[i].stat(stat)).collect();
                    let means = shifted_means(&values, self.window);

                    for (&row, mean) in history.iter().zip(means) {
                        per_row[row].push((name.clone(), mean));
                    }
                }

                feature_columns.push(name);
            }
        }

        let order = table.chronological_order();
        let mut positions = vec![0; table.len()];
        let mut slots: Vec<Option<Vec<(String, Option<f64>)>>> =
            per_row.into_iter().map(Some).collect();
        let mut rows = Vec::with_capacity(table.len());

        for (pos, &source_row) in order.iter().enumerate() {
            positions[source_row] = pos;
            let entries = slots[source_row].take().unwrap_or_default();
            rows.push(AugmentedMatch {
                source_row,
                record: table.rows()[source_row].clone(),
                features: FeatureVector::from_entries(entries)?,
            });
        }

        log::info!(
            "Computed {} rolling features (window {}) for {} matches",
            feature_columns.len(),
            self.window,
            rows.len()
        );

        Ok(AugmentedTable {
            window: self.window,
            stat_columns: table.stat_columns().to_vec(),
            feature_columns,
            rows,
            positions,
        })
    }
}

/// Attach `<venue>_<stat>_rolling_<window>` columns to every match.
///
/// The value at a row is the mean over the team's previous `window` matches
/// in the same venue role, never including the row itself.
///
/// "Previous" is (date, input position) order. When a team plays twice in
/// the same role on one date, the earlier input row is history for the later
/// one, so reordering such rows changes their values.
pub fn compute_rolling_features(
    matches: &MatchTable,
    home_stat_names: &[String],
    away_stat_names: &[String],
    window: usize,
) -> Result<AugmentedTable> {
    RollingFeatureEngine::new(home_stat_names.to_vec(), away_stat_names.to_vec(), window)?
        .compute(matches)
}
