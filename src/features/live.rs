//! Live rolling features
//!
//! Current form of one team in one venue role going into its next, unplayed
//! match.

use super::naming::{feature_name, FeatureVector};
use super::validate_request;
use super::window::tail_mean;
use crate::data::MatchTable;
use crate::{FormError, Result, TeamId, Venue};

/// Rolling features for `team` in the `venue` role as of now.
///
/// Every row in `matches` is treated as already played, so the latest
/// `window` matches are used as-is with no shift. For a played match M this
/// equals the batch value attached to M when `matches` is the history
/// before M.
pub fn resolve_live_feature(
    matches: &MatchTable,
    team_id: TeamId,
    venue: Venue,
    stat_names: &[String],
    window: usize,
) -> Result<FeatureVector> {
    validate_request(matches, stat_names, window)?;

    let history = matches.venue_history(team_id, venue);
    if history.is_empty() {
        return Err(FormError::UnknownTeam {
            team: team_id,
            venue,
        });
    }

    log::debug!(
        "Resolving {} form for {} from {} matches",
        venue,
        team_id,
        history.len()
    );

    FeatureVector::from_entries(stat_names.iter().map(|stat| {
        let values: Vec<Option<f64>> = history
            .iter()
            .map(|&i| matches.rows()[i].stat(stat))
            .collect();
        (feature_name(venue, stat, window), tail_mean(&values, window))
    }))
}

/// Live features using only the history before input row `row`.
///
/// Same-date rows earlier in the input are included, matching the batch
/// engine's ordering.
pub fn resolve_live_features_before(
    matches: &MatchTable,
    row: usize,
    team_id: TeamId,
    venue: Venue,
    stat_names: &[String],
    window: usize,
) -> Result<FeatureVector> {
    let history = matches.rows_before(row)?;
    resolve_live_feature(&history, team_id, venue, stat_names, window)
}
