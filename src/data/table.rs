//! In-memory match table
//!
//! An immutable, schema-checked snapshot of the historical dataset that both
//! feature components read from.

use crate::{FormError, MatchRecord, Result, TeamId, Venue};
use std::collections::BTreeMap;

/// Validated collection of match records sharing one statistic schema
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchTable {
    rows: Vec<MatchRecord>,
    stat_columns: Vec<String>,
}

impl MatchTable {
    /// Build a table, taking the statistic schema from the first row.
    ///
    /// Every row must carry exactly the same statistic columns.
    pub fn new(rows: Vec<MatchRecord>) -> Result<Self> {
        let stat_columns: Vec<String> = rows
            .first()
            .map(|r| r.stats.keys().cloned().collect())
            .unwrap_or_default();
        Self::with_columns(rows, stat_columns)
    }

    /// Build a table with an explicit statistic schema (kept even when empty)
    pub fn with_columns(rows: Vec<MatchRecord>, stat_columns: Vec<String>) -> Result<Self> {
        for (i, row) in rows.iter().enumerate() {
            let same_schema = row.stats.len() == stat_columns.len()
                && stat_columns.iter().all(|c| row.stats.contains_key(c));
            if !same_schema {
                return Err(FormError::InvalidInput(format!(
                    "row {} ({} {} vs {}) does not match the statistic schema",
                    i, row.date, row.home_team, row.away_team
                )));
            }
        }
        Ok(MatchTable { rows, stat_columns })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[MatchRecord] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&MatchRecord> {
        self.rows.get(index)
    }

    pub fn stat_columns(&self) -> &[String] {
        &self.stat_columns
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.stat_columns.iter().any(|c| c == name)
    }

    /// Fail with `UnknownColumn` for the first name not in the schema
    pub fn require_columns(&self, names: &[String]) -> Result<()> {
        match names.iter().find(|n| !self.has_column(n)) {
            Some(missing) => Err(FormError::UnknownColumn(missing.clone())),
            None => Ok(()),
        }
    }

    /// Row indices ordered by date, ties kept in input order
    pub fn chronological_order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.rows.len()).collect();
        order.sort_by_key(|&i| self.rows[i].date);
        order
    }

    /// Indices of the rows `team` played in the `venue` role, in
    /// chronological order (stable on input position).
    pub fn venue_history(&self, team: TeamId, venue: Venue) -> Vec<usize> {
        let mut history: Vec<usize> = self
            .rows
            .iter()
            .enumerate()
            .filter(|(_, r)| r.played_at(team, venue))
            .map(|(i, _)| i)
            .collect();
        history.sort_by_key(|&i| self.rows[i].date);
        history
    }

    /// Distinct teams that appear in the `venue` role, ascending
    pub fn teams_at(&self, venue: Venue) -> Vec<TeamId> {
        let mut teams: Vec<TeamId> = self.rows.iter().map(|r| r.team_for(venue)).collect();
        teams.sort();
        teams.dedup();
        teams
    }

    /// Team directory: code -> display name (first name seen wins)
    pub fn teams(&self) -> BTreeMap<TeamId, String> {
        let mut teams = BTreeMap::new();
        for row in &self.rows {
            for venue in Venue::ALL {
                if let Some(name) = row.name_for(venue) {
                    teams
                        .entry(row.team_for(venue))
                        .or_insert_with(|| name.to_string());
                }
            }
        }
        teams
    }

    /// Look up a team code by display name (case-insensitive)
    pub fn find_team(&self, name: &str) -> Option<TeamId> {
        let name_lower = name.trim().to_lowercase();
        self.teams()
            .into_iter()
            .find(|(_, n)| n.to_lowercase() == name_lower)
            .map(|(id, _)| id)
    }

    /// Rows strictly earlier than row `index` in (date, input position)
    /// order: the history available before that match was played.
    ///
    /// Matches on the same date as row `index` but earlier in the input count
    /// as history. The dataset carries no kickoff order within a day, so
    /// same-day fixtures of one team depend on input order.
    pub fn rows_before(&self, index: usize) -> Result<MatchTable> {
        let target = self.rows.get(index).ok_or_else(|| {
            FormError::InvalidInput(format!(
                "row {} out of range for table of {} rows",
                index,
                self.rows.len()
            ))
        })?;

        let rows = self
            .rows
            .iter()
            .enumerate()
            .filter(|(i, r)| (r.date, *i) < (target.date, index))
            .map(|(_, r)| r.clone())
            .collect();

        Ok(MatchTable {
            rows,
            stat_columns: self.stat_columns.clone(),
        })
    }

    /// Derive `target` as `1 - source` when the dataset lacks it.
    ///
    /// Scraped data sometimes only carries one side's possession share.
    pub fn with_complement(mut self, target: &str, source: &str) -> Result<MatchTable> {
        if self.has_column(target) {
            return Ok(self);
        }
        if !self.has_column(source) {
            return Err(FormError::UnknownColumn(source.to_string()));
        }

        for row in &mut self.rows {
            let value = row.stat(source).map(|v| 1.0 - v);
            row.stats.insert(target.to_string(), value);
        }
        self.stat_columns.push(target.to_string());
        log::debug!("Derived column {} from {}", target, source);
        Ok(self)
    }
}
