//! Serie A match prediction from rolling team form
//!
//! Computes causal per-team, per-venue rolling averages of match statistics,
//! both in bulk over a historical dataset and live for a single upcoming
//! fixture, and feeds them to a pre-trained classifier.

pub mod data;
pub mod features;
pub mod predict;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Unique identifier for a team (the dataset's team code)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TeamId(pub i64);

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Team({})", self.0)
    }
}

/// Whether a team is the home or away side of a fixture
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Venue {
    Home,
    Away,
}

impl Venue {
    pub const ALL: [Venue; 2] = [Venue::Home, Venue::Away];

    pub fn as_str(&self) -> &'static str {
        match self {
            Venue::Home => "home",
            Venue::Away => "away",
        }
    }

    /// Suffix used by per-side statistic columns (`Total_shots_home`)
    pub fn column_suffix(&self) -> &'static str {
        match self {
            Venue::Home => "_home",
            Venue::Away => "_away",
        }
    }
}

impl fmt::Display for Venue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Venue {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "home" => Ok(Venue::Home),
            "away" => Ok(Venue::Away),
            _ => Err(FormError::InvalidInput(format!(
                "Unknown venue: {}. Use home or away.",
                s
            ))),
        }
    }
}

/// Match outcome from the home side's perspective
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Outcome {
    HomeWin,
    Draw,
    AwayWin,
}

impl Outcome {
    /// Dataset label: 1 = home win, 0 = draw, -1 = away win
    pub fn from_label(label: i64) -> Option<Self> {
        match label {
            1 => Some(Outcome::HomeWin),
            0 => Some(Outcome::Draw),
            -1 => Some(Outcome::AwayWin),
            _ => None,
        }
    }

    pub fn label(&self) -> i64 {
        match self {
            Outcome::HomeWin => 1,
            Outcome::Draw => 0,
            Outcome::AwayWin => -1,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::HomeWin => write!(f, "Home Win"),
            Outcome::Draw => write!(f, "Draw"),
            Outcome::AwayWin => write!(f, "Away Win"),
        }
    }
}

/// A single played fixture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub date: NaiveDate,
    pub home_team: TeamId,
    pub away_team: TeamId,
    pub home_name: Option<String>,
    pub away_name: Option<String>,
    /// Kickoff hour (24h)
    pub hour: Option<u8>,
    /// Day of week, 0 = Monday
    pub day_code: Option<u8>,
    /// Result label: 1 = home win, 0 = draw, -1 = away win
    pub result: Option<i64>,
    /// Statistic columns keyed by name; `None` marks an absent value
    pub stats: BTreeMap<String, Option<f64>>,
}

impl MatchRecord {
    /// Team occupying the given venue role
    pub fn team_for(&self, venue: Venue) -> TeamId {
        match venue {
            Venue::Home => self.home_team,
            Venue::Away => self.away_team,
        }
    }

    /// Display name of the team occupying the given venue role
    pub fn name_for(&self, venue: Venue) -> Option<&str> {
        match venue {
            Venue::Home => self.home_name.as_deref(),
            Venue::Away => self.away_name.as_deref(),
        }
    }

    /// Whether `team` played this match in the `venue` role.
    ///
    /// This is the only "team T at venue V" predicate; batch and live feature
    /// computation must both select rows through it.
    pub fn played_at(&self, team: TeamId, venue: Venue) -> bool {
        self.team_for(venue) == team
    }

    /// Statistic value, or `None` when absent or not in the schema
    pub fn stat(&self, name: &str) -> Option<f64> {
        self.stats.get(name).copied().flatten()
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.result.and_then(Outcome::from_label)
    }
}

/// Application-wide errors
#[derive(Debug, Error)]
pub enum FormError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("No {venue} history for {team}; cannot estimate form")]
    UnknownTeam { team: TeamId, venue: Venue },

    #[error("Unknown team: {0}")]
    UnknownTeamName(String),

    #[error("Duplicate feature: {0}")]
    DuplicateFeature(String),

    #[error("Model input is missing feature: {0}")]
    MissingFeature(String),

    #[error("Feature {0} has no value and imputation is disabled")]
    AbsentValue(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, FormError>;

/// Application configuration loaded from config.toml
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub features: FeatureConfig,
    pub data: DataConfig,
    pub prediction: PredictionConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureConfig {
    /// Rolling window size (number of prior matches)
    pub window: usize,
    pub home_stats: Vec<String>,
    pub away_stats: Vec<String>,
    /// Feature names the model does not consume
    pub excluded_features: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    pub dataset_path: String,
    pub model_path: String,
    pub output_path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionConfig {
    /// Team whose win the CLI highlights
    pub focus_team: Option<String>,
    /// Per-match statistics assumed for a fixture unless given on the command line
    #[serde(default)]
    pub default_stats: BTreeMap<String, f64>,
    pub imputation: ImputationPolicy,
}

/// What to do when an absent statistic reaches the model input
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "lowercase")]
pub enum ImputationPolicy {
    Reject,
    Constant { fill: f64 },
}

/// Typical match statistics used as prediction inputs when none are given
const DEFAULT_MATCH_STATS: [(&str, f64); 12] = [
    ("Ball_possession_home", 0.5),
    ("Ball_possession_away", 0.5),
    ("Total_shots_home", 12.0),
    ("Total_shots_away", 10.0),
    ("Goalkeeper_saves_home", 3.0),
    ("Goalkeeper_saves_away", 3.0),
    ("Corner_kicks_home", 5.0),
    ("Corner_kicks_away", 5.0),
    ("Passes_home", 0.75),
    ("Passes_away", 0.75),
    ("Free_kicks_home", 15.0),
    ("Free_kicks_away", 15.0),
];

const DEFAULT_STATS: [&str; 6] = [
    "Ball_possession",
    "Total_shots",
    "Goalkeeper_saves",
    "Corner_kicks",
    "Passes",
    "Free_kicks",
];

impl Default for Config {
    fn default() -> Self {
        let stats_for = |venue: Venue| {
            DEFAULT_STATS
                .iter()
                .map(|s| format!("{}{}", s, venue.column_suffix()))
                .collect::<Vec<_>>()
        };

        let window = 7;

        Config {
            features: FeatureConfig {
                window,
                home_stats: stats_for(Venue::Home),
                away_stats: stats_for(Venue::Away),
                excluded_features: vec![
                    features::feature_name(Venue::Away, "Ball_possession_away", window),
                    "Ball_possession_away".to_string(),
                ],
            },
            data: DataConfig {
                dataset_path: "data/matches_processed.csv".to_string(),
                model_path: "model/serie_a_predictor.json".to_string(),
                output_path: "data/matches_rolling.csv".to_string(),
            },
            prediction: PredictionConfig {
                focus_team: Some("AC Milan".to_string()),
                default_stats: DEFAULT_MATCH_STATS
                    .iter()
                    .map(|&(name, value)| (name.to_string(), value))
                    .collect(),
                imputation: ImputationPolicy::Reject,
            },
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            FormError::Config(format!("Failed to read config file {}: {}", path, e))
        })?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| FormError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| FormError::Config(format!("Failed to serialize config: {}", e)))?;
        if let Some(parent) = std::path::Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.features.window == 0 {
            return Err(FormError::InvalidConfig(
                "rolling window must be positive".to_string(),
            ));
        }
        if self.features.home_stats.is_empty() || self.features.away_stats.is_empty() {
            return Err(FormError::InvalidConfig(
                "home_stats and away_stats must not be empty".to_string(),
            ));
        }
        // A rolling exclusion built for another window would never match
        for name in &self.features.excluded_features {
            let window = name
                .rsplit_once("_rolling_")
                .and_then(|(_, w)| w.parse::<usize>().ok());
            if let Some(window) = window.filter(|&w| w != self.features.window) {
                return Err(FormError::InvalidConfig(format!(
                    "excluded feature {} uses window {}, configured window is {}",
                    name, window, self.features.window
                )));
            }
        }
        if let Some((name, value)) = self
            .prediction
            .default_stats
            .iter()
            .find(|(_, v)| !v.is_finite())
        {
            return Err(FormError::InvalidConfig(format!(
                "default statistic {} must be finite, got {}",
                name, value
            )));
        }
        Ok(())
    }

    /// Statistic columns tracked for a venue role
    pub fn stats_for(&self, venue: Venue) -> &[String] {
        match venue {
            Venue::Home => &self.features.home_stats,
            Venue::Away => &self.features.away_stats,
        }
    }
}
