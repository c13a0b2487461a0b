//! Single-match prediction

use crate::data::MatchTable;
use crate::features::{resolve_live_feature, FeatureVector};
use crate::predict::input::{MatchOverrides, PredictionInput};
use crate::predict::model::Classifier;
use crate::{Config, FormError, Outcome, Result, TeamId, Venue};
use serde::Serialize;

/// Model prediction output
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub home_team: TeamId,
    pub away_team: TeamId,
    pub home_name: String,
    pub away_name: String,
    pub outcome: Outcome,
    /// Features the model was given, by name
    pub features: FeatureVector,
}

impl Prediction {
    /// Name of the predicted winner, or None for a draw
    pub fn predicted_winner(&self) -> Option<&str> {
        match self.outcome {
            Outcome::HomeWin => Some(self.home_name.as_str()),
            Outcome::AwayWin => Some(self.away_name.as_str()),
            Outcome::Draw => None,
        }
    }

    /// Whether the named team is predicted to win
    pub fn team_wins(&self, name: &str) -> bool {
        self.predicted_winner()
            .map_or(false, |winner| winner.eq_ignore_ascii_case(name.trim()))
    }
}

/// Predictor for making match predictions
pub struct Predictor<C: Classifier> {
    table: MatchTable,
    config: Config,
    model: C,
}

impl<C: Classifier> Predictor<C> {
    /// Create a new predictor over a historical table
    pub fn new(table: MatchTable, config: Config, model: C) -> Result<Self> {
        config.validate()?;
        for venue in Venue::ALL {
            table.require_columns(config.stats_for(venue))?;
        }
        Ok(Predictor {
            table,
            config,
            model,
        })
    }

    pub fn table(&self) -> &MatchTable {
        &self.table
    }

    pub fn model(&self) -> &C {
        &self.model
    }

    /// Current rolling form of a team in a venue role
    pub fn team_form(&self, team: TeamId, venue: Venue) -> Result<FeatureVector> {
        resolve_live_feature(
            &self.table,
            team,
            venue,
            self.config.stats_for(venue),
            self.config.features.window,
        )
    }

    /// Predict a single match by team names
    pub fn predict(
        &self,
        home_team: &str,
        away_team: &str,
        overrides: &MatchOverrides,
    ) -> Result<Prediction> {
        let home = self
            .table
            .find_team(home_team)
            .ok_or_else(|| FormError::UnknownTeamName(home_team.to_string()))?;
        let away = self
            .table
            .find_team(away_team)
            .ok_or_else(|| FormError::UnknownTeamName(away_team.to_string()))?;

        self.predict_teams(home, away, overrides)
    }

    /// Predict a match between two teams
    pub fn predict_teams(
        &self,
        home: TeamId,
        away: TeamId,
        overrides: &MatchOverrides,
    ) -> Result<Prediction> {
        if home == away {
            return Err(FormError::InvalidInput(format!(
                "{} cannot play itself",
                home
            )));
        }

        let home_form = self.team_form(home, Venue::Home)?;
        let away_form = self.team_form(away, Venue::Away)?;

        let input = PredictionInput::assemble(
            home,
            away,
            overrides,
            home_form,
            away_form,
            &self.config.features.excluded_features,
        )?;
        let row = input.to_model_row(self.model.feature_names(), self.config.prediction.imputation)?;
        let outcome = self.model.predict(&row)?;

        let teams = self.table.teams();
        let name_of = |id: TeamId| teams.get(&id).cloned().unwrap_or_else(|| id.to_string());

        log::debug!("Predicted {} for {} vs {}", outcome, home, away);

        Ok(Prediction {
            home_team: home,
            away_team: away,
            home_name: name_of(home),
            away_name: name_of(away),
            outcome,
            features: input.features().clone(),
        })
    }
}

/// Format a prediction for display
pub fn format_prediction(pred: &Prediction) -> String {
    let verdict = match pred.predicted_winner() {
        Some(winner) => format!("{} ({})", pred.outcome, winner),
        None => pred.outcome.to_string(),
    };

    let mut form = String::new();
    for (name, value) in pred.features.iter().filter(|(n, _)| n.contains("_rolling_")) {
        let value = value.map_or_else(|| "unknown".to_string(), |v| format!("{:.2}", v));
        form.push_str(&format!("│    {:<40} {}\n", name, value));
    }

    format!(
        r#"
┌─────────────────────────────────────────────────┐
│  {} vs {}
├─────────────────────────────────────────────────┤
│  Prediction:  {}
│  Rolling form:
{}└─────────────────────────────────────────────────┘
"#,
        pred.home_name, pred.away_name, verdict, form
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predict::model::LinearModel;
    use crate::MatchRecord;
    use chrono::{Duration, NaiveDate};
    use std::collections::BTreeMap;

    fn make_match(day: i64, home: (i64, &str), away: (i64, &str), shots: (f64, f64)) -> MatchRecord {
        MatchRecord {
            date: NaiveDate::from_ymd_opt(2023, 8, 1).unwrap() + Duration::days(day),
            home_team: TeamId(home.0),
            away_team: TeamId(away.0),
            home_name: Some(home.1.to_string()),
            away_name: Some(away.1.to_string()),
            hour: Some(20),
            day_code: Some(5),
            result: Some(1),
            stats: BTreeMap::from([
                ("Total_shots_home".to_string(), Some(shots.0)),
                ("Total_shots_away".to_string(), Some(shots.1)),
            ]),
        }
    }

    const MILAN: (i64, &str) = (0, "AC Milan");
    const INTER: (i64, &str) = (1, "Inter");
    const ROMA: (i64, &str) = (2, "Roma");

    fn config() -> Config {
        let mut config = Config::default();
        config.features.window = 2;
        config.features.home_stats = vec!["Total_shots_home".to_string()];
        config.features.away_stats = vec!["Total_shots_away".to_string()];
        config.features.excluded_features = vec![];
        config
    }

    /// Home win when the home side's shot form beats the away side's
    fn model() -> LinearModel {
        let names = vec![
            "home_Total_shots_home_rolling_2".to_string(),
            "away_Total_shots_away_rolling_2".to_string(),
        ];
        LinearModel {
            feature_names: names,
            classes: vec![1, -1],
            coefficients: vec![vec![1.0, -1.0], vec![-1.0, 1.0]],
            intercepts: vec![0.0, 0.0],
        }
    }

    fn predictor() -> Predictor<LinearModel> {
        let table = MatchTable::new(vec![
            make_match(0, MILAN, INTER, (16.0, 6.0)),
            make_match(7, INTER, ROMA, (9.0, 12.0)),
            make_match(14, ROMA, MILAN, (8.0, 14.0)),
            make_match(21, MILAN, ROMA, (18.0, 7.0)),
        ])
        .unwrap();
        Predictor::new(table, config(), model()).unwrap()
    }

    #[test]
    fn test_predict_by_name() {
        let p = predictor();
        let pred = p.predict("ac milan", "Roma", &MatchOverrides::default()).unwrap();

        // Milan home form (16 + 18) / 2 = 17 vs Roma away form (12 + 7) / 2
        assert_eq!(pred.outcome, Outcome::HomeWin);
        assert_eq!(pred.home_name, "AC Milan");
        assert!(pred.team_wins("AC Milan"));
        assert!(!pred.team_wins("Roma"));
        assert_eq!(pred.features.value("home_Total_shots_home_rolling_2"), Some(17.0));
    }

    #[test]
    fn test_predict_away_win() {
        let p = predictor();
        // Inter home form 9 vs Milan away form 14
        let pred = p.predict("Inter", "AC Milan", &MatchOverrides::default()).unwrap();
        assert_eq!(pred.outcome, Outcome::AwayWin);
        assert_eq!(pred.predicted_winner(), Some("AC Milan"));
    }

    #[test]
    fn test_unknown_names_and_history() {
        let p = predictor();
        assert!(matches!(
            p.predict("Lazio", "Roma", &MatchOverrides::default()),
            Err(FormError::UnknownTeamName(_))
        ));
        assert!(matches!(
            p.predict("Roma", "Roma", &MatchOverrides::default()),
            Err(FormError::InvalidInput(_))
        ));
        // Inter has never hosted a match
        let table = MatchTable::new(vec![make_match(0, MILAN, INTER, (1.0, 1.0))]).unwrap();
        let p = Predictor::new(table, config(), model()).unwrap();
        match p.predict("Inter", "AC Milan", &MatchOverrides::default()) {
            Err(FormError::UnknownTeam { team, venue }) => {
                assert_eq!(team, TeamId(1));
                assert_eq!(venue, Venue::Home);
            }
            other => panic!("expected UnknownTeam, got {:?}", other),
        }
    }

    #[test]
    fn test_model_schema_mismatch() {
        let mut m = model();
        m.feature_names[1] = "away_Total_shots_rolling_2".to_string();
        let p = Predictor::new(predictor().table().clone(), config(), m).unwrap();
        assert!(matches!(
            p.predict("AC Milan", "Roma", &MatchOverrides::default()),
            Err(FormError::MissingFeature(_))
        ));
    }

    #[test]
    fn test_new_rejects_unknown_columns() {
        let mut cfg = config();
        cfg.features.home_stats = vec!["Corner_kicks_home".to_string()];
        let result = Predictor::new(predictor().table().clone(), cfg, model());
        assert!(matches!(result, Err(FormError::UnknownColumn(_))));
    }

    #[test]
    fn test_format_prediction() {
        let p = predictor();
        let pred = p.predict("AC Milan", "Roma", &MatchOverrides::default()).unwrap();
        let text = format_prediction(&pred);
        assert!(text.contains("AC Milan vs Roma"));
        assert!(text.contains("Home Win (AC Milan)"));
        assert!(text.contains("home_Total_shots_home_rolling_2"));
    }
}
