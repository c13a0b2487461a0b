// End-to-end: CSV dataset -> batch features -> live features -> prediction

use seriea::data::read_matches;
use seriea::features::{
    compute_rolling_features, feature_name, resolve_live_feature, resolve_live_features_before,
};
use seriea::predict::{evaluate, LinearModel, MatchOverrides, Predictor};
use seriea::{Config, FormError, ImputationPolicy, Outcome, Venue};

const DATASET: &str = "\
date,home_team,away_team,home_team_code,away_team_code,hour,day_code,result,Ball_possession_home,Total_shots_home,Total_shots_away,Corner_kicks_home,Corner_kicks_away
2023-08-19,AC Milan,Bologna,0,1,20,5,1,61%,18,7,8,2
2023-08-20,Inter,Monza,2,3,18,6,1,66%,22,5,9,1
2023-08-26,Bologna,Inter,1,2,20,5,-1,44%,9,15,3,6
2023-08-27,Monza,AC Milan,3,0,20,6,-1,39%,6,17,2,7
2023-09-02,AC Milan,Inter,0,2,18,5,0,52%,13,12,5,5
2023-09-03,Monza,Bologna,3,1,15,6,0,48%,,10,4,4
2023-09-16,Inter,AC Milan,2,0,18,5,1,55%,16,11,6,4
2023-09-17,Bologna,Monza,1,3,15,6,1,57%,14,8,7,3
2023-09-23,AC Milan,Monza,0,3,20,5,1,63%,21,6,10,2
2023-09-24,Inter,Bologna,2,1,20,6,1,60%,19,9,8,3
";

fn stats(venue: Venue) -> Vec<String> {
    ["Total_shots", "Corner_kicks"]
        .iter()
        .map(|s| format!("{}{}", s, venue.column_suffix()))
        .collect()
}

fn config() -> Config {
    let mut config = Config::default();
    config.features.window = 2;
    config.features.home_stats = stats(Venue::Home);
    config.features.away_stats = stats(Venue::Away);
    config.features.excluded_features = vec!["Ball_possession_away".to_string()];
    config
}

fn model() -> LinearModel {
    let w = config().features.window;
    LinearModel {
        feature_names: vec![
            "hour".to_string(),
            feature_name(Venue::Home, "Total_shots_home", w),
            feature_name(Venue::Away, "Total_shots_away", w),
        ],
        classes: vec![1, 0, -1],
        coefficients: vec![vec![0.0, 1.0, -1.0], vec![0.0, 0.0, 0.0], vec![0.0, -1.0, 1.0]],
        intercepts: vec![-1.0, 0.0, -1.0],
    }
}

#[test]
fn batch_and_live_agree_on_every_played_match() {
    let table = read_matches(DATASET.as_bytes()).unwrap();
    let config = config();
    let augmented = compute_rolling_features(
        &table,
        &config.features.home_stats,
        &config.features.away_stats,
        config.features.window,
    )
    .unwrap();

    assert_eq!(augmented.len(), table.len());

    for (row, record) in table.rows().iter().enumerate() {
        let batch = augmented.feature_at(row).unwrap();
        for venue in Venue::ALL {
            let team = record.team_for(venue);
            let stat_names = config.stats_for(venue);
            match resolve_live_features_before(&table, row, team, venue, stat_names, config.features.window) {
                Ok(live) => {
                    for (name, value) in live.iter() {
                        assert_eq!(batch.get(name), Some(value), "row {} feature {}", row, name);
                    }
                }
                Err(FormError::UnknownTeam { .. }) => {
                    for stat in stat_names {
                        let name = feature_name(venue, stat, config.features.window);
                        assert_eq!(batch.get(&name), Some(None), "row {} feature {}", row, name);
                    }
                }
                Err(e) => panic!("row {}: {}", row, e),
            }
        }
    }
}

#[test]
fn absent_cells_do_not_become_zero() {
    let table = read_matches(DATASET.as_bytes()).unwrap();
    let monza = table.find_team("Monza").unwrap();

    // Monza home shots: 6, then absent
    let form = resolve_live_feature(&table, monza, Venue::Home, &stats(Venue::Home), 2).unwrap();
    assert_eq!(form.value("home_Total_shots_home_rolling_2"), Some(6.0));
}

#[test]
fn predicts_from_current_form() {
    let table = read_matches(DATASET.as_bytes())
        .unwrap()
        .with_complement("Ball_possession_away", "Ball_possession_home")
        .unwrap();
    let predictor = Predictor::new(table, config(), model()).unwrap();

    let overrides = MatchOverrides {
        hour: Some(20),
        day_code: Some(5),
        stats: [("Ball_possession_away".to_string(), 0.4)].into_iter().collect(),
    };

    // Milan home shots (13 + 21) / 2 = 17 vs Bologna away (10 + 9) / 2 = 9.5
    let prediction = predictor.predict("AC Milan", "Bologna", &overrides).unwrap();
    assert_eq!(prediction.outcome, Outcome::HomeWin);
    assert!(prediction.team_wins("ac milan"));
    assert!(!prediction.features.contains("Ball_possession_away"));

    // Inter home shots (16 + 19) / 2 = 17.5 vs Monza away (8 + 6) / 2 = 7
    let prediction = predictor.predict("Inter", "Monza", &overrides).unwrap();
    assert_eq!(prediction.outcome, Outcome::HomeWin);
}

#[test]
fn evaluation_skips_rows_without_form() {
    let table = read_matches(DATASET.as_bytes()).unwrap();
    let config = config();
    let augmented = compute_rolling_features(
        &table,
        &config.features.home_stats,
        &config.features.away_stats,
        config.features.window,
    )
    .unwrap();

    let metrics = evaluate(&model(), &augmented, &[], ImputationPolicy::Reject).unwrap();
    assert_eq!(metrics.total_predictions + metrics.skipped, table.len());
    assert!(metrics.skipped > 0);

    let imputed = evaluate(
        &model(),
        &augmented,
        &[],
        ImputationPolicy::Constant { fill: 10.0 },
    )
    .unwrap();
    assert_eq!(imputed.total_predictions, table.len());
}
