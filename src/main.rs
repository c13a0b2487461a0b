//! Serie A Predictor CLI
//!
//! Rolling team-form features and single-match predictions.

use clap::{Parser, Subcommand};
use seriea::{Config, Result, Venue};

#[derive(Parser)]
#[command(name = "seriea")]
#[command(about = "Serie A match prediction from rolling team form", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new project with default config
    Init,
    /// List teams in the dataset
    Teams,
    /// Compute rolling features for the whole dataset
    Features {
        /// Output CSV (defaults to data.output_path)
        #[arg(long)]
        output: Option<String>,
    },
    /// Show a team's current rolling form
    Form {
        /// Team name
        team: String,
        /// Venue role: home or away
        #[arg(long, default_value = "home")]
        venue: Venue,
    },
    /// Predict a match outcome
    Predict {
        /// Home team name
        home: String,
        /// Away team name
        away: String,
        /// Kickoff hour (24h)
        #[arg(long, default_value = "20")]
        hour: u8,
        /// Day of week, 0 = Monday
        #[arg(long, default_value = "5")]
        day: u8,
        /// Match statistic as NAME=VALUE, overriding prediction.default_stats (repeatable)
        #[arg(long = "stat")]
        stats: Vec<String>,
        /// Output format
        #[arg(long, default_value = "table")]
        format: OutputFormat,
    },
    /// Score the model against the labelled dataset
    Evaluate,
}

#[derive(Clone, Debug)]
enum OutputFormat {
    Table,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}. Use table or json.", s)),
        }
    }
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Load or create config
    let config = if std::path::Path::new(&cli.config).exists() {
        match Config::load(&cli.config) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        Config::default()
    };

    let result = match cli.command {
        Commands::Init => commands::init(&cli.config),
        Commands::Teams => commands::teams(&config),
        Commands::Features { output } => commands::features(&config, output),
        Commands::Form { team, venue } => commands::form(&config, &team, venue),
        Commands::Predict {
            home,
            away,
            hour,
            day,
            stats,
            format,
        } => commands::predict(&config, &home, &away, hour, day, &stats, format),
        Commands::Evaluate => commands::evaluate(&config),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

mod commands {
    use super::*;
    use seriea::data::{load_matches, save_augmented, MatchTable};
    use seriea::features::RollingFeatureEngine;
    use seriea::predict::{
        evaluate as evaluate_model, format_prediction, LinearModel, MatchOverrides, Predictor,
    };
    use seriea::FormError;

    /// Load the dataset, deriving away possession when only home is recorded
    fn load_table(config: &Config) -> Result<MatchTable> {
        let table = load_matches(&config.data.dataset_path)?;
        if table.has_column("Ball_possession_home") {
            table.with_complement("Ball_possession_away", "Ball_possession_home")
        } else {
            Ok(table)
        }
    }

    pub fn init(config_path: &str) -> Result<()> {
        let config = Config::default();
        config.save(config_path)?;
        println!("Created default config at {}", config_path);

        std::fs::create_dir_all("data")?;
        std::fs::create_dir_all("model")?;
        println!("Created data/ and model/ directories");

        println!("\nNext steps:");
        println!("  1. Edit {} to customize settings", config_path);
        println!("  2. Place the scraped dataset at {}", config.data.dataset_path);
        println!("  3. Export the trained model to {}", config.data.model_path);
        println!("  4. Run 'seriea predict \"Home Team\" \"Away Team\"' to make predictions");

        Ok(())
    }

    pub fn teams(config: &Config) -> Result<()> {
        let table = load_table(config)?;

        println!("Teams");
        println!("───────────────────────────────");
        for (id, name) in table.teams() {
            println!("  {:>4}  {}", id.0, name);
        }

        Ok(())
    }

    pub fn features(config: &Config, output: Option<String>) -> Result<()> {
        let table = load_table(config)?;
        let engine = RollingFeatureEngine::from_config(&config.features)?;
        let augmented = engine.compute(&table)?;

        let path = output.unwrap_or_else(|| config.data.output_path.clone());
        save_augmented(&path, &augmented)?;
        println!(
            "Wrote {} matches with {} rolling features to {}",
            augmented.len(),
            augmented.feature_columns().len(),
            path
        );

        Ok(())
    }

    pub fn form(config: &Config, team: &str, venue: Venue) -> Result<()> {
        let table = load_table(config)?;
        let team_id = table
            .find_team(team)
            .ok_or_else(|| FormError::UnknownTeamName(team.to_string()))?;

        let features = seriea::features::resolve_live_feature(
            &table,
            team_id,
            venue,
            config.stats_for(venue),
            config.features.window,
        )?;

        println!("{} form ({}, last {} matches)", team, venue, config.features.window);
        println!("───────────────────────────────");
        for (name, value) in features.iter() {
            match value {
                Some(v) => println!("  {:<40} {:.2}", name, v),
                None => println!("  {:<40} unknown", name),
            }
        }

        Ok(())
    }

    pub fn predict(
        config: &Config,
        home: &str,
        away: &str,
        hour: u8,
        day: u8,
        stats: &[String],
        format: OutputFormat,
    ) -> Result<()> {
        if hour > 23 || day > 6 {
            return Err(FormError::InvalidInput(format!(
                "hour must be 0-23 and day 0-6, got {} and {}",
                hour, day
            )));
        }

        let mut overrides = MatchOverrides::with_defaults(&config.prediction.default_stats);
        overrides.hour = Some(hour);
        overrides.day_code = Some(day);
        for arg in stats {
            overrides.set_stat(arg)?;
        }

        let table = load_table(config)?;
        let model = LinearModel::load(&config.data.model_path)?;
        let predictor = Predictor::new(table, config.clone(), model)?;
        let prediction = predictor.predict(home, away, &overrides)?;

        match format {
            OutputFormat::Table => {
                print!("{}", format_prediction(&prediction));
                if let Some(focus) = &config.prediction.focus_team {
                    let involved = [&prediction.home_name, &prediction.away_name]
                        .iter()
                        .any(|n| n.eq_ignore_ascii_case(focus));
                    if involved {
                        if prediction.team_wins(focus) {
                            println!("{} is predicted to win!", focus);
                        } else {
                            println!("{} is not predicted to win.", focus);
                        }
                    }
                }
            }
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&prediction)?);
            }
        }

        Ok(())
    }

    pub fn evaluate(config: &Config) -> Result<()> {
        let table = load_table(config)?;
        let model = LinearModel::load(&config.data.model_path)?;
        let augmented = RollingFeatureEngine::from_config(&config.features)?.compute(&table)?;

        let metrics = evaluate_model(
            &model,
            &augmented,
            &config.features.excluded_features,
            config.prediction.imputation,
        )?;

        println!("Evaluation over {} matches", augmented.len());
        println!("───────────────────────────────");
        println!("  {}", metrics);

        Ok(())
    }
}
