//! Pitchcast CLI
//!
//! Predicts the next pitch of a live MLB game from the pitcher's own
//! regular-season history.

use clap::{Parser, Subcommand};
use pitchcast::{Config, Result};

#[derive(Parser)]
#[command(name = "pitchcast")]
#[command(about = "Next-pitch prediction by historical situation matching", long_about = None)]
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
    /// List games in progress
    Live,
    /// Predict the next pitch of a live game
    Predict {
        /// Stats API game id (gamePk)
        game_id: i64,
        /// Output format
        #[arg(long, default_value = "table")]
        format: OutputFormat,
    },
    /// Summarise a pitcher's regular-season history
    History {
        /// MLBAM pitcher id
        pitcher_id: i64,
        /// First game date (YYYY-MM-DD), defaults to season start
        #[arg(long)]
        start: Option<String>,
        /// Last game date (YYYY-MM-DD), defaults to yesterday
        #[arg(long)]
        end: Option<String>,
    },
    /// Run the HTTP service
    Serve {
        /// Address to bind, overrides server.bind_addr
        #[arg(long)]
        bind: Option<String>,
    },
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
        Commands::Live => commands::live(&config),
        Commands::Predict { game_id, format } => commands::predict(&config, game_id, format),
        Commands::History {
            pitcher_id,
            start,
            end,
        } => commands::history(&config, pitcher_id, start, end),
        Commands::Serve { bind } => commands::serve(&config, bind),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

mod commands {
    use super::*;
    use pitchcast::data::calendar::parse_date;
    use pitchcast::data::scrapers::{build_client, ScheduleProvider};
    use pitchcast::data::{Calendar, DateWindow, SavantClient, StatsApiClient};
    use pitchcast::features::history::pitch_mix;
    use pitchcast::predict::inference::format_prediction;
    use pitchcast::predict::Predictor;
    use pitchcast::server::{self, AppState};
    use pitchcast::{GameId, PitcherId};

    fn build_predictor(config: &Config) -> Result<Predictor<StatsApiClient, SavantClient>> {
        let client = build_client(&config.data)?;
        let calendar = Calendar::from_config(&config.calendar)?;
        Ok(Predictor::new(
            StatsApiClient::new(client.clone(), &config.data),
            SavantClient::new(client, &config.data),
            calendar,
            config.engine.clone(),
        ))
    }

    pub fn init(config_path: &str) -> Result<()> {
        let config = Config::default();
        config.save(config_path)?;
        println!("Created default config at {}", config_path);

        println!("\nNext steps:");
        println!("  1. Edit {} to customize settings", config_path);
        println!("  2. Run 'pitchcast live' to list games in progress");
        println!("  3. Run 'pitchcast predict <GAME_ID>' to predict the next pitch");
        println!("  4. Run 'pitchcast serve' to start the HTTP service");

        Ok(())
    }

    pub fn live(config: &Config) -> Result<()> {
        let client = build_client(&config.data)?;
        let calendar = Calendar::from_config(&config.calendar)?;
        let stats = StatsApiClient::new(client, &config.data);

        let games = stats.live_games(calendar.today())?;
        if games.is_empty() {
            println!("No live games currently.");
            return Ok(());
        }

        println!("{:<10} {:<28} {:<28}", "Game", "Away", "Home");
        println!("{}", "─".repeat(66));
        for game in games {
            println!("{:<10} {:<28} {:<28}", game.game_pk, game.away_team, game.home_team);
        }
        Ok(())
    }

    pub fn predict(config: &Config, game_id: i64, format: OutputFormat) -> Result<()> {
        let predictor = build_predictor(config)?;
        let game = GameId(game_id);

        let prediction = predictor.predict(game)?;

        match format {
            OutputFormat::Table => print!("{}", format_prediction(game, &prediction)),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&prediction)?),
        }
        Ok(())
    }

    pub fn history(
        config: &Config,
        pitcher_id: i64,
        start: Option<String>,
        end: Option<String>,
    ) -> Result<()> {
        let predictor = build_predictor(config)?;
        let current = predictor.calendar().current_window()?;
        let window = DateWindow::new(
            start.as_deref().map(parse_date).transpose()?.unwrap_or(current.start),
            end.as_deref().map(parse_date).transpose()?.unwrap_or(current.end),
        );

        let pitcher = PitcherId(pitcher_id);
        let (fetched, history) = predictor.pitcher_history(pitcher, &window)?;

        println!("{} ({})", pitcher, window);
        println!("───────────────────────────────");
        println!("  Regular-season pitches: {}", fetched);
        println!("  With a pitch type:      {}", history.len());
        println!(
            "  Enough to predict:      {}",
            if history.len() >= predictor.config().min_history {
                "yes"
            } else {
                "no"
            }
        );

        if !history.is_empty() {
            println!("\n  Pitch mix:");
            for (code, count, pct) in pitch_mix(&history) {
                println!("    {:<6} {:>6} {:>7.2}%", code, count, pct);
            }
        }
        Ok(())
    }

    pub fn serve(config: &Config, bind: Option<String>) -> Result<()> {
        // Blocking clients must be built outside the async runtime
        let predictor = build_predictor(config)?;
        let schedule = StatsApiClient::new(build_client(&config.data)?, &config.data);
        let state = AppState::new(predictor, schedule);
        let bind_addr = bind.unwrap_or_else(|| config.server.bind_addr.clone());

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;
        // The outer handle keeps the clients alive until the runtime is gone
        runtime.block_on(server::serve(&bind_addr, state.clone()))
    }
}
