use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ranked_stats::aggregate::{
    build_leaderboard, compute_player_standing, compute_region_stats, compute_song_stats,
    compute_top_players, players_per_day, validate_limit,
};
use ranked_stats::cache::{CacheKey, DerivedCache, SourceId};
use ranked_stats::config::AppConfig;
use ranked_stats::models::{DateWindow, Leaderboard, PlayerReport};
use ranked_stats::store::csv::PLAYERS_ANSWERS_FILE;
use ranked_stats::store::{
    CsvStore, Dataset, DerivedWriter, ParquetExporter, SqliteStore, StoreConfig,
};

#[derive(Parser)]
#[command(name = "ranked-stats")]
#[command(about = "Statistics pipeline for AMQ ranked games")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./ranked-stats.toml")]
    config: String,

    /// Data directory path (overrides the config file)
    #[arg(long)]
    data_dir: Option<String>,

    /// Window start date, YYYY-MM-DD (default: collection start)
    #[arg(long)]
    from: Option<String>,

    /// Window end date, YYYY-MM-DD (default: today)
    #[arg(long)]
    to: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute every derived table for the window and write CSV artifacts
    Derive {
        /// Read canonical tables from CSV instead of the collector database
        #[arg(long)]
        from_csv: bool,

        /// Players kept per leaderboard (default from config)
        #[arg(long)]
        players: Option<usize>,

        /// Song groups kept per content table (default from config)
        #[arg(long)]
        songs: Option<usize>,
    },

    /// Leaderboard standing and profile report for one or more players
    Player {
        /// Player names, case sensitive
        #[arg(required = true)]
        names: Vec<String>,

        /// Print reports as JSON
        #[arg(long)]
        json: bool,

        /// Read canonical tables from CSV instead of the collector database
        #[arg(long)]
        from_csv: bool,
    },

    /// Dump the collector database to the canonical CSV tables
    ExportCsv,

    /// Export the canonical tables to Parquet
    ExportParquet {
        /// Read canonical tables from CSV instead of the collector database
        #[arg(long)]
        from_csv: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load_or_default(&PathBuf::from(&cli.config))
        .with_context(|| format!("Failed to load config from {}", cli.config))?;

    // Initialize tracing
    let level = cli.log_level.as_deref().unwrap_or(&config.log_level);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    if cli.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    tracing::info!("Starting ranked-stats v{}", env!("CARGO_PKG_VERSION"));

    let store = match &cli.data_dir {
        Some(dir) => StoreConfig::new(PathBuf::from(dir)),
        None => config.store(),
    };
    let window = resolve_window(&cli, &config)?;

    match cli.command {
        Commands::Derive {
            from_csv,
            players,
            songs,
        } => {
            let player_limit = players.unwrap_or(config.limits.players);
            let song_limit = songs.unwrap_or(config.limits.songs);
            validate_limit(player_limit)?;
            validate_limit(song_limit)?;

            let dataset = load_dataset(&store, from_csv)?;
            let answers = dataset.player_answers();
            let in_window = answers.iter().filter(|a| window.contains(a.date)).count();
            tracing::info!(
                "Deriving tables for {} answers in window {}",
                in_window,
                window
            );

            let top_players = compute_top_players(&answers, &window, player_limit);
            let regions = compute_region_stats(&answers, &window, &config.region_thresholds());
            let top_songs = compute_song_stats(
                &answers,
                &dataset.songs,
                &window,
                song_limit,
                &config.content_thresholds(),
            );
            let daily = players_per_day(&answers, &window);

            let writer = DerivedWriter::new(store.clone());
            let mut artifacts = Vec::new();
            artifacts.extend(writer.write_top_players(&top_players, player_limit, &window)?);
            artifacts.push(writer.write_region_stats(&regions, &window)?);
            artifacts.extend(writer.write_top_songs(&top_songs, song_limit, &window)?);
            artifacts.push(writer.write_players_per_day(&daily, &window)?);

            println!(
                "\n=== Derive Results ({} to {}) ===",
                window.start(),
                window.end()
            );
            println!("Answers in window: {}", in_window);
            println!("Regions ranked:    {}", regions.len());
            println!("Artifacts written: {}", artifacts.len());
            for path in &artifacts {
                println!("  {}", path.display());
            }
        }
        Commands::Player {
            names,
            json,
            from_csv,
        } => {
            let dataset = load_dataset(&store, from_csv)?;
            let source = SourceId::for_path(&source_path(&store, from_csv))
                .context("Failed to fingerprint source tables")?;
            let answers = dataset.player_answers();

            // One leaderboard serves every requested player.
            let mut boards: DerivedCache<Leaderboard> = DerivedCache::new();
            let key = CacheKey::new(
                &source,
                &[&window.start().to_string(), &window.end().to_string()],
            );
            let board = boards.get_or_compute(key, || build_leaderboard(&answers, &window));

            let options = config.standing_options();
            for name in &names {
                match compute_player_standing(name, &answers, &dataset.songs, board, &window, &options)
                {
                    Some(report) => {
                        if json {
                            println!("{}", serde_json::to_string_pretty(&report)?);
                        } else {
                            print_report(&report, &window);
                        }
                    }
                    None => {
                        println!(
                            "No data for {} between {} and {}",
                            name,
                            window.start(),
                            window.end()
                        );
                    }
                }
            }
        }
        Commands::ExportCsv => {
            let dataset = load_dataset(&store, false)?;
            CsvStore::new(store.clone()).write(&dataset)?;

            println!("\n=== Export Results ===");
            println!("Songs:       {}", dataset.songs.len());
            println!("Occurrences: {}", dataset.occurrences.len());
            println!("Answers:     {}", dataset.answers.len());
            println!("Wrote canonical tables to {:?}", store.csv_dir());
        }
        Commands::ExportParquet { from_csv } => {
            let dataset = load_dataset(&store, from_csv)?;
            ParquetExporter::new(store.clone()).export(&dataset)?;

            println!("\n=== Export Results ===");
            println!("Songs:       {}", dataset.songs.len());
            println!("Occurrences: {}", dataset.occurrences.len());
            println!("Answers:     {}", dataset.answers.len());
            println!("Wrote Parquet tables to {:?}", store.parquet_dir());
        }
    }

    Ok(())
}

/// Resolve the date window from CLI flags, falling back to the
/// configured collection start and today.
fn resolve_window(cli: &Cli, config: &AppConfig) -> Result<DateWindow> {
    let start = match &cli.from {
        Some(s) => parse_date(s, "--from")?,
        None => config.window.default_start,
    };
    let end = match &cli.to {
        Some(s) => parse_date(s, "--to")?,
        None => chrono::Utc::now().date_naive(),
    };
    Ok(DateWindow::new(start, end)?)
}

fn parse_date(s: &str, flag: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("Invalid {} date (expected YYYY-MM-DD): {}", flag, s))
}

/// File whose identity keys the derived cache.
fn source_path(store: &StoreConfig, from_csv: bool) -> PathBuf {
    if from_csv {
        store.csv_dir().join(PLAYERS_ANSWERS_FILE)
    } else {
        store.db_path()
    }
}

/// Load the canonical tables from the selected backend.
fn load_dataset(store: &StoreConfig, from_csv: bool) -> Result<Dataset> {
    if from_csv {
        CsvStore::new(store.clone())
            .load()
            .context("Failed to load canonical CSV tables")
    } else {
        let db_path = store.db_path();
        let sqlite = SqliteStore::open(&db_path)
            .with_context(|| format!("Failed to open collector database at {:?}", db_path))?;
        sqlite.load().context("Failed to load collector tables")
    }
}

fn print_report(report: &PlayerReport, window: &DateWindow) {
    println!(
        "\n=== {} ({} to {}) ===",
        report.player_name,
        window.start(),
        window.end()
    );
    println!(
        "Played {} rankeds over {} songs, roughly {} hours in game",
        report.profile.ranked_count, report.profile.song_count, report.profile.play_time_hours
    );
    println!(
        "Guessed {} songs right, {} wrong",
        report.profile.correct, report.profile.incorrect
    );

    println!("\nLeaderboards:");
    println!(
        "  Best score:   {:>6}  {}",
        report.score.value, report.score.rank
    );
    println!(
        "  Songs played: {:>6}  {}",
        report.time.value, report.time.rank
    );
    println!(
        "  Solo points:  {:>6}  {}",
        report.solo.value, report.solo.rank
    );

    if !report.profile.regions.is_empty() {
        println!("\nRankeds per region:");
        for rc in &report.profile.regions {
            println!("  {:<13} {}", rc.region.to_string(), rc.ranked_count);
        }
    }

    if !report.best_matches.is_empty() {
        println!("\nBest rankeds:");
        for m in &report.best_matches {
            println!("  {:>3} points  {}  {}", m.score, m.date, m.region);
        }
    }

    let held: Vec<_> = report
        .low_pointers
        .iter()
        .filter(|b| b.occurrences > 0)
        .collect();
    if !held.is_empty() {
        println!("\nLow pointers:");
        for bucket in held {
            println!(
                "  {} correct: {} songs",
                bucket.correct_count, bucket.occurrences
            );
            for song in &bucket.examples {
                println!("    {}", song);
            }
        }
    }

    if !report.score_by_date.is_empty() {
        println!("\nDaily guess rate: {} days tracked", report.score_by_date.len());
    }

    if report.worst_songs.is_empty() {
        println!("\nNo song missed more than once.");
    } else {
        println!("\nSongs missed more than once:");
        for s in &report.worst_songs {
            println!("  {}x  {} by {}", s.miss_count, s.song_name, s.song_artist);
        }
    }
}
