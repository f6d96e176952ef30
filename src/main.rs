use anyhow::{bail, Context, Result};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use clap::{Parser, Subcommand};
use colored::*;
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use tabled::{settings::Style, Table, Tabled};

use readyrs::acwr::{AcwrCalculator, LoadZone};
use readyrs::config::AppConfig;
use readyrs::database::TrainingLog;
use readyrs::export::{export_acwr_series, export_set_history};
use readyrs::import::csv::CsvSetImporter;
use readyrs::logging::{init_logging, LogConfig, LogLevel};
use readyrs::models::{CompletedSet, ExerciseCategory, FoodLogEntry, NutritionPlan, SleepSample};
use readyrs::nutrition;
use readyrs::readiness::{BoundedSleepSource, ReadinessColor, ReadinessScorer};

/// ReadyRS - Training Readiness CLI
///
/// A Rust-based tool for logging strength training and scoring day-to-day
/// readiness from workload trend (ACWR), sleep, and nutrition adherence.
#[derive(Parser)]
#[command(name = "readyrs")]
#[command(author = "ReadyRS Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Training Readiness CLI", long_about = None)]
struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase verbosity of output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute today's readiness score
    Score {
        /// Label of the planned session ("Heavy Squats")
        #[arg(short, long)]
        session: Option<String>,

        /// Emit the full result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Log a training set, sleep sample, or food entry
    Log {
        #[command(subcommand)]
        entry: LogCommands,
    },

    /// Manage nutrition plans
    Plan {
        #[command(subcommand)]
        action: PlanCommands,
    },

    /// Import completed-set history from a CSV file
    Import {
        /// Input file path
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Display the trailing daily-volume history
    History {
        /// Number of days to show
        #[arg(short, long, default_value = "28")]
        days: u16,
    },

    /// Export the daily ACWR series or set history to CSV
    Export {
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Number of days to export
        #[arg(short, long, default_value = "28")]
        days: u16,

        /// Export raw sets instead of the daily series
        #[arg(long)]
        sets: bool,
    },
}

#[derive(Subcommand)]
enum LogCommands {
    /// Log a completed set
    Set {
        /// Exercise name
        #[arg(short, long)]
        exercise: String,

        /// Exercise category (strength, hypertrophy, conditioning, mobility, cardio)
        #[arg(long)]
        category: Option<String>,

        /// Repetitions performed
        #[arg(short, long)]
        reps: u16,

        /// Load in kilograms
        #[arg(short, long)]
        weight: String,

        /// Rate of perceived exertion (1-10)
        #[arg(long)]
        rpe: Option<String>,

        /// Completion time (defaults to now)
        #[arg(long)]
        at: Option<String>,

        /// Notes
        #[arg(short, long)]
        notes: Option<String>,
    },

    /// Log a sleep duration sample
    Sleep {
        /// Minutes asleep
        #[arg(short, long)]
        minutes: u32,

        /// Sample time (defaults to now)
        #[arg(long)]
        at: Option<String>,
    },

    /// Log a food entry
    Food {
        /// Total calories
        #[arg(short, long)]
        calories: u32,

        /// Description ("post-workout shake")
        #[arg(short, long)]
        note: Option<String>,

        /// Log time (defaults to now)
        #[arg(long)]
        at: Option<String>,
    },
}

#[derive(Subcommand)]
enum PlanCommands {
    /// Create and activate a nutrition plan
    Set {
        /// Plan name
        #[arg(short, long)]
        name: String,

        /// Target daily calories
        #[arg(short, long)]
        target_calories: Option<String>,
    },

    /// Show the active plan
    Show,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_config = LogConfig {
        level: LogLevel::from_verbosity(cli.verbose),
        ..LogConfig::default()
    };
    init_logging(&log_config)?;

    let config = AppConfig::load_or_default(cli.config.as_deref())?;
    std::fs::create_dir_all(&config.settings.data_dir).with_context(|| {
        format!(
            "Failed to create data directory: {}",
            config.settings.data_dir.display()
        )
    })?;

    let log = TrainingLog::new(config.database_path())
        .with_context(|| format!("Failed to open training log: {}", config.database_path().display()))?
        .with_bucketing(config.scorer.acwr.bucketing);

    match cli.command {
        Commands::Score { session, json } => cmd_score(&config, log, session, json),
        Commands::Log { entry } => cmd_log(log, entry),
        Commands::Plan { action } => cmd_plan(log, action),
        Commands::Import { file } => cmd_import(&config, log, file),
        Commands::History { days } => cmd_history(&config, log, days),
        Commands::Export {
            output,
            days,
            sets,
        } => cmd_export(&config, log, output, days, sets),
    }
}

fn cmd_score(
    config: &AppConfig,
    log: TrainingLog,
    session: Option<String>,
    json: bool,
) -> Result<()> {
    let session = session.or_else(|| config.settings.default_session_label.clone());

    let log = Arc::new(log);
    let sleep_source = BoundedSleepSource::new(
        Arc::clone(&log),
        std::time::Duration::from_millis(config.scorer.sleep_fetch_timeout_ms),
    );
    let scorer = ReadinessScorer::with_config(
        Arc::clone(&log),
        sleep_source,
        Arc::clone(&log),
        config.scorer.clone(),
    );

    let result = scorer.score(session.as_deref())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    let headline = format!("{}  -  {}/100", result.title, result.score);
    let headline = match result.color {
        ReadinessColor::Green => headline.green().bold(),
        ReadinessColor::Yellow => headline.yellow().bold(),
        ReadinessColor::Red => headline.red().bold(),
    };
    println!("{}", headline);
    println!("{}", result.description);
    println!();

    let zone = LoadZone::from_metrics(&result.acwr);
    println!(
        "  Load trend:  {:>3}  ({}, ratio {})",
        result.load_score,
        zone.description(),
        result.acwr.ratio.round_dp(2)
    );
    match result.sleep_score {
        Some(sleep) => println!("  Sleep:       {:>3}", sleep),
        None => println!("  Sleep:       {}", "no data".dimmed()),
    }
    println!("  Bonus:       {:>3}", result.bonus);
    println!();
    println!("  {}", result.method.dimmed());

    Ok(())
}

fn cmd_log(log: TrainingLog, entry: LogCommands) -> Result<()> {
    match entry {
        LogCommands::Set {
            exercise,
            category,
            reps,
            weight,
            rpe,
            at,
            notes,
        } => {
            if reps == 0 {
                bail!("Rep count must be at least 1");
            }
            let weight = Decimal::from_str(&weight)
                .with_context(|| format!("Invalid weight: {}", weight))?;
            if weight < Decimal::ZERO {
                bail!("Weight cannot be negative");
            }
            let perceived_exertion = rpe
                .map(|r| Decimal::from_str(&r).with_context(|| format!("Invalid RPE: {}", r)))
                .transpose()?;

            let set = CompletedSet {
                id: uuid::Uuid::new_v4().to_string(),
                exercise_name: exercise,
                exercise_category: category.and_then(|c| c.parse::<ExerciseCategory>().ok()),
                completed_at: parse_cli_datetime(at.as_deref())?,
                reps,
                weight,
                perceived_exertion,
                notes,
                source: None,
            };

            match log.store_set(&set) {
                Ok(()) => {
                    println!(
                        "{} {} x{} @ {}kg (volume {})",
                        "✓ Logged".green(),
                        set.exercise_name,
                        set.reps,
                        set.weight,
                        set.volume()
                    );
                    Ok(())
                }
                Err(e) => bail!(readyrs::ReadyRsError::from(e).user_message()),
            }
        }

        LogCommands::Sleep { minutes, at } => {
            let sample = SleepSample {
                sampled_at: parse_cli_datetime(at.as_deref())?,
                duration_minutes: minutes,
                source: Some("manual".to_string()),
            };
            log.store_sleep_sample(&uuid::Uuid::new_v4().to_string(), &sample)?;
            println!(
                "{} {} minutes ({:.1}h)",
                "✓ Logged sleep:".green(),
                minutes,
                sample.hours()
            );
            Ok(())
        }

        LogCommands::Food { calories, note, at } => {
            let entry = FoodLogEntry {
                id: uuid::Uuid::new_v4().to_string(),
                logged_at: parse_cli_datetime(at.as_deref())?,
                calories,
                description: note,
            };
            log.store_food_entry(&entry)?;
            println!("{} {} kcal", "✓ Logged food:".green(), calories);
            Ok(())
        }
    }
}

fn cmd_plan(log: TrainingLog, action: PlanCommands) -> Result<()> {
    match action {
        PlanCommands::Set {
            name,
            target_calories,
        } => {
            let plan = NutritionPlan {
                id: uuid::Uuid::new_v4().to_string(),
                name,
                target_daily_calories: target_calories,
                active: true,
                created_at: Utc::now(),
            };
            log.store_plan(&plan)?;
            println!("{} {}", "✓ Activated plan:".green(), plan.name);
            if plan.parsed_target_calories().is_none() {
                println!(
                    "  {} falling back to {} kcal/day",
                    "no parsable calorie target;".yellow(),
                    nutrition::DEFAULT_TARGET_CALORIES
                );
            }
            Ok(())
        }

        PlanCommands::Show => {
            let target = match log.active_plan()? {
                Some(plan) => {
                    println!("{}", plan.name.bold());
                    let target = plan.parsed_target_calories();
                    match target {
                        Some(t) => println!("  Target: {} kcal/day", t),
                        None => println!(
                            "  Target: {} (default, none stored)",
                            nutrition::DEFAULT_TARGET_CALORIES
                        ),
                    }
                    println!("  Created: {}", plan.created_at.format("%Y-%m-%d"));
                    target
                }
                None => {
                    println!(
                        "No active plan. Scoring assumes {} kcal/day.",
                        nutrition::DEFAULT_TARGET_CALORIES
                    );
                    None
                }
            };

            let logged = log.calories_for_day(Utc::now())?;
            let band = nutrition::AdherenceBand::from_logged(&logged, target);
            println!(
                "  Today: {} kcal logged ({})",
                nutrition::total_logged(&logged),
                band
            );
            Ok(())
        }
    }
}

fn cmd_import(config: &AppConfig, log: TrainingLog, file: PathBuf) -> Result<()> {
    println!("{}", "Importing set history...".blue().bold());

    let importer = CsvSetImporter::new().with_progress(config.import.show_progress);
    let summary = importer.import_into(&log, &file)?;

    println!(
        "{} {} ({} rows)",
        "✓ Import complete:".green(),
        summary,
        summary.total_rows()
    );
    Ok(())
}

#[derive(Tabled)]
struct HistoryRow {
    #[tabled(rename = "Date")]
    date: String,

    #[tabled(rename = "Volume")]
    volume: String,

    #[tabled(rename = "Sets")]
    sets: u16,
}

fn cmd_history(config: &AppConfig, log: TrainingLog, days: u16) -> Result<()> {
    let now = Utc::now();
    let calculator = AcwrCalculator::with_config(config.scorer.acwr);

    // Fetch enough history that the chronic window behind day one is full
    let fetch_days = i64::from(days) + i64::from(config.scorer.acwr.chronic_window_days);
    let sets = log.sets_since(now - Duration::days(fetch_days))?;
    let daily = calculator.aggregate_daily_volume(&sets);

    let bucketing = config.scorer.acwr.bucketing;
    let today = bucketing.bucket(now);

    let rows: Vec<HistoryRow> = ((today - i64::from(days) + 1)..=today)
        .map(|bucket| {
            let (volume, set_count) = daily
                .get(&bucket)
                .map(|d| (d.total_volume.to_string(), d.set_count))
                .unwrap_or_else(|| ("0".to_string(), 0));
            let (start_ms, _) = bucketing.bucket_range_ms(bucket);
            let date = DateTime::from_timestamp_millis(start_ms)
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| bucket.to_string());
            HistoryRow {
                date,
                volume,
                sets: set_count,
            }
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{}", table);

    let metrics = calculator.metrics_at(&daily, now);
    let zone = LoadZone::from_metrics(&metrics);
    println!();
    println!(
        "Acute {} / Chronic {}  (ratio {})",
        metrics.acute_load.round_dp(1),
        metrics.chronic_load.round_dp(1),
        metrics.ratio.round_dp(2)
    );
    println!("{}: {}", zone.description().bold(), zone.recommendation());

    Ok(())
}

fn cmd_export(
    config: &AppConfig,
    log: TrainingLog,
    output: PathBuf,
    days: u16,
    sets_only: bool,
) -> Result<()> {
    let now = Utc::now();
    let calculator = AcwrCalculator::with_config(config.scorer.acwr);

    let fetch_days = i64::from(days) + i64::from(config.scorer.acwr.chronic_window_days);
    let sets = log.sets_since(now - Duration::days(fetch_days))?;

    if sets_only {
        export_set_history(&sets, &output)?;
        println!(
            "{} {} sets to {}",
            "✓ Exported".green(),
            sets.len(),
            output.display()
        );
    } else {
        export_acwr_series(&sets, &calculator, now, days, &output)?;
        println!(
            "{} {}-day series to {}",
            "✓ Exported".green(),
            days,
            output.display()
        );
    }
    Ok(())
}

/// Parse a CLI-supplied timestamp, defaulting to now
fn parse_cli_datetime(value: Option<&str>) -> Result<DateTime<Utc>> {
    let Some(value) = value else {
        return Ok(Utc::now());
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(DateTime::from_naive_utc_and_offset(naive, Utc));
        }
    }
    // Date-only: midday keeps the entry inside its day bucket
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(12, 0, 0) {
            return Ok(DateTime::from_naive_utc_and_offset(naive, Utc));
        }
    }

    bail!("Unable to parse datetime: {}", value);
}
