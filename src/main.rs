use std::path::PathBuf;

use anyhow::Context;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Utc};
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

use tcs_reports::db::{self, PgStore};
use tcs_reports::mock_records::{MockRecordsService, RecordsService};
use tcs_reports::store::EntityStore;
use tcs_reports::{lookup, peak_hours, report};

#[derive(Parser)]
#[command(name = "tcs-reports")]
#[command(about = "Tutoring center sign-in reports and records simulation", long_about = None)]
struct Cli {
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,
    #[arg(long, default_value_t = 5)]
    max_connections: u32,
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct Window {
    /// First day of the window (YYYY-MM-DD)
    #[arg(long)]
    start: Option<NaiveDate>,
    /// Last day of the window, inclusive (YYYY-MM-DD)
    #[arg(long)]
    end: Option<NaiveDate>,
    /// Window length used when --start is omitted
    #[arg(long, default_value_t = 30)]
    since_days: i64,
}

impl Window {
    fn bounds(&self) -> anyhow::Result<(NaiveDateTime, NaiveDateTime)> {
        window_bounds(
            self.start,
            self.end,
            self.since_days,
            Utc::now().date_naive(),
        )
    }
}

fn window_bounds(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    since_days: i64,
    today: NaiveDate,
) -> anyhow::Result<(NaiveDateTime, NaiveDateTime)> {
    let end = end.unwrap_or(today);
    let start = match start {
        Some(start) => start,
        None => TimeDelta::try_days(since_days.max(1))
            .and_then(|span| end.checked_sub_signed(span))
            .with_context(|| format!("--since-days {since_days} reaches past the calendar"))?,
    };
    let end_of_day = NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999)
        .context("invalid end-of-day time")?;
    Ok((start.and_time(NaiveTime::MIN), end.and_time(end_of_day)))
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data
    Seed,
    /// Import sign-ins from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// List visits in a window as JSON rows
    Visits {
        #[command(flatten)]
        window: Window,
        #[arg(long, default_value_t = 0)]
        skip: i64,
        #[arg(long, default_value_t = 50)]
        take: i64,
    },
    /// Count visits per hour of day
    PeakHours {
        #[command(flatten)]
        window: Window,
    },
    /// Generate a markdown report
    Report {
        #[command(flatten)]
        window: Window,
        #[arg(long, default_value_t = 500)]
        take: i64,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Show a person and a summary of their visits
    Person { identifier: String },
    /// Show the simulated records profile for an email or id
    Profile { identifier: String },
    /// Show a simulated final grade for a course
    Grade {
        #[arg(long)]
        person_id: i32,
        #[arg(long)]
        crn: i32,
        #[arg(long)]
        term_code: i32,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let pool = PgPoolOptions::new()
        .max_connections(cli.max_connections)
        .connect(&cli.database_url)
        .await
        .context("failed to connect to Postgres")?;
    let store = PgStore::new(pool.clone());

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            tracing::info!("schema ready");
        }
        Commands::Seed => {
            db::seed(&pool).await?;
            tracing::info!("seed data inserted");
        }
        Commands::Import { csv } => {
            let inserted = db::import_csv(&pool, &csv)
                .await
                .with_context(|| format!("failed to import {}", csv.display()))?;
            println!("Inserted {inserted} sign-ins from {}.", csv.display());
        }
        Commands::Visits { window, skip, take } => {
            let (start, end) = window.bounds()?;
            let rows = lookup::lookup(&store, start, end, skip, take).await?;
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        Commands::PeakHours { window } => {
            let (start, end) = window.bounds()?;
            let hours = peak_hours::peak_hours(&store, start, end).await?;
            if hours.is_empty() {
                println!("No visits found for this window.");
                return Ok(());
            }
            println!("{}", serde_json::to_string_pretty(&hours)?);
        }
        Commands::Report { window, take, out } => {
            let (start, end) = window.bounds()?;
            let hours = peak_hours::peak_hours(&store, start, end).await?;
            let visits = lookup::lookup(&store, start, end, 0, take).await?;
            let tours = store.class_tours().await?;
            let report = report::build_report(start, end, &hours, &visits, &tours);
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
        Commands::Person { identifier } => {
            let info = lookup::person_info(&store, &identifier).await?;
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
        Commands::Profile { identifier } => {
            let service = MockRecordsService::new(store);
            let profile = service.get_profile(&identifier).await?;
            println!("{}", serde_json::to_string_pretty(&profile)?);
        }
        Commands::Grade {
            person_id,
            crn,
            term_code,
        } => {
            let service = MockRecordsService::new(store);
            let grade = service.get_grade(person_id, crn, term_code).await?;
            println!("{}", serde_json::to_string_pretty(&grade)?);
        }
    }

    Ok(())
}
