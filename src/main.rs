#[macro_use]
extern crate rocket;

use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

mod aggregate;
mod api;
mod criteria;
mod db;
mod error;
mod models;
mod report;
mod scoring;
mod service;
mod store;
#[cfg(test)]
mod test_support;

use db::PgStore;
use service::Service;

#[derive(Parser)]
#[command(name = "iqac-ledger")]
#[command(about = "Faculty activity records scored against accreditation criteria", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load sample faculty and records
    Seed,
    /// Import activity records from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Serve the JSON API
    Serve {
        #[arg(long, env = "IQAC_ADDRESS", default_value = "127.0.0.1")]
        address: IpAddr,
        #[arg(long, env = "IQAC_PORT", default_value_t = 5000)]
        port: u16,
    },
    /// Preview the score a record would receive
    Score {
        #[arg(long, default_value = "")]
        evidence: String,
        #[arg(long, default_value = "")]
        comments: String,
        /// Print the preview as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the top faculty by mean score
    Leaderboard {
        #[arg(long, default_value_t = aggregate::LEADERBOARD_SIZE)]
        limit: usize,
        /// Print the leaderboard as JSON
        #[arg(long)]
        json: bool,
    },
    /// Generate a markdown report
    Report {
        /// Limit the report to one faculty member
        #[arg(long)]
        email: Option<String>,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

fn init_tracing() -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_env("IQAC_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}

async fn connect() -> anyhow::Result<PgPool> {
    let _ = dotenvy::dotenv();
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to a Postgres instance")?;

    PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")
}

fn pg_service(pool: PgPool) -> Service {
    Service::new(Arc::new(PgStore::new(pool)))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing()?;

    match cli.command {
        Commands::InitDb => {
            let pool = connect().await?;
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            let pool = connect().await?;
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Import { csv } => {
            let pool = connect().await?;
            let inserted = db::import_csv(&pool, &csv).await?;
            println!("Inserted {inserted} records from {}.", csv.display());
        }
        Commands::Serve { address, port } => {
            let service = pg_service(connect().await?);
            api::serve(service, address, port).await?;
        }
        Commands::Score {
            evidence,
            comments,
            json,
        } => {
            let preview = scoring::preview(&evidence, &comments);
            if json {
                println!("{}", serde_json::to_string_pretty(&preview)?);
                return Ok(());
            }
            println!("Score: {} ({}/10)", preview.score, preview.score_out_of_10);
            for hit in preview.breakdown.iter() {
                println!("- {}: +{}", hit.label, hit.points);
            }
        }
        Commands::Leaderboard { limit, json } => {
            let board = pg_service(connect().await?).leaderboard(limit).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&board)?);
                return Ok(());
            }

            if board.is_empty() {
                println!("No activity records yet.");
                return Ok(());
            }

            println!("Top faculty by mean score:");
            for (rank, entry) in board.iter().enumerate() {
                println!(
                    "{}. {} ({}) avg {:.2} ({:.2}/10) across {} records",
                    rank + 1,
                    entry.faculty_name,
                    entry.department,
                    entry.avg_score,
                    entry.score_out_of_10,
                    entry.total_records
                );
            }
        }
        Commands::Report { email, out } => {
            let service = pg_service(connect().await?);
            let faculty = service.list_faculty().await?;
            let scope = match email.as_deref() {
                Some(email) => Some(
                    faculty
                        .iter()
                        .find(|member| member.email == email)
                        .with_context(|| format!("no faculty member with email {email}"))?,
                ),
                None => None,
            };
            let records = service.list_stored_records().await?;
            let report = report::build_report(chrono::Utc::now(), scope, &faculty, &records);
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
