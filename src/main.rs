//! rideroster - Rally Results Import Engine
//!
//! Command-line entry point: reads a results payload, runs one import
//! batch, and prints the batch summary. All decision logic lives in the
//! library.

use anyhow::Context;
use clap::{Parser, Subcommand};
use rideroster::{import_event_results, import_rally_sheet, load_config, Database, RunStats};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "rideroster", version, about = "Import rally results into the rides roster")]
struct Cli {
    /// Roster database file
    #[arg(long, default_value = "ibaukrd.db")]
    db: PathBuf,

    /// Configuration file (defaults apply when omitted)
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Import a structured results document for the 1000-mile event
    Event {
        /// Results document (JSON)
        payload: PathBuf,

        /// Event Saturday date (YYYY-MM-DD)
        #[arg(long)]
        ride_date: String,
    },
    /// Import a tabular finisher sheet for a rally
    Rally {
        /// Finisher sheet (CSV)
        payload: PathBuf,

        /// Short rally code
        #[arg(long)]
        code: String,

        /// Results year
        #[arg(long)]
        year: String,

        /// Full rally title, used when the code is not yet registered
        #[arg(long, default_value = "")]
        title: String,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting rideroster v{}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    let db = Database::open(&cli.db)
        .with_context(|| format!("opening roster database {}", cli.db.display()))?;

    let stats = match &cli.command {
        Command::Event { payload, ride_date } => {
            let data = std::fs::read_to_string(payload)
                .with_context(|| format!("reading payload {}", payload.display()))?;
            import_event_results(&db, &config, &data, ride_date)?
        }
        Command::Rally {
            payload,
            code,
            year,
            title,
        } => {
            let data = std::fs::read_to_string(payload)
                .with_context(|| format!("reading payload {}", payload.display()))?;
            import_rally_sheet(&db, &data, code, year, title)?
        }
    };

    print_summary(&stats);
    Ok(())
}

fn print_summary(stats: &RunStats) {
    println!("{} rides added to the database", stats.new_rides);
    println!(
        "Number of new riders {}, number of new pillions {}",
        stats.new_riders, stats.new_pillions
    );

    if !stats.route_counts.is_empty() {
        let counts: Vec<String> = stats
            .route_counts
            .iter()
            .map(|(code, count)| format!("{code}: {count}"))
            .collect();
        println!("{}", counts.join("  "));
    }

    if !stats.new_members.is_empty() {
        println!("New IBA members:");
        for name in &stats.new_members {
            println!("  {name}");
        }
    }
}
