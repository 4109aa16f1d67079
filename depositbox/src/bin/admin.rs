//! Offline administration of the deposit ledger

use anyhow::Context;
use clap::{Parser, Subcommand};
use depositbox_export::{compute_claim_allocation, compute_leaderboard, export_leaderboard, write_claim_allocation};
use depositbox_ledger::{Config, DepositorId, DepositorSummary, LedgerStore, Storage};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "depositbox-admin")]
#[command(about = "Inspect and export the DepositBox ledger", long_about = None)]
struct Cli {
    /// Config file path (created with defaults if missing)
    #[arg(short, long, default_value = "config/DepositBox.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show deposit totals
    Summary {
        /// Only this depositor
        #[arg(short, long)]
        depositor: Option<String>,
    },

    /// Split a reward budget over the ledger and persist it
    Claim {
        /// Total reward to distribute
        #[arg(short, long)]
        budget: u64,
    },

    /// Merge the leaderboard into the server info document
    ExportLeaderboard,
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    let mut config = Config::load_or_create(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    config.apply_env();

    let storage = Arc::new(Storage::open(&config)?);
    let ledger = LedgerStore::load(storage.clone(), config.ledger_key.clone())?;
    let snapshot = ledger.snapshot();

    match cli.command {
        Commands::Summary { depositor: Some(depositor) } => {
            print_summary(&snapshot.summary_for(&DepositorId::new(depositor)));
        }

        Commands::Summary { depositor: None } => {
            if snapshot.is_empty() {
                println!("No deposits recorded.");
            }
            for summary in snapshot.summaries() {
                print_summary(&summary);
            }
            println!("Total deposited: {}", snapshot.total());
        }

        Commands::Claim { budget } => {
            let allocation = compute_claim_allocation(&snapshot, budget);
            let written = write_claim_allocation(&storage, &config.claims_key, &allocation)?;

            for (depositor, reward) in &written.allocation.rewards {
                println!("{}: {}", depositor, reward);
            }
            println!(
                "Allocated {} of {} ({} unallocated)",
                written.allocation.allocated(),
                budget,
                written.allocation.unallocated
            );
        }

        Commands::ExportLeaderboard => {
            let settings = &config.leaderboard;
            let board = compute_leaderboard(&snapshot, settings.top_n, settings.page_size, |_| None);
            let report = export_leaderboard(settings, &board)?;

            println!(
                "{:?} leaderboard section in {} ({} entries)",
                report.action,
                report.path.display(),
                report.entries
            );
            if let Some(command) = report.reload_command {
                println!("Run on the server console: {}", command);
            }
        }
    }

    Ok(())
}

fn print_summary(summary: &DepositorSummary) {
    println!(
        "{}: {} deposited, {:.2}% of total",
        summary.depositor, summary.amount, summary.percentage
    );
}
