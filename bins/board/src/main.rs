//! Kanbai Board Binary - one cycle, rendered to the terminal
//!
//! Loads the member roster, runs a single fetch cycle and prints the
//! consolidated board, either as an aligned text table or as JSON for an
//! external renderer.

use chrono::Utc;
use clap::Parser;
use kanbai_core::{Config, League};
use kanbai_engine::{load_roster, BoardCache, Engine, LogProgress, StatusBoard};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "kanbai-board")]
#[command(about = "Sold-out board for multi-slot ticket inventory")]
struct Args {
    /// Path to the roster CSV (overrides KANBAI_ROSTER)
    #[arg(short, long)]
    roster: Option<PathBuf>,

    /// Show only one league's rows (aggregates still cover everyone)
    #[arg(long)]
    league: Option<String>,

    /// Emit the board as JSON instead of a text table
    #[arg(long, default_value = "false")]
    json: bool,

    /// Fail on the first malformed roster row instead of skipping it
    #[arg(long, default_value = "false")]
    strict: bool,

    /// Log level (debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Initialize tracing
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = Config::from_env()?;
    if let Some(roster) = args.roster {
        config.roster_path = roster;
    }
    if args.strict {
        config.strict_roster = true;
    }

    let league = args
        .league
        .as_deref()
        .map(|s| s.parse::<League>().map_err(anyhow::Error::msg))
        .transpose()?;

    let members = load_roster(&config.roster_path, config.strict_roster)?;
    info!(members = members.len(), "roster ready");

    let engine = Engine::new(config)?;
    let board = engine.run_cycle(&members, Utc::now(), &LogProgress).await;

    let mut cache = BoardCache::new();
    cache.store(board);
    let board = cache.board().expect("board was just stored");

    if args.json {
        println!("{}", serde_json::to_string_pretty(board)?);
    } else {
        print_board(board, league);
    }

    Ok(())
}

fn print_board(board: &StatusBoard, league: Option<League>) {
    println!(
        "updated {}  |  members sold out of all regular slots: {}",
        board.updated_at.format("%Y-%m-%d %H:%M:%S UTC"),
        board.members_all_regular_sold_out
    );
    println!();

    // Header: start time plus sold-out count per slot, crowded marked with *
    let name_width = 22;
    let mut header = format!("{:<name_width$}", "member");
    let mut counts = format!("{:<name_width$}", "sold-out");
    for slot in &board.slots {
        let crowded = board.crowded.get(slot).copied().unwrap_or(false);
        let mark = if crowded { "*" } else { " " };
        header.push_str(&format!(" {:>5}{mark}", kanbai_engine::slots::start_time(slot)));
        counts.push_str(&format!(
            " {:>5}{mark}",
            board.sold_out_counts.get(slot).copied().unwrap_or(0)
        ));
    }
    println!("{header}");
    println!("{counts}");

    for member in board.rows_for_league(league) {
        let mut line = format!(
            "{:<name_width$}",
            format!(
                "{} ({}) [{}]",
                member.name,
                member.league,
                board.member_sales.get(&member.name).copied().unwrap_or(0)
            )
        );
        for state in board.display_row(member) {
            line.push_str(&format!(" {:>5} ", state.symbol()));
        }
        println!("{line}");
    }
}
