// In app/src/main.rs

use anyhow::Result;
use app_config::{FeedMode, Settings};
use chrono::Utc;
use clap::{Parser, Subcommand};
use engine::{Engine, RunnerSnapshot};
use events::WsMessage;
use self::tracing_layer::WsBroadcastLayer;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinError;
use tracing_subscriber::prelude::*;
use web_server::{AppState, WsCache};
mod tracing_layer;

// --- Command-Line Interface Definition ---

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = "A forex strategy signal runner with a live dashboard API.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Runs the strategy runner and the dashboard web server until Ctrl-C.
    Run,

    /// Prints the strategy catalog.
    Strategies,

    /// Runs a headless simulated session and prints the signal log.
    Simulate {
        /// Number of price ticks to simulate.
        #[arg(short, long, default_value_t = 100)]
        ticks: u32,

        /// Print the final snapshot as JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
}

// --- Main Application Entry Point ---

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from a .env file, if it exists.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    if let Commands::Strategies = cli.command {
        print_strategies();
        return Ok(());
    }

    let settings = app_config::load_settings()?;

    // --- WebSocket and Tracing Setup ---
    let (ws_tx, _) = broadcast::channel::<WsMessage>(1024);
    let ws_cache = web_server::new_ws_cache();
    init_tracing(&settings, ws_tx.clone());

    tracing::info!(environment = %settings.app.environment, "Starting FX strategy runner");

    match cli.command {
        Commands::Run => {
            run_app(settings, ws_tx, ws_cache).await?;
        }
        Commands::Simulate { ticks, json } => {
            handle_simulate(settings, ticks, json, ws_tx).await?;
        }
        Commands::Strategies => {}
    }

    tracing::info!("FX strategy runner has finished successfully.");

    Ok(())
}

fn init_tracing(settings: &Settings, ws_tx: broadcast::Sender<WsMessage>) {
    let level = settings
        .app
        .log_level
        .parse::<tracing::Level>()
        .unwrap_or(tracing::Level::INFO);

    let ws_layer = WsBroadcastLayer::new(ws_tx);
    let fmt_layer = tracing_subscriber::fmt::layer().with_filter(
        tracing_subscriber::filter::Targets::new()
            .with_target("hyper", tracing::Level::WARN)
            .with_default(level),
    );
    let ws_filter = tracing_subscriber::filter::Targets::new().with_default(tracing::Level::INFO);
    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(ws_layer.with_filter(ws_filter))
        .init();
}

// --- "Run" Subcommand Logic ---

/// Starts the runner and the web server and waits for Ctrl-C or a task failure.
async fn run_app(settings: Settings, ws_tx: broadcast::Sender<WsMessage>, ws_cache: WsCache) -> Result<()> {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // --- 1. Component Instantiation ---
    let recorder = web_server::spawn_cache_recorder(&ws_tx, ws_cache.clone());
    let (runner, handle) = Engine::new(settings.clone(), ws_tx.clone()).build()?;
    let app_state = AppState {
        runner: handle,
        ws_tx,
        ws_cache,
    };

    // --- 2. Launch Concurrent Tasks ---
    tracing::info!("Launching strategy runner and web server tasks...");
    let mut runner_task = tokio::spawn(runner.run(shutdown_rx.clone()));
    let mut server_task = tokio::spawn(web_server::run(settings.server.clone(), app_state, shutdown_rx));

    let failure = tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            if let Err(e) = signal {
                tracing::warn!(error = %e, "Failed to listen for Ctrl-C, shutting down.");
            }
            tracing::info!("Shutdown requested.");
            None
        }
        result = &mut runner_task => Some(task_failure("Strategy runner", result)),
        result = &mut server_task => Some(task_failure("Web server", result)),
    };

    // --- 3. Shutdown ---
    shutdown_tx.send_replace(true);
    recorder.abort();

    if let Some(error) = failure {
        tracing::error!(error = %error, "A critical task terminated. Shutting down.");
        return Err(error);
    }

    let (runner_result, server_result) = tokio::join!(runner_task, server_task);
    runner_result??;
    server_result??;
    Ok(())
}

fn task_failure<E>(name: &str, result: std::result::Result<std::result::Result<(), E>, JoinError>) -> anyhow::Error
where
    E: Into<anyhow::Error>,
{
    match result {
        Ok(Ok(())) => anyhow::anyhow!("{} stopped unexpectedly", name),
        Ok(Err(e)) => Into::<anyhow::Error>::into(e).context(format!("{} failed", name)),
        Err(e) => anyhow::Error::new(e).context(format!("{} task panicked", name)),
    }
}

// --- "Strategies" Subcommand Logic ---

fn print_strategies() {
    println!("{:<20} {:<20} {:<8} DESCRIPTION", "ID", "NAME", "COLOR");
    for strategy in strategies::STRATEGIES.iter() {
        let marker = if strategy.id == strategies::DEFAULT_STRATEGY_ID { " (default)" } else { "" };
        println!(
            "{:<20} {:<20} {:<8} {}{}",
            strategy.id, strategy.name, strategy.color, strategy.description, marker
        );
    }
}

// --- "Simulate" Subcommand Logic ---

/// Drives a simulated session on a virtual clock, with no timers or server.
async fn handle_simulate(
    mut settings: Settings,
    ticks: u32,
    json: bool,
    ws_tx: broadcast::Sender<WsMessage>,
) -> Result<()> {
    settings.feed.mode = FeedMode::Simulated;
    let price_ms = settings.feed.poll_interval_ms;
    let signal_ms = settings.signals.interval_ms;

    let (mut runner, handle) = Engine::new(settings, ws_tx).build()?;
    tracing::info!(ticks, pair = %runner.state().pair, "Starting simulated session.");

    let mut now = Utc::now();
    let mut elapsed_ms: u64 = 0;
    let mut next_signal_ms = signal_ms;
    for _ in 0..ticks {
        now += chrono::Duration::milliseconds(price_ms as i64);
        elapsed_ms += price_ms;
        runner.on_price_tick(now).await;
        while elapsed_ms >= next_signal_ms {
            runner.on_signal_tick(now);
            next_signal_ms += signal_ms;
        }
    }

    let snapshot = handle.snapshot();
    if json {
        println!("{}", serde_json::to_string_pretty(snapshot.as_ref())?);
    } else {
        print_report(&snapshot);
    }
    Ok(())
}

fn print_report(snapshot: &RunnerSnapshot) {
    println!("\n--- {} @ {} ---", snapshot.pair, snapshot.current_price);
    println!(
        "{:<8} {:<20} {:<4} {:>9} {:>9} {:>9} {:<6} {:<4} {:>8}",
        "TIME", "STRATEGY", "SIDE", "ENTRY", "STOP", "TARGET", "STATUS", "RES", "PNL %"
    );
    for s in &snapshot.signals {
        println!(
            "{:<8} {:<20} {:<4} {:>9} {:>9} {:>9} {:<6} {:<4} {:>8.4}",
            s.time, s.strategy, s.side, s.entry, s.stop, s.target, s.status, s.result, s.pnl
        );
    }

    let stats = &snapshot.stats;
    println!(
        "\nSignals: {} ({} open, {} closed) | Wins: {} Losses: {} | Win rate: {:.1}% | Total P&L: {:.4}%",
        stats.total, stats.open, stats.closed, stats.wins, stats.losses, stats.win_rate, stats.total_pnl
    );
    println!("Prediction: {}", snapshot.prediction);
    if let Some(error) = &snapshot.last_error {
        println!("Last feed error: {}", error);
    }
}
