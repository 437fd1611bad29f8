#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter for Dice Defense: runs the multi-session server or a
//! headless single-session simulation.

mod simulate;

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use dice_defense_core::UnitKind;
use dice_defense_server::{listener, Scheduler, ServerConfig, SessionRegistry};
use tokio::{net::TcpListener, sync::watch};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "dice-defense", about = "Dice Defense simulation engine", version)]
struct Cli {
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// Runs the TCP server hosting any number of sessions.
    Serve(ServeArgs),
    /// Runs one session headlessly with a scripted bot and prints a report.
    Simulate(SimulateArgs),
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Optional TOML configuration file
    #[arg(long, short, env = "DICE_DEFENSE_CONFIG")]
    config: Option<PathBuf>,

    /// Address to listen on
    #[arg(long)]
    bind: Option<String>,

    /// Scheduler tick rate (Hz)
    #[arg(long)]
    tick_rate_hz: Option<f32>,

    /// Scheduler ticks between snapshot broadcasts
    #[arg(long)]
    broadcast_every: Option<u32>,

    /// Seed for room codes and dice rolls
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Args, Debug)]
struct SimulateArgs {
    /// Simulated seconds to run
    #[arg(long, default_value_t = 120.0)]
    seconds: f32,

    /// Simulation tick rate (Hz)
    #[arg(long, default_value_t = 30.0)]
    tick_rate_hz: f32,

    /// Seed for dice rolls and spawns
    #[arg(long, default_value_t = 7)]
    seed: u64,

    /// Comma separated unit kinds forming the deck
    #[arg(long, value_delimiter = ',', default_value = "fire,electric,wind,poison,ice")]
    deck: Vec<UnitKind>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

/// Entry point for the Dice Defense command-line interface.
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("dice_defense=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.mode {
        Mode::Serve(args) => {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .context("failed to start async runtime")?;
            runtime.block_on(serve(args))
        }
        Mode::Simulate(args) => simulate(&args),
    }
}

async fn serve(args: ServeArgs) -> Result<()> {
    let mut config =
        ServerConfig::load(args.config.as_deref()).context("failed to load configuration")?;
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if let Some(tick_rate_hz) = args.tick_rate_hz {
        config.tick_rate_hz = tick_rate_hz;
    }
    if let Some(broadcast_every) = args.broadcast_every {
        config.broadcast_every = broadcast_every;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    let deck = config.deck().context("invalid default deck")?;

    let scheduler = Arc::new(Scheduler::new(
        config.tick_interval(),
        config.broadcast_every,
    ));
    let registry = Arc::new(SessionRegistry::new(Arc::clone(&scheduler), config.seed));
    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    info!(
        tick_rate_hz = config.tick_rate_hz,
        broadcast_every = config.broadcast_every,
        "starting dice-defense server"
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let ticker = {
        let scheduler = Arc::clone(&scheduler);
        let shutdown = shutdown_rx.clone();
        tokio::spawn(async move { scheduler.run(shutdown).await })
    };
    let server = tokio::spawn(listener::serve(listener, registry, deck, shutdown_rx));

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    info!("shutting down");
    let _ = shutdown_tx.send(true);

    ticker.await.context("scheduler task failed")?;
    server.await.context("listener task failed")??;
    Ok(())
}

fn simulate(args: &SimulateArgs) -> Result<()> {
    let report = simulate::run(&args.deck, args.seconds, args.tick_rate_hz, args.seed)?;
    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("failed to encode report")?
        );
        return Ok(());
    }

    println!("ticks:          {}", report.ticks);
    println!("summons:        {}", report.summons);
    println!("merges:         {}", report.merges);
    println!("mobs killed:    {}", report.kills);
    println!("mobs escaped:   {}", report.leaks);
    println!("waves cleared:  {}", report.waves_cleared);
    if let Some(state) = &report.state {
        println!(
            "final state:    wave {} ({:?}), lives {}, sp {}, units {}",
            state.wave,
            state.phase,
            state.lives,
            state.sp,
            state.occupied_cells()
        );
    }
    Ok(())
}
