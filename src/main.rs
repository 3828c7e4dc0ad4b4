use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;

use karis::agent::{AgentController, AgentParams, SeededJitter};
use karis::api::{self, AppState};
use karis::engine::ControlLoop;
use karis::messaging::InMemoryBus;
use karis::{KarisError, SimConfig};

#[derive(Parser)]
#[command(name = "karis-sim")]
#[command(about = "Simulated Karis transport agent", long_about = None)]
#[command(version)]
struct Cli {
    #[arg(help = "Name of the simulated karis, e.g. karis1")]
    name: String,

    #[arg(help = "Initial battery charge in permille", allow_negative_numbers = true)]
    initial_charge: i32,

    #[arg(help = "x coordinate of the starting position", allow_negative_numbers = true)]
    start_x: f64,

    #[arg(help = "y coordinate of the starting position", allow_negative_numbers = true)]
    start_y: f64,

    #[arg(long, help = "TOML simulation config")]
    config: Option<PathBuf>,

    #[arg(long, help = "Serve the command API on this port")]
    port: Option<u16>,

    #[arg(long, help = "Stop after this many ticks")]
    max_ticks: Option<u64>,

    #[arg(long, help = "Seed for fine-positioning jitter")]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        match e.downcast_ref::<KarisError>() {
            Some(karis) if karis.is_fatal() => {
                log::error!("{}. Please kill it now.", karis);
            }
            _ => log::error!("{:#}", e),
        }
        std::process::exit(1);
    }

    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => SimConfig::from_file(path).map_err(KarisError::from)?,
        None => SimConfig::default(),
    }
    .with_env_overrides()
    .map_err(KarisError::from)?;
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }

    let params = AgentParams::new(cli.name, cli.initial_charge, cli.start_x, cli.start_y);
    let jitter = Box::new(SeededJitter::from_optional_seed(config.seed));
    let controller = AgentController::new(params, &config, jitter)?;

    log::info!(
        "starting {} at ({}, {}) with charge {} at {} Hz",
        controller.name(),
        cli.start_x,
        cli.start_y,
        cli.initial_charge,
        config.loop_frequency_hz
    );

    let bus = Arc::new(InMemoryBus::new(config.history_capacity));
    let control = Arc::new(ControlLoop::new(controller, bus.clone(), &config)?);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(true);
        }
    });

    let server = match cli.port {
        Some(port) => {
            let state = AppState {
                control: control.clone(),
                bus,
                config: Arc::new(config.clone()),
            };
            Some(tokio::spawn(api::serve(
                state,
                port,
                wait_for_shutdown(shutdown_rx.clone()),
            )))
        }
        None => None,
    };

    let ticks = control
        .run(cli.max_ticks, wait_for_shutdown(shutdown_rx))
        .await?;

    let snapshot = control.snapshot().await;
    log::info!("stopped after {} ticks: {}", ticks, snapshot.status_line());

    if let Some(server) = server {
        server.abort();
    }

    Ok(())
}

async fn wait_for_shutdown(mut rx: watch::Receiver<bool>) {
    while !*rx.borrow() {
        if rx.changed().await.is_err() {
            // Sender gone: no shutdown will ever be signalled.
            std::future::pending::<()>().await;
        }
    }
}
