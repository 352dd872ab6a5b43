use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use digit_vision::DigitModel;
use guess_core::{GuessSession, LoopExit, Pacer, Prompts, Startup, run_loop, start_game};
use guess_service::config::Config;
use guess_service::connection_check::check_connection;
use guess_service::misty_adapter::MistyDevice;
use guess_service::{prompt_loader, render};
use std::path::{Path, PathBuf};
use tokio::sync::watch;
use tracing_subscriber::fmt::time::ChronoLocal;

#[derive(Parser)]
#[command(version, about = "Show-me-a-digit game for a Misty robot")]
struct Cli {
    /// Robot address, e.g. 192.168.1.20. Falls back to MISTY_ADDRESS.
    #[arg(long, global = true)]
    address: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Connect and run the guessing loop until Ctrl-C.
    Play,
    /// Grab a single camera frame to check the connection.
    Probe {
        /// Where to save the captured frame.
        #[arg(long, default_value = "misty_temp_image.jpg")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // --- 1. Load Configuration ---
    let config = Config::from_env().context("Failed to load application configuration")?;

    // --- 2. Initialize Logging ---
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(ChronoLocal::rfc_3339())
        .init();

    // --- 3. Parse Command-Line Arguments ---
    let cli = Cli::parse();
    let address = cli
        .address
        .or_else(|| config.misty_address.clone())
        .context("No device address: pass --address or set MISTY_ADDRESS")?;

    let device = MistyDevice::new(&address, config.request_timeout)?;

    match cli.command {
        Command::Play => play(&config, &address, device).await,
        Command::Probe { out } => probe(&device, &out).await,
    }
}

async fn probe(device: &MistyDevice, out: &Path) -> Result<()> {
    match check_connection(device.client(), out).await {
        Ok(line) => {
            println!("{line}");
            Ok(())
        }
        Err(line) => {
            println!("{line}");
            anyhow::bail!("connection test did not get a frame")
        }
    }
}

async fn play(config: &Config, address: &str, device: MistyDevice) -> Result<()> {
    // --- 4. Load Prompts ---
    let prompts = match prompt_loader::load_prompts(&config.prompts_dir) {
        Ok(map) => {
            tracing::info!("Loaded {} prompt templates.", map.len());
            Prompts::from_map(&map)
        }
        Err(e) => {
            tracing::warn!("{:#}. Using built-in prompts.", e);
            Prompts::default()
        }
    };

    // --- 5. Load the Classifier ---
    // A broken model does not stop us from connecting; it stops the game.
    let model = DigitModel::load(&config.model_path).map_err(|e| e.to_string());

    // --- 6. Connect ---
    let mut session = GuessSession::new(prompts, config.confidence_threshold);
    let model = match start_game(&mut session, address, &device, model)
        .await
        .with_context(|| format!("Failed to connect to the robot at {address}"))?
    {
        Startup::Playing(model) => model,
        Startup::RecognitionDisabled(_) => {
            session.stop();
            return Ok(());
        }
    };

    // --- 7. Run the Loop and the Render Sink ---
    let (stop_tx, stop_rx) = watch::channel(false);
    let (report_tx, report_rx) = watch::channel(None);
    let pacer = Pacer::new(config.frame_period);

    let render_handle = tokio::spawn(render::run(report_rx, config.frame_output.clone()));

    let mut loop_handle = tokio::spawn(async move {
        let exit = run_loop(&mut session, &device, &model, &pacer, stop_rx, report_tx).await;
        session.stop();
        exit
    });

    let finished = tokio::select! {
        res = &mut loop_handle => res,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received Ctrl-C, shutting down...");
            let _ = stop_tx.send(true);
            loop_handle.await
        }
    };

    match finished {
        Ok(LoopExit::Stopped) => tracing::info!("Session ended."),
        Ok(LoopExit::Faulted(e)) => tracing::error!("Session ended after an unexpected error: {}", e),
        Err(e) => tracing::error!("Session task aborted: {}", e),
    }

    if let Err(e) = render_handle.await {
        tracing::warn!("Render task ended abnormally: {}", e);
    }
    tracing::info!("Shutting down...");
    Ok(())
}
