//! # Bebop Pilot
//!
//! Fly a Parrot Bebop class drone with an ordinary gamepad.
//!
//! This application translates analog stick deflection into drone motion
//! commands on a fixed 10ms tick, dispatches button presses to discrete
//! actions (take off, land, emergency stop, recording), and optionally
//! relays the drone's video feed through ffmpeg.
//!
//! Run with `--calibrate` to interactively bind your controller's buttons
//! and axes instead of flying.

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::{mpsc, watch};
use tokio::time::Duration;
use tracing::{info, warn};

use bebop_pilot::args::Args;
use bebop_pilot::config::Config;
use bebop_pilot::controller::bindings::ActionBindingTable;
use bebop_pilot::controller::calibration::{run_session, CalibrationSession};
use bebop_pilot::controller::events::InputEvent;
use bebop_pilot::controller::joystick::Joystick;
use bebop_pilot::flight::actuator::{DroneActuator, DryRunActuator};
use bebop_pilot::flight::control_loop::ControlLoop;
use bebop_pilot::video::VideoRelay;

/// Capacity of the gamepad event channel.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Capacity of the video frame channel between the drone backend and ffmpeg.
const VIDEO_CHANNEL_CAPACITY: usize = 64;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut config = Config::load_or_default(&args.config)
        .with_context(|| format!("loading configuration from {}", args.config))?;

    if let Some(bindings) = &args.bindings {
        config.controller.bindings_path = bindings.clone();
    }
    if let Some(device) = &args.device {
        config.controller.device_path = device.clone();
    }

    // Logs go to a file so the terminal stays free for calibration prompts.
    let file_appender = tracing_appender::rolling::never(&config.log.dir, "bebop-pilot.log");
    let (file_writer, _log_guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log.level)),
        )
        .with_writer(file_writer)
        .with_ansi(false)
        .init();

    info!("Bebop Pilot v{} starting...", env!("CARGO_PKG_VERSION"));

    let joystick = Joystick::open(&config.controller.device_path)?;
    info!(
        "Gamepad opened at {} ({})",
        joystick.device_path(),
        joystick.name().unwrap_or("unnamed")
    );

    let (event_tx, mut event_rx) = mpsc::channel::<InputEvent>(EVENT_CHANNEL_CAPACITY);
    let guid = joystick.guid();
    let controller_name = joystick.name().unwrap_or("gamepad").to_string();
    let _pump = joystick.spawn_event_pump(event_tx);

    if args.calibrate {
        return calibrate(&config, controller_name, guid, &mut event_rx).await;
    }

    fly(&config, event_rx).await
}

/// Walks the interactive calibration and writes the binding file.
async fn calibrate(
    config: &Config,
    controller_name: String,
    guid: String,
    events: &mut mpsc::Receiver<InputEvent>,
) -> Result<()> {
    println!("Calibrating '{}'", controller_name);

    let session = CalibrationSession::new(controller_name, guid);
    let step_timeout = Duration::from_secs(config.controller.calibration_step_timeout_s);
    let table = run_session(session, events, step_timeout).await?;

    table.save(&config.controller.bindings_path)?;
    println!("Bindings written to {}", config.controller.bindings_path);
    Ok(())
}

/// Runs the flight control loop until Ctrl+C.
async fn fly(config: &Config, events: mpsc::Receiver<InputEvent>) -> Result<()> {
    let bindings = load_bindings(&config.controller.bindings_path);
    info!("Using binding table '{}' ({} actions)", bindings.name(), bindings.len());

    // Drone backends hook in through the actuator trait; the stock binary
    // logs every command it would issue.
    let mut actuator = DryRunActuator::new();

    let video = if config.video.enabled {
        let (frame_tx, frame_rx) = mpsc::channel(VIDEO_CHANNEL_CAPACITY);
        actuator.video_sink(frame_tx)?;
        Some(VideoRelay::spawn(
            &config.video.ffmpeg_path,
            &config.video.output_url,
            frame_rx,
        )?)
    } else {
        None
    };

    let control = ControlLoop::new(actuator, bindings)
        .with_thresholds(config.control.translation_threshold, config.control.yaw_threshold);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl+C, shutting down...");
            let _ = shutdown_tx.send(true);
        }
    });

    info!("Press Ctrl+C to exit");
    control
        .run(
            events,
            shutdown_rx,
            Duration::from_millis(config.control.tick_period_ms),
        )
        .await;

    if let Some(video) = video {
        video.shutdown().await;
    }
    Ok(())
}

/// Loads the binding file, falling back to the reference layout when it does
/// not exist yet.
fn load_bindings(path: &str) -> ActionBindingTable {
    if std::path::Path::new(path).exists() {
        match ActionBindingTable::load(path) {
            Ok(table) => return table,
            Err(e) => {
                warn!("Failed to load bindings from {}: {}", path, e);
            }
        }
    } else {
        info!("No binding file at {}, using the reference layout", path);
    }
    ActionBindingTable::reference_defaults()
}
