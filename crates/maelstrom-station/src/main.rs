//! Headless Maelstrom station.
//!
//! Runs one station without a renderer: the engine is driven at the
//! configured frame rate by a synthetic activity source, beacons go out on
//! the installation network, and telemetry snapshots are logged. With role
//! `none` the process runs the passive monitor instead.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration from `maelstrom-config.yaml` and apply
//!    `MAELSTROM_*` environment overrides
//! 3. Role `none`: run the monitor until Ctrl-C
//! 4. Otherwise: initialize the station facade and run the frame loop until
//!    Ctrl-C, then shut the facade down

use std::path::Path;
use std::time::Duration;

use maelstrom_core::config::MaelstromConfig;
use maelstrom_station::StationFacade;
use maelstrom_station::activity::{ActivitySource, SyntheticActivity};
use maelstrom_station::error::StationError;
use maelstrom_station::monitor::run_monitor;
use maelstrom_types::Role;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Application entry point for a station.
///
/// # Errors
///
/// Returns an error if configuration is invalid or the sockets cannot be
/// bound.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("maelstrom-station starting");

    // 2. Load configuration.
    let config = load_config()?;
    info!(
        role = %config.station.role,
        frame_rate = config.station.frame_rate,
        speed_modifier = config.station.speed_modifier,
        port = config.network.port,
        "Configuration loaded"
    );

    // 3. Monitor mode.
    if config.station.role == Role::None {
        run_monitor(&config, shutdown_signal()).await?;
        return Ok(());
    }

    // 4. Station mode.
    run_station(config).await?;
    Ok(())
}

async fn run_station(config: MaelstromConfig) -> Result<(), StationError> {
    let speed_modifier = config.station.speed_modifier;
    let frame = Duration::from_secs(1)
        .checked_div(config.station.frame_rate)
        .unwrap_or(Duration::from_millis(16));
    let mut activity = SyntheticActivity::from_optional_seed(config.station.seed);

    let mut station = StationFacade::new();
    station.initialize(config)?;

    let mut interval = tokio::time::interval(frame);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    let mut frames: u64 = 0;
    loop {
        tokio::select! {
            () = &mut shutdown => break,
            _ = interval.tick() => {
                let ratio = activity.next_ratio();
                let intensity = station.tick(ratio, speed_modifier);
                frames = frames.saturating_add(1);
                if let Some(report) = station.last_report().filter(|r| r.spike.is_some()) {
                    debug!(frames, ratio, intensity, spike = ?report.spike, "spike fired");
                }
            }
        }
    }

    info!(frames, "frame loop stopped");
    station.shutdown().await;
    Ok(())
}

/// Load configuration from `maelstrom-config.yaml` in the working directory.
///
/// Falls back to defaults (plus environment overrides) when the file does
/// not exist.
fn load_config() -> Result<MaelstromConfig, StationError> {
    let config_path = Path::new("maelstrom-config.yaml");
    let config = if config_path.exists() {
        MaelstromConfig::from_file(config_path)?
    } else {
        info!("Config file not found, using defaults");
        let mut config = MaelstromConfig::default();
        config.apply_env_overrides()?;
        config
    };
    config.validate()?;
    Ok(config)
}

/// Resolves on Ctrl-C. If the handler cannot be installed the process runs
/// until killed.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
