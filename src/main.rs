use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use route_replay::config::ReplaySettings;
use route_replay::core::{route::recorded_span, PlaybackError, RoutePoint};
use route_replay::input::load_route;
use route_replay::playback::{DriverError, PlaybackDriver, PlaybackEvent};
use route_replay::source::{FleetFile, VehicleSource};
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "route-replay", about = "Replay vehicle route history", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the vehicles reported on a date
    Vehicles {
        /// Fleet database (JSON)
        #[arg(long)]
        fleet: PathBuf,
        /// Date as YYYY-MM-DD
        #[arg(long)]
        date: NaiveDate,
    },
    /// Animate a vehicle's route history in the terminal
    Replay {
        /// Fleet database (JSON); needs --vehicle and --date
        #[arg(long, conflicts_with = "route")]
        fleet: Option<PathBuf>,
        #[arg(long, requires = "fleet")]
        vehicle: Option<String>,
        #[arg(long, requires = "fleet")]
        date: Option<NaiveDate>,
        /// Route history file (CSV or JSON)
        #[arg(long)]
        route: Option<PathBuf>,
        /// Playback speed multiplier, defaults to the saved setting
        #[arg(long)]
        speed: Option<f64>,
        /// Full-route duration at 1x, in milliseconds
        #[arg(long)]
        base_duration_ms: Option<u64>,
        /// Remember --speed as the default
        #[arg(long)]
        save: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Vehicles { fleet, date } => list_vehicles(fleet, date).await,
        Command::Replay {
            fleet,
            vehicle,
            date,
            route,
            speed,
            base_duration_ms,
            save,
        } => {
            let mut settings = ReplaySettings::load();
            let remember = if save { speed } else { None };
            let speed = speed.unwrap_or(settings.default_speed as f64);
            // One-off override, never persisted
            if let Some(ms) = base_duration_ms {
                settings.base_duration_ms = ms;
            }

            let points = match (fleet, route) {
                (Some(fleet), _) => {
                    let vehicle = vehicle.context("--vehicle is required with --fleet")?;
                    let date = date.context("--date is required with --fleet")?;
                    let source = FleetFile::load(&fleet)?;
                    source.fetch_history(&vehicle, date).await?
                }
                (None, Some(route)) => load_route(&route)?,
                (None, None) => anyhow::bail!("Either --fleet or --route is required"),
            };

            replay(points, speed, &settings, remember).await
        }
    }
}

async fn list_vehicles(fleet: PathBuf, date: NaiveDate) -> Result<()> {
    let source = FleetFile::load(&fleet)?;
    let vehicles = source.fetch_vehicles(date).await?;
    if vehicles.is_empty() {
        println!("No vehicles on {}", date);
        return Ok(());
    }
    for vehicle in vehicles {
        println!(
            "{} {:<12} {:<10} ({:.4}, {:.4})",
            vehicle.icon(),
            vehicle.vehicle_no,
            vehicle.status_kind(),
            vehicle.latitude,
            vehicle.longitude
        );
    }
    Ok(())
}

async fn replay(
    points: Vec<RoutePoint>,
    speed: f64,
    settings: &ReplaySettings,
    remember: Option<f64>,
) -> Result<()> {
    if let Some(span) = recorded_span(&points) {
        info!("Route covers {} minutes of recorded time", span.num_minutes());
    }

    let handle = PlaybackDriver::spawn(settings);
    let mut events = handle.subscribe().await?;

    match handle.start(points, speed).await {
        Ok(()) => {
            // Persist the accepted speed on top of the stored settings
            if let Some(speed) = remember {
                ReplaySettings::load().with_default_speed(speed)?.save()?;
            }
        }
        Err(DriverError::Playback(PlaybackError::EmptyRoute)) => {
            println!("No route history to replay");
            handle.shutdown().await;
            return Ok(());
        }
        Err(e) => {
            handle.shutdown().await;
            return Err(e.into());
        }
    }

    let mut stdout = std::io::stdout();
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(PlaybackEvent::Progress(p)) => {
                    write!(
                        stdout,
                        "\r{:>3}%  x={:>10.5} y={:>10.5}",
                        p.percent().round(),
                        p.position.x,
                        p.position.y
                    )?;
                    stdout.flush()?;
                }
                Some(PlaybackEvent::Complete) => {
                    writeln!(stdout, "\nDone")?;
                    break;
                }
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                debug!("Interrupted, stopping playback");
                handle.stop().await?;
                writeln!(stdout, "\nStopped")?;
                break;
            }
        }
    }

    handle.shutdown().await;
    Ok(())
}
