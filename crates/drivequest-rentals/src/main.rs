use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use drivequest_common::{logging, ConfigLoader};
use drivequest_rentals::domain::{Billable, Money, ReservationOperations, Vehicle, VehicleKind};
use drivequest_rentals::scheduler::Scheduler;
use drivequest_rentals::storage::export_reservations;
use drivequest_rentals::{RentalsConfig, Services};
use std::path::PathBuf;
use tokio::signal;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(author, version, long_about = None)]
#[command(name = "drivequest")]
#[command(about = "DriveQuest Rentals - fleet, reservation and billing management")]
struct Args {
    #[arg(short, long, global = true, help = "Path to configuration file")]
    config: Option<PathBuf>,

    #[command(flatten)]
    verbosity: Verbosity<InfoLevel>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print an example configuration file
    GenConfig,

    /// Load snapshots and run the reminder jobs until interrupted
    Run {
        /// Validate configuration and snapshots, then exit
        #[arg(long)]
        dry_run: bool,
    },

    /// Print an invoice without touching any store
    Quote {
        #[arg(long, value_enum)]
        kind: QuoteKind,

        #[arg(long)]
        days: u32,

        /// Daily rate
        #[arg(long)]
        rate: Money,

        /// Apply the vehicle-type discount
        #[arg(long)]
        discount: bool,

        #[arg(long, default_value = "QUOTE")]
        plate: String,
    },

    /// Write all reservations to a CSV file
    ExportReservations {
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Print entity counts and totals
    Summary,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum QuoteKind {
    Cargo,
    Passenger,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logging::init_logging(&args.verbosity, logging::DEFAULT_FILTER)?;

    if let Command::GenConfig = args.command {
        println!("{}", RentalsConfig::generate_example()?);
        return Ok(());
    }

    let config = RentalsConfig::load(args.config)?;
    config.validate()?;

    match args.command {
        Command::GenConfig => Ok(()),
        Command::Run { dry_run } => run(config, dry_run).await,
        Command::Quote {
            kind,
            days,
            rate,
            discount,
            plate,
        } => quote(&config, kind, days, rate, discount, &plate),
        Command::ExportReservations { output } => {
            let services = load_services(&config)?;
            let rows = export_reservations(&services.reservations.list_all(), &output)?;
            println!("Exported {rows} reservations to {}", output.display());
            Ok(())
        }
        Command::Summary => {
            let services = load_services(&config)?;
            println!("{}", serde_json::to_string_pretty(&services.summary())?);
            Ok(())
        }
    }
}

fn load_services(config: &RentalsConfig) -> Result<Services> {
    let services = Services::new(config);
    services
        .load_snapshots()
        .with_context(|| format!("Failed to load snapshots from {}", config.storage.data_dir.display()))?;
    Ok(services)
}

async fn run(config: RentalsConfig, dry_run: bool) -> Result<()> {
    info!("Starting DriveQuest Rentals");
    let services = load_services(&config)?;

    if dry_run {
        info!("Configuration and snapshots validated successfully (dry-run mode)");
        return Ok(());
    }

    let scheduler = Scheduler::new(config.scheduler.shutdown_grace());
    if config.scheduler.enabled {
        services.schedule_jobs(&scheduler, &config).await?;
    } else {
        info!("Scheduler disabled by configuration");
    }

    shutdown_signal().await;
    info!("Shutdown requested");

    scheduler.shutdown().await;
    if let Err(e) = services.save_snapshots() {
        error!("Failed to save snapshots: {}", e);
        return Err(e.into());
    }

    info!("DriveQuest Rentals stopped gracefully");
    Ok(())
}

fn quote(
    config: &RentalsConfig,
    kind: QuoteKind,
    days: u32,
    rate: Money,
    discount: bool,
    plate: &str,
) -> Result<()> {
    let kind = match kind {
        QuoteKind::Cargo => VehicleKind::Cargo { capacity_kg: 0.0 },
        QuoteKind::Passenger => VehicleKind::Passenger { seats: 1 },
    };
    let vehicle = Vehicle::new("quote", plate, "-", "-", 2000, rate, kind)?;
    let invoice = vehicle.invoice(&config.billing.policy(), days, rate, discount);
    print!("{}", invoice.render());
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
