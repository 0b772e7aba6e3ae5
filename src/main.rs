mod clock;
mod config;
mod gpio;
mod host;
mod monitor;
mod pins;

use clap::Parser;
use clock::WallClock;
use config::MonitorConfig;
use gpio::RppalPinBank;
use host::SystemHost;
use monitor::ShutdownMonitor;
use pins::SimPinBank;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Shutdown monitor for the Sleepy Pi power management board: assert a
/// liveness pin at startup, poll a shutdown-request pin, and halt the host
/// when the request is seen.
#[derive(Parser, Debug)]
#[command(name = "sleepwatch", version, about)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "sleepwatch.toml")]
    config: PathBuf,

    /// Shutdown-request input pin, BCM numbering (overrides config)
    #[arg(long)]
    input_pin: Option<u8>,

    /// Liveness output pin, BCM numbering (overrides config)
    #[arg(long)]
    output_pin: Option<u8>,

    /// Poll interval in milliseconds (overrides config)
    #[arg(long)]
    poll_interval_ms: Option<u64>,

    /// Validate config and run the startup sequence against simulated pins,
    /// don't touch hardware
    #[arg(long)]
    dry_run: bool,

    /// Extra logging (per-sample decisions, config resolution)
    #[arg(short, long)]
    verbose: bool,
}

/// Merge CLI overrides into the loaded config.
fn apply_overrides(config: &mut MonitorConfig, cli: &Cli) {
    if let Some(pin) = cli.input_pin {
        config.pins.shutdown_request = pin;
    }
    if let Some(pin) = cli.output_pin {
        config.pins.liveness = pin;
    }
    if let Some(interval) = cli.poll_interval_ms {
        config.poll.interval_ms = interval;
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();

    tracing::info!("sleepwatch starting");
    tracing::debug!(?cli, "parsed CLI arguments");

    let mut config = MonitorConfig::load(&cli.config)?;
    apply_overrides(&mut config, &cli);
    tracing::debug!(?config, "resolved configuration");

    if cli.dry_run {
        println!("sleepwatch v{}", env!("CARGO_PKG_VERSION"));
        println!("Config file: {}", cli.config.display());
        println!("Shutdown-request pin (BCM): {}", config.pins.shutdown_request);
        println!("Liveness pin (BCM): {}", config.pins.liveness);
        println!("Poll interval: {}ms", config.poll.interval_ms);
        println!(
            "Shutdown command: {} {}",
            config.shutdown.command,
            config.shutdown.args.join(" ")
        );

        // Exercise the startup contract against the simulated bank so a
        // misconfiguration fails here instead of at boot on the Pi.
        let host = SystemHost::new(&config.shutdown);
        let mut monitor = ShutdownMonitor::new(&config, SimPinBank::new(), host, WallClock);
        monitor.start()?;
        println!("Dry run mode — startup sequence validated, not running.");
        return Ok(());
    }

    let pins = RppalPinBank::new()?;
    let host = SystemHost::new(&config.shutdown);
    let mut monitor = ShutdownMonitor::new(&config, pins, host, WallClock);

    // The loop only ends once a shutdown request has been handed to the
    // host; at that point the OS is already going down around us.
    monitor.run().await?;
    Ok(())
}
