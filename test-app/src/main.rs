// tinysa test application -- CLI tool for exercising a tinySA spectrum
// analyzer over its USB serial command shell.
//
// Usage:
//   tinysa-test-app discover
//   tinysa-test-app sweep get
//   tinysa-test-app --port /dev/ttyACM0 sweep set --start 1000000 --stop 350000000
//   tinysa-test-app frequencies
//   tinysa-test-app data --channel 2
//   tinysa-test-app peak --compute
//   tinysa-test-app poll --interval 0.5 --csv
//   tinysa-test-app raw version
//
// Logging goes to stderr; set RUST_LOG or pass -v / -vv for more detail.

mod export;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use chrono::Local;
use clap::{ArgAction, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use tinysa::{
    DEFAULT_CHANNEL, StartFallback, TinySa, TinySaBuilder, UsbId, dbm_to_dbuv, format_freq_mhz,
};
use tinysa_core::PortSource;
use tinysa_transport::SystemPorts;

use crate::export::PeakLog;

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// tinysa test application -- talks to a tinySA from the command line.
#[derive(Parser)]
#[command(name = "tinysa-test-app", version, about)]
struct Cli {
    /// Serial port path (e.g. /dev/ttyACM0, COM4).
    /// When omitted the port is discovered by USB vendor/product ID.
    #[arg(long)]
    port: Option<String>,

    /// Override the serial baud rate (the USB link ignores it).
    #[arg(long)]
    baud: Option<u32>,

    /// Inactivity timeout for one read attempt, in milliseconds.
    #[arg(long, default_value_t = 1000)]
    timeout_ms: u64,

    /// USB vendor ID used for discovery (hex, e.g. 0x0483).
    #[arg(long, value_parser = parse_hex_u16, default_value = "0x0483")]
    vid: u16,

    /// USB product ID used for discovery (hex, e.g. 0x5740).
    #[arg(long, value_parser = parse_hex_u16, default_value = "0x5740")]
    pid: u16,

    /// Point count for computed frequency axes.
    #[arg(long)]
    points: Option<usize>,

    /// Sweep starts at or below 0 Hz are reported as this frequency (MHz).
    #[arg(long, default_value_t = 10.0)]
    start_fallback_mhz: f64,

    /// More log output (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

/// Parse a hex string like "0x0483" or "0483" into a u16.
fn parse_hex_u16(s: &str) -> std::result::Result<u16, String> {
    let s = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    u16::from_str_radix(s, 16).map_err(|e| format!("invalid hex value: {e}"))
}

#[derive(Subcommand)]
enum Command {
    /// List serial ports and show which one is the analyzer.
    Discover,

    /// Sweep range operations.
    Sweep {
        #[command(subcommand)]
        action: SweepAction,
    },

    /// Fetch and print the device's frequency list.
    Frequencies,

    /// Print one measurement array.
    Data {
        /// Data buffer to read.
        #[arg(long, default_value_t = DEFAULT_CHANNEL)]
        channel: u8,
    },

    /// Load the frequency axis and print the strongest bin.
    Peak {
        /// Data buffer to read.
        #[arg(long, default_value_t = 0)]
        channel: u8,

        /// Compute the axis from the sweep instead of fetching it.
        #[arg(long)]
        compute: bool,
    },

    /// Measure the peak repeatedly until Ctrl-C.
    Poll {
        /// Data buffer to read.
        #[arg(long, default_value_t = 0)]
        channel: u8,

        /// Seconds between measurements.
        #[arg(long, default_value_t = 0.5)]
        interval: f64,

        /// Stop after this many measurements (0 = run until Ctrl-C).
        #[arg(long, default_value_t = 0)]
        count: u64,

        /// Append each peak to a timestamped CSV file.
        #[arg(long)]
        csv: bool,

        /// Directory for the CSV file.
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
    },

    /// Send a raw shell command and print the response.
    Raw {
        /// Command words, e.g. `version` or `marker 1`.
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },
}

#[derive(Subcommand)]
enum SweepAction {
    /// Print the current sweep range.
    Get,

    /// Set the sweep start and/or stop frequency.
    Set {
        /// Start frequency in Hz.
        #[arg(long)]
        start: Option<f64>,

        /// Stop frequency in Hz.
        #[arg(long)]
        stop: Option<f64>,
    },
}

// ---------------------------------------------------------------------------
// Setup
// ---------------------------------------------------------------------------

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn start_fallback(cli: &Cli) -> StartFallback {
    StartFallback {
        replacement_hz: cli.start_fallback_mhz * 1_000_000.0,
        ..StartFallback::default()
    }
}

async fn connect(cli: &Cli) -> Result<TinySa> {
    let mut builder = TinySaBuilder::new()
        .usb_id(UsbId::new(cli.vid, cli.pid))
        .read_timeout(Duration::from_millis(cli.timeout_ms));
    if let Some(port) = &cli.port {
        builder = builder.serial_port(port);
    }
    if let Some(baud) = cli.baud {
        builder = builder.baud_rate(baud);
    }
    if let Some(points) = cli.points {
        builder = builder.points(points);
    }

    let sa = builder.build().await.context("failed to set up tinySA")?;
    info!(port = sa.port_name().unwrap_or("?"), "using tinySA");
    Ok(sa)
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn cmd_discover(id: UsbId) -> Result<()> {
    let ports = SystemPorts.ports().context("failed to list serial ports")?;
    if ports.is_empty() {
        println!("No serial ports found.");
    }
    for port in &ports {
        let usb = port.usb.map_or_else(|| "-".to_string(), |u| u.to_string());
        let mark = if port.usb == Some(id) { "  <- tinySA" } else { "" };
        println!("{:<24} {usb}{mark}", port.path);
    }

    let path = tinysa_transport::discover(id)?;
    println!("\nAnalyzer ({id}) at {path}");
    Ok(())
}

async fn cmd_sweep_get(sa: &mut TinySa) -> Result<()> {
    match sa.get_sweep().await? {
        Some(sweep) => {
            println!("Start:   {}", format_freq_mhz(sweep.start_hz));
            println!("Stop:    {}", format_freq_mhz(sweep.stop_hz));
            match sweep.points {
                Some(points) => println!("Points:  {points}"),
                None => println!("Points:  (not reported)"),
            }
        }
        None => println!("Sweep range not reported by the device."),
    }
    Ok(())
}

async fn cmd_sweep_set(sa: &mut TinySa, start: Option<f64>, stop: Option<f64>) -> Result<()> {
    if start.is_none() && stop.is_none() {
        bail!("give --start and/or --stop");
    }
    if let (Some(start), Some(stop)) = (start, stop) {
        if start > stop {
            bail!("start frequency {start} Hz is above stop frequency {stop} Hz");
        }
    }

    sa.set_sweep(start, stop).await?;
    if let Some(start) = start {
        println!("Sweep start set to {}", format_freq_mhz(start));
    }
    if let Some(stop) = stop {
        println!("Sweep stop set to {}", format_freq_mhz(stop));
    }
    Ok(())
}

async fn cmd_frequencies(sa: &mut TinySa) -> Result<()> {
    let axis = sa.fetch_frequencies().await?;
    for (i, freq) in axis.values().iter().enumerate() {
        println!("{i:>4}  {freq:.0}");
    }
    println!("{} points", axis.len());
    Ok(())
}

async fn cmd_data(sa: &mut TinySa, channel: u8) -> Result<()> {
    let levels = sa.data(channel).await?;
    for (i, dbm) in levels.iter().enumerate() {
        println!("{i:>4}  {dbm:8.2} dBm");
    }
    println!("{} values", levels.len());
    Ok(())
}

/// Establish the frequency axis used to correlate measurements.
async fn load_axis(sa: &mut TinySa, fallback: &StartFallback, compute: bool) -> Result<()> {
    if !compute {
        sa.initialize(fallback).await?;
    } else {
        let Some(sweep) = sa.get_sweep().await?.map(|s| fallback.apply(s)) else {
            bail!("device did not report a sweep range");
        };
        let points = sweep.points.map(|p| p as usize);
        sa.set_frequencies(sweep.start_hz, sweep.stop_hz, points);
    }

    if sa.frequencies().is_none_or(<[f64]>::is_empty) {
        warn!("frequency axis is empty; peaks cannot be located");
    }
    Ok(())
}

fn print_peak(peak: &tinysa::Peak) {
    println!(
        "{:7.2} dBm  {:6.2} dBuV  at {}",
        peak.dbm,
        dbm_to_dbuv(peak.dbm),
        format_freq_mhz(peak.freq_hz)
    );
}

async fn cmd_peak(
    sa: &mut TinySa,
    fallback: &StartFallback,
    channel: u8,
    compute: bool,
) -> Result<()> {
    load_axis(sa, fallback, compute).await?;
    match sa.measure_peak(channel).await? {
        Some(peak) => print_peak(&peak),
        None => println!("No data."),
    }
    Ok(())
}

async fn cmd_poll(
    sa: &mut TinySa,
    fallback: &StartFallback,
    channel: u8,
    interval: f64,
    count: u64,
    mut log: Option<&mut PeakLog<std::fs::File>>,
) -> Result<()> {
    let interval = Duration::try_from_secs_f64(interval)
        .with_context(|| format!("invalid interval: {interval}"))?;
    load_axis(sa, fallback, false).await?;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut last: Option<Instant> = None;
    let mut taken = 0u64;
    println!("Polling every {interval:?}, Ctrl-C to stop.");
    while count == 0 || taken < count {
        let wait = last.map_or(Duration::ZERO, |t| interval.saturating_sub(t.elapsed()));
        tokio::select! {
            biased;
            res = &mut ctrl_c => {
                res.context("failed to listen for Ctrl-C")?;
                break;
            }
            _ = tokio::time::sleep(wait) => {}
        }

        last = Some(Instant::now());
        taken += 1;
        match sa.measure_peak(channel).await? {
            Some(peak) => {
                print_peak(&peak);
                if let Some(log) = log.as_deref_mut() {
                    log.append(Local::now(), &peak)?;
                }
            }
            None => println!("No data."),
        }
    }

    println!("{taken} measurements.");
    Ok(())
}

async fn cmd_raw(sa: &mut TinySa, words: &[String]) -> Result<()> {
    let command = words.join(" ");
    let response = sa.execute(&command).await?;
    print!("{response}");
    Ok(())
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

async fn run(cli: &Cli, sa: &mut TinySa) -> Result<()> {
    let fallback = start_fallback(cli);
    match &cli.command {
        Command::Discover => unreachable!("discover handled above"),
        Command::Sweep { action } => match action {
            SweepAction::Get => cmd_sweep_get(sa).await,
            SweepAction::Set { start, stop } => cmd_sweep_set(sa, *start, *stop).await,
        },
        Command::Frequencies => cmd_frequencies(sa).await,
        Command::Data { channel } => cmd_data(sa, *channel).await,
        Command::Peak { channel, compute } => cmd_peak(sa, &fallback, *channel, *compute).await,
        Command::Poll {
            channel,
            interval,
            count,
            csv,
            output_dir,
        } => {
            let mut log = None;
            if *csv {
                let (peak_log, path) = PeakLog::create(output_dir)?;
                println!("Logging to {}", path.display());
                log = Some(peak_log);
            }
            cmd_poll(sa, &fallback, *channel, *interval, *count, log.as_mut()).await
        }
        Command::Raw { command } => cmd_raw(sa, command).await,
    }
}

/// Close the analyzer at shutdown. A failure here only gets logged, so it
/// cannot mask the command's own result.
async fn disconnect(sa: &mut TinySa) {
    if let Err(e) = sa.close().await {
        warn!(error = %e, "failed to close tinySA");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // The `discover` command does not need a connection.
    if matches!(&cli.command, Command::Discover) {
        return cmd_discover(UsbId::new(cli.vid, cli.pid));
    }

    let mut sa = connect(&cli).await?;
    let result = run(&cli, &mut sa).await;
    disconnect(&mut sa).await;
    result
}
