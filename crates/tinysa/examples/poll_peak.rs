//! Peak monitor.
//!
//! Reads the analyzer's sweep and frequency list once, then measures the
//! live trace at a fixed interval and prints the strongest bin. Polling is
//! driven here by comparing elapsed time; the library never schedules
//! anything on its own.
//!
//! # Requirements
//!
//! - A tinySA connected over USB (found automatically by its USB identity)
//!
//! # Usage
//!
//! ```sh
//! cargo run -p tinysa --example poll_peak
//! ```

use std::time::{Duration, Instant};

use tinysa::{DEFAULT_CHANNEL, StartFallback, TinySaBuilder, dbm_to_dbuv, format_freq_mhz};

/// Time between measurements.
const INTERVAL: Duration = Duration::from_millis(500);
/// Number of measurements to take.
const SAMPLES: usize = 20;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut sa = TinySaBuilder::new().build().await?;
    println!("Connected to tinySA on {}", sa.port_name().unwrap_or("?"));

    match sa.initialize(&StartFallback::default()).await? {
        Some(sweep) => println!(
            "Sweep: {} to {}, {} points",
            format_freq_mhz(sweep.start_hz),
            format_freq_mhz(sweep.stop_hz),
            sa.frequencies().map_or(0, <[f64]>::len)
        ),
        None => println!("Sweep range not reported by the device"),
    }

    let mut last = None::<Instant>;
    let mut taken = 0;
    while taken < SAMPLES {
        if last.is_some_and(|t| t.elapsed() < INTERVAL) {
            tokio::time::sleep(Duration::from_millis(10)).await;
            continue;
        }
        last = Some(Instant::now());
        taken += 1;

        match sa.measure_peak(DEFAULT_CHANNEL).await? {
            Some(peak) => println!(
                "{:>3}: {:7.1} dBm ({:6.1} dBuV) at {}",
                taken,
                peak.dbm,
                dbm_to_dbuv(peak.dbm),
                format_freq_mhz(peak.freq_hz)
            ),
            None => println!("{taken:>3}: no data"),
        }
    }

    sa.close().await?;
    Ok(())
}
