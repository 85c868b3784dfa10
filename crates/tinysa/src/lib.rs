//! # tinysa -- tinySA spectrum analyzer control
//!
//! `tinysa` drives a tinySA spectrum analyzer through the text command shell
//! it exposes on its USB serial port. It reads and sets the sweep, builds or
//! fetches the frequency axis, and pulls measurement arrays that callers
//! correlate with that axis by index.
//!
//! ## Quick Start
//!
//! ```no_run
//! use tinysa::{StartFallback, TinySaBuilder};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // No port given: the analyzer is found by its USB identity.
//!     let mut sa = TinySaBuilder::new().build().await?;
//!
//!     sa.initialize(&StartFallback::default()).await?;
//!     if let Some(peak) = sa.measure_peak(tinysa::DEFAULT_CHANNEL).await? {
//!         println!("{:.1} dBm at {} Hz", peak.dbm, peak.freq_hz);
//!     }
//!
//!     sa.close().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! | Crate                  | Purpose                                          |
//! |------------------------|--------------------------------------------------|
//! | `tinysa-core`          | [`Transport`] trait, sweep/axis types, errors    |
//! | `tinysa-transport`     | Serial transport and USB discovery               |
//! | `tinysa-test-harness`  | Mock transport and port list for tests           |
//! | **`tinysa`**           | Protocol, command shell, acquisition model       |
//!
//! Inside this crate, [`protocol`] frames bytes, [`commands`] builds command
//! lines and parses responses, [`shell`] runs one request/response exchange
//! at a time, and [`analyzer`] holds the frequency axis.
//!
//! ## Error Handling
//!
//! Transport failures surface as [`Error`]. A response the parsers cannot
//! use is not an error: it yields an empty array or `None`, and the caller
//! decides whether to ask again. Nothing is retried internally.

pub mod analyzer;
pub mod builder;
pub mod commands;
pub mod protocol;
pub mod shell;

pub use analyzer::{DEFAULT_CHANNEL, DEFAULT_POINTS, TinySa};
pub use builder::{DEFAULT_READ_TIMEOUT, TinySaBuilder};

pub use tinysa_core::{
    AxisSource, Error, FrequencyAxis, Peak, Result, StartFallback, SweepRange, Transport, UsbId,
    dbm_to_dbuv, find_peak, format_freq_mhz,
};
pub use tinysa_transport::{SerialConfig, SerialTransport};
