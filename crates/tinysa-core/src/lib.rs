//! tinysa-core: Core traits, types, and error definitions for tinySA control.
//!
//! This crate defines the device-agnostic pieces shared by the transport,
//! the protocol driver, and the applications built on top of them. Consumers
//! that only correlate measurements (heatmap renderers, exporters) can depend
//! on these types without pulling in a serial stack.
//!
//! # Key types
//!
//! - [`Transport`] -- byte-level communication channel with lazy open
//! - [`PortSource`] -- enumerable serial endpoints, for discovery
//! - [`SweepRange`] / [`FrequencyAxis`] -- the analyzer's frequency model
//! - [`Peak`] -- the strongest bin of one measurement
//! - [`Error`] / [`Result`] -- error handling

pub mod discovery;
pub mod error;
pub mod helpers;
pub mod transport;
pub mod types;

// Re-export key types at crate root for ergonomic `use tinysa_core::*`.
pub use discovery::{PortInfo, PortSource, find_device};
pub use error::{Error, Result};
pub use helpers::{dbm_to_dbuv, find_peak, format_freq_mhz};
pub use transport::Transport;
pub use types::*;
