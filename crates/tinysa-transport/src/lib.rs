//! Transport implementations for tinySA analyzers.
//!
//! This crate provides the concrete [`Transport`](tinysa_core::Transport)
//! for the analyzer's USB virtual COM port, plus discovery of that port by
//! USB vendor/product identity:
//!
//! - [`SerialTransport`]: lazily opened serial connection
//! - [`discovery`]: enumerate serial endpoints and pick the analyzer
//!
//! # Example
//!
//! ```no_run
//! use tinysa_core::{Transport, UsbId};
//! use tinysa_transport::{SerialConfig, SerialTransport, discovery};
//! use std::time::Duration;
//!
//! # async fn example() -> tinysa_core::Result<()> {
//! let path = discovery::discover(UsbId::TINYSA)?;
//! let mut transport = SerialTransport::new(&path, SerialConfig::default());
//!
//! // The port is opened on first use.
//! transport.open().await?;
//! transport.send(b"version\r").await?;
//!
//! let mut buf = [0u8; 256];
//! let n = transport.receive(&mut buf, Duration::from_secs(1)).await?;
//! # Ok(())
//! # }
//! ```

pub mod discovery;
pub mod serial;

pub use discovery::{SystemPorts, discover};
pub use serial::{DataBits, FlowControl, Parity, SerialConfig, SerialTransport, StopBits};
