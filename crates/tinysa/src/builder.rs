//! TinySaBuilder -- fluent builder for constructing [`TinySa`] instances.
//!
//! Separates configuration from construction so that callers can choose the
//! serial port (or let it be discovered by USB identity), line settings, and
//! read timeout before the analyzer handle exists. Building never opens the
//! port; that happens on the first command.
//!
//! # Example
//!
//! ```no_run
//! use tinysa::builder::TinySaBuilder;
//! use std::time::Duration;
//!
//! # async fn example() -> tinysa_core::Result<()> {
//! let mut sa = TinySaBuilder::new()
//!     .serial_port("/dev/ttyACM0")
//!     .read_timeout(Duration::from_millis(500))
//!     .build()
//!     .await?;
//! let sweep = sa.get_sweep().await?;
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use tracing::debug;

use tinysa_core::discovery::{PortSource, find_device};
use tinysa_core::error::{Error, Result};
use tinysa_core::transport::Transport;
use tinysa_core::types::UsbId;
use tinysa_transport::{SerialConfig, SerialTransport, SystemPorts};

use crate::analyzer::{DEFAULT_POINTS, TinySa};
use crate::shell::Shell;

/// Default inactivity timeout for one read attempt.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(1);

/// Fluent builder for [`TinySa`].
///
/// With no port configured, [`build()`](Self::build) looks for a USB serial
/// endpoint matching [`usb_id()`](Self::usb_id), which defaults to
/// [`UsbId::TINYSA`].
pub struct TinySaBuilder {
    serial_port: Option<String>,
    usb_id: UsbId,
    baud_rate: Option<u32>,
    serial_config: SerialConfig,
    read_timeout: Duration,
    points: usize,
}

impl TinySaBuilder {
    /// Create a builder with default settings.
    pub fn new() -> Self {
        TinySaBuilder {
            serial_port: None,
            usb_id: UsbId::TINYSA,
            baud_rate: None,
            serial_config: SerialConfig::default(),
            read_timeout: DEFAULT_READ_TIMEOUT,
            points: DEFAULT_POINTS,
        }
    }

    /// Set the serial port path (e.g. `/dev/ttyACM0` or `COM4`), skipping
    /// discovery.
    pub fn serial_port(mut self, port: &str) -> Self {
        self.serial_port = Some(port.to_string());
        self
    }

    /// USB identity to look for when no port is set.
    pub fn usb_id(mut self, id: UsbId) -> Self {
        self.usb_id = id;
        self
    }

    /// Override the baud rate of the serial config.
    pub fn baud_rate(mut self, baud: u32) -> Self {
        self.baud_rate = Some(baud);
        self
    }

    /// Replace the serial line settings.
    pub fn serial_config(mut self, config: SerialConfig) -> Self {
        self.serial_config = config;
        self
    }

    /// Set the inactivity timeout for one read attempt (default: 1s).
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Set the initial point count for computed frequency axes (default: 101).
    pub fn points(mut self, points: usize) -> Self {
        self.points = points;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.points == 0 {
            return Err(Error::InvalidParameter("points must be at least 1".into()));
        }
        if self.read_timeout.is_zero() {
            return Err(Error::InvalidParameter("read_timeout must be non-zero".into()));
        }
        Ok(())
    }

    /// The configured port, or the first endpoint in `source` matching the
    /// USB identity.
    pub fn resolve_port(&self, source: &dyn PortSource) -> Result<String> {
        match &self.serial_port {
            Some(port) => Ok(port.clone()),
            None => {
                let port = find_device(source, self.usb_id)?;
                debug!(port = %port, usb_id = %self.usb_id, "discovered analyzer");
                Ok(port)
            }
        }
    }

    /// Build a [`TinySa`] with a caller-provided transport.
    ///
    /// This is the primary entry point for testing (pass a
    /// `MockTransport` from `tinysa-test-harness`) and for
    /// advanced use cases where the caller manages the transport
    /// lifecycle directly.
    pub async fn build_with_transport(self, transport: Box<dyn Transport>) -> Result<TinySa> {
        self.validate()?;
        let shell = Shell::new(transport, self.read_timeout);
        Ok(TinySa::new(shell, self.serial_port, self.points))
    }

    /// Build a [`TinySa`] on a serial transport, discovering the port in
    /// `source` if none was set.
    pub async fn build_with_ports(mut self, source: &dyn PortSource) -> Result<TinySa> {
        self.validate()?;
        let port = self.resolve_port(source)?;

        let mut config = self.serial_config.clone();
        if let Some(baud) = self.baud_rate {
            config.baud_rate = baud;
        }
        let transport = SerialTransport::new(&port, config);
        self.serial_port = Some(port);
        self.build_with_transport(Box::new(transport)).await
    }

    /// Build a [`TinySa`] on a serial transport, discovering the port among
    /// the system's serial endpoints if none was set.
    pub async fn build(self) -> Result<TinySa> {
        self.build_with_ports(&SystemPorts).await
    }
}

impl Default for TinySaBuilder {
    fn default() -> Self {
        Self::new()
    }
}
