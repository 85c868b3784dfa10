//! Serial port transport for analyzer communication.
//!
//! This module provides [`SerialTransport`], which implements the
//! [`Transport`] trait for the analyzer's USB virtual COM port.
//!
//! The transport is created closed and opens the port on the first call to
//! [`Transport::open`]. Opening again while open is a no-op, and so is closing
//! a port that is already closed or was never opened. The device is a USB CDC
//! ACM endpoint, so the line settings are accepted but do not affect the link
//! speed.
//!
//! # Example
//!
//! ```no_run
//! use tinysa_transport::{SerialConfig, SerialTransport};
//! use tinysa_core::Transport;
//! use std::time::Duration;
//!
//! # async fn example() -> tinysa_core::Result<()> {
//! let mut transport = SerialTransport::new("/dev/ttyACM0", SerialConfig::default());
//! transport.open().await?;
//! transport.send(b"sweep\r").await?;
//!
//! let mut buf = [0u8; 256];
//! let n = transport.receive(&mut buf, Duration::from_secs(1)).await?;
//! transport.close().await?;
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use std::time::Duration;
use tinysa_core::error::{Error, Result};
use tinysa_core::transport::Transport;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_serial::{SerialPort, SerialPortBuilderExt, SerialStream};

/// Serial port configuration.
///
/// Defaults match a plain terminal session on the analyzer:
/// - 9600 baud (ignored by the CDC endpoint)
/// - 8 data bits, 1 stop bit, no parity
/// - No flow control
/// - DTR asserted after opening
#[derive(Debug, Clone)]
pub struct SerialConfig {
    /// Baud rate.
    pub baud_rate: u32,
    /// Number of data bits (typically 8)
    pub data_bits: DataBits,
    /// Number of stop bits (typically 1)
    pub stop_bits: StopBits,
    /// Parity checking (typically None)
    pub parity: Parity,
    /// Flow control (typically None)
    pub flow_control: FlowControl,
    /// Whether to assert DTR once the port is open.
    pub assert_dtr: bool,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud_rate: 9600,
            data_bits: DataBits::Eight,
            stop_bits: StopBits::One,
            parity: Parity::None,
            flow_control: FlowControl::None,
            assert_dtr: true,
        }
    }
}

/// Number of data bits per character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataBits {
    Seven,
    Eight,
}

impl From<DataBits> for tokio_serial::DataBits {
    fn from(bits: DataBits) -> Self {
        match bits {
            DataBits::Seven => tokio_serial::DataBits::Seven,
            DataBits::Eight => tokio_serial::DataBits::Eight,
        }
    }
}

/// Number of stop bits per character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopBits {
    One,
    Two,
}

impl From<StopBits> for tokio_serial::StopBits {
    fn from(bits: StopBits) -> Self {
        match bits {
            StopBits::One => tokio_serial::StopBits::One,
            StopBits::Two => tokio_serial::StopBits::Two,
        }
    }
}

/// Parity checking mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parity {
    None,
    Odd,
    Even,
}

impl From<Parity> for tokio_serial::Parity {
    fn from(parity: Parity) -> Self {
        match parity {
            Parity::None => tokio_serial::Parity::None,
            Parity::Odd => tokio_serial::Parity::Odd,
            Parity::Even => tokio_serial::Parity::Even,
        }
    }
}

/// Flow control mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowControl {
    None,
    Software,
    Hardware,
}

impl From<FlowControl> for tokio_serial::FlowControl {
    fn from(flow: FlowControl) -> Self {
        match flow {
            FlowControl::None => tokio_serial::FlowControl::None,
            FlowControl::Software => tokio_serial::FlowControl::Software,
            FlowControl::Hardware => tokio_serial::FlowControl::Hardware,
        }
    }
}

/// Map a read/write failure to the transport error taxonomy.
fn io_error(e: std::io::Error) -> Error {
    if e.kind() == std::io::ErrorKind::BrokenPipe || e.kind() == std::io::ErrorKind::NotConnected
    {
        Error::ConnectionLost
    } else {
        Error::Io(e)
    }
}

/// Serial port transport for the analyzer.
///
/// Holds at most one open [`SerialStream`]. The port path is fixed at
/// construction; the stream itself is created lazily by [`Transport::open`].
pub struct SerialTransport {
    /// The underlying serial port stream, present while open.
    port: Option<SerialStream>,
    /// Port path, used for opening and for logging.
    port_name: String,
    config: SerialConfig,
}

impl SerialTransport {
    /// Create a closed transport for the given port path.
    ///
    /// # Arguments
    ///
    /// * `port` - Serial port path (e.g., "/dev/ttyACM0" on Linux, "COM4" on Windows)
    /// * `config` - Line settings applied when the port is opened
    pub fn new(port: &str, config: SerialConfig) -> Self {
        SerialTransport {
            port: None,
            port_name: port.to_string(),
            config,
        }
    }

    /// Get the path of the serial port.
    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    /// The line settings used when opening.
    pub fn config(&self) -> &SerialConfig {
        &self.config
    }
}

#[async_trait]
impl Transport for SerialTransport {
    async fn open(&mut self) -> Result<()> {
        if self.port.is_some() {
            return Ok(());
        }

        let config = &self.config;
        tracing::debug!(
            port = %self.port_name,
            baud_rate = config.baud_rate,
            data_bits = ?config.data_bits,
            stop_bits = ?config.stop_bits,
            parity = ?config.parity,
            flow_control = ?config.flow_control,
            "Opening serial port"
        );

        let mut serial_stream = tokio_serial::new(&self.port_name, config.baud_rate)
            .data_bits(config.data_bits.into())
            .stop_bits(config.stop_bits.into())
            .parity(config.parity.into())
            .flow_control(config.flow_control.into())
            .open_native_async()
            .map_err(|e| {
                tracing::error!(port = %self.port_name, error = %e, "Failed to open serial port");
                Error::Connection(format!(
                    "failed to open serial port {}: {}",
                    self.port_name, e
                ))
            })?;

        // Some CDC firmwares hold their output until the host raises DTR.
        if config.assert_dtr {
            if let Err(e) = serial_stream.write_data_terminal_ready(true) {
                tracing::warn!(port = %self.port_name, error = %e, "Failed to assert DTR");
            }
        }

        tracing::info!(port = %self.port_name, "Serial port opened");
        self.port = Some(serial_stream);
        Ok(())
    }

    async fn send(&mut self, data: &[u8]) -> Result<()> {
        let port = self.port.as_mut().ok_or(Error::NotConnected)?;

        tracing::trace!(
            port = %self.port_name,
            bytes = data.len(),
            data = ?String::from_utf8_lossy(data),
            "Sending data"
        );

        port.write_all(data).await.map_err(|e| {
            tracing::error!(port = %self.port_name, error = %e, "Failed to send data");
            io_error(e)
        })?;

        // Flush so the whole command is on the wire before the echo is read.
        port.flush().await.map_err(|e| {
            tracing::error!(port = %self.port_name, error = %e, "Failed to flush serial port");
            Error::Io(e)
        })?;

        Ok(())
    }

    async fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize> {
        let port = self.port.as_mut().ok_or(Error::NotConnected)?;

        match tokio::time::timeout(timeout, port.read(buf)).await {
            Ok(Ok(n)) => {
                tracing::trace!(
                    port = %self.port_name,
                    bytes = n,
                    data = ?String::from_utf8_lossy(&buf[..n]),
                    "Received data"
                );
                Ok(n)
            }
            Ok(Err(e)) => {
                tracing::error!(port = %self.port_name, error = %e, "Failed to receive data");
                Err(io_error(e))
            }
            Err(_) => {
                tracing::trace!(
                    port = %self.port_name,
                    timeout_ms = timeout.as_millis(),
                    "Timeout waiting for data"
                );
                Err(Error::Timeout)
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(mut port) = self.port.take() {
            tracing::debug!(port = %self.port_name, "Closing serial port");

            if let Err(e) = port.flush().await {
                tracing::warn!(
                    port = %self.port_name,
                    error = %e,
                    "Failed to flush before closing (continuing anyway)"
                );
            }

            // Dropping the stream releases the device.
            tracing::info!(port = %self.port_name, "Serial port closed");
        }

        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.port.is_some()
    }
}

impl Drop for SerialTransport {
    fn drop(&mut self) {
        if self.port.is_some() {
            tracing::debug!(port = %self.port_name, "SerialTransport dropped, closing port");
        }
    }
}
