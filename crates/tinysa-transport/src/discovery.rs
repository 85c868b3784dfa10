//! Operating-system serial port enumeration.
//!
//! [`SystemPorts`] adapts `tokio_serial::available_ports` to the
//! [`PortSource`] trait from `tinysa-core`, and [`discover`] runs the USB
//! identity match against it.
//!
//! ```no_run
//! use tinysa_core::UsbId;
//! use tinysa_transport::discovery;
//!
//! # fn example() -> tinysa_core::Result<()> {
//! let path = discovery::discover(UsbId::TINYSA)?;
//! println!("tinySA at {path}");
//! # Ok(())
//! # }
//! ```

use tinysa_core::discovery::{PortInfo, PortSource, find_device};
use tinysa_core::error::{Error, Result};
use tinysa_core::types::UsbId;
use tokio_serial::{SerialPortInfo, SerialPortType};

/// The serial endpoints currently known to the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemPorts;

impl PortSource for SystemPorts {
    fn ports(&self) -> Result<Vec<PortInfo>> {
        let ports = tokio_serial::available_ports().map_err(|e| {
            tracing::error!(error = %e, "Failed to enumerate serial ports");
            Error::Connection(format!("failed to enumerate serial ports: {e}"))
        })?;
        Ok(ports.into_iter().map(port_info).collect())
    }
}

fn port_info(port: SerialPortInfo) -> PortInfo {
    let usb = match port.port_type {
        SerialPortType::UsbPort(usb) => Some(UsbId::new(usb.vid, usb.pid)),
        _ => None,
    };
    PortInfo {
        path: port.port_name,
        usb,
    }
}

/// Find the serial path of the first connected device with the given USB identity.
///
/// Returns [`Error::DeviceNotFound`] if nothing matches.
pub fn discover(id: UsbId) -> Result<String> {
    let path = find_device(&SystemPorts, id)?;
    tracing::debug!(port = %path, usb_id = %id, "Discovered device");
    Ok(path)
}
