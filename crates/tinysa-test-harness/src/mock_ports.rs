//! Fixed port list for discovery tests.

use tinysa_core::discovery::{PortInfo, PortSource};
use tinysa_core::error::Result;
use tinysa_core::types::UsbId;

/// A [`PortSource`] that always reports the same endpoints.
///
/// ```
/// use tinysa_core::{UsbId, find_device};
/// use tinysa_test_harness::StaticPorts;
///
/// let ports = StaticPorts::new()
///     .with_other("/dev/ttyS0")
///     .with_usb("/dev/ttyACM0", UsbId::TINYSA);
/// assert_eq!(find_device(&ports, UsbId::TINYSA).unwrap(), "/dev/ttyACM0");
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticPorts {
    ports: Vec<PortInfo>,
}

impl StaticPorts {
    /// An empty port list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a USB endpoint with the given identity.
    pub fn with_usb(mut self, path: &str, id: UsbId) -> Self {
        self.ports.push(PortInfo::usb(path, id));
        self
    }

    /// Add a non-USB endpoint.
    pub fn with_other(mut self, path: &str) -> Self {
        self.ports.push(PortInfo::other(path));
        self
    }
}

impl PortSource for StaticPorts {
    fn ports(&self) -> Result<Vec<PortInfo>> {
        Ok(self.ports.clone())
    }
}
