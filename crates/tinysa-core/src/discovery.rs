//! Device discovery by USB identity.
//!
//! The analyzer enumerates as a USB virtual COM port. Discovery walks the
//! serial endpoints reported by a [`PortSource`] and returns the first one
//! whose USB vendor/product pair matches. The source is a trait so that tests
//! and tools can supply a fixed list instead of the operating system's.

use crate::error::{Error, Result};
use crate::types::UsbId;

/// One serial endpoint as reported by the operating system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    /// System path of the endpoint (e.g. `/dev/ttyACM0` or `COM4`).
    pub path: String,
    /// USB identity, if the endpoint is a USB device.
    pub usb: Option<UsbId>,
}

impl PortInfo {
    /// A USB-backed endpoint.
    pub fn usb(path: &str, id: UsbId) -> Self {
        PortInfo {
            path: path.to_string(),
            usb: Some(id),
        }
    }

    /// A non-USB endpoint (PCI, Bluetooth, pseudo terminal).
    pub fn other(path: &str) -> Self {
        PortInfo {
            path: path.to_string(),
            usb: None,
        }
    }
}

/// A source of serial endpoints to search.
pub trait PortSource: Send + Sync {
    /// Enumerate the endpoints currently available.
    fn ports(&self) -> Result<Vec<PortInfo>>;
}

/// Return the path of the first endpoint whose USB identity equals `id`.
///
/// Returns [`Error::DeviceNotFound`] if no endpoint matches. Enumeration
/// errors from the source are propagated unchanged.
pub fn find_device(source: &dyn PortSource, id: UsbId) -> Result<String> {
    source
        .ports()?
        .into_iter()
        .find(|port| port.usb == Some(id))
        .map(|port| port.path)
        .ok_or(Error::DeviceNotFound {
            vid: id.vid,
            pid: id.pid,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedPorts(Vec<PortInfo>);

    impl PortSource for FixedPorts {
        fn ports(&self) -> Result<Vec<PortInfo>> {
            Ok(self.0.clone())
        }
    }

    struct BrokenPorts;

    impl PortSource for BrokenPorts {
        fn ports(&self) -> Result<Vec<PortInfo>> {
            Err(Error::Io(std::io::Error::other("udev unavailable")))
        }
    }

    #[test]
    fn finds_first_matching_port() {
        let source = FixedPorts(vec![
            PortInfo::other("/dev/ttyS0"),
            PortInfo::usb("/dev/ttyUSB0", UsbId::new(0x1a86, 0x7523)),
            PortInfo::usb("/dev/ttyACM0", UsbId::TINYSA),
            PortInfo::usb("/dev/ttyACM1", UsbId::TINYSA),
        ]);
        assert_eq!(find_device(&source, UsbId::TINYSA).unwrap(), "/dev/ttyACM0");
    }

    #[test]
    fn no_match_is_device_not_found() {
        let source = FixedPorts(vec![PortInfo::usb(
            "/dev/ttyUSB0",
            UsbId::new(0x1a86, 0x7523),
        )]);
        let err = find_device(&source, UsbId::TINYSA).unwrap_err();
        assert!(matches!(
            err,
            Error::DeviceNotFound {
                vid: 0x0483,
                pid: 0x5740
            }
        ));
    }

    #[test]
    fn empty_source_is_device_not_found() {
        let err = find_device(&FixedPorts(Vec::new()), UsbId::TINYSA).unwrap_err();
        assert!(matches!(err, Error::DeviceNotFound { .. }));
    }

    #[test]
    fn custom_identity_is_honoured() {
        let id = UsbId::new(0x1209, 0x0001);
        let source = FixedPorts(vec![
            PortInfo::usb("/dev/ttyACM0", UsbId::TINYSA),
            PortInfo::usb("/dev/ttyACM1", id),
        ]);
        assert_eq!(find_device(&source, id).unwrap(), "/dev/ttyACM1");
    }

    #[test]
    fn enumeration_error_propagates() {
        let err = find_device(&BrokenPorts, UsbId::TINYSA).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
