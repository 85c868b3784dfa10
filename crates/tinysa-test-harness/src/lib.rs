//! tinysa-test-harness: Test utilities for tinySA code.
//!
//! This crate provides [`MockTransport`] for deterministic unit testing of
//! the command shell and acquisition model without an analyzer attached, and
//! [`StaticPorts`] for testing discovery against a fixed port list.

pub mod mock_ports;
pub mod mock_serial;

pub use mock_ports::StaticPorts;
pub use mock_serial::{MockHandle, MockTransport};
