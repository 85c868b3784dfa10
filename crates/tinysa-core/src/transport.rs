//! Transport trait for analyzer communication.
//!
//! The [`Transport`] trait abstracts over the physical link to the analyzer.
//! The serial implementation lives in `tinysa-transport`; a scripted mock for
//! deterministic tests lives in `tinysa-test-harness`.
//!
//! A transport starts out closed. [`Transport::open`] establishes the link
//! and may be called any number of times; [`Transport::close`] releases it and
//! is equally safe to repeat, including on a transport that was never opened.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::Result;

/// Asynchronous byte-level transport to the analyzer.
///
/// Implementations own at most one live handle at a time. Protocol-level
/// concerns (line splitting, the `ch>` prompt) are handled by the command
/// shell that consumes this trait.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Open the link if it is not already open.
    ///
    /// Returns [`Error::Connection`](crate::error::Error::Connection) if the
    /// device cannot be opened.
    async fn open(&mut self) -> Result<()>;

    /// Send raw bytes to the device.
    ///
    /// Implementations must write and flush the whole slice before returning,
    /// so a command is never interleaved with a later read.
    async fn send(&mut self, data: &[u8]) -> Result<()>;

    /// Receive bytes into the provided buffer.
    ///
    /// Returns the number of bytes actually read. Waits up to `timeout`;
    /// returns [`Error::Timeout`](crate::error::Error::Timeout) if nothing
    /// arrives within the deadline.
    async fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize>;

    /// Close the link. A no-op if the link is already closed.
    async fn close(&mut self) -> Result<()>;

    /// Check whether the link is currently open.
    fn is_connected(&self) -> bool;
}
