//! Mock transport for deterministic testing of the command shell.
//!
//! [`MockTransport`] implements the [`Transport`] trait with pre-loaded
//! request/response pairs. The response is the full byte stream the analyzer
//! would emit after the request: command echo, payload lines, and prompt.
//!
//! The mock is usually moved into a `Box<dyn Transport>`. Take a
//! [`MockHandle`] first to inspect what was sent afterwards.
//!
//! # Example
//!
//! ```
//! use tinysa_test_harness::MockTransport;
//!
//! let mut mock = MockTransport::new();
//! mock.expect(b"sweep\r", b"sweep\r\n0 300000000 450\r\nch> ");
//! let handle = mock.handle();
//! assert_eq!(handle.remaining_expectations(), 1);
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tinysa_core::error::{Error, Result};
use tinysa_core::transport::Transport;

/// A pre-loaded request/response pair for the mock transport.
#[derive(Debug, Clone)]
struct Expectation {
    /// The exact bytes we expect to be sent.
    request: Vec<u8>,
    /// The bytes to return once the matching request is received.
    response: Vec<u8>,
}

/// Script and record shared between a mock and its handles.
#[derive(Debug, Default)]
struct Record {
    /// Ordered queue of expected request/response pairs.
    expectations: VecDeque<Expectation>,
    /// Log of all bytes sent through the transport.
    sent_log: Vec<Vec<u8>>,
    open_count: usize,
    close_count: usize,
}

type SharedRecord = Arc<Mutex<Record>>;

fn lock(record: &SharedRecord) -> MutexGuard<'_, Record> {
    record.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Read access to a [`MockTransport`]'s record after the mock has been
/// handed to the code under test.
#[derive(Debug, Clone)]
pub struct MockHandle {
    record: SharedRecord,
}

impl MockHandle {
    /// Every `send()` payload so far, in order.
    pub fn sent_data(&self) -> Vec<Vec<u8>> {
        lock(&self.record).sent_log.clone()
    }

    /// Number of expectations not yet consumed.
    pub fn remaining_expectations(&self) -> usize {
        lock(&self.record).expectations.len()
    }

    /// Number of `open()` calls that actually opened the transport.
    pub fn open_count(&self) -> usize {
        lock(&self.record).open_count
    }

    /// Number of `close()` calls that actually closed the transport.
    pub fn close_count(&self) -> usize {
        lock(&self.record).close_count
    }
}

/// A mock [`Transport`] for testing without hardware.
///
/// The mock starts closed, like a real serial transport, and counts how
/// often it is opened and closed. Expectations are consumed in order. When
/// `send()` is called, the sent data is recorded and matched against the next
/// expectation; the corresponding response is then delivered by subsequent
/// `receive()` calls, at most [`chunk_size`](Self::set_chunk_size) bytes at a
/// time. Once the response is exhausted, `receive()` times out.
#[derive(Debug)]
pub struct MockTransport {
    record: SharedRecord,
    /// Bytes waiting to be returned by `receive()`.
    pending: VecDeque<u8>,
    /// Largest number of bytes returned by a single `receive()`.
    chunk_size: usize,
    /// Whether the transport is "connected".
    connected: bool,
    /// Error message returned by the next `open()`, if set.
    open_failure: Option<String>,
    /// Scheduled `receive()` failure: calls left to pass, then the error kind.
    receive_failure: Option<(usize, std::io::ErrorKind)>,
}

impl MockTransport {
    /// Create a new, closed mock transport.
    pub fn new() -> Self {
        MockTransport {
            record: SharedRecord::default(),
            pending: VecDeque::new(),
            chunk_size: usize::MAX,
            connected: false,
            open_failure: None,
            receive_failure: None,
        }
    }

    /// Add an expected request/response pair.
    pub fn expect(&mut self, request: &[u8], response: &[u8]) {
        lock(&self.record).expectations.push_back(Expectation {
            request: request.to_vec(),
            response: response.to_vec(),
        });
    }

    /// A handle that observes this mock's record, including after the mock
    /// has been boxed.
    pub fn handle(&self) -> MockHandle {
        MockHandle {
            record: Arc::clone(&self.record),
        }
    }

    /// Deliver responses in pieces of at most `size` bytes.
    ///
    /// Used to exercise reassembly of lines split across reads.
    pub fn set_chunk_size(&mut self, size: usize) {
        self.chunk_size = size.max(1);
    }

    /// Make every subsequent `open()` fail with [`Error::Connection`].
    pub fn fail_open(&mut self, reason: &str) {
        self.open_failure = Some(reason.to_string());
    }

    /// Make the next `receive()` return an I/O error of `kind`.
    pub fn fail_next_receive(&mut self, kind: std::io::ErrorKind) {
        self.fail_receive_after(0, kind);
    }

    /// Let `skip` further `receive()` calls through, then fail one with `kind`.
    ///
    /// Replaces any failure scheduled earlier.
    pub fn fail_receive_after(&mut self, skip: usize, kind: std::io::ErrorKind) {
        self.receive_failure = Some((skip, kind));
    }

    /// Return all data that has been sent through this transport.
    ///
    /// Each element is the byte slice from one `send()` call.
    pub fn sent_data(&self) -> Vec<Vec<u8>> {
        self.handle().sent_data()
    }

    /// Return the number of expectations that have not yet been consumed.
    pub fn remaining_expectations(&self) -> usize {
        self.handle().remaining_expectations()
    }

    /// Number of `open()` calls that actually opened the transport.
    pub fn open_count(&self) -> usize {
        self.handle().open_count()
    }

    /// Number of `close()` calls that actually closed the transport.
    pub fn close_count(&self) -> usize {
        self.handle().close_count()
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn open(&mut self) -> Result<()> {
        if let Some(reason) = &self.open_failure {
            return Err(Error::Connection(reason.clone()));
        }
        if !self.connected {
            self.connected = true;
            lock(&self.record).open_count += 1;
        }
        Ok(())
    }

    async fn send(&mut self, data: &[u8]) -> Result<()> {
        if !self.connected {
            return Err(Error::NotConnected);
        }

        let expectation = {
            let mut record = lock(&self.record);
            record.sent_log.push(data.to_vec());
            record.expectations.pop_front()
        }
        .ok_or_else(|| Error::Protocol("no more expectations in mock transport".into()))?;
        if data != expectation.request.as_slice() {
            return Err(Error::Protocol(format!(
                "unexpected send data: expected {:?}, got {:?}",
                String::from_utf8_lossy(&expectation.request),
                String::from_utf8_lossy(data)
            )));
        }
        self.pending.extend(expectation.response);
        Ok(())
    }

    async fn receive(&mut self, buf: &mut [u8], _timeout: Duration) -> Result<usize> {
        if !self.connected {
            return Err(Error::NotConnected);
        }
        match self.receive_failure.take() {
            Some((0, kind)) => return Err(Error::Io(std::io::Error::from(kind))),
            Some((skip, kind)) => self.receive_failure = Some((skip - 1, kind)),
            None => {}
        }
        if self.pending.is_empty() {
            return Err(Error::Timeout);
        }

        let n = self.pending.len().min(buf.len()).min(self.chunk_size);
        for (slot, byte) in buf.iter_mut().zip(self.pending.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    async fn close(&mut self) -> Result<()> {
        if self.connected {
            self.connected = false;
            lock(&self.record).close_count += 1;
        }
        self.pending.clear();
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}
