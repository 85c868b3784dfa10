//! Command shell -- request/response exchange with the analyzer.
//!
//! [`Shell`] owns the [`Transport`] and the bytes received but not yet
//! consumed. Every exchange runs to completion before the next one starts:
//!
//! 1. open the transport if needed,
//! 2. write the command line,
//! 3. read and discard the echoed command (errors ignored),
//! 4. collect result lines until the `ch>` prompt or a read times out.
//!
//! Reads are bounded by the per-read timeout, so a silent or half-finished
//! response returns whatever complete lines arrived instead of blocking. No
//! command is ever retried here; that decision belongs to the caller.

use std::time::Duration;

use bytes::BytesMut;
use tracing::{debug, trace, warn};

use tinysa_core::error::{Error, Result};
use tinysa_core::transport::Transport;

use crate::protocol::{self, ResponseAccumulator};

/// Size of the scratch buffer for a single transport read.
const READ_CHUNK: usize = 256;

/// Line-oriented command channel to the analyzer.
pub struct Shell {
    transport: Box<dyn Transport>,
    /// Received bytes not yet consumed by a line or response.
    rx_buf: BytesMut,
    read_timeout: Duration,
}

impl Shell {
    /// Wrap a transport. The transport is not opened until first use.
    pub fn new(transport: Box<dyn Transport>, read_timeout: Duration) -> Self {
        Shell {
            transport,
            rx_buf: BytesMut::with_capacity(1024),
            read_timeout,
        }
    }

    /// Inactivity timeout applied to each read attempt.
    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    /// Whether the underlying transport is open.
    pub fn is_open(&self) -> bool {
        self.transport.is_connected()
    }

    /// Open the transport if it is not already open.
    pub async fn ensure_open(&mut self) -> Result<()> {
        self.transport.open().await
    }

    /// Close the transport and drop any buffered input.
    ///
    /// Safe to call repeatedly and on a shell that was never opened.
    pub async fn close(&mut self) -> Result<()> {
        self.rx_buf.clear();
        self.transport.close().await
    }

    /// Write one command line, appending `\r` if it is missing.
    ///
    /// The transport writes and flushes the whole line before returning.
    pub async fn write_line(&mut self, text: &str) -> Result<()> {
        self.write_raw(&protocol::encode_command(text)).await
    }

    async fn write_raw(&mut self, line: &[u8]) -> Result<()> {
        self.ensure_open().await?;
        debug!(command = %display_command(line), "sending command");
        self.transport.send(line).await
    }

    /// Read one `\n`-terminated line, without its terminator.
    ///
    /// Returns early with whatever arrived if a read attempt times out,
    /// which is an empty string when nothing arrived at all. Invalid UTF-8
    /// is replaced rather than rejected. Transport errors propagate.
    pub async fn read_line(&mut self) -> Result<String> {
        self.ensure_open().await?;
        loop {
            if let Some(line) = protocol::split_line(&mut self.rx_buf) {
                return Ok(protocol::decode_line(&line));
            }
            if self.fill().await? == 0 {
                let partial = self.rx_buf.split();
                return Ok(protocol::decode_line(&partial));
            }
        }
    }

    /// Send an encoded command line and return its response text.
    ///
    /// `command` is a complete line as built by [`protocol::encode_command`]
    /// or the builders in [`crate::commands`].
    ///
    /// The echo line and the prompt are not part of the returned text; each
    /// returned line ends in `\n`. The text is empty if the device printed
    /// the prompt immediately, or if nothing arrived before the timeout.
    pub async fn execute(&mut self, command: &[u8]) -> Result<String> {
        self.start(command).await?;

        let mut acc = ResponseAccumulator::new();
        protocol::feed_from(&mut acc, &mut self.rx_buf);
        while !acc.is_done() {
            if self.fill().await? == 0 {
                debug!(command = %display_command(command), "response ended without prompt");
                break;
            }
            protocol::feed_from(&mut acc, &mut self.rx_buf);
        }

        if acc.discarded_lines() > 0 {
            warn!(
                command = %display_command(command),
                discarded = acc.discarded_lines(),
                "dropped over-long response lines"
            );
        }

        let response = acc.finish();
        trace!(bytes = response.len(), "response complete");
        Ok(response)
    }

    /// Send an encoded command line whose output is not needed.
    ///
    /// Only the echo is read; anything the device prints afterwards is left
    /// for the next exchange to discard.
    pub async fn send(&mut self, command: &[u8]) -> Result<()> {
        self.start(command).await
    }

    /// Common prefix of every exchange: resync, write, skip the echo.
    async fn start(&mut self, command: &[u8]) -> Result<()> {
        if !self.rx_buf.is_empty() {
            debug!(bytes = self.rx_buf.len(), "discarding stale input");
            self.rx_buf.clear();
        }
        self.write_raw(command).await?;
        self.read_echo().await;
        Ok(())
    }

    /// Read the echoed command line, ignoring any failure.
    ///
    /// The echo carries no information, so an error here must not abort the
    /// exchange. This is the only place errors are suppressed.
    async fn read_echo(&mut self) {
        match self.read_line().await {
            Ok(echo) => trace!(echo, "skipped echo"),
            Err(e) => warn!(error = %e, "ignoring error while reading command echo"),
        }
    }

    /// Perform one read attempt, appending to the receive buffer.
    ///
    /// Returns the number of bytes read; a timeout or end of stream is `0`.
    async fn fill(&mut self) -> Result<usize> {
        let mut chunk = [0u8; READ_CHUNK];
        match self.transport.receive(&mut chunk, self.read_timeout).await {
            Ok(n) => {
                self.rx_buf.extend_from_slice(&chunk[..n]);
                Ok(n)
            }
            Err(Error::Timeout) => Ok(0),
            Err(e) => Err(e),
        }
    }
}

/// Command text for log output, without its terminator.
fn display_command(line: &[u8]) -> String {
    protocol::decode_line(line)
}
