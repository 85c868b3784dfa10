//! TinySa -- the acquisition model for a tinySA spectrum analyzer.
//!
//! This module ties the command shell ([`shell`](crate::shell)) to the
//! builders and parsers in [`commands`] to turn response text into typed
//! measurements. It owns the current [`FrequencyAxis`] and the configured
//! point count; measurement arrays are returned to the caller and never
//! retained.
//!
//! Every method takes `&mut self`, so one handle runs one command at a time.
//! Callers that share a handle between tasks must serialize access
//! themselves, e.g. with a `tokio::sync::Mutex`.

use tracing::{debug, info};

use tinysa_core::error::Result;
use tinysa_core::helpers::find_peak;
use tinysa_core::types::{AxisSource, FrequencyAxis, Peak, StartFallback, SweepRange};

use crate::commands;
use crate::protocol;
use crate::shell::Shell;

/// Point count used until the caller configures another one.
pub const DEFAULT_POINTS: usize = 101;

/// Channel selector for the live measurement trace.
pub const DEFAULT_CHANNEL: u8 = 2;

/// A tinySA analyzer controlled over its command shell.
///
/// Constructed via [`TinySaBuilder`](crate::builder::TinySaBuilder). The
/// connection opens on the first command and stays open until
/// [`close()`](Self::close).
pub struct TinySa {
    shell: Shell,
    port_name: Option<String>,
    points: usize,
    axis: Option<FrequencyAxis>,
}

impl TinySa {
    /// Create a new `TinySa` from its constituent parts.
    ///
    /// This is called by [`TinySaBuilder`](crate::builder::TinySaBuilder);
    /// callers should use the builder API instead.
    pub(crate) fn new(shell: Shell, port_name: Option<String>, points: usize) -> Self {
        TinySa {
            shell,
            port_name,
            points,
            axis: None,
        }
    }

    /// Serial port path, if the analyzer was built on a serial transport.
    pub fn port_name(&self) -> Option<&str> {
        self.port_name.as_deref()
    }

    /// Whether the connection is currently open.
    pub fn is_open(&self) -> bool {
        self.shell.is_open()
    }

    /// Point count used by [`set_frequencies()`](Self::set_frequencies) when
    /// none is given.
    pub fn points(&self) -> usize {
        self.points
    }

    /// The current frequency axis values, or `None` before one is set.
    pub fn frequencies(&self) -> Option<&[f64]> {
        self.axis.as_ref().map(FrequencyAxis::values)
    }

    /// The current frequency axis with its origin, or `None` before one is set.
    pub fn frequency_axis(&self) -> Option<&FrequencyAxis> {
        self.axis.as_ref()
    }

    /// Read the sweep the device is currently configured for.
    ///
    /// Returns `None` if no line of the response parses as a sweep.
    pub async fn get_sweep(&mut self) -> Result<Option<SweepRange>> {
        let text = self.shell.execute(&commands::cmd_sweep()).await?;
        let sweep = commands::parse_sweep_response(&text);
        if sweep.is_none() {
            debug!(response = text.as_str(), "no sweep range in response");
        }
        Ok(sweep)
    }

    /// Set the sweep bounds. Absent bounds are left unchanged on the device.
    ///
    /// Values are truncated to whole hertz. The device's reply is not read.
    pub async fn set_sweep(&mut self, start_hz: Option<f64>, stop_hz: Option<f64>) -> Result<()> {
        if let Some(start) = start_hz {
            self.shell.send(&commands::cmd_sweep_start(start)).await?;
        }
        if let Some(stop) = stop_hz {
            self.shell.send(&commands::cmd_sweep_stop(stop)).await?;
        }
        Ok(())
    }

    /// Replace the frequency axis with evenly spaced values.
    ///
    /// A non-zero `points` also becomes the new default point count. No
    /// command is sent to the device.
    pub fn set_frequencies(
        &mut self,
        start_hz: f64,
        stop_hz: f64,
        points: Option<usize>,
    ) -> &FrequencyAxis {
        if let Some(points) = points.filter(|&p| p > 0) {
            self.points = points;
        }
        let values = commands::linspace(start_hz, stop_hz, self.points);
        &*self.axis.insert(FrequencyAxis::new(values, AxisSource::Computed))
    }

    /// Replace the frequency axis with the list the device reports.
    ///
    /// An unparseable or empty response yields an empty axis.
    pub async fn fetch_frequencies(&mut self) -> Result<&FrequencyAxis> {
        let text = self.shell.execute(&commands::cmd_frequencies()).await?;
        let values = commands::parse_value_lines(&text);
        debug!(count = values.len(), "fetched frequency axis");
        Ok(&*self.axis.insert(FrequencyAxis::new(values, AxisSource::Fetched)))
    }

    /// Read one measurement array (dBm per bin) from buffer `channel`.
    pub async fn data(&mut self, channel: u8) -> Result<Vec<f64>> {
        let text = self.shell.execute(&commands::cmd_data(channel)).await?;
        Ok(commands::parse_value_lines(&text))
    }

    /// Measure once and locate the strongest bin on the current axis.
    ///
    /// Values are paired with the axis by index, up to the shorter of the
    /// two. Returns `None` when the axis is unset or nothing pairs up.
    pub async fn measure_peak(&mut self, channel: u8) -> Result<Option<Peak>> {
        if self.axis.is_none() {
            debug!("no frequency axis, skipping peak measurement");
            return Ok(None);
        }
        let levels = self.data(channel).await?;
        let freqs = self.frequencies().unwrap_or_default();
        Ok(find_peak(&levels, freqs))
    }

    /// Read the device sweep and load its frequency axis.
    ///
    /// The start frequency of the returned sweep has `fallback` applied; the
    /// device itself is not reconfigured. The axis comes from the device's
    /// own frequency list.
    pub async fn initialize(&mut self, fallback: &StartFallback) -> Result<Option<SweepRange>> {
        let sweep = self.get_sweep().await?.map(|s| fallback.apply(s));
        let axis_len = self.fetch_frequencies().await?.len();
        match &sweep {
            Some(s) => info!(
                start_hz = s.start_hz,
                stop_hz = s.stop_hz,
                points = axis_len,
                "analyzer initialized"
            ),
            None => info!(points = axis_len, "analyzer initialized without sweep range"),
        }
        Ok(sweep)
    }

    /// Run an arbitrary shell command and return its response text.
    pub async fn execute(&mut self, command: &str) -> Result<String> {
        self.shell.execute(&protocol::encode_command(command)).await
    }

    /// Close the connection. Safe to call more than once.
    ///
    /// The stored frequency axis survives; the next command reopens the
    /// connection.
    pub async fn close(&mut self) -> Result<()> {
        self.shell.close().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tinysa_core::error::Error;
    use tinysa_test_harness::MockTransport;

    fn make_analyzer(mock: MockTransport) -> TinySa {
        let shell = Shell::new(Box::new(mock), Duration::from_millis(50));
        TinySa::new(shell, None, DEFAULT_POINTS)
    }

    // ===============================================================
    // Sweep
    // ===============================================================

    #[tokio::test]
    async fn get_sweep_parses_range() {
        let mut mock = MockTransport::new();
        mock.expect(b"sweep\r", b"sweep\r\n0 300000000 450\r\nch> ");
        let mut sa = make_analyzer(mock);

        let sweep = sa.get_sweep().await.unwrap().unwrap();
        assert_eq!(sweep.as_tuple(), (0.0, 300_000_000.0, Some(450)));
    }

    #[tokio::test]
    async fn get_sweep_without_numbers_is_none() {
        let mut mock = MockTransport::new();
        mock.expect(b"sweep\r", b"sweep\r\nusage: sweep {start(Hz)}\r\nch> ");
        let mut sa = make_analyzer(mock);

        assert!(sa.get_sweep().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn get_sweep_silent_device_is_none() {
        let mut mock = MockTransport::new();
        mock.expect(b"sweep\r", b"");
        let mut sa = make_analyzer(mock);

        assert!(sa.get_sweep().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn set_sweep_sends_truncated_bounds() {
        let mut mock = MockTransport::new();
        mock.expect(b"sweep start 1000000\r", b"sweep start 1000000\r\nch> ");
        mock.expect(b"sweep stop 350000000\r", b"sweep stop 350000000\r\nch> ");
        let handle = mock.handle();
        let mut sa = make_analyzer(mock);

        sa.set_sweep(Some(1_000_000.9), Some(350_000_000.4)).await.unwrap();
        assert_eq!(
            handle.sent_data(),
            vec![
                b"sweep start 1000000\r".to_vec(),
                b"sweep stop 350000000\r".to_vec()
            ]
        );
        assert_eq!(handle.remaining_expectations(), 0);
        assert_eq!(handle.open_count(), 1);
    }

    #[tokio::test]
    async fn set_sweep_skips_absent_bounds() {
        let mut mock = MockTransport::new();
        mock.expect(b"sweep stop 200000000\r", b"sweep stop 200000000\r\nch> ");
        let handle = mock.handle();
        let mut sa = make_analyzer(mock);

        sa.set_sweep(None, Some(200e6)).await.unwrap();
        sa.set_sweep(None, None).await.unwrap();
        assert_eq!(handle.sent_data(), vec![b"sweep stop 200000000\r".to_vec()]);
        assert_eq!(handle.remaining_expectations(), 0);
    }

    #[tokio::test]
    async fn set_sweep_without_bounds_stays_closed() {
        let mock = MockTransport::new();
        let handle = mock.handle();
        let mut sa = make_analyzer(mock);

        sa.set_sweep(None, None).await.unwrap();
        assert!(handle.sent_data().is_empty());
        assert_eq!(handle.open_count(), 0);
    }

    // ===============================================================
    // Frequency axis
    // ===============================================================

    #[tokio::test]
    async fn axis_starts_unset() {
        let sa = make_analyzer(MockTransport::new());
        assert!(sa.frequencies().is_none());
        assert!(sa.frequency_axis().is_none());
        assert_eq!(sa.points(), DEFAULT_POINTS);
    }

    #[tokio::test]
    async fn set_frequencies_computes_linear_axis() {
        let mut sa = make_analyzer(MockTransport::new());

        let axis = sa.set_frequencies(1e6, 3e6, Some(3));
        assert_eq!(axis.values(), &[1e6, 2e6, 3e6]);
        assert_eq!(axis.source(), AxisSource::Computed);
        assert_eq!(sa.points(), 3);

        // The stored point count is reused when none is given.
        let axis = sa.set_frequencies(0.0, 100.0, None);
        assert_eq!(axis.values(), &[0.0, 50.0, 100.0]);
    }

    #[tokio::test]
    async fn set_frequencies_ignores_zero_points() {
        let mut sa = make_analyzer(MockTransport::new());

        let axis = sa.set_frequencies(0.0, 1e6, Some(0));
        assert_eq!(axis.len(), DEFAULT_POINTS);
        assert_eq!(sa.points(), DEFAULT_POINTS);
    }

    #[tokio::test]
    async fn set_frequencies_default_points_endpoints() {
        let mut sa = make_analyzer(MockTransport::new());

        let values = sa.set_frequencies(0.0, 350e6, None).values().to_vec();
        assert_eq!(values.len(), 101);
        assert_eq!(values[0], 0.0);
        assert_eq!(values[100], 350e6);
        assert!(values.windows(2).all(|w| w[0] <= w[1]));
    }

    #[tokio::test]
    async fn fetch_frequencies_replaces_axis() {
        let mut mock = MockTransport::new();
        mock.expect(
            b"frequencies\r",
            b"frequencies\r\n1000000\r\n2000000\r\n3000000\r\nch> ",
        );
        let mut sa = make_analyzer(mock);
        sa.set_frequencies(0.0, 1.0, Some(2));

        let axis = sa.fetch_frequencies().await.unwrap();
        assert_eq!(axis.values(), &[1e6, 2e6, 3e6]);
        assert_eq!(axis.source(), AxisSource::Fetched);
        assert_eq!(sa.frequencies(), Some(&[1e6, 2e6, 3e6][..]));
    }

    #[tokio::test]
    async fn fetch_frequencies_empty_response_is_empty_axis() {
        let mut mock = MockTransport::new();
        mock.expect(b"frequencies\r", b"frequencies\r\nch> ");
        let mut sa = make_analyzer(mock);

        assert!(sa.fetch_frequencies().await.unwrap().is_empty());
        assert_eq!(sa.frequencies(), Some(&[] as &[f64]));
    }

    #[tokio::test]
    async fn computed_axis_overwrites_fetched() {
        let mut mock = MockTransport::new();
        mock.expect(b"frequencies\r", b"frequencies\r\n5\r\nch> ");
        let mut sa = make_analyzer(mock);

        sa.fetch_frequencies().await.unwrap();
        let axis = sa.set_frequencies(1.0, 2.0, Some(2));
        assert_eq!(axis.source(), AxisSource::Computed);
    }

    // ===============================================================
    // Measurements
    // ===============================================================

    #[tokio::test]
    async fn data_skips_malformed_lines() {
        let mut mock = MockTransport::new();
        mock.expect(b"data 2\r", b"data 2\r\n12.5\r\nnoise\r\n7.0\r\nch> ");
        let mut sa = make_analyzer(mock);

        assert_eq!(sa.data(DEFAULT_CHANNEL).await.unwrap(), vec![12.5, 7.0]);
    }

    #[tokio::test]
    async fn data_prompt_only_is_empty() {
        let mut mock = MockTransport::new();
        mock.expect(b"data 0\r", b"data 0\r\nch> ");
        let mut sa = make_analyzer(mock);

        assert!(sa.data(0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn peak_correlates_with_axis() {
        let mut mock = MockTransport::new();
        mock.expect(b"data 0\r", b"data 0\r\n-45.2\r\n-60.0\r\n-30.1\r\nch> ");
        let mut sa = make_analyzer(mock);
        sa.set_frequencies(1e6, 3e6, Some(3));

        let peak = sa.measure_peak(0).await.unwrap().unwrap();
        assert_eq!(peak.dbm, -30.1);
        assert_eq!(peak.freq_hz, 3e6);
        assert_eq!(peak.index, 2);
    }

    #[tokio::test]
    async fn peak_without_axis_sends_nothing() {
        let mut sa = make_analyzer(MockTransport::new());
        assert!(sa.measure_peak(0).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn peak_truncates_to_axis_length() {
        let mut mock = MockTransport::new();
        mock.expect(b"data 2\r", b"data 2\r\n-50\r\n-40\r\n-10\r\nch> ");
        let mut sa = make_analyzer(mock);
        sa.set_frequencies(1e6, 2e6, Some(2));

        let peak = sa.measure_peak(2).await.unwrap().unwrap();
        assert_eq!(peak.dbm, -40.0);
        assert_eq!(peak.freq_hz, 2e6);
    }

    #[tokio::test]
    async fn peak_of_empty_measurement_is_none() {
        let mut mock = MockTransport::new();
        mock.expect(b"data 2\r", b"data 2\r\nch> ");
        let mut sa = make_analyzer(mock);
        sa.set_frequencies(1e6, 2e6, Some(2));

        assert!(sa.measure_peak(2).await.unwrap().is_none());
    }

    // ===============================================================
    // Startup and lifecycle
    // ===============================================================

    #[tokio::test]
    async fn initialize_applies_fallback_and_fetches_axis() {
        let mut mock = MockTransport::new();
        mock.expect(b"sweep\r", b"sweep\r\n0 350000000 3\r\nch> ");
        mock.expect(
            b"frequencies\r",
            b"frequencies\r\n0\r\n175000000\r\n350000000\r\nch> ",
        );
        let mut sa = make_analyzer(mock);

        let sweep = sa.initialize(&StartFallback::default()).await.unwrap().unwrap();
        assert_eq!(sweep.start_hz, 10e6);
        assert_eq!(sweep.stop_hz, 350e6);
        assert_eq!(sa.frequencies(), Some(&[0.0, 175e6, 350e6][..]));
        assert_eq!(sa.frequency_axis().unwrap().source(), AxisSource::Fetched);
    }

    #[tokio::test]
    async fn execute_raw_command() {
        let mut mock = MockTransport::new();
        mock.expect(b"version\r", b"version\r\ntinySA4_v1.4\r\nHW Version:V0.4.5.1\r\nch> ");
        let mut sa = make_analyzer(mock);

        let text = sa.execute("version").await.unwrap();
        assert_eq!(text, "tinySA4_v1.4\nHW Version:V0.4.5.1\n");
    }

    #[tokio::test]
    async fn close_twice_and_reopen_on_use() {
        let mut mock = MockTransport::new();
        mock.expect(b"data 2\r", b"data 2\r\n1.0\r\nch> ");
        let handle = mock.handle();
        let mut sa = make_analyzer(mock);

        sa.close().await.unwrap();
        sa.close().await.unwrap();
        assert!(!sa.is_open());
        assert_eq!(handle.close_count(), 0);

        assert_eq!(sa.data(2).await.unwrap(), vec![1.0]);
        assert!(sa.is_open());
        sa.close().await.unwrap();
        sa.close().await.unwrap();
        assert!(!sa.is_open());
        assert_eq!(handle.open_count(), 1);
        assert_eq!(handle.close_count(), 1);
    }

    #[tokio::test]
    async fn transport_failure_propagates() {
        let mut mock = MockTransport::new();
        mock.fail_open("permission denied");
        let mut sa = make_analyzer(mock);

        let err = sa.get_sweep().await.unwrap_err();
        assert!(matches!(err, Error::Connection(_)));
    }
}
