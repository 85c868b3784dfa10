//! Core types for the analyzer's frequency and measurement model.

use std::fmt;

/// USB vendor/product pair used to recognise the analyzer during discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UsbId {
    /// USB vendor ID.
    pub vid: u16,
    /// USB product ID.
    pub pid: u16,
}

impl UsbId {
    /// The STM32 virtual COM port identity reported by the tinySA family.
    pub const TINYSA: UsbId = UsbId {
        vid: 0x0483,
        pid: 0x5740,
    };

    /// Create a new USB identity.
    pub const fn new(vid: u16, pid: u16) -> Self {
        UsbId { vid, pid }
    }
}

impl Default for UsbId {
    fn default() -> Self {
        UsbId::TINYSA
    }
}

impl fmt::Display for UsbId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04x}:{:04x}", self.vid, self.pid)
    }
}

/// The sweep configuration reported by the device's `sweep` command.
///
/// `start_hz <= stop_hz` always holds, and `points`, when present, is
/// positive. A response with no parseable sweep line is represented by
/// `Option::<SweepRange>::None` at the call site rather than by empty fields.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepRange {
    /// Sweep start frequency in hertz.
    pub start_hz: f64,
    /// Sweep stop frequency in hertz.
    pub stop_hz: f64,
    /// Number of sweep points, if the device reported one.
    pub points: Option<u32>,
}

impl SweepRange {
    /// Sweep span in hertz.
    pub fn span_hz(&self) -> f64 {
        self.stop_hz - self.start_hz
    }

    /// The `(start, stop, points)` triple handed to display and export code.
    pub fn as_tuple(&self) -> (f64, f64, Option<u32>) {
        (self.start_hz, self.stop_hz, self.points)
    }
}

/// Where the current frequency axis came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisSource {
    /// Linearly interpolated between a start and stop frequency.
    Computed,
    /// Read verbatim from the device's `frequencies` command.
    Fetched,
}

/// Ordered frequencies in hertz, one per measurement bin.
///
/// The axis is replaced wholesale whenever it is recomputed or refetched;
/// it is never updated in place.
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencyAxis {
    values: Vec<f64>,
    source: AxisSource,
}

impl FrequencyAxis {
    /// Build an axis from already-ordered values.
    pub fn new(values: Vec<f64>, source: AxisSource) -> Self {
        FrequencyAxis { values, source }
    }

    /// The frequencies in hertz.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// How this axis was produced.
    pub fn source(&self) -> AxisSource {
        self.source
    }

    /// Number of frequency bins.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the axis has no bins.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// The strongest bin of a single measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Peak {
    /// Signal level of the peak bin in dBm.
    pub dbm: f64,
    /// Frequency of the peak bin in hertz.
    pub freq_hz: f64,
    /// Index of the peak bin in the measurement array.
    pub index: usize,
}

/// Substitution for a start frequency the surrounding application considers
/// unusable.
///
/// The tinySA reports `0` as the start of a full-span sweep. Display code that
/// works on a logarithmic or "MHz from start" basis replaces it with a fixed
/// value. This is an application policy, not part of the wire protocol, so it
/// is configurable and applied explicitly by the caller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StartFallback {
    /// Start frequencies at or below this value (Hz) are replaced.
    pub threshold_hz: f64,
    /// Replacement start frequency (Hz).
    pub replacement_hz: f64,
}

impl Default for StartFallback {
    fn default() -> Self {
        StartFallback {
            threshold_hz: 0.0,
            replacement_hz: 10_000_000.0,
        }
    }
}

impl StartFallback {
    /// Apply the fallback to a sweep range.
    ///
    /// The replacement is skipped if it would move the start above the stop
    /// frequency.
    pub fn apply(&self, sweep: SweepRange) -> SweepRange {
        if sweep.start_hz <= self.threshold_hz && self.replacement_hz <= sweep.stop_hz {
            SweepRange {
                start_hz: self.replacement_hz,
                ..sweep
            }
        } else {
            sweep
        }
    }
}
