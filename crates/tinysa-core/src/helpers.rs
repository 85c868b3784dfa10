//! Formatting and conversion helpers for measurement consumers.
//!
//! Small utilities that every application built on the analyzer needs:
//! peak location, unit conversion, and frequency display.

use crate::types::Peak;

/// Offset between dBm and dBµV on a 50 ohm system.
pub const DBUV_OFFSET_DB: f64 = 107.0;

/// Format a frequency in hertz as a human-readable MHz string.
///
/// # Example
///
/// ```
/// use tinysa_core::format_freq_mhz;
///
/// assert_eq!(format_freq_mhz(433_920_000.0), "433.920000 MHz");
/// assert_eq!(format_freq_mhz(10_000_000.0), "10.000000 MHz");
/// ```
pub fn format_freq_mhz(freq_hz: f64) -> String {
    let mhz = freq_hz / 1_000_000.0;
    format!("{mhz:.6} MHz")
}

/// Convert a level in dBm to dBµV (50 ohm).
///
/// ```
/// use tinysa_core::dbm_to_dbuv;
///
/// assert_eq!(dbm_to_dbuv(-107.0), 0.0);
/// assert_eq!(dbm_to_dbuv(-30.0), 77.0);
/// ```
pub fn dbm_to_dbuv(dbm: f64) -> f64 {
    dbm + DBUV_OFFSET_DB
}

/// Locate the strongest bin of a measurement.
///
/// `levels` and `freqs` are paired by index; if their lengths differ only the
/// common prefix is considered. Returns `None` when there is nothing to
/// compare. NaN levels are ignored, and the first of several equal maxima
/// wins.
///
/// ```
/// use tinysa_core::find_peak;
///
/// let peak = find_peak(&[-45.2, -60.0, -30.1], &[1e6, 2e6, 3e6]).unwrap();
/// assert_eq!(peak.dbm, -30.1);
/// assert_eq!(peak.freq_hz, 3e6);
/// assert_eq!(peak.index, 2);
/// ```
pub fn find_peak(levels: &[f64], freqs: &[f64]) -> Option<Peak> {
    levels
        .iter()
        .zip(freqs)
        .enumerate()
        .filter(|(_, (dbm, _))| !dbm.is_nan())
        .fold(None, |best: Option<Peak>, (index, (&dbm, &freq_hz))| match best {
            Some(b) if b.dbm >= dbm => Some(b),
            _ => Some(Peak {
                dbm,
                freq_hz,
                index,
            }),
        })
}
