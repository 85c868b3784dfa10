//! tinySA shell command builders and response parsers.
//!
//! This module provides functions to construct the command lines used by the
//! acquisition model and to parse the corresponding response text.
//!
//! All functions are pure -- they produce byte vectors or consume string
//! slices without performing any I/O. Parsers never fail: a line that does
//! not parse is skipped and the rest of the response is still used, so a
//! garbled or empty response yields an empty (or `None`) result.

use tinysa_core::types::SweepRange;

use crate::protocol::{PROMPT, encode_command};

// ---------------------------------------------------------------
// Command builders
// ---------------------------------------------------------------

/// Build a "read sweep configuration" command (`sweep`).
pub fn cmd_sweep() -> Vec<u8> {
    encode_command("sweep")
}

/// Build a "set sweep start" command (`sweep start <hz>`).
///
/// The frequency is truncated toward zero to whole hertz.
pub fn cmd_sweep_start(start_hz: f64) -> Vec<u8> {
    encode_command(&format!("sweep start {}", start_hz.trunc() as i64))
}

/// Build a "set sweep stop" command (`sweep stop <hz>`).
///
/// The frequency is truncated toward zero to whole hertz.
pub fn cmd_sweep_stop(stop_hz: f64) -> Vec<u8> {
    encode_command(&format!("sweep stop {}", stop_hz.trunc() as i64))
}

/// Build a "list sweep frequencies" command (`frequencies`).
pub fn cmd_frequencies() -> Vec<u8> {
    encode_command("frequencies")
}

/// Build a "dump measurement buffer" command (`data <channel>`).
///
/// # Arguments
///
/// * `channel` - Which internal buffer the device returns.
pub fn cmd_data(channel: u8) -> Vec<u8> {
    encode_command(&format!("data {channel}"))
}

// ---------------------------------------------------------------
// Response parsers
// ---------------------------------------------------------------

/// Parse the response to `sweep` into a [`SweepRange`].
///
/// The device prints `<start> <stop> <points>` (e.g. `0 300000000 450`).
/// The first line with at least two numeric whitespace-separated tokens
/// wins; a third token is taken as the point count when it is a positive
/// integer. Prompt lines, blank lines, and lines whose start exceeds their
/// stop are skipped. Returns `None` if no line qualifies.
///
/// # Example
///
/// ```
/// use tinysa::commands::parse_sweep_response;
///
/// let sweep = parse_sweep_response("0 300000000 450\nch>\n").unwrap();
/// assert_eq!(sweep.start_hz, 0.0);
/// assert_eq!(sweep.stop_hz, 300_000_000.0);
/// assert_eq!(sweep.points, Some(450));
/// ```
pub fn parse_sweep_response(text: &str) -> Option<SweepRange> {
    text.lines().map(str::trim).find_map(parse_sweep_line)
}

fn parse_sweep_line(line: &str) -> Option<SweepRange> {
    if line.is_empty() || line.starts_with(PROMPT) {
        return None;
    }

    let mut tokens = line.split_whitespace();
    let start_hz: f64 = tokens.next()?.parse().ok()?;
    let stop_hz: f64 = tokens.next()?.parse().ok()?;
    if start_hz.is_nan() || stop_hz.is_nan() || start_hz > stop_hz {
        return None;
    }
    let points = tokens
        .next()
        .and_then(|t| t.parse::<u32>().ok())
        .filter(|&p| p > 0);

    Some(SweepRange {
        start_hz,
        stop_hz,
        points,
    })
}

/// Parse a one-value-per-line response (`frequencies`, `data`) into numbers.
///
/// Blank lines and lines that do not parse as a float (including the prompt)
/// are skipped without aborting.
///
/// # Example
///
/// ```
/// use tinysa::commands::parse_value_lines;
///
/// assert_eq!(parse_value_lines("12.5\nnoise\n7.0\nch>\n"), vec![12.5, 7.0]);
/// assert!(parse_value_lines("ch>\n").is_empty());
/// ```
pub fn parse_value_lines(text: &str) -> Vec<f64> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| line.parse::<f64>().ok())
        .collect()
}

/// `count` values evenly spaced from `start` to `stop`, both inclusive.
///
/// A count of one yields `[start]`; zero yields an empty vector. The last
/// element is exactly `stop`.
pub fn linspace(start: f64, stop: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (count - 1) as f64;
            let mut values: Vec<f64> = (0..count).map(|i| start + step * i as f64).collect();
            values[count - 1] = stop;
            values
        }
    }
}
