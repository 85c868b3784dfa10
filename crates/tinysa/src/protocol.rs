//! tinySA shell text-protocol encoder/decoder.
//!
//! The analyzer exposes a line-oriented command shell over its USB serial
//! port. Requests are ASCII command lines terminated by `\r`. The device
//! echoes the command, prints zero or more `\n`-terminated result lines
//! (with stray `\r` characters), and finishes with the prompt `ch> `.
//!
//! # Exchange
//!
//! ```text
//! host:   frequencies\r
//! device: frequencies\r\n
//!         1000000\r\n
//!         2000000\r\n
//!         ch>
//! ```
//!
//! There is no length framing: the prompt is the only end-of-response marker,
//! and a response may arrive spread over many reads. [`ResponseAccumulator`]
//! is a small state machine that consumes bytes as they arrive and stops
//! exactly after the prompt, leaving any later bytes for the next exchange.

use bytes::{Buf, BytesMut};

/// Terminator appended to every command line.
pub const COMMAND_TERMINATOR: u8 = b'\r';

/// Terminator of every response line.
pub const LINE_TERMINATOR: u8 = b'\n';

/// Carriage return, stripped from response lines.
const CARRIAGE_RETURN: u8 = b'\r';

/// Prompt printed by the device when it is ready for the next command.
pub const PROMPT: &str = "ch>";

/// Longest response line kept before it is discarded as noise.
///
/// Numeric lines are well under 32 bytes; anything this long without a
/// newline means the stream lost sync.
pub const MAX_LINE: usize = 4096;

/// Encode a command line into raw bytes ready for transmission.
///
/// Appends the `\r` terminator unless the command already ends with one.
///
/// # Example
///
/// ```
/// use tinysa::protocol::encode_command;
///
/// assert_eq!(encode_command("sweep"), b"sweep\r");
/// assert_eq!(encode_command("data 0\r"), b"data 0\r");
/// ```
pub fn encode_command(command: &str) -> Vec<u8> {
    let mut buf = Vec::with_capacity(command.len() + 1);
    buf.extend_from_slice(command.as_bytes());
    if buf.last() != Some(&COMMAND_TERMINATOR) {
        buf.push(COMMAND_TERMINATOR);
    }
    buf
}

/// Split one `\n`-terminated line off the front of `buf`.
///
/// Returns `None` and leaves `buf` untouched if no terminator is present yet.
/// The returned bytes include the terminator.
pub fn split_line(buf: &mut BytesMut) -> Option<BytesMut> {
    let pos = buf.iter().position(|&b| b == LINE_TERMINATOR)?;
    Some(buf.split_to(pos + 1))
}

/// Decode raw line bytes as text, dropping trailing `\r`/`\n`.
///
/// Bytes that are not valid UTF-8 are replaced with U+FFFD rather than
/// rejected.
pub fn decode_line(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    text.trim_end_matches(['\r', '\n']).to_string()
}

/// Progress of a [`ResponseAccumulator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseState {
    /// Collecting result lines; the prompt has not been seen.
    Accumulating,
    /// The prompt has been seen. No further bytes are consumed.
    Done,
}

/// Incremental collector for one command response.
///
/// Feed it bytes as they arrive. Carriage returns are dropped, complete lines
/// are appended to the response text, and the first line whose content ends
/// with [`PROMPT`] completes the response without being included in it.
/// A trailing partial line is discarded if the response is finished before
/// its newline arrives.
///
/// ```
/// use tinysa::protocol::ResponseAccumulator;
///
/// let mut acc = ResponseAccumulator::new();
/// let input = b"12.5\r\n7.0\r\nch> ";
/// let consumed = acc.feed(&input[..6]) + acc.feed(&input[6..]);
/// assert!(acc.is_done());
/// assert_eq!(consumed, input.len() - 1); // the space after the prompt is left over
/// assert_eq!(acc.finish(), "12.5\n7.0\n");
/// ```
#[derive(Debug)]
pub struct ResponseAccumulator {
    body: String,
    line: Vec<u8>,
    state: ResponseState,
    discarded: usize,
    /// The current line has overflowed and will be dropped at its newline.
    overflowed: bool,
}

impl ResponseAccumulator {
    /// Start collecting a new response.
    pub fn new() -> Self {
        ResponseAccumulator {
            body: String::new(),
            line: Vec::new(),
            state: ResponseState::Accumulating,
            discarded: 0,
            overflowed: false,
        }
    }

    /// Consume bytes from `input`, returning how many were used.
    ///
    /// Everything is consumed while accumulating. Once the prompt is
    /// recognised the remaining bytes are left unconsumed, and a finished
    /// accumulator consumes nothing.
    pub fn feed(&mut self, input: &[u8]) -> usize {
        if self.state == ResponseState::Done {
            return 0;
        }

        for (i, &byte) in input.iter().enumerate() {
            if byte == CARRIAGE_RETURN {
                continue;
            }
            self.line.push(byte);

            if byte == LINE_TERMINATOR {
                if !self.overflowed {
                    self.body.push_str(&String::from_utf8_lossy(&self.line));
                }
                self.line.clear();
                self.overflowed = false;
                continue;
            }

            if self.line.ends_with(PROMPT.as_bytes()) {
                self.line.clear();
                self.state = ResponseState::Done;
                return i + 1;
            }

            if self.line.len() > MAX_LINE {
                // Keep enough of the tail to recognise a prompt split by the cut.
                let keep = PROMPT.len() - 1;
                self.line.drain(..self.line.len() - keep);
                if !self.overflowed {
                    self.overflowed = true;
                    self.discarded += 1;
                }
            }
        }

        input.len()
    }

    /// Current state.
    pub fn state(&self) -> ResponseState {
        self.state
    }

    /// Whether the prompt has been seen.
    pub fn is_done(&self) -> bool {
        self.state == ResponseState::Done
    }

    /// Number of over-long lines dropped so far.
    pub fn discarded_lines(&self) -> usize {
        self.discarded
    }

    /// The complete lines collected so far, each ending in `\n`.
    pub fn finish(self) -> String {
        self.body
    }
}

impl Default for ResponseAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

/// Feed as much of `buf` as the accumulator takes and drop those bytes.
pub(crate) fn feed_from(acc: &mut ResponseAccumulator, buf: &mut BytesMut) {
    let consumed = acc.feed(&buf[..]);
    buf.advance(consumed);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(input: &[u8]) -> (String, usize, bool) {
        let mut acc = ResponseAccumulator::new();
        let consumed = acc.feed(input);
        let done = acc.is_done();
        (acc.finish(), consumed, done)
    }

    // ===============================================================
    // Encoding
    // ===============================================================

    #[test]
    fn encode_appends_terminator() {
        assert_eq!(encode_command("frequencies"), b"frequencies\r");
        assert_eq!(encode_command("sweep start 1000000"), b"sweep start 1000000\r");
    }

    #[test]
    fn encode_keeps_existing_terminator() {
        assert_eq!(encode_command("data 2\r"), b"data 2\r");
    }

    #[test]
    fn encode_empty_command() {
        assert_eq!(encode_command(""), b"\r");
    }

    // ===============================================================
    // Line splitting
    // ===============================================================

    #[test]
    fn split_line_complete_and_partial() {
        let mut buf = BytesMut::from(&b"sweep\r\n0 3"[..]);
        let line = split_line(&mut buf).unwrap();
        assert_eq!(&line[..], b"sweep\r\n");
        assert_eq!(&buf[..], b"0 3");
        assert!(split_line(&mut buf).is_none());
        assert_eq!(&buf[..], b"0 3");
    }

    #[test]
    fn decode_line_strips_terminators() {
        assert_eq!(decode_line(b"sweep\r\n"), "sweep");
        assert_eq!(decode_line(b"partial"), "partial");
        assert_eq!(decode_line(b""), "");
    }

    #[test]
    fn decode_line_replaces_invalid_utf8() {
        assert_eq!(decode_line(b"a\xffb\n"), "a\u{fffd}b");
    }

    // ===============================================================
    // Response accumulation
    // ===============================================================

    #[test]
    fn accumulate_lines_until_prompt() {
        let (body, consumed, done) = collect(b"1000000\n2000000\nch>\n");
        assert!(done);
        assert_eq!(body, "1000000\n2000000\n");
        // Stops right after the prompt; the newline stays unconsumed.
        assert_eq!(consumed, 19);
    }

    #[test]
    fn accumulate_strips_carriage_returns() {
        let (body, _, done) = collect(b"-45.2\r\n-60.0\r\nch> ");
        assert!(done);
        assert_eq!(body, "-45.2\n-60.0\n");
    }

    #[test]
    fn accumulate_immediate_prompt_is_empty() {
        let (body, consumed, done) = collect(b"ch> ");
        assert!(done);
        assert_eq!(body, "");
        assert_eq!(consumed, 3);
    }

    #[test]
    fn accumulate_prompt_after_text_on_same_line() {
        // Anything sharing the prompt's line is part of the prompt.
        let (body, _, done) = collect(b"12.5\nnoise ch>");
        assert!(done);
        assert_eq!(body, "12.5\n");
    }

    #[test]
    fn accumulate_without_prompt_stays_open() {
        let mut acc = ResponseAccumulator::new();
        assert_eq!(acc.feed(b"1.0\n2."), 6);
        assert_eq!(acc.state(), ResponseState::Accumulating);
        // The partial "2." is dropped when the response is cut short.
        assert_eq!(acc.finish(), "1.0\n");
    }

    #[test]
    fn accumulate_across_single_byte_reads() {
        let input = b"sweep\r\n0 300000000 450\r\nch> ";
        let mut acc = ResponseAccumulator::new();
        let mut consumed = 0;
        for byte in input.iter() {
            consumed += acc.feed(std::slice::from_ref(byte));
        }
        assert!(acc.is_done());
        assert_eq!(consumed, input.len() - 1);
        assert_eq!(acc.finish(), "sweep\n0 300000000 450\n");
    }

    #[test]
    fn accumulate_prompt_split_across_reads() {
        let mut acc = ResponseAccumulator::new();
        acc.feed(b"7.0\nc");
        assert!(!acc.is_done());
        acc.feed(b"h");
        assert!(!acc.is_done());
        assert_eq!(acc.feed(b"> rest"), 1);
        assert!(acc.is_done());
        assert_eq!(acc.finish(), "7.0\n");
    }

    #[test]
    fn accumulate_done_consumes_nothing() {
        let mut acc = ResponseAccumulator::new();
        acc.feed(b"ch>");
        assert_eq!(acc.feed(b"more\n"), 0);
        assert_eq!(acc.finish(), "");
    }

    #[test]
    fn accumulate_discards_overlong_line() {
        let mut acc = ResponseAccumulator::new();
        let noise = vec![b'x'; MAX_LINE + 10];
        acc.feed(&noise);
        acc.feed(b"\n5.5\nch>");
        assert!(acc.is_done());
        assert_eq!(acc.discarded_lines(), 1);
        assert_eq!(acc.finish(), "5.5\n");
    }

    #[test]
    fn accumulate_prompt_after_long_noise() {
        let mut acc = ResponseAccumulator::new();
        let mut input = vec![b'x'; MAX_LINE - 1];
        input.extend_from_slice(b"ch> ");

        let consumed = acc.feed(&input);
        assert!(acc.is_done());
        assert_eq!(consumed, input.len() - 1);
        assert_eq!(acc.discarded_lines(), 1);
        assert_eq!(acc.finish(), "");
    }

    #[test]
    fn accumulate_very_long_line_counts_once() {
        let mut acc = ResponseAccumulator::new();
        acc.feed(&vec![b'x'; MAX_LINE * 3]);
        acc.feed(b"\n1.0\nch>");
        assert!(acc.is_done());
        assert_eq!(acc.discarded_lines(), 1);
        assert_eq!(acc.finish(), "1.0\n");
    }

    #[test]
    fn accumulate_invalid_utf8_is_replaced() {
        let (body, _, done) = collect(b"\xfe\xff\n1.5\nch>");
        assert!(done);
        assert_eq!(body, "\u{fffd}\u{fffd}\n1.5\n");
    }

    #[test]
    fn feed_from_advances_buffer() {
        let mut acc = ResponseAccumulator::new();
        let mut buf = BytesMut::from(&b"1.0\nch> sweep\r\n"[..]);
        feed_from(&mut acc, &mut buf);
        assert!(acc.is_done());
        assert_eq!(&buf[..], b" sweep\r\n");
    }
}
