//! Caption Parser
//!
//! Converts raw timed-text (a WebVTT/SRT subset) into cues.
//!
//! Cue boundaries are found only by timing lines (`start --> end`); blank
//! lines are dropped before scanning and never separate cues on their own.
//! Anything between two timing lines that is not itself a timing line becomes
//! the text of the preceding cue. Lines before the first timing line (SRT
//! index numbers, `NOTE` blocks) are skipped.
//!
//! # Accepted input
//!
//! ```text
//! WEBVTT
//!
//! 1
//! 00:00:01.000 --> 00:00:04.000
//! First caption
//!
//! 00:05,500 --> 00:08,000 align:center
//! Second caption
//! on two lines
//! ```

use thiserror::Error;
use tracing::debug;

use super::source::TextSource;
use super::Cue;
use crate::core::{CueId, TimeSec};

/// Separator between the two timestamps of a timing line
const TIMING_SEPARATOR: &str = " --> ";

/// Looser marker that ends a cue's text block
const ARROW: &str = "-->";

/// Header marker line dropped before scanning
const VTT_HEADER: &str = "WEBVTT";

// =============================================================================
// Error Types
// =============================================================================

/// Why a timestamp segment was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampFault {
    /// Expected `MM:SS` or `HH:MM:SS`
    SegmentCount,
    /// A segment had non-digit characters
    NotNumeric,
    /// Negative or non-finite value
    OutOfRange,
    /// End timestamp earlier than the start timestamp
    EndBeforeStart,
}

impl std::fmt::Display for TimestampFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::SegmentCount => "expected [HH:]MM:SS[.mmm]",
            Self::NotNumeric => "non-numeric segment",
            Self::OutOfRange => "value out of range",
            Self::EndBeforeStart => "end precedes start",
        };
        f.write_str(text)
    }
}

/// Errors that can occur during caption parsing
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// A timing line carried a timestamp that could not be read
    #[error("Malformed timestamp '{value}' on line {line}: {cause}")]
    MalformedTimestamp {
        /// 1-based line number in the raw input (0 when not from a file)
        line: usize,
        value: String,
        cause: TimestampFault,
    },

    /// The caption source could not be read as text
    #[error("Unreadable input: {0}")]
    UnreadableInput(String),
}

impl ParseError {
    /// Stable reason code reported to the upload collaborator
    pub fn reason(&self) -> &'static str {
        match self {
            Self::MalformedTimestamp { .. } => "malformed-timestamp",
            Self::UnreadableInput(_) => "unreadable-input",
        }
    }
}

// =============================================================================
// Parsing
// =============================================================================

/// Parses raw caption text into at most `max_cues` cues.
///
/// The result is stable-sorted by start time; ids keep the order in which the
/// timing lines were encountered. Input without any timing line yields an
/// empty list, not an error.
pub fn parse(raw_text: &str, max_cues: usize) -> Result<Vec<Cue>, ParseError> {
    let lines = content_lines(raw_text);
    let mut cues: Vec<Cue> = Vec::new();
    let mut cursor = 0;

    while cursor < lines.len() && cues.len() < max_cues {
        let (line_no, line) = lines[cursor];

        let Some((start_raw, end_raw)) = split_timing_line(line) else {
            cursor += 1;
            continue;
        };

        let start_time = parse_timestamp(start_raw, line_no)?;
        let end_time = parse_timestamp(cue_end_token(end_raw), line_no)?;
        if end_time < start_time {
            return Err(ParseError::MalformedTimestamp {
                line: line_no,
                value: line.trim().to_string(),
                cause: TimestampFault::EndBeforeStart,
            });
        }
        cursor += 1;

        let mut text_lines = Vec::new();
        while cursor < lines.len() && !lines[cursor].1.contains(ARROW) {
            text_lines.push(lines[cursor].1);
            cursor += 1;
        }

        let id = (cues.len() + 1) as CueId;
        let text = text_lines.join(" ").trim().to_string();
        cues.push(Cue::from_parts(id, text, start_time, end_time));
    }

    cues.sort_by(|a, b| a.start_time().total_cmp(&b.start_time()));

    debug!(
        cue_count = cues.len(),
        max_cues,
        line_count = lines.len(),
        "Parsed caption text"
    );

    Ok(cues)
}

/// Loads text through `source` and parses it.
pub fn parse_source<S>(source: &S, max_cues: usize) -> Result<Vec<Cue>, ParseError>
where
    S: TextSource + ?Sized,
{
    let text = source.read_text()?;
    parse(&text, max_cues)
}

/// Normalizes line separators and drops blank and header lines, keeping the
/// original 1-based line number of each survivor.
fn content_lines(raw_text: &str) -> Vec<(usize, &str)> {
    let mut lines = Vec::new();
    let mut rest = raw_text;
    let mut line_no = 0;

    loop {
        line_no += 1;
        let (line, next) = match rest.find(&['\r', '\n'][..]) {
            Some(pos) => {
                let sep_len = if rest[pos..].starts_with("\r\n") { 2 } else { 1 };
                (&rest[..pos], Some(&rest[pos + sep_len..]))
            }
            None => (rest, None),
        };

        if !line.trim().is_empty() && !line.starts_with(VTT_HEADER) {
            lines.push((line_no, line));
        }

        match next {
            Some(next) => rest = next,
            None => break,
        }
    }

    lines
}

/// Splits a timing line into its start and end parts.
///
/// The line must contain the separator exactly once.
fn split_timing_line(line: &str) -> Option<(&str, &str)> {
    let mut parts = line.split(TIMING_SEPARATOR);
    let start = parts.next()?;
    let end = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    Some((start, end))
}

/// Drops cue settings that may follow the end timestamp
fn cue_end_token(end_part: &str) -> &str {
    end_part.split_whitespace().next().unwrap_or("")
}

/// Parses `[HH:]MM:SS[.mmm]` (or `,mmm`) into seconds
fn parse_timestamp(raw: &str, line: usize) -> Result<TimeSec, ParseError> {
    let trimmed = raw.trim();
    let fault = |cause| ParseError::MalformedTimestamp {
        line,
        value: trimmed.to_string(),
        cause,
    };

    let normalized = trimmed.replace(',', ".");
    let parts: Vec<&str> = normalized.split(':').collect();

    let (hours, minutes, seconds) = match parts.as_slice() {
        [m, s] => (None, *m, *s),
        [h, m, s] => (Some(*h), *m, *s),
        _ => return Err(fault(TimestampFault::SegmentCount)),
    };

    let hours = match hours {
        Some(h) => parse_whole(h).ok_or_else(|| fault(TimestampFault::NotNumeric))?,
        None => 0,
    };
    let minutes = parse_whole(minutes).ok_or_else(|| fault(TimestampFault::NotNumeric))?;
    let seconds = parse_seconds(seconds).ok_or_else(|| fault(TimestampFault::NotNumeric))?;

    let total = hours as f64 * 3600.0 + minutes as f64 * 60.0 + seconds;
    if !total.is_finite() {
        return Err(fault(TimestampFault::OutOfRange));
    }

    Ok(total)
}

fn parse_whole(segment: &str) -> Option<u64> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}

fn parse_seconds(segment: &str) -> Option<f64> {
    let mut dots = 0;
    let mut digits = 0;
    for b in segment.bytes() {
        match b {
            b'0'..=b'9' => digits += 1,
            b'.' => dots += 1,
            _ => return None,
        }
    }
    if digits == 0 || dots > 1 {
        return None;
    }
    segment.parse().ok()
}

// =============================================================================
// Tests
// =============================================================================
