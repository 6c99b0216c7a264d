//! Caption Data Models
//!
//! A `Cue` is one timed caption entry; a `Timeline` is the start-ordered
//! sequence of cues for a single language track.

use serde::Serialize;

use super::parser::{ParseError, TimestampFault};
use crate::core::{CueId, TimeSec};

// =============================================================================
// Cue
// =============================================================================

/// A single timed caption entry.
///
/// Immutable once built. `start_time <= end_time` always holds and both are
/// finite, non-negative seconds.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cue {
    id: CueId,
    text: String,
    start_time: TimeSec,
    end_time: TimeSec,
}

impl Cue {
    /// Creates a cue, rejecting time ranges that would break the ordering
    /// invariant.
    pub fn new(
        id: CueId,
        text: impl Into<String>,
        start_time: TimeSec,
        end_time: TimeSec,
    ) -> Result<Self, ParseError> {
        let out_of_range = |t: TimeSec| !t.is_finite() || t < 0.0;
        if out_of_range(start_time) || out_of_range(end_time) {
            return Err(ParseError::MalformedTimestamp {
                line: 0,
                value: format!("{} --> {}", start_time, end_time),
                cause: TimestampFault::OutOfRange,
            });
        }
        if end_time < start_time {
            return Err(ParseError::MalformedTimestamp {
                line: 0,
                value: format!("{} --> {}", start_time, end_time),
                cause: TimestampFault::EndBeforeStart,
            });
        }

        Ok(Self::from_parts(id, text.into(), start_time, end_time))
    }

    /// Builds a cue from values the parser has already validated.
    pub(super) fn from_parts(
        id: CueId,
        text: String,
        start_time: TimeSec,
        end_time: TimeSec,
    ) -> Self {
        Self {
            id,
            text,
            start_time,
            end_time,
        }
    }

    pub fn id(&self) -> CueId {
        self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn start_time(&self) -> TimeSec {
        self.start_time
    }

    pub fn end_time(&self) -> TimeSec {
        self.end_time
    }

    /// Duration of the cue in seconds
    pub fn duration(&self) -> TimeSec {
        self.end_time - self.start_time
    }

    /// Whether `time` falls inside the closed range `[start, end]`
    pub fn contains(&self, time: TimeSec) -> bool {
        time >= self.start_time && time <= self.end_time
    }
}

// =============================================================================
// Timeline
// =============================================================================

/// Start-ordered cues for one language.
///
/// Built wholesale from a parse result; there is no incremental mutation.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Timeline {
    cues: Vec<Cue>,
}

impl Timeline {
    /// Timeline without cues
    pub const EMPTY: Timeline = Timeline { cues: Vec::new() };

    /// Creates a timeline, stable-sorting cues by start time so ties keep
    /// their parse order.
    pub fn new(mut cues: Vec<Cue>) -> Self {
        cues.sort_by(|a, b| a.start_time.total_cmp(&b.start_time));
        Self { cues }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn cues(&self) -> &[Cue] {
        &self.cues
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Cue> {
        self.cues.iter()
    }

    pub fn len(&self) -> usize {
        self.cues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }

    /// Looks a cue up by its parse-order id
    pub fn get(&self, id: CueId) -> Option<&Cue> {
        self.cues.iter().find(|cue| cue.id == id)
    }

    /// End time of the latest-ending cue, or 0 for an empty timeline
    pub fn end_time(&self) -> TimeSec {
        self.cues.iter().map(|c| c.end_time).fold(0.0, TimeSec::max)
    }
}

impl From<Vec<Cue>> for Timeline {
    fn from(cues: Vec<Cue>) -> Self {
        Self::new(cues)
    }
}

impl<'a> IntoIterator for &'a Timeline {
    type Item = &'a Cue;
    type IntoIter = std::slice::Iter<'a, Cue>;

    fn into_iter(self) -> Self::IntoIter {
        self.cues.iter()
    }
}
