//! Playback State

use serde::Serialize;

use crate::core::{CueId, Language, TimeSec};

/// Lifecycle of caption synchronization for one media item
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackStatus {
    /// Nothing playing; fresh media or after teardown
    #[default]
    Idle,
    /// Sampler running
    Playing,
    /// Sampler stopped, last caption kept on screen
    Paused,
    /// Sampler stopped, caption cleared
    Ended,
}

/// Position and resolved cue for the current language.
///
/// `active_cue_id` is only ever written together with `current_time`, from
/// the resolver, so the two cannot drift apart.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackState {
    pub(super) current_language: Language,
    pub(super) current_time: TimeSec,
    pub(super) active_cue_id: Option<CueId>,
}

impl PlaybackState {
    pub fn new(language: Language) -> Self {
        Self {
            current_language: language,
            current_time: 0.0,
            active_cue_id: None,
        }
    }

    pub fn current_language(&self) -> Language {
        self.current_language
    }

    pub fn current_time(&self) -> TimeSec {
        self.current_time
    }

    pub fn active_cue_id(&self) -> Option<CueId> {
        self.active_cue_id
    }

    /// Back to the start with nothing shown; the language is kept
    pub(super) fn reset(&mut self) {
        self.current_time = 0.0;
        self.active_cue_id = None;
    }
}
