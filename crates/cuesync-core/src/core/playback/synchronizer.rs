//! Playback Synchronizer
//!
//! Owns the per-language timelines, the playback state and the sampler for
//! one media item, and publishes the displayed caption on a watch channel.
//!
//! # State machine
//!
//! ```text
//!            play              pause
//!   Idle ───────────▶ Playing ───────▶ Paused
//!     ▲                 │  ▲             │
//!     │                 │  └─────────────┘ play
//!     │                 │ end
//!     │                 ▼
//!     └──────────────  Ended
//!   load_media / teardown (from any state)
//! ```
//!
//! All mutation goes through one mutex that the sampler holds only for a
//! single resolve step. Each sampler start takes a new generation number; a
//! tick from a stopped generation is discarded, so a tick racing with
//! `pause`/`end` can never repaint a caption.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info, trace};

use super::clock::PlaybackClock;
use super::resolver::resolve_active_cue;
use super::sampler::Sampler;
use super::state::{PlaybackState, PlaybackStatus};
use crate::core::captions::{Cue, Timeline};
use crate::core::{
    CoreResult, Language, LanguageTable, MediaId, TimeSec, DEFAULT_SAMPLE_INTERVAL_MS,
};

/// Mutable session shared with the sampler task
struct Session {
    media_id: Option<MediaId>,
    table: LanguageTable,
    state: PlaybackState,
    status: PlaybackStatus,
    generation: u64,
    caption_tx: watch::Sender<Option<String>>,
}

impl Session {
    /// Resolves `time` against the current language and publishes the caption
    fn resolve_at(&mut self, time: TimeSec) {
        let timeline = self.table.timeline(self.state.current_language);
        let cue = resolve_active_cue(timeline.cues(), time);

        self.state.current_time = time;
        self.state.active_cue_id = cue.map(Cue::id);

        let caption = cue.map(|c| c.text().to_string());
        self.publish(caption);
    }

    fn publish(&self, caption: Option<String>) {
        self.caption_tx.send_if_modified(|current| {
            if *current == caption {
                return false;
            }
            *current = caption;
            true
        });
    }

    /// One sampler tick. Returns `false` once the generation is stale.
    fn sample(&mut self, generation: u64, time: TimeSec) -> bool {
        if generation != self.generation {
            return false;
        }
        trace!(time, language = %self.state.current_language, "Caption sample");
        self.resolve_at(time);
        true
    }

    fn reset_position(&mut self) {
        self.state.reset();
        self.publish(None);
    }
}

fn lock_session(session: &Mutex<Session>) -> MutexGuard<'_, Session> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Caption synchronizer for one media player
pub struct PlaybackSynchronizer {
    session: Arc<Mutex<Session>>,
    clock: Arc<dyn PlaybackClock>,
    sampler: Option<Sampler>,
    sample_interval: Duration,
    caption_rx: watch::Receiver<Option<String>>,
}

impl PlaybackSynchronizer {
    /// Creates an idle synchronizer showing captions in `language`
    pub fn new(clock: Arc<dyn PlaybackClock>, language: Language) -> Self {
        let (caption_tx, caption_rx) = watch::channel(None);

        let session = Session {
            media_id: None,
            table: LanguageTable::new(),
            state: PlaybackState::new(language),
            status: PlaybackStatus::Idle,
            generation: 0,
            caption_tx,
        };

        Self {
            session: Arc::new(Mutex::new(session)),
            clock,
            sampler: None,
            sample_interval: Duration::from_millis(DEFAULT_SAMPLE_INTERVAL_MS),
            caption_rx,
        }
    }

    /// Overrides the sampler cadence (applies from the next start)
    pub fn with_sample_interval(mut self, interval: Duration) -> Self {
        self.sample_interval = interval;
        self
    }

    fn session(&self) -> MutexGuard<'_, Session> {
        lock_session(&self.session)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Receiver for the displayed caption; notified only on change
    pub fn subscribe(&self) -> watch::Receiver<Option<String>> {
        self.caption_rx.clone()
    }

    /// Caption currently on screen
    pub fn current_caption(&self) -> Option<String> {
        self.caption_rx.borrow().clone()
    }

    pub fn state(&self) -> PlaybackState {
        self.session().state.clone()
    }

    pub fn status(&self) -> PlaybackStatus {
        self.session().status
    }

    pub fn language(&self) -> Language {
        self.session().state.current_language
    }

    pub fn media_id(&self) -> Option<MediaId> {
        self.session().media_id.clone()
    }

    pub fn sample_interval(&self) -> Duration {
        self.sample_interval
    }

    pub fn is_sampling(&self) -> bool {
        self.sampler.as_ref().is_some_and(Sampler::is_running)
    }

    /// Copy of the timeline loaded for `language`
    pub fn timeline(&self, language: Language) -> Timeline {
        self.session().table.timeline(language).clone()
    }

    // =========================================================================
    // Media lifecycle
    // =========================================================================

    /// Loads timelines for a new media item, replacing everything from the
    /// previous one. Leaves the synchronizer idle.
    pub fn load_media(&mut self, table: LanguageTable) -> MediaId {
        self.stop_sampling();

        let media_id = MediaId::generate();
        let mut session = self.session();
        session.media_id = Some(media_id.clone());
        session.table = table;
        session.status = PlaybackStatus::Idle;
        session.reset_position();

        info!(
            media_id = %media_id,
            languages = ?session.table.populated().collect::<Vec<_>>(),
            "Loaded caption timelines"
        );

        media_id
    }

    /// Replaces one language's timeline (a new caption upload).
    ///
    /// If it is the language on screen, the caption is re-resolved at the
    /// last sampled time. After `end` the screen stays blank until the next
    /// `play` or `refresh`.
    pub fn set_timeline(&mut self, language: Language, timeline: Timeline) {
        let mut session = self.session();
        debug!(language = %language, cues = timeline.len(), "Replacing caption timeline");
        session.table.insert(language, timeline);

        let on_screen = session.state.current_language == language;
        if on_screen && session.status != PlaybackStatus::Ended {
            let time = session.state.current_time;
            session.resolve_at(time);
        }
    }

    /// Stops sampling and discards all timelines
    pub fn teardown(&mut self) {
        self.stop_sampling();

        let mut session = self.session();
        if let Some(media_id) = session.media_id.take() {
            debug!(media_id = %media_id, "Tearing down caption session");
        }
        session.table.clear();
        session.status = PlaybackStatus::Idle;
        session.reset_position();
    }

    // =========================================================================
    // Media events
    // =========================================================================

    /// Media started or resumed playing
    pub fn play(&mut self) -> CoreResult<()> {
        self.start_sampling()?;
        self.session().status = PlaybackStatus::Playing;
        debug!("Playback started");
        Ok(())
    }

    /// Media paused; the last caption stays on screen
    pub fn pause(&mut self) {
        self.stop_sampling();

        let mut session = self.session();
        if session.status == PlaybackStatus::Playing {
            session.status = PlaybackStatus::Paused;
            debug!(time = session.state.current_time, "Playback paused");
        }
    }

    /// Media reached its end; the caption is cleared and the position reset
    pub fn end(&mut self) {
        self.stop_sampling();

        let mut session = self.session();
        session.status = PlaybackStatus::Ended;
        session.reset_position();
        debug!("Playback ended");
    }

    /// Re-resolves immediately at the clock's position (e.g. after a seek)
    pub fn refresh(&self) {
        let time = self.clock.current_time();
        self.session().resolve_at(time);
    }

    // =========================================================================
    // Sampler control
    // =========================================================================

    /// Starts (or restarts) the periodic sampler.
    ///
    /// Needs a Tokio runtime; returns `CoreError::RuntimeUnavailable` otherwise.
    pub fn start_sampling(&mut self) -> CoreResult<()> {
        self.stop_sampling();

        let generation = {
            let mut session = self.session();
            session.generation += 1;
            session.generation
        };

        let session = Arc::clone(&self.session);
        let clock = Arc::clone(&self.clock);
        let sampler = Sampler::spawn(self.sample_interval, move || {
            let time = clock.current_time();
            lock_session(&session).sample(generation, time)
        })?;

        debug!(
            generation,
            interval_ms = self.sample_interval.as_millis() as u64,
            "Caption sampler started"
        );
        self.sampler = Some(sampler);
        Ok(())
    }

    /// Stops the periodic sampler. Safe to call when already stopped.
    pub fn stop_sampling(&mut self) {
        // Invalidate any tick already past its await point
        self.session().generation += 1;

        if let Some(sampler) = self.sampler.take() {
            sampler.cancel();
            debug!("Caption sampler stopped");
        }
    }

    // =========================================================================
    // Language
    // =========================================================================

    /// Switches the caption language and re-resolves at the clock's current
    /// position without waiting for the next tick.
    ///
    /// Returns `false` when `language` is already selected.
    pub fn set_language(&mut self, language: Language) -> bool {
        let mut session = self.session();
        if session.state.current_language == language {
            return false;
        }

        session.state.current_language = language;
        let time = self.clock.current_time();
        session.resolve_at(time);

        debug!(language = %language, time, "Caption language switched");
        true
    }

    /// Switches language from a document language tag (`"en-US"`).
    ///
    /// Unsupported tags are ignored.
    pub fn set_language_tag(&mut self, tag: &str) -> bool {
        match Language::from_tag(tag) {
            Some(language) => self.set_language(language),
            None => {
                trace!(tag, "Ignoring unsupported language tag");
                false
            }
        }
    }
}

impl Drop for PlaybackSynchronizer {
    fn drop(&mut self) {
        self.stop_sampling();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::captions::parse;
    use crate::core::playback::ManualClock;

    const ES: &str = "00:00:01.000 --> 00:00:04.000\nHola\n\n00:00:05.000 --> 00:00:07.500\nMundo";
    const EN: &str = "00:00:01.000 --> 00:00:03.000\nHello\n\n00:00:03.500 --> 00:00:06.000\nWorld";

    fn table() -> LanguageTable {
        LanguageTable::new()
            .with(Language::Es, Timeline::new(parse(ES, 10).unwrap()))
            .with(Language::En, Timeline::new(parse(EN, 10).unwrap()))
    }

    fn synchronizer(time: TimeSec) -> (PlaybackSynchronizer, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(time));
        let mut sync = PlaybackSynchronizer::new(clock.clone(), Language::Es);
        sync.load_media(table());
        (sync, clock)
    }

    async fn tick() {
        tokio::time::sleep(Duration::from_millis(101)).await;
    }

    #[test]
    fn test_new_synchronizer_is_idle() {
        let clock = Arc::new(ManualClock::new(0.0));
        let sync = PlaybackSynchronizer::new(clock, Language::En);
        assert_eq!(sync.status(), PlaybackStatus::Idle);
        assert_eq!(sync.language(), Language::En);
        assert!(sync.media_id().is_none());
        assert!(sync.current_caption().is_none());
        assert!(!sync.is_sampling());
        assert_eq!(sync.sample_interval(), Duration::from_millis(100));
    }

    #[test]
    fn test_play_without_runtime_errors() {
        let (mut sync, _clock) = synchronizer(2.0);
        assert!(sync.play().is_err());
        assert_eq!(sync.status(), PlaybackStatus::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sampler_publishes_after_one_period() {
        let (mut sync, _clock) = synchronizer(2.0);
        sync.play().unwrap();
        assert_eq!(sync.status(), PlaybackStatus::Playing);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(sync.current_caption().is_none());

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(sync.current_caption().as_deref(), Some("Hola"));
        assert_eq!(sync.state().active_cue_id(), Some(1));
        assert_eq!(sync.state().current_time(), 2.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_caption_follows_clock() {
        let (mut sync, clock) = synchronizer(0.0);
        let mut rx = sync.subscribe();
        sync.play().unwrap();

        clock.set(1.5);
        tick().await;
        assert_eq!(sync.current_caption().as_deref(), Some("Hola"));
        assert!(rx.has_changed().unwrap());
        rx.borrow_and_update();

        clock.set(4.5);
        tick().await;
        assert!(sync.current_caption().is_none());
        assert_eq!(sync.state().active_cue_id(), None);

        clock.set(6.0);
        tick().await;
        assert_eq!(sync.current_caption().as_deref(), Some("Mundo"));

        // Same caption again: no new notification
        rx.borrow_and_update();
        clock.set(6.5);
        tick().await;
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_language_switch_is_immediate() {
        let (mut sync, clock) = synchronizer(4.0);
        sync.play().unwrap();
        tick().await;
        assert_eq!(sync.current_caption().as_deref(), Some("Hola"));

        assert!(sync.set_language(Language::En));
        // No tick in between: the en timeline at t=4 is "World"
        assert_eq!(sync.current_caption().as_deref(), Some("World"));
        assert_eq!(sync.state().current_language(), Language::En);
        assert_eq!(sync.state().active_cue_id(), Some(2));

        assert!(!sync.set_language(Language::En));

        clock.set(2.0);
        tick().await;
        assert_eq!(sync.current_caption().as_deref(), Some("Hello"));
    }

    #[test]
    fn test_language_switch_without_playback() {
        let (mut sync, _clock) = synchronizer(2.0);
        assert!(sync.set_language_tag("en-US"));
        assert_eq!(sync.current_caption().as_deref(), Some("Hello"));
        assert!(!sync.set_language_tag("fr-FR"));
        assert_eq!(sync.language(), Language::En);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_keeps_caption_and_stops_sampling() {
        let (mut sync, clock) = synchronizer(2.0);
        sync.play().unwrap();
        tick().await;

        sync.pause();
        assert_eq!(sync.status(), PlaybackStatus::Paused);
        assert!(!sync.is_sampling());

        clock.set(6.0);
        tick().await;
        tick().await;
        assert_eq!(sync.current_caption().as_deref(), Some("Hola"));

        sync.play().unwrap();
        tick().await;
        assert_eq!(sync.current_caption().as_deref(), Some("Mundo"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_end_clears_caption_and_resets() {
        let (mut sync, clock) = synchronizer(2.0);
        sync.play().unwrap();
        tick().await;

        sync.end();
        assert_eq!(sync.status(), PlaybackStatus::Ended);
        assert!(sync.current_caption().is_none());
        assert_eq!(sync.state().current_time(), 0.0);
        assert_eq!(sync.state().active_cue_id(), None);

        clock.set(6.0);
        tick().await;
        assert!(sync.current_caption().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_sampling_is_idempotent() {
        let (mut sync, _clock) = synchronizer(2.0);
        sync.stop_sampling();
        sync.stop_sampling();
        assert!(!sync.is_sampling());

        sync.start_sampling().unwrap();
        assert!(sync.is_sampling());
        sync.stop_sampling();
        sync.stop_sampling();
        assert!(!sync.is_sampling());
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_timeline_shows_nothing() {
        let clock = Arc::new(ManualClock::new(2.0));
        let mut sync = PlaybackSynchronizer::new(clock, Language::En);
        sync.load_media(
            LanguageTable::new().with(Language::Es, Timeline::new(parse(ES, 10).unwrap())),
        );

        sync.play().unwrap();
        tick().await;
        assert!(sync.current_caption().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_media_discards_previous_session() {
        let (mut sync, _clock) = synchronizer(2.0);
        let first = sync.media_id().unwrap();
        sync.play().unwrap();
        tick().await;

        let second = sync.load_media(LanguageTable::new());
        assert_ne!(first, second);
        assert_eq!(sync.status(), PlaybackStatus::Idle);
        assert!(!sync.is_sampling());
        assert!(sync.current_caption().is_none());
        assert!(sync.timeline(Language::Es).is_empty());
    }

    #[test]
    fn test_set_timeline_re_resolves_current_language() {
        let (mut sync, _clock) = synchronizer(2.0);
        sync.refresh();
        assert_eq!(sync.current_caption().as_deref(), Some("Hola"));

        let replacement = parse("00:00:01.000 --> 00:00:03.000\nBuenas", 10).unwrap();
        sync.set_timeline(Language::Es, Timeline::new(replacement));
        assert_eq!(sync.current_caption().as_deref(), Some("Buenas"));

        sync.set_timeline(Language::En, Timeline::empty());
        assert_eq!(sync.current_caption().as_deref(), Some("Buenas"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_timeline_after_end_keeps_screen_blank() {
        let (mut sync, _clock) = synchronizer(2.0);
        sync.play().unwrap();
        tick().await;
        sync.end();

        let from_zero = parse("00:00:00.000 --> 00:00:03.000\nDesde cero", 10).unwrap();
        sync.set_timeline(Language::Es, Timeline::new(from_zero));
        assert_eq!(sync.status(), PlaybackStatus::Ended);
        assert!(sync.current_caption().is_none());
        assert_eq!(sync.state().active_cue_id(), None);
        assert_eq!(sync.timeline(Language::Es).len(), 1);

        sync.refresh();
        assert_eq!(sync.current_caption().as_deref(), Some("Desde cero"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_teardown_and_drop_release_sampler() {
        let (mut sync, _clock) = synchronizer(2.0);
        sync.play().unwrap();
        let rx = sync.subscribe();

        sync.teardown();
        assert_eq!(sync.status(), PlaybackStatus::Idle);
        assert!(sync.media_id().is_none());
        assert!(sync.timeline(Language::Es).is_empty());
        assert!(!sync.is_sampling());

        sync.play().unwrap();
        drop(sync);
        tick().await;
        // Sender lives in the session, which the aborted task released
        assert!(rx.has_changed().is_err());
    }

    #[test]
    fn test_stale_generation_tick_is_ignored() {
        let (sync, _clock) = synchronizer(2.0);
        let mut session = sync.session();
        let stale = session.generation;
        session.generation += 1;
        assert!(!session.sample(stale, 2.0));
        drop(session);
        assert!(sync.current_caption().is_none());
    }
}
