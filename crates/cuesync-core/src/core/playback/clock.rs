//! Playback Clocks
//!
//! The synchronizer samples a `PlaybackClock` rather than receiving time
//! pushes. Embedders with a real media element wrap its position; the CLI
//! and tests use `MediaClock` or `ManualClock`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::time::Instant;

use crate::core::TimeSec;

/// Source of the current playback position in seconds
pub trait PlaybackClock: Send + Sync {
    fn current_time(&self) -> TimeSec;
}

impl<F> PlaybackClock for F
where
    F: Fn() -> TimeSec + Send + Sync,
{
    fn current_time(&self) -> TimeSec {
        self()
    }
}

// =============================================================================
// Manual Clock
// =============================================================================

/// Clock whose position is set explicitly by the caller
#[derive(Debug, Default)]
pub struct ManualClock {
    bits: AtomicU64,
}

impl ManualClock {
    pub fn new(time: TimeSec) -> Self {
        Self {
            bits: AtomicU64::new(time.to_bits()),
        }
    }

    pub fn set(&self, time: TimeSec) {
        self.bits.store(time.to_bits(), Ordering::SeqCst);
    }
}

impl PlaybackClock for ManualClock {
    fn current_time(&self) -> TimeSec {
        f64::from_bits(self.bits.load(Ordering::SeqCst))
    }
}

// =============================================================================
// Media Clock
// =============================================================================

#[derive(Debug)]
struct MediaClockInner {
    /// Position at `anchor` (or the frozen position while paused)
    position: TimeSec,
    /// Set while playing
    anchor: Option<Instant>,
    rate: f64,
    duration: Option<TimeSec>,
}

impl MediaClockInner {
    fn now_position(&self, now: Instant) -> TimeSec {
        let position = match self.anchor {
            Some(anchor) => {
                self.position + now.saturating_duration_since(anchor).as_secs_f64() * self.rate
            }
            None => self.position,
        };
        self.clamp(position)
    }

    fn clamp(&self, position: TimeSec) -> TimeSec {
        let position = position.max(0.0);
        match self.duration {
            Some(duration) => position.min(duration),
            None => position,
        }
    }
}

/// Simulated media position that advances with Tokio time while playing.
///
/// Follows paused Tokio time in tests.
#[derive(Debug)]
pub struct MediaClock {
    inner: Mutex<MediaClockInner>,
}

impl MediaClock {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MediaClockInner {
                position: 0.0,
                anchor: None,
                rate: 1.0,
                duration: None,
            }),
        }
    }

    /// Stops the clock at `duration` seconds
    pub fn with_duration(self, duration: TimeSec) -> Self {
        self.lock().duration = Some(duration.max(0.0));
        self
    }

    fn lock(&self) -> MutexGuard<'_, MediaClockInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn play(&self) {
        let mut inner = self.lock();
        if inner.anchor.is_none() {
            inner.anchor = Some(Instant::now());
        }
    }

    pub fn pause(&self) {
        let mut inner = self.lock();
        let now = Instant::now();
        inner.position = inner.now_position(now);
        inner.anchor = None;
    }

    /// Jumps to `time`, keeping the play/pause state
    pub fn seek(&self, time: TimeSec) {
        let mut inner = self.lock();
        inner.position = inner.clamp(time);
        if inner.anchor.is_some() {
            inner.anchor = Some(Instant::now());
        }
    }

    /// Changes the playback rate; non-finite or negative rates are ignored
    pub fn set_rate(&self, rate: f64) {
        if !rate.is_finite() || rate < 0.0 {
            return;
        }
        let mut inner = self.lock();
        let now = Instant::now();
        inner.position = inner.now_position(now);
        if inner.anchor.is_some() {
            inner.anchor = Some(now);
        }
        inner.rate = rate;
    }

    pub fn is_playing(&self) -> bool {
        self.lock().anchor.is_some()
    }

    /// Whether the position reached the configured duration
    pub fn is_finished(&self) -> bool {
        let inner = self.lock();
        match inner.duration {
            Some(duration) => inner.now_position(Instant::now()) >= duration,
            None => false,
        }
    }

    pub fn duration(&self) -> Option<TimeSec> {
        self.lock().duration
    }
}

impl Default for MediaClock {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackClock for MediaClock {
    fn current_time(&self) -> TimeSec {
        self.lock().now_position(Instant::now())
    }
}
