//! Playback Synchronization Module
//!
//! Resolves which caption is on screen while media plays.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                  Playback Synchronization                       │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  resolver.rs     - Active cue lookup for a time                 │
//! │  clock.rs        - PlaybackClock trait, manual and media clocks │
//! │  sampler.rs      - Fixed-cadence timer task with abort guard    │
//! │  state.rs        - PlaybackState / PlaybackStatus               │
//! │  synchronizer.rs - Owns timelines, state and the sampler        │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example Usage
//!
//! ```rust,ignore
//! let clock = Arc::new(MediaClock::new());
//! let mut sync = PlaybackSynchronizer::new(clock.clone(), Language::Es);
//! sync.load_media(table);
//!
//! let mut captions = sync.subscribe();
//! clock.play();
//! sync.play()?;
//!
//! while captions.changed().await.is_ok() {
//!     println!("{:?}", *captions.borrow());
//! }
//! ```

mod clock;
mod resolver;
mod sampler;
mod state;
mod synchronizer;

pub use clock::{ManualClock, MediaClock, PlaybackClock};
pub use resolver::resolve_active_cue;
pub use sampler::Sampler;
pub use state::{PlaybackState, PlaybackStatus};
pub use synchronizer::PlaybackSynchronizer;
