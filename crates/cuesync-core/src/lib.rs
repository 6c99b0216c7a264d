//! cuesync Core Library
//!
//! Timed-caption parsing and playback synchronization.
//! This library contains the caption parser, the per-language timeline model,
//! the fixed-cadence playback sampler and the upload-side validation helpers.
//!
//! The presentation layer (a media element, a terminal, a webview) is an
//! external collaborator: it feeds a playback clock in and consumes the
//! displayed caption string through a watch channel.

pub mod core;

pub use crate::core::captions::{parse, parse_source, Cue, ParseError, Timeline};
pub use crate::core::playback::{resolve_active_cue, PlaybackSynchronizer};
pub use crate::core::{CoreError, CoreResult, Language};
