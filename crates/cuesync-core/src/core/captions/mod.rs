//! Caption System Module
//!
//! Provides the caption side of cuesync:
//! - Caption data models (Cue, Timeline)
//! - Timed-text parsing (WebVTT/SRT subset)
//! - Text loading through a caller-provided source
//! - Upload-side checks (accepted formats, minimum dialogue lines)
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Caption System                              │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  models.rs     - Data structures (Cue, Timeline)                │
//! │  parser.rs     - Timing-line driven cue parser                  │
//! │  source.rs     - TextSource capability (files, byte buffers)    │
//! │  validation.rs - Format acceptance and dialogue line counting   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example Usage
//!
//! ```rust
//! use cuesync_core::core::captions::{parse, Timeline};
//!
//! let raw = "WEBVTT\n\n00:00:01.000 --> 00:00:04.000\nHola\n";
//! let cues = parse(raw, 10).unwrap();
//! let timeline = Timeline::new(cues);
//! assert_eq!(timeline.len(), 1);
//! ```

mod models;
mod parser;
mod source;
pub mod validation;

// Re-export models
pub use models::{Cue, Timeline};

// Re-export parsing functions
pub use parser::{parse, parse_source, ParseError, TimestampFault};

pub use source::{BytesSource, FileSource, TextSource};

pub use validation::{
    count_dialogue_lines, has_min_dialogue_lines, SubtitleFormat, ValidationError,
};
