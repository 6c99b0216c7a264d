//! cuesync Core Type Definitions
//!
//! Defines fundamental types used throughout the project.

use std::fmt;

use serde::{Deserialize, Serialize};

// =============================================================================
// ID Types
// =============================================================================

/// Cue identifier (1-based, assigned in parse order)
pub type CueId = u32;

/// Loaded media session identifier (ULID)
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MediaId(String);

impl MediaId {
    /// Generates a fresh identifier for a newly loaded media item
    pub fn generate() -> Self {
        Self(ulid::Ulid::new().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MediaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// Time Types
// =============================================================================

/// Time in seconds (floating point)
pub type TimeSec = f64;

/// Default sampler cadence in milliseconds
pub const DEFAULT_SAMPLE_INTERVAL_MS: u64 = 100;

/// Default cap on cues kept per caption file
pub const DEFAULT_MAX_CUES: usize = 10;

/// Default minimum dialogue entries a caption file must contain
pub const DEFAULT_MIN_DIALOGUE_LINES: usize = 10;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_ids_are_unique() {
        let a = MediaId::generate();
        let b = MediaId::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 26);
        assert_eq!(a.to_string(), a.as_str());
    }
}
