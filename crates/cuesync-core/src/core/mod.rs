//! cuesync Core Engine
//!
//! Caption parsing, language tables, playback synchronization and settings.

pub mod captions;
pub mod language;
pub mod playback;
pub mod settings;
pub mod upload;

// Re-export common types
mod types;
pub use types::*;

mod error;
pub use error::*;

pub use language::{Language, LanguageTable};

#[cfg(test)]
mod tests_destructive;
