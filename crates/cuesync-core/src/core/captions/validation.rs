//! Caption Upload Checks
//!
//! Checks applied to a caption file before it is parsed: the file must look
//! like a VTT or SRT file, and it must hold a minimum number of dialogue
//! entries. The count runs over the whole file, independently of the
//! parser's cue cap.

use std::path::Path;

use thiserror::Error;

/// MIME types accepted for caption uploads
pub const ACCEPTED_MIME_TYPES: &[&str] = &["text/vtt", "application/x-subrip", "text/plain"];

/// File extensions accepted for caption uploads
pub const ACCEPTED_EXTENSIONS: &[&str] = &["vtt", "srt"];

// =============================================================================
// Error Types
// =============================================================================

/// Reasons a caption file is refused before parsing
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Unsupported caption format for '{file_name}': expected a VTT or SRT file")]
    UnsupportedFormat {
        file_name: String,
        mime_type: Option<String>,
    },

    #[error("Caption file '{file_name}' has {found} dialogue lines, at least {required} required")]
    TooFewDialogueLines {
        file_name: String,
        found: usize,
        required: usize,
    },

    #[error("Caption file '{0}' is empty")]
    EmptyContent(String),
}

impl ValidationError {
    pub fn reason(&self) -> &'static str {
        match self {
            Self::UnsupportedFormat { .. } => "unsupported-format",
            Self::TooFewDialogueLines { .. } => "too-few-dialogue-lines",
            Self::EmptyContent(_) => "empty-content",
        }
    }
}

// =============================================================================
// Format Detection
// =============================================================================

/// Caption layout used to count dialogue lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubtitleFormat {
    Vtt,
    Srt,
    /// Anything else that passed the MIME check
    Plain,
}

impl SubtitleFormat {
    /// Picks the counting layout from the file extension
    pub fn from_file_name(file_name: &str) -> Self {
        match extension(file_name).as_deref() {
            Some("vtt") => Self::Vtt,
            Some("srt") => Self::Srt,
            _ => Self::Plain,
        }
    }

    /// Accepts a file if either its MIME type or its extension is a known
    /// caption type.
    pub fn detect(file_name: &str, mime_type: Option<&str>) -> Result<Self, ValidationError> {
        let mime_ok = mime_type
            .map(|m| {
                ACCEPTED_MIME_TYPES
                    .iter()
                    .any(|accepted| accepted.eq_ignore_ascii_case(m.trim()))
            })
            .unwrap_or(false);
        let ext_ok = extension(file_name)
            .map(|ext| ACCEPTED_EXTENSIONS.contains(&ext.as_str()))
            .unwrap_or(false);

        if mime_ok || ext_ok {
            Ok(Self::from_file_name(file_name))
        } else {
            Err(ValidationError::UnsupportedFormat {
                file_name: file_name.to_string(),
                mime_type: mime_type.map(str::to_string),
            })
        }
    }
}

fn extension(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
}

// =============================================================================
// Dialogue Line Counting
// =============================================================================

/// Counts dialogue entries in `content`.
///
/// - VTT: the first non-empty, non-numeric line after each timing line
/// - SRT: blank-line separated blocks with at least index, timing and text
/// - Plain: every non-empty line
pub fn count_dialogue_lines(content: &str, format: SubtitleFormat) -> usize {
    let normalized = content.replace("\r\n", "\n");

    match format {
        SubtitleFormat::Vtt => {
            let mut count = 0;
            let mut in_cue = false;

            for line in normalized.split('\n') {
                let trimmed = line.trim();

                if trimmed.contains("-->") {
                    in_cue = true;
                    continue;
                }

                if in_cue && !trimmed.is_empty() && !is_index_line(trimmed) {
                    count += 1;
                    in_cue = false;
                }

                // Blank line closes the cue
                if in_cue && trimmed.is_empty() {
                    in_cue = false;
                }
            }

            count
        }
        SubtitleFormat::Srt => normalized
            .split("\n\n")
            .filter(|block| block.split('\n').count() >= 3)
            .count(),
        SubtitleFormat::Plain => normalized
            .split('\n')
            .filter(|line| !line.trim().is_empty())
            .count(),
    }
}

/// Checks the minimum dialogue count, returning the count on success
pub fn has_min_dialogue_lines(
    file_name: &str,
    content: &str,
    format: SubtitleFormat,
    required: usize,
) -> Result<usize, ValidationError> {
    if content.is_empty() {
        return Err(ValidationError::EmptyContent(file_name.to_string()));
    }

    let found = count_dialogue_lines(content, format);
    if found < required {
        return Err(ValidationError::TooFewDialogueLines {
            file_name: file_name.to_string(),
            found,
            required,
        });
    }

    Ok(found)
}

fn is_index_line(line: &str) -> bool {
    line.bytes().all(|b| b.is_ascii_digit())
}
