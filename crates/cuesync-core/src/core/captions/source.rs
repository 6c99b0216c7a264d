//! Caption Text Sources
//!
//! The parser never touches the filesystem. Callers hand it a `TextSource`,
//! which turns a file or an in-memory blob into text.

use std::path::{Path, PathBuf};

use super::ParseError;

/// UTF-8 byte order mark, common at the start of SRT files
const UTF8_BOM: char = '\u{feff}';

/// Capability to load a caption file's text content
pub trait TextSource {
    /// Name used in logs and error messages (usually the file name)
    fn name(&self) -> &str;

    /// Reads the whole content as text
    fn read_text(&self) -> Result<String, ParseError>;
}

/// Decodes bytes as UTF-8, dropping a leading byte order mark
fn decode(name: &str, bytes: Vec<u8>) -> Result<String, ParseError> {
    let text = String::from_utf8(bytes)
        .map_err(|e| ParseError::UnreadableInput(format!("{}: not valid UTF-8 ({})", name, e)))?;

    Ok(match text.strip_prefix(UTF8_BOM) {
        Some(stripped) => stripped.to_string(),
        None => text,
    })
}

// =============================================================================
// File Source
// =============================================================================

/// Caption file on disk
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    name: String,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        Self { path, name }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TextSource for FileSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn read_text(&self) -> Result<String, ParseError> {
        let bytes = std::fs::read(&self.path).map_err(|e| {
            ParseError::UnreadableInput(format!("{}: {}", self.path.display(), e))
        })?;
        decode(&self.name, bytes)
    }
}

// =============================================================================
// Bytes Source
// =============================================================================

/// Caption content already held in memory (e.g. an uploaded blob)
#[derive(Debug, Clone)]
pub struct BytesSource {
    name: String,
    bytes: Vec<u8>,
}

impl BytesSource {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

impl TextSource for BytesSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn read_text(&self) -> Result<String, ParseError> {
        decode(&self.name, self.bytes.clone())
    }
}
