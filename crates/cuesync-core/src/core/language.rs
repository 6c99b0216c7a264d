//! Caption Languages
//!
//! The set of caption languages is closed. Every supported language always
//! has a timeline in a `LanguageTable`, possibly an empty one.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::captions::Timeline;

/// Supported caption language
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Es,
    En,
}

impl Language {
    /// Every supported language, in display order
    pub const ALL: [Language; 2] = [Language::Es, Language::En];

    /// Language used when a locale is not supported
    pub const FALLBACK: Language = Language::En;

    pub fn code(self) -> &'static str {
        match self {
            Self::Es => "es",
            Self::En => "en",
        }
    }

    /// Reads the primary subtag of a language tag (`"es-MX"` → `es`).
    ///
    /// Returns `None` for unsupported languages.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let primary = tag.trim().split(|c: char| c == '-' || c == '_').next().unwrap_or("");
        match primary.to_ascii_lowercase().as_str() {
            "es" => Some(Self::Es),
            "en" => Some(Self::En),
            _ => None,
        }
    }

    /// Picks the caption language for a user locale, falling back to English
    pub fn detect(locale: &str) -> Self {
        Self::from_tag(locale).unwrap_or(Self::FALLBACK)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_tag(s).ok_or_else(|| format!("Unsupported caption language: {}", s))
    }
}

/// Timelines keyed by language, with an entry for every supported language
#[derive(Clone, Debug, PartialEq)]
pub struct LanguageTable {
    timelines: BTreeMap<Language, Timeline>,
}

impl LanguageTable {
    /// Creates a table with an empty timeline for each language
    pub fn new() -> Self {
        Self {
            timelines: Language::ALL
                .iter()
                .map(|lang| (*lang, Timeline::empty()))
                .collect(),
        }
    }

    /// Builder-style insert
    pub fn with(mut self, language: Language, timeline: Timeline) -> Self {
        self.insert(language, timeline);
        self
    }

    /// Replaces a language's timeline wholesale, returning the old one
    pub fn insert(&mut self, language: Language, timeline: Timeline) -> Timeline {
        self.timelines
            .insert(language, timeline)
            .unwrap_or_default()
    }

    /// Timeline for `language`. Always present.
    pub fn timeline(&self, language: Language) -> &Timeline {
        static EMPTY: Timeline = Timeline::EMPTY;
        self.timelines.get(&language).unwrap_or(&EMPTY)
    }

    /// Languages whose timeline has at least one cue
    pub fn populated(&self) -> impl Iterator<Item = Language> + '_ {
        self.timelines
            .iter()
            .filter(|(_, timeline)| !timeline.is_empty())
            .map(|(lang, _)| *lang)
    }

    /// Whether every language has at least one cue
    pub fn is_complete(&self) -> bool {
        self.populated().count() == Language::ALL.len()
    }

    /// Drops every cue, keeping one empty entry per language
    pub fn clear(&mut self) {
        for timeline in self.timelines.values_mut() {
            *timeline = Timeline::empty();
        }
    }
}

impl Default for LanguageTable {
    fn default() -> Self {
        Self::new()
    }
}
