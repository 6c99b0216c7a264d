//! Caption Settings
//!
//! Sampler cadence, starting language and caption file policy, persisted as
//! camelCase JSON in `{config_dir}/cuesync/settings.json`. Missing fields take
//! their defaults, out-of-range values are clamped on load and save, and
//! writes go through a temp file and rename while holding an advisory lock.

use serde::{Deserialize, Serialize};
use std::fs;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info, warn};

use super::{
    CoreError, CoreResult, Language, DEFAULT_MAX_CUES, DEFAULT_MIN_DIALOGUE_LINES,
    DEFAULT_SAMPLE_INTERVAL_MS,
};

/// Current on-disk schema version
pub const SETTINGS_VERSION: u32 = 1;

/// Settings file name
pub const SETTINGS_FILE: &str = "settings.json";

/// Advisory lock shared by all readers and writers of the settings file
pub const SETTINGS_LOCK_FILE: &str = "settings.json.lock";

/// Directory name under the platform config dir
pub const APP_DIR_NAME: &str = "cuesync";

/// Language value meaning "follow the user locale"
pub const AUTO_LANGUAGE: &str = "auto";

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    #[serde(default = "default_version")]
    pub version: u32,

    /// Playback settings
    #[serde(default)]
    pub playback: PlaybackSettings,

    /// Caption settings
    #[serde(default)]
    pub captions: CaptionSettings,
}

fn default_version() -> u32 {
    SETTINGS_VERSION
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            playback: PlaybackSettings::default(),
            captions: CaptionSettings::default(),
        }
    }
}

impl AppSettings {
    /// Clamps every field into its accepted range
    pub fn normalize(&mut self) {
        self.version = SETTINGS_VERSION;

        self.playback.sample_interval_ms = self.playback.sample_interval_ms.clamp(10, 1000);
        self.playback.default_language = normalize_language(&self.playback.default_language);

        self.captions.max_cues = self.captions.max_cues.clamp(1, 1000);
        self.captions.min_dialogue_lines = self.captions.min_dialogue_lines.min(1000);
    }
}

fn normalize_language(value: &str) -> String {
    if value.eq_ignore_ascii_case(AUTO_LANGUAGE) {
        return AUTO_LANGUAGE.to_string();
    }
    match Language::from_tag(value) {
        Some(language) => language.code().to_string(),
        None => default_language(),
    }
}

/// Playback settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackSettings {
    /// Caption sampler cadence in milliseconds (10 - 1000)
    #[serde(default = "default_sample_interval")]
    pub sample_interval_ms: u64,

    /// Initial caption language: "auto", "es", "en"
    #[serde(default = "default_language")]
    pub default_language: String,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            sample_interval_ms: default_sample_interval(),
            default_language: default_language(),
        }
    }
}

impl PlaybackSettings {
    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.sample_interval_ms)
    }

    /// Resolves the starting language, consulting `locale` when set to "auto"
    pub fn initial_language(&self, locale: Option<&str>) -> Language {
        if self.default_language.eq_ignore_ascii_case(AUTO_LANGUAGE) {
            return Language::detect(locale.unwrap_or_default());
        }
        Language::from_tag(&self.default_language).unwrap_or(Language::FALLBACK)
    }
}

fn default_sample_interval() -> u64 {
    DEFAULT_SAMPLE_INTERVAL_MS
}

fn default_language() -> String {
    AUTO_LANGUAGE.to_string()
}

/// Caption file settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CaptionSettings {
    /// Cues kept per parsed file
    #[serde(default = "default_max_cues")]
    pub max_cues: usize,

    /// Dialogue lines a file must contain to be accepted
    #[serde(default = "default_min_dialogue_lines")]
    pub min_dialogue_lines: usize,
}

impl Default for CaptionSettings {
    fn default() -> Self {
        Self {
            max_cues: default_max_cues(),
            min_dialogue_lines: default_min_dialogue_lines(),
        }
    }
}

fn default_max_cues() -> usize {
    DEFAULT_MAX_CUES
}

fn default_min_dialogue_lines() -> usize {
    DEFAULT_MIN_DIALOGUE_LINES
}

/// Platform default settings directory, if one exists
pub fn default_settings_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME))
}

/// Reads and writes one settings file
pub struct SettingsManager {
    settings_path: PathBuf,
}

impl SettingsManager {
    /// Create a new settings manager storing `settings.json` in `dir`
    pub fn new(dir: PathBuf) -> Self {
        Self {
            settings_path: dir.join(SETTINGS_FILE),
        }
    }

    /// Create a settings manager for an explicit file path
    pub fn from_file(path: PathBuf) -> Self {
        Self {
            settings_path: path,
        }
    }

    fn lock_path(&self) -> PathBuf {
        self.settings_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(SETTINGS_LOCK_FILE)
    }

    fn with_lock<T>(&self, exclusive: bool, op: impl FnOnce() -> CoreResult<T>) -> CoreResult<T> {
        // The lock file lives next to the settings file
        if let Some(parent) = self.settings_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    CoreError::Settings(format!("Failed to create settings directory: {}", e))
                })?;
            }
        }

        let lock_file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(self.lock_path())
            .map_err(|e| CoreError::Settings(format!("Failed to open settings lock file: {}", e)))?;

        if exclusive {
            fs2::FileExt::lock_exclusive(&lock_file).map_err(|e| {
                CoreError::Settings(format!("Failed to lock settings file (exclusive): {}", e))
            })?;
        } else {
            fs2::FileExt::lock_shared(&lock_file).map_err(|e| {
                CoreError::Settings(format!("Failed to lock settings file (shared): {}", e))
            })?;
        }

        let result = op();

        if let Err(e) = fs2::FileExt::unlock(&lock_file) {
            warn!("Failed to unlock settings lock file: {}", e);
        }

        result
    }

    pub fn settings_path(&self) -> &Path {
        &self.settings_path
    }

    /// Load settings from disk, returning defaults if the file is missing or
    /// unreadable
    pub fn load(&self) -> AppSettings {
        match self.try_load() {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Failed to load settings, using defaults: {}", e);
                AppSettings::default()
            }
        }
    }

    /// Load settings from disk, reporting parse failures
    pub fn try_load(&self) -> CoreResult<AppSettings> {
        self.with_lock(false, || {
            if !self.settings_path.exists() {
                debug!(path = ?self.settings_path, "No settings file, using defaults");
                return Ok(AppSettings::default());
            }

            let content = fs::read_to_string(&self.settings_path)?;
            let mut settings = serde_json::from_str::<AppSettings>(&content)?;

            if settings.version < SETTINGS_VERSION {
                info!(
                    "Migrating settings from version {} to {}",
                    settings.version, SETTINGS_VERSION
                );
                settings = self.migrate(settings);
            }

            settings.normalize();
            Ok(settings)
        })
    }

    /// Normalizes and writes `settings`, returning what was stored
    pub fn save(&self, settings: &AppSettings) -> CoreResult<AppSettings> {
        self.with_lock(true, || {
            let mut normalized = settings.clone();
            normalized.normalize();

            let content = serde_json::to_string_pretty(&normalized)?;

            let temp_path = self.settings_path.with_extension("json.tmp");
            if temp_path.exists() {
                let _ = fs::remove_file(&temp_path);
            }

            let mut file = fs::File::create(&temp_path)?;
            file.write_all(content.as_bytes())?;
            file.sync_all()?;

            if cfg!(windows) && self.settings_path.exists() {
                // rename does not overwrite on Windows
                fs::remove_file(&self.settings_path)?;
            }
            fs::rename(&temp_path, &self.settings_path)?;

            info!(path = ?self.settings_path, "Settings saved");
            Ok(normalized)
        })
    }

    /// Deletes the settings file; later loads see defaults
    pub fn reset(&self) -> CoreResult<AppSettings> {
        self.with_lock(true, || {
            if self.settings_path.exists() {
                fs::remove_file(&self.settings_path)?;
                info!(path = ?self.settings_path, "Settings file removed");
            }
            Ok(AppSettings::default())
        })
    }

    fn migrate(&self, mut settings: AppSettings) -> AppSettings {
        settings.version = SETTINGS_VERSION;
        settings
    }
}
