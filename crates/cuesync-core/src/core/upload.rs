//! Caption Upload Handling
//!
//! Turns a user-selected caption file into a timeline: accepted-format check,
//! text loading, minimum dialogue check over the whole file, then parsing
//! with the configured cue cap. Failures are logged once per file and
//! returned to the caller, which owns user-facing messaging.

use tracing::{info, warn};

use super::captions::{has_min_dialogue_lines, parse, SubtitleFormat, TextSource, Timeline};
use super::settings::CaptionSettings;
use super::{CoreResult, Language, LanguageTable};

/// A caption file picked for one language
pub struct SubtitleUpload {
    pub language: Language,
    pub source: Box<dyn TextSource + Send>,
    /// MIME type reported by the picker, if any
    pub mime_type: Option<String>,
}

impl SubtitleUpload {
    pub fn new(language: Language, source: impl TextSource + Send + 'static) -> Self {
        Self {
            language,
            source: Box::new(source),
            mime_type: None,
        }
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }
}

/// Validates and parses one caption file into a timeline
pub fn prepare_subtitles(
    source: &dyn TextSource,
    mime_type: Option<&str>,
    settings: &CaptionSettings,
) -> CoreResult<Timeline> {
    let result = accept_subtitles(source, mime_type, settings);

    if let Err(e) = &result {
        warn!(file = source.name(), reason = e.reason(), "Caption file rejected: {}", e);
    }

    result
}

fn accept_subtitles(
    source: &dyn TextSource,
    mime_type: Option<&str>,
    settings: &CaptionSettings,
) -> CoreResult<Timeline> {
    let name = source.name();
    let format = SubtitleFormat::detect(name, mime_type)?;
    let text = source.read_text()?;
    let dialogue_lines = has_min_dialogue_lines(name, &text, format, settings.min_dialogue_lines)?;
    let cues = parse(&text, settings.max_cues)?;

    info!(
        file = name,
        format = ?format,
        dialogue_lines,
        cues = cues.len(),
        "Caption file accepted"
    );
    Ok(Timeline::new(cues))
}

/// Builds a language table from a set of uploads.
///
/// Languages without an upload keep an empty timeline. A later upload for the
/// same language replaces an earlier one. The first failing file aborts.
pub fn build_language_table(
    uploads: &[SubtitleUpload],
    settings: &CaptionSettings,
) -> CoreResult<LanguageTable> {
    let mut table = LanguageTable::new();
    for upload in uploads {
        let timeline = prepare_subtitles(
            upload.source.as_ref(),
            upload.mime_type.as_deref(),
            settings,
        )?;
        table.insert(upload.language, timeline);
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::captions::BytesSource;
    use crate::core::CoreError;

    fn vtt(count: usize, prefix: &str) -> String {
        let mut out = String::from("WEBVTT\n\n");
        for i in 0..count {
            out.push_str(&format!(
                "00:00:{:02}.000 --> 00:00:{:02}.900\n{} {}\n\n",
                i,
                i,
                prefix,
                i + 1
            ));
        }
        out
    }

    #[test]
    fn test_prepare_accepts_and_caps() {
        let source = BytesSource::new("es.vtt", vtt(14, "Linea"));
        let timeline = prepare_subtitles(&source, None, &CaptionSettings::default()).unwrap();

        assert_eq!(timeline.len(), 10);
        assert_eq!(timeline.cues()[0].text(), "Linea 1");
    }

    #[test]
    fn test_prepare_rejects_short_file() {
        let source = BytesSource::new("es.vtt", vtt(9, "Linea"));
        let err = prepare_subtitles(&source, None, &CaptionSettings::default()).unwrap_err();
        assert_eq!(err.reason(), "too-few-dialogue-lines");
    }

    #[test]
    fn test_prepare_rejects_wrong_format() {
        let source = BytesSource::new("clip.mp4", vtt(12, "x"));
        let err = prepare_subtitles(&source, Some("video/mp4"), &CaptionSettings::default())
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn test_prepare_reports_parse_failure() {
        let mut content = vtt(12, "ok");
        content.push_str("00:00:xx.000 --> 00:00:01.000\nbroken\n");
        let settings = CaptionSettings {
            max_cues: 20,
            ..CaptionSettings::default()
        };
        let source = BytesSource::new("broken.vtt", content);

        let err = prepare_subtitles(&source, None, &settings).unwrap_err();
        assert_eq!(err.reason(), "malformed-timestamp");
    }

    #[test]
    fn test_prepare_beyond_cap_is_not_parsed() {
        // The malformed cue lies past the cap, so parsing stops before it
        let mut content = vtt(12, "ok");
        content.push_str("00:00:xx.000 --> 00:00:01.000\nbroken\n");
        let source = BytesSource::new("late.vtt", content);

        let timeline = prepare_subtitles(&source, None, &CaptionSettings::default()).unwrap();
        assert_eq!(timeline.len(), 10);
    }

    #[test]
    fn test_prepare_unreadable_bytes() {
        let source = BytesSource::new("bad.srt", vec![0xc3, 0x28]);
        let err = prepare_subtitles(&source, None, &CaptionSettings::default()).unwrap_err();
        assert_eq!(err.reason(), "unreadable-input");
    }

    #[test]
    fn test_build_language_table() {
        let uploads = vec![
            SubtitleUpload::new(Language::Es, BytesSource::new("es.vtt", vtt(10, "Hola"))),
            SubtitleUpload::new(Language::En, BytesSource::new("en.txt", vtt(10, "Hello")))
                .with_mime_type("text/vtt"),
        ];

        let table = build_language_table(&uploads, &CaptionSettings::default()).unwrap();
        assert!(table.is_complete());
        assert_eq!(table.timeline(Language::En).cues()[0].text(), "Hello 1");
    }
}
