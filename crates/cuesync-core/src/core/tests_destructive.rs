//! Destructive and Edge Case Tests
//!
//! Hostile or unusual caption input must either parse to something sane or
//! fail with a parse error. Nothing here may panic.

use std::sync::Arc;

use crate::core::captions::{count_dialogue_lines, parse, SubtitleFormat, Timeline};
use crate::core::playback::{resolve_active_cue, ManualClock, PlaybackSynchronizer};
use crate::core::{Language, LanguageTable, DEFAULT_MAX_CUES};

#[test]
fn test_destructive_arrow_only_lines() {
    assert!(parse(" --> ", DEFAULT_MAX_CUES).is_err());
    assert!(parse("-->", DEFAULT_MAX_CUES).unwrap().is_empty());
    assert!(parse("-->\n-->\n-->", DEFAULT_MAX_CUES).unwrap().is_empty());
}

#[test]
fn test_destructive_double_separator_is_not_timing() {
    let raw = "00:00:01.000 --> 00:00:02.000 --> 00:00:03.000\ntext";
    assert!(parse(raw, DEFAULT_MAX_CUES).unwrap().is_empty());
}

#[test]
fn test_destructive_huge_hours() {
    let cues = parse("99999999:00:00.000 --> 99999999:00:01.000\nlong", 10).unwrap();
    assert_eq!(cues.len(), 1);
    assert!(cues[0].start_time().is_finite());
}

#[test]
fn test_destructive_unicode_text() {
    let raw = "WEBVTT\n\n00:00:01.000 --> 00:00:02.000\n¿Qué tal? 🎬\n  ñandú  \n";
    let cues = parse(raw, DEFAULT_MAX_CUES).unwrap();
    assert_eq!(cues[0].text(), "¿Qué tal? 🎬   ñandú");
}

#[test]
fn test_destructive_unicode_digits_rejected() {
    // Arabic-Indic digits are not ASCII digits
    assert!(parse("٠٠:٠١.000 --> 00:02.000\nx", DEFAULT_MAX_CUES).is_err());
}

#[test]
fn test_destructive_webvtt_marker_mid_file_dropped() {
    let raw = "00:00:01.000 --> 00:00:02.000\nWEBVTT is a format\nkept";
    let cues = parse(raw, DEFAULT_MAX_CUES).unwrap();
    assert_eq!(cues[0].text(), "kept");
}

#[test]
fn test_destructive_many_cues_capped() {
    let raw: String = (0..10_000)
        .map(|i| format!("00:00:{:02}.000 --> 00:00:{:02}.500\nx\n", i % 60, i % 60))
        .collect();
    assert_eq!(parse(&raw, DEFAULT_MAX_CUES).unwrap().len(), DEFAULT_MAX_CUES);
    assert_eq!(parse(&raw, usize::MAX).unwrap().len(), 10_000);
}

#[test]
fn test_destructive_resolve_extreme_times() {
    let timeline = Timeline::new(parse("00:00:01.000 --> 00:00:02.000\nx", 10).unwrap());
    assert!(resolve_active_cue(timeline.cues(), f64::INFINITY).is_none());
    assert!(resolve_active_cue(timeline.cues(), f64::NEG_INFINITY).is_none());
    assert!(resolve_active_cue(timeline.cues(), -0.0).is_none());
}

#[test]
fn test_destructive_counting_garbage() {
    let garbage = "\u{0}\u{1}-->\n\n\n\r\r\n";
    assert_eq!(count_dialogue_lines(garbage, SubtitleFormat::Vtt), 0);
    assert_eq!(count_dialogue_lines("\u{0}-->\r\n\r\n", SubtitleFormat::Srt), 0);
    assert_eq!(count_dialogue_lines("", SubtitleFormat::Plain), 0);
}

#[test]
fn test_destructive_nan_clock() {
    let clock = Arc::new(ManualClock::new(f64::NAN));
    let mut sync = PlaybackSynchronizer::new(clock, Language::Es);
    sync.load_media(LanguageTable::new().with(
        Language::En,
        Timeline::new(parse("00:00:00.000 --> 99:00:00.000\nalways", 10).unwrap()),
    ));

    assert!(sync.set_language(Language::En));
    assert!(sync.current_caption().is_none());
    assert!(sync.state().active_cue_id().is_none());
}
