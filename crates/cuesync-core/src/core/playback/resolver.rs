//! Active Cue Resolution

use crate::core::captions::Cue;
use crate::core::TimeSec;

/// Returns the cue shown at `time`.
///
/// `timeline` is expected in start order, so when ranges overlap the
/// earliest-starting cue wins. A miss (gap, empty timeline, NaN time) is
/// `None`, never an error.
pub fn resolve_active_cue(timeline: &[Cue], time: TimeSec) -> Option<&Cue> {
    timeline.iter().find(|cue| cue.contains(time))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::captions::{parse, Timeline};

    fn reference_timeline() -> Timeline {
        let raw = "00:00:01.000 --> 00:00:04.000\nHola\n\n00:00:05.000 --> 00:00:07.500\nMundo";
        Timeline::new(parse(raw, 10).unwrap())
    }

    #[test]
    fn test_resolve_inside_cue() {
        let timeline = reference_timeline();
        let cue = resolve_active_cue(timeline.cues(), 2.0).unwrap();
        assert_eq!(cue.id(), 1);
        assert_eq!(cue.text(), "Hola");

        let cue = resolve_active_cue(timeline.cues(), 7.5).unwrap();
        assert_eq!(cue.text(), "Mundo");
    }

    #[test]
    fn test_resolve_gap_and_bounds() {
        let timeline = reference_timeline();
        assert!(resolve_active_cue(timeline.cues(), 4.5).is_none());
        assert!(resolve_active_cue(timeline.cues(), 0.5).is_none());
        assert!(resolve_active_cue(timeline.cues(), 8.0).is_none());
        assert!(resolve_active_cue(timeline.cues(), f64::NAN).is_none());
    }

    #[test]
    fn test_resolve_boundaries_are_inclusive() {
        let timeline = reference_timeline();
        assert_eq!(resolve_active_cue(timeline.cues(), 1.0).map(Cue::id), Some(1));
        assert_eq!(resolve_active_cue(timeline.cues(), 4.0).map(Cue::id), Some(1));
        assert_eq!(resolve_active_cue(timeline.cues(), 5.0).map(Cue::id), Some(2));
    }

    #[test]
    fn test_overlap_prefers_earliest_start() {
        let timeline = Timeline::new(vec![
            Cue::new(1, "B", 3.0, 8.0).unwrap(),
            Cue::new(2, "A", 0.0, 5.0).unwrap(),
        ]);

        assert_eq!(resolve_active_cue(timeline.cues(), 4.0).map(Cue::text), Some("A"));
        assert_eq!(resolve_active_cue(timeline.cues(), 6.0).map(Cue::text), Some("B"));
    }

    #[test]
    fn test_empty_timeline_resolves_to_none() {
        assert!(resolve_active_cue(&[], 1.0).is_none());
    }
}
