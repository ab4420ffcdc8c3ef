//! Transcript model and markdown parsing.
//!
//! A transcript is an ordered list of timed, optionally speaker-labelled
//! segments plus header metadata (language, nominal duration).

mod parser;
mod types;

pub use parser::{TranscriptError, parse_file, parse_str, parse_timestamp};
pub use types::{Segment, Transcript, TranscriptMeta, format_clock, format_duration};

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = "# Transcript: interview.m4a

| Field | Value |
|-------|-------|
| Provider | whisper |
| Model | large-v3 |
| Language | ko |
| Duration | 01:05 |

**[00:00 → 00:04]** **speaker_0** (female) Hello and welcome.
**[00:04 → 00:09]** **speaker_1** Thanks for having me.
**[00:09 → 00:12]** No speaker on this one.
**[00:12 → 00:13]**
**[1:00:00 → 1:00:05]** **speaker_0** Much later.
";

    // ===========================================
    // Parser tests
    // ===========================================

    #[test]
    fn test_parse_metadata_table() {
        let transcript = parse_str(SAMPLE).unwrap();

        assert_eq!(transcript.meta.source_file, "interview.m4a");
        assert_eq!(transcript.meta.provider, "whisper");
        assert_eq!(transcript.meta.model, "large-v3");
        assert_eq!(transcript.meta.language, "ko");
        assert_eq!(transcript.meta.duration, 65.0);
    }

    #[test]
    fn test_parse_segments() {
        let transcript = parse_str(SAMPLE).unwrap();

        // The empty-text line is dropped
        assert_eq!(transcript.segments.len(), 4);

        let first = &transcript.segments[0];
        assert_eq!(first.start, 0.0);
        assert_eq!(first.end, 4.0);
        assert_eq!(first.speaker.as_deref(), Some("speaker_0"));
        assert_eq!(first.gender.as_deref(), Some("female"));
        assert_eq!(first.text, "Hello and welcome.");

        let second = &transcript.segments[1];
        assert_eq!(second.speaker.as_deref(), Some("speaker_1"));
        assert_eq!(second.gender, None);

        let third = &transcript.segments[2];
        assert_eq!(third.speaker, None);
        assert_eq!(third.text, "No speaker on this one.");
    }

    #[test]
    fn test_parse_hour_timestamps() {
        let transcript = parse_str(SAMPLE).unwrap();
        let last = transcript.segments.last().unwrap();

        assert_eq!(last.start, 3600.0);
        assert_eq!(last.end, 3605.0);
        assert_eq!(last.duration(), 5.0);
    }

    #[test]
    fn test_parse_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let transcript = parse_file(file.path()).unwrap();
        assert_eq!(transcript.segments.len(), 4);
    }

    #[test]
    fn test_parse_file_missing() {
        let result = parse_file(std::path::Path::new("/nonexistent/transcript.md"));
        assert!(matches!(result.unwrap_err(), TranscriptError::Read { .. }));
    }

    #[test]
    fn test_parse_timestamp_formats() {
        assert_eq!(parse_timestamp("0:05").unwrap(), 5.0);
        assert_eq!(parse_timestamp("12:30").unwrap(), 750.0);
        assert_eq!(parse_timestamp("1:02:03").unwrap(), 3723.0);
        assert_eq!(parse_timestamp("42.5").unwrap(), 42.5);
        assert!(parse_timestamp("soon").is_err());
    }

    // ===========================================
    // Transcript helpers
    // ===========================================

    #[test]
    fn test_total_duration_from_header() {
        let transcript = parse_str(SAMPLE).unwrap();
        assert_eq!(transcript.total_duration(), 65.0);
    }

    #[test]
    fn test_total_duration_falls_back_to_last_segment() {
        let transcript = Transcript {
            meta: TranscriptMeta::default(),
            segments: vec![Segment::new(0.0, 2.0, "a"), Segment::new(2.0, 7.5, "b")],
        };
        assert_eq!(transcript.total_duration(), 7.5);
        assert_eq!(Transcript::default().total_duration(), 0.0);
    }

    #[test]
    fn test_language_defaults_to_english() {
        assert_eq!(Transcript::default().language(), "en");
    }

    #[test]
    fn test_filter_speakers() {
        let transcript = parse_str(SAMPLE).unwrap();

        let only_first = transcript.filter_speakers(&["speaker_0".to_string()]);
        assert_eq!(only_first.len(), 2);
        assert!(
            only_first
                .iter()
                .all(|s| s.speaker.as_deref() == Some("speaker_0"))
        );

        assert_eq!(transcript.filter_speakers(&[]).len(), 4);
        assert!(transcript.filter_speakers(&["nobody".to_string()]).is_empty());
    }

    #[test]
    fn test_segment_label() {
        let segment = Segment::new(64.0, 70.9, "Hi").with_speaker("speaker_2");
        assert_eq!(segment.label(), "[01:04 → 01:10] speaker_2");
        assert_eq!(Segment::new(0.0, 3.0, "Hi").label(), "[00:00 → 00:03]");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(59.9), "00:59");
        assert_eq!(format_duration(3725.0), "01:02:05");
        assert_eq!(format_clock(3725.0), "62:05");
    }
}
