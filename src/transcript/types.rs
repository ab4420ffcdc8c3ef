//! Transcript data model.

use serde::{Deserialize, Serialize};

/// One contiguous span of transcript speech.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Start offset in seconds.
    pub start: f64,
    /// End offset in seconds, never before `start`.
    pub end: f64,
    pub speaker: Option<String>,
    pub text: String,
    pub gender: Option<String>,
}

impl Segment {
    /// Create a segment without speaker or gender.
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            speaker: None,
            text: text.into(),
            gender: None,
        }
    }

    /// Set the speaker label.
    pub fn with_speaker(mut self, speaker: impl Into<String>) -> Self {
        self.speaker = Some(speaker.into());
        self
    }

    /// Set the gender label.
    pub fn with_gender(mut self, gender: impl Into<String>) -> Self {
        self.gender = Some(gender.into());
        self
    }

    /// Length of the time window in seconds.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Short label like `[00:04 → 00:06] speaker_0` for progress output.
    pub fn label(&self) -> String {
        let window = format!("[{} → {}]", format_clock(self.start), format_clock(self.end));
        match &self.speaker {
            Some(speaker) => format!("{window} {speaker}"),
            None => window,
        }
    }
}

/// Transcript header information.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TranscriptMeta {
    pub provider: String,
    pub model: String,
    pub language: String,
    /// Nominal total duration in seconds, 0 when the header has none.
    pub duration: f64,
    pub source_file: String,
}

/// A parsed transcript.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    pub meta: TranscriptMeta,
    pub segments: Vec<Segment>,
}

impl Transcript {
    /// Length of the timed output track.
    ///
    /// Falls back to the last segment's end when the header carries no duration.
    pub fn total_duration(&self) -> f64 {
        if self.meta.duration > 0.0 {
            return self.meta.duration;
        }
        self.segments.last().map(|s| s.end).unwrap_or(0.0)
    }

    /// Language used for rate estimation, English when unknown.
    pub fn language(&self) -> &str {
        if self.meta.language.is_empty() {
            "en"
        } else {
            &self.meta.language
        }
    }

    /// Segments spoken by one of `speakers`; all segments when the list is empty.
    pub fn filter_speakers(&self, speakers: &[String]) -> Vec<Segment> {
        if speakers.is_empty() {
            return self.segments.clone();
        }

        self.segments
            .iter()
            .filter(|s| {
                s.speaker
                    .as_ref()
                    .is_some_and(|speaker| speakers.contains(speaker))
            })
            .cloned()
            .collect()
    }
}

/// Format seconds as `mm:ss`.
pub fn format_clock(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    format!("{:02}:{:02}", total / 60, total % 60)
}

/// Format seconds as `mm:ss`, or `hh:mm:ss` from one hour up.
pub fn format_duration(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    let (minutes, secs) = (total / 60, total % 60);
    if minutes >= 60 {
        format!("{:02}:{:02}:{:02}", minutes / 60, minutes % 60, secs)
    } else {
        format!("{minutes:02}:{secs:02}")
    }
}
