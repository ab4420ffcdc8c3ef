//! Markdown transcript parser.
//!
//! Reads the transcript layout written by speech-to-text tools:
//!
//! ```text
//! # Transcript: interview.m4a
//!
//! | Field    | Value |
//! |----------|-------|
//! | Language | en    |
//! | Duration | 01:05 |
//!
//! **[00:00 → 00:04]** **speaker_0** (female) Hello and welcome.
//! **[00:04 → 00:09]** **speaker_1** Thanks for having me.
//! ```

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use super::types::{Segment, Transcript, TranscriptMeta};

static SEGMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\*\*\[(\d{1,2}:\d{2}(?::\d{2})?) → (\d{1,2}:\d{2}(?::\d{2})?)\]\*\*(?:\s+\*\*(\w+)\*\*)?(?:\s+\((male|female)\))?\s+(.*)$",
    )
    .expect("segment pattern is valid")
});

/// Errors that can occur while reading a transcript.
#[derive(Error, Debug)]
pub enum TranscriptError {
    #[error("Failed to read transcript {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),
}

/// Parse a transcript file.
pub fn parse_file(path: &Path) -> Result<Transcript, TranscriptError> {
    let content = std::fs::read_to_string(path).map_err(|source| TranscriptError::Read {
        path: path.display().to_string(),
        source,
    })?;
    parse_str(&content)
}

/// Parse transcript markdown.
pub fn parse_str(content: &str) -> Result<Transcript, TranscriptError> {
    let mut meta = TranscriptMeta::default();
    let mut segments = Vec::new();

    for line in content.lines() {
        let line = line.trim();

        if let Some(source) = line.strip_prefix("# Transcript:") {
            meta.source_file = source.trim().to_string();
        } else if line.starts_with('|') {
            read_table_row(line, &mut meta)?;
        } else if let Some(caps) = SEGMENT_RE.captures(line) {
            let text = caps[5].trim();
            if text.is_empty() {
                continue;
            }

            segments.push(Segment {
                start: parse_timestamp(&caps[1])?,
                end: parse_timestamp(&caps[2])?,
                speaker: caps.get(3).map(|m| m.as_str().to_string()),
                text: text.to_string(),
                gender: caps.get(4).map(|m| m.as_str().to_string()),
            });
        }
    }

    Ok(Transcript { meta, segments })
}

fn read_table_row(line: &str, meta: &mut TranscriptMeta) -> Result<(), TranscriptError> {
    let cells: Vec<&str> = line.split('|').map(str::trim).collect();
    // "| Key | Value |" splits into ["", "Key", "Value", ""]
    if cells.len() < 3 {
        return Ok(());
    }

    let value = cells[2].to_string();
    match cells[1] {
        "Provider" => meta.provider = value,
        "Model" => meta.model = value,
        "Language" => meta.language = value,
        "Duration" => meta.duration = parse_timestamp(&value)?,
        _ => {}
    }

    Ok(())
}

/// Parse `m:ss`, `h:mm:ss` or plain seconds.
pub fn parse_timestamp(input: &str) -> Result<f64, TranscriptError> {
    let invalid = || TranscriptError::InvalidTimestamp(input.to_string());
    let parts: Vec<&str> = input.trim().split(':').collect();

    let seconds = match parts.as_slice() {
        [minutes, secs] => {
            minutes.parse::<u64>().map_err(|_| invalid())? as f64 * 60.0
                + secs.parse::<f64>().map_err(|_| invalid())?
        }
        [hours, minutes, secs] => {
            hours.parse::<u64>().map_err(|_| invalid())? as f64 * 3600.0
                + minutes.parse::<u64>().map_err(|_| invalid())? as f64 * 60.0
                + secs.parse::<f64>().map_err(|_| invalid())?
        }
        _ => input.trim().parse::<f64>().map_err(|_| invalid())?,
    };

    Ok(seconds)
}
