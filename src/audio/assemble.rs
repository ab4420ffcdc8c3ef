//! Combining per-segment audio into one output track.

use std::path::{Path, PathBuf};

use crate::transcript::Segment;

use super::clip::AudioClip;
use super::ffmpeg::Transcoder;
use super::{AudioError, OutputFormat};

/// Silence inserted between segments in natural mode.
pub const DEFAULT_GAP_MS: u32 = 300;

/// Sample rate of the timed base track when no segment audio decodes.
pub const FALLBACK_SAMPLE_RATE: u32 = 24_000;

/// Builds output tracks from segment audio files.
///
/// A missing or undecodable input never aborts assembly; it is logged and
/// left out. Only writing the output can fail.
#[derive(Debug, Clone, Default)]
pub struct Assembler {
    transcoder: Transcoder,
}

impl Assembler {
    pub fn new(transcoder: Transcoder) -> Self {
        Self { transcoder }
    }

    /// Overlay each segment's audio at its start offset on a silent track of
    /// `total_duration` seconds. Returns the output duration.
    pub fn assemble_timed(
        &self,
        segments: &[Segment],
        audio_paths: &[PathBuf],
        total_duration: f64,
        output: &Path,
        format: OutputFormat,
    ) -> Result<f64, AudioError> {
        let placed: Vec<(f64, AudioClip)> = segments
            .iter()
            .zip(audio_paths)
            .filter_map(|(segment, path)| load(path).map(|clip| (segment.start, clip)))
            .collect();

        let sample_rate = placed
            .first()
            .map(|(_, clip)| clip.sample_rate())
            .unwrap_or(FALLBACK_SAMPLE_RATE);

        let mut track = AudioClip::silent(total_duration, sample_rate);
        for (start, clip) in &placed {
            track.overlay(clip, *start);
        }

        log::info!(
            "Timed track: {} of {} segments placed over {total_duration:.2}s",
            placed.len(),
            segments.len()
        );
        self.export(&track, output, format)?;
        Ok(track.duration())
    }

    /// Concatenate files in order with `gap_ms` of silence before every file
    /// but the first path, even when earlier paths failed to load.
    /// Returns the output duration.
    pub fn assemble_natural(
        &self,
        audio_paths: &[PathBuf],
        output: &Path,
        format: OutputFormat,
        gap_ms: u32,
    ) -> Result<f64, AudioError> {
        let track = join(audio_paths, gap_ms);

        log::info!("Natural track: {:.2}s", track.duration());
        self.export(&track, output, format)?;
        Ok(track.duration())
    }

    /// Concatenate files with no gap, e.g. the chunks of one segment.
    /// Returns the output duration.
    pub fn concat(&self, audio_paths: &[PathBuf], output: &Path) -> Result<f64, AudioError> {
        let track = join(audio_paths, 0);
        let format = OutputFormat::from_path(output).unwrap_or(OutputFormat::Wav);

        self.export(&track, output, format)?;
        Ok(track.duration())
    }

    /// Write `clip` to `output` in `format`.
    pub fn export(
        &self,
        clip: &AudioClip,
        output: &Path,
        format: OutputFormat,
    ) -> Result<(), AudioError> {
        match format {
            OutputFormat::Wav => clip.write_wav(output),
            OutputFormat::Mp3 => {
                let intermediate = tempfile::Builder::new()
                    .prefix("mix_")
                    .suffix(".wav")
                    .tempfile()?;
                clip.write_wav(intermediate.path())?;
                self.transcoder.encode_mp3(intermediate.path(), output)
            }
        }
    }
}

fn join(audio_paths: &[PathBuf], gap_ms: u32) -> AudioClip {
    let mut track: Option<AudioClip> = None;

    for (index, path) in audio_paths.iter().enumerate() {
        let Some(clip) = load(path) else {
            continue;
        };
        let track = track.get_or_insert_with(|| AudioClip::empty(clip.sample_rate()));
        if index > 0 {
            track.append_silence(gap_ms);
        }
        track.append(&clip);
    }

    track.unwrap_or_else(|| AudioClip::empty(FALLBACK_SAMPLE_RATE))
}

fn load(path: &Path) -> Option<AudioClip> {
    match AudioClip::decode(path) {
        Ok(clip) => Some(clip),
        Err(e) => {
            log::warn!("Leaving out {}: {e}", path.display());
            None
        }
    }
}
