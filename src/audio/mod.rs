//! Audio decoding, mixing and export.
//!
//! Segment audio is decoded to mono PCM, mixed in memory and written as WAV.
//! MP3 output and tempo changes are delegated to an external ffmpeg binary.

mod assemble;
mod clip;
mod ffmpeg;

use std::path::Path;
use std::time::Duration;

use clap::ValueEnum;
use thiserror::Error;

pub use assemble::{Assembler, DEFAULT_GAP_MS, FALLBACK_SAMPLE_RATE};
pub use clip::AudioClip;
pub use ffmpeg::{DEFAULT_TIMEOUT, Transcoder};

/// Errors that can occur while decoding, mixing or exporting audio.
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Audio file not found: {0}")]
    FileNotFound(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("Transcoder error: {0}")]
    Transcoder(String),

    #[error("Transcoder timed out after {0:?}")]
    Timeout(Duration),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Output container format.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Mp3,
    Wav,
}

impl OutputFormat {
    /// File extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Mp3 => "mp3",
            OutputFormat::Wav => "wav",
        }
    }

    /// Format implied by a path's extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_lowercase().as_str() {
            "mp3" => Some(OutputFormat::Mp3),
            "wav" => Some(OutputFormat::Wav),
            _ => None,
        }
    }
}

/// Measured duration of an audio file in seconds.
pub fn probe_duration(path: &Path) -> Result<f64, AudioError> {
    if OutputFormat::from_path(path) == Some(OutputFormat::Wav) {
        let reader = hound::WavReader::open(path)?;
        return Ok(f64::from(reader.duration()) / f64::from(reader.spec().sample_rate));
    }

    Ok(AudioClip::decode(path)?.duration())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timing::TempoChain;
    use crate::transcript::Segment;
    use std::path::PathBuf;
    use tempfile::TempDir;

    const RATE: u32 = 16_000;

    fn write_tone(path: &Path, seconds: f64, sample_rate: u32) {
        let len = (seconds * f64::from(sample_rate)).round() as usize;
        let samples = (0..len)
            .map(|i| 0.5 * (i as f32 * 440.0 * std::f32::consts::TAU / sample_rate as f32).sin())
            .map(|s| if s.abs() < 0.01 { 0.25 } else { s })
            .collect();
        AudioClip::new(samples, sample_rate).write_wav(path).unwrap();
    }

    /// Write an executable shell script standing in for ffmpeg.
    #[cfg(unix)]
    fn fake_ffmpeg(dir: &Path, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("ffmpeg");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 0.01
    }

    // ===========================================
    // AudioClip tests
    // ===========================================

    #[test]
    fn test_silent_clip_duration() {
        let clip = AudioClip::silent(2.5, RATE);
        assert_eq!(clip.samples().len(), 40_000);
        assert!(approx(clip.duration(), 2.5));
        assert!(clip.samples().iter().all(|s| *s == 0.0));
    }

    #[test]
    fn test_append_with_silence() {
        let mut clip = AudioClip::new(vec![0.5; 16_000], RATE);
        clip.append_silence(300);
        clip.append(&AudioClip::new(vec![0.5; 8_000], RATE));

        assert!(approx(clip.duration(), 1.8));
        assert_eq!(clip.samples()[16_000], 0.0);
        assert_eq!(clip.samples()[16_000 + 4_800], 0.5);
    }

    #[test]
    fn test_overlay_keeps_base_length() {
        let mut base = AudioClip::silent(1.0, RATE);
        base.overlay(&AudioClip::new(vec![0.5; 16_000], RATE), 0.5);

        assert_eq!(base.samples().len(), 16_000);
        assert_eq!(base.samples()[7_999], 0.0);
        assert_eq!(base.samples()[8_000], 0.5);
        assert_eq!(base.samples()[15_999], 0.5);
    }

    #[test]
    fn test_overlay_mixes_and_clamps() {
        let mut base = AudioClip::new(vec![0.75; 10], RATE);
        base.overlay(&AudioClip::new(vec![0.5; 10], RATE), 0.0);
        assert!(base.samples().iter().all(|s| *s == 1.0));
    }

    #[test]
    fn test_resample_changes_length_not_duration() {
        let clip = AudioClip::new(vec![0.25; 24_000], 24_000);
        let resampled = clip.resampled(RATE);

        assert_eq!(resampled.sample_rate(), RATE);
        assert_eq!(resampled.samples().len(), 16_000);
        assert!(approx(resampled.duration(), 1.0));
    }

    #[test]
    fn test_append_resamples_other_rate() {
        let mut clip = AudioClip::new(vec![0.1; 16_000], RATE);
        clip.append(&AudioClip::new(vec![0.1; 44_100], 44_100));
        assert!(approx(clip.duration(), 2.0));
    }

    #[test]
    fn test_wav_round_trip_and_probe() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("tone.wav");
        write_tone(&path, 1.25, 22_050);

        let decoded = AudioClip::decode(&path).unwrap();
        assert_eq!(decoded.sample_rate(), 22_050);
        assert!(approx(decoded.duration(), 1.25));
        assert!(approx(probe_duration(&path).unwrap(), 1.25));
    }

    #[test]
    fn test_decode_missing_file() {
        let result = AudioClip::decode(Path::new("/nonexistent/clip.wav"));
        assert!(matches!(result.unwrap_err(), AudioError::FileNotFound(_)));
    }

    #[test]
    fn test_decode_garbage_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.mp3");
        std::fs::write(&path, b"definitely not audio").unwrap();

        assert!(AudioClip::decode(&path).is_err());
    }

    #[test]
    fn test_output_format_from_path() {
        assert_eq!(
            OutputFormat::from_path(Path::new("a/b.MP3")),
            Some(OutputFormat::Mp3)
        );
        assert_eq!(
            OutputFormat::from_path(Path::new("out.wav")),
            Some(OutputFormat::Wav)
        );
        assert_eq!(OutputFormat::from_path(Path::new("out.flac")), None);
        assert_eq!(OutputFormat::Wav.extension(), "wav");
    }

    // ===========================================
    // Assembler tests
    // ===========================================

    #[test]
    fn test_assemble_natural_inserts_gaps() {
        let temp_dir = TempDir::new().unwrap();
        let paths: Vec<PathBuf> = [2.0, 1.5, 3.0]
            .iter()
            .enumerate()
            .map(|(i, seconds)| {
                let path = temp_dir.path().join(format!("seg_{i}.wav"));
                write_tone(&path, *seconds, RATE);
                path
            })
            .collect();
        let output = temp_dir.path().join("natural.wav");

        let duration = Assembler::default()
            .assemble_natural(&paths, &output, OutputFormat::Wav, DEFAULT_GAP_MS)
            .unwrap();

        assert!(approx(duration, 7.1));
        assert!(approx(probe_duration(&output).unwrap(), 7.1));
    }

    #[test]
    fn test_assemble_natural_skips_missing_and_broken() {
        let temp_dir = TempDir::new().unwrap();
        let good = temp_dir.path().join("good.wav");
        let broken = temp_dir.path().join("broken.wav");
        write_tone(&good, 1.0, RATE);
        std::fs::write(&broken, b"RIFF nonsense").unwrap();
        let paths = vec![
            temp_dir.path().join("missing.wav"),
            good.clone(),
            broken,
            good,
        ];
        let output = temp_dir.path().join("natural.wav");

        let duration = Assembler::default()
            .assemble_natural(&paths, &output, OutputFormat::Wav, 500)
            .unwrap();

        // Every path after the first gets a gap, loaded or not
        assert!(approx(duration, 3.0));
        let track = AudioClip::decode(&output).unwrap();
        assert!(track.samples()[..8_000].iter().all(|s| *s == 0.0));
    }

    #[test]
    fn test_assemble_timed_places_segments() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("seg.wav");
        write_tone(&path, 2.0, RATE);
        let output = temp_dir.path().join("timed.wav");
        let segments = vec![Segment::new(4.0, 6.0, "hello")];

        let duration = Assembler::default()
            .assemble_timed(&segments, &[path], 10.0, &output, OutputFormat::Wav)
            .unwrap();

        assert!(approx(duration, 10.0));

        let track = AudioClip::decode(&output).unwrap();
        assert_eq!(track.samples().len(), 160_000);
        let samples = track.samples();
        assert!(samples[..64_000].iter().all(|s| *s == 0.0));
        assert!(samples[64_000..96_000].iter().any(|s| *s != 0.0));
        assert!(samples[96_000..].iter().all(|s| *s == 0.0));
    }

    #[test]
    fn test_assemble_timed_tolerates_missing_audio() {
        let temp_dir = TempDir::new().unwrap();
        let present = temp_dir.path().join("present.wav");
        write_tone(&present, 1.0, RATE);
        let output = temp_dir.path().join("timed.wav");
        let segments = vec![Segment::new(0.0, 1.0, "a"), Segment::new(2.0, 3.0, "b")];
        let paths = vec![temp_dir.path().join("absent.wav"), present];

        let duration = Assembler::default()
            .assemble_timed(&segments, &paths, 4.0, &output, OutputFormat::Wav)
            .unwrap();

        assert!(approx(duration, 4.0));
        let track = AudioClip::decode(&output).unwrap();
        assert!(track.samples()[..32_000].iter().all(|s| *s == 0.0));
        assert!(track.samples()[32_000..48_000].iter().any(|s| *s != 0.0));
    }

    #[test]
    fn test_assemble_timed_without_audio_is_silence() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("timed.wav");

        let duration = Assembler::default()
            .assemble_timed(&[], &[], 3.0, &output, OutputFormat::Wav)
            .unwrap();

        assert!(approx(duration, 3.0));
        let track = AudioClip::decode(&output).unwrap();
        assert_eq!(track.sample_rate(), FALLBACK_SAMPLE_RATE);
    }

    #[test]
    fn test_concat_chunks() {
        let temp_dir = TempDir::new().unwrap();
        let first = temp_dir.path().join("c00.wav");
        let second = temp_dir.path().join("c01.wav");
        write_tone(&first, 0.75, RATE);
        write_tone(&second, 1.25, RATE);
        let output = temp_dir.path().join("joined.wav");

        let duration = Assembler::default()
            .concat(&[first, second], &output)
            .unwrap();

        assert!(approx(duration, 2.0));
        assert!(approx(probe_duration(&output).unwrap(), 2.0));
    }

    // ===========================================
    // Transcoder tests
    // ===========================================

    #[test]
    fn test_transcoder_missing_binary() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("in.wav");
        write_tone(&input, 0.5, RATE);
        let transcoder = Transcoder::with_program("/nonexistent/ffmpeg");

        let chain = TempoChain::from_ratio(1.5).unwrap();
        let result = transcoder.apply_tempo(&input, &chain, &temp_dir.path().join("out.wav"));

        assert!(matches!(result.unwrap_err(), AudioError::Transcoder(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_transcoder_timeout_kills_process() {
        use std::time::{Duration, Instant};

        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("in.wav");
        let output = temp_dir.path().join("out.mp3");
        write_tone(&input, 0.5, RATE);
        let program = fake_ffmpeg(temp_dir.path(), "sleep 5");
        let transcoder =
            Transcoder::with_program(program).with_timeout(Duration::from_millis(300));

        let started = Instant::now();
        let result = transcoder.encode_mp3(&input, &output);
        let elapsed = started.elapsed();

        let err = result.unwrap_err();
        assert!(matches!(err, AudioError::Timeout(t) if t == Duration::from_millis(300)));
        assert_eq!(err.to_string(), "Transcoder timed out after 300ms");
        assert!(elapsed < Duration::from_millis(1500), "took {elapsed:?}");
        assert!(!output.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_transcoder_writes_to_last_argument() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("in.wav");
        let stretched = temp_dir.path().join("stretched.wav");
        write_tone(&input, 0.5, RATE);
        let program = fake_ffmpeg(
            temp_dir.path(),
            r#"for last; do :; done; cp "$6" "$last""#,
        );

        let chain = TempoChain::from_ratio(1.5).unwrap();
        Transcoder::with_program(program)
            .apply_tempo(&input, &chain, &stretched)
            .unwrap();

        assert!(approx(probe_duration(&stretched).unwrap(), 0.5));
    }

    #[test]
    fn test_mp3_export_without_transcoder_fails() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("out.mp3");
        let assembler = Assembler::new(Transcoder::with_program("/nonexistent/ffmpeg"));

        let result = assembler.export(&AudioClip::silent(0.1, RATE), &output, OutputFormat::Mp3);
        assert!(result.is_err());
        assert!(!output.exists());
    }
}
