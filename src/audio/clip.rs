//! In-memory mono audio and file decoding.

use std::fs::File;
use std::path::Path;

use dasp::interpolate::linear::Linear;
use dasp::{Signal, signal};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{CODEC_TYPE_NULL, DecoderOptions};
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use super::AudioError;

/// Mono PCM audio with samples in `[-1.0, 1.0]`.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioClip {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl AudioClip {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// A clip with no samples.
    pub fn empty(sample_rate: u32) -> Self {
        Self::new(Vec::new(), sample_rate)
    }

    /// `seconds` of silence.
    pub fn silent(seconds: f64, sample_rate: u32) -> Self {
        let len = seconds_to_samples(seconds, sample_rate);
        Self::new(vec![0.0; len], sample_rate)
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Length in seconds.
    pub fn duration(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Append `other` to the end of this clip.
    pub fn append(&mut self, other: &AudioClip) {
        let other = other.resampled(self.sample_rate);
        self.samples.extend_from_slice(&other.samples);
    }

    /// Append `milliseconds` of silence.
    pub fn append_silence(&mut self, milliseconds: u32) {
        let len = seconds_to_samples(f64::from(milliseconds) / 1000.0, self.sample_rate);
        self.samples.resize(self.samples.len() + len, 0.0);
    }

    /// Mix `other` into this clip starting at `position` seconds.
    ///
    /// The clip keeps its length; audio past the end is dropped.
    pub fn overlay(&mut self, other: &AudioClip, position: f64) {
        let other = other.resampled(self.sample_rate);
        let offset = seconds_to_samples(position, self.sample_rate);

        for (dst, src) in self
            .samples
            .iter_mut()
            .skip(offset)
            .zip(other.samples.iter())
        {
            *dst = (*dst + *src).clamp(-1.0, 1.0);
        }
    }

    /// Convert to `sample_rate` with linear interpolation.
    pub fn resampled(&self, sample_rate: u32) -> AudioClip {
        if sample_rate == self.sample_rate || self.samples.is_empty() {
            return AudioClip::new(self.samples.clone(), sample_rate);
        }

        let target_len = (self.samples.len() as f64 * f64::from(sample_rate)
            / f64::from(self.sample_rate))
        .round() as usize;

        let mut source = signal::from_iter(self.samples.iter().copied());
        let left = source.next();
        let right = source.next();
        let converter = source.from_hz_to_hz(
            Linear::new(left, right),
            f64::from(self.sample_rate),
            f64::from(sample_rate),
        );

        AudioClip::new(converter.take(target_len).collect(), sample_rate)
    }

    /// Decode an audio file, mixing multi-channel audio down to mono.
    ///
    /// WAV goes through `hound`; everything else through symphonia's probe.
    pub fn decode(path: &Path) -> Result<Self, AudioError> {
        if !path.exists() {
            return Err(AudioError::FileNotFound(path.display().to_string()));
        }

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("")
            .to_lowercase();

        if extension == "wav" {
            decode_wav(path)
        } else {
            decode_compressed(path, &extension)
        }
    }

    /// Write a 16-bit mono WAV file.
    pub fn write_wav(&self, path: &Path) -> Result<(), AudioError> {
        let spec = WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };

        let mut writer = WavWriter::create(path, spec)?;
        for sample in &self.samples {
            let value = (sample.clamp(-1.0, 1.0) * f32::from(i16::MAX)).round() as i16;
            writer.write_sample(value)?;
        }
        writer.finalize()?;

        Ok(())
    }
}

fn seconds_to_samples(seconds: f64, sample_rate: u32) -> usize {
    (seconds.max(0.0) * f64::from(sample_rate)).round() as usize
}

fn decode_wav(path: &Path) -> Result<AudioClip, AudioError> {
    let mut reader = WavReader::open(path)?;
    let spec = reader.spec();
    let channels = usize::from(spec.channels.max(1));

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader.samples::<f32>().collect::<Result<_, _>>()?,
        SampleFormat::Int => {
            let scale = (1_i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<_, _>>()?
        }
    };

    Ok(AudioClip::new(downmix(&interleaved, channels), spec.sample_rate))
}

fn decode_compressed(path: &Path, extension: &str) -> Result<AudioClip, AudioError> {
    let file = File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if !extension.is_empty() {
        hint.with_extension(extension);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| AudioError::Decode(format!("{}: {e}", path.display())))?;

    let mut format = probed.format;
    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| AudioError::Decode(format!("{}: no audio track", path.display())))?;

    let track_id = track.id;
    let mut sample_rate = track.codec_params.sample_rate;
    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| AudioError::Decode(format!("{}: {e}", path.display())))?;

    let mut samples = Vec::new();
    while let Ok(packet) = format.next_packet() {
        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                sample_rate.get_or_insert(spec.rate);

                let mut buffer = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
                buffer.copy_interleaved_ref(decoded);
                samples.extend(downmix(buffer.samples(), spec.channels.count()));
            }
            Err(e) => {
                log::debug!("Skipping undecodable packet in {}: {e}", path.display());
            }
        }
    }

    let sample_rate = sample_rate
        .ok_or_else(|| AudioError::Decode(format!("{}: unknown sample rate", path.display())))?;

    Ok(AudioClip::new(samples, sample_rate))
}

fn downmix(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }

    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}
