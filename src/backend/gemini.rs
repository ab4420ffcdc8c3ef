//! Google Gemini text-to-speech backend.
//!
//! Gemini answers with raw 16-bit PCM, which is written out as WAV.

use std::path::Path;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use reqwest::blocking::Client;
use serde::Deserialize;

use crate::audio::AudioClip;

use super::Backend;
use super::client::{check_status, http_client};
use super::types::{BackendError, Capabilities, SynthesizeRequest, VoiceInfo};

const BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-preview-tts";
const MAX_CHUNK_CHARS: usize = 30_000;
const DEFAULT_SAMPLE_RATE: u32 = 24_000;

/// Prebuilt Gemini voices.
pub const VOICES: [&str; 5] = ["Aoede", "Charon", "Fenrir", "Kore", "Puck"];

/// Gemini backend. Ignores the speed parameter.
pub struct GeminiBackend {
    base_url: String,
    api_key: String,
    model: String,
    client: Client,
}

impl GeminiBackend {
    /// Create a new Gemini backend.
    pub fn new(api_key: String, model: Option<String>) -> Result<Self, BackendError> {
        Ok(Self {
            base_url: BASE_URL.to_string(),
            api_key,
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            client: http_client()?,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    inline_data: Option<InlineData>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: Option<String>,
    data: String,
}

impl Backend for GeminiBackend {
    fn capabilities(&self) -> Capabilities {
        Capabilities::new(MAX_CHUNK_CHARS, "wav")
    }

    fn synthesize(&self, request: &SynthesizeRequest, output: &Path) -> Result<f64, BackendError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );
        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": request.text }] }],
            "generationConfig": {
                "responseModalities": ["AUDIO"],
                "speechConfig": {
                    "voiceConfig": {
                        "prebuiltVoiceConfig": { "voiceName": request.voice }
                    }
                }
            }
        });

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .map_err(|e| BackendError::ConnectionFailed(e.to_string()))?;
        let response = check_status(response, "Synthesis")?;

        let generated: GenerateResponse = response
            .json()
            .map_err(|e| BackendError::InvalidResponse(e.to_string()))?;
        let (pcm, sample_rate) = collect_pcm(generated)?;

        if pcm.is_empty() {
            let preview: String = request.text.chars().take(50).collect();
            return Err(BackendError::InvalidResponse(format!(
                "Gemini returned no audio for text: {preview:?}"
            )));
        }

        let clip = AudioClip::new(pcm_to_samples(&pcm), sample_rate);
        clip.write_wav(output)?;

        Ok(clip.duration())
    }

    fn list_voices(&self) -> Result<Vec<VoiceInfo>, BackendError> {
        Ok(VOICES.iter().map(|v| VoiceInfo::new(*v)).collect())
    }
}

fn collect_pcm(response: GenerateResponse) -> Result<(Vec<u8>, u32), BackendError> {
    let mut pcm = Vec::new();
    let mut sample_rate = DEFAULT_SAMPLE_RATE;

    let parts = response
        .candidates
        .into_iter()
        .filter_map(|c| c.content)
        .flat_map(|c| c.parts);

    for data in parts.filter_map(|p| p.inline_data) {
        let bytes = STANDARD
            .decode(data.data.as_bytes())
            .map_err(|e| BackendError::InvalidResponse(format!("bad audio payload: {e}")))?;
        pcm.extend_from_slice(&bytes);

        if let Some(mime) = data.mime_type {
            sample_rate = parse_sample_rate(&mime);
        }
    }

    Ok((pcm, sample_rate))
}

/// Sample rate from a mime type such as `audio/L16;codec=pcm;rate=24000`.
pub fn parse_sample_rate(mime_type: &str) -> u32 {
    mime_type
        .split(';')
        .filter_map(|param| param.trim().strip_prefix("rate="))
        .find_map(|rate| rate.trim().parse().ok())
        .unwrap_or(DEFAULT_SAMPLE_RATE)
}

/// Little-endian signed 16-bit PCM to float samples.
fn pcm_to_samples(pcm: &[u8]) -> Vec<f32> {
    pcm.chunks_exact(2)
        .map(|b| f32::from(i16::from_le_bytes([b[0], b[1]])) / 32768.0)
        .collect()
}
