//! ElevenLabs text-to-speech backend.

use std::path::Path;

use reqwest::blocking::Client;
use serde::Deserialize;

use crate::audio::probe_duration;

use super::Backend;
use super::client::{check_status, http_client};
use super::types::{BackendError, Capabilities, SynthesizeRequest, VoiceInfo};

const BASE_URL: &str = "https://api.elevenlabs.io";
pub const DEFAULT_MODEL: &str = "eleven_multilingual_v2";
const OUTPUT_FORMAT: &str = "mp3_44100_128";
const MAX_CHUNK_CHARS: usize = 2500;

/// ElevenLabs backend. Ignores the speed parameter.
pub struct ElevenLabsBackend {
    base_url: String,
    api_key: String,
    model: String,
    stability: f64,
    similarity_boost: f64,
    client: Client,
}

impl ElevenLabsBackend {
    /// Create a new ElevenLabs backend.
    pub fn new(
        api_key: String,
        model: Option<String>,
        stability: Option<f64>,
    ) -> Result<Self, BackendError> {
        Ok(Self {
            base_url: BASE_URL.to_string(),
            api_key,
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            stability: stability.unwrap_or(0.5),
            similarity_boost: 0.75,
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
struct VoicesResponse {
    #[serde(default)]
    voices: Vec<Voice>,
}

#[derive(Deserialize)]
struct Voice {
    voice_id: String,
    name: Option<String>,
}

impl Backend for ElevenLabsBackend {
    fn capabilities(&self) -> Capabilities {
        Capabilities::new(MAX_CHUNK_CHARS, "mp3")
    }

    fn synthesize(&self, request: &SynthesizeRequest, output: &Path) -> Result<f64, BackendError> {
        let url = format!("{}/v1/text-to-speech/{}", self.base_url, request.voice);
        let body = serde_json::json!({
            "text": request.text,
            "model_id": self.model,
            "voice_settings": {
                "stability": self.stability,
                "similarity_boost": self.similarity_boost,
            },
        });

        let response = self
            .client
            .post(&url)
            .query(&[("output_format", OUTPUT_FORMAT)])
            .header("xi-api-key", &self.api_key)
            .json(&body)
            .send()
            .map_err(|e| BackendError::ConnectionFailed(e.to_string()))?;
        let response = check_status(response, "Synthesis")?;

        let audio = response
            .bytes()
            .map_err(|e| BackendError::InvalidResponse(e.to_string()))?;
        std::fs::write(output, &audio)?;

        Ok(probe_duration(output)?)
    }

    fn list_voices(&self) -> Result<Vec<VoiceInfo>, BackendError> {
        let url = format!("{}/v1/voices", self.base_url);

        let response = self
            .client
            .get(&url)
            .header("xi-api-key", &self.api_key)
            .send()
            .map_err(|e| BackendError::ConnectionFailed(e.to_string()))?;
        let response = check_status(response, "Voice listing")?;

        let voices: VoicesResponse = response
            .json()
            .map_err(|e| BackendError::InvalidResponse(e.to_string()))?;

        Ok(voices
            .voices
            .into_iter()
            .map(|v| VoiceInfo {
                id: v.voice_id,
                name: v.name,
            })
            .collect())
    }
}
