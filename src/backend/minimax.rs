//! MiniMax text-to-speech backend.

use std::path::Path;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use reqwest::blocking::Client;
use serde::Deserialize;

use crate::audio::probe_duration;
use crate::timing::SpeedRange;

use super::Backend;
use super::client::{check_status, http_client};
use super::types::{BackendError, Capabilities, SynthesizeRequest, VoiceInfo};

const BASE_URL: &str = "https://api.minimax.chat";
pub const DEFAULT_MODEL: &str = "speech-01-turbo";
const MAX_CHUNK_CHARS: usize = 10_000;
const SPEED_RANGE: SpeedRange = SpeedRange { min: 0.5, max: 2.0 };

/// System voices offered by MiniMax.
pub const VOICES: [&str; 22] = [
    "male-qn-qingse",
    "male-qn-jingying",
    "male-qn-badao",
    "male-qn-daxuesheng",
    "female-shaonv",
    "female-yujie",
    "female-chengshu",
    "female-tianmei",
    "presenter_male",
    "presenter_female",
    "audiobook_male_1",
    "audiobook_male_2",
    "audiobook_female_1",
    "audiobook_female_2",
    "male-qn-qingse-jingpin",
    "male-qn-jingying-jingpin",
    "male-qn-badao-jingpin",
    "male-qn-daxuesheng-jingpin",
    "female-shaonv-jingpin",
    "female-yujie-jingpin",
    "female-chengshu-jingpin",
    "female-tianmei-jingpin",
];

/// MiniMax backend. Honours the speed parameter between 0.5 and 2.0.
pub struct MiniMaxBackend {
    base_url: String,
    api_key: String,
    group_id: String,
    model: String,
    client: Client,
}

impl MiniMaxBackend {
    /// Create a new MiniMax backend. A group id is mandatory.
    pub fn new(
        api_key: String,
        group_id: Option<String>,
        model: Option<String>,
    ) -> Result<Self, BackendError> {
        let group_id = group_id.filter(|g| !g.is_empty()).ok_or_else(|| {
            BackendError::MissingSetting(
                "MiniMax group_id is required. Set --minimax-group-id or MINIMAX_GROUP_ID"
                    .to_string(),
            )
        })?;

        Ok(Self {
            base_url: BASE_URL.to_string(),
            api_key,
            group_id,
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            client: http_client()?,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn group_id(&self) -> &str {
        &self.group_id
    }

    /// JSON payload for one synthesis call. Speed is clamped to what the
    /// service accepts.
    pub fn request_body(&self, request: &SynthesizeRequest) -> serde_json::Value {
        let speed = self.capabilities().speed_range.clamp(request.speed);
        serde_json::json!({
            "model": self.model,
            "text": request.text,
            "stream": false,
            "voice_setting": {
                "voice_id": request.voice,
                "speed": speed,
                "vol": 1.0,
                "pitch": 0,
            },
            "audio_setting": {
                "sample_rate": 32000,
                "bitrate": 128000,
                "format": "mp3",
                "channel": 1,
            },
        })
    }
}

#[derive(Deserialize)]
struct SynthesisResponse {
    data: Option<AudioData>,
    base_resp: Option<BaseResponse>,
}

#[derive(Deserialize)]
struct AudioData {
    audio: String,
}

#[derive(Deserialize)]
struct BaseResponse {
    status_code: i64,
    #[serde(default)]
    status_msg: String,
}

impl Backend for MiniMaxBackend {
    fn capabilities(&self) -> Capabilities {
        Capabilities::new(MAX_CHUNK_CHARS, "mp3").with_native_speed(SPEED_RANGE)
    }

    fn synthesize(&self, request: &SynthesizeRequest, output: &Path) -> Result<f64, BackendError> {
        let url = format!("{}/v1/t2a_v2", self.base_url);
        let body = self.request_body(request);

        let response = self
            .client
            .post(&url)
            .query(&[("GroupId", self.group_id.as_str())])
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .map_err(|e| BackendError::ConnectionFailed(e.to_string()))?;
        let response = check_status(response, "Synthesis")?;

        let parsed: SynthesisResponse = response
            .json()
            .map_err(|e| BackendError::InvalidResponse(e.to_string()))?;

        if let Some(base) = &parsed.base_resp
            && base.status_code != 0
        {
            return Err(BackendError::RequestFailed(format!(
                "MiniMax error {}: {}",
                base.status_code, base.status_msg
            )));
        }

        let audio = parsed
            .data
            .ok_or_else(|| BackendError::InvalidResponse("No audio in response".to_string()))?;
        std::fs::write(output, decode_audio(&audio.audio)?)?;

        Ok(probe_duration(output)?)
    }

    fn list_voices(&self) -> Result<Vec<VoiceInfo>, BackendError> {
        Ok(VOICES.iter().map(|v| VoiceInfo::new(*v)).collect())
    }
}

/// MiniMax sends hex-encoded audio; some deployments use base64 instead.
pub fn decode_audio(raw: &str) -> Result<Vec<u8>, BackendError> {
    hex::decode(raw)
        .or_else(|_| STANDARD.decode(raw))
        .map_err(|e| BackendError::InvalidResponse(format!("bad audio payload: {e}")))
}
