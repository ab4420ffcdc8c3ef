//! Backend request/response types.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::audio::AudioError;
use crate::timing::SpeedRange;

/// Errors that can occur when talking to a synthesis backend.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("No API key for {provider}. Pass --api-key, set {env_var}, or add api_key to the config file")]
    MissingCredential {
        provider: &'static str,
        env_var: &'static str,
    },

    #[error("Missing setting: {0}")]
    MissingSetting(String),

    #[error("Audio error: {0}")]
    Audio(#[from] AudioError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// What a backend can do, used by the pipeline to plan each segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Capabilities {
    /// Whether the backend honours the requested speed natively.
    pub supports_speed: bool,
    /// Speeds the backend accepts.
    pub speed_range: SpeedRange,
    /// Longest text accepted by a single synthesis call, in characters.
    pub max_chunk_chars: usize,
    /// Extension of the audio files the backend writes.
    pub audio_extension: &'static str,
}

impl Capabilities {
    /// Capabilities of a backend without native speed control.
    pub fn new(max_chunk_chars: usize, audio_extension: &'static str) -> Self {
        Self {
            supports_speed: false,
            speed_range: SpeedRange {
                min: 0.25,
                max: 4.0,
            },
            max_chunk_chars,
            audio_extension,
        }
    }

    /// Mark the backend as honouring speed within `range`.
    pub fn with_native_speed(mut self, range: SpeedRange) -> Self {
        self.supports_speed = true;
        self.speed_range = range;
        self
    }
}

/// A voice offered by a backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceInfo {
    /// Identifier passed back in synthesis requests.
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl VoiceInfo {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl fmt::Display for VoiceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{}  ({name})", self.id),
            None => write!(f, "{}", self.id),
        }
    }
}

/// Request for speech synthesis.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesizeRequest {
    pub text: String,
    pub voice: String,
    pub speed: f64,
}

impl SynthesizeRequest {
    /// Create a new synthesis request at normal speed.
    pub fn new(text: impl Into<String>, voice: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            voice: voice.into(),
            speed: 1.0,
        }
    }

    /// Set the speech speed.
    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }
}

/// Settings a backend is constructed with.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BackendSettings {
    pub api_key: Option<String>,
    /// Model override; each backend has its own default.
    pub model: Option<String>,
    /// MiniMax group identifier.
    pub group_id: Option<String>,
    /// ElevenLabs voice stability (0.0 to 1.0).
    pub stability: Option<f64>,
}
