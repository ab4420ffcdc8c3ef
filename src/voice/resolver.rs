//! Per-segment voice resolution.

use std::cell::OnceCell;
use std::collections::HashMap;
use std::fmt;

use crate::backend::Backend;
use crate::cli::Provider;
use crate::transcript::Segment;

/// Voice used when nothing else applies.
pub const FALLBACK_VOICE: &str = "default";

/// Which precedence level supplied a voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceSource {
    /// Explicit speaker→voice mapping.
    Speaker,
    /// `--voice`, `--voice-id` or the configured default voice.
    Global,
    /// Configured or built-in voice for the segment's gender tag.
    Gender,
    /// First voice listed by the backend.
    BackendList,
    /// Literal fallback.
    Fallback,
}

impl VoiceSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoiceSource::Speaker => "speaker mapping",
            VoiceSource::Global => "global voice",
            VoiceSource::Gender => "gender default",
            VoiceSource::BackendList => "backend voice list",
            VoiceSource::Fallback => "fallback",
        }
    }
}

impl fmt::Display for VoiceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved voice and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedVoice {
    pub id: String,
    pub source: VoiceSource,
}

impl ResolvedVoice {
    fn new(id: impl Into<String>, source: VoiceSource) -> Self {
        Self {
            id: id.into(),
            source,
        }
    }
}

/// Resolves the voice for each segment.
///
/// Precedence: speaker mapping, global voice, gender voice (configured, then
/// the provider's built-in), first backend voice, then [`FALLBACK_VOICE`].
/// The backend list is fetched at most once and only when a segment needs it.
#[derive(Debug)]
pub struct VoiceResolver {
    provider: Provider,
    speaker_voices: HashMap<String, String>,
    global_voice: Option<String>,
    gender_voices: HashMap<String, String>,
    listed: OnceCell<Option<String>>,
}

impl VoiceResolver {
    /// Create a resolver with no overrides.
    pub fn new(provider: Provider) -> Self {
        Self {
            provider,
            speaker_voices: HashMap::new(),
            global_voice: None,
            gender_voices: HashMap::new(),
            listed: OnceCell::new(),
        }
    }

    pub fn with_speaker_voices(mut self, speaker_voices: HashMap<String, String>) -> Self {
        self.speaker_voices = speaker_voices;
        self
    }

    pub fn with_global_voice(mut self, voice: Option<String>) -> Self {
        self.global_voice = voice.filter(|v| !v.is_empty());
        self
    }

    /// Override the built-in voice for a gender tag.
    pub fn with_gender_voice(mut self, gender: &str, voice: impl Into<String>) -> Self {
        self.gender_voices
            .insert(gender.to_lowercase(), voice.into());
        self
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    /// Resolve the voice for `segment`.
    pub fn resolve<B: Backend + ?Sized>(&self, segment: &Segment, backend: &B) -> ResolvedVoice {
        let resolved = self
            .explicit(segment)
            .or_else(|| self.first_listed(backend))
            .unwrap_or_else(|| ResolvedVoice::new(FALLBACK_VOICE, VoiceSource::Fallback));

        log::debug!(
            "[{}] voice {} from {}",
            segment.label(),
            resolved.id,
            resolved.source
        );
        resolved
    }

    /// Voice from the levels that need no backend call.
    fn explicit(&self, segment: &Segment) -> Option<ResolvedVoice> {
        if let Some(voice) = segment
            .speaker
            .as_deref()
            .and_then(|speaker| self.speaker_voices.get(speaker))
        {
            return Some(ResolvedVoice::new(voice, VoiceSource::Speaker));
        }

        if let Some(voice) = &self.global_voice {
            return Some(ResolvedVoice::new(voice, VoiceSource::Global));
        }

        let gender = segment.gender.as_deref()?.to_lowercase();
        self.gender_voices
            .get(&gender)
            .cloned()
            .or_else(|| self.provider.gender_voice(&gender).map(str::to_string))
            .map(|voice| ResolvedVoice::new(voice, VoiceSource::Gender))
    }

    fn first_listed<B: Backend + ?Sized>(&self, backend: &B) -> Option<ResolvedVoice> {
        self.listed
            .get_or_init(|| match backend.list_voices() {
                Ok(voices) => voices.into_iter().next().map(|v| v.id),
                Err(e) => {
                    log::warn!("Could not list {} voices: {e}", self.provider.as_str());
                    None
                }
            })
            .as_ref()
            .map(|voice| ResolvedVoice::new(voice, VoiceSource::BackendList))
    }
}
