//! Speech synthesis backends.
//!
//! Each vendor (ElevenLabs, Gemini, MiniMax) is one type implementing
//! [`Backend`]. The pipeline only sees the trait and the [`Capabilities`]
//! it reports, which keeps vendor clients swappable for mocks in tests.

mod client;
mod elevenlabs;
mod gemini;
mod minimax;
mod types;

pub use client::{REQUEST_TIMEOUT, check_status, http_client};
pub use elevenlabs::ElevenLabsBackend;
pub use gemini::{GeminiBackend, parse_sample_rate};
pub use minimax::{MiniMaxBackend, decode_audio};
pub use types::{BackendError, BackendSettings, Capabilities, SynthesizeRequest, VoiceInfo};

use std::path::Path;

use crate::cli::Provider;

/// Trait for TTS backend communication.
#[cfg_attr(test, mockall::automock)]
pub trait Backend: Send + Sync {
    /// What this backend supports (speed control, chunk size, output format).
    fn capabilities(&self) -> Capabilities;

    /// Synthesize speech into `output`.
    ///
    /// # Returns
    /// Duration of the written audio in seconds
    fn synthesize(&self, request: &SynthesizeRequest, output: &Path) -> Result<f64, BackendError>;

    /// List the voices the backend offers.
    fn list_voices(&self) -> Result<Vec<VoiceInfo>, BackendError>;
}

impl<B: Backend + ?Sized> Backend for Box<B> {
    fn capabilities(&self) -> Capabilities {
        (**self).capabilities()
    }

    fn synthesize(&self, request: &SynthesizeRequest, output: &Path) -> Result<f64, BackendError> {
        (**self).synthesize(request, output)
    }

    fn list_voices(&self) -> Result<Vec<VoiceInfo>, BackendError> {
        (**self).list_voices()
    }
}

/// Create a backend for the specified provider.
///
/// Fails before any request is made when the credential or a required
/// vendor setting is missing.
pub fn create_backend(
    provider: Provider,
    settings: BackendSettings,
) -> Result<Box<dyn Backend>, BackendError> {
    let api_key = settings
        .api_key
        .filter(|k| !k.is_empty())
        .ok_or(BackendError::MissingCredential {
            provider: provider.as_str(),
            env_var: provider.env_key(),
        })?;

    log::debug!("Creating {} backend", provider.as_str());

    Ok(match provider {
        Provider::ElevenLabs => Box::new(ElevenLabsBackend::new(
            api_key,
            settings.model,
            settings.stability,
        )?),
        Provider::Gemini => Box::new(GeminiBackend::new(api_key, settings.model)?),
        Provider::MiniMax => Box::new(MiniMaxBackend::new(
            api_key,
            settings.group_id,
            settings.model,
        )?),
    })
}
