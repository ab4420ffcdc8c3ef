//! Voice selection for transcript segments.
//!
//! Each segment's voice comes from the first precedence level that has one,
//! and the level is reported alongside the voice id.

mod resolver;

pub use resolver::{FALLBACK_VOICE, ResolvedVoice, VoiceResolver, VoiceSource};
