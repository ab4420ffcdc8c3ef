//! transcript-tts: convert timestamped transcripts into synthesized speech.
//!
//! Segments are synthesized one at a time through a pluggable backend
//! (ElevenLabs, Gemini or MiniMax), fitted to their original time windows,
//! and assembled into a single mp3 or wav track.

pub mod audio;
pub mod backend;
pub mod cli;
pub mod config;
pub mod engine;
pub mod timing;
pub mod transcript;
pub mod voice;
