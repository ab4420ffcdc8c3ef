//! CLI argument parsing and validation.

mod args;

pub use args::{
    Args, Command, ConvertArgs, Mode, Provider, SpeakerVoiceError, VoicesArgs,
    default_output_path, parse_speaker_voices,
};
