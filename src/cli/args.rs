//! CLI argument definitions and parsing.

use clap::{Parser, Subcommand, ValueEnum};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::audio::OutputFormat;
use crate::timing::SpeedRange;

/// Convert timestamped transcripts into synthesized speech.
#[derive(Parser, Debug)]
#[command(name = "transcript-tts")]
#[command(about = "Convert timestamped transcripts into synthesized speech")]
#[command(version)]
pub struct Args {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Convert a transcript file to audio
    Convert(ConvertArgs),

    /// List the voices a provider offers
    Voices(VoicesArgs),
}

#[derive(clap::Args, Debug)]
pub struct ConvertArgs {
    /// Transcript markdown file
    pub input: PathBuf,

    /// TTS provider
    #[arg(short, long, value_enum, default_value = "elevenlabs")]
    pub provider: Provider,

    /// Output audio file (default: <input>_tts.<format>)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Timing mode: keep original timestamps or speak naturally
    #[arg(long, value_enum, default_value = "timed")]
    pub mode: Mode,

    /// Model override
    #[arg(short, long)]
    pub model: Option<String>,

    /// Voice for every speaker
    #[arg(long)]
    pub voice: Option<String>,

    /// Voice id for every speaker (alias of --voice, takes precedence)
    #[arg(long)]
    pub voice_id: Option<String>,

    /// Per-speaker voice: SPEAKER=VOICE (repeatable)
    #[arg(long = "speaker-voice", value_name = "SPEAKER=VOICE")]
    pub speaker_voices: Vec<String>,

    /// Only synthesize these speakers (repeatable)
    #[arg(long = "speaker", value_name = "SPEAKER")]
    pub speakers: Vec<String>,

    /// Output audio format
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Allowed speed range in timed mode: "min,max"
    #[arg(long, default_value = "0.75,1.4")]
    pub speed_range: SpeedRange,

    /// API key (overrides environment and config file)
    #[arg(long)]
    pub api_key: Option<String>,

    /// Config file (default: ~/.ttscli.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// ElevenLabs voice stability (0.0 to 1.0)
    #[arg(long)]
    pub stability: Option<f64>,

    /// MiniMax group id
    #[arg(long)]
    pub minimax_group_id: Option<String>,
}

impl ConvertArgs {
    /// Output format: explicit flag, else the output extension, else mp3.
    pub fn output_format(&self) -> OutputFormat {
        self.format
            .or_else(|| self.output.as_deref().and_then(OutputFormat::from_path))
            .unwrap_or_default()
    }

    /// Output path: explicit flag, else `<input stem>_tts.<ext>` next to the input.
    pub fn output_path(&self) -> PathBuf {
        match &self.output {
            Some(path) => path.clone(),
            None => default_output_path(&self.input, self.output_format()),
        }
    }

    /// The global voice override, `--voice-id` winning over `--voice`.
    pub fn global_voice(&self) -> Option<String> {
        self.voice_id.clone().or_else(|| self.voice.clone())
    }
}

#[derive(clap::Args, Debug)]
pub struct VoicesArgs {
    /// TTS provider
    #[arg(short, long, value_enum, default_value = "elevenlabs")]
    pub provider: Provider,

    /// API key (overrides environment and config file)
    #[arg(long)]
    pub api_key: Option<String>,

    /// Config file (default: ~/.ttscli.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// MiniMax group id
    #[arg(long)]
    pub minimax_group_id: Option<String>,
}

/// TTS provider selection.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Provider {
    /// ElevenLabs (no native speed control)
    #[default]
    #[value(name = "elevenlabs")]
    ElevenLabs,

    /// Google Gemini (wav output)
    #[value(name = "gemini")]
    Gemini,

    /// MiniMax (native speed 0.5 to 2.0)
    #[value(name = "minimax")]
    MiniMax,
}

impl Provider {
    /// Returns the CLI argument string for this provider.
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::ElevenLabs => "elevenlabs",
            Provider::Gemini => "gemini",
            Provider::MiniMax => "minimax",
        }
    }

    /// Environment variable holding the API key.
    pub fn env_key(&self) -> &'static str {
        match self {
            Provider::ElevenLabs => "ELEVENLABS_API_KEY",
            Provider::Gemini => "GEMINI_API_KEY",
            Provider::MiniMax => "MINIMAX_API_KEY",
        }
    }

    /// Built-in voice for a gender tag.
    pub fn gender_voice(&self, gender: &str) -> Option<&'static str> {
        let male = gender.eq_ignore_ascii_case("male");
        let female = gender.eq_ignore_ascii_case("female");

        match (self, male, female) {
            (Provider::ElevenLabs, true, _) => Some("ErXwobaYiN019PkySvjV"),
            (Provider::ElevenLabs, _, true) => Some("21m00Tcm4TlvDq8ikWAM"),
            (Provider::Gemini, true, _) => Some("Charon"),
            (Provider::Gemini, _, true) => Some("Kore"),
            (Provider::MiniMax, true, _) => Some("male-qn-qingse"),
            (Provider::MiniMax, _, true) => Some("female-shaonv"),
            _ => None,
        }
    }

    /// Returns the human-readable name of the provider.
    pub fn name(&self) -> &'static str {
        match self {
            Provider::ElevenLabs => "ElevenLabs",
            Provider::Gemini => "Gemini",
            Provider::MiniMax => "MiniMax",
        }
    }
}

/// Timing mode selection.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    /// Fit each segment into its original time window
    #[default]
    Timed,

    /// Concatenate segments with short pauses
    Natural,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Timed => "timed",
            Mode::Natural => "natural",
        }
    }
}

/// Errors that can occur when parsing a speaker voice mapping.
#[derive(Error, Debug, PartialEq)]
pub enum SpeakerVoiceError {
    #[error("Invalid speaker voice: {0}. Expected 'SPEAKER=VOICE'")]
    InvalidFormat(String),
}

/// Parse `SPEAKER=VOICE` pairs into a map. Later pairs win.
///
/// # Examples
/// ```
/// use transcript_tts::cli::parse_speaker_voices;
/// let map = parse_speaker_voices(&["speaker_0=Kore".to_string()]).unwrap();
/// assert_eq!(map["speaker_0"], "Kore");
/// ```
pub fn parse_speaker_voices(
    pairs: &[String],
) -> Result<HashMap<String, String>, SpeakerVoiceError> {
    pairs
        .iter()
        .map(|pair| {
            let (speaker, voice) = pair
                .split_once('=')
                .ok_or_else(|| SpeakerVoiceError::InvalidFormat(pair.clone()))?;
            let (speaker, voice) = (speaker.trim(), voice.trim());

            if speaker.is_empty() || voice.is_empty() {
                return Err(SpeakerVoiceError::InvalidFormat(pair.clone()));
            }

            Ok((speaker.to_string(), voice.to_string()))
        })
        .collect()
}

/// `<stem>_tts.<ext>` beside the input file.
pub fn default_output_path(input: &Path, format: OutputFormat) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "transcript".to_string());

    input.with_file_name(format!("{stem}_tts.{}", format.extension()))
}
