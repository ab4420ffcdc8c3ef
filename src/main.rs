//! transcript-tts CLI entry point.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use transcript_tts::backend::create_backend;
use transcript_tts::cli::{Args, Command, ConvertArgs, VoicesArgs, parse_speaker_voices};
use transcript_tts::config::Config;
use transcript_tts::engine::{Pipeline, PipelineOptions, SegmentState};
use transcript_tts::timing::estimate_chars_per_sec;
use transcript_tts::transcript::{format_duration, parse_file};
use transcript_tts::voice::VoiceResolver;

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    match args.command {
        Command::Convert(convert_args) => convert(convert_args),
        Command::Voices(voices_args) => list_voices(voices_args),
    }
}

fn convert(args: ConvertArgs) -> Result<()> {
    let provider = args.provider;
    let config = Config::load(args.config.as_deref()).context("Failed to load config")?;

    let mut settings = config.backend_settings(
        provider,
        args.api_key.as_deref(),
        args.minimax_group_id.as_deref(),
    );
    if args.model.is_some() {
        settings.model = args.model.clone();
    }
    settings.stability = args.stability;

    let backend = create_backend(provider, settings)
        .with_context(|| format!("Failed to set up {} backend", provider.name()))?;

    let speaker_voices = parse_speaker_voices(&args.speaker_voices)?;
    let mut voices = VoiceResolver::new(provider)
        .with_speaker_voices(config.speaker_voices(speaker_voices))
        .with_global_voice(
            args.global_voice()
                .or_else(|| config.default_voice(provider)),
        );
    for gender in ["male", "female"] {
        if let Some(voice) = config.gender_voice(provider, gender) {
            voices = voices.with_gender_voice(gender, voice);
        }
    }

    let transcript = parse_file(&args.input)
        .with_context(|| format!("Failed to read transcript {}", args.input.display()))?;
    let segments = transcript.filter_speakers(&args.speakers);

    let output = args.output_path();
    let format = args.output_format();
    let options = PipelineOptions {
        mode: args.mode,
        speed_range: args.speed_range,
        chars_per_sec: estimate_chars_per_sec(transcript.language()),
        ..Default::default()
    };

    eprintln!(
        "\ntranscript-tts ▶ {} → {}  ({} segments, {}, {} mode)",
        file_name(&args.input),
        file_name(&output),
        segments.len(),
        provider.as_str(),
        args.mode.as_str()
    );

    let progress = ProgressBar::new(segments.len() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
            .context("Invalid progress template")?
            .progress_chars("=> "),
    );

    let pipeline = Pipeline::new(backend, voices, options).with_progress(progress);
    let report = pipeline
        .run(&segments, transcript.total_duration(), &output, format)
        .context("Conversion failed")?;

    let skipped = report.count(SegmentState::Skipped) + report.count(SegmentState::Failed);
    if skipped > 0 {
        eprintln!(
            "{skipped} of {} segments left out ({} warnings)",
            report.jobs.len(),
            report.warnings.len()
        );
    }
    eprintln!(
        "✓ Output: {} ({})",
        output.display(),
        format_duration(report.duration)
    );

    Ok(())
}

fn list_voices(args: VoicesArgs) -> Result<()> {
    let provider = args.provider;
    let config = Config::load(args.config.as_deref()).context("Failed to load config")?;
    let settings = config.backend_settings(
        provider,
        args.api_key.as_deref(),
        args.minimax_group_id.as_deref(),
    );

    let backend = create_backend(provider, settings)
        .with_context(|| format!("Failed to set up {} backend", provider.name()))?;
    let voices = backend.list_voices().context("Failed to list voices")?;

    if voices.is_empty() {
        eprintln!("No voices returned for {}.", provider.as_str());
        return Ok(());
    }

    eprintln!("\n{} voices ({}):\n", provider.as_str(), voices.len());
    for voice in voices {
        println!("{voice}");
    }

    Ok(())
}

fn file_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
