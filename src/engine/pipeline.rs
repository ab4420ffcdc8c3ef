//! Transcript-to-audio pipeline.

use std::fs;
use std::path::{Path, PathBuf};

use indicatif::ProgressBar;
use tempfile::TempDir;
use thiserror::Error;

use crate::audio::{
    Assembler, AudioError, DEFAULT_GAP_MS, OutputFormat, Transcoder, probe_duration,
};
use crate::backend::{Backend, Capabilities, SynthesizeRequest};
use crate::cli::Mode;
use crate::timing::{Clamp, DEFAULT_CHARS_PER_SEC, SpeedRange, TempoChain, chunk_text, plan_speed};
use crate::transcript::{Segment, format_clock};
use crate::voice::{FALLBACK_VOICE, ResolvedVoice, VoiceResolver};

/// Allowed gap between synthesized and target duration before time-stretching.
pub const DURATION_TOLERANCE: f64 = 0.5;

/// Errors that abort a whole run.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("No segments to process. Check the --speaker filter")]
    NoSegments,

    #[error("Scratch directory error: {0}")]
    Scratch(#[from] std::io::Error),

    #[error("Assembly failed: {0}")]
    Assembly(#[from] AudioError),
}

/// Where a segment is in its journey to the output track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentState {
    Pending,
    VoiceResolved,
    SpeedPlanned,
    Chunked,
    Synthesized,
    DurationCorrected,
    Finalized,
    Skipped,
    Failed,
}

impl SegmentState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SegmentState::Finalized | SegmentState::Skipped | SegmentState::Failed
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SegmentState::Pending => "pending",
            SegmentState::VoiceResolved => "voice resolved",
            SegmentState::SpeedPlanned => "speed planned",
            SegmentState::Chunked => "chunked",
            SegmentState::Synthesized => "synthesized",
            SegmentState::DurationCorrected => "duration corrected",
            SegmentState::Finalized => "finalized",
            SegmentState::Skipped => "skipped",
            SegmentState::Failed => "failed",
        }
    }
}

/// An audio file and its measured duration in seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioArtifact {
    pub path: PathBuf,
    pub duration: f64,
}

/// Progress of one segment through the pipeline.
#[derive(Debug, Clone)]
pub struct SegmentJob {
    pub index: usize,
    pub segment: Segment,
    pub state: SegmentState,
    pub voice: Option<ResolvedVoice>,
    /// Speed sent to the backend.
    pub speed: f64,
    pub chunks: Vec<String>,
    pub artifact: Option<AudioArtifact>,
    /// Whether a tempo correction replaced the synthesized audio.
    pub time_stretched: bool,
}

impl SegmentJob {
    pub fn new(index: usize, segment: Segment) -> Self {
        Self {
            index,
            segment,
            state: SegmentState::Pending,
            voice: None,
            speed: 1.0,
            chunks: Vec::new(),
            artifact: None,
            time_stretched: false,
        }
    }
}

/// Knobs for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOptions {
    pub mode: Mode,
    pub speed_range: SpeedRange,
    pub chars_per_sec: f64,
    /// Seconds of mismatch tolerated before time-stretching.
    pub tolerance: f64,
    /// Silence between segments in natural mode.
    pub gap_ms: u32,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            mode: Mode::Timed,
            speed_range: SpeedRange::default(),
            chars_per_sec: DEFAULT_CHARS_PER_SEC,
            tolerance: DURATION_TOLERANCE,
            gap_ms: DEFAULT_GAP_MS,
        }
    }
}

/// Outcome of a completed run.
#[derive(Debug)]
pub struct RunReport {
    pub output: PathBuf,
    /// Duration of the written output in seconds.
    pub duration: f64,
    /// Every segment in its terminal state. Artifact paths point into the
    /// run's scratch directory and no longer exist.
    pub jobs: Vec<SegmentJob>,
    /// Non-fatal problems, in the order they happened. Each is also logged
    /// at warn level.
    pub warnings: Vec<String>,
}

impl RunReport {
    pub fn count(&self, state: SegmentState) -> usize {
        self.jobs.iter().filter(|job| job.state == state).count()
    }
}

/// Directories a segment works in.
struct Scratch<'a> {
    work: &'a Path,
    stable: &'a Path,
}

/// Drives every segment through voice resolution, speed planning, chunking,
/// synthesis, duration correction and finalization, then assembles the track.
pub struct Pipeline<B: Backend> {
    backend: B,
    voices: VoiceResolver,
    options: PipelineOptions,
    transcoder: Transcoder,
    assembler: Assembler,
    scratch_root: Option<PathBuf>,
    progress: ProgressBar,
}

impl<B: Backend> Pipeline<B> {
    /// Create a new pipeline using the `ffmpeg` found on `PATH`.
    pub fn new(backend: B, voices: VoiceResolver, options: PipelineOptions) -> Self {
        Self {
            backend,
            voices,
            options,
            transcoder: Transcoder::new(),
            assembler: Assembler::default(),
            scratch_root: None,
            progress: ProgressBar::hidden(),
        }
    }

    /// Use a specific transcoder for tempo correction and mp3 export.
    pub fn with_transcoder(mut self, transcoder: Transcoder) -> Self {
        self.assembler = Assembler::new(transcoder.clone());
        self.transcoder = transcoder;
        self
    }

    /// Create run scratch space under `root` instead of the system temp dir.
    pub fn with_scratch_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.scratch_root = Some(root.into());
        self
    }

    /// Report per-segment progress on `progress`.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Convert `segments` into one audio file at `output`.
    pub fn run(
        &self,
        segments: &[Segment],
        total_duration: f64,
        output: &Path,
        format: OutputFormat,
    ) -> Result<RunReport, PipelineError> {
        if segments.is_empty() {
            return Err(PipelineError::NoSegments);
        }

        let run_dir = self.scratch_dir()?;
        let stable = run_dir.path().join("final");
        fs::create_dir(&stable)?;

        let capabilities = self.backend.capabilities();
        let mut warnings = Vec::new();
        let mut jobs = Vec::with_capacity(segments.len());

        self.progress.set_length(segments.len() as u64);

        for (index, segment) in segments.iter().enumerate() {
            let mut job = SegmentJob::new(index, segment.clone());
            self.progress.set_message(segment.label());

            let work = tempfile::Builder::new()
                .prefix(&format!("seg_{index:04}_"))
                .tempdir_in(run_dir.path())?;
            let scratch = Scratch {
                work: work.path(),
                stable: &stable,
            };

            while !job.state.is_terminal() {
                job.state = self.advance(&mut job, &capabilities, &scratch, &mut warnings);
            }

            log::debug!("[{}] {}", segment.label(), job.state.as_str());
            jobs.push(job);
            self.progress.inc(1);
        }

        let (placed, paths): (Vec<Segment>, Vec<PathBuf>) = jobs
            .iter()
            .filter(|job| job.state == SegmentState::Finalized)
            .filter_map(|job| {
                let artifact = job.artifact.as_ref()?;
                Some((job.segment.clone(), artifact.path.clone()))
            })
            .unzip();

        self.progress.set_message("Assembling final audio...");
        let duration = match self.options.mode {
            Mode::Timed => {
                self.assembler
                    .assemble_timed(&placed, &paths, total_duration, output, format)?
            }
            Mode::Natural => {
                self.assembler
                    .assemble_natural(&paths, output, format, self.options.gap_ms)?
            }
        };
        self.progress.finish_and_clear();

        Ok(RunReport {
            output: output.to_path_buf(),
            duration,
            jobs,
            warnings,
        })
    }

    fn scratch_dir(&self) -> std::io::Result<TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("transcript-tts-");
        match &self.scratch_root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        }
    }

    /// Perform the work of the job's current state and return the next state.
    fn advance(
        &self,
        job: &mut SegmentJob,
        capabilities: &Capabilities,
        scratch: &Scratch<'_>,
        warnings: &mut Vec<String>,
    ) -> SegmentState {
        match job.state {
            SegmentState::Pending => {
                job.voice = Some(self.voices.resolve(&job.segment, &self.backend));
                SegmentState::VoiceResolved
            }
            SegmentState::VoiceResolved => {
                self.plan(job, warnings);
                SegmentState::SpeedPlanned
            }
            SegmentState::SpeedPlanned => {
                job.chunks = chunk_text(&job.segment.text, capabilities.max_chunk_chars);
                SegmentState::Chunked
            }
            SegmentState::Chunked => match self.synthesize(job, capabilities, scratch.work) {
                Ok(artifact) => {
                    job.artifact = Some(artifact);
                    SegmentState::Synthesized
                }
                Err(e) => {
                    self.warn(
                        warnings,
                        format!("[{}] skipped: {e}", format_clock(job.segment.start)),
                    );
                    SegmentState::Skipped
                }
            },
            SegmentState::Synthesized => {
                self.correct_duration(job, capabilities, scratch.work);
                SegmentState::DurationCorrected
            }
            SegmentState::DurationCorrected => self.finalize(job, scratch.stable, warnings),
            terminal => terminal,
        }
    }

    fn plan(&self, job: &mut SegmentJob, warnings: &mut Vec<String>) {
        let target = job.segment.duration();
        if self.options.mode != Mode::Timed || target <= 0.0 {
            return;
        }

        let range = &self.options.speed_range;
        let decision = plan_speed(&job.segment.text, target, self.options.chars_per_sec, range);
        job.speed = decision.speed;

        let at = format_clock(job.segment.start);
        match decision.clamp(range) {
            Some(Clamp::TooLong) => self.warn(
                warnings,
                format!(
                    "[{at}] text too long ({:.2}× > {}×), clamping to {}×",
                    decision.required, range.max, range.max
                ),
            ),
            Some(Clamp::TooShort) => self.warn(
                warnings,
                format!(
                    "[{at}] text too short ({:.2}× < {}×), clamping to {}×",
                    decision.required, range.min, range.min
                ),
            ),
            None => {}
        }
    }

    fn synthesize(
        &self,
        job: &SegmentJob,
        capabilities: &Capabilities,
        work: &Path,
    ) -> Result<AudioArtifact, SynthesisFailure> {
        let voice = job
            .voice
            .as_ref()
            .map(|v| v.id.as_str())
            .unwrap_or(FALLBACK_VOICE);
        let extension = capabilities.audio_extension;

        let mut parts = Vec::with_capacity(job.chunks.len());
        for (i, chunk) in job.chunks.iter().enumerate() {
            let path = work.join(format!("chunk_{i:02}.{extension}"));
            let request = SynthesizeRequest::new(chunk.as_str(), voice).with_speed(job.speed);
            let duration = self.backend.synthesize(&request, &path)?;
            parts.push(AudioArtifact { path, duration });
        }

        if parts.len() <= 1 {
            return parts.pop().ok_or(SynthesisFailure::NoChunks);
        }

        let joined = work.join("segment.wav");
        let paths: Vec<PathBuf> = parts.into_iter().map(|part| part.path).collect();
        let duration = self.assembler.concat(&paths, &joined)?;

        Ok(AudioArtifact {
            path: joined,
            duration,
        })
    }

    fn correct_duration(&self, job: &mut SegmentJob, capabilities: &Capabilities, work: &Path) {
        let target = job.segment.duration();
        if self.options.mode != Mode::Timed || capabilities.supports_speed || target <= 0.0 {
            return;
        }

        let Some(AudioArtifact {
            path: source,
            duration: current,
        }) = job.artifact.clone()
        else {
            return;
        };
        if !source.exists() || (current - target).abs() <= self.options.tolerance {
            return;
        }

        let label = format_clock(job.segment.start);
        let Some(chain) = TempoChain::for_durations(current, target) else {
            log::info!("[{label}] time stretch not applied: no usable durations");
            return;
        };

        let stretched = work.join(format!("stretched.{}", extension_of(&source)));

        match self.transcoder.apply_tempo(&source, &chain, &stretched) {
            Ok(()) => {
                let duration = probe_duration(&stretched).unwrap_or(target);
                log::debug!(
                    "[{label}] stretched {current:.2}s to {duration:.2}s ({})",
                    chain.filter()
                );
                job.artifact = Some(AudioArtifact {
                    path: stretched,
                    duration,
                });
                job.time_stretched = true;
            }
            Err(e) => {
                log::info!("[{label}] time stretch not applied, keeping original audio: {e}");
            }
        }
    }

    fn finalize(
        &self,
        job: &mut SegmentJob,
        stable: &Path,
        warnings: &mut Vec<String>,
    ) -> SegmentState {
        let at = format_clock(job.segment.start);

        let Some(AudioArtifact {
            path: source,
            duration,
        }) = job.artifact.clone().filter(|a| a.path.exists())
        else {
            self.warn(warnings, format!("[{at}] failed, skipping"));
            return SegmentState::Failed;
        };

        let path = stable.join(format!("final_{:04}.{}", job.index, extension_of(&source)));

        match fs::copy(&source, &path) {
            Ok(_) => {
                job.artifact = Some(AudioArtifact { path, duration });
                SegmentState::Finalized
            }
            Err(e) => {
                self.warn(warnings, format!("[{at}] failed, skipping: {e}"));
                SegmentState::Failed
            }
        }
    }

    fn warn(&self, warnings: &mut Vec<String>, message: String) {
        self.progress.suspend(|| log::warn!("{message}"));
        warnings.push(message);
    }
}

fn extension_of(path: &Path) -> &str {
    path.extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("wav")
}

/// Why a segment could not be synthesized.
#[derive(Error, Debug)]
enum SynthesisFailure {
    #[error(transparent)]
    Backend(#[from] crate::backend::BackendError),

    #[error(transparent)]
    Concat(#[from] AudioError),

    #[error("no text to synthesize")]
    NoChunks,
}
