//! External ffmpeg invocation for encoding and tempo changes.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crate::timing::TempoChain;

use super::AudioError;

/// Upper bound for a single ffmpeg run.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Runs the ffmpeg binary with a bounded wait.
#[derive(Debug, Clone)]
pub struct Transcoder {
    program: PathBuf,
    timeout: Duration,
}

impl Transcoder {
    /// Transcoder using `ffmpeg` from `PATH`.
    pub fn new() -> Self {
        Self::with_program("ffmpeg")
    }

    /// Transcoder using a specific ffmpeg binary.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set the per-invocation timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Apply a tempo chain to `input`, writing `output`.
    pub fn apply_tempo(
        &self,
        input: &Path,
        chain: &TempoChain,
        output: &Path,
    ) -> Result<(), AudioError> {
        let filter = chain.filter();
        log::debug!("Applying {filter} to {}", input.display());

        let mut command = self.command();
        command
            .arg("-i")
            .arg(input)
            .args(["-filter:a", filter.as_str()])
            .arg(output);
        self.run(command)?;
        ensure_written(output)
    }

    /// Encode `input` to mp3 at `output`.
    pub fn encode_mp3(&self, input: &Path, output: &Path) -> Result<(), AudioError> {
        let mut command = self.command();
        command
            .arg("-i")
            .arg(input)
            .args(["-codec:a", "libmp3lame", "-q:a", "2"])
            .arg(output);
        self.run(command)?;
        ensure_written(output)
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(["-y", "-hide_banner", "-loglevel", "error"]);
        command
    }

    fn run(&self, mut command: Command) -> Result<(), AudioError> {
        let mut child = command
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                AudioError::Transcoder(format!("failed to start {}: {e}", self.program.display()))
            })?;

        let started = Instant::now();
        loop {
            if let Some(status) = child.try_wait()? {
                if status.success() {
                    return Ok(());
                }
                return Err(AudioError::Transcoder(format!(
                    "{} exited with {status}",
                    self.program.display()
                )));
            }

            if started.elapsed() >= self.timeout {
                let _ = child.kill();
                let _ = child.wait();
                return Err(AudioError::Timeout(self.timeout));
            }

            thread::sleep(POLL_INTERVAL);
        }
    }
}

impl Default for Transcoder {
    fn default() -> Self {
        Self::new()
    }
}

fn ensure_written(output: &Path) -> Result<(), AudioError> {
    if output.exists() {
        Ok(())
    } else {
        Err(AudioError::Transcoder(format!(
            "no output written to {}",
            output.display()
        )))
    }
}
