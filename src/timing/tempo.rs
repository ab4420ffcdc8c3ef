//! Tempo filter chains for post-synthesis duration correction.
//!
//! ffmpeg's `atempo` filter only accepts factors between 0.5 and 2.0, so larger
//! corrections are expressed as several stages whose product is the full ratio.

/// Smallest factor a single `atempo` stage accepts.
pub const MIN_STAGE: f64 = 0.5;
/// Largest factor a single `atempo` stage accepts.
pub const MAX_STAGE: f64 = 2.0;

/// Ordered tempo stages, each within [`MIN_STAGE`, `MAX_STAGE`].
#[derive(Debug, Clone, PartialEq)]
pub struct TempoChain {
    stages: Vec<f64>,
}

impl TempoChain {
    /// Build the chain for `ratio = current_duration / target_duration`.
    ///
    /// Returns `None` for a ratio that is not a positive, finite number.
    pub fn from_ratio(ratio: f64) -> Option<Self> {
        if !ratio.is_finite() || ratio <= 0.0 {
            return None;
        }

        let mut stages = Vec::new();
        let mut remaining = ratio;

        while remaining > MAX_STAGE {
            stages.push(MAX_STAGE);
            remaining /= MAX_STAGE;
        }
        while remaining < MIN_STAGE {
            stages.push(MIN_STAGE);
            remaining /= MIN_STAGE;
        }
        stages.push(remaining);

        Some(Self { stages })
    }

    /// Chain that stretches `current` seconds of audio to `target` seconds.
    ///
    /// Returns `None` when either duration is not positive; the correction
    /// must then be skipped rather than attempted.
    pub fn for_durations(current: f64, target: f64) -> Option<Self> {
        if current <= 0.0 || target <= 0.0 {
            return None;
        }
        Self::from_ratio(current / target)
    }

    pub fn stages(&self) -> &[f64] {
        &self.stages
    }

    /// Overall tempo factor of the chain.
    pub fn product(&self) -> f64 {
        self.stages.iter().product()
    }

    /// Render as an ffmpeg audio filter, e.g. `atempo=2.0000,atempo=1.2500`.
    pub fn filter(&self) -> String {
        self.stages
            .iter()
            .map(|stage| format!("atempo={stage:.4}"))
            .collect::<Vec<_>>()
            .join(",")
    }
}
