//! Segment timing: rate estimation, speed planning, text chunking and tempo
//! correction chains.
//!
//! Everything here is pure computation; the pipeline in [`crate::engine`]
//! decides when each piece applies.

mod chunk;
mod estimate;
mod speed;
mod tempo;

pub use chunk::chunk_text;
pub use estimate::{DEFAULT_CHARS_PER_SEC, estimate_chars_per_sec};
pub use speed::{Clamp, SpeedDecision, SpeedRange, SpeedRangeError, plan_speed};
pub use tempo::{MAX_STAGE, MIN_STAGE, TempoChain};
