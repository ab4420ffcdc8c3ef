//! Pipeline orchestrator.
//!
//! This module drives each transcript segment through the synthesis
//! pipeline and hands the results to the assembler.

mod pipeline;

pub use pipeline::{
    AudioArtifact, DURATION_TOLERANCE, Pipeline, PipelineError, PipelineOptions, RunReport,
    SegmentJob, SegmentState,
};
