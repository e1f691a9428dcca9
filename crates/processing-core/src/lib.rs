//! SteadyCut Processing Core: the shake timeline engine
//!
//! Turns raw per-second classifications into a cleaned, decorated
//! segment list:
//! - **Smoothing:** majority filter with a high-confidence override
//! - **Segment building:** runs of equal state become timed segments
//! - **Cleanup:** too-short segments are absorbed, dropped, or merged
//! - **Decoration:** suggested fix and BRIDGE eligibility per segment
//!
//! This crate is pure computation with no I/O and no shared state.
//! Every stage can be re-run from scratch on any prefix of the tick log.

pub mod cleanup;
pub mod decorate;
pub mod pipeline;
pub mod segment_builder;
pub mod smoother;

pub use cleanup::cleanup;
pub use decorate::decorate;
pub use pipeline::{run_pipeline, segment_stats, PipelineOutput, SegmentStats};
pub use segment_builder::build_segments;
pub use smoother::Smoother;
