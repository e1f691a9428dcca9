//! End-to-end recompute: smoothing, building, cleanup, decoration.

use serde::Serialize;

use steadycut_common::config::PipelineConfig;
use steadycut_plan_model::segment::{Segment, SmoothedTick};
use steadycut_plan_model::tick::Tick;

use crate::cleanup::cleanup;
use crate::decorate::decorate;
use crate::segment_builder::build_segments;
use crate::smoother::Smoother;

/// Result of one full recompute.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput {
    /// One entry per input tick.
    pub smoothed: Vec<SmoothedTick>,
    /// Cleaned, decorated segments.
    pub segments: Vec<Segment>,
}

/// Summary figures for a segment list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SegmentStats {
    pub good_count: usize,
    pub shaky_count: usize,
    pub shaky_secs: f64,
    pub total_secs: f64,
    pub bridge_eligible: usize,
}

/// Run the full pipeline over a tick history.
///
/// User fixes are not known here; every SHAKY segment comes out with its
/// suggested fix as the final fix.
pub fn run_pipeline(
    ticks: &[Tick],
    has_recording: bool,
    config: &PipelineConfig,
) -> PipelineOutput {
    let smoothed = Smoother::new(config.smoothing.clone()).smooth(ticks);
    let raw_segments = build_segments(&smoothed, ticks);
    let cleaned = cleanup(&raw_segments, &config.cleanup);
    let segments = decorate(&cleaned, has_recording, &config.fixes);

    tracing::debug!(
        ticks = ticks.len(),
        raw_segments = raw_segments.len(),
        segments = segments.len(),
        has_recording,
        "Pipeline recompute"
    );

    PipelineOutput { smoothed, segments }
}

/// Count segments by type and total up their durations.
pub fn segment_stats(segments: &[Segment]) -> SegmentStats {
    segments
        .iter()
        .fold(SegmentStats::default(), |mut stats, segment| {
            if segment.is_shaky() {
                stats.shaky_count += 1;
                stats.shaky_secs += segment.duration();
                if segment.bridge_allowed {
                    stats.bridge_eligible += 1;
                }
            } else {
                stats.good_count += 1;
            }
            stats.total_secs += segment.duration();
            stats
        })
}
