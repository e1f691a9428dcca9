//! Raw segment construction from smoothed ticks.
//!
//! Each smoothed tick covers the interval ending at its `ts`; the first
//! interval starts at 0. Consecutive ticks with the same state form one
//! segment.

use steadycut_common::config::FixConfig;
use steadycut_plan_model::segment::{Segment, SegmentType, SmoothedTick};
use steadycut_plan_model::tick::Tick;

use crate::decorate::suggest_fix;

/// Build pre-cleanup segments.
///
/// SHAKY segments get `confidence_avg` over raw ticks with `ts` in
/// `(start, end]` and a provisional duration-based fix. The authoritative
/// fix is assigned by [`crate::decorate::decorate`] after cleanup.
pub fn build_segments(smoothed: &[SmoothedTick], raw: &[Tick]) -> Vec<Segment> {
    let Some(first) = smoothed.first() else {
        return vec![];
    };

    let mut segments = vec![];
    let mut open_type = first.final_state;
    let mut open_start = 0.0;
    let mut open_end = first.ts;

    for tick in &smoothed[1..] {
        if tick.final_state == open_type {
            open_end = tick.ts;
        } else {
            segments.push(Segment::new(segments.len(), open_type, open_start, open_end));
            open_type = tick.final_state;
            open_start = open_end;
            open_end = tick.ts;
        }
    }
    segments.push(Segment::new(segments.len(), open_type, open_start, open_end));

    let provisional = FixConfig::default();
    for segment in segments.iter_mut() {
        if segment.segment_type == SegmentType::Shaky {
            segment.confidence_avg = mean_confidence(raw, segment.start, segment.end);
            segment.suggested_fix = Some(suggest_fix(segment.duration(), &provisional));
        }
        segment.resolve_final_fix();
    }

    segments
}

/// Mean raw confidence of ticks with `start < ts <= end`.
pub fn mean_confidence(raw: &[Tick], start: f64, end: f64) -> Option<f64> {
    let (sum, count) = raw
        .iter()
        .filter(|t| t.ts > start && t.ts <= end)
        .fold((0.0, 0usize), |(sum, count), t| {
            (sum + t.raw.confidence, count + 1)
        });

    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}
