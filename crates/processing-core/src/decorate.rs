//! Fix suggestion and BRIDGE eligibility.
//!
//! Runs on the cleaned segment list. Short SHAKY segments are suggested
//! BRIDGE, longer ones STABILIZE. BRIDGE is only legal for a SHAKY segment
//! below the generation-model ceiling with GOOD segments on both sides and
//! a downloadable recording to pull boundary frames from.

use steadycut_common::config::FixConfig;
use steadycut_plan_model::segment::{Fix, Segment, SegmentType};

/// Slack for durations computed from subtracted timestamps.
const DURATION_EPSILON: f64 = 1e-9;

/// Default fix for a SHAKY segment of the given duration.
pub fn suggest_fix(duration_secs: f64, config: &FixConfig) -> Fix {
    if duration_secs <= config.bridge_suggest_max_secs + DURATION_EPSILON {
        Fix::Bridge
    } else {
        Fix::Stabilize
    }
}

/// Whether BRIDGE is structurally legal for `segments[index]`.
pub fn bridge_allowed(
    segments: &[Segment],
    index: usize,
    has_recording: bool,
    config: &FixConfig,
) -> bool {
    let Some(segment) = segments.get(index) else {
        return false;
    };
    if !segment.is_shaky() || !has_recording {
        return false;
    }
    if segment.duration() >= config.bridge_max_secs - DURATION_EPSILON {
        return false;
    }

    let prev_good = index
        .checked_sub(1)
        .and_then(|i| segments.get(i))
        .is_some_and(Segment::is_good);
    let next_good = segments.get(index + 1).is_some_and(Segment::is_good);

    prev_good && next_good
}

/// Assign suggested fix, bridge eligibility, and final fix to every segment.
///
/// Existing `user_fix` values on SHAKY segments are honored as given, even
/// when BRIDGE is no longer allowed; clearing them is the caller's call.
/// GOOD segments lose any user fix and are always KEEP.
pub fn decorate(segments: &[Segment], has_recording: bool, config: &FixConfig) -> Vec<Segment> {
    let mut decorated = segments.to_vec();

    for (i, segment) in decorated.iter_mut().enumerate() {
        match segment.segment_type {
            SegmentType::Good => {
                segment.suggested_fix = None;
                segment.user_fix = None;
                segment.bridge_allowed = false;
            }
            SegmentType::Shaky => {
                segment.suggested_fix = Some(suggest_fix(segment.duration(), config));
                segment.bridge_allowed = bridge_allowed(segments, i, has_recording, config);
            }
        }
        segment.resolve_final_fix();
    }

    decorated
}
