//! Noise cleanup for raw segments.
//!
//! # Passes
//!
//! 1. **Drop/absorb:** a GOOD segment shorter than `min_good_secs` is folded
//!    into the preceding GOOD output segment, or else into the following
//!    GOOD segment; with no GOOD neighbor it is kept. A SHAKY segment shorter
//!    than `min_shaky_secs` is dropped and its time range goes to the next
//!    surviving segment (the last survivor when it was trailing).
//!    Survivors of the same type that end up adjacent are merged.
//! 2. **Gap merge:** GOOD, SHAKY shorter than `merge_gap_secs`, GOOD
//!    collapses into one GOOD segment.
//!
//! Total coverage is preserved: the first segment still starts where the
//! input started and the last still ends where the input ended. Ids are
//! reassigned afterwards. `confidence_avg` is carried over, not re-derived.

use steadycut_common::config::CleanupConfig;
use steadycut_plan_model::segment::{renumber, Segment, SegmentType};

/// Run both cleanup passes.
///
/// An input of zero or one segment is returned as-is (renumbered); a
/// session never ends up with zero segments because of cleanup.
pub fn cleanup(segments: &[Segment], config: &CleanupConfig) -> Vec<Segment> {
    if segments.len() <= 1 {
        let mut out = segments.to_vec();
        renumber(&mut out);
        return out;
    }

    let absorbed = drop_noise(segments, config);
    let mut out = merge_short_gaps(absorbed, config.merge_gap_secs);
    renumber(&mut out);

    tracing::trace!(
        input = segments.len(),
        output = out.len(),
        "Segment cleanup complete"
    );
    out
}

/// Pass 1: absorb short GOOD segments, drop short SHAKY ones.
fn drop_noise(segments: &[Segment], config: &CleanupConfig) -> Vec<Segment> {
    let coverage_start = segments[0].start;
    let coverage_end = segments[segments.len() - 1].end;

    let mut pending = segments.to_vec();
    let mut out: Vec<Segment> = Vec::with_capacity(pending.len());

    for i in 0..pending.len() {
        let segment = pending[i].clone();
        let duration = segment.duration();

        match segment.segment_type {
            SegmentType::Good if duration < config.min_good_secs => {
                if let Some(prev) = out.last_mut().filter(|p| p.is_good()) {
                    prev.end = segment.end;
                    continue;
                }
                if let Some(next) = pending.get_mut(i + 1).filter(|n| n.is_good()) {
                    next.start = segment.start;
                    continue;
                }
                out.push(segment);
            }
            SegmentType::Shaky if duration < config.min_shaky_secs => {
                tracing::trace!(
                    start = segment.start,
                    end = segment.end,
                    "Dropping short SHAKY segment"
                );
            }
            _ => out.push(segment),
        }
    }

    if out.is_empty() {
        return segments.to_vec();
    }

    restitch(&mut out, coverage_start, coverage_end);
    merge_adjacent(out)
}

/// Pass 2: collapse GOOD / short SHAKY / GOOD triples into one GOOD.
fn merge_short_gaps(segments: Vec<Segment>, merge_gap_secs: f64) -> Vec<Segment> {
    let mut out: Vec<Segment> = Vec::with_capacity(segments.len());

    for segment in segments {
        out.push(segment);

        let merged_end = match out.as_slice() {
            [.., left, gap, right]
                if left.is_good()
                    && gap.is_shaky()
                    && gap.duration() < merge_gap_secs
                    && right.is_good() =>
            {
                Some(right.end)
            }
            _ => None,
        };

        if let Some(end) = merged_end {
            out.truncate(out.len() - 2);
            if let Some(left) = out.last_mut() {
                left.end = end;
            }
        }
    }

    out
}

/// Make survivors contiguous again after drops.
fn restitch(segments: &mut [Segment], coverage_start: f64, coverage_end: f64) {
    if let Some(first) = segments.first_mut() {
        first.start = coverage_start;
    }
    for i in 1..segments.len() {
        segments[i].start = segments[i - 1].end;
    }
    if let Some(last) = segments.last_mut() {
        last.end = coverage_end;
    }
}

/// Merge neighbors of the same type into one segment.
fn merge_adjacent(segments: Vec<Segment>) -> Vec<Segment> {
    let mut out: Vec<Segment> = Vec::with_capacity(segments.len());

    for segment in segments {
        match out.last_mut() {
            Some(prev) if prev.segment_type == segment.segment_type => {
                prev.confidence_avg = prev.confidence_avg.or(segment.confidence_avg);
                prev.end = segment.end;
            }
            _ => out.push(segment),
        }
    }

    out
}
