//! User fix overrides that outlive segment rebuilds.
//!
//! Segment ids are positional and change whenever cleanup reshapes the
//! timeline, so overrides are keyed by the span they were set on. After each
//! rebuild an override moves to the SHAKY segment it overlaps most and takes
//! that segment's span as its new key.

use steadycut_plan_model::segment::{Fix, Segment};

/// One user decision, anchored to a time span.
#[derive(Debug, Clone, PartialEq)]
pub struct FixOverride {
    pub start: f64,
    pub end: f64,
    pub fix: Fix,
    /// Monotonic insertion order; higher wins on conflicts.
    pub seq: u64,
}

/// Side-table of overrides for one session.
#[derive(Debug, Clone, Default)]
pub struct OverrideTable {
    entries: Vec<FixOverride>,
    next_seq: u64,
}

impl OverrideTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Record an override on the span of `segment`. Any override already
    /// anchored to that exact span is replaced.
    pub fn set(&mut self, segment: &Segment, fix: Fix) {
        self.entries
            .retain(|o| !(o.start == segment.start && o.end == segment.end));
        self.entries.push(FixOverride {
            start: segment.start,
            end: segment.end,
            fix,
            seq: self.next_seq,
        });
        self.next_seq += 1;
    }

    /// Remove the override anchored to `segment`'s span, if any.
    pub fn clear(&mut self, segment: &Segment) {
        self.entries
            .retain(|o| !(o.start == segment.start && o.end == segment.end));
    }

    /// Attach overrides to freshly built segments.
    ///
    /// Sets `user_fix` on matched SHAKY segments and re-keys the table to
    /// their spans. Overrides with no SHAKY overlap are dropped; when several
    /// land on one segment the most recent is kept. Returns a warning per
    /// dropped override. `final_fix` is left for the caller to resolve.
    pub fn reattach(&mut self, segments: &mut [Segment]) -> Vec<String> {
        let mut warnings = vec![];
        let mut ordered = std::mem::take(&mut self.entries);
        ordered.sort_by_key(|o| o.seq);

        // Winner per segment index; later entries overwrite earlier ones.
        let mut winners: Vec<Option<FixOverride>> = vec![None; segments.len()];

        for entry in ordered {
            match best_overlap(segments, entry.start, entry.end) {
                Some(index) => {
                    if let Some(previous) = &winners[index] {
                        tracing::debug!(
                            segment = %segments[index].id,
                            replaced = %previous.fix,
                            fix = %entry.fix,
                            "Overrides collided on one segment; keeping the newest"
                        );
                    }
                    winners[index] = Some(entry);
                }
                None => {
                    let message = format!(
                        "user fix {} for {:.3}s-{:.3}s no longer matches a SHAKY segment and was dropped",
                        entry.fix, entry.start, entry.end
                    );
                    tracing::warn!(
                        start = entry.start,
                        end = entry.end,
                        fix = %entry.fix,
                        "Dropping orphaned user fix"
                    );
                    warnings.push(message);
                }
            }
        }

        for (segment, winner) in segments.iter_mut().zip(winners) {
            if let Some(mut entry) = winner {
                segment.user_fix = Some(entry.fix);
                entry.start = segment.start;
                entry.end = segment.end;
                self.entries.push(entry);
            }
        }

        warnings
    }
}

/// Index of the SHAKY segment with the largest positive overlap.
fn best_overlap(segments: &[Segment], start: f64, end: f64) -> Option<usize> {
    segments
        .iter()
        .enumerate()
        .filter(|(_, s)| s.is_shaky())
        .map(|(i, s)| (i, s.overlap(start, end)))
        .filter(|&(_, overlap)| overlap > 0.0)
        .fold(None, |best: Option<(usize, f64)>, (i, overlap)| match best {
            Some((_, current)) if current >= overlap => best,
            _ => Some((i, overlap)),
        })
        .map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use steadycut_plan_model::segment::SegmentType;

    fn seg(index: usize, segment_type: SegmentType, start: f64, end: f64) -> Segment {
        Segment::new(index, segment_type, start, end)
    }

    #[test]
    fn test_override_follows_grown_segment() {
        let mut table = OverrideTable::new();
        table.set(&seg(1, SegmentType::Shaky, 3.0, 6.0), Fix::Cut);

        let mut rebuilt = vec![
            seg(0, SegmentType::Good, 0.0, 3.0),
            seg(1, SegmentType::Shaky, 3.0, 7.0),
        ];
        let warnings = table.reattach(&mut rebuilt);

        assert!(warnings.is_empty());
        assert_eq!(rebuilt[1].user_fix, Some(Fix::Cut));
        assert!(rebuilt[0].user_fix.is_none());
        // Re-keyed to the new span.
        assert_eq!(table.entries[0].end, 7.0);
    }

    #[test]
    fn test_largest_overlap_wins() {
        let mut table = OverrideTable::new();
        table.set(&seg(0, SegmentType::Shaky, 2.0, 8.0), Fix::Stabilize);

        let mut rebuilt = vec![
            seg(0, SegmentType::Shaky, 0.0, 3.0),
            seg(1, SegmentType::Good, 3.0, 4.0),
            seg(2, SegmentType::Shaky, 4.0, 9.0),
        ];
        table.reattach(&mut rebuilt);

        assert!(rebuilt[0].user_fix.is_none());
        assert_eq!(rebuilt[2].user_fix, Some(Fix::Stabilize));
    }

    #[test]
    fn test_override_without_shaky_overlap_is_dropped() {
        let mut table = OverrideTable::new();
        table.set(&seg(1, SegmentType::Shaky, 3.0, 4.0), Fix::Cut);

        let mut rebuilt = vec![seg(0, SegmentType::Good, 0.0, 10.0)];
        let warnings = table.reattach(&mut rebuilt);

        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("CUT"));
        assert!(table.is_empty());
        assert!(rebuilt[0].user_fix.is_none());
    }

    #[test]
    fn test_most_recent_override_wins_after_merge() {
        let mut table = OverrideTable::new();
        table.set(&seg(1, SegmentType::Shaky, 2.0, 4.0), Fix::Cut);
        table.set(&seg(3, SegmentType::Shaky, 5.0, 7.0), Fix::Stabilize);

        // The GOOD between them was absorbed; both land on one segment.
        let mut rebuilt = vec![
            seg(0, SegmentType::Good, 0.0, 2.0),
            seg(1, SegmentType::Shaky, 2.0, 7.0),
        ];
        let warnings = table.reattach(&mut rebuilt);

        assert!(warnings.is_empty());
        assert_eq!(rebuilt[1].user_fix, Some(Fix::Stabilize));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_set_replaces_same_span() {
        let mut table = OverrideTable::new();
        let shaky = seg(1, SegmentType::Shaky, 3.0, 6.0);
        table.set(&shaky, Fix::Cut);
        table.set(&shaky, Fix::Stabilize);
        assert_eq!(table.len(), 1);
        assert_eq!(table.entries[0].fix, Fix::Stabilize);

        table.clear(&shaky);
        assert!(table.is_empty());
    }
}
