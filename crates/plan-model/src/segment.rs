//! Segments: contiguous GOOD/SHAKY time ranges and their remediation.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Debounced per-tick state, also the type of a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum SegmentType {
    #[default]
    Good,
    Shaky,
}

/// A remediation that can be suggested for, or chosen on, a SHAKY segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Fix {
    /// Remove the segment from the output.
    Cut,
    /// Run video stabilization over the segment.
    Stabilize,
    /// Replace the segment with generated footage between its neighbors.
    Bridge,
}

/// The effective decision for a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FinalFix {
    Keep,
    Cut,
    Stabilize,
    Bridge,
}

/// One tick's debounced state, index-aligned with the raw tick list.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SmoothedTick {
    pub tick: u64,
    pub ts: f64,
    pub final_state: SegmentType,
}

/// A maximal run of ticks sharing one state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Positional identifier (`seg_0000`, ...); reassigned on every rebuild.
    pub id: String,
    pub start: f64,
    pub end: f64,
    #[serde(rename = "type")]
    pub segment_type: SegmentType,
    /// Mean raw confidence over contributing ticks (SHAKY only).
    pub confidence_avg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_fix: Option<Fix>,
    pub user_fix: Option<Fix>,
    pub final_fix: FinalFix,
    /// Whether BRIDGE is structurally legal here. Derived, never user-set.
    #[serde(default)]
    pub bridge_allowed: bool,
    /// Artifacts produced by the render stage.
    #[serde(default)]
    pub outputs: BTreeMap<String, String>,
}

impl fmt::Display for SegmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SegmentType::Good => f.pad("GOOD"),
            SegmentType::Shaky => f.pad("SHAKY"),
        }
    }
}

impl fmt::Display for Fix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        FinalFix::from(*self).fmt(f)
    }
}

impl fmt::Display for FinalFix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FinalFix::Keep => "KEEP",
            FinalFix::Cut => "CUT",
            FinalFix::Stabilize => "STABILIZE",
            FinalFix::Bridge => "BRIDGE",
        };
        f.pad(label)
    }
}

impl std::str::FromStr for Fix {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CUT" => Ok(Fix::Cut),
            "STABILIZE" => Ok(Fix::Stabilize),
            "BRIDGE" => Ok(Fix::Bridge),
            other => Err(format!("unknown fix '{other}' (expected CUT, STABILIZE or BRIDGE)")),
        }
    }
}

impl From<Fix> for FinalFix {
    fn from(fix: Fix) -> Self {
        match fix {
            Fix::Cut => FinalFix::Cut,
            Fix::Stabilize => FinalFix::Stabilize,
            Fix::Bridge => FinalFix::Bridge,
        }
    }
}

impl FinalFix {
    /// The remediation this decision asks for, if any.
    pub fn as_fix(self) -> Option<Fix> {
        match self {
            FinalFix::Keep => None,
            FinalFix::Cut => Some(Fix::Cut),
            FinalFix::Stabilize => Some(Fix::Stabilize),
            FinalFix::Bridge => Some(Fix::Bridge),
        }
    }
}

/// Positional segment identifier.
pub fn segment_id(index: usize) -> String {
    format!("seg_{index:04}")
}

impl Segment {
    /// A segment with no fix information yet.
    pub fn new(index: usize, segment_type: SegmentType, start: f64, end: f64) -> Self {
        Self {
            id: segment_id(index),
            start,
            end,
            segment_type,
            confidence_avg: None,
            suggested_fix: None,
            user_fix: None,
            final_fix: FinalFix::Keep,
            bridge_allowed: false,
            outputs: BTreeMap::new(),
        }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    pub fn is_shaky(&self) -> bool {
        self.segment_type == SegmentType::Shaky
    }

    pub fn is_good(&self) -> bool {
        self.segment_type == SegmentType::Good
    }

    /// Length of the intersection with `[start, end]`, zero if disjoint.
    pub fn overlap(&self, start: f64, end: f64) -> f64 {
        (self.end.min(end) - self.start.max(start)).max(0.0)
    }

    /// Recompute `final_fix` from the type, user override, and suggestion.
    ///
    /// GOOD is always KEEP. SHAKY takes the user override when present.
    pub fn resolve_final_fix(&mut self) {
        self.final_fix = match self.segment_type {
            SegmentType::Good => FinalFix::Keep,
            SegmentType::Shaky => self
                .user_fix
                .or(self.suggested_fix)
                .map(FinalFix::from)
                .unwrap_or(FinalFix::Keep),
        };
    }
}

/// Reassign `seg_NNNN` ids in order.
pub fn renumber(segments: &mut [Segment]) {
    for (i, segment) in segments.iter_mut().enumerate() {
        segment.id = segment_id(i);
    }
}
