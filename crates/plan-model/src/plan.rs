//! The edit plan: the externally visible contract for one session.
//!
//! Renderers and UIs consume this shape. `final_fix` is authoritative and
//! segment ordering/contiguity is preserved exactly as produced.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::segment::{FinalFix, Fix, Segment, SegmentType};

/// Current wire format version.
pub const PLAN_VERSION: u32 = 1;

/// Tolerance for comparing segment boundaries read back from JSON.
const BOUNDARY_EPSILON: f64 = 1e-9;

/// Serializable snapshot of a session's segment decisions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditPlan {
    pub version: u32,
    /// Total covered duration in seconds.
    pub duration: f64,
    pub session_id: String,
    pub ticks_hz: u32,
    pub segments: Vec<PlanSegment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recording: Option<RecordingRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub captions: Option<CaptionsRef>,
}

/// Wire form of a segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanSegment {
    pub id: String,
    pub start: f64,
    pub end: f64,
    #[serde(rename = "type")]
    pub segment_type: SegmentType,
    pub confidence_avg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_fix: Option<Fix>,
    pub user_fix: Option<Fix>,
    pub final_fix: FinalFix,
    #[serde(default)]
    pub outputs: BTreeMap<String, String>,
}

/// Reference to the downloadable source recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingRef {
    /// Path or URL of the source video.
    pub path: String,

    /// Duration reported by the recorder, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<f64>,
}

/// Generated captions attached to a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionsRef {
    /// Detected or requested language (ISO 639-1).
    pub language: String,
    /// Subtitle format of `content`.
    pub format: String,
    pub cue_count: usize,
    pub content: String,
}

impl RecordingRef {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            duration_secs: None,
        }
    }
}

impl From<&Segment> for PlanSegment {
    fn from(segment: &Segment) -> Self {
        Self {
            id: segment.id.clone(),
            start: segment.start,
            end: segment.end,
            segment_type: segment.segment_type,
            confidence_avg: segment.confidence_avg,
            suggested_fix: segment.suggested_fix,
            user_fix: segment.user_fix,
            final_fix: segment.final_fix,
            outputs: segment.outputs.clone(),
        }
    }
}

impl PlanSegment {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

impl EditPlan {
    /// Project a segment list into a plan.
    pub fn new(session_id: impl Into<String>, ticks_hz: u32, segments: &[Segment]) -> Self {
        Self {
            version: PLAN_VERSION,
            duration: segments.last().map(|s| s.end).unwrap_or(0.0),
            session_id: session_id.into(),
            ticks_hz,
            segments: segments.iter().map(PlanSegment::from).collect(),
            recording: None,
            captions: None,
        }
    }

    /// Load a plan from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PlanError> {
        let path = path.as_ref().to_path_buf();
        let content = std::fs::read_to_string(&path).map_err(|e| PlanError::IoError {
            path: path.clone(),
            source: e,
        })?;
        serde_json::from_str(&content).map_err(|e| PlanError::ParseError { path, source: e })
    }

    /// Write the plan as pretty JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), PlanError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| PlanError::IoError {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|e| PlanError::ParseError {
            path: path.clone(),
            source: e,
        })?;
        std::fs::write(&path, json).map_err(|e| PlanError::IoError { path, source: e })
    }

    /// Check the structural guarantees consumers rely on.
    ///
    /// Returns one message per violation; empty means valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = vec![];

        if self.version != PLAN_VERSION {
            errors.push(format!("Unsupported plan version {}", self.version));
        }

        if self.segments.is_empty() {
            errors.push("Plan has no segments".to_string());
        }

        if let Some(first) = self.segments.first() {
            if first.start.abs() > BOUNDARY_EPSILON {
                errors.push(format!("{} starts at {} instead of 0", first.id, first.start));
            }
        }

        for (i, segment) in self.segments.iter().enumerate() {
            if segment.end <= segment.start {
                errors.push(format!(
                    "{} has non-positive duration ({} -> {})",
                    segment.id, segment.start, segment.end
                ));
            }

            if i > 0 {
                let prev = &self.segments[i - 1];
                if (segment.start - prev.end).abs() > BOUNDARY_EPSILON {
                    errors.push(format!(
                        "{} starts at {} but {} ends at {}",
                        segment.id, segment.start, prev.id, prev.end
                    ));
                }
            }

            match segment.segment_type {
                SegmentType::Good => {
                    if segment.final_fix != FinalFix::Keep {
                        errors.push(format!("GOOD segment {} must be KEEP", segment.id));
                    }
                    if segment.user_fix.is_some() {
                        errors.push(format!("GOOD segment {} carries a user fix", segment.id));
                    }
                }
                SegmentType::Shaky => {
                    let expected = segment.user_fix.or(segment.suggested_fix).map(FinalFix::from);
                    if expected != Some(segment.final_fix) {
                        errors.push(format!(
                            "SHAKY segment {} final fix {} does not match its user/suggested fix",
                            segment.id, segment.final_fix
                        ));
                    }
                }
            }
        }

        if let Some(last) = self.segments.last() {
            if (last.end - self.duration).abs() > BOUNDARY_EPSILON {
                errors.push(format!(
                    "Plan duration {} does not match last segment end {}",
                    self.duration, last.end
                ));
            }
        }

        errors
    }

    /// Like [`validate`](Self::validate), but as a single error for callers
    /// that must not act on a broken plan.
    pub fn ensure_valid(&self) -> Result<(), PlanError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(PlanError::ValidationError {
                message: errors.join("; "),
            })
        }
    }

    /// Total seconds covered by SHAKY segments.
    pub fn shaky_secs(&self) -> f64 {
        self.segments
            .iter()
            .filter(|s| s.segment_type == SegmentType::Shaky)
            .map(PlanSegment::duration)
            .sum()
    }
}

/// Errors that can occur when reading or writing plan files.
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error("I/O error at {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error in {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid plan: {message}")]
    ValidationError { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_segments() -> Vec<Segment> {
        let mut good = Segment::new(0, SegmentType::Good, 0.0, 3.0);
        good.resolve_final_fix();

        let mut shaky = Segment::new(1, SegmentType::Shaky, 3.0, 6.0);
        shaky.confidence_avg = Some(0.5);
        shaky.suggested_fix = Some(Fix::Stabilize);
        shaky.resolve_final_fix();

        let mut tail = Segment::new(2, SegmentType::Good, 6.0, 10.0);
        tail.resolve_final_fix();

        vec![good, shaky, tail]
    }

    #[test]
    fn test_plan_json_shape() {
        let plan = EditPlan::new("sess-1", 1, &sample_segments());
        let value = serde_json::to_value(&plan).unwrap();

        assert_eq!(value["version"], 1);
        assert_eq!(value["duration"], 10.0);
        assert_eq!(value["session_id"], "sess-1");
        assert_eq!(value["ticks_hz"], 1);
        assert!(value.get("recording").is_none());

        let good = &value["segments"][0];
        assert_eq!(good["id"], "seg_0000");
        assert_eq!(good["type"], "GOOD");
        assert!(good["confidence_avg"].is_null());
        assert!(good.get("suggested_fix").is_none());
        assert!(good["user_fix"].is_null());
        assert_eq!(good["final_fix"], "KEEP");
        assert!(good["outputs"].as_object().unwrap().is_empty());
        assert!(good.get("bridge_allowed").is_none());

        let shaky = &value["segments"][1];
        assert_eq!(shaky["type"], "SHAKY");
        assert_eq!(shaky["suggested_fix"], "STABILIZE");
        assert_eq!(shaky["final_fix"], "STABILIZE");
    }

    #[test]
    fn test_valid_plan_has_no_issues() {
        let plan = EditPlan::new("s", 1, &sample_segments());
        assert!(plan.validate().is_empty());
    }

    #[test]
    fn test_validate_reports_gap_and_bad_keep() {
        let mut plan = EditPlan::new("s", 1, &sample_segments());
        plan.segments[1].start = 3.5;
        plan.segments[0].final_fix = FinalFix::Cut;

        let errors = plan.validate();
        assert!(errors.iter().any(|e| e.contains("seg_0001 starts at 3.5")));
        assert!(errors.iter().any(|e| e.contains("must be KEEP")));
    }

    #[test]
    fn test_validate_reports_stale_final_fix() {
        let mut plan = EditPlan::new("s", 1, &sample_segments());
        plan.segments[1].user_fix = Some(Fix::Cut);

        let errors = plan.validate();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("does not match"));
    }

    #[test]
    fn test_empty_plan_is_invalid() {
        let plan = EditPlan::new("s", 1, &[]);
        assert_eq!(plan.validate(), vec!["Plan has no segments".to_string()]);

        let err = plan.ensure_valid().unwrap_err();
        assert!(matches!(err, PlanError::ValidationError { ref message } if message.contains("no segments")));
        assert!(EditPlan::new("s", 1, &sample_segments()).ensure_valid().is_ok());
    }

    #[test]
    fn test_save_and_load() {
        let dir = std::env::temp_dir().join("steadycut_test_plan");
        let _ = std::fs::remove_dir_all(&dir);
        let path = dir.join("plan.json");

        let mut plan = EditPlan::new("persist", 1, &sample_segments());
        plan.recording = Some(RecordingRef::new("take1.mp4"));
        plan.save(&path).unwrap();

        let loaded = EditPlan::load(&path).unwrap();
        assert_eq!(loaded.session_id, "persist");
        assert_eq!(loaded.segments.len(), 3);
        assert_eq!(loaded.recording.unwrap().path, "take1.mp4");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_shaky_secs() {
        let plan = EditPlan::new("s", 1, &sample_segments());
        assert!((plan.shaky_secs() - 3.0).abs() < 1e-9);
    }
}
