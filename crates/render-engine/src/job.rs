//! Remediation job descriptions derived from an edit plan.

use serde::{Deserialize, Serialize};

use steadycut_common::error::{SteadyError, SteadyResult};
use steadycut_plan_model::plan::{EditPlan, PlanSegment};
use steadycut_plan_model::segment::{FinalFix, Fix, SegmentType};

/// One unit of remediation work for a SHAKY segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RemediationJob {
    /// Drop `[start, end)` from the output.
    Cut {
        segment_id: String,
        start: f64,
        end: f64,
    },
    /// Stabilize `[start, end)` of `source`.
    Stabilize {
        segment_id: String,
        source: String,
        start: f64,
        end: f64,
    },
    /// Replace `[start, end)` with footage generated between two boundary
    /// frames taken from the neighboring GOOD segments.
    Bridge {
        segment_id: String,
        source: String,
        start: f64,
        end: f64,
        before_frame_secs: f64,
        after_frame_secs: f64,
    },
}

impl RemediationJob {
    /// The capability a backend needs to run this job.
    pub fn fix(&self) -> Fix {
        match self {
            Self::Cut { .. } => Fix::Cut,
            Self::Stabilize { .. } => Fix::Stabilize,
            Self::Bridge { .. } => Fix::Bridge,
        }
    }

    pub fn segment_id(&self) -> &str {
        match self {
            Self::Cut { segment_id, .. }
            | Self::Stabilize { segment_id, .. }
            | Self::Bridge { segment_id, .. } => segment_id,
        }
    }

    /// Time range the job covers.
    pub fn span(&self) -> (f64, f64) {
        match self {
            Self::Cut { start, end, .. }
            | Self::Stabilize { start, end, .. }
            | Self::Bridge { start, end, .. } => (*start, *end),
        }
    }
}

/// Derive the jobs an edit plan calls for, in timeline order.
///
/// KEEP segments produce nothing. STABILIZE and BRIDGE need the plan's
/// recording; BRIDGE also needs GOOD segments on both sides.
pub fn plan_jobs(plan: &EditPlan) -> SteadyResult<Vec<RemediationJob>> {
    let source = plan.recording.as_ref().map(|r| r.path.clone());
    let mut jobs = vec![];

    for (i, segment) in plan.segments.iter().enumerate() {
        let job = match segment.final_fix {
            FinalFix::Keep => continue,
            FinalFix::Cut => RemediationJob::Cut {
                segment_id: segment.id.clone(),
                start: segment.start,
                end: segment.end,
            },
            FinalFix::Stabilize => RemediationJob::Stabilize {
                segment_id: segment.id.clone(),
                source: require_source(&source, segment)?,
                start: segment.start,
                end: segment.end,
            },
            FinalFix::Bridge => {
                let (before, after) = bridge_frames(&plan.segments, i)?;
                RemediationJob::Bridge {
                    segment_id: segment.id.clone(),
                    source: require_source(&source, segment)?,
                    start: segment.start,
                    end: segment.end,
                    before_frame_secs: before,
                    after_frame_secs: after,
                }
            }
        };
        jobs.push(job);
    }

    tracing::debug!(
        session_id = %plan.session_id,
        jobs = jobs.len(),
        "Planned remediation jobs"
    );
    Ok(jobs)
}

fn require_source(source: &Option<String>, segment: &PlanSegment) -> SteadyResult<String> {
    source.clone().ok_or_else(|| {
        SteadyError::precondition(format!(
            "{} needs a recording for {}",
            segment.id, segment.final_fix
        ))
    })
}

/// Last moment of the previous GOOD segment and first of the next one.
fn bridge_frames(segments: &[PlanSegment], index: usize) -> SteadyResult<(f64, f64)> {
    let is_good = |s: &&PlanSegment| s.segment_type == SegmentType::Good;
    let prev = index
        .checked_sub(1)
        .and_then(|i| segments.get(i))
        .filter(is_good);
    let next = segments.get(index + 1).filter(is_good);

    match (prev, next) {
        (Some(prev), Some(next)) => Ok((prev.end, next.start)),
        _ => Err(SteadyError::precondition(format!(
            "{} is not between two GOOD segments; cannot BRIDGE",
            segments[index].id
        ))),
    }
}
