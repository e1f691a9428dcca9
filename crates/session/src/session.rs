//! One session's mutable record and its recompute cycle.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use steadycut_captions::{captions_ref, CaptionCue, Transcript};
use steadycut_common::config::PipelineConfig;
use steadycut_common::error::{SteadyError, SteadyResult};
use steadycut_plan_model::plan::{EditPlan, RecordingRef};
use steadycut_plan_model::segment::{Fix, Segment, SmoothedTick};
use steadycut_plan_model::tick::{RawTickInput, Tick};
use steadycut_processing_core::run_pipeline;

use crate::overrides::OverrideTable;

/// Boundary tolerance when matching segments across recomputes.
const SPAN_EPSILON: f64 = 1e-9;

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Started, no ticks yet.
    Idle,
    /// Receiving ticks.
    Recording,
    /// Finalized; only user fixes, outputs and captions change from here.
    Stopped,
}

/// State of the caption background job.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CaptionStatus {
    NotRequested,
    Running,
    Ready {
        language: String,
        cues: Vec<CaptionCue>,
    },
    Error {
        message: String,
    },
}

/// Read-only view of a session, returned by every store operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub session_id: String,
    pub status: SessionStatus,
    pub tick_count: usize,
    /// End of the last segment in seconds.
    pub duration: f64,
    pub smoothed: Vec<SmoothedTick>,
    pub segments: Vec<Segment>,
    pub recording: Option<RecordingRef>,
    pub captions: CaptionStatus,
    /// Messages raised by the most recent mutation.
    pub warnings: Vec<String>,
    pub updated_at: DateTime<Utc>,
}

/// A session's full mutable state.
///
/// Not synchronized; the store wraps each one in its own lock.
pub struct Session {
    id: String,
    status: SessionStatus,
    config: Arc<PipelineConfig>,
    ticks: Vec<Tick>,
    smoothed: Vec<SmoothedTick>,
    segments: Vec<Segment>,
    overrides: OverrideTable,
    recording: Option<RecordingRef>,
    captions: CaptionStatus,
    warnings: Vec<String>,
    updated_at: DateTime<Utc>,
}

impl Session {
    /// Create an idle session.
    pub fn new(id: impl Into<String>, config: Arc<PipelineConfig>) -> Self {
        Self {
            id: id.into(),
            status: SessionStatus::Idle,
            config,
            ticks: vec![],
            smoothed: vec![],
            segments: vec![],
            overrides: OverrideTable::new(),
            recording: None,
            captions: CaptionStatus::NotRequested,
            warnings: vec![],
            updated_at: Utc::now(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn recording(&self) -> Option<&RecordingRef> {
        self.recording.as_ref()
    }

    pub fn captions(&self) -> &CaptionStatus {
        &self.captions
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Ingest one classification and recompute.
    pub fn append_tick(&mut self, input: &RawTickInput) -> SteadyResult<()> {
        if self.status == SessionStatus::Stopped {
            return Err(SteadyError::precondition(format!(
                "session {} is stopped",
                self.id
            )));
        }

        let previous_ts = self.ticks.last().map(|t| t.ts).unwrap_or(0.0);
        if !input.ts.is_finite() || input.ts <= previous_ts {
            return Err(SteadyError::invalid_input(format!(
                "tick ts {} must be finite and greater than {previous_ts}",
                input.ts
            )));
        }

        self.begin_mutation();
        let tick = Tick::ingest(self.ticks.len() as u64 + 1, input);
        if let Some(error) = &tick.parse_error {
            tracing::warn!(
                session_id = %self.id,
                tick = tick.tick,
                error = %error,
                "Unparseable classification; using safe default"
            );
            self.warnings.push(format!("tick {}: {error}", tick.tick));
        }
        self.ticks.push(tick);
        self.status = SessionStatus::Recording;
        self.recompute();
        Ok(())
    }

    /// Record a user override on a SHAKY segment. Segments are not rebuilt.
    pub fn set_user_fix(&mut self, segment_id: &str, fix: Fix) -> SteadyResult<()> {
        let index = self.segment_index(segment_id)?;
        let (is_shaky, bridge_allowed) = {
            let segment = &self.segments[index];
            (segment.is_shaky(), segment.bridge_allowed)
        };

        if !is_shaky {
            return Err(SteadyError::invalid_input(format!(
                "segment {segment_id} is GOOD; only SHAKY segments take a fix"
            )));
        }
        if fix == Fix::Bridge && !bridge_allowed {
            return Err(SteadyError::precondition(format!(
                "BRIDGE is not allowed for segment {segment_id}"
            )));
        }

        self.begin_mutation();
        self.overrides.set(&self.segments[index], fix);
        let segment = &mut self.segments[index];
        segment.user_fix = Some(fix);
        segment.resolve_final_fix();

        tracing::info!(
            session_id = %self.id,
            segment = segment_id,
            fix = %fix,
            "User fix set"
        );
        Ok(())
    }

    /// Finalize the session and run the last recompute with the recording known.
    pub fn stop(&mut self, recording: Option<RecordingRef>) -> SteadyResult<()> {
        if self.status == SessionStatus::Stopped {
            return Err(SteadyError::precondition(format!(
                "session {} is already stopped",
                self.id
            )));
        }

        self.begin_mutation();
        self.recording = recording;
        self.status = SessionStatus::Stopped;
        self.recompute();

        tracing::info!(
            session_id = %self.id,
            ticks = self.ticks.len(),
            segments = self.segments.len(),
            has_recording = self.recording.is_some(),
            "Session stopped"
        );
        Ok(())
    }

    /// Store a render artifact reference on a segment.
    pub fn attach_output(
        &mut self,
        segment_id: &str,
        key: &str,
        value: impl Into<String>,
    ) -> SteadyResult<()> {
        if key.trim().is_empty() {
            return Err(SteadyError::invalid_input("output key must not be empty"));
        }
        let index = self.segment_index(segment_id)?;

        self.begin_mutation();
        self.segments[index]
            .outputs
            .insert(key.to_string(), value.into());
        Ok(())
    }

    /// Mark a caption job as started. Returns false if one is already running.
    pub fn begin_captions(&mut self) -> SteadyResult<bool> {
        if self.status != SessionStatus::Stopped {
            return Err(SteadyError::precondition(format!(
                "session {} must be stopped before captioning",
                self.id
            )));
        }
        if self.recording.is_none() {
            return Err(SteadyError::precondition(format!(
                "session {} has no recording to caption",
                self.id
            )));
        }
        if self.captions == CaptionStatus::Running {
            return Ok(false);
        }

        self.begin_mutation();
        self.captions = CaptionStatus::Running;
        Ok(true)
    }

    /// Store the outcome of a caption job.
    pub fn finish_captions(&mut self, result: SteadyResult<Transcript>) {
        self.captions = match result {
            Ok(transcript) => {
                tracing::info!(
                    session_id = %self.id,
                    language = %transcript.language,
                    cues = transcript.cues.len(),
                    "Captions ready"
                );
                CaptionStatus::Ready {
                    language: transcript.language,
                    cues: transcript.cues,
                }
            }
            Err(e) => {
                tracing::warn!(session_id = %self.id, error = %e, "Caption generation failed");
                CaptionStatus::Error {
                    message: e.to_string(),
                }
            }
        };
        self.updated_at = Utc::now();
    }

    /// Project the session into an edit plan. `None` while idle.
    pub fn edit_plan(&self, ticks_hz: u32) -> Option<EditPlan> {
        // A session stopped before its first tick never produced a timeline.
        if self.status == SessionStatus::Idle || self.segments.is_empty() {
            return None;
        }

        let mut plan = EditPlan::new(&self.id, ticks_hz, &self.segments);
        plan.recording = self.recording.clone();
        if let CaptionStatus::Ready { language, cues } = &self.captions {
            plan.captions = Some(captions_ref(&Transcript {
                language: language.clone(),
                cues: cues.clone(),
            }));
        }
        Some(plan)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.id.clone(),
            status: self.status,
            tick_count: self.ticks.len(),
            duration: self.segments.last().map(|s| s.end).unwrap_or(0.0),
            smoothed: self.smoothed.clone(),
            segments: self.segments.clone(),
            recording: self.recording.clone(),
            captions: self.captions.clone(),
            warnings: self.warnings.clone(),
            updated_at: self.updated_at,
        }
    }

    fn begin_mutation(&mut self) {
        self.warnings.clear();
        self.updated_at = Utc::now();
    }

    fn segment_index(&self, segment_id: &str) -> SteadyResult<usize> {
        self.segments
            .iter()
            .position(|s| s.id == segment_id)
            .ok_or_else(|| SteadyError::not_found("segment", segment_id))
    }

    /// Rebuild everything from the tick log, then re-apply user state.
    fn recompute(&mut self) {
        let has_recording = self.recording.is_some();
        let output = run_pipeline(&self.ticks, has_recording, &self.config);
        let mut segments = output.segments;

        let mut warnings = self.overrides.reattach(&mut segments);

        for segment in segments.iter_mut() {
            if segment.user_fix == Some(Fix::Bridge) && !segment.bridge_allowed {
                self.overrides.clear(segment);
                segment.user_fix = None;
                let message = format!(
                    "BRIDGE on {} is no longer allowed; reverted to {}",
                    segment.id,
                    segment
                        .suggested_fix
                        .map(|f| f.to_string())
                        .unwrap_or_else(|| "KEEP".to_string())
                );
                tracing::warn!(session_id = %self.id, segment = %segment.id, "{message}");
                warnings.push(message);
            }
            segment.resolve_final_fix();
            carry_outputs(segment, &self.segments);
        }

        tracing::debug!(
            session_id = %self.id,
            ticks = self.ticks.len(),
            segments = segments.len(),
            overrides = self.overrides.len(),
            "Session recomputed"
        );

        self.smoothed = output.smoothed;
        self.segments = segments;
        self.warnings.extend(warnings);
    }
}

/// Keep outputs only for a segment whose type and bounds did not change.
fn carry_outputs(segment: &mut Segment, previous: &[Segment]) {
    if let Some(old) = previous.iter().find(|old| {
        old.segment_type == segment.segment_type
            && (old.start - segment.start).abs() < SPAN_EPSILON
            && (old.end - segment.end).abs() < SPAN_EPSILON
    }) {
        segment.outputs = old.outputs.clone();
    }
}
