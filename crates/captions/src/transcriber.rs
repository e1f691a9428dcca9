//! Speech-to-text collaborator interface.

use std::path::PathBuf;

use steadycut_common::error::{SteadyError, SteadyResult};
use steadycut_plan_model::plan::RecordingRef;

use crate::cue::Transcript;

/// A backend that turns a recording's audio into timed cues.
#[async_trait::async_trait]
pub trait Transcriber: Send + Sync {
    /// Backend name for logs.
    fn name(&self) -> &str;

    /// Transcribe the recording. May take a long time.
    async fn transcribe(&self, recording: &RecordingRef) -> SteadyResult<Transcript>;
}

/// Reads a transcript prepared out of band, stored as JSON next to the
/// recording (`<recording>.captions.json`).
#[derive(Debug, Clone, Default)]
pub struct SidecarTranscriber;

impl SidecarTranscriber {
    pub fn new() -> Self {
        Self
    }

    /// Where the sidecar for `recording` is expected.
    pub fn sidecar_path(recording: &RecordingRef) -> PathBuf {
        PathBuf::from(format!("{}.captions.json", recording.path))
    }
}

#[async_trait::async_trait]
impl Transcriber for SidecarTranscriber {
    fn name(&self) -> &str {
        "sidecar"
    }

    async fn transcribe(&self, recording: &RecordingRef) -> SteadyResult<Transcript> {
        let path = Self::sidecar_path(recording);
        tracing::debug!(path = %path.display(), "Reading caption sidecar");

        let content = tokio::fs::read_to_string(&path).await.map_err(|e| {
            SteadyError::captions(format!("cannot read {}: {e}", path.display()))
        })?;
        let transcript: Transcript = serde_json::from_str(&content)?;
        Ok(transcript.normalized())
    }
}
