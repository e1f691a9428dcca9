//! Timed caption text.

use serde::{Deserialize, Serialize};

/// A single caption cue with timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionCue {
    /// Start time in seconds.
    pub start_secs: f64,
    /// End time in seconds.
    pub end_secs: f64,
    /// Spoken text.
    pub text: String,
    /// Confidence score [0.0, 1.0] (if available).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

/// Result of a transcription job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    /// Detected language (ISO 639-1).
    pub language: String,
    pub cues: Vec<CaptionCue>,
}

impl CaptionCue {
    pub fn new(start_secs: f64, end_secs: f64, text: impl Into<String>) -> Self {
        Self {
            start_secs,
            end_secs,
            text: text.into(),
            confidence: None,
        }
    }

    /// Whether the cue has usable timing and text.
    pub fn is_valid(&self) -> bool {
        self.start_secs.is_finite()
            && self.end_secs.is_finite()
            && self.start_secs >= 0.0
            && self.end_secs > self.start_secs
            && !self.text.trim().is_empty()
    }
}

impl Transcript {
    /// Drop unusable cues and order the rest by start time.
    pub fn normalized(mut self) -> Self {
        self.cues.retain(CaptionCue::is_valid);
        self.cues
            .sort_by(|a, b| a.start_secs.total_cmp(&b.start_secs));
        self
    }
}
