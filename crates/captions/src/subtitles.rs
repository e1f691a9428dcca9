//! Subtitle generation in SRT and VTT formats.

use std::path::Path;

use steadycut_common::error::SteadyResult;
use steadycut_plan_model::plan::CaptionsRef;

use crate::cue::{CaptionCue, Transcript};

/// Generate SRT subtitle content from caption cues.
pub fn generate_srt(cues: &[CaptionCue]) -> String {
    let mut output = String::new();

    for (i, cue) in cues.iter().enumerate() {
        output.push_str(&format!("{}\n", i + 1));
        output.push_str(&format!(
            "{} --> {}\n",
            format_srt_time(cue.start_secs),
            format_srt_time(cue.end_secs),
        ));
        output.push_str(cue.text.trim());
        output.push_str("\n\n");
    }

    output
}

/// Generate WebVTT subtitle content from caption cues.
pub fn generate_vtt(cues: &[CaptionCue]) -> String {
    let mut output = String::from("WEBVTT\n\n");

    for cue in cues {
        output.push_str(&format!(
            "{} --> {}\n",
            format_vtt_time(cue.start_secs),
            format_vtt_time(cue.end_secs),
        ));
        output.push_str(cue.text.trim());
        output.push_str("\n\n");
    }

    output
}

/// Build the edit-plan captions entry (SRT content).
pub fn captions_ref(transcript: &Transcript) -> CaptionsRef {
    CaptionsRef {
        language: transcript.language.clone(),
        format: "srt".to_string(),
        cue_count: transcript.cues.len(),
        content: generate_srt(&transcript.cues),
    }
}

/// Format seconds as SRT timestamp: HH:MM:SS,mmm
pub fn format_srt_time(secs: f64) -> String {
    let (hours, minutes, seconds, millis) = split_millis(secs);
    format!("{hours:02}:{minutes:02}:{seconds:02},{millis:03}")
}

/// Format seconds as VTT timestamp: HH:MM:SS.mmm
pub fn format_vtt_time(secs: f64) -> String {
    let (hours, minutes, seconds, millis) = split_millis(secs);
    format!("{hours:02}:{minutes:02}:{seconds:02}.{millis:03}")
}

fn split_millis(secs: f64) -> (u64, u64, u64, u64) {
    // Negative and NaN inputs saturate to zero.
    let total_ms = (secs * 1000.0).round() as u64;
    (
        total_ms / 3_600_000,
        (total_ms % 3_600_000) / 60_000,
        (total_ms % 60_000) / 1000,
        total_ms % 1000,
    )
}

/// Save subtitles to a file. `.vtt` writes WebVTT, anything else SRT.
pub fn save_subtitles(cues: &[CaptionCue], path: &Path) -> SteadyResult<()> {
    let content = match path.extension().and_then(|e| e.to_str()) {
        Some("vtt") => generate_vtt(cues),
        _ => generate_srt(cues),
    };
    std::fs::write(path, content)?;
    Ok(())
}
