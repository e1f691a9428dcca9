//! Replay a tick log into a session and write the edit plan.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use steadycut_captions::SidecarTranscriber;
use steadycut_common::config::AppConfig;
use steadycut_plan_model::plan::RecordingRef;
use steadycut_plan_model::segment::Segment;
use steadycut_plan_model::tick::{parse_ticks, RawTickInput};
use steadycut_processing_core::segment_stats;
use steadycut_session::{CaptionStatus, SessionStore};

/// How long to wait for the caption job before writing the plan without it.
const CAPTION_WAIT: Duration = Duration::from_secs(30);

pub async fn run(
    config: &AppConfig,
    ticks_path: PathBuf,
    recording: Option<String>,
    output: Option<PathBuf>,
    captions: bool,
) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(&ticks_path)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {e}", ticks_path.display()))?;
    let records = parse_ticks(&content)
        .map_err(|e| anyhow::anyhow!("Failed to parse {}: {e}", ticks_path.display()))?;

    let session_id = ticks_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("session")
        .to_string();

    let mut store = SessionStore::new(config)?;
    if captions {
        store = store.with_transcriber(Arc::new(SidecarTranscriber::new()));
    }

    println!("Replaying {} tick(s) from {}", records.len(), ticks_path.display());
    store.start(&session_id).await?;
    for record in records {
        let snapshot = store
            .append_tick(&session_id, RawTickInput::from(record))
            .await?;
        for warning in &snapshot.warnings {
            println!("  warning: {warning}");
        }
    }

    let snapshot = store
        .stop(&session_id, recording.map(RecordingRef::new))
        .await?;
    for warning in &snapshot.warnings {
        println!("  warning: {warning}");
    }

    if captions {
        store.generate_captions(&session_id).await?;
        match wait_for_captions(&store, &session_id).await? {
            CaptionStatus::Ready { cues, .. } => println!("  Captions: {} cue(s)", cues.len()),
            CaptionStatus::Error { message } => println!("  Captions failed: {message}"),
            _ => println!("  Captions still running; plan written without them"),
        }
    }

    let plan = store
        .compute_edit_plan(&session_id)
        .await
        .ok_or_else(|| anyhow::anyhow!("Session {session_id} produced no plan"))?;

    print_summary(&snapshot.segments);

    let output = output.unwrap_or_else(|| ticks_path.with_extension("plan.json"));
    plan.save(&output)?;
    println!("\nPlan written to {}", output.display());

    Ok(())
}

async fn wait_for_captions(
    store: &SessionStore,
    session_id: &str,
) -> anyhow::Result<CaptionStatus> {
    let deadline = tokio::time::Instant::now() + CAPTION_WAIT;
    loop {
        let status = store.snapshot(session_id).await?.captions;
        if status != CaptionStatus::Running || tokio::time::Instant::now() >= deadline {
            return Ok(status);
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}

fn print_summary(segments: &[Segment]) {
    let stats = segment_stats(segments);
    println!();
    println!("Segments: {}", segments.len());
    println!("  GOOD: {}", stats.good_count);
    println!(
        "  SHAKY: {} ({:.1}s of {:.1}s)",
        stats.shaky_count, stats.shaky_secs, stats.total_secs
    );
    println!("  Bridge-eligible: {}", stats.bridge_eligible);
}
