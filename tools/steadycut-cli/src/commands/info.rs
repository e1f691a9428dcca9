//! Show edit plan information.

use std::path::PathBuf;

use steadycut_plan_model::plan::EditPlan;

pub fn run(path: PathBuf) -> anyhow::Result<()> {
    let plan = EditPlan::load(&path).map_err(|e| anyhow::anyhow!("Failed to load plan: {e}"))?;

    println!("Plan: {}", plan.session_id);
    println!("  Version: {}", plan.version);
    println!("  Duration: {:.1}s @ {} tick/s", plan.duration, plan.ticks_hz);
    match &plan.recording {
        Some(r) => println!("  Recording: {}", r.path),
        None => println!("  Recording: none"),
    }
    if let Some(c) = &plan.captions {
        println!("  Captions: {} cue(s), {} ({})", c.cue_count, c.language, c.format);
    }
    println!("  Shaky: {:.1}s", plan.shaky_secs());
    println!();

    println!("Segments:");
    for s in &plan.segments {
        let confidence = s
            .confidence_avg
            .map(|c| format!("{c:.2}"))
            .unwrap_or_else(|| "-".to_string());
        let user = s
            .user_fix
            .map(|f| format!(" (user {f})"))
            .unwrap_or_default();
        println!(
            "  {} {:>8.2}s - {:>8.2}s  {:<5}  conf {:<4}  {}{}",
            s.id, s.start, s.end, s.segment_type, confidence, s.final_fix, user
        );
        for (key, value) in &s.outputs {
            println!("      {key}: {value}");
        }
    }

    Ok(())
}
