//! Validate an edit plan.

use std::path::PathBuf;

use steadycut_plan_model::plan::EditPlan;

pub fn run(path: PathBuf) -> anyhow::Result<()> {
    println!("Validating plan at: {}", path.display());

    let plan = EditPlan::load(&path).map_err(|e| anyhow::anyhow!("Failed to load plan: {e}"))?;

    println!("  Session: {}", plan.session_id);
    println!("  Version: {}", plan.version);
    println!("  Duration: {:.1}s", plan.duration);
    println!("  Segments: {}", plan.segments.len());

    let errors = plan.validate();
    if errors.is_empty() {
        println!("\nPlan is valid.");
        return Ok(());
    }

    println!("\nValidation issues:");
    for error in &errors {
        println!("  - {error}");
    }
    anyhow::bail!("{} issue(s) found", errors.len())
}
