//! List remediation jobs for a plan with dry-run outputs.

use std::path::PathBuf;
use std::sync::Arc;

use steadycut_plan_model::plan::EditPlan;
use steadycut_render_engine::{plan_jobs, DryRunBackend, RemediationDispatcher, RemediationJob};

pub async fn run(path: PathBuf, output_dir: PathBuf) -> anyhow::Result<()> {
    let plan = EditPlan::load(&path).map_err(|e| anyhow::anyhow!("Failed to load plan: {e}"))?;
    plan.ensure_valid()?;
    let jobs = plan_jobs(&plan)?;

    if jobs.is_empty() {
        println!("Nothing to remediate in {}.", plan.session_id);
        return Ok(());
    }

    let mut dispatcher = RemediationDispatcher::new();
    for backend in DryRunBackend::full_set(output_dir) {
        dispatcher.register(Arc::new(backend));
    }
    let outputs = dispatcher.dispatch_all(&jobs).await?;

    println!("Jobs for {}:", plan.session_id);
    for (job, output) in jobs.iter().zip(&outputs) {
        let (start, end) = job.span();
        print!(
            "  {} {:<9} {:>8.2}s - {:>8.2}s",
            job.segment_id(),
            job.fix(),
            start,
            end
        );
        if let RemediationJob::Bridge {
            before_frame_secs,
            after_frame_secs,
            ..
        } = job
        {
            print!("  frames @ {before_frame_secs:.2}s / {after_frame_secs:.2}s");
        }
        println!();
        println!("      {} -> {}", output.key, output.value);
    }

    Ok(())
}
