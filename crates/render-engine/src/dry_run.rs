//! A backend that reports what it would produce without touching media.

use std::path::PathBuf;

use steadycut_common::error::{SteadyError, SteadyResult};
use steadycut_plan_model::segment::Fix;

use crate::dispatcher::{RemediationBackend, RenderedOutput};
use crate::job::RemediationJob;

/// Dry-run renderer for one fix.
#[derive(Debug, Clone)]
pub struct DryRunBackend {
    fix: Fix,
    output_dir: PathBuf,
}

impl DryRunBackend {
    pub fn new(fix: Fix, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            fix,
            output_dir: output_dir.into(),
        }
    }

    /// One backend per fix, all writing under `output_dir`.
    pub fn full_set(output_dir: impl Into<PathBuf>) -> Vec<Self> {
        let output_dir = output_dir.into();
        [Fix::Cut, Fix::Stabilize, Fix::Bridge]
            .into_iter()
            .map(|fix| Self::new(fix, output_dir.clone()))
            .collect()
    }
}

/// `outputs` key for a fix's artifact.
pub fn output_key(fix: Fix) -> &'static str {
    match fix {
        Fix::Cut => "cut",
        Fix::Stabilize => "stabilized",
        Fix::Bridge => "bridged",
    }
}

#[async_trait::async_trait]
impl RemediationBackend for DryRunBackend {
    fn capability(&self) -> Fix {
        self.fix
    }

    fn name(&self) -> &str {
        "dry-run"
    }

    fn is_available(&self) -> bool {
        true
    }

    async fn render(&self, job: &RemediationJob) -> SteadyResult<RenderedOutput> {
        if job.fix() != self.fix {
            return Err(SteadyError::render(format!(
                "{} backend cannot run a {} job",
                self.fix,
                job.fix()
            )));
        }

        let key = output_key(self.fix);
        let path = self
            .output_dir
            .join(format!("{}.{key}.mp4", job.segment_id()));
        let (start, end) = job.span();
        tracing::debug!(
            segment = job.segment_id(),
            start,
            end,
            path = %path.display(),
            "Dry-run remediation"
        );

        Ok(RenderedOutput {
            segment_id: job.segment_id().to_string(),
            key: key.to_string(),
            value: path.display().to_string(),
        })
    }
}
