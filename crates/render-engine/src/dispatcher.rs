//! Capability-indexed routing of remediation jobs.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use steadycut_common::error::{SteadyError, SteadyResult};
use steadycut_plan_model::segment::Fix;

use crate::job::RemediationJob;

/// Artifact produced for one segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedOutput {
    pub segment_id: String,
    /// Key under the segment's `outputs` map (e.g. `stabilized`).
    pub key: String,
    /// Path or URL of the artifact.
    pub value: String,
}

/// A renderer for one kind of fix (ffmpeg, a generation API, ...).
#[async_trait::async_trait]
pub trait RemediationBackend: Send + Sync {
    /// The fix this backend performs.
    fn capability(&self) -> Fix;

    /// Backend name.
    fn name(&self) -> &str;

    /// Check if this backend can run right now.
    fn is_available(&self) -> bool;

    /// Execute one job.
    async fn render(&self, job: &RemediationJob) -> SteadyResult<RenderedOutput>;
}

/// Routes each job to the backend registered for its fix.
#[derive(Default)]
pub struct RemediationDispatcher {
    backends: HashMap<Fix, Arc<dyn RemediationBackend>>,
}

impl RemediationDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a backend under its capability. Returns the one it replaced.
    pub fn register(
        &mut self,
        backend: Arc<dyn RemediationBackend>,
    ) -> Option<Arc<dyn RemediationBackend>> {
        let fix = backend.capability();
        tracing::debug!(fix = %fix, backend = backend.name(), "Registered remediation backend");
        self.backends.insert(fix, backend)
    }

    /// Fixes with a registered backend, in enum order.
    pub fn capabilities(&self) -> Vec<Fix> {
        let mut fixes: Vec<Fix> = self.backends.keys().copied().collect();
        fixes.sort();
        fixes
    }

    /// Run one job on the backend for its fix.
    pub async fn dispatch(&self, job: &RemediationJob) -> SteadyResult<RenderedOutput> {
        let fix = job.fix();
        let backend = self.backends.get(&fix).ok_or_else(|| {
            SteadyError::precondition(format!("no backend registered for {fix}"))
        })?;

        if !backend.is_available() {
            return Err(SteadyError::precondition(format!(
                "{} backend {} is not available",
                fix,
                backend.name()
            )));
        }

        tracing::info!(
            segment = job.segment_id(),
            fix = %fix,
            backend = backend.name(),
            "Dispatching remediation job"
        );
        backend.render(job).await
    }

    /// Run jobs in order, stopping at the first failure.
    pub async fn dispatch_all(&self, jobs: &[RemediationJob]) -> SteadyResult<Vec<RenderedOutput>> {
        let mut outputs = Vec::with_capacity(jobs.len());
        for job in jobs {
            outputs.push(self.dispatch(job).await?);
        }
        Ok(outputs)
    }
}
