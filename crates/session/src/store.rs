//! The session repository.
//!
//! Each session sits behind its own async mutex, so mutations of one session
//! are serialized while different sessions proceed in parallel. The map lock
//! is only held long enough to look up or insert an entry.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};

use steadycut_captions::Transcriber;
use steadycut_common::config::{AppConfig, PipelineConfig, SessionDefaults};
use steadycut_common::error::{SteadyError, SteadyResult};
use steadycut_plan_model::plan::{EditPlan, RecordingRef};
use steadycut_plan_model::segment::Fix;
use steadycut_plan_model::tick::RawTickInput;

use crate::session::{CaptionStatus, Session, SessionSnapshot};

type SharedSession = Arc<Mutex<Session>>;

/// Owns every live session.
pub struct SessionStore {
    sessions: RwLock<HashMap<String, SharedSession>>,
    pipeline: Arc<PipelineConfig>,
    defaults: SessionDefaults,
    transcriber: Option<Arc<dyn Transcriber>>,
}

impl SessionStore {
    /// Create a store from the application config.
    pub fn new(config: &AppConfig) -> SteadyResult<Self> {
        config.pipeline.validate()?;
        Ok(Self {
            sessions: RwLock::new(HashMap::new()),
            pipeline: Arc::new(config.pipeline.clone()),
            defaults: config.sessions.clone(),
            transcriber: None,
        })
    }

    /// Store with built-in thresholds.
    pub fn with_defaults() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            pipeline: Arc::new(PipelineConfig::default()),
            defaults: SessionDefaults::default(),
            transcriber: None,
        }
    }

    /// Use `transcriber` for caption jobs.
    pub fn with_transcriber(mut self, transcriber: Arc<dyn Transcriber>) -> Self {
        self.transcriber = Some(transcriber);
        self
    }

    /// Create a new idle session.
    pub async fn start(&self, session_id: &str) -> SteadyResult<SessionSnapshot> {
        if session_id.trim().is_empty() {
            return Err(SteadyError::invalid_input("session id must not be empty"));
        }

        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(session_id) {
            return Err(SteadyError::precondition(format!(
                "session {session_id} already exists"
            )));
        }

        let session = Session::new(session_id, Arc::clone(&self.pipeline));
        let snapshot = session.snapshot();
        sessions.insert(session_id.to_string(), Arc::new(Mutex::new(session)));

        tracing::info!(session_id, "Session started");
        Ok(snapshot)
    }

    /// Ingest one tick and return the recomputed state.
    pub async fn append_tick(
        &self,
        session_id: &str,
        input: RawTickInput,
    ) -> SteadyResult<SessionSnapshot> {
        let session = self.get(session_id).await?;
        let mut session = session.lock().await;
        session.append_tick(&input)?;
        Ok(session.snapshot())
    }

    /// Override the fix on a SHAKY segment.
    pub async fn set_user_fix(
        &self,
        session_id: &str,
        segment_id: &str,
        fix: Fix,
    ) -> SteadyResult<SessionSnapshot> {
        let session = self.get(session_id).await?;
        let mut session = session.lock().await;
        session.set_user_fix(segment_id, fix)?;
        Ok(session.snapshot())
    }

    /// Finalize a session, optionally attaching its recording.
    pub async fn stop(
        &self,
        session_id: &str,
        recording: Option<RecordingRef>,
    ) -> SteadyResult<SessionSnapshot> {
        let session = self.get(session_id).await?;
        let mut session = session.lock().await;
        session.stop(recording)?;
        Ok(session.snapshot())
    }

    /// Project a session into its edit plan. `None` for unknown or idle sessions.
    pub async fn compute_edit_plan(&self, session_id: &str) -> Option<EditPlan> {
        let session = self.get(session_id).await.ok()?;
        let session = session.lock().await;
        session.edit_plan(self.defaults.ticks_hz)
    }

    pub async fn snapshot(&self, session_id: &str) -> SteadyResult<SessionSnapshot> {
        let session = self.get(session_id).await?;
        let session = session.lock().await;
        Ok(session.snapshot())
    }

    /// Record a render artifact on a segment.
    pub async fn attach_output(
        &self,
        session_id: &str,
        segment_id: &str,
        key: &str,
        value: &str,
    ) -> SteadyResult<SessionSnapshot> {
        let session = self.get(session_id).await?;
        let mut session = session.lock().await;
        session.attach_output(segment_id, key, value)?;
        Ok(session.snapshot())
    }

    /// Start caption generation in the background.
    ///
    /// Returns `Running` immediately; a request while a job is in flight
    /// joins that job instead of starting another.
    pub async fn generate_captions(&self, session_id: &str) -> SteadyResult<CaptionStatus> {
        let shared = self.get(session_id).await?;
        let transcriber = self
            .transcriber
            .clone()
            .ok_or_else(|| SteadyError::precondition("no transcriber configured"))?;

        let recording = {
            let mut session = shared.lock().await;
            if !session.begin_captions()? {
                tracing::debug!(session_id, "Caption job already running");
                return Ok(CaptionStatus::Running);
            }
            session
                .recording()
                .cloned()
                .ok_or_else(|| SteadyError::precondition("session has no recording"))?
        };

        tracing::info!(
            session_id,
            transcriber = transcriber.name(),
            recording = %recording.path,
            "Caption job started"
        );

        let job_session = Arc::clone(&shared);
        tokio::spawn(async move {
            // A panicking transcriber still ends in an `Error` status.
            let job = tokio::spawn(async move { transcriber.transcribe(&recording).await });
            let result = match job.await {
                Ok(result) => result,
                Err(e) => Err(SteadyError::captions(format!("caption job aborted: {e}"))),
            };
            job_session.lock().await.finish_captions(result);
        });

        Ok(CaptionStatus::Running)
    }

    /// Drop a session. Returns whether it existed.
    pub async fn remove(&self, session_id: &str) -> bool {
        let removed = self.sessions.write().await.remove(session_id).is_some();
        if removed {
            tracing::info!(session_id, "Session removed");
        }
        removed
    }

    /// Drop sessions idle for longer than the configured TTL.
    ///
    /// Sessions currently locked by an operation are in use and skipped.
    pub async fn evict_idle(&self, now: DateTime<Utc>) -> Vec<String> {
        let ttl_secs = i64::try_from(self.defaults.idle_ttl_secs).unwrap_or(i64::MAX);
        let mut sessions = self.sessions.write().await;

        let expired: Vec<String> = sessions
            .iter()
            .filter_map(|(id, session)| {
                let session = session.try_lock().ok()?;
                let idle_secs = (now - session.updated_at()).num_seconds();
                (idle_secs > ttl_secs).then(|| id.clone())
            })
            .collect();

        for id in &expired {
            sessions.remove(id);
            tracing::info!(session_id = %id, "Evicted idle session");
        }
        expired
    }

    /// Ids of all live sessions, sorted.
    pub async fn session_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.sessions.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    async fn get(&self, session_id: &str) -> SteadyResult<SharedSession> {
        self.sessions
            .read()
            .await
            .get(session_id)
            .cloned()
            .ok_or_else(|| SteadyError::not_found("session", session_id))
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_defaults()
    }
}
