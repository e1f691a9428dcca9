use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Notify;

use steadycut_captions::{CaptionCue, Transcriber, Transcript};
use steadycut_common::config::AppConfig;
use steadycut_common::error::{ErrorKind, SteadyError, SteadyResult};
use steadycut_plan_model::plan::RecordingRef;
use steadycut_plan_model::segment::{FinalFix, Fix, SegmentType};
use steadycut_plan_model::tick::RawTickInput;
use steadycut_session::{CaptionStatus, SessionStatus, SessionStore};

/// Blocks until released, counting how many jobs it was asked to run.
struct GatedTranscriber {
    calls: AtomicUsize,
    release: Notify,
    fail: bool,
}

impl GatedTranscriber {
    fn new(fail: bool) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            release: Notify::new(),
            fail,
        })
    }
}

#[async_trait::async_trait]
impl Transcriber for GatedTranscriber {
    fn name(&self) -> &str {
        "gated"
    }

    async fn transcribe(&self, _recording: &RecordingRef) -> SteadyResult<Transcript> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.release.notified().await;
        if self.fail {
            return Err(SteadyError::captions("speech service returned 503"));
        }
        Ok(Transcript {
            language: "en".to_string(),
            cues: vec![CaptionCue::new(0.5, 2.5, "keep walking")],
        })
    }
}

/// Panics on every call.
struct PanickingTranscriber {
    calls: AtomicUsize,
}

#[async_trait::async_trait]
impl Transcriber for PanickingTranscriber {
    fn name(&self) -> &str {
        "panicking"
    }

    async fn transcribe(&self, _recording: &RecordingRef) -> SteadyResult<Transcript> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        panic!("decoder crashed");
    }
}

async fn replay_burst(store: &SessionStore, session_id: &str) {
    store.start(session_id).await.unwrap();
    for ts in 1..=10 {
        let (shaky, confidence) = if (3..=5).contains(&ts) {
            (true, 0.6)
        } else {
            (false, 0.2)
        };
        store
            .append_tick(
                session_id,
                RawTickInput::classified(ts as f64, shaky, confidence),
            )
            .await
            .unwrap();
    }
}

async fn wait_for_captions(store: &SessionStore, session_id: &str) -> CaptionStatus {
    for _ in 0..200 {
        let status = store.snapshot(session_id).await.unwrap().captions;
        if status != CaptionStatus::Running {
            return status;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("caption job did not finish");
}

#[tokio::test]
async fn start_rejects_duplicates_and_empty_ids() {
    let store = SessionStore::with_defaults();
    let snapshot = store.start("cam-1").await.unwrap();
    assert_eq!(snapshot.status, SessionStatus::Idle);

    let err = store.start("cam-1").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PreconditionFailed);

    let err = store.start("  ").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

#[tokio::test]
async fn unknown_session_is_not_found() {
    let store = SessionStore::with_defaults();
    let err = store
        .append_tick("ghost", RawTickInput::classified(1.0, false, 0.1))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = store
        .set_user_fix("ghost", "seg_0000", Fix::Cut)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    assert!(store.compute_edit_plan("ghost").await.is_none());
}

#[tokio::test]
async fn idle_session_has_no_plan() {
    let store = SessionStore::with_defaults();
    store.start("cam-1").await.unwrap();
    assert!(store.compute_edit_plan("cam-1").await.is_none());
}

#[tokio::test]
async fn session_stopped_before_any_tick_has_no_plan() {
    let store = SessionStore::with_defaults();
    store.start("cam-1").await.unwrap();
    let snapshot = store.stop("cam-1", None).await.unwrap();
    assert_eq!(snapshot.status, SessionStatus::Stopped);
    assert_eq!(snapshot.duration, 0.0);
    assert!(store.compute_edit_plan("cam-1").await.is_none());
}

#[tokio::test]
async fn end_to_end_plan_wire_shape() {
    let store = SessionStore::with_defaults();
    replay_burst(&store, "walk").await;
    store
        .stop("walk", Some(RecordingRef::new("uploads/walk.mp4")))
        .await
        .unwrap();

    let plan = store.compute_edit_plan("walk").await.unwrap();
    assert!(plan.validate().is_empty());
    assert_eq!(plan.duration, 10.0);
    assert_eq!(plan.ticks_hz, 1);

    let json = serde_json::to_value(&plan).unwrap();
    assert_eq!(json["version"], 1);
    assert_eq!(json["session_id"], "walk");

    let segments = json["segments"].as_array().unwrap();
    assert_eq!(segments.len(), 3);
    assert_eq!(segments[0]["id"], "seg_0000");
    assert_eq!(segments[0]["type"], "GOOD");
    assert_eq!(segments[0]["final_fix"], "KEEP");
    assert!(segments[0]["confidence_avg"].is_null());
    assert!(segments[0].get("suggested_fix").is_none());
    assert!(segments[0]["user_fix"].is_null());

    assert_eq!(segments[1]["type"], "SHAKY");
    assert_eq!(segments[1]["start"], 3.0);
    assert_eq!(segments[1]["end"], 6.0);
    assert_eq!(segments[1]["suggested_fix"], "STABILIZE");
    assert_eq!(segments[1]["final_fix"], "STABILIZE");
    assert!(segments[1]["outputs"].as_object().unwrap().is_empty());
}

#[tokio::test]
async fn user_fix_flows_into_plan() {
    let store = SessionStore::with_defaults();
    replay_burst(&store, "walk").await;

    let snapshot = store.set_user_fix("walk", "seg_0001", Fix::Cut).await.unwrap();
    assert_eq!(snapshot.segments[1].final_fix, FinalFix::Cut);

    // A later tick rebuilds segments; the override follows.
    let snapshot = store
        .append_tick("walk", RawTickInput::classified(11.0, false, 0.2))
        .await
        .unwrap();
    assert_eq!(snapshot.segments[1].user_fix, Some(Fix::Cut));

    store.stop("walk", None).await.unwrap();
    let plan = store.compute_edit_plan("walk").await.unwrap();
    assert_eq!(plan.segments[1].final_fix, FinalFix::Cut);
    assert_eq!(plan.segments[1].user_fix, Some(Fix::Cut));
}

#[tokio::test]
async fn attach_output_appears_in_plan() {
    let store = SessionStore::with_defaults();
    replay_burst(&store, "walk").await;
    store.stop("walk", None).await.unwrap();
    store
        .attach_output("walk", "seg_0001", "stabilized", "renders/seg_0001.mp4")
        .await
        .unwrap();

    let plan = store.compute_edit_plan("walk").await.unwrap();
    assert_eq!(
        plan.segments[1].outputs.get("stabilized").map(String::as_str),
        Some("renders/seg_0001.mp4")
    );

    let err = store
        .attach_output("walk", "seg_0009", "stabilized", "x")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn sessions_progress_in_parallel() {
    let store = Arc::new(SessionStore::with_defaults());
    let mut handles = vec![];

    for n in 0..8 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            let id = format!("cam-{n}");
            store.start(&id).await.unwrap();
            for ts in 1..=30 {
                let shaky = ts % 7 < 3;
                store
                    .append_tick(&id, RawTickInput::classified(ts as f64, shaky, 0.5))
                    .await
                    .unwrap();
            }
            id
        }));
    }

    for handle in handles {
        let id = handle.await.unwrap();
        let snapshot = store.snapshot(&id).await.unwrap();
        assert_eq!(snapshot.tick_count, 30);
        assert_eq!(snapshot.duration, 30.0);
    }
    assert_eq!(store.session_ids().await.len(), 8);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn readers_never_see_a_torn_timeline() {
    let store = Arc::new(SessionStore::with_defaults());
    store.start("cam").await.unwrap();

    let writer = {
        let store = Arc::clone(&store);
        tokio::spawn(async move {
            for ts in 1..=60 {
                let shaky = (ts / 4) % 2 == 1;
                store
                    .append_tick("cam", RawTickInput::classified(ts as f64, shaky, 0.4))
                    .await
                    .unwrap();
            }
        })
    };

    for _ in 0..60 {
        let snapshot = store.snapshot("cam").await.unwrap();
        assert_eq!(snapshot.smoothed.len(), snapshot.tick_count);
        if let Some(last) = snapshot.segments.last() {
            assert_eq!(last.end, snapshot.tick_count as f64);
        }
        for pair in snapshot.segments.windows(2) {
            assert_eq!(pair[1].start, pair[0].end);
        }
        tokio::task::yield_now().await;
    }

    writer.await.unwrap();
}

#[tokio::test]
async fn captions_dedupe_in_flight_job() {
    let transcriber = GatedTranscriber::new(false);
    let store = SessionStore::with_defaults().with_transcriber(transcriber.clone());
    replay_burst(&store, "walk").await;
    store
        .stop("walk", Some(RecordingRef::new("uploads/walk.mp4")))
        .await
        .unwrap();

    assert_eq!(
        store.generate_captions("walk").await.unwrap(),
        CaptionStatus::Running
    );
    assert_eq!(
        store.generate_captions("walk").await.unwrap(),
        CaptionStatus::Running
    );

    // Let the spawned job reach the gate.
    while transcriber.calls.load(Ordering::SeqCst) == 0 {
        tokio::task::yield_now().await;
    }
    transcriber.release.notify_one();

    let status = wait_for_captions(&store, "walk").await;
    assert!(matches!(status, CaptionStatus::Ready { ref language, .. } if language == "en"));
    assert_eq!(transcriber.calls.load(Ordering::SeqCst), 1);

    let plan = store.compute_edit_plan("walk").await.unwrap();
    let captions = plan.captions.unwrap();
    assert_eq!(captions.cue_count, 1);
    assert!(captions.content.contains("keep walking"));
}

#[tokio::test]
async fn caption_failure_leaves_error_status() {
    let transcriber = GatedTranscriber::new(true);
    let store = SessionStore::with_defaults().with_transcriber(transcriber.clone());
    replay_burst(&store, "walk").await;
    store
        .stop("walk", Some(RecordingRef::new("uploads/walk.mp4")))
        .await
        .unwrap();

    store.generate_captions("walk").await.unwrap();
    while transcriber.calls.load(Ordering::SeqCst) == 0 {
        tokio::task::yield_now().await;
    }
    transcriber.release.notify_one();

    let status = wait_for_captions(&store, "walk").await;
    assert!(matches!(status, CaptionStatus::Error { ref message } if message.contains("503")));

    // The session itself is untouched.
    let snapshot = store.snapshot("walk").await.unwrap();
    assert_eq!(snapshot.status, SessionStatus::Stopped);
    assert_eq!(snapshot.segments[1].segment_type, SegmentType::Shaky);
}

#[tokio::test]
async fn caption_job_panic_leaves_error_status_and_allows_retry() {
    let transcriber = Arc::new(PanickingTranscriber {
        calls: AtomicUsize::new(0),
    });
    let store = SessionStore::with_defaults().with_transcriber(transcriber.clone());
    replay_burst(&store, "walk").await;
    store
        .stop("walk", Some(RecordingRef::new("uploads/walk.mp4")))
        .await
        .unwrap();

    store.generate_captions("walk").await.unwrap();
    let status = wait_for_captions(&store, "walk").await;
    assert!(matches!(status, CaptionStatus::Error { ref message } if message.contains("aborted")));

    // A failed job does not block a new request.
    let status = store.generate_captions("walk").await.unwrap();
    assert_eq!(status, CaptionStatus::Running);
    let status = wait_for_captions(&store, "walk").await;
    assert!(matches!(status, CaptionStatus::Error { .. }));
    assert_eq!(transcriber.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn captions_need_recording_and_transcriber() {
    let store = SessionStore::with_defaults();
    replay_burst(&store, "walk").await;
    store.stop("walk", None).await.unwrap();
    let err = store.generate_captions("walk").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PreconditionFailed);

    let store = SessionStore::with_defaults().with_transcriber(GatedTranscriber::new(false));
    replay_burst(&store, "walk").await;
    let err = store.generate_captions("walk").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PreconditionFailed, "still recording");
}

#[tokio::test]
async fn eviction_and_removal() {
    let mut config = AppConfig::default();
    config.sessions.idle_ttl_secs = 60;
    let store = SessionStore::new(&config).unwrap();
    store.start("old").await.unwrap();
    store.start("fresh").await.unwrap();

    assert!(store.evict_idle(Utc::now()).await.is_empty());

    let later = Utc::now() + chrono::Duration::seconds(120);
    let mut evicted = store.evict_idle(later).await;
    evicted.sort();
    assert_eq!(evicted, vec!["fresh".to_string(), "old".to_string()]);
    assert!(store.session_ids().await.is_empty());

    store.start("again").await.unwrap();
    assert!(store.remove("again").await);
    assert!(!store.remove("again").await);
}

#[tokio::test]
async fn invalid_pipeline_config_is_rejected() {
    let mut config = AppConfig::default();
    config.pipeline.smoothing.window = 0;
    assert!(SessionStore::new(&config).is_err());
}
