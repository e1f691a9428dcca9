//! SteadyCut Render Engine
//!
//! Turns an edit plan into remediation work and hands each piece to
//! whichever backend handles that fix:
//!
//! ```text
//! EditPlan ── plan_jobs ──► [Cut | Stabilize | Bridge] jobs
//!                                     │
//!                         RemediationDispatcher (by Fix)
//!                          │          │           │
//!                        cut     stabilize     bridge
//!                          └──────────┴───────────┘
//!                                     ▼
//!                          RenderedOutput per segment
//! ```
//!
//! Actual media work (ffmpeg, generation APIs) lives behind the
//! [`RemediationBackend`] trait.

pub mod dispatcher;
pub mod dry_run;
pub mod job;

pub use dispatcher::*;
pub use dry_run::{output_key, DryRunBackend};
pub use job::*;
