//! SteadyCut Session Aggregator
//!
//! Owns the mutable side of the system:
//! - **Store:** sessions keyed by id, each behind its own lock
//! - **Session:** tick log, full recompute on every tick or stop, user
//!   overrides, render outputs, caption job state
//! - **Overrides:** user fixes anchored to time spans so they survive
//!   segment rebuilds
//!
//! The edit plan is never stored; it is projected from a session on demand.

pub mod overrides;
pub mod session;
pub mod store;

pub use overrides::{FixOverride, OverrideTable};
pub use session::{CaptionStatus, Session, SessionSnapshot, SessionStatus};
pub use store::SessionStore;
