//! SteadyCut Plan Model
//!
//! Defines the core data contracts:
//! - **Ticks:** One classification per second of source video, plus the
//!   tolerant parser for the upstream classification payload
//! - **Segments:** Contiguous GOOD/SHAKY time ranges and their fixes
//! - **Edit plan:** The serializable snapshot consumed by renderers and UIs
//!
//! All times are seconds since stream start.

pub mod plan;
pub mod segment;
pub mod tick;

pub use plan::*;
pub use segment::*;
pub use tick::*;
