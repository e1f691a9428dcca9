//! SteadyCut Captions
//!
//! Speech-to-text is an external collaborator; this crate owns the pieces
//! around it:
//! - **Cues:** timed caption text as returned by a transcriber
//! - **Subtitle generation:** SRT/VTT output from cues
//! - **Transcriber:** the async interface a speech-to-text backend implements

pub mod cue;
pub mod subtitles;
pub mod transcriber;

pub use cue::*;
pub use subtitles::*;
pub use transcriber::*;
