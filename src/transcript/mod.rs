//! Session transcript
//!
//! Turns connection notices and transcription segments into an ordered log
//! of system, user and assistant lines.

mod aggregator;
mod entry;
mod policy;

pub use aggregator::TranscriptAggregator;
pub use entry::{Clock, FixedClock, Speaker, SystemClock, TranscriptEntry};
pub use policy::SpeakerPolicy;
