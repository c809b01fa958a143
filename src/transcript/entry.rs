use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

/// Who a transcript entry is attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    System,
    User,
    Assistant,
}

/// A single line of the session transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    /// Who said it
    pub speaker: Speaker,

    /// Entry text
    pub text: String,

    /// When this entry was appended
    pub timestamp: DateTime<Utc>,

    /// Local wall-clock time for display (HH:MM:SS)
    pub display_time: String,
}

impl TranscriptEntry {
    pub fn new(speaker: Speaker, text: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            speaker,
            text: text.into(),
            timestamp,
            display_time: timestamp.with_timezone(&Local).format("%H:%M:%S").to_string(),
        }
    }
}

/// Timestamp provider for transcript entries
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock frozen at a fixed instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
