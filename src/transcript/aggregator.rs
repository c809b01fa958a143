use super::entry::{Clock, Speaker, SystemClock, TranscriptEntry};
use super::policy::SpeakerPolicy;
use crate::session::ConnectionNotice;
use crate::transport::{Participant, TranscriptionSegment};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::debug;

/// Ordered, append-only transcript of the current session.
///
/// Entries are appended in the order notifications are handed in; nothing is
/// buffered or reordered across notifications.
pub struct TranscriptAggregator {
    entries: Vec<TranscriptEntry>,
    clock: Arc<dyn Clock>,
    policy: SpeakerPolicy,
    local_identity: Option<String>,
}

impl TranscriptAggregator {
    pub fn new(policy: SpeakerPolicy) -> Self {
        Self::with_clock(policy, Arc::new(SystemClock))
    }

    pub fn with_clock(policy: SpeakerPolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Vec::new(),
            clock,
            policy,
            local_identity: None,
        }
    }

    /// Start a fresh log for a new session
    pub fn reset(&mut self, local_identity: Option<String>) {
        self.entries.clear();
        self.local_identity = local_identity;
    }

    pub fn timestamp_now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn append(&mut self, speaker: Speaker, text: impl Into<String>) -> &TranscriptEntry {
        let entry = TranscriptEntry::new(speaker, text, self.timestamp_now());
        self.entries.push(entry);
        &self.entries[self.entries.len() - 1]
    }

    /// Append the system line for a connection notice
    pub fn record_notice(&mut self, notice: &ConnectionNotice) {
        self.append(Speaker::System, notice.to_string());
    }

    /// Append one entry per segment, in segment order
    pub fn record_transcription(
        &mut self,
        segments: &[TranscriptionSegment],
        participant: Option<&Participant>,
    ) {
        let speaker = self.policy.classify(
            participant.map(|p| p.identity.as_str()),
            self.local_identity.as_deref(),
        );

        for segment in segments {
            debug!("Transcript [{:?}]: {}", speaker, segment.text);
            self.append(speaker, segment.text.clone());
        }
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
