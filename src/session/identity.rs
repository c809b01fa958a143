use chrono::Utc;
use std::sync::atomic::{AtomicI64, Ordering};

/// Generates participant identities of the form `<prefix>_<micros>`.
///
/// Values come from the wall clock in microseconds and are forced to be
/// strictly increasing, so two attempts never share an identity even when
/// the clock stalls or steps back.
#[derive(Debug)]
pub struct ParticipantIdentityGenerator {
    prefix: String,
    last: AtomicI64,
}

impl ParticipantIdentityGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            last: AtomicI64::new(0),
        }
    }

    pub fn next_identity(&self) -> String {
        let now = Utc::now().timestamp_micros();
        let value = match self
            .last
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now.max(last + 1))
            }) {
            Ok(last) | Err(last) => now.max(last + 1),
        };

        format!("{}_{}", self.prefix, value)
    }
}
