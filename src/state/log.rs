//! Append-only per-room chat and system event history.

use time::OffsetDateTime;

/// One chat or system entry in a room's history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// Author display name; `None` marks a system message.
    pub author: Option<String>,
    /// Entry text as shown to clients.
    pub text: String,
    /// Monotonic per-room sequence number, never reused.
    pub sequence: u64,
    /// Wall-clock time the entry was appended.
    pub timestamp: OffsetDateTime,
}

/// Ordered sequence of room events, replayed in full to new joiners.
#[derive(Debug, Default)]
pub struct MessageLog {
    entries: Vec<LogEntry>,
    next_sequence: u64,
}

impl MessageLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a system entry (no author).
    pub fn system(&mut self, text: impl Into<String>) {
        self.append(None, text.into());
    }

    /// Append a chat entry authored by a participant.
    pub fn chat(&mut self, author: &str, text: impl Into<String>) {
        self.append(Some(author.to_string()), text.into());
    }

    /// All entries in append order.
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn append(&mut self, author: Option<String>, text: String) {
        let entry = LogEntry {
            author,
            text,
            sequence: self.next_sequence,
            timestamp: OffsetDateTime::now_utc(),
        };
        self.next_sequence += 1;
        self.entries.push(entry);
    }
}
