//! In-flight chunked upload session.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of an upload session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// Accepting chunks.
    Receiving,
    /// A merge owns the staged chunks; no further writes are accepted.
    Merging,
}

/// Result of staging one chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ChunkOutcome {
    /// More chunk indices are still missing.
    Pending {
        /// Distinct indices staged so far.
        received: u32,
        /// Indices the session expects.
        expected: u32,
    },
    /// Every index in `0..expected` is staged.
    Complete,
}

impl ChunkOutcome {
    /// Whether the chunk set is complete.
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete)
    }
}

/// Staging state of one chunked upload, keyed by the client's session id.
///
/// Completeness and merge order come from this structure, never from a
/// directory listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadSession {
    /// Client-chosen session identifier (already sanitized).
    pub session_id: String,
    /// Chunk count fixed by the first chunk observed.
    pub expected_chunks: u32,
    /// Staged chunk index → size in bytes.
    chunks: BTreeMap<u32, u64>,
    /// Current lifecycle state.
    pub state: SessionState,
    /// Chunk writes started but not yet finished.
    pub writes_in_flight: u32,
    /// Bytes claimed by the writes in flight.
    pub reserved_bytes: u64,
    /// When the first chunk arrived.
    pub created_at: DateTime<Utc>,
    /// When the session last changed.
    pub updated_at: DateTime<Utc>,
}

impl UploadSession {
    /// Start a session expecting `expected_chunks` chunks.
    pub fn new(session_id: impl Into<String>, expected_chunks: u32) -> Self {
        let now = Utc::now();
        Self {
            session_id: session_id.into(),
            expected_chunks,
            chunks: BTreeMap::new(),
            state: SessionState::Receiving,
            writes_in_flight: 0,
            reserved_bytes: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Record that `index` is staged with `size` bytes, replacing any
    /// earlier size for the same index.
    pub fn record_chunk(&mut self, index: u32, size: u64) {
        self.chunks.insert(index, size);
        self.touch();
    }

    /// Refresh the idle timer.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Number of distinct indices staged.
    pub fn received_count(&self) -> u32 {
        self.chunks.len() as u32
    }

    /// Whether no chunk is staged.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Whether `index` is staged.
    pub fn has_chunk(&self, index: u32) -> bool {
        self.chunks.contains_key(&index)
    }

    /// Whether every index in `0..expected_chunks` is staged.
    pub fn is_complete(&self) -> bool {
        self.expected_chunks > 0
            && self.received_count() == self.expected_chunks
            && self.chunks.keys().all(|i| *i < self.expected_chunks)
    }

    /// Indices in `0..expected_chunks` not yet staged.
    pub fn missing(&self) -> Vec<u32> {
        (0..self.expected_chunks)
            .filter(|i| !self.chunks.contains_key(i))
            .collect()
    }

    /// Staged indices in ascending numeric order.
    pub fn ordered_indices(&self) -> Vec<u32> {
        self.chunks.keys().copied().collect()
    }

    /// Total bytes currently staged.
    pub fn staged_bytes(&self) -> u64 {
        self.chunks.values().sum()
    }

    /// Total bytes staged if `index` were (re)written with `size` bytes.
    pub fn staged_bytes_with(&self, index: u32, size: u64) -> u64 {
        self.staged_bytes() - self.chunks.get(&index).copied().unwrap_or(0) + size
    }

    /// Upper bound of the session's size once every write in flight
    /// lands, if one more write of `size` bytes at `index` is admitted.
    ///
    /// A write replacing a staged index is counted on top of the bytes it
    /// replaces until it finishes.
    pub fn projected_bytes_with(&self, index: u32, size: u64) -> u64 {
        self.staged_bytes_with(index, size) + self.reserved_bytes
    }

    /// Outcome reported to the client after a chunk write.
    pub fn outcome(&self) -> ChunkOutcome {
        if self.is_complete() {
            ChunkOutcome::Complete
        } else {
            ChunkOutcome::Pending {
                received: self.received_count(),
                expected: self.expected_chunks,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_is_set_based() {
        let mut session = UploadSession::new("abc-1", 3);
        session.record_chunk(2, 1024);
        assert!(!session.is_complete());
        assert_eq!(session.missing(), vec![0, 1]);

        session.record_chunk(0, 4096);
        session.record_chunk(1, 4096);
        assert!(session.is_complete());
        assert_eq!(session.outcome(), ChunkOutcome::Complete);
        assert_eq!(session.staged_bytes(), 9216);
    }

    #[test]
    fn test_retransmission_replaces_size() {
        let mut session = UploadSession::new("s", 2);
        session.record_chunk(0, 100);
        session.record_chunk(0, 40);
        assert_eq!(session.received_count(), 1);
        assert_eq!(session.staged_bytes(), 40);
        assert_eq!(session.staged_bytes_with(0, 70), 70);
        assert_eq!(session.staged_bytes_with(1, 70), 110);
    }

    #[test]
    fn test_projection_counts_reserved_bytes() {
        let mut session = UploadSession::new("s", 3);
        session.record_chunk(0, 30);
        session.reserved_bytes = 50;
        assert_eq!(session.projected_bytes_with(1, 20), 100);
    }

    #[test]
    fn test_ordered_indices_are_numeric() {
        let mut session = UploadSession::new("s", 12);
        for i in [10, 2, 11, 0, 1, 9, 3, 4, 5, 6, 7, 8] {
            session.record_chunk(i, 1);
        }
        assert_eq!(session.ordered_indices(), (0..12).collect::<Vec<_>>());
    }

    #[test]
    fn test_pending_outcome_serializes_with_status_tag() {
        let mut session = UploadSession::new("s", 3);
        session.record_chunk(0, 1);
        let json = serde_json::to_value(session.outcome()).expect("serialize");
        assert_eq!(json["status"], "pending");
        assert_eq!(json["received"], 1);
        assert_eq!(json["expected"], 3);
    }
}
