//! In-process registry of upload sessions.
//!
//! Every transition happens under the map's shard lock and never spans an
//! `.await`. Callers hold a [`WriteReservation`] or [`MergeClaim`] across
//! their I/O; dropping one without finishing it (an error path or a
//! cancelled request) hands the session back.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use filedock_core::error::AppError;
use filedock_core::result::AppResult;
use filedock_entity::upload::{ChunkOutcome, SessionState, UploadSession};

/// Shared map of session id → staging state.
#[derive(Debug, Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<DashMap<String, UploadSession>>,
}

impl SessionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve a chunk write of `size` bytes at `index`.
    ///
    /// Creates the session on its first chunk. Refuses writes while the
    /// session is merging, when `total` disagrees with the session, or when
    /// the staged bytes plus every reservation in flight would exceed
    /// `max_bytes`.
    pub fn begin_write(
        &self,
        session_id: &str,
        index: u32,
        total: u32,
        size: u64,
        max_bytes: u64,
    ) -> AppResult<WriteReservation> {
        match self.sessions.entry(session_id.to_string()) {
            Entry::Occupied(mut entry) => reserve(entry.get_mut(), index, total, size, max_bytes)?,
            Entry::Vacant(entry) => {
                let mut session = UploadSession::new(session_id, total);
                reserve(&mut session, index, total, size, max_bytes)?;
                entry.insert(session);
            }
        }
        Ok(WriteReservation {
            registry: self.clone(),
            session_id: session_id.to_string(),
            index,
            size,
            armed: true,
        })
    }

    fn finish_write(&self, session_id: &str, index: u32, size: u64) -> AppResult<ChunkOutcome> {
        let mut session = self.sessions.get_mut(session_id).ok_or_else(|| {
            AppError::internal(format!("Upload session '{session_id}' vanished mid-write"))
        })?;
        release(&mut session, size);
        session.record_chunk(index, size);
        Ok(session.outcome())
    }

    /// A session left with no chunks and no other writes is forgotten, so a
    /// failed first chunk does not pin the chunk count.
    fn abort_write(&self, session_id: &str, size: u64) {
        if let Entry::Occupied(mut entry) = self.sessions.entry(session_id.to_string()) {
            let session = entry.get_mut();
            release(session, size);
            if session.is_empty() && session.writes_in_flight == 0 {
                entry.remove();
            }
        }
    }

    /// Claim a complete session for merging.
    ///
    /// The claim carries the staged indices in ascending order.
    pub fn begin_merge(&self, session_id: &str) -> AppResult<MergeClaim> {
        let mut session = match self.sessions.get_mut(session_id) {
            Some(session) if !session.is_empty() => session,
            _ => return Err(AppError::no_chunks_found(session_id)),
        };

        if session.state == SessionState::Merging || session.writes_in_flight > 0 {
            return Err(AppError::merge_in_progress(session_id));
        }
        if !session.is_complete() {
            return Err(AppError::incomplete_chunk_set(session_id, &session.missing()));
        }

        session.state = SessionState::Merging;
        session.touch();
        Ok(MergeClaim {
            registry: self.clone(),
            session_id: session_id.to_string(),
            indices: session.ordered_indices(),
            armed: true,
        })
    }

    fn abort_merge(&self, session_id: &str) {
        if let Some(mut session) = self.sessions.get_mut(session_id) {
            session.state = SessionState::Receiving;
            session.touch();
        }
    }

    /// Snapshot of a session.
    pub fn get(&self, session_id: &str) -> Option<UploadSession> {
        self.sessions.get(session_id).map(|s| s.clone())
    }

    /// Whether the registry tracks `session_id`.
    pub fn contains(&self, session_id: &str) -> bool {
        self.sessions.contains_key(session_id)
    }

    /// Number of tracked sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether no session is tracked.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Drop idle sessions last touched before `cutoff` and return their ids.
    ///
    /// Sessions that are merging or have writes in flight are kept.
    pub fn evict_idle(&self, cutoff: DateTime<Utc>) -> Vec<String> {
        let mut evicted = Vec::new();
        self.sessions.retain(|id, session| {
            let idle = session.state == SessionState::Receiving
                && session.writes_in_flight == 0
                && session.updated_at < cutoff;
            if idle {
                evicted.push(id.clone());
            }
            !idle
        });
        evicted
    }
}

/// A chunk write admitted by [`SessionRegistry::begin_write`].
///
/// Dropped without [`finish`](Self::finish), the reservation is released
/// and its bytes no longer count against the session.
#[derive(Debug)]
#[must_use = "dropping a reservation releases it"]
pub struct WriteReservation {
    registry: SessionRegistry,
    session_id: String,
    index: u32,
    size: u64,
    armed: bool,
}

impl WriteReservation {
    /// Record the chunk as staged and report completeness.
    pub fn finish(mut self) -> AppResult<ChunkOutcome> {
        self.armed = false;
        self.registry
            .finish_write(&self.session_id, self.index, self.size)
    }
}

impl Drop for WriteReservation {
    fn drop(&mut self) {
        if self.armed {
            self.registry.abort_write(&self.session_id, self.size);
        }
    }
}

/// Exclusive right to merge one session, from
/// [`SessionRegistry::begin_merge`].
///
/// Dropped without [`finish`](Self::finish), the session goes back to
/// `Receiving` with its chunks intact.
#[derive(Debug)]
#[must_use = "dropping a claim hands the session back"]
pub struct MergeClaim {
    registry: SessionRegistry,
    session_id: String,
    indices: Vec<u32>,
    armed: bool,
}

impl MergeClaim {
    /// Staged indices in ascending order.
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Forget the session after a successful merge.
    pub fn finish(mut self) {
        self.armed = false;
        self.registry.sessions.remove(&self.session_id);
    }
}

impl Drop for MergeClaim {
    fn drop(&mut self) {
        if self.armed {
            self.registry.abort_merge(&self.session_id);
        }
    }
}

fn reserve(
    session: &mut UploadSession,
    index: u32,
    total: u32,
    size: u64,
    max_bytes: u64,
) -> AppResult<()> {
    if session.expected_chunks != total {
        return Err(AppError::inconsistent_chunk_count(
            &session.session_id,
            session.expected_chunks,
            total,
        ));
    }
    if session.state == SessionState::Merging {
        return Err(AppError::merge_in_progress(&session.session_id));
    }
    if session.projected_bytes_with(index, size) > max_bytes {
        return Err(AppError::validation(format!(
            "Upload '{}' exceeds the maximum size of {max_bytes} bytes",
            session.session_id
        )));
    }

    session.writes_in_flight += 1;
    session.reserved_bytes += size;
    session.touch();
    Ok(())
}

fn release(session: &mut UploadSession, size: u64) {
    session.writes_in_flight = session.writes_in_flight.saturating_sub(1);
    session.reserved_bytes = session.reserved_bytes.saturating_sub(size);
}
