//! Stream registry: a bounded 1..127 allocator pairing outbound
//! requests with inbound responses.

use crate::error::LibraryError;
use crate::pending::{PendingRequest, RequestOutcome};

/// Highest valid stream ID. Stream 0 is reserved for connection-lifecycle
/// frames; negative IDs are server-initiated events.
pub const MAX_STREAM_ID: u8 = 127;

/// Fixed 128-entry table (index 0 unused) plus a free-list stack, giving
/// O(1) acquire/release without hashing.
#[derive(Debug)]
pub struct StreamRegistry {
    slots: [Option<PendingRequest>; 128],
    free: Vec<u8>,
}

impl StreamRegistry {
    /// Build a registry with all 127 stream IDs free.
    #[must_use]
    pub fn new() -> Self {
        Self { slots: std::array::from_fn(|_| None), free: (1..=MAX_STREAM_ID).rev().collect() }
    }

    /// Number of streams currently in flight.
    #[must_use]
    pub fn occupied_count(&self) -> usize {
        (MAX_STREAM_ID as usize) - self.free.len()
    }

    /// Allocate a stream ID for `handle`. Fails with
    /// [`LibraryError::NoStreams`] if all 127 IDs are in flight.
    pub fn acquire(&mut self, handle: PendingRequest) -> Result<u8, LibraryError> {
        let id = self.free.pop().ok_or(LibraryError::NoStreams)?;
        self.slots[id as usize] = Some(handle);
        Ok(id)
    }

    /// Remove and return the handle registered for `stream_id`, releasing
    /// the ID back to the free list. Returns `None` if the ID wasn't
    /// occupied (already taken, or never acquired) — a safe no-op so a
    /// duplicate or spurious response can't panic the connection.
    pub fn take(&mut self, stream_id: u8) -> Option<PendingRequest> {
        if stream_id == 0 || stream_id > MAX_STREAM_ID {
            return None;
        }
        let handle = self.slots[stream_id as usize].take()?;
        self.free.push(stream_id);
        Some(handle)
    }

    /// Drain every occupied slot, completing each handle with `outcome`
    /// (cloned per handle) and releasing every ID back to the free list.
    /// Called on connection loss or explicit close.
    pub fn fail_all(&mut self, outcome: impl Fn() -> RequestOutcome) {
        for id in 1..=MAX_STREAM_ID {
            if let Some(handle) = self.slots[id as usize].take() {
                handle.complete(outcome());
                self.free.push(id);
            }
        }
    }
}

impl Default for StreamRegistry {
    fn default() -> Self {
        Self::new()
    }
}
