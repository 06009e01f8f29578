//! Per-room mutual exclusion.
//!
//! Every request that touches a room runs inside [`RoomLocks::with_room`].
//! Requests for different rooms never block each other; the registry's own
//! lock is only held long enough to find or create a room's lock.
//!
//! Re-entry is by construction: the closure receives a [`RoomGuard`], and
//! helpers that must run under the room lock take `&RoomGuard` instead of
//! locking again.

use crate::room::RoomId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, instrument, trace};

/// Proof that the lock for one room is held.
#[derive(Debug)]
pub struct RoomGuard {
    room_id: RoomId,
}

impl RoomGuard {
    /// The locked room.
    pub fn room_id(&self) -> RoomId {
        self.room_id
    }
}

/// Registry of per-room locks, created on first use.
#[derive(Debug, Clone, Default)]
pub struct RoomLocks {
    locks: Arc<Mutex<HashMap<RoomId, Arc<Mutex<()>>>>>,
}

impl RoomLocks {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_for(&self, room_id: RoomId) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(room_id).or_default())
    }

    /// Runs `f` while holding the room's lock.
    #[instrument(skip(self, f))]
    pub fn with_room<T>(&self, room_id: RoomId, f: impl FnOnce(&RoomGuard) -> T) -> T {
        let lock = self.lock_for(room_id);
        let _held = lock.lock().unwrap_or_else(PoisonError::into_inner);
        trace!("Room lock acquired");
        f(&RoomGuard { room_id })
    }

    /// Drops the lock of a deleted room. Requests already waiting on it
    /// still finish against the deleted room and see it missing.
    #[instrument(skip(self, guard), fields(room_id = guard.room_id))]
    pub fn forget(&self, guard: &RoomGuard) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.remove(&guard.room_id);
        debug!("Room lock dropped");
    }
}
