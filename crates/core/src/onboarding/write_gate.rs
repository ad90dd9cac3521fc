//! Single-writer permits per `(user, role)` wizard.
//!
//! At most one profile write per wizard is outstanding at a time. A second
//! attempt while one is pending does not queue; it is turned away so the
//! caller can treat it as a no-op.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::roles::Role;
use crate::types::DbId;

/// Proof that the holder is the only writer for one wizard. Released on drop.
///
/// Moved into the task that performs the write, so the permit lives exactly
/// as long as the write does.
#[derive(Debug)]
pub struct WritePermit {
    user_id: DbId,
    role: Role,
    _guard: OwnedMutexGuard<()>,
}

impl WritePermit {
    pub fn user_id(&self) -> DbId {
        self.user_id
    }

    pub fn role(&self) -> Role {
        self.role
    }
}

/// Registry of per-wizard write locks, shared across requests.
#[derive(Debug, Default)]
pub struct WriteGate {
    locks: Mutex<HashMap<(DbId, Role), Arc<AsyncMutex<()>>>>,
}

impl WriteGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the write permit for `(user_id, role)` if nobody holds it.
    pub fn try_acquire(&self, user_id: DbId, role: Role) -> Option<WritePermit> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            // A held permit owns a clone; entries with no clone are idle.
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            Arc::clone(locks.entry((user_id, role)).or_default())
        };
        lock.try_lock_owned().ok().map(|guard| WritePermit {
            user_id,
            role,
            _guard: guard,
        })
    }
}
