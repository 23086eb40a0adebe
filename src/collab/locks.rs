use chrono::{DateTime, Utc};
use std::collections::HashMap;

use crate::models::{LockOwner, LockSnapshot};

/// Element id the diagram editor uses for its implicit root
pub const IMPLICIT_ROOT: &str = "__implicitroot";

/// Element ids starting with this prefix are editor internals
pub const RESERVED_PREFIX: &str = "__";

/// Whether clients may lock `element_id` at all.
/// [`LockTable`] does not check this; callers filter before locking.
pub fn is_lockable(element_id: &str) -> bool {
    !element_id.is_empty()
        && element_id != IMPLICIT_ROOT
        && !element_id.starts_with(RESERVED_PREFIX)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementLock {
    pub user_id: String,
    pub user_name: String,
    pub timestamp: DateTime<Utc>,
}

/// Exclusive edit claims of one room.
///
/// At most one lock per element and at most one lock per user: taking a new
/// lock silently drops whatever else that user held, and always wins over the
/// element's previous holder.
#[derive(Debug, Default)]
pub struct LockTable {
    locks: HashMap<String, ElementLock>,
}

impl LockTable {
    pub fn lock(&mut self, element_id: &str, user_id: &str, user_name: &str) {
        self.locks
            .retain(|elem, lock| elem == element_id || lock.user_id != user_id);
        self.locks.insert(
            element_id.to_string(),
            ElementLock {
                user_id: user_id.to_string(),
                user_name: user_name.to_string(),
                timestamp: Utc::now(),
            },
        );
    }

    /// Release `element_id` if `user_id` holds it. Returns whether anything
    /// was released.
    pub fn unlock(&mut self, element_id: &str, user_id: &str) -> bool {
        match self.get(element_id) {
            Some(lock) if lock.user_id == user_id => {
                self.locks.remove(element_id);
                true
            }
            _ => false,
        }
    }

    /// Release everything `user_id` holds, returning the released element ids
    pub fn unlock_all(&mut self, user_id: &str) -> Vec<String> {
        let released = self.held_by(user_id);
        for element_id in &released {
            self.locks.remove(element_id);
        }
        released
    }

    /// Elements currently locked by `user_id`, sorted
    pub fn held_by(&self, user_id: &str) -> Vec<String> {
        let mut held: Vec<String> = self
            .locks
            .iter()
            .filter(|(_, lock)| lock.user_id == user_id)
            .map(|(elem, _)| elem.clone())
            .collect();
        held.sort();
        held
    }

    pub fn get(&self, element_id: &str) -> Option<&ElementLock> {
        self.locks.get(element_id)
    }

    pub fn snapshot(&self) -> LockSnapshot {
        self.locks
            .iter()
            .map(|(elem, lock)| {
                (
                    elem.clone(),
                    LockOwner {
                        user_id: lock.user_id.clone(),
                        user_name: lock.user_name.clone(),
                    },
                )
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
