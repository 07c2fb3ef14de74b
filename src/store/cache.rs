// In-memory record cache shared by the store modules
//
// A cache is an ordered list of full records behind a lock. Lists are
// replaced wholesale, single records are upserted or merged by id.
// The lock is only held for synchronous reads and writes.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::entities::{Bill, Income};

/// A record with a server-assigned id that can absorb a partial update.
pub trait Record: Clone {
    fn record_id(&self) -> Option<&str>;
    fn merge_from(&mut self, patch: Self);
}

impl Record for Bill {
    fn record_id(&self) -> Option<&str> {
        self.id()
    }

    fn merge_from(&mut self, patch: Self) {
        self.merge(patch);
    }
}

impl Record for Income {
    fn record_id(&self) -> Option<&str> {
        self.id()
    }

    fn merge_from(&mut self, patch: Self) {
        self.merge(patch);
    }
}

#[derive(Debug)]
pub struct Cache<T> {
    items: RwLock<Vec<T>>,
}

impl<T> Default for Cache<T> {
    fn default() -> Self {
        Cache {
            items: RwLock::new(Vec::new()),
        }
    }
}

impl<T: Record> Cache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<T>> {
        self.items.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<T>> {
        self.items.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of all cached records, in order
    pub fn all(&self) -> Vec<T> {
        self.read().clone()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn find(&self, id: &str) -> Option<T> {
        self.read()
            .iter()
            .find(|r| r.record_id() == Some(id))
            .cloned()
    }

    /// Bulk overwrite from a list fetch
    pub fn replace_all(&self, records: Vec<T>) {
        *self.write() = records;
    }

    /// Insert a record, or merge it into the cached one with the same id.
    ///
    /// Records without an id are appended.
    pub fn upsert(&self, record: T) {
        let mut items = self.write();
        let existing = record
            .record_id()
            .and_then(|id| items.iter().position(|r| r.record_id() == Some(id)));

        match existing {
            Some(idx) => items[idx].merge_from(record),
            None => items.push(record),
        }
    }

    /// Merge into the cached record with the same id. Returns false (and
    /// changes nothing) when no such record is cached.
    pub fn merge(&self, patch: T) -> bool {
        let Some(id) = patch.record_id().map(str::to_owned) else {
            return false;
        };
        let mut items = self.write();
        match items.iter_mut().find(|r| r.record_id() == Some(id.as_str())) {
            Some(existing) => {
                existing.merge_from(patch);
                true
            }
            None => false,
        }
    }

    /// Run `f` on the cached record with the given id
    pub fn update<R>(&self, id: &str, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        let mut items = self.write();
        items.iter_mut().find(|r| r.record_id() == Some(id)).map(f)
    }
}

// ============================================================================
// TESTS
// ============================================================================
