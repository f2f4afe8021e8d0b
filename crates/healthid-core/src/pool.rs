use std::collections::VecDeque;

use crate::error::{PoolError, Result};
use crate::hid::HealthId;

/// In-memory FIFO pool of unused health IDs.
///
/// An identifier present here has never been handed to a caller since its
/// last insertion. Duplicates are not checked on insert; uniqueness is the
/// issuer's contract. FIFO ordering is a determinism choice, not a
/// correctness requirement.
///
/// The pool itself is not synchronized. [`HidAllocator`](crate::HidAllocator)
/// owns it behind a single mutex together with the snapshot rewrite, so pool
/// mutation and persistence form one unit of exclusion.
#[derive(Debug, Default)]
pub struct HidPool {
    ids: VecDeque<HealthId>,
}

impl HidPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ids(ids: impl IntoIterator<Item = HealthId>) -> Self {
        Self {
            ids: ids.into_iter().collect(),
        }
    }

    /// Appends identifiers to the back of the pool. Never fails.
    pub fn add(&mut self, ids: impl IntoIterator<Item = HealthId>) {
        self.ids.extend(ids);
    }

    /// Removes and returns the oldest identifier.
    ///
    /// Fails immediately with [`PoolError::Exhausted`] when empty; never
    /// blocks waiting for replenishment.
    pub fn take(&mut self) -> Result<HealthId> {
        self.ids.pop_front().ok_or(PoolError::Exhausted)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Removes all identifiers. Used only by replenishment reconciliation.
    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Replaces the entire contents in one step, so reconciliation never
    /// exposes a cleared-but-not-yet-repopulated pool.
    pub fn replace(&mut self, ids: Vec<HealthId>) {
        self.ids = ids.into();
    }

    /// Returns a copy of the current contents for serialization.
    pub fn snapshot(&self) -> Vec<HealthId> {
        self.ids.iter().cloned().collect()
    }
}
