use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::error::Result;
use crate::gateway::IssuerGateway;
use crate::hid::HealthId;
use crate::pool::HidPool;
use crate::snapshot::SnapshotStore;

/// When and how much to replenish. Fixed for the process lifetime.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ReplenishPolicy {
    /// Replenishment runs when the pool size drops to this count or below.
    #[serde(default = "default_threshold")]
    pub threshold: usize,

    /// Number of identifiers requested from the issuer per block.
    #[serde(default = "default_block_size")]
    pub block_size: u32,
}

impl Default for ReplenishPolicy {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            block_size: default_block_size(),
        }
    }
}

fn default_threshold() -> usize {
    10
}

fn default_block_size() -> u32 {
    100
}

/// A mark-used notification that failed and is awaiting retry.
#[derive(Debug)]
struct PendingUsed {
    id: HealthId,
    used_at: OffsetDateTime,
    attempts: u32,
}

const MAX_NOTIFY_ATTEMPTS: u32 = 5;

/// Façade over the local health ID pool: the single entry point for
/// allocation, putback, mark-used notification and replenishment.
///
/// The pool and its snapshot form one unit of exclusion: every mutation
/// (allocate, putback, replenish-merge) holds the pool mutex across both the
/// in-memory change and the snapshot rewrite, so no identifier can be handed
/// to two concurrent callers and the on-disk state always trails the last
/// completed mutation. Size reads go through an atomic mirror and are not a
/// synchronization point.
///
/// Constructed explicitly by the service's startup wiring; there is no
/// global instance.
pub struct HidAllocator<G> {
    pool: Mutex<HidPool>,
    available: AtomicUsize,
    snapshot: SnapshotStore,
    gateway: Arc<G>,
    policy: ReplenishPolicy,
    pending_used: Mutex<VecDeque<PendingUsed>>,
}

impl<G: IssuerGateway> HidAllocator<G> {
    /// Cold-start constructor: seeds the pool from the snapshot file, the
    /// last known-good state before the previous shutdown or crash.
    ///
    /// A missing snapshot yields an empty pool; malformed content is an
    /// error the wiring must decide on rather than silently discard.
    pub async fn load(
        snapshot: SnapshotStore,
        gateway: Arc<G>,
        policy: ReplenishPolicy,
    ) -> Result<Self> {
        let seeded = snapshot.read().await?;
        if !seeded.is_empty() {
            info!(
                count = seeded.len(),
                path = %snapshot.path().display(),
                "seeded health ID pool from snapshot"
            );
        }
        Ok(Self::with_pool(
            HidPool::with_ids(seeded),
            snapshot,
            gateway,
            policy,
        ))
    }

    /// Wraps an already-populated pool. Used by `load` and by tests.
    pub fn with_pool(
        pool: HidPool,
        snapshot: SnapshotStore,
        gateway: Arc<G>,
        policy: ReplenishPolicy,
    ) -> Self {
        let available = AtomicUsize::new(pool.len());
        Self {
            pool: Mutex::new(pool),
            available,
            snapshot,
            gateway,
            policy,
            pending_used: Mutex::new(VecDeque::new()),
        }
    }

    /// Pops one identifier and durably removes it from the snapshot before
    /// returning it.
    ///
    /// Fails with [`PoolError::Exhausted`](crate::PoolError::Exhausted)
    /// immediately when the pool is empty; never blocks on replenishment and
    /// never retries internally. A snapshot-write failure is logged and
    /// swallowed, since the in-memory pool stays authoritative.
    pub async fn next(&self) -> Result<HealthId> {
        let mut pool = self.pool.lock().await;
        let id = pool.take()?;
        self.persist(&pool).await;
        self.available.store(pool.len(), Ordering::Release);
        debug!(%id, remaining = pool.len(), "allocated health ID");
        Ok(id)
    }

    /// Returns an identifier whose downstream consumption failed. Appends it
    /// to the pool and rewrites the snapshot; never fails observably.
    pub async fn put_back(&self, id: HealthId) {
        let mut pool = self.pool.lock().await;
        debug!(%id, "returning unconsumed health ID to pool");
        pool.add(std::iter::once(id));
        self.persist(&pool).await;
        self.available.store(pool.len(), Ordering::Release);
    }

    /// Notifies the issuer that `id` was consumed by a created record.
    ///
    /// Non-fatal to the caller by contract: the identifier is already
    /// irreversibly assigned, so a failed notification is queued for retry
    /// by the replenish worker rather than surfaced.
    pub async fn mark_used(&self, id: HealthId) {
        let used_at = OffsetDateTime::now_utc();
        if let Err(e) = self.gateway.notify_used(&id, used_at).await {
            warn!(%id, error = %e, "mark-used notification failed, queued for retry");
            self.pending_used.lock().await.push_back(PendingUsed {
                id,
                used_at,
                attempts: 1,
            });
        }
    }

    /// Retries queued mark-used notifications once each. Entries that keep
    /// failing are dropped after [`MAX_NOTIFY_ATTEMPTS`]; reconciling those
    /// is the issuer's concern. Returns the number delivered.
    pub async fn flush_pending_used(&self) -> usize {
        let batch: Vec<PendingUsed> = {
            let mut queue = self.pending_used.lock().await;
            queue.drain(..).collect()
        };
        if batch.is_empty() {
            return 0;
        }

        let mut delivered = 0;
        for mut entry in batch {
            match self.gateway.notify_used(&entry.id, entry.used_at).await {
                Ok(()) => delivered += 1,
                Err(e) => {
                    entry.attempts += 1;
                    if entry.attempts >= MAX_NOTIFY_ATTEMPTS {
                        error!(
                            id = %entry.id,
                            error = %e,
                            "dropping mark-used notification after {MAX_NOTIFY_ATTEMPTS} attempts"
                        );
                    } else {
                        warn!(
                            id = %entry.id,
                            attempts = entry.attempts,
                            error = %e,
                            "mark-used retry failed"
                        );
                        self.pending_used.lock().await.push_back(entry);
                    }
                }
            }
        }
        delivered
    }

    /// Current pool size from the atomic mirror. Inherently racy against
    /// concurrent allocation; callers must not treat it as a lock.
    pub fn available(&self) -> usize {
        self.available.load(Ordering::Acquire)
    }

    pub fn policy(&self) -> ReplenishPolicy {
        self.policy
    }

    /// Runs one replenishment pass: threshold check, snapshot
    /// reconciliation, block fetch, merge. Returns the number of
    /// identifiers merged (0 for a no-op or a contained failure).
    ///
    /// Every failure is caught and logged here; nothing propagates to the
    /// invoker. A failed pass leaves the pool as it was and is retried on
    /// the next scheduled run.
    pub async fn replenish_if_needed(&self) -> usize {
        if self.available() > self.policy.threshold {
            return 0;
        }

        {
            let mut pool = self.pool.lock().await;
            // Trust disk over memory at this checkpoint: a crash may have
            // left the snapshot ahead of or behind the pool.
            match self.snapshot.read().await {
                Ok(on_disk) => {
                    if on_disk.len() != pool.len() {
                        info!(
                            memory = pool.len(),
                            disk = on_disk.len(),
                            "reconciled pool from snapshot"
                        );
                    }
                    pool.replace(on_disk);
                    self.available.store(pool.len(), Ordering::Release);
                }
                Err(e) => {
                    warn!(error = %e, "snapshot reconciliation failed, keeping in-memory pool");
                }
            }
            if pool.len() > self.policy.threshold {
                return 0;
            }
        }

        // Fetch outside the pool lock so allocations are not stalled by
        // network latency. The merge below re-acquires it.
        let block = match self.gateway.fetch_block(self.policy.block_size).await {
            Ok(block) => block,
            Err(e) => {
                warn!(error = %e, "health ID block fetch failed, will retry on next run");
                return 0;
            }
        };
        if block.is_empty() {
            warn!("issuer returned an empty health ID block");
            return 0;
        }

        let mut pool = self.pool.lock().await;
        let merged = block.len();
        pool.add(block);
        self.persist(&pool).await;
        self.available.store(pool.len(), Ordering::Release);
        info!(merged, total = pool.len(), "replenished health ID pool");
        merged
    }

    /// Rewrites the snapshot from the pool's current state, under the same
    /// lock as the mutation that preceded it. Failures are logged and
    /// swallowed per policy.
    async fn persist(&self, pool: &HidPool) {
        if let Err(e) = self.snapshot.write(&pool.snapshot()).await {
            warn!(error = %e, "snapshot rewrite failed, in-memory pool remains authoritative");
        }
    }
}
