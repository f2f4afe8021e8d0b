use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{debug, info};

use crate::allocator::HidAllocator;
use crate::gateway::IssuerGateway;

/// Periodic driver for pool replenishment and mark-used retries.
///
/// Each tick runs one [`HidAllocator::replenish_if_needed`] pass and drains
/// the pending mark-used queue. Both are best-effort: failures are contained
/// inside the allocator and simply retried on the next tick, so this loop
/// never exits on error.
///
/// Hosts with their own scheduler can skip the worker and call
/// `replenish_if_needed` directly.
pub struct ReplenishWorker<G> {
    allocator: Arc<HidAllocator<G>>,
    poll_interval: Duration,
}

impl<G: IssuerGateway + 'static> ReplenishWorker<G> {
    pub fn new(allocator: Arc<HidAllocator<G>>, poll_interval: Duration) -> Self {
        Self {
            allocator,
            poll_interval,
        }
    }

    /// Runs the replenishment loop until the task is dropped.
    pub async fn run(self) {
        let mut ticker = interval(self.poll_interval);

        info!(
            interval_secs = self.poll_interval.as_secs(),
            threshold = self.allocator.policy().threshold,
            block_size = self.allocator.policy().block_size,
            "replenish worker started"
        );

        loop {
            ticker.tick().await;

            let merged = self.allocator.replenish_if_needed().await;
            if merged > 0 {
                debug!(merged, "replenish pass merged fresh health IDs");
            }

            let delivered = self.allocator.flush_pending_used().await;
            if delivered > 0 {
                debug!(delivered, "delivered queued mark-used notifications");
            }
        }
    }

    /// Spawns the loop on the current runtime.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}
