//! Health ID allocation core for a patient-registry service.
//!
//! A process-local pool of pre-issued unique identifiers is handed out
//! one-at-a-time, mirrored to a durable snapshot file after every mutation,
//! and topped up from a remote issuing authority before it runs dry.
//!
//! # Architecture
//!
//! ```text
//! caller ──► HidAllocator::next ──► HidPool (pop) ──► SnapshotStore (rewrite)
//!        ──► HidAllocator::mark_used ──► IssuerGateway (notify, retried)
//!        ──► HidAllocator::put_back ──► HidPool (push) ──► SnapshotStore
//!
//! ReplenishWorker ──► replenish_if_needed
//!     threshold check ─► reconcile from snapshot ─► IssuerGateway::fetch_block
//!     ─► merge + rewrite snapshot
//! ```
//!
//! The pool plus its snapshot form a single unit of exclusion: at most one
//! mutation is in flight at a time, and the snapshot rewrite happens under
//! the same lock as the in-memory change. Only
//! [`PoolError::Exhausted`] is ever visible to allocation callers; every
//! replenishment or notification failure is contained and retried.
//!
//! HTTP implementations of [`IssuerGateway`] live in `healthid-client`.

pub mod allocator;
pub mod error;
pub mod gateway;
pub mod hid;
pub mod pool;
pub mod replenish;
pub mod snapshot;

// Re-export main types
pub use allocator::{HidAllocator, ReplenishPolicy};
pub use error::{PoolError, Result};
pub use gateway::{GatewayError, IssuerGateway};
pub use hid::HealthId;
pub use pool::HidPool;
pub use replenish::ReplenishWorker;
pub use snapshot::SnapshotStore;
