//! Per-item sync state.

/// Where an item's local value stands relative to the backend.
///
/// `Clean` -> `PendingOptimistic` when a mutation is applied locally before
/// the backend confirms; back to `Clean` on success. On failure the item
/// enters `Reverting` until the next full reload replaces the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncState {
    #[default]
    Clean,
    PendingOptimistic,
    Reverting,
}
