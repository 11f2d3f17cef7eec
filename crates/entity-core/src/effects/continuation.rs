//! History-compaction signalling.

/// The host's hint that this instance's recorded history has grown large
/// enough to warrant continuation.
///
/// The control loop reacts by snapshotting out and retiring in favour of
/// a fresh instance of the same identity; the host's continuation
/// primitive makes that hand-off atomic and invisible to callers.
pub trait ContinuationSignal: Send + Sync {
    /// True once compaction is advisable for the current instance.
    fn compaction_suggested(&self) -> bool;
}
