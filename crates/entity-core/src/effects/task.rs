//! Runtime-agnostic task spawning.

use futures::future::BoxFuture;

/// Structured-concurrency primitive scoped to the entity's lifetime.
///
/// Spawned routines are multiplexed onto the entity's single logical
/// thread of control: they only interleave with command handlers at
/// explicit suspension points, and the host cancels them when the
/// instance retires.
pub trait TaskSpawner: Send + Sync {
    /// Spawn a background routine.
    fn spawn(&self, fut: BoxFuture<'static, ()>);
}
