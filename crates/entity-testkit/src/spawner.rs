//! Tokio-backed task spawner.

use entity_core::effects::TaskSpawner;
use futures::future::BoxFuture;

/// Spawns entity routines onto the ambient tokio runtime.
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioSpawner;

impl TaskSpawner for TokioSpawner {
    fn spawn(&self, fut: BoxFuture<'static, ()>) {
        tokio::spawn(fut);
    }
}
