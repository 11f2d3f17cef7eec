//! Aggregate test host: the full host effect surface plus command
//! delivery in host order.

use crate::clock::{settle, VirtualClock};
use crate::index::RecordingIndex;
use crate::notifier::RecordingNotifier;
use crate::verifier::ScriptedVerifier;
use async_trait::async_trait;
use entity_core::effects::{
    AttributeIndex, ClockEffects, Condition, ContinuationSignal, EntityDispatcher,
    HandlerRegistry, TaskSpawner,
};
use entity_core::{
    Command, CommandReply, EntityError, EntityId, EntityResult, HostError, Query, QueryReply,
    Timestamp,
};
use futures::future::BoxFuture;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

/// One-entity in-process host.
///
/// Commands are applied in the order tests deliver them — that order is
/// the entity's sole source of truth. Registering a dispatcher resets the
/// compaction suggestion, since a successor instance starts with fresh
/// history.
#[derive(Clone, Default)]
pub struct TestHost {
    clock: VirtualClock,
    index: RecordingIndex,
    verifier: ScriptedVerifier,
    notifier: RecordingNotifier,
    dispatcher: Arc<Mutex<Option<Arc<dyn EntityDispatcher>>>>,
    compaction: Arc<AtomicBool>,
    reject_registration: Arc<AtomicBool>,
    registered: Arc<Notify>,
}

impl TestHost {
    /// Fresh host with an epoch clock and an always-verifying approver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle to the virtual clock.
    pub fn clock(&self) -> VirtualClock {
        self.clock.clone()
    }

    /// Handle to the recording attribute index.
    pub fn index(&self) -> RecordingIndex {
        self.index.clone()
    }

    /// Handle to the scripted verifier.
    pub fn verifier(&self) -> ScriptedVerifier {
        self.verifier.clone()
    }

    /// Handle to the recording notifier.
    pub fn notifier(&self) -> RecordingNotifier {
        self.notifier.clone()
    }

    /// Deliver one command to the registered dispatcher and return its
    /// synchronous result, then re-evaluate parked waits.
    pub async fn deliver(&self, command: Command) -> EntityResult<CommandReply> {
        let dispatcher = self
            .dispatcher
            .lock()
            .clone()
            .ok_or_else(|| EntityError::Host(HostError::internal("no dispatcher registered")))?;
        let result = dispatcher.apply(command).await;
        self.clock.poke();
        result
    }

    /// Answer one query from the registered dispatcher.
    pub fn query(&self, query: Query) -> EntityResult<QueryReply> {
        let dispatcher = self
            .dispatcher
            .lock()
            .clone()
            .ok_or_else(|| EntityError::Host(HostError::internal("no dispatcher registered")))?;
        Ok(dispatcher.inspect(query))
    }

    /// Flag that this instance's history warrants compaction.
    pub fn suggest_compaction(&self) {
        self.compaction.store(true, Ordering::SeqCst);
        self.clock.poke();
    }

    /// Make the next registration fail, to exercise the fatal path.
    pub fn reject_next_registration(&self) {
        self.reject_registration.store(true, Ordering::SeqCst);
    }

    /// Wait until a control loop has registered its dispatcher.
    pub async fn wait_registered(&self) {
        loop {
            let registered = self.registered.notified();
            tokio::pin!(registered);
            registered.as_mut().enable();
            if self.dispatcher.lock().is_some() {
                return;
            }
            registered.await;
        }
    }

    /// Let spawned routines run to their next suspension point.
    pub async fn settle(&self) {
        settle(&self.clock).await;
    }
}

// Clock, spawner, and index delegation: one TestHost handle satisfies the
// whole EntityHost surface, so a control loop can be wired from it alone.
#[async_trait]
impl ClockEffects for TestHost {
    fn now(&self) -> Timestamp {
        self.clock.now()
    }

    async fn await_condition(&self, condition: Condition) -> Result<(), HostError> {
        self.clock.await_condition(condition).await
    }

    async fn await_condition_with_timeout(
        &self,
        condition: Condition,
        timeout: Duration,
    ) -> Result<bool, HostError> {
        self.clock.await_condition_with_timeout(condition, timeout).await
    }
}

impl TaskSpawner for TestHost {
    fn spawn(&self, fut: BoxFuture<'static, ()>) {
        tokio::spawn(fut);
    }
}

impl AttributeIndex for TestHost {
    fn publish(&self, key: &'static str, values: Vec<String>) -> Result<(), HostError> {
        self.index.publish(key, values)
    }
}

impl HandlerRegistry for TestHost {
    fn register(
        &self,
        _entity_id: &EntityId,
        dispatcher: Arc<dyn EntityDispatcher>,
    ) -> Result<(), HostError> {
        if self.reject_registration.swap(false, Ordering::SeqCst) {
            return Err(HostError::registration_rejected(
                "registration rejected by test",
            ));
        }
        *self.dispatcher.lock() = Some(dispatcher);
        self.compaction.store(false, Ordering::SeqCst);
        self.registered.notify_waiters();
        Ok(())
    }
}

impl ContinuationSignal for TestHost {
    fn compaction_suggested(&self) -> bool {
        self.compaction.load(Ordering::SeqCst)
    }
}
