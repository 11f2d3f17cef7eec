//! Control loop: registration, terminal wait, continuation hand-off.

use crate::config::AccountConfig;
use crate::state::{AccountEffects, UserAccountState};
use entity_core::effects::{
    ApprovalVerifier, Condition, ContinuationSignal, EntityDispatcher, EntityHost,
    HandlerRegistry, Notifier,
};
use entity_core::{AccountSnapshot, EntityId, EntityResult};
use std::sync::Arc;
use tracing::info;

/// Why a control-loop pass ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoopExit {
    /// The undo window elapsed; the identity accepts no further commands.
    Deleted,
    /// The host suggested compaction; the snapshot seeds the successor
    /// instance of the same identity.
    Continue(AccountSnapshot),
}

/// Wires one account instance into its host and runs it to hand-off or
/// termination.
pub struct UserAccountOrchestration {
    entity_id: EntityId,
    config: AccountConfig,
    registry: Arc<dyn HandlerRegistry>,
    signal: Arc<dyn ContinuationSignal>,
    effects: AccountEffects,
}

impl UserAccountOrchestration {
    /// Assemble the loop from injected host and collaborator handles.
    pub fn new(
        entity_id: EntityId,
        config: AccountConfig,
        registry: Arc<dyn HandlerRegistry>,
        signal: Arc<dyn ContinuationSignal>,
        effects: AccountEffects,
    ) -> Self {
        Self {
            entity_id,
            config,
            registry,
            signal,
            effects,
        }
    }

    /// Assemble the loop from one full host handle plus the activity
    /// collaborators, splitting the host into its effect roles.
    pub fn with_host<H>(
        entity_id: EntityId,
        config: AccountConfig,
        host: Arc<H>,
        verifier: Arc<dyn ApprovalVerifier>,
        notifier: Arc<dyn Notifier>,
    ) -> Self
    where
        H: EntityHost + 'static,
    {
        let effects = AccountEffects {
            clock: host.clone(),
            spawner: host.clone(),
            index: host.clone(),
            verifier,
            notifier,
        };
        Self::new(entity_id, config, host.clone(), host, effects)
    }

    /// Run one instance: rehydrate, register, suspend until terminal or
    /// compaction, and exit with the hand-off decision.
    ///
    /// Registration failure is the only fatal condition; it aborts the
    /// instance before it accepts anything. The hand-off itself must be
    /// invisible to callers — the host's continuation primitive replaces
    /// the instance atomically, this loop only supplies the snapshot.
    pub async fn run(&self, snapshot: AccountSnapshot) -> EntityResult<LoopExit> {
        info!(entity = %self.entity_id, "account instance starting");
        let state = Arc::new(UserAccountState::new(
            self.entity_id.clone(),
            self.config,
            self.effects.clone(),
            snapshot,
        )?);
        self.registry
            .register(&self.entity_id, Arc::clone(&state) as Arc<dyn EntityDispatcher>)?;

        let terminal_or_compaction: Condition = {
            let state = Arc::clone(&state);
            let signal = Arc::clone(&self.signal);
            Box::new(move || state.deleted() || signal.compaction_suggested())
        };
        self.effects
            .clock
            .await_condition(terminal_or_compaction)
            .await?;

        if state.deleted() {
            info!(entity = %self.entity_id, "account deleted; control loop terminating");
            return Ok(LoopExit::Deleted);
        }
        let snapshot = state.snapshot();
        info!(
            entity = %self.entity_id,
            granted = snapshot.permissions.len(),
            pending = snapshot.awaiting_approval.len(),
            "compaction suggested; handing off snapshot"
        );
        Ok(LoopExit::Continue(snapshot))
    }

    /// Drive successive instances — snapshot out, spawn successor, retire
    /// self — until the identity is deleted.
    pub async fn run_until_deleted(&self, snapshot: AccountSnapshot) -> EntityResult<()> {
        let mut snapshot = snapshot;
        loop {
            match self.run(snapshot).await? {
                LoopExit::Deleted => return Ok(()),
                LoopExit::Continue(next) => snapshot = next,
            }
        }
    }
}
