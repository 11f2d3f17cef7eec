//! Account state machine: commands, queries, and the soft-delete watcher.

use crate::config::AccountConfig;
use async_trait::async_trait;
use entity_core::effects::{
    ApprovalVerifier, AttributeIndex, ClockEffects, Condition, EntityDispatcher, Notifier,
    TaskSpawner, AWAITING_APPROVAL_ATTRIBUTE, PERMISSIONS_ATTRIBUTE,
};
use entity_core::{
    AccountSnapshot, AddPermissionRequest, ApprovePermissionRequest, AwaitingApprovalResponse,
    Command, CommandReply, CreateUserRequest, DeleteUserRequest, EntityError, EntityId,
    EntityResult, HostError, Permission, PermissionsGrantedResponse, Query, QueryReply,
    SendNotificationsRequest, Timestamp, UndoDeleteRequest, UserDetailsResponse,
    VerifyApproverRequest,
};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Injected handles to the host and the entity's collaborators.
///
/// No ambient globals: every effect the state machine performs flows
/// through one of these.
#[derive(Clone)]
pub struct AccountEffects {
    /// Deterministic clock and durable waits.
    pub clock: Arc<dyn ClockEffects>,
    /// Background-routine spawner scoped to the instance.
    pub spawner: Arc<dyn TaskSpawner>,
    /// Indexed-attribute publisher.
    pub index: Arc<dyn AttributeIndex>,
    /// Approver-verification activity.
    pub verifier: Arc<dyn ApprovalVerifier>,
    /// Best-effort grant-notification activity.
    pub notifier: Arc<dyn Notifier>,
}

/// The account's mutable fields.
///
/// Guarded by a single lock that is never held across a suspension
/// point, so each locked section is one atomic step of the entity's
/// cooperative schedule.
#[derive(Debug, Default)]
struct AccountFields {
    awaiting_approval: Vec<Permission>,
    permissions_granted: Vec<Permission>,
    created: bool,
    deleted: bool,
    deletion_requested: bool,
    deletion_requested_at: Option<Timestamp>,
    deletion_scheduled_for: Option<Timestamp>,
}

/// One durable user account.
pub struct UserAccountState {
    entity_id: EntityId,
    config: AccountConfig,
    effects: AccountEffects,
    fields: Arc<Mutex<AccountFields>>,
}

impl UserAccountState {
    /// Build the account from a zero or carried-forward snapshot.
    ///
    /// A non-empty granted set republishes the indexed projections so
    /// search stays accurate across the continuation boundary; a `Some`
    /// deletion stamp immediately re-invokes [`Self::request_deletion`],
    /// re-arming the undo-window watcher with a fresh window.
    pub fn new(
        entity_id: EntityId,
        config: AccountConfig,
        effects: AccountEffects,
        snapshot: AccountSnapshot,
    ) -> EntityResult<Self> {
        let fields = AccountFields {
            awaiting_approval: snapshot.awaiting_approval,
            permissions_granted: snapshot.permissions,
            deletion_requested_at: snapshot.deletion_requested_at,
            ..AccountFields::default()
        };
        let state = Self {
            entity_id,
            config,
            effects,
            fields: Arc::new(Mutex::new(fields)),
        };
        if !state.fields.lock().permissions_granted.is_empty() {
            state.refresh_indexed_attributes()?;
        }
        if state.fields.lock().deletion_requested_at.is_some() {
            state.request_deletion(DeleteUserRequest);
        }
        Ok(state)
    }

    /// `create`: append the initial grant set and mark the account
    /// created.
    ///
    /// A repeat create is not rejected; it simply appends more
    /// permissions (duplicates included).
    pub fn create_user(&self, req: CreateUserRequest) -> EntityResult<()> {
        {
            let mut fields = self.fields.lock();
            if fields.deleted || fields.deletion_requested {
                return Err(EntityError::UserDeleted);
            }
            fields.permissions_granted.extend(req.permissions);
            fields.created = true;
        }
        self.refresh_indexed_attributes()?;
        Ok(())
    }

    /// `add_permission`: queue a permission for approval.
    pub fn request_add_permission(&self, req: AddPermissionRequest) -> EntityResult<()> {
        {
            let mut fields = self.fields.lock();
            if fields.deleted || fields.deletion_requested {
                return Err(EntityError::UserDeleted);
            }
            fields.awaiting_approval.push(req.permission);
        }
        self.refresh_indexed_attributes()?;
        Ok(())
    }

    /// `approve_permission`: verify the approver, then move the
    /// permission from pending to granted.
    ///
    /// The verifier call suspends this routine; other routines may mutate
    /// the account before it resumes. Pending-ness is checked before the
    /// suspension and deliberately not re-checked after it, so a delayed
    /// verification can grant a permission that was concurrently removed
    /// or already granted. Known race, kept as-is.
    pub async fn request_approve_permission(
        &self,
        req: ApprovePermissionRequest,
    ) -> EntityResult<()> {
        {
            let fields = self.fields.lock();
            if fields.deleted || fields.deletion_requested {
                return Err(EntityError::UserDeleted);
            }
            if !fields.awaiting_approval.contains(&req.permission) {
                return Err(EntityError::PermissionNotFound);
            }
        }
        let response = self
            .effects
            .verifier
            .verify_approver(
                VerifyApproverRequest {
                    approver_id: req.approver_id.clone(),
                    permission: req.permission.clone(),
                },
                self.config.verify_approver_timeout,
            )
            .await?;
        if !response.verified {
            return Err(EntityError::ApproverUnauthorized {
                approver: req.approver_id,
                permission: req.permission,
            });
        }
        {
            let mut fields = self.fields.lock();
            fields.permissions_granted.push(req.permission.clone());
            fields
                .awaiting_approval
                .retain(|pending| pending != &req.permission);
        }
        // Grant already happened; a stale index is preferable to failing
        // the command here.
        if let Err(err) = self.refresh_indexed_attributes() {
            error!(entity = %self.entity_id, %err, "unable to refresh indexed attributes");
        }
        self.notify_grant(req);
        Ok(())
    }

    /// `delete`: open the undo window and arm the watcher routine.
    ///
    /// Never fails. The watcher stamps the deletion timestamps from the
    /// deterministic clock, then parks on a durable timed wait for
    /// `deletion_requested` to flip back:
    /// undo arrived → exit quietly; window elapsed → terminal delete,
    /// provided this watcher still owns the window (an undo followed by a
    /// fresh delete moves the stamp and voids the parked watcher);
    /// wait cancelled by the host → logged and swallowed, leaving
    /// `deletion_requested` true with no watcher until the next
    /// continuation re-arms one.
    ///
    /// A delete while a window is already open is coalesced rather than
    /// arming a second watcher to race the first.
    pub fn request_deletion(&self, _req: DeleteUserRequest) {
        let window = self.config.undo_deletion_window;
        {
            let mut fields = self.fields.lock();
            if fields.deletion_requested {
                debug!(entity = %self.entity_id, "deletion already requested; watcher stays armed");
                return;
            }
            fields.deletion_requested = true;
        }
        info!(entity = %self.entity_id, window_ms = window.as_millis() as u64, "deletion requested");
        let fields = Arc::clone(&self.fields);
        let clock = Arc::clone(&self.effects.clock);
        self.effects.spawner.spawn(Box::pin(async move {
            let requested_at = clock.now();
            {
                let mut fields = fields.lock();
                fields.deletion_requested_at = Some(requested_at);
                fields.deletion_scheduled_for = Some(requested_at.saturating_add(window));
            }
            let undone: Condition = {
                let fields = Arc::clone(&fields);
                Box::new(move || !fields.lock().deletion_requested)
            };
            match clock.await_condition_with_timeout(undone, window).await {
                Ok(true) => {}
                Ok(false) => {
                    let mut fields = fields.lock();
                    // Only the watcher whose stamp is still current may
                    // terminate; an undo + re-delete supersedes this one.
                    if fields.deletion_requested
                        && fields.deletion_requested_at == Some(requested_at)
                    {
                        fields.deleted = true;
                    }
                }
                Err(err) => {
                    info!(%err, "undo-window wait cancelled");
                }
            }
        }));
    }

    /// `undo_delete`: close the undo window if the account is not yet
    /// terminal. The watcher observes the flip on its own schedule.
    pub fn request_undo_deletion(&self, _req: UndoDeleteRequest) -> EntityResult<()> {
        let mut fields = self.fields.lock();
        if fields.deleted {
            return Err(EntityError::AlreadyDeleted);
        }
        fields.deletion_requested = false;
        Ok(())
    }

    /// `awaiting_approval` query.
    pub fn awaiting_approval(&self) -> AwaitingApprovalResponse {
        AwaitingApprovalResponse {
            permissions: self.fields.lock().awaiting_approval.clone(),
        }
    }

    /// `granted` query.
    pub fn permissions(&self) -> PermissionsGrantedResponse {
        PermissionsGrantedResponse {
            permissions: self.fields.lock().permissions_granted.clone(),
        }
    }

    /// `user_details` query.
    pub fn user_details(&self) -> UserDetailsResponse {
        let fields = self.fields.lock();
        UserDetailsResponse {
            awaiting_approval: AwaitingApprovalResponse {
                permissions: fields.awaiting_approval.clone(),
            },
            deletion_requested: fields.deletion_requested,
            deletion_requested_at: fields.deletion_requested_at,
            deletion_scheduled_for: fields.deletion_scheduled_for,
            permissions: PermissionsGrantedResponse {
                permissions: fields.permissions_granted.clone(),
            },
        }
    }

    /// Whether the account has reached its terminal state.
    pub fn deleted(&self) -> bool {
        self.fields.lock().deleted
    }

    /// Last deletion stamp, if any.
    pub fn deletion_requested_at(&self) -> Option<Timestamp> {
        self.fields.lock().deletion_requested_at
    }

    /// Snapshot for the continuation hand-off. Same shape that seeds
    /// fresh construction.
    pub fn snapshot(&self) -> AccountSnapshot {
        let fields = self.fields.lock();
        AccountSnapshot {
            awaiting_approval: fields.awaiting_approval.clone(),
            permissions: fields.permissions_granted.clone(),
            deletion_requested_at: fields.deletion_requested_at,
        }
    }

    /// Republish both indexed projections. Both publishes are attempted
    /// even when the first fails.
    fn refresh_indexed_attributes(&self) -> Result<(), HostError> {
        let (granted, pending) = {
            let fields = self.fields.lock();
            (
                fields
                    .permissions_granted
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>(),
                fields
                    .awaiting_approval
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>(),
            )
        };
        let granted_result = self.effects.index.publish(PERMISSIONS_ATTRIBUTE, granted);
        let pending_result = self
            .effects
            .index
            .publish(AWAITING_APPROVAL_ATTRIBUTE, pending);
        granted_result.and(pending_result)
    }

    /// Fire the grant notification without awaiting it.
    fn notify_grant(&self, req: ApprovePermissionRequest) {
        let notifier = Arc::clone(&self.effects.notifier);
        let request = SendNotificationsRequest {
            approver_id: req.approver_id,
            permission: req.permission,
            requester_id: self.entity_id.clone(),
        };
        self.effects.spawner.spawn(Box::pin(async move {
            if let Err(err) = notifier.send_notifications(request).await {
                debug!(%err, "grant notification failed");
            }
        }));
    }
}

#[async_trait]
impl EntityDispatcher for UserAccountState {
    async fn apply(&self, command: Command) -> EntityResult<CommandReply> {
        match command {
            Command::Create(req) => {
                self.create_user(req)?;
                Ok(CommandReply::Created)
            }
            Command::AddPermission(req) => {
                self.request_add_permission(req)?;
                Ok(CommandReply::PermissionRequested)
            }
            Command::ApprovePermission(req) => {
                self.request_approve_permission(req).await?;
                Ok(CommandReply::PermissionApproved)
            }
            Command::Delete(req) => {
                self.request_deletion(req);
                Ok(CommandReply::DeletionRequested)
            }
            Command::UndoDelete(req) => {
                self.request_undo_deletion(req)?;
                Ok(CommandReply::DeletionUndone)
            }
        }
    }

    fn inspect(&self, query: Query) -> QueryReply {
        match query {
            Query::AwaitingApproval => QueryReply::AwaitingApproval(self.awaiting_approval()),
            Query::PermissionsGranted => QueryReply::PermissionsGranted(self.permissions()),
            Query::UserDetails => QueryReply::UserDetails(self.user_details()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use entity_testkit::{
        settle, RecordingIndex, RecordingNotifier, ScriptedVerifier, TokioSpawner, VirtualClock,
    };

    fn account(clock: &VirtualClock, verifier: &ScriptedVerifier) -> UserAccountState {
        account_from(clock, verifier, AccountSnapshot::default())
    }

    fn account_from(
        clock: &VirtualClock,
        verifier: &ScriptedVerifier,
        snapshot: AccountSnapshot,
    ) -> UserAccountState {
        let effects = AccountEffects {
            clock: Arc::new(clock.clone()),
            spawner: Arc::new(TokioSpawner),
            index: Arc::new(RecordingIndex::default()),
            verifier: Arc::new(verifier.clone()),
            notifier: Arc::new(RecordingNotifier::default()),
        };
        UserAccountState::new(
            EntityId::from("alice"),
            AccountConfig::default(),
            effects,
            snapshot,
        )
        .expect("fresh account")
    }

    fn create(permissions: &[&str]) -> CreateUserRequest {
        CreateUserRequest {
            permissions: permissions.iter().map(|p| Permission::from(*p)).collect(),
        }
    }

    #[tokio::test]
    async fn repeat_create_appends_without_dedupe() {
        let clock = VirtualClock::at_epoch();
        let verifier = ScriptedVerifier::verified();
        let state = account(&clock, &verifier);

        state.create_user(create(&["read_files"])).unwrap();
        state.create_user(create(&["read_files", "write_files"])).unwrap();

        let granted = state.permissions().permissions;
        assert_eq!(
            granted,
            vec![
                Permission::from("read_files"),
                Permission::from("read_files"),
                Permission::from("write_files"),
            ]
        );
    }

    #[tokio::test]
    async fn mutating_commands_rejected_while_deletion_window_open() {
        let clock = VirtualClock::at_epoch();
        let verifier = ScriptedVerifier::verified();
        let state = account(&clock, &verifier);
        state.create_user(create(&[])).unwrap();
        state
            .request_add_permission(AddPermissionRequest {
                permission: "read_files".into(),
            })
            .unwrap();

        state.request_deletion(DeleteUserRequest);

        assert_eq!(
            state.create_user(create(&["x"])).unwrap_err(),
            EntityError::UserDeleted
        );
        assert_eq!(
            state
                .request_add_permission(AddPermissionRequest {
                    permission: "x".into()
                })
                .unwrap_err(),
            EntityError::UserDeleted
        );
        assert_eq!(
            state
                .request_approve_permission(ApprovePermissionRequest {
                    approver_id: "bob".to_owned(),
                    permission: "read_files".into(),
                })
                .await
                .unwrap_err(),
            EntityError::UserDeleted
        );
    }

    #[tokio::test]
    async fn undo_after_terminal_delete_is_rejected() {
        let clock = VirtualClock::at_epoch();
        let verifier = ScriptedVerifier::verified();
        let state = account(&clock, &verifier);

        state.request_deletion(DeleteUserRequest);
        settle(&clock).await;
        clock.advance(std::time::Duration::from_secs(60));
        settle(&clock).await;

        assert!(state.deleted());
        assert_eq!(
            state.request_undo_deletion(UndoDeleteRequest).unwrap_err(),
            EntityError::AlreadyDeleted
        );
    }

    #[tokio::test]
    async fn repeat_delete_coalesces_into_one_watcher() {
        let clock = VirtualClock::at_epoch();
        let verifier = ScriptedVerifier::verified();
        let state = account(&clock, &verifier);

        state.request_deletion(DeleteUserRequest);
        settle(&clock).await;
        clock.advance(std::time::Duration::from_secs(30));
        settle(&clock).await;
        let first_stamp = state.deletion_requested_at();

        // A second delete must not restamp or re-arm.
        state.request_deletion(DeleteUserRequest);
        settle(&clock).await;
        assert_eq!(state.deletion_requested_at(), first_stamp);

        state.request_undo_deletion(UndoDeleteRequest).unwrap();
        clock.advance(std::time::Duration::from_secs(120));
        settle(&clock).await;
        assert!(!state.deleted());
    }

    #[tokio::test]
    async fn snapshot_carries_sequences_and_stamp() {
        let clock = VirtualClock::at_epoch();
        let verifier = ScriptedVerifier::verified();
        let state = account(&clock, &verifier);
        state.create_user(create(&["read_files"])).unwrap();
        state
            .request_add_permission(AddPermissionRequest {
                permission: "write_files".into(),
            })
            .unwrap();

        let snapshot = state.snapshot();
        assert_eq!(snapshot.permissions, vec![Permission::from("read_files")]);
        assert_eq!(
            snapshot.awaiting_approval,
            vec![Permission::from("write_files")]
        );
        assert!(snapshot.deletion_requested_at.is_none());
    }

    #[tokio::test]
    async fn rehydration_with_stamp_rearms_a_fresh_window() {
        let clock = VirtualClock::new(500_000);
        let verifier = ScriptedVerifier::verified();
        let snapshot = AccountSnapshot {
            awaiting_approval: vec![],
            permissions: vec!["read_files".into()],
            deletion_requested_at: Some(Timestamp::from_millis(10_000)),
        };
        let state = account_from(&clock, &verifier, snapshot);
        settle(&clock).await;

        let details = state.user_details();
        assert!(details.deletion_requested);
        // Fresh stamp from the current clock, not the carried-over one.
        assert_eq!(
            details.deletion_requested_at,
            Some(Timestamp::from_millis(500_000))
        );
        assert_eq!(
            details.deletion_scheduled_for,
            Some(Timestamp::from_millis(560_000))
        );

        clock.advance(std::time::Duration::from_secs(60));
        settle(&clock).await;
        assert!(state.deleted());
    }
}
