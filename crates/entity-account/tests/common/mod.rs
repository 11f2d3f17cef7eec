//! Shared harness: one entity wired to the deterministic test host.

#![allow(dead_code)]

use entity_account::{AccountConfig, LoopExit, UserAccountOrchestration};
use entity_core::{
    AccountSnapshot, AddPermissionRequest, ApprovePermissionRequest, Command, CreateUserRequest,
    DeleteUserRequest, EntityId, EntityResult, Permission, Query, QueryReply, UndoDeleteRequest,
    UserDetailsResponse,
};
use entity_testkit::TestHost;
use std::sync::{Arc, Once};
use tokio::task::JoinHandle;

static TRACING: Once = Once::new();

/// Route entity log output through the test writer, honouring
/// `RUST_LOG`. Idempotent across tests in one binary.
fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

pub struct Harness {
    pub host: TestHost,
    pub orchestration: Arc<UserAccountOrchestration>,
}

impl Harness {
    pub fn new(entity: &str) -> Self {
        Self::with_config(entity, AccountConfig::default())
    }

    pub fn with_config(entity: &str, config: AccountConfig) -> Self {
        init_tracing();
        let host = TestHost::new();
        // One host handle covers clock, spawner, index, registry, and the
        // continuation signal; only the activities come in separately.
        let orchestration = Arc::new(UserAccountOrchestration::with_host(
            EntityId::from(entity),
            config,
            Arc::new(host.clone()),
            Arc::new(host.verifier()),
            Arc::new(host.notifier()),
        ));
        Self {
            host,
            orchestration,
        }
    }

    /// Spawn one control-loop pass and wait for it to come online.
    pub async fn start(&self, snapshot: AccountSnapshot) -> JoinHandle<EntityResult<LoopExit>> {
        let orchestration = Arc::clone(&self.orchestration);
        let handle = tokio::spawn(async move { orchestration.run(snapshot).await });
        self.host.wait_registered().await;
        handle
    }

    pub fn awaiting(&self) -> Vec<Permission> {
        match self.host.query(Query::AwaitingApproval).expect("query") {
            QueryReply::AwaitingApproval(resp) => resp.permissions,
            other => panic!("unexpected reply: {other:?}"),
        }
    }

    pub fn granted(&self) -> Vec<Permission> {
        match self.host.query(Query::PermissionsGranted).expect("query") {
            QueryReply::PermissionsGranted(resp) => resp.permissions,
            other => panic!("unexpected reply: {other:?}"),
        }
    }

    pub fn details(&self) -> UserDetailsResponse {
        match self.host.query(Query::UserDetails).expect("query") {
            QueryReply::UserDetails(resp) => resp,
            other => panic!("unexpected reply: {other:?}"),
        }
    }
}

pub fn create(permissions: &[&str]) -> Command {
    Command::Create(CreateUserRequest {
        permissions: permissions.iter().map(|p| Permission::from(*p)).collect(),
    })
}

pub fn add(permission: &str) -> Command {
    Command::AddPermission(AddPermissionRequest {
        permission: permission.into(),
    })
}

pub fn approve(approver: &str, permission: &str) -> Command {
    Command::ApprovePermission(ApprovePermissionRequest {
        approver_id: approver.to_owned(),
        permission: permission.into(),
    })
}

pub fn delete() -> Command {
    Command::Delete(DeleteUserRequest)
}

pub fn undo_delete() -> Command {
    Command::UndoDelete(UndoDeleteRequest)
}

pub fn perms(tags: &[&str]) -> Vec<Permission> {
    tags.iter().map(|t| Permission::from(*t)).collect()
}
