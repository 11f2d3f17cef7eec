//! Scriptable approver-verification activity.

use async_trait::async_trait;
use entity_core::effects::{ApprovalVerifier, VERIFY_APPROVER_ACTIVITY};
use entity_core::{ActivityError, VerifyApproverRequest, VerifyApproverResponse};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

/// What the next verification call should do.
#[derive(Clone, Debug)]
pub enum VerifierScript {
    /// Answer `verified = true`.
    Verified,
    /// Answer `verified = false`.
    Denied,
    /// Fail the activity call with the given message.
    Fail(String),
    /// Fail the activity call with a timeout.
    TimeOut,
    /// Park until [`ScriptedVerifier::release`] supplies the answer.
    /// Used to hold an approve handler at its suspension point while
    /// other routines run.
    Hold,
}

#[derive(Debug, Default)]
struct VerifierInner {
    script: Option<VerifierScript>,
    held_outcome: Option<bool>,
    calls: Vec<VerifyApproverRequest>,
}

/// An [`ApprovalVerifier`] driven entirely by the test.
#[derive(Clone, Debug, Default)]
pub struct ScriptedVerifier {
    inner: Arc<Mutex<VerifierInner>>,
    release: Arc<Notify>,
}

impl ScriptedVerifier {
    fn with_script(script: VerifierScript) -> Self {
        let verifier = Self::default();
        verifier.set_script(script);
        verifier
    }

    /// Verifier that approves everything.
    pub fn verified() -> Self {
        Self::with_script(VerifierScript::Verified)
    }

    /// Verifier that denies everything.
    pub fn denied() -> Self {
        Self::with_script(VerifierScript::Denied)
    }

    /// Verifier whose calls park until [`Self::release`].
    pub fn held() -> Self {
        Self::with_script(VerifierScript::Hold)
    }

    /// Change the script for subsequent calls.
    pub fn set_script(&self, script: VerifierScript) {
        self.inner.lock().script = Some(script);
    }

    /// Resolve one held call with the given verdict.
    pub fn release(&self, verified: bool) {
        self.inner.lock().held_outcome = Some(verified);
        self.release.notify_waiters();
    }

    /// Every request seen so far.
    pub fn calls(&self) -> Vec<VerifyApproverRequest> {
        self.inner.lock().calls.clone()
    }
}

#[async_trait]
impl ApprovalVerifier for ScriptedVerifier {
    async fn verify_approver(
        &self,
        request: VerifyApproverRequest,
        timeout: Duration,
    ) -> Result<VerifyApproverResponse, ActivityError> {
        let script = {
            let mut inner = self.inner.lock();
            inner.calls.push(request);
            inner.script.clone()
        };
        match script {
            None | Some(VerifierScript::Verified) => {
                Ok(VerifyApproverResponse { verified: true })
            }
            Some(VerifierScript::Denied) => Ok(VerifyApproverResponse { verified: false }),
            Some(VerifierScript::Fail(message)) => {
                Err(ActivityError::failed(VERIFY_APPROVER_ACTIVITY, message))
            }
            Some(VerifierScript::TimeOut) => {
                Err(ActivityError::timeout(VERIFY_APPROVER_ACTIVITY, timeout))
            }
            Some(VerifierScript::Hold) => loop {
                let released = self.release.notified();
                tokio::pin!(released);
                released.as_mut().enable();
                if let Some(verified) = self.inner.lock().held_outcome.take() {
                    return Ok(VerifyApproverResponse { verified });
                }
                released.await;
            },
        }
    }
}
