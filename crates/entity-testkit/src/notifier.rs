//! Recording grant-notification activity.

use async_trait::async_trait;
use entity_core::effects::Notifier;
use entity_core::{ActivityError, SendNotificationsRequest};
use parking_lot::Mutex;
use std::sync::Arc;

/// Captures every notification the entity fires.
#[derive(Clone, Debug, Default)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<SendNotificationsRequest>>>,
}

impl RecordingNotifier {
    /// Every notification seen so far.
    pub fn sent(&self) -> Vec<SendNotificationsRequest> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_notifications(
        &self,
        request: SendNotificationsRequest,
    ) -> Result<(), ActivityError> {
        self.sent.lock().push(request);
        Ok(())
    }
}
