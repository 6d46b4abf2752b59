use async_trait::async_trait;

use crate::models::medicine::Medicine;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum DueReason {
    Scheduled,
    Snoozed,
}

/// Outbound side of the scheduler: receives every `DUE` event. Rendering it (popup,
/// system notification, sound) is up to the implementation.
#[async_trait]
pub trait DoseDeliveryChannel: Send + Sync + 'static {
    async fn send_due_notification(
        &self,
        medicine: &Medicine,
        reason: DueReason,
    ) -> anyhow::Result<()>;
}
