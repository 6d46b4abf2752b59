use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{
    delivery::{DoseDeliveryChannel, DueReason},
    models::medicine::Medicine,
};

/// The reminder currently on screen, if any.
pub type LastDue = Arc<Mutex<Option<Medicine>>>;

const BELL: char = '\x07';

/// Shows due doses on the terminal: a popup-style message plus the terminal bell.
pub struct ConsoleDeliveryChannel {
    last_due: LastDue,
}

impl ConsoleDeliveryChannel {
    pub fn new(last_due: LastDue) -> Self {
        Self { last_due }
    }
}

#[async_trait]
impl DoseDeliveryChannel for ConsoleDeliveryChannel {
    async fn send_due_notification(
        &self,
        medicine: &Medicine,
        reason: DueReason,
    ) -> anyhow::Result<()> {
        *self.last_due.lock().await = Some(medicine.clone());
        println!("{BELL}{}", render_due(medicine, reason));
        Ok(())
    }
}

pub fn render_due(medicine: &Medicine, reason: DueReason) -> String {
    let header = match reason {
        DueReason::Scheduled => "🔔 Time for your dose!",
        DueReason::Snoozed => "🔔 Snoozed reminder:",
    };
    let notes = medicine
        .notes
        .as_deref()
        .map(|notes| format!("\n   📝 {notes}"))
        .unwrap_or_default();

    format!(
        "{header} {} ({}){notes}\n   Type `taken` once you've taken it, or `snooze` to be reminded again shortly.",
        medicine.name, medicine.dosage
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::daily;

    #[test]
    fn renders_snoozed_reminder_with_notes() {
        let mut medicine = daily("1", "08:00");
        medicine.notes = Some("after breakfast".to_owned());

        let text = render_due(&medicine, DueReason::Snoozed);

        assert!(text.starts_with("🔔 Snoozed reminder: Medicine 1 (1 tablet)"));
        assert!(text.contains("📝 after breakfast"));
    }

    #[tokio::test]
    async fn remembers_last_due_medicine() {
        let last_due = LastDue::default();
        let channel = ConsoleDeliveryChannel::new(Arc::clone(&last_due));

        channel
            .send_due_notification(&daily("7", "09:00"), DueReason::Scheduled)
            .await
            .unwrap();

        assert_eq!(last_due.lock().await.as_ref().map(|m| m.id.as_str()), Some("7"));
    }
}
