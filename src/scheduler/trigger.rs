use std::time::Duration;

use tokio::{
    sync::mpsc,
    task::{self, JoinHandle},
    time,
};
use tokio_util::sync::CancellationToken;

pub(super) type Generation = u64;

/// A single deferred wake-up. When the delay elapses it reports its generation back to
/// the scheduler, which ignores generations it no longer holds.
pub(super) struct ScheduledTrigger {
    task_handle: JoinHandle<()>,
    cancellation_token: CancellationToken,
}

impl ScheduledTrigger {
    pub fn arm(
        generation: Generation,
        delay: Duration,
        elapsed_tx: mpsc::UnboundedSender<Generation>,
    ) -> Self {
        let cancellation_token = CancellationToken::new();
        let task_cancellation_token = cancellation_token.child_token();

        let task_handle = task::spawn(async move {
            tokio::select! {
                _ = task_cancellation_token.cancelled() => {
                    log::debug!("Trigger was cancelled. [generation = {generation}]");
                },
                _ = time::sleep(delay) => {
                    let _ = elapsed_tx.send(generation);
                }
            }
        });

        Self {
            task_handle,
            cancellation_token,
        }
    }

    pub async fn cancel(self, timeout: Duration) {
        self.cancellation_token.cancel();
        let cancel_with_timeout = time::timeout(timeout, self.task_handle);
        let _ = cancel_with_timeout.await;
    }
}
