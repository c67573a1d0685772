//! In-process update bus backed by a tokio broadcast channel.

use tokio::sync::broadcast;

use somahub_domain::status::UpdateStatus;

/// Broadcasts the outcome of every poll cycle to interested listeners.
///
/// Publishing succeeds even when there are no active subscribers
/// (the status is simply dropped).
pub struct UpdateBus {
    sender: broadcast::Sender<UpdateStatus>,
}

impl UpdateBus {
    /// Create a new bus with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to cycle outcomes.
    ///
    /// Returns a receiver that will get every status published *after*
    /// the subscription is created.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<UpdateStatus> {
        self.sender.subscribe()
    }

    /// Publish a cycle outcome.
    pub fn publish(&self, status: UpdateStatus) {
        // broadcast::send fails only when there are zero receivers.
        let _ = self.sender.send(status);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use somahub_domain::status;

    #[tokio::test]
    async fn should_deliver_status_to_subscriber() {
        let bus = UpdateBus::new(16);
        let mut rx = bus.subscribe();

        let status = UpdateStatus::succeeded(status::now());
        bus.publish(status.clone());

        assert_eq!(rx.recv().await.unwrap(), status);
    }

    #[tokio::test]
    async fn should_deliver_status_to_multiple_subscribers() {
        let bus = UpdateBus::new(16);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(UpdateStatus::failed(status::now(), Vec::new()));

        assert!(!rx1.recv().await.unwrap().success);
        assert!(!rx2.recv().await.unwrap().success);
    }

    #[test]
    fn should_not_panic_when_no_subscribers() {
        let bus = UpdateBus::new(16);
        bus.publish(UpdateStatus::succeeded(status::now()));
    }

    #[tokio::test]
    async fn should_not_deliver_statuses_published_before_subscription() {
        let bus = UpdateBus::new(16);
        bus.publish(UpdateStatus::failed(status::now(), Vec::new()));

        let mut rx = bus.subscribe();
        bus.publish(UpdateStatus::succeeded(status::now()));

        assert!(rx.recv().await.unwrap().success);
    }
}
