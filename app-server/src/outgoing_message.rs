use rewind_app_server_protocol::ServerNotification;
use rewind_app_server_protocol::Toast;
use tokio::sync::mpsc;
use tracing::warn;

/// Sending half of the outgoing notification channel.
///
/// Handlers and the tasks they spawn never write to the UI directly; they
/// enqueue here and the single consumer that owns the transport delivers in
/// order. Sending never blocks, so it is safe from synchronous handler code.
#[derive(Debug, Clone)]
pub struct OutgoingMessageSender {
    sender: mpsc::UnboundedSender<ServerNotification>,
}

impl OutgoingMessageSender {
    pub fn new(sender: mpsc::UnboundedSender<ServerNotification>) -> Self {
        Self { sender }
    }

    pub fn send_notification(&self, notification: ServerNotification) {
        if let Err(err) = self.sender.send(notification) {
            warn!("dropping notification, outgoing channel is closed: {:?}", err.0);
        }
    }

    pub fn send_toast(&self, toast: Toast) {
        self.send_notification(ServerNotification::AddToast(toast));
    }

    pub fn show_success(&self, message: impl Into<String>) {
        self.send_toast(Toast::success(message));
    }

    pub fn show_error(&self, message: impl Into<String>) {
        self.send_toast(Toast::error(message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rewind_app_server_protocol::ToastLevel;

    #[tokio::test]
    async fn toasts_arrive_in_send_order() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let outgoing = OutgoingMessageSender::new(tx);

        outgoing.show_error("first");
        outgoing.show_success("second");
        drop(outgoing);

        let mut received = Vec::new();
        while let Some(ServerNotification::AddToast(toast)) = rx.recv().await {
            received.push((toast.message, toast.level));
        }

        assert_eq!(
            received,
            vec![
                ("first".to_string(), ToastLevel::Error),
                ("second".to_string(), ToastLevel::Success),
            ]
        );
    }

    #[test]
    fn closed_channel_does_not_panic() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);

        OutgoingMessageSender::new(tx).show_error("nobody is listening");
    }
}
