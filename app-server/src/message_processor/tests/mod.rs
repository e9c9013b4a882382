use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use rewind_app_server_protocol::RewindFilesResult;
use rewind_app_server_protocol::ServerNotification;
use rewind_app_server_protocol::Toast;
use rewind_app_server_protocol::ToastLevel;
use tokio::sync::Notify;
use tokio::sync::mpsc;

use super::MessageProcessor;
use crate::outgoing_message::OutgoingMessageSender;
use crate::sdk_bridge::SdkBridge;
use crate::sdk_bridge::SdkBridgeError;
use crate::workspace_context::WorkspaceContext;


#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct RecordedCall {
    pub(super) session_id: String,
    pub(super) user_message_id: String,
    pub(super) cwd: Option<PathBuf>,
}

pub(super) enum BridgeBehavior {
    Respond(RewindFilesResult),
    Fail(String),
    Panic,
    /// Hold the call open until notified, then respond.
    WaitFor(Arc<Notify>, RewindFilesResult),
}

/// In-process bridge that records every call and answers with a canned
/// behavior.
pub(super) struct RecordingSdkBridge {
    calls: Mutex<Vec<RecordedCall>>,
    behavior: BridgeBehavior,
}

impl RecordingSdkBridge {
    pub(super) fn new(behavior: BridgeBehavior) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            behavior,
        })
    }

    pub(super) fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().expect("calls lock").clone()
    }
}

#[async_trait]
impl SdkBridge for RecordingSdkBridge {
    async fn rewind_files(
        &self,
        session_id: &str,
        user_message_id: &str,
        cwd: Option<&Path>,
    ) -> Result<RewindFilesResult, SdkBridgeError> {
        self.calls.lock().expect("calls lock").push(RecordedCall {
            session_id: session_id.to_string(),
            user_message_id: user_message_id.to_string(),
            cwd: cwd.map(Path::to_path_buf),
        });

        match &self.behavior {
            BridgeBehavior::Respond(result) => Ok(result.clone()),
            BridgeBehavior::Fail(message) => Err(SdkBridgeError::Message(message.clone())),
            BridgeBehavior::Panic => panic!("bridge blew up"),
            BridgeBehavior::WaitFor(release, result) => {
                release.notified().await;
                Ok(result.clone())
            }
        }
    }
}

pub(super) fn setup_processor(
    behavior: BridgeBehavior,
    context: WorkspaceContext,
) -> (
    MessageProcessor,
    mpsc::UnboundedReceiver<ServerNotification>,
    Arc<RecordingSdkBridge>,
) {
    let (outgoing_tx, outgoing_rx) = mpsc::unbounded_channel::<ServerNotification>();
    let outgoing = Arc::new(OutgoingMessageSender::new(outgoing_tx));
    let sdk_bridge = RecordingSdkBridge::new(behavior);

    (
        MessageProcessor::new(outgoing, sdk_bridge.clone(), context),
        outgoing_rx,
        sdk_bridge,
    )
}

/// Drop the processor and collect every toast it (and any task it spawned)
/// produced. Returns once the last sender is gone, so in-flight rewinds are
/// included.
pub(super) async fn drain_toasts(
    processor: MessageProcessor,
    mut outgoing_rx: mpsc::UnboundedReceiver<ServerNotification>,
) -> Vec<Toast> {
    drop(processor);

    let mut toasts = Vec::new();
    while let Some(ServerNotification::AddToast(toast)) = outgoing_rx.recv().await {
        toasts.push(toast);
    }
    toasts
}

pub(super) fn error_toast(message: &str) -> Toast {
    Toast {
        message: message.to_string(),
        level: ToastLevel::Error,
    }
}

#[tokio::test]
async fn drain_waits_for_spawned_rewind() {
    let (processor, outgoing_rx, sdk_bridge) = setup_processor(
        BridgeBehavior::Respond(RewindFilesResult::succeeded()),
        WorkspaceContext::default(),
    );

    assert!(processor.process_line(r#"rewind_files:{"sessionId":"s1","userMessageId":"m1"}"#));

    let toasts = drain_toasts(processor, outgoing_rx).await;
    assert_eq!(toasts, vec![Toast::success("Files restored successfully")]);
    assert_eq!(sdk_bridge.calls().len(), 1);
}
