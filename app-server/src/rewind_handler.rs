use std::path::PathBuf;
use std::sync::Arc;

use rewind_app_server_protocol::REWIND_FILES_EVENT;
use rewind_app_server_protocol::RewindFilesResult;
use rewind_app_server_protocol::RewindOutcome;
use rewind_app_server_protocol::RewindRequest;
use tokio::runtime::Handle;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::message_handler::MessageHandler;
use crate::outgoing_message::OutgoingMessageSender;
use crate::sdk_bridge::SdkBridge;
use crate::sdk_bridge::SdkBridgeError;
use crate::workspace_context::WorkspaceContext;

const SUPPORTED_TYPES: &[&str] = &[REWIND_FILES_EVENT];

const REWIND_SUCCEEDED_MESSAGE: &str = "Files restored successfully";

/// Restores files to the state they had at an earlier user message.
///
/// Validation happens on the caller; the SDK bridge call runs on a spawned
/// task and its outcome is reported as a toast. Overlapping rewinds for the
/// same session are not serialized here.
pub struct RewindHandler {
    outgoing: Arc<OutgoingMessageSender>,
    sdk_bridge: Arc<dyn SdkBridge>,
}

impl RewindHandler {
    pub fn new(outgoing: Arc<OutgoingMessageSender>, sdk_bridge: Arc<dyn SdkBridge>) -> Self {
        Self {
            outgoing,
            sdk_bridge,
        }
    }

    fn handle_rewind_files(&self, content: &str, context: &WorkspaceContext) {
        let request = match RewindRequest::from_json(content) {
            Ok(request) => request,
            Err(err) if err.is_missing_field() => {
                warn!("rejecting rewind request: {err}");
                self.outgoing.show_error(err.user_message());
                return;
            }
            Err(err) => {
                error!("failed to parse rewind request: {err}");
                self.outgoing.show_error(err.user_message());
                return;
            }
        };

        let runtime = match Handle::try_current() {
            Ok(runtime) => runtime,
            Err(err) => {
                error!("cannot dispatch rewind without an async runtime: {err}");
                self.outgoing
                    .show_error(format!("Rewind operation failed: {err}"));
                return;
            }
        };

        let cwd = context.resolve_working_directory();
        debug!(
            session_id = request.session_id(),
            user_message_id = request.user_message_id(),
            cwd = ?cwd,
            "dispatching rewind to SDK bridge"
        );
        let outgoing = self.outgoing.clone();
        let sdk_bridge = self.sdk_bridge.clone();
        runtime.spawn(async move {
            let result = call_sdk_bridge(sdk_bridge, request, cwd).await;
            report_rewind_result(&outgoing, result);
        });
    }
}

impl MessageHandler for RewindHandler {
    fn supported_types(&self) -> &'static [&'static str] {
        SUPPORTED_TYPES
    }

    fn handle(&self, event_type: &str, content: &str, context: &WorkspaceContext) -> bool {
        if event_type != REWIND_FILES_EVENT {
            return false;
        }

        info!("handling {REWIND_FILES_EVENT}, content: {content}");
        self.handle_rewind_files(content, context);
        true
    }
}

/// Runs the bridge call on its own task; a panic surfaces as
/// [`SdkBridgeError::Aborted`].
async fn call_sdk_bridge(
    sdk_bridge: Arc<dyn SdkBridge>,
    request: RewindRequest,
    cwd: Option<PathBuf>,
) -> Result<RewindFilesResult, SdkBridgeError> {
    let call = tokio::spawn(async move {
        sdk_bridge
            .rewind_files(
                request.session_id(),
                request.user_message_id(),
                cwd.as_deref(),
            )
            .await
    });

    match call.await {
        Ok(result) => result,
        Err(err) => Err(SdkBridgeError::Aborted(err.to_string())),
    }
}

fn report_rewind_result(
    outgoing: &OutgoingMessageSender,
    result: Result<RewindFilesResult, SdkBridgeError>,
) {
    match result.map(RewindOutcome::from) {
        Ok(RewindOutcome::Success) => {
            info!("rewind successful");
            outgoing.show_success(REWIND_SUCCEEDED_MESSAGE);
        }
        Ok(RewindOutcome::Failure { message }) => {
            warn!("rewind failed: {message}");
            outgoing.show_error(format!("Failed to restore files: {message}"));
        }
        Err(err) => {
            error!("rewind exception: {err}");
            outgoing.show_error(format!("Rewind operation failed: {err}"));
        }
    }
}
