use std::sync::Arc;

use rewind_app_server_protocol::BridgeEvent;
use tracing::debug;
use tracing::warn;

use crate::message_handler::MessageHandler;
use crate::outgoing_message::OutgoingMessageSender;
use crate::rewind_handler::RewindHandler;
use crate::sdk_bridge::SdkBridge;
use crate::workspace_context::WorkspaceContext;

/// Routes UI events to the first handler that claims them.
pub struct MessageProcessor {
    handlers: Vec<Box<dyn MessageHandler>>,
    context: WorkspaceContext,
}

impl MessageProcessor {
    /// Create a processor with the built-in handlers registered. The outgoing
    /// sender is shared with every handler so results can be enqueued from
    /// spawned tasks.
    pub fn new(
        outgoing: Arc<OutgoingMessageSender>,
        sdk_bridge: Arc<dyn SdkBridge>,
        context: WorkspaceContext,
    ) -> Self {
        let rewind_handler = RewindHandler::new(outgoing, sdk_bridge);
        Self {
            handlers: vec![Box::new(rewind_handler)],
            context,
        }
    }

    pub fn register_handler(&mut self, handler: Box<dyn MessageHandler>) {
        self.handlers.push(handler);
    }

    pub fn context(&self) -> &WorkspaceContext {
        &self.context
    }

    pub fn set_context(&mut self, context: WorkspaceContext) {
        self.context = context;
    }

    pub fn supported_types(&self) -> Vec<&'static str> {
        self.handlers
            .iter()
            .flat_map(|handler| handler.supported_types().iter().copied())
            .collect()
    }

    /// Decode and route one wire line. Returns whether a handler took it.
    pub fn process_line(&self, line: &str) -> bool {
        match BridgeEvent::parse(line) {
            Ok(event) => self.process_event(&event),
            Err(err) => {
                warn!("dropping undecodable bridge line `{line}`: {err}");
                false
            }
        }
    }

    pub fn process_event(&self, event: &BridgeEvent) -> bool {
        let handled = self
            .handlers
            .iter()
            .any(|handler| handler.handle(&event.event_type, &event.content, &self.context));

        if !handled {
            warn!("no handler for event type `{}`", event.event_type);
        } else {
            debug!("event `{}` handled", event.event_type);
        }
        handled
    }
}

#[cfg(test)]
mod tests;
