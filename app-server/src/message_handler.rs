use crate::workspace_context::WorkspaceContext;

/// A handler for one family of UI events.
///
/// `handle` returns `false` when the event type is not one it recognizes so
/// the processor can offer the event to the next handler. Handlers must not
/// block: long-running work is spawned and reports back through the outgoing
/// channel.
pub trait MessageHandler: Send + Sync {
    fn supported_types(&self) -> &'static [&'static str];

    fn handle(&self, event_type: &str, content: &str, context: &WorkspaceContext) -> bool;
}
