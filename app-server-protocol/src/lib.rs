//! Wire types shared between the rewind app server and the UI that drives it.
//!
//! Inbound traffic is a stream of [`BridgeEvent`]s (`<type>:<content>` lines);
//! outbound traffic is a stream of [`ServerNotification`]s serialized as JSON.

mod bridge_event;
mod notification;
mod rewind;

pub use bridge_event::BridgeEvent;
pub use bridge_event::ProtocolError;
pub use notification::ServerNotification;
pub use notification::Toast;
pub use notification::ToastLevel;
pub use rewind::REWIND_FILES_EVENT;
pub use rewind::RewindFilesParams;
pub use rewind::RewindFilesResult;
pub use rewind::RewindOutcome;
pub use rewind::RewindRequest;
pub use rewind::RewindRequestError;
pub use rewind::UNKNOWN_ERROR_MESSAGE;
