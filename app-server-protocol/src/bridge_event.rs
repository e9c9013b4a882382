use std::fmt;
use std::str::FromStr;

use thiserror::Error;

const EVENT_SEPARATOR: char = ':';

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("bridge event is missing an event type")]
    EmptyEventType,
}

/// A single UI event as it travels over the bridge: `<event_type>:<content>`.
///
/// The content is opaque at this layer. Most handlers expect JSON, but some
/// events carry a bare string (a file path, a URL) or nothing at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeEvent {
    pub event_type: String,
    pub content: String,
}

impl BridgeEvent {
    pub fn new(event_type: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            content: content.into(),
        }
    }

    /// Decode a wire line. Only the first separator is significant, so JSON
    /// content containing `:` passes through untouched. A line without a
    /// separator is an event with empty content.
    pub fn parse(line: &str) -> Result<Self, ProtocolError> {
        let line = line.trim_end_matches(['\r', '\n']);
        let (event_type, content) = line
            .split_once(EVENT_SEPARATOR)
            .unwrap_or((line, ""));

        let event_type = event_type.trim();
        if event_type.is_empty() {
            return Err(ProtocolError::EmptyEventType);
        }

        Ok(Self::new(event_type, content))
    }

    pub fn to_wire_line(&self) -> String {
        format!("{}{EVENT_SEPARATOR}{}", self.event_type, self.content)
    }
}

impl FromStr for BridgeEvent {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for BridgeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_wire_line())
    }
}
