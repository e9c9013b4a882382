use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use thiserror::Error;

/// Event type the UI sends to restore files to an earlier user message.
pub const REWIND_FILES_EVENT: &str = "rewind_files";

/// Failure text used when the SDK bridge reports failure without a reason.
pub const UNKNOWN_ERROR_MESSAGE: &str = "Unknown error";

#[derive(Debug, Error)]
pub enum RewindRequestError {
    #[error("rewind payload is not valid JSON: {0}")]
    MalformedPayload(#[source] serde_json::Error),

    #[error("rewind payload must be a JSON object")]
    NotAnObject,

    #[error("rewind payload field `{field}` must be a string")]
    InvalidField { field: &'static str },

    #[error("missing sessionId")]
    MissingSessionId,

    #[error("missing userMessageId")]
    MissingUserMessageId,
}

impl RewindRequestError {
    /// Text surfaced to the user for this rejection.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::MissingSessionId => "Session ID is required for rewind operation",
            Self::MissingUserMessageId => "User message ID is required for rewind operation",
            Self::MalformedPayload(_) | Self::NotAnObject | Self::InvalidField { .. } => {
                "Invalid rewind request"
            }
        }
    }

    pub fn is_missing_field(&self) -> bool {
        matches!(self, Self::MissingSessionId | Self::MissingUserMessageId)
    }
}

/// Raw `rewind_files` payload as sent by the UI, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewindFilesParams {
    pub session_id: Option<String>,
    pub user_message_id: Option<String>,
}

impl RewindFilesParams {
    /// Decode the payload leniently: absent fields are missing, scalar values
    /// are taken in their textual form, `null` and nested values are
    /// rejected.
    pub fn from_json(content: &str) -> Result<Self, RewindRequestError> {
        let value: Value =
            serde_json::from_str(content).map_err(RewindRequestError::MalformedPayload)?;
        let Value::Object(fields) = value else {
            return Err(RewindRequestError::NotAnObject);
        };

        Ok(Self {
            session_id: string_field(&fields, "sessionId")?,
            user_message_id: string_field(&fields, "userMessageId")?,
        })
    }

    pub fn into_request(self) -> Result<RewindRequest, RewindRequestError> {
        let session_id =
            non_empty(self.session_id).ok_or(RewindRequestError::MissingSessionId)?;
        let user_message_id =
            non_empty(self.user_message_id).ok_or(RewindRequestError::MissingUserMessageId)?;

        Ok(RewindRequest {
            session_id,
            user_message_id,
        })
    }
}

fn string_field(
    fields: &Map<String, Value>,
    field: &'static str,
) -> Result<Option<String>, RewindRequestError> {
    match fields.get(field) {
        None => Ok(None),
        Some(Value::String(value)) => Ok(Some(value.clone())),
        Some(Value::Number(value)) => Ok(Some(value.to_string())),
        Some(Value::Bool(value)) => Ok(Some(value.to_string())),
        Some(Value::Null | Value::Array(_) | Value::Object(_)) => {
            Err(RewindRequestError::InvalidField { field })
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|candidate| !candidate.is_empty())
}

/// A validated rewind request. Both identifiers are guaranteed non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewindRequest {
    session_id: String,
    user_message_id: String,
}

impl RewindRequest {
    /// Decode and validate a `rewind_files` payload in one step.
    pub fn from_json(content: &str) -> Result<Self, RewindRequestError> {
        RewindFilesParams::from_json(content)?.into_request()
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn user_message_id(&self) -> &str {
        &self.user_message_id
    }
}

/// Result object returned by the SDK bridge for a rewind call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewindFilesResult {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RewindFilesResult {
    pub fn succeeded() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewindOutcome {
    Success,
    Failure { message: String },
}

impl From<RewindFilesResult> for RewindOutcome {
    fn from(result: RewindFilesResult) -> Self {
        if result.success {
            return Self::Success;
        }

        let message = result
            .error
            .unwrap_or_else(|| UNKNOWN_ERROR_MESSAGE.to_string());
        Self::Failure { message }
    }
}
