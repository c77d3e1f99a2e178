use serde::{Deserialize, Serialize};
use thiserror::Error;

const UNKNOWN_INTERACTION_ERROR: &str = "An unknown error occurred while interacting with the chart.";

/// Error body returned by the pivot backend.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ErrorPayload {
    pub error_type: Option<String>,
    pub message: Option<String>,
}

/// Failure of a pivot query issued during an interaction.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum QueryError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("backend error (status {status}): {payload:?}")]
    Backend { status: u16, payload: ErrorPayload },
    #[error("malformed pivot response: {0}")]
    Malformed(String),
}

impl QueryError {
    /// Message for errors the backend reports in a known shape.
    fn known_error_message(payload: &ErrorPayload) -> Option<String> {
        let message = payload.message.clone().unwrap_or_default();
        match payload.error_type.as_deref()? {
            "com.dataiku.dip.pivot.backend.model.SecurityAbortedException" => Some(format!(
                "Too much data to draw. Please adjust chart settings ({})",
                message
            )),
            "ApplicativeException" | "com.dataiku.dip.exceptions.EngineNotAvailableException" => {
                Some(message)
            }
            _ => None,
        }
    }

    /// Best-effort human-readable message for the activity indicator.
    pub fn user_message(&self) -> String {
        match self {
            Self::Backend { payload, .. } => Self::known_error_message(payload)
                .or_else(|| payload.message.clone())
                .unwrap_or_else(|| UNKNOWN_INTERACTION_ERROR.to_string()),
            Self::Transport(message) | Self::Malformed(message) if !message.is_empty() => {
                message.clone()
            }
            _ => UNKNOWN_INTERACTION_ERROR.to_string(),
        }
    }
}
