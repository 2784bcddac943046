use parley_model::TransportError;
use serde::{Deserialize, Serialize};

/// How a scripted reply fails.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PresetFailure {
    /// The endpoint cannot be reached.
    #[serde(rename = "network")]
    Network,
    /// The endpoint answers with this HTTP status.
    #[serde(rename = "status")]
    Status(u16),
    /// The endpoint answers, but without any text.
    #[serde(rename = "malformed")]
    Malformed,
}

/// The preset reply for one user turn.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PresetReply {
    /// The assistant answers with this text.
    #[serde(rename = "text")]
    Text(String),
    /// The exchange fails.
    #[serde(rename = "failure")]
    Failure(PresetFailure),
}

impl PresetReply {
    /// Creates a successful reply.
    #[inline]
    pub fn text<S: Into<String>>(text: S) -> Self {
        Self::Text(text.into())
    }

    /// Creates a reply that fails with the given HTTP status.
    #[inline]
    pub fn status(status: u16) -> Self {
        Self::Failure(PresetFailure::Status(status))
    }

    pub(crate) fn to_result(&self) -> Result<String, TransportError> {
        match self {
            PresetReply::Text(text) => Ok(text.clone()),
            PresetReply::Failure(PresetFailure::Network) => {
                Err(TransportError::network_failure()
                    .with_detail("connection refused"))
            }
            PresetReply::Failure(PresetFailure::Status(status)) => {
                Err(TransportError::non_success_status(*status)
                    .with_detail("scripted failure"))
            }
            PresetReply::Failure(PresetFailure::Malformed) => {
                Err(TransportError::malformed_response()
                    .with_detail("missing candidates"))
            }
        }
    }
}
