// Errors surfaced by calls to the REST backend.
use http::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid backend url '{0}'")]
    InvalidUrl(String),
    #[error("stored token cannot be sent as a header")]
    InvalidToken,
    #[error("request failed: {0}")]
    Transport(String),
    #[error("request timed out")]
    Timeout,
    #[error("{}", describe_status(.status, .detail))]
    Status {
        status: StatusCode,
        detail: Option<String>,
    },
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
}

fn describe_status(status: &StatusCode, detail: &Option<String>) -> String {
    match detail {
        Some(d) => format!("server returned {}: {}", status, d),
        None => format!("server returned {}", status),
    }
}

impl ApiError {
    /// Message fit for display: the backend `detail` when it sent one,
    /// otherwise `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ApiError::Status {
                detail: Some(detail),
                ..
            } => detail.clone(),
            _ => fallback.to_string(),
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED)
    }
}
