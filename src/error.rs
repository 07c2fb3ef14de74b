// ❌ Errors - API call and store action failures

/// Error returned by an API client call.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request never produced a response (connection refused, timeout, TLS).
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("server responded with {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body was not the expected JSON shape.
    #[error("could not decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The client could not be built from the given configuration.
    #[error("invalid API configuration: {0}")]
    Config(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

/// Error returned by a store action.
///
/// The user has already been notified by the time a caller sees this.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A save was attempted on a record that has no id yet.
    #[error("The ID string of the {0} must be set")]
    MissingId(&'static str),

    /// The API call behind the action failed.
    #[error(transparent)]
    Api(#[from] ApiError),
}

pub type ApiResult<T> = Result<T, ApiError>;
