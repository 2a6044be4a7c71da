use thiserror::Error;

/// Why a single backend attempt produced no usable output.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-2xx status.
    #[error("backend returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// The backend answered but the text was empty after trimming.
    #[error("backend returned empty output")]
    Empty,

    /// The attempt exceeded its time budget.
    #[error("backend timed out after {0:?}")]
    Timeout(std::time::Duration),
}
