use thiserror::Error;

/// Failures talking to the occupancy service.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("CSRF token not found in landing page")]
    TokenNotFound,

    #[error("Landing page request failed with status {status_code}")]
    AuthFailure { status_code: u16 },

    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to decode occupancy response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Failures of the time-series write collaborator.
#[derive(Error, Debug)]
pub enum WriteError {
    #[error("Write request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Write rejected with status {status_code}: {body}")]
    Rejected { status_code: u16, body: String },

    #[error("Writer is closed")]
    Closed,
}

/// Unrecoverable fault while a session loop was running.
#[derive(Error, Debug)]
pub enum LoopError {
    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error(transparent)]
    Write(#[from] WriteError),
}
