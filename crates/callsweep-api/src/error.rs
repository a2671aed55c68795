use thiserror::Error;

/// Errors surfaced by the service client.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Service returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Sign-in rejected: {0}")]
    AuthRejected(String),

    #[error("No live service session")]
    HandleClosed,
}
