use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Lichess rejected the API token")]
    Unauthorized,

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Rate limited by Lichess, retry in a minute")]
    RateLimited,

    #[error("HTTP {status}: {url}")]
    Status { status: u16, url: String },

    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Failed to decode response: {0}")]
    Decode(String),
}
