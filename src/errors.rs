use std::time::Duration;

use thiserror::Error;

/// Why a response body could not be used.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BadResponseReason {
    /// The response did not declare `application/json`.
    #[error("expected content-type application/json, got {0:?}")]
    ContentType(Option<String>),

    /// The body claimed to be JSON but failed to parse.
    #[error("JSON parsing error: {0}")]
    Parse(String),

    /// The body was declared as JSON but was empty.
    #[error("received an empty application/json body")]
    EmptyBody,

    /// Valid JSON that does not have the expected payload shape.
    #[error("unexpected payload shape: {0}")]
    Schema(String),

    /// A reported `total` that would need more pages than a fetch allows.
    #[error("total of {total} items at {per_page} per page exceeds {max_pages} pages")]
    ImplausibleTotal {
        total: u64,
        per_page: u64,
        max_pages: u64,
    },
}

/// All errors that can occur when talking to the JW Platform API.
#[derive(Error, Debug)]
pub enum JwPlatformError {
    /// Neither the call nor the client supplied a usable key.
    #[error("{0} is required to make a request")]
    MissingCredentials(&'static str),

    /// A caller-supplied argument was rejected before any request was made.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The client is cooling down after a 429 and refused to send the request.
    #[error("request for {path} has been blocked by the client for rate limiting")]
    RateLimitBlocked { path: String },

    /// The server answered with HTTP 429.
    #[error("JW Platform api limit exceeded (blocked for {cooldown:?})")]
    RateLimitExceeded { cooldown: Duration },

    /// A transport-level HTTP error from reqwest.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response could not be interpreted.
    #[error("bad response: {0}")]
    BadResponse(#[from] BadResponseReason),

    /// Any other non-200 answer, with the parsed body.
    #[error("API error {status_code} {status_text}")]
    Remote {
        status_code: u16,
        status_text: String,
        body: serde_json::Value,
    },

    /// The playlist lookup returned 404.
    #[error("JW Player channel not found for id {0:?}")]
    PlaylistNotFound(String),

    /// The video lookup returned 404.
    #[error("video not found for id {0:?}")]
    VideoNotFound(String),

    /// The command-dispatch collaborator could not create an item.
    #[error("item creation failed: {0}")]
    Dispatch(String),
}

impl JwPlatformError {
    /// Stable code reported alongside bus notifications.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingCredentials(_) => "JW_MISSING_CREDENTIALS",
            Self::InvalidArgument(_) => "JW_INVALID_ARGUMENT",
            Self::RateLimitBlocked { .. } => "JW_RATE_LIMIT_BLOCKED",
            Self::RateLimitExceeded { .. } => "JWPLAYER_RATE_LIMIT",
            Self::Transport(_) => "JW_TRANSPORT_ERROR",
            Self::BadResponse(_) => "JW_BAD_RESPONSE",
            Self::Remote { .. } => "JW_REMOTE_ERROR",
            Self::PlaylistNotFound(_) => "JW_CHANNEL_PLAYLIST_NOT_FOUND",
            Self::VideoNotFound(_) => "VIDEO_NOT_FOUND",
            Self::Dispatch(_) => "JW_DISPATCH_ERROR",
        }
    }
}

/// A convenience alias for `Result<T, JwPlatformError>`.
pub type Result<T> = std::result::Result<T, JwPlatformError>;
