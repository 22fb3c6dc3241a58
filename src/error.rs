use reqwest::StatusCode;

use crate::{ClassifiedError, RawResponse};

/// Error type returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum EnrichError {
    /// Network or request execution error from `reqwest`. Never retried.
    #[error("transport error: {0}")]
    Transport(reqwest::Error),
    /// Terminal non-success status with the reason decoded from its body.
    #[error("api error {}: {error}", .response.status.as_u16())]
    Api {
        error: ClassifiedError,
        response: RawResponse,
    },
    /// The server kept signaling "processing" until the retry budget ran out.
    #[error("{error} (after {attempts} attempts)")]
    Exhausted {
        error: ClassifiedError,
        attempts: usize,
        response: RawResponse,
    },
    /// A success body could not be decoded into the target type.
    #[error("decode error: {message}")]
    Decode {
        message: String,
        response: RawResponse,
    },
    /// The call's cancel token fired before it completed.
    #[error("request cancelled after {attempts} attempts")]
    Cancelled { attempts: usize },
    /// The next hold would have crossed the configured overall deadline.
    #[error("request deadline exceeded after {attempts} attempts")]
    DeadlineExceeded { attempts: usize },
    /// Path, query or body could not be turned into a request.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl EnrichError {
    /// Machine reason code, when the error carries one.
    pub fn reason(&self) -> Option<&str> {
        self.classified().map(|error| error.reason.as_str())
    }

    /// Human message, when the error carries one.
    pub fn message(&self) -> Option<&str> {
        self.classified().map(|error| error.message.as_str())
    }

    pub fn classified(&self) -> Option<&ClassifiedError> {
        match self {
            Self::Api { error, .. } | Self::Exhausted { error, .. } => Some(error),
            _ => None,
        }
    }

    /// Raw response of the last exchange, when one was received.
    pub fn response(&self) -> Option<&RawResponse> {
        match self {
            Self::Api { response, .. }
            | Self::Exhausted { response, .. }
            | Self::Decode { response, .. } => Some(response),
            Self::Transport(_)
            | Self::Cancelled { .. }
            | Self::DeadlineExceeded { .. }
            | Self::InvalidRequest(_) => None,
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Transport(err) => err.status(),
            _ => self.response().map(|response| response.status),
        }
    }
}
