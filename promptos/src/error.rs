use thiserror::Error;

use crate::credits::ActionClass;

/// Every failure here is local to one user action; none ends the session.
#[derive(Debug, Error)]
pub enum Error {
    #[error("api error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("request failed: {0}")]
    Transport(String),

    #[error("unexpected response: {0}")]
    Decode(String),

    #[error("daily AI credits limit reached")]
    LimitReached,

    #[error("{0} is already in progress")]
    Busy(ActionClass),

    #[error("not signed in")]
    NotSignedIn,

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("invalid input: {0}")]
    Invalid(String),
}

impl Error {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Error::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Credit exhaustion gets its own user-visible state.
    pub fn is_limit_reached(&self) -> bool {
        matches!(self, Error::LimitReached)
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Error::Decode(err.to_string())
        } else {
            Error::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Decode(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
