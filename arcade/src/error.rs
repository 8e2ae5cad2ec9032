use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArcadeError {
    #[error("unknown move: {0:?}")]
    UnknownMove(String),

    #[error("settings io: {0}")]
    Io(#[from] io::Error),

    #[error("settings format: {0}")]
    Format(#[from] serde_json::Error),
}
