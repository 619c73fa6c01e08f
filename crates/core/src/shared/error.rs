use std::path::PathBuf;

use thiserror::Error;

/// Boxed error reported by a decode/encode collaborator.
pub type SourceError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum AugmentError {
    /// Invalid bounds, choices, probabilities or asset lists. Raised only
    /// while constructing operators, never while running them.
    #[error("invalid configuration: {0}")]
    Configuration(String),
    #[error("unexpected input shape: {0}")]
    InputShape(String),
    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: SourceError,
    },
    #[error("failed to encode {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: SourceError,
    },
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// A serialized parameter list does not line up with the pipeline it is
    /// being loaded into.
    #[error("cannot replay parameters: {0}")]
    Replay(String),
}

impl AugmentError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn shape(message: impl Into<String>) -> Self {
        Self::InputShape(message.into())
    }
}

pub type Result<T> = std::result::Result<T, AugmentError>;
