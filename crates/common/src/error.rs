//! Error types shared across SteadyCut crates.

/// Top-level error type for SteadyCut operations.
///
/// Caller-facing failures fall into three structured categories
/// (see [`ErrorKind`]); everything else is internal.
#[derive(Debug, thiserror::Error)]
pub enum SteadyError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Precondition failed: {message}")]
    PreconditionFailed { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Render error: {message}")]
    Render { message: String },

    #[error("Captions error: {message}")]
    Captions { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using SteadyError.
pub type SteadyResult<T> = Result<T, SteadyError>;

/// Coarse classification of a [`SteadyError`] for callers that branch on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    InvalidInput,
    PreconditionFailed,
    Internal,
}

impl SteadyError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: msg.into(),
        }
    }

    pub fn precondition(msg: impl Into<String>) -> Self {
        Self::PreconditionFailed {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render {
            message: msg.into(),
        }
    }

    pub fn captions(msg: impl Into<String>) -> Self {
        Self::Captions {
            message: msg.into(),
        }
    }

    /// Structured category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::InvalidInput { .. } | Self::Config { .. } => ErrorKind::InvalidInput,
            Self::PreconditionFailed { .. } => ErrorKind::PreconditionFailed,
            _ => ErrorKind::Internal,
        }
    }
}
