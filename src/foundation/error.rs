/// Convenience result type used across epubsmith.
pub type EpubResult<T> = Result<T, EpubError>;

/// Top-level error taxonomy used by the rendering pipeline.
///
/// Every stage fails fast with exactly one of these; the orchestrator never returns a partial
/// package alongside an error.
#[derive(thiserror::Error, Debug)]
pub enum EpubError {
    /// Invalid caller-provided settings, options, or entry paths.
    #[error("validation error: {0}")]
    Validation(String),

    /// A template or cover source could not be reached or read.
    #[error("resolve error: {0}")]
    Resolve(String),

    /// Malformed text encoding or image bytes.
    #[error("decode error: {0}")]
    Decode(String),

    /// Malformed template syntax or a missing referenced field.
    #[error("template error: {0}")]
    Template(String),

    /// Failure while producing the cover asset.
    #[error("encode error: {0}")]
    Encode(String),

    /// Failure while producing the final archive.
    #[error("package error: {0}")]
    Package(String),

    /// The render worker went away before answering.
    #[error("worker error: {0}")]
    Worker(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl EpubError {
    /// Build a [`EpubError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`EpubError::Resolve`] value.
    pub fn resolve(msg: impl Into<String>) -> Self {
        Self::Resolve(msg.into())
    }

    /// Build a [`EpubError::Decode`] value.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Build a [`EpubError::Template`] value.
    pub fn template(msg: impl Into<String>) -> Self {
        Self::Template(msg.into())
    }

    /// Build a [`EpubError::Encode`] value.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Build a [`EpubError::Package`] value.
    pub fn package(msg: impl Into<String>) -> Self {
        Self::Package(msg.into())
    }

    /// Build a [`EpubError::Worker`] value.
    pub fn worker(msg: impl Into<String>) -> Self {
        Self::Worker(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
