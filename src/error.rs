use thiserror::Error;

/// Error taxonomy for the retrieval core.
///
/// Every variant propagates to the caller; no component swallows an error
/// and substitutes default content. The synthesizer's "I do not know"
/// answer is a regular [`crate::models::Answer`], not an error.
#[derive(Debug, Error)]
pub enum Error {
    /// The document directory is missing or contains no extractable text.
    #[error("no extractable documents: {0}")]
    Load(String),

    /// The embedding provider is unreachable or returned malformed vectors.
    #[error("embedding provider error: {0}")]
    Embedding(String),

    /// A persisted index blob is unreadable or its schema does not match.
    #[error("corrupt index: {0}")]
    CorruptIndex(String),

    /// The language model provider failed or returned an unusable response.
    #[error("answer synthesis failed: {0}")]
    Synthesis(String),

    /// A dependency was unavailable while constructing a session.
    #[error("session initialization failed: {0}")]
    Initialization(String),

    /// A provider call exceeded its deadline.
    #[error("provider call timed out: {0}")]
    Timeout(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether a bounded retry with backoff is worth attempting.
    /// Corruption and load errors are never retried.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::Embedding(_) | Error::Synthesis(_) | Error::Timeout(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_errors_are_transient() {
        assert!(Error::Embedding("down".into()).is_transient());
        assert!(Error::Synthesis("503".into()).is_transient());
        assert!(Error::Timeout("embed".into()).is_transient());
    }

    #[test]
    fn test_fatal_errors_are_not_transient() {
        assert!(!Error::Load("missing dir".into()).is_transient());
        assert!(!Error::CorruptIndex("bad version".into()).is_transient());
        assert!(!Error::Initialization("no model".into()).is_transient());
    }
}
