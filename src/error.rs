//! Centralized error handling for the forensic truth engine.
//!
//! Provides `EngineError` with one variant per category in the error
//! taxonomy, implementing standard error traits and Serde serialization so
//! callers embedding this engine (CLI, service, or UI shell) can surface a
//! stable error shape across a process boundary.
//!
//! # Serialization
//!
//! Serializes to JSON with structure:
//! ```json
//! { "error_type": "variant_name", "message": "details" }
//! ```

use serde::{Serialize, Serializer};
use thiserror::Error;

/// Engine-wide error type.
///
/// Fatal variants (`DuplicateStatementId`, `EmbeddingAlreadySet`,
/// `FrozenIndexMutation`, `InvalidLexicon`) abort the current run and are
/// returned from `run`/`add`/`update_embedding`. `EmptyCorpus` and
/// `MissingDerivedArtifact` are non-fatal: callers that want the warning
/// surfaced as an error can still match on them, but the engine itself only
/// ever records them into `VerificationStatus` and continues.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A statement id was added twice to the same index.
    #[error("duplicate statement id: {0}")]
    DuplicateStatementId(String),

    /// A caller attempted to set an embedding, sentiment, or certainty slot
    /// that was already written (set-once violation).
    #[error("embedding already set for statement {0}")]
    EmbeddingAlreadySet(String),

    /// A write was attempted against a frozen `StatementIndex`.
    #[error("statement index is frozen: {0}")]
    FrozenIndexMutation(String),

    /// No statements were supplied for analysis.
    #[error("empty corpus: {0}")]
    EmptyCorpus(String),

    /// A derived artifact (embeddings, timeline, entity profiles) was
    /// missing at the point a pass needed it and had to be rebuilt.
    #[error("missing derived artifact: {0}")]
    MissingDerivedArtifact(String),

    /// A caller-supplied lexicon override failed to compile (bad regex,
    /// malformed word-boundary pattern). This is a misconfiguration, not a
    /// data anomaly, so it is always fatal.
    #[error("invalid lexicon: {0}")]
    InvalidLexicon(String),
}

impl EngineError {
    /// Returns the error type name for serialization.
    fn error_type(&self) -> &'static str {
        match self {
            EngineError::DuplicateStatementId(_) => "DuplicateStatementId",
            EngineError::EmbeddingAlreadySet(_) => "EmbeddingAlreadySet",
            EngineError::FrozenIndexMutation(_) => "FrozenIndexMutation",
            EngineError::EmptyCorpus(_) => "EmptyCorpus",
            EngineError::MissingDerivedArtifact(_) => "MissingDerivedArtifact",
            EngineError::InvalidLexicon(_) => "InvalidLexicon",
        }
    }

    fn message(&self) -> String {
        match self {
            EngineError::DuplicateStatementId(m)
            | EngineError::EmbeddingAlreadySet(m)
            | EngineError::FrozenIndexMutation(m)
            | EngineError::EmptyCorpus(m)
            | EngineError::MissingDerivedArtifact(m)
            | EngineError::InvalidLexicon(m) => m.clone(),
        }
    }

    /// True for the two error kinds the engine treats as non-fatal
    /// warnings rather than run-aborting failures (§7).
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            EngineError::EmptyCorpus(_) | EngineError::MissingDerivedArtifact(_)
        )
    }
}

/// Custom serialization for IPC/log compatibility.
impl Serialize for EngineError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("EngineError", 2)?;
        state.serialize_field("error_type", self.error_type())?;
        state.serialize_field("message", &self.message())?;
        state.end()
    }
}

/// Result type alias using `EngineError`.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EngineError::DuplicateStatementId("S1".to_string());
        assert_eq!(err.to_string(), "duplicate statement id: S1");
    }

    #[test]
    fn test_error_serialization() {
        let err = EngineError::FrozenIndexMutation("index frozen".to_string());
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("\"error_type\":\"FrozenIndexMutation\""));
        assert!(json.contains("\"message\":\"index frozen\""));
    }

    #[test]
    fn test_recoverable_classification() {
        assert!(EngineError::EmptyCorpus("x".into()).is_recoverable());
        assert!(EngineError::MissingDerivedArtifact("x".into()).is_recoverable());
        assert!(!EngineError::DuplicateStatementId("x".into()).is_recoverable());
        assert!(!EngineError::InvalidLexicon("x".into()).is_recoverable());
    }
}
