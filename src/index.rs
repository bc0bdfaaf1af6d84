//! STATEMENT INDEX (C2)
//!
//! A content-addressed, append-then-freeze store of statements keyed by
//! id, speaker, and document. All downstream analysis reads through this
//! index — it is the one place statements are mutated (embedding,
//! sentiment, certainty slots), and only in a set-once fashion.
//!
//! Core Question: given an id, a speaker, or a document, which statements
//! belong to it, in what order?

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// An atomic attributable utterance (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Statement {
    pub id: String,
    pub speaker: String,
    pub text: String,
    pub document_id: String,
    pub line_number: u64,
    pub timestamp_millis: Option<i64>,
    pub sentiment: Option<f64>,
    pub certainty: Option<f64>,
    pub embedding: Option<Vec<f64>>,
}

impl Statement {
    pub fn new(
        id: impl Into<String>,
        speaker: impl Into<String>,
        text: impl Into<String>,
        document_id: impl Into<String>,
        line_number: u64,
    ) -> Self {
        Self {
            id: id.into(),
            speaker: speaker.into(),
            text: text.into(),
            document_id: document_id.into(),
            line_number,
            timestamp_millis: None,
            sentiment: None,
            certainty: None,
            embedding: None,
        }
    }

    pub fn with_timestamp(mut self, millis: i64) -> Self {
        self.timestamp_millis = Some(millis);
        self
    }

    pub fn with_sentiment(mut self, sentiment: f64) -> Self {
        self.sentiment = Some(sentiment);
        self
    }

    pub fn with_certainty(mut self, certainty: f64) -> Self {
        self.certainty = Some(certainty);
        self
    }

    /// Speaker normalized for case-insensitive grouping (spec §3: "speaker
    /// (entity key, normalized case-insensitive)").
    pub fn normalized_speaker(&self) -> String {
        self.speaker.to_lowercase()
    }

    /// A stable, content-derived id for callers that don't supply one.
    /// Uses a fixed FNV-1a hash rather than `std::hash::Hasher`'s default
    /// algorithm, whose output is explicitly unstable across Rust
    /// releases — determinism here must hold across builds, not just
    /// within one process.
    pub fn derive_id(document_id: &str, line_number: u64, speaker: &str, text: &str) -> String {
        let mut hash: u64 = 0xcbf29ce484222325;
        for byte in document_id
            .bytes()
            .chain(line_number.to_le_bytes())
            .chain(speaker.bytes())
            .chain(text.bytes())
        {
            hash ^= byte as u64;
            hash = hash.wrapping_mul(0x100000001b3);
        }
        format!("stmt-{:016x}", hash)
    }

    /// A random id for callers that would rather not derive one from
    /// content (spec §3: "id (stable, content-derived or UUID, unique
    /// across run)"). Not used by [`Self::derive_id`] callers, and not
    /// reproducible across runs — pick this only when id stability across
    /// re-ingestion of the same evidence does not matter to the caller.
    pub fn generate_uuid_id() -> String {
        format!("stmt-{}", uuid::Uuid::new_v4())
    }

    /// Render this statement's timestamp as RFC 3339, if it has one.
    /// `None` for statements with no timestamp or an out-of-range value.
    pub fn timestamp_rfc3339(&self) -> Option<String> {
        self.timestamp_millis
            .and_then(chrono::DateTime::from_timestamp_millis)
            .map(|dt| dt.to_rfc3339())
    }
}

/// The append-then-freeze statement store.
#[derive(Debug, Default)]
pub struct StatementIndex {
    statements: Vec<Statement>,
    id_to_pos: BTreeMap<String, usize>,
    frozen: bool,
}

impl StatementIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Append a batch of statements. Enforces id uniqueness across the
    /// whole run; fails fast on the first duplicate, leaving statements
    /// added earlier in the same call in place (callers that want
    /// atomicity should validate uniqueness themselves before calling).
    pub fn add(&mut self, statements: Vec<Statement>) -> EngineResult<()> {
        if self.frozen {
            return Err(EngineError::FrozenIndexMutation(
                "cannot add statements after freeze()".to_string(),
            ));
        }
        for statement in statements {
            if self.id_to_pos.contains_key(&statement.id) {
                return Err(EngineError::DuplicateStatementId(statement.id.clone()));
            }
            let pos = self.statements.len();
            self.id_to_pos.insert(statement.id.clone(), pos);
            self.statements.push(statement);
        }
        Ok(())
    }

    /// Prevent further additions. Idempotent.
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn get(&self, id: &str) -> Option<&Statement> {
        self.id_to_pos.get(id).map(|&pos| &self.statements[pos])
    }

    /// Set a statement's embedding. Set-once: a second call for the same
    /// id returns `EmbeddingAlreadySet`.
    pub fn update_embedding(&mut self, id: &str, vector: Vec<f64>) -> EngineResult<()> {
        let pos = *self
            .id_to_pos
            .get(id)
            .ok_or_else(|| EngineError::MissingDerivedArtifact(format!("unknown statement {}", id)))?;
        if self.statements[pos].embedding.is_some() {
            return Err(EngineError::EmbeddingAlreadySet(id.to_string()));
        }
        self.statements[pos].embedding = Some(vector);
        Ok(())
    }

    /// Set a statement's sentiment. Set-once, same rule as embeddings.
    pub fn update_sentiment(&mut self, id: &str, sentiment: f64) -> EngineResult<()> {
        let pos = *self
            .id_to_pos
            .get(id)
            .ok_or_else(|| EngineError::MissingDerivedArtifact(format!("unknown statement {}", id)))?;
        if self.statements[pos].sentiment.is_some() {
            return Err(EngineError::EmbeddingAlreadySet(format!("sentiment:{}", id)));
        }
        self.statements[pos].sentiment = Some(sentiment);
        Ok(())
    }

    /// Set a statement's certainty. Set-once, same rule as embeddings.
    pub fn update_certainty(&mut self, id: &str, certainty: f64) -> EngineResult<()> {
        let pos = *self
            .id_to_pos
            .get(id)
            .ok_or_else(|| EngineError::MissingDerivedArtifact(format!("unknown statement {}", id)))?;
        if self.statements[pos].certainty.is_some() {
            return Err(EngineError::EmbeddingAlreadySet(format!("certainty:{}", id)));
        }
        self.statements[pos].certainty = Some(certainty);
        Ok(())
    }

    /// Every statement exactly once, in canonical `(document_id,
    /// line_number, id)` order (spec §5's ordering guarantee).
    pub fn all(&self) -> Vec<&Statement> {
        let mut out: Vec<&Statement> = self.statements.iter().collect();
        out.sort_by(|a, b| {
            (a.document_id.as_str(), a.line_number, a.id.as_str()).cmp(&(
                b.document_id.as_str(),
                b.line_number,
                b.id.as_str(),
            ))
        });
        out
    }

    /// All statements for `speaker` (case-insensitive), ordered by
    /// ascending timestamp then id; statements with no timestamp sort
    /// last, in id order.
    pub fn by_speaker(&self, speaker: &str) -> Vec<&Statement> {
        let key = speaker.to_lowercase();
        let mut out: Vec<&Statement> = self
            .statements
            .iter()
            .filter(|s| s.normalized_speaker() == key)
            .collect();
        out.sort_by(|a, b| {
            let ta = a.timestamp_millis.map(|t| (0, t)).unwrap_or((1, 0));
            let tb = b.timestamp_millis.map(|t| (0, t)).unwrap_or((1, 0));
            ta.cmp(&tb).then_with(|| a.id.cmp(&b.id))
        });
        out
    }

    /// All statements for `document`, preserving original insertion order
    /// among statements that share an identical timestamp.
    pub fn by_document(&self, document: &str) -> Vec<&Statement> {
        self.statements
            .iter()
            .filter(|s| s.document_id == document)
            .collect()
    }

    /// Distinct speakers, normalized, in sorted order.
    pub fn speakers(&self) -> Vec<String> {
        let mut set: Vec<String> = self
            .statements
            .iter()
            .map(|s| s.normalized_speaker())
            .collect();
        set.sort();
        set.dedup();
        set
    }

    /// Distinct document ids, in sorted order.
    pub fn documents(&self) -> Vec<String> {
        let mut set: Vec<String> = self.statements.iter().map(|s| s.document_id.clone()).collect();
        set.sort();
        set.dedup();
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stmt(id: &str, speaker: &str, text: &str, doc: &str, line: u64) -> Statement {
        Statement::new(id, speaker, text, doc, line)
    }

    #[test]
    fn add_rejects_duplicate_ids() {
        let mut idx = StatementIndex::new();
        idx.add(vec![stmt("S1", "John", "hi", "D1", 1)]).unwrap();
        let err = idx.add(vec![stmt("S1", "Jane", "bye", "D1", 2)]).unwrap_err();
        assert!(matches!(err, EngineError::DuplicateStatementId(_)));
    }

    #[test]
    fn freeze_blocks_further_adds() {
        let mut idx = StatementIndex::new();
        idx.add(vec![stmt("S1", "John", "hi", "D1", 1)]).unwrap();
        idx.freeze();
        let err = idx.add(vec![stmt("S2", "Jane", "bye", "D1", 2)]).unwrap_err();
        assert!(matches!(err, EngineError::FrozenIndexMutation(_)));
    }

    #[test]
    fn embedding_is_set_once() {
        let mut idx = StatementIndex::new();
        idx.add(vec![stmt("S1", "John", "hi", "D1", 1)]).unwrap();
        idx.update_embedding("S1", vec![1.0]).unwrap();
        let err = idx.update_embedding("S1", vec![0.5]).unwrap_err();
        assert!(matches!(err, EngineError::EmbeddingAlreadySet(_)));
    }

    #[test]
    fn all_returns_every_statement_once_in_canonical_order() {
        let mut idx = StatementIndex::new();
        idx.add(vec![
            stmt("B", "John", "second", "D1", 2),
            stmt("A", "John", "first", "D1", 1),
        ])
        .unwrap();
        let all = idx.all();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, "A");
        assert_eq!(all[1].id, "B");
    }

    #[test]
    fn by_speaker_is_case_insensitive_and_sorted_by_time_then_id() {
        let mut idx = StatementIndex::new();
        idx.add(vec![
            stmt("S2", "JOHN", "second", "D1", 2).with_timestamp(200),
            stmt("S1", "john", "first", "D1", 1).with_timestamp(100),
        ])
        .unwrap();
        let by_john = idx.by_speaker("John");
        assert_eq!(by_john.len(), 2);
        assert_eq!(by_john[0].id, "S1");
        assert_eq!(by_john[1].id, "S2");
    }

    #[test]
    fn derive_id_is_deterministic() {
        let a = Statement::derive_id("D1", 1, "John", "hello");
        let b = Statement::derive_id("D1", 1, "John", "hello");
        let c = Statement::derive_id("D1", 2, "John", "hello");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn generated_uuid_ids_are_unique() {
        let a = Statement::generate_uuid_id();
        let b = Statement::generate_uuid_id();
        assert_ne!(a, b);
        assert!(a.starts_with("stmt-"));
    }

    #[test]
    fn timestamp_rfc3339_round_trips_a_known_instant() {
        let s = stmt("S1", "John", "hi", "D1", 1).with_timestamp(1_704_844_800_000);
        let rendered = s.timestamp_rfc3339().unwrap();
        assert!(rendered.starts_with("2024-01-10"));
    }

    #[test]
    fn timestamp_rfc3339_is_none_without_a_timestamp() {
        let s = stmt("S1", "John", "hi", "D1", 1);
        assert!(s.timestamp_rfc3339().is_none());
    }
}
