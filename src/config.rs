//! Engine configuration.
//!
//! Mirrors the enumerated options in spec §6: every tunable the engine
//! accepts at construction, with the documented defaults. Lexicons may be
//! overridden wholesale via [`EngineConfig::with_lexicons`] — there is no
//! incremental/merge path, matching the "may be overridden wholesale, not
//! incrementally" rule.

use crate::lexicon::LexiconSet;

/// Construction-time configuration for a [`crate::contradiction::ContradictionEngine`] run.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Dimensionality of the TF-IDF embedding vocabulary. Default 256.
    pub embedding_dimension: usize,
    /// Entities with fewer mentions than this are dropped. Default 2.
    pub min_entity_mentions: u32,
    /// Window, in hours, used to cluster consecutive timeline events. Default 24.
    pub cluster_window_hours: i64,
    /// A gap is "unusual" when it exceeds this multiple of the mean gap. Default 3.
    pub gap_unusual_multiple: f64,
    /// Max day delta allowed between a statement and the event it references
    /// before a timeline contradiction is raised. Default 1.
    pub timeline_conflict_days: i64,
    /// Minimum cosine similarity for two statements to be considered related. Default 0.5.
    pub similarity_threshold: f64,
    /// Cosine similarity above which opposite-sentiment statements are flagged. Default 0.7.
    pub high_similarity_threshold: f64,
    /// Fixed lexicons used by every keyword-matching operation in the engine.
    pub lexicons: LexiconSet,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            embedding_dimension: 256,
            min_entity_mentions: 2,
            cluster_window_hours: 24,
            gap_unusual_multiple: 3.0,
            timeline_conflict_days: 1,
            similarity_threshold: 0.5,
            high_similarity_threshold: 0.7,
            lexicons: LexiconSet::default(),
        }
    }
}

impl EngineConfig {
    /// Replace the entire lexicon set. There is no incremental override:
    /// callers who want to tweak one tag must supply a complete replacement.
    pub fn with_lexicons(mut self, lexicons: LexiconSet) -> Self {
        self.lexicons = lexicons;
        self
    }

    pub fn with_embedding_dimension(mut self, dim: usize) -> Self {
        self.embedding_dimension = dim;
        self
    }

    pub fn with_min_entity_mentions(mut self, min: u32) -> Self {
        self.min_entity_mentions = min;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.embedding_dimension, 256);
        assert_eq!(cfg.min_entity_mentions, 2);
        assert_eq!(cfg.cluster_window_hours, 24);
        assert_eq!(cfg.gap_unusual_multiple, 3.0);
        assert_eq!(cfg.timeline_conflict_days, 1);
        assert_eq!(cfg.similarity_threshold, 0.5);
        assert_eq!(cfg.high_similarity_threshold, 0.7);
    }

    #[test]
    fn builder_overrides_apply() {
        let cfg = EngineConfig::default()
            .with_embedding_dimension(128)
            .with_min_entity_mentions(5);
        assert_eq!(cfg.embedding_dimension, 128);
        assert_eq!(cfg.min_entity_mentions, 5);
    }
}
