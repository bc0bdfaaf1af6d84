//! Property-based tests over the invariants enumerated in spec §8.
//!
//! These exercise individual components directly (embedding, lexicon,
//! contradiction severity, liability, entity mentions) rather than the
//! full pipeline, since the properties themselves are component-local.

use proptest::prelude::*;

use forensic_truth_engine::config::EngineConfig;
use forensic_truth_engine::contradiction::{severity_bucket, ContradictionEngine, SeverityBucket};
use forensic_truth_engine::embedding::{cosine, norm, Vocabulary};
use forensic_truth_engine::index::Statement;

fn arb_word() -> impl Strategy<Value = String> {
    "[a-z]{3,8}"
}

fn arb_sentence() -> impl Strategy<Value = String> {
    proptest::collection::vec(arb_word(), 3..12).prop_map(|words| words.join(" "))
}

proptest! {
    /// Property 2 — every non-zero statement embedding is unit-norm.
    #[test]
    fn embedding_unit_norm(sentences in proptest::collection::vec(arb_sentence(), 2..8)) {
        let refs: Vec<&str> = sentences.iter().map(|s| s.as_str()).collect();
        let vocab = Vocabulary::build(&refs, 64);
        for text in &sentences {
            let v = vocab.generate(text);
            let n = norm(&v);
            prop_assert!(n == 0.0 || (n - 1.0).abs() < 1e-6);
        }
    }

    /// Property 3 — cosine similarity is always in [-1, 1], and a vector
    /// is (numerically) maximally similar to itself whenever it is non-zero.
    #[test]
    fn cosine_is_bounded(sentences in proptest::collection::vec(arb_sentence(), 2..8)) {
        let refs: Vec<&str> = sentences.iter().map(|s| s.as_str()).collect();
        let vocab = Vocabulary::build(&refs, 64);
        for text in &sentences {
            let v = vocab.generate(text);
            let c = cosine(&v, &v);
            prop_assert!(c <= 1.0 + 1e-9 && c >= -1.0 - 1e-9);
            if norm(&v) > 0.0 {
                prop_assert!((c - 1.0).abs() < 1e-6);
            }
        }
    }

    /// Property 6 — severity bucket is monotonically non-decreasing in the
    /// underlying 1..10 severity score.
    #[test]
    fn severity_bucket_is_monotonic(a in 1u8..=10, b in 1u8..=10) {
        if a <= b {
            let rank = |s: u8| match severity_bucket(s) {
                SeverityBucket::Low => 0,
                SeverityBucket::Medium => 1,
                SeverityBucket::High => 2,
                SeverityBucket::Critical => 3,
            };
            prop_assert!(rank(a) <= rank(b));
        }
    }

    /// Property 7 — liability overall is always clamped to [0, 100].
    #[test]
    fn liability_overall_is_clamped(
        speaker in "[A-Z][a-z]{2,8}",
        text in arb_sentence(),
        certainty in 0.0f64..1.0,
    ) {
        let statements = vec![
            Statement::new("S1", &speaker, &text, "D1", 1).with_timestamp(0).with_certainty(certainty),
            Statement::new("S2", &speaker, &text, "D1", 2).with_timestamp(1_000).with_certainty(certainty),
        ];
        let engine = ContradictionEngine::new(EngineConfig::default());
        let report = engine
            .run(
                "case-prop-liability",
                statements,
                &std::collections::BTreeMap::new(),
                &std::collections::BTreeMap::new(),
                &std::collections::BTreeMap::new(),
                &std::collections::BTreeMap::new(),
            )
            .unwrap();
        for entity in &report.entities {
            if let Some(score) = &entity.liability_score {
                prop_assert!(score.overall >= 0.0 && score.overall <= 100.0);
            }
        }
    }

    /// Property 8 — every entity in the output has at least
    /// `min_entity_mentions` mentions.
    #[test]
    fn every_entity_meets_mentions_threshold(
        speakers in proptest::collection::vec("[A-Z][a-z]{2,8}", 1..6),
        text in arb_sentence(),
    ) {
        let mut statements = Vec::new();
        let mut line = 1u64;
        for speaker in &speakers {
            statements.push(Statement::new(format!("S{}", line), speaker.clone(), text.clone(), "D1", line).with_timestamp(line as i64 * 1000));
            line += 1;
        }
        let engine = ContradictionEngine::new(EngineConfig::default());
        let report = engine
            .run(
                "case-prop-mentions",
                statements,
                &std::collections::BTreeMap::new(),
                &std::collections::BTreeMap::new(),
                &std::collections::BTreeMap::new(),
                &std::collections::BTreeMap::new(),
            )
            .unwrap();
        for entity in &report.entities {
            prop_assert!(entity.mention_count >= EngineConfig::default().min_entity_mentions);
        }
    }
}
