//! End-to-end scenarios over the public `ContradictionEngine` API (spec §8).
//!
//! S1/S4/S6 and the entity-involvement case are already covered as
//! colocated unit tests in `contradiction.rs`; this file covers the two
//! scenarios that need the full pipeline wired together (S2, S5) plus the
//! determinism property, which only means something against the whole
//! report.

use std::collections::BTreeMap;

use forensic_truth_engine::config::EngineConfig;
use forensic_truth_engine::contradiction::{ContradictionEngine, ContradictionType, LegalTrigger};
use forensic_truth_engine::index::Statement;

fn engine() -> ContradictionEngine {
    // Harmless if another test already initialized the global logger first.
    let _ = env_logger::builder().is_test(true).try_init();
    ContradictionEngine::new(EngineConfig::default())
}

/// S2 — sudden denial pattern surfaces both as a behavioral anomaly and,
/// lifted by Pass 4, as a contradiction with `unreliable_testimony`.
#[test]
fn s2_sudden_denial_pattern() {
    let statements = vec![
        Statement::new("S1", "Jane", "I definitely signed the deal", "D1", 1)
            .with_timestamp(0)
            .with_certainty(0.9),
        Statement::new("S2", "Jane", "I never agreed to anything", "D1", 2)
            .with_timestamp(1_000)
            .with_certainty(0.3),
    ];
    let report = engine()
        .run("case-s2", statements, &BTreeMap::new(), &BTreeMap::new(), &BTreeMap::new(), &BTreeMap::new())
        .unwrap();

    let anomaly = report
        .behavioral_anomalies
        .iter()
        .find(|a| a.pattern.as_str() == "sudden_denial")
        .expect("sudden denial anomaly");
    assert_eq!(anomaly.severity, 8);

    let contradiction = report
        .contradictions
        .iter()
        .find(|c| c.contradiction_type == ContradictionType::Behavioral)
        .expect("behavioral pass contradiction");
    assert_eq!(contradiction.legal_trigger, Some(LegalTrigger::UnreliableTestimony));
}

/// S5 — a statement disagrees with a timeline event about the same
/// subject by more than the configured tolerance.
#[test]
fn s5_timeline_vs_statement() {
    let jan10_millis: i64 = 1_704_844_800_000; // 2024-01-10T00:00:00Z
    let feb15_millis: i64 = 1_708_000_000_000; // ~2024-02-15

    let statements = vec![
        Statement::new("S1", "Alice", "Wire transfer received on this date", "D1", 1)
            .with_timestamp(jan10_millis),
        Statement::new(
            "S2",
            "Alice",
            "Alice said the wire transfer was received on 2024-02-15.",
            "D2",
            1,
        )
        .with_timestamp(feb15_millis),
    ];

    let report = engine()
        .run("case-s5", statements, &BTreeMap::new(), &BTreeMap::new(), &BTreeMap::new(), &BTreeMap::new())
        .unwrap();

    let timeline_contradiction = report
        .contradictions
        .iter()
        .find(|c| c.contradiction_type == ContradictionType::Timeline)
        .expect("timeline-vs-statement contradiction");
    assert_eq!(timeline_contradiction.legal_trigger, Some(LegalTrigger::TimelineInconsistency));
    assert!(!report.timeline_conflicts.is_empty());
}

/// Property 1 — determinism: running the same inputs twice yields an
/// identical report (serialized JSON comparison sidesteps field-by-field
/// boilerplate while still catching any nondeterminism).
#[test]
fn determinism_same_inputs_same_report() {
    let build_statements = || {
        vec![
            Statement::new("S1", "John", "I paid the full amount", "D1", 1).with_timestamp(0),
            Statement::new("S2", "John", "I never paid", "D1", 2).with_timestamp(1_000),
            Statement::new("S3", "Bob", "The invoice was $10,000.", "D1", 3).with_timestamp(2_000),
            Statement::new("S4", "Bob", "The amount was always $5,000.", "D2", 1).with_timestamp(3_000),
        ]
    };

    let report_a = engine()
        .run("case-det", build_statements(), &BTreeMap::new(), &BTreeMap::new(), &BTreeMap::new(), &BTreeMap::new())
        .unwrap();
    let report_b = engine()
        .run("case-det", build_statements(), &BTreeMap::new(), &BTreeMap::new(), &BTreeMap::new(), &BTreeMap::new())
        .unwrap();

    let json_a = serde_json::to_string(&report_a).unwrap();
    let json_b = serde_json::to_string(&report_b).unwrap();
    assert_eq!(json_a, json_b);
}

/// Property 5 — a pair that matches in Pass 1 (same document) is not
/// eligible to be reconsidered by Pass 2 (different document), since the
/// two passes partition statement pairs by document equality.
#[test]
fn pass_1_and_pass_2_partition_by_document() {
    let statements = vec![
        Statement::new("S1", "John", "I paid the full amount", "D1", 1).with_timestamp(0),
        Statement::new("S2", "John", "I never paid", "D1", 2).with_timestamp(1_000),
    ];
    let report = engine()
        .run("case-p1p2", statements, &BTreeMap::new(), &BTreeMap::new(), &BTreeMap::new(), &BTreeMap::new())
        .unwrap();

    let direct_count = report
        .contradictions
        .iter()
        .filter(|c| c.contradiction_type == ContradictionType::Direct)
        .count();
    let cross_doc_count = report
        .contradictions
        .iter()
        .filter(|c| c.contradiction_type == ContradictionType::CrossDocument)
        .count();
    assert_eq!(direct_count, 1);
    assert_eq!(cross_doc_count, 0);
}
