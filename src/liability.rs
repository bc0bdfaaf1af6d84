//! LIABILITY CALCULATOR (C8)
//!
//! Combines contradiction, behavioral, evidence, consistency, and causal
//! subscores into a single per-entity liability aggregate, using the
//! fixed weight vector and templated reasoning from spec §4.8.
//!
//! Core Question: given everything found about this entity, how
//! responsible do they appear to be?

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::behavior::{BehavioralAnomaly, PatternTag};
use crate::contradiction::{severity_bucket, Contradiction, ContradictionType, SeverityBucket};
use crate::entity::Entity;
use crate::index::StatementIndex;
use crate::lexicon::{CompiledLexicons, LexiconTag};

const WEIGHT_CONTRADICTION: f64 = 0.30;
const WEIGHT_BEHAVIORAL: f64 = 0.25;
const WEIGHT_EVIDENCE: f64 = 0.15;
const WEIGHT_CONSISTENCY: f64 = 0.15;
const WEIGHT_CAUSAL: f64 = 0.15;

/// Per-entity liability input that the core does not compute itself
/// (spec §9: `story_changes` is externally supplied). Default is zero
/// contribution.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsistencyInputs {
    pub story_changes: u32,
}

/// Per-entity liability input the core does not compute itself (spec §9:
/// `initiated_events` and the two booleans are externally supplied).
#[derive(Debug, Clone, Copy, Default)]
pub struct CausalInputs {
    pub initiated_events: u32,
    pub benefited_financially: bool,
    pub controlled_information: bool,
}

/// Per-entity expected-vs-provided evidence counts. Not named as an open
/// question in the spec text, but `evidence` subscore needs an
/// "expected" count no internal signal can produce, so it is supplied the
/// same way as the causal/consistency inputs.
#[derive(Debug, Clone, Copy, Default)]
pub struct EvidenceInputs {
    pub provided: u32,
    pub expected: u32,
}

/// `level` bucket for an overall liability score (spec §4.8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiabilityLevel {
    Minimal,
    Low,
    Medium,
    High,
    Critical,
}

fn level_for(overall: f64) -> LiabilityLevel {
    if overall >= 75.0 {
        LiabilityLevel::Critical
    } else if overall >= 55.0 {
        LiabilityLevel::High
    } else if overall >= 35.0 {
        LiabilityLevel::Medium
    } else if overall >= 15.0 {
        LiabilityLevel::Low
    } else {
        LiabilityLevel::Minimal
    }
}

/// Per-entity aggregate (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiabilityScore {
    pub contradiction: f64,
    pub behavioral: f64,
    pub evidence: f64,
    pub consistency: f64,
    pub causal: f64,
    pub overall: f64,
    pub breakdown: BTreeMap<String, u32>,
    pub reasoning: Vec<String>,
    pub level: LiabilityLevel,
}

fn contradiction_points(severity: u8) -> f64 {
    match severity_bucket(severity) {
        SeverityBucket::Critical => 30.0,
        SeverityBucket::High => 18.0,
        SeverityBucket::Medium => 10.0,
        SeverityBucket::Low => 4.0,
    }
}

fn severity_multiplier(severity: u8) -> f64 {
    match severity_bucket(severity) {
        SeverityBucket::Critical => 1.4,
        SeverityBucket::High => 1.2,
        SeverityBucket::Medium => 1.0,
        SeverityBucket::Low => 0.7,
    }
}

fn count_severity(count: usize) -> Option<u8> {
    match count {
        0 => None,
        1 => Some(3),
        2 => Some(5),
        3 => Some(7),
        _ => Some(9),
    }
}

fn contradiction_subscore(entity_key: &str, contradictions: &[Contradiction]) -> (f64, u32, u32) {
    let mut sum = 0.0;
    let mut critical = 0;
    let mut direct = 0;
    for c in contradictions {
        if !c.affected_entities.iter().any(|e| e == entity_key) {
            continue;
        }
        sum += contradiction_points(c.severity);
        if severity_bucket(c.severity) == SeverityBucket::Critical {
            critical += 1;
        }
        if c.contradiction_type == ContradictionType::Direct {
            direct += 1;
        }
    }
    (sum.clamp(0.0, 100.0), critical, direct)
}

fn behavioral_base(pattern: PatternTag) -> Option<f64> {
    match pattern {
        PatternTag::Gaslighting => Some(22.0),
        PatternTag::BlameShifting => Some(12.0),
        PatternTag::DeflectionPattern => Some(8.0),
        PatternTag::OverExplaining => Some(6.0),
        _ => None,
    }
}

fn behavioral_subscore(
    entity_key: &str,
    anomalies: &[BehavioralAnomaly],
    lexicons: &CompiledLexicons,
    entity_text: &str,
) -> f64 {
    let mut sum = 0.0;
    for a in anomalies {
        if a.entity != entity_key {
            continue;
        }
        if let Some(base) = behavioral_base(a.pattern) {
            sum += base * severity_multiplier(a.severity);
        }
    }

    const LEXICON_BASES: &[(LexiconTag, f64)] = &[
        (LexiconTag::FinancialManipulation, 20.0),
        (LexiconTag::PassiveAdmission, 18.0),
        (LexiconTag::EmotionalManipulation, 14.0),
        (LexiconTag::PressureTactics, 10.0),
        (LexiconTag::Threatening, 25.0),
        (LexiconTag::Minimization, 5.0),
    ];
    for &(tag, base) in LEXICON_BASES {
        let count = lexicons.count(tag, entity_text);
        if let Some(severity) = count_severity(count) {
            sum += base * severity_multiplier(severity);
        }
    }

    sum.clamp(0.0, 100.0)
}

fn evidence_subscore(inputs: EvidenceInputs) -> f64 {
    let ratio = if inputs.expected == 0 {
        1.0
    } else {
        inputs.provided as f64 / inputs.expected as f64
    };
    if ratio < 0.2 {
        80.0
    } else if ratio < 0.5 {
        50.0
    } else if ratio < 0.8 {
        25.0
    } else {
        10.0
    }
}

fn consistency_subscore(story_changes: u32, direct_contradiction_count: u32) -> f64 {
    (12.0 * story_changes as f64 + 15.0 * direct_contradiction_count as f64).clamp(0.0, 100.0)
}

fn causal_subscore(inputs: CausalInputs) -> f64 {
    let mut score = 5.0 * inputs.initiated_events as f64;
    if inputs.benefited_financially {
        score += 25.0;
    }
    if inputs.controlled_information {
        score += 10.0;
    }
    score.clamp(0.0, 100.0)
}

fn build_reasoning(
    critical_contradictions: u32,
    story_changes: u32,
    causal: CausalInputs,
    evidence: EvidenceInputs,
) -> Vec<String> {
    let mut reasoning = Vec::new();
    if critical_contradictions > 0 {
        reasoning.push(format!(
            "{} critical-severity contradiction(s) were found against this entity.",
            critical_contradictions
        ));
    }
    if story_changes > 2 {
        reasoning.push("This entity's account changed more than twice across the record.".to_string());
    }
    if causal.benefited_financially {
        reasoning.push("This entity is recorded as having benefited financially from the disputed events.".to_string());
    }
    if causal.controlled_information {
        reasoning.push("This entity controlled the flow of information relevant to the dispute.".to_string());
    }
    if evidence.expected > 0 && (evidence.provided as f64 / evidence.expected as f64) < 0.5 {
        reasoning.push("This entity provided substantially less evidence than expected.".to_string());
    }
    if reasoning.is_empty() {
        reasoning.push("No significant liability indicators were found for this entity.".to_string());
    }
    reasoning
}

/// Score every entity in `entities`. Entities with no contradictions,
/// anomalies, or externally supplied inputs still receive a full (mostly
/// zero) score — only a wholly empty entity list yields an empty map.
pub fn score_all(
    entities: &[Entity],
    contradictions: &[Contradiction],
    anomalies: &[BehavioralAnomaly],
    lexicons: &CompiledLexicons,
    index: &StatementIndex,
    causal_inputs: &BTreeMap<String, CausalInputs>,
    consistency_inputs: &BTreeMap<String, ConsistencyInputs>,
    evidence_inputs: &BTreeMap<String, EvidenceInputs>,
) -> BTreeMap<String, LiabilityScore> {
    let mut out = BTreeMap::new();

    for entity in entities {
        let key = entity.primary_name.to_lowercase();

        let entity_text: String = entity
            .statement_ids
            .iter()
            .filter_map(|id| index.get(id))
            .map(|s| s.text.to_lowercase())
            .collect::<Vec<_>>()
            .join("\n");

        let (contradiction_score, critical_contradictions, direct_contradictions) =
            contradiction_subscore(&key, contradictions);
        let behavioral_score = behavioral_subscore(&key, anomalies, lexicons, &entity_text);

        let evidence = evidence_inputs.get(&key).copied().unwrap_or_default();
        let evidence_score = evidence_subscore(evidence);

        let consistency = consistency_inputs.get(&key).copied().unwrap_or_default();
        let consistency_score = consistency_subscore(consistency.story_changes, direct_contradictions);

        let causal = causal_inputs.get(&key).copied().unwrap_or_default();
        let causal_score = causal_subscore(causal);

        let overall = (WEIGHT_CONTRADICTION * contradiction_score
            + WEIGHT_BEHAVIORAL * behavioral_score
            + WEIGHT_EVIDENCE * evidence_score
            + WEIGHT_CONSISTENCY * consistency_score
            + WEIGHT_CAUSAL * causal_score)
            .clamp(0.0, 100.0);

        let mut breakdown = BTreeMap::new();
        breakdown.insert("critical_contradictions".to_string(), critical_contradictions);
        breakdown.insert("direct_contradictions".to_string(), direct_contradictions);
        breakdown.insert("behavioral_anomalies".to_string(), anomalies.iter().filter(|a| a.entity == key).count() as u32);
        breakdown.insert("story_changes".to_string(), consistency.story_changes);

        let reasoning = build_reasoning(critical_contradictions, consistency.story_changes, causal, evidence);

        out.insert(
            key,
            LiabilityScore {
                contradiction: contradiction_score,
                behavioral: behavioral_score,
                evidence: evidence_score,
                consistency: consistency_score,
                causal: causal_score,
                overall,
                breakdown,
                reasoning,
                level: level_for(overall),
            },
        );
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon::LexiconSet;

    #[test]
    fn liability_clamp_property() {
        assert_eq!(contradiction_subscore("x", &[]).0, 0.0);
        let inputs = CausalInputs {
            initiated_events: 1000,
            benefited_financially: true,
            controlled_information: true,
        };
        assert!(causal_subscore(inputs) <= 100.0);
    }

    #[test]
    fn evidence_subscore_buckets() {
        assert_eq!(evidence_subscore(EvidenceInputs { provided: 0, expected: 0 }), 10.0);
        assert_eq!(evidence_subscore(EvidenceInputs { provided: 1, expected: 10 }), 80.0);
        assert_eq!(evidence_subscore(EvidenceInputs { provided: 9, expected: 10 }), 10.0);
    }

    #[test]
    fn empty_entity_list_yields_empty_map() {
        let lexicons = LexiconSet::default().compile().unwrap();
        let index = StatementIndex::new();
        let scores = score_all(&[], &[], &[], &lexicons, &index, &BTreeMap::new(), &BTreeMap::new(), &BTreeMap::new());
        assert!(scores.is_empty());
    }
}
