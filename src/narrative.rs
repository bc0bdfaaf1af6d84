//! NARRATIVE COMPOSER (C9)
//!
//! Turns the consolidated findings into six self-contained prose
//! sections. Every sentence produced here cites a concrete finding,
//! entity, or event id — nothing is invented.
//!
//! Core Question: in plain language, what does the evidence actually say?

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::behavior::BehavioralAnomaly;
use crate::contradiction::{Contradiction, ContradictionType};
use crate::entity::Entity;
use crate::index::StatementIndex;
use crate::timeline::{Significance, Timeline};

/// The six composed sections (spec §4.9).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Narrative {
    pub objective_narration: String,
    pub contradiction_commentary: String,
    pub behavioral_pattern_analysis: String,
    pub deductive_logic: String,
    pub causal_chain: String,
    pub final_summary: String,
}

pub fn compose(
    index: &StatementIndex,
    timeline: &Timeline,
    contradictions: &[Contradiction],
    anomalies: &[BehavioralAnomaly],
    entities: &[Entity],
    profiles: &BTreeMap<String, crate::behavior::BehavioralProfile>,
) -> Narrative {
    Narrative {
        objective_narration: objective_narration(timeline, profiles),
        contradiction_commentary: contradiction_commentary(index, contradictions),
        behavioral_pattern_analysis: behavioral_pattern_analysis(anomalies),
        deductive_logic: deductive_logic(contradictions),
        causal_chain: causal_chain(timeline),
        final_summary: final_summary(entities),
    }
}

/// Chronological retelling of the timeline, followed by the claim-evolution
/// chains drawn from each entity's tone shifts: how the same person's
/// telling of events changed register partway through, cited by the exact
/// pair of statement ids that mark the shift.
fn objective_narration(timeline: &Timeline, profiles: &BTreeMap<String, crate::behavior::BehavioralProfile>) -> String {
    let mut lines = Vec::new();
    if timeline.is_empty() {
        lines.push("No dated events are available to narrate.".to_string());
    } else {
        for event in &timeline.events {
            let marker = if event.significance == Significance::Critical {
                " [CRITICAL]"
            } else {
                ""
            };
            lines.push(format!(
                "At {}, {} {}: \"{}\"{}",
                format_timestamp(event.timestamp_millis),
                event.entity_ids.join(", "),
                event_verb(event.event_type),
                event.description,
                marker
            ));
        }
    }
    lines.extend(claim_evolution_chains(profiles));
    lines.join(" ")
}

/// One sentence per recorded tone shift (spec §4.7's `ToneShift`), the
/// entity's retelling drifting in register from one statement to the
/// next — the narrative equivalent of `ClaimEvolution`/`ClaimMutation`.
fn claim_evolution_chains(profiles: &BTreeMap<String, crate::behavior::BehavioralProfile>) -> Vec<String> {
    let mut lines = Vec::new();
    for (entity, profile) in profiles {
        for shift in &profile.tone_shifts {
            lines.push(format!(
                "{}'s account shifted from {} (statement {}) to {} (statement {}).",
                entity, shift.before_tone, shift.before_id, shift.after_tone, shift.after_id
            ));
        }
    }
    lines
}

/// RFC 3339 rendering of a timeline timestamp, falling back to the raw
/// millisecond value if it is out of `chrono`'s representable range.
fn format_timestamp(millis: i64) -> String {
    chrono::DateTime::from_timestamp_millis(millis)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| millis.to_string())
}

fn event_verb(event_type: crate::timeline::EventType) -> &'static str {
    use crate::timeline::EventType;
    match event_type {
        EventType::Payment => "recorded a payment",
        EventType::Promise => "made a commitment",
        EventType::Denial => "issued a denial",
        EventType::Admission => "made an admission",
        EventType::Communication => "communicated",
        EventType::Document | EventType::Contradiction | EventType::BehaviorChange | EventType::Other => "acted",
    }
}

fn contradiction_commentary(index: &StatementIndex, contradictions: &[Contradiction]) -> String {
    if contradictions.is_empty() {
        return "No contradictions were found across the supplied evidence.".to_string();
    }
    contradictions
        .iter()
        .map(|c| {
            format!(
                "Contradiction {} (severity {}) involves {}: \"{}\" vs \"{}\".",
                c.id,
                c.severity,
                c.affected_entities.join(", "),
                excerpt(index, &c.source_statement),
                excerpt(index, &c.target_statement),
            )
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// First 50 characters of a statement's text (spec §4.9 §2: "excerpts
/// (first 50 chars each)"). Falls back to the bare id if the statement
/// cannot be found (should not happen for ids sourced from the index).
fn excerpt(index: &StatementIndex, statement_id: &str) -> String {
    match index.get(statement_id) {
        Some(statement) => statement.text.chars().take(50).collect(),
        None => statement_id.to_string(),
    }
}

fn behavioral_pattern_analysis(anomalies: &[BehavioralAnomaly]) -> String {
    if anomalies.is_empty() {
        return "No behavioral patterns were detected.".to_string();
    }
    let mut by_pattern: BTreeMap<&str, Vec<&BehavioralAnomaly>> = BTreeMap::new();
    for a in anomalies {
        by_pattern.entry(a.pattern.as_str()).or_default().push(a);
    }
    by_pattern
        .into_iter()
        .map(|(pattern, group)| {
            let representative = group[0];
            format!(
                "{} detected {} time(s); representative instance: {} ({}).",
                pattern,
                group.len(),
                representative.entity,
                representative.description
            )
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn deductive_logic(contradictions: &[Contradiction]) -> String {
    if contradictions.is_empty() {
        return "No inferences follow, since no contradictions were found.".to_string();
    }
    contradictions
        .iter()
        .map(|c| format!("{} implies: {}", c.id, implication_for(c.contradiction_type)))
        .collect::<Vec<_>>()
        .join(" ")
}

fn implication_for(contradiction_type: ContradictionType) -> &'static str {
    match contradiction_type {
        ContradictionType::Direct => "the speaker's own account is internally inconsistent.",
        ContradictionType::CrossDocument => "the entity's account differs depending on the document consulted.",
        ContradictionType::Behavioral => "a shift in how the entity communicates coincides with the disputed claim.",
        ContradictionType::Temporal => "the sequence of claimed events cannot all be true together.",
        ContradictionType::MissingEvidence => "a claim lacks the corroborating evidence it implies should exist.",
        ContradictionType::ThirdParty => "an independent account conflicts with the entity's own statements.",
        ContradictionType::Timeline => "the timing of events as described cannot be reconciled.",
    }
}

fn causal_chain(timeline: &Timeline) -> String {
    let chain: Vec<&crate::timeline::TimelineEvent> = timeline
        .events
        .iter()
        .filter(|e| matches!(e.significance, Significance::High | Significance::Critical))
        .collect();
    if chain.is_empty() {
        return "No high-significance events anchor a causal chain.".to_string();
    }
    chain
        .iter()
        .map(|e| format!("{}: {}", format_timestamp(e.timestamp_millis), e.description))
        .collect::<Vec<_>>()
        .join(" -> ")
}

fn final_summary(entities: &[Entity]) -> String {
    let highest = entities
        .iter()
        .filter_map(|e| e.liability_score.as_ref().map(|s| (e, s.overall)))
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

    match highest {
        None => "No conclusive liability / further investigation recommended.".to_string(),
        Some((entity, overall)) => {
            let tier = if overall >= 80.0 {
                "PRIMARY RESPONSIBILITY"
            } else if overall >= 50.0 {
                "significant responsibility"
            } else if overall >= 30.0 {
                "material responsibility"
            } else {
                "no conclusive liability / further investigation recommended"
            };
            format!("{} bears {} (overall liability {:.1}).", entity.primary_name, tier, overall)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_inputs_produce_explicit_empty_sections() {
        let timeline = Timeline {
            events: vec![],
            clusters: vec![],
            quiet_periods: vec![],
        };
        let index = StatementIndex::new();
        let narrative = compose(&index, &timeline, &[], &[], &[], &BTreeMap::new());
        assert!(narrative.objective_narration.contains("No dated events"));
        assert!(narrative.contradiction_commentary.contains("No contradictions"));
        assert!(narrative.behavioral_pattern_analysis.contains("No behavioral patterns"));
        assert!(narrative.final_summary.contains("No conclusive liability"));
    }
}
