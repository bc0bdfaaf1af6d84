//! REPORT ASSEMBLER (C10)
//!
//! Packages the contradiction, behavioral, liability, and narrative
//! outputs into the one value the engine hands back to its caller.
//!
//! Core Question: what does the caller actually need in hand to act on
//! this analysis?

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::behavior::BehavioralAnomaly;
use crate::contradiction::{Contradiction, ContradictionType, EntityInvolvement, LegalTriggerEvidence};
use crate::entity::Entity;
use crate::narrative::Narrative;

/// Self-verification outcome recorded before Pass 1 runs (spec §4.6/§7).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VerificationStatus {
    pub statements_indexed: bool,
    pub embeddings_assigned: bool,
    pub timeline_built: bool,
    pub entities_profiled: bool,
    pub warnings: Vec<String>,
    pub auto_corrections: Vec<String>,
}

/// One entry of the final `legal_triggers` list — `legal_trigger_evidence`
/// flattened from a map into a named list for report consumers (spec §6
/// names the field `legal_triggers[]`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegalTriggerSummary {
    pub trigger: String,
    pub contradiction_ids: Vec<String>,
    pub confidence: f64,
    pub description: String,
    pub recommendation: String,
}

/// The final packaged output of a run (spec §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContradictionReport {
    pub case_id: String,
    pub total_contradictions: usize,
    pub contradictions: Vec<Contradiction>,
    pub timeline_conflicts: Vec<Contradiction>,
    pub behavioral_anomalies: Vec<BehavioralAnomaly>,
    pub affected_entities: BTreeMap<String, EntityInvolvement>,
    pub document_links: BTreeMap<String, Vec<String>>,
    pub severity_breakdown: BTreeMap<u8, u32>,
    pub legal_triggers: Vec<LegalTriggerSummary>,
    pub entities: Vec<Entity>,
    pub narrative: Narrative,
    pub summary: String,
    pub verification_status: VerificationStatus,
}

impl ContradictionReport {
    /// The report for an empty corpus (spec §7: `EmptyCorpus` is a
    /// non-fatal warning, not a returned error).
    pub fn empty(case_id: &str) -> Self {
        Self {
            case_id: case_id.to_string(),
            total_contradictions: 0,
            contradictions: Vec::new(),
            timeline_conflicts: Vec::new(),
            behavioral_anomalies: Vec::new(),
            affected_entities: BTreeMap::new(),
            document_links: BTreeMap::new(),
            severity_breakdown: BTreeMap::new(),
            legal_triggers: Vec::new(),
            entities: Vec::new(),
            narrative: Narrative::default(),
            summary: "No statements were supplied; no analysis was performed.".to_string(),
            verification_status: VerificationStatus {
                statements_indexed: false,
                embeddings_assigned: false,
                timeline_built: false,
                entities_profiled: false,
                warnings: vec!["empty corpus: no statements supplied".to_string()],
                auto_corrections: Vec::new(),
            },
        }
    }
}

#[allow(clippy::too_many_arguments)]
pub fn assemble(
    case_id: &str,
    contradictions: Vec<Contradiction>,
    behavioral_anomalies: Vec<BehavioralAnomaly>,
    affected_entities: BTreeMap<String, EntityInvolvement>,
    document_links: BTreeMap<String, Vec<String>>,
    severity_breakdown: BTreeMap<u8, u32>,
    legal_trigger_evidence: BTreeMap<String, LegalTriggerEvidence>,
    entities: Vec<Entity>,
    narrative: Narrative,
    verification_status: VerificationStatus,
) -> ContradictionReport {
    let timeline_conflicts = contradictions
        .iter()
        .filter(|c| c.contradiction_type == ContradictionType::Timeline)
        .cloned()
        .collect();

    let legal_triggers = legal_trigger_evidence
        .into_iter()
        .map(|(trigger, evidence)| LegalTriggerSummary {
            trigger,
            contradiction_ids: evidence.contradiction_ids,
            confidence: evidence.confidence,
            description: evidence.description,
            recommendation: evidence.recommendation,
        })
        .collect();

    let summary = narrative.final_summary.clone();

    ContradictionReport {
        case_id: case_id.to_string(),
        total_contradictions: contradictions.len(),
        contradictions,
        timeline_conflicts,
        behavioral_anomalies,
        affected_entities,
        document_links,
        severity_breakdown,
        legal_triggers,
        entities,
        narrative,
        summary,
        verification_status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_report_has_no_statements_indexed() {
        let report = ContradictionReport::empty("case-1");
        assert!(!report.verification_status.statements_indexed);
        assert_eq!(report.total_contradictions, 0);
    }
}
