//! CONTRADICTION ENGINE (C6)
//!
//! The top-level orchestrator: indexes statements, builds the embedding
//! vocabulary, derives entity and timeline views, runs the four
//! contradiction passes, scores liability, composes the narrative, and
//! assembles the final report. `ContradictionEngine::run` is the one
//! operation the rest of the crate exists to support.
//!
//! Core Question: given everything we now know about who said what, when,
//! and how, where do the stories actually conflict?

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::behavior::{self, BehavioralAnomaly, PatternTag};
use crate::config::EngineConfig;
use crate::embedding::{self, Vocabulary};
use crate::entity::{self, Entity, EntityHints};
use crate::error::{EngineError, EngineResult};
use crate::index::{Statement, StatementIndex};
use crate::liability::{self, CausalInputs, ConsistencyInputs, EvidenceInputs};
use crate::narrative;
use crate::report::{ContradictionReport, VerificationStatus};
use crate::timeline::{self, Timeline};

/// The six-way contradiction taxonomy (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContradictionType {
    Direct,
    CrossDocument,
    Behavioral,
    Temporal,
    MissingEvidence,
    ThirdParty,
    Timeline,
}

/// The ten legal-significance labels (glossary).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegalTrigger {
    Fraud,
    Misrepresentation,
    Concealment,
    PerjuryRisk,
    BreachOfContract,
    TimelineInconsistency,
    UnreliableTestimony,
    FinancialDiscrepancy,
    ConflictOfInterest,
    Negligence,
}

impl LegalTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            LegalTrigger::Fraud => "fraud",
            LegalTrigger::Misrepresentation => "misrepresentation",
            LegalTrigger::Concealment => "concealment",
            LegalTrigger::PerjuryRisk => "perjury_risk",
            LegalTrigger::BreachOfContract => "breach_of_contract",
            LegalTrigger::TimelineInconsistency => "timeline_inconsistency",
            LegalTrigger::UnreliableTestimony => "unreliable_testimony",
            LegalTrigger::FinancialDiscrepancy => "financial_discrepancy",
            LegalTrigger::ConflictOfInterest => "conflict_of_interest",
            LegalTrigger::Negligence => "negligence",
        }
    }

    fn description(&self) -> &'static str {
        match self {
            LegalTrigger::Fraud => "Statements conflict on material facts in a way consistent with intentional deception.",
            LegalTrigger::Misrepresentation => "A party's account of events materially contradicts another account or its own prior statement.",
            LegalTrigger::Concealment => "Evasive or over-explained language suggests information is being withheld.",
            LegalTrigger::PerjuryRisk => "A sworn or formal account appears inconsistent with other evidence.",
            LegalTrigger::BreachOfContract => "Statements describe an agreement that was not honored as described.",
            LegalTrigger::TimelineInconsistency => "Events or statements about the same subject disagree on ordering or timing.",
            LegalTrigger::UnreliableTestimony => "A speaker's account shifts in tone, certainty, or content across statements.",
            LegalTrigger::FinancialDiscrepancy => "Amounts attributed to the same entity disagree across documents.",
            LegalTrigger::ConflictOfInterest => "An entity's role across documents suggests competing incentives.",
            LegalTrigger::Negligence => "A party's own statements suggest a failure of a duty of care.",
        }
    }

    fn recommendation(&self) -> &'static str {
        match self {
            LegalTrigger::Fraud => "Investigate supporting documentation for the disputed facts.",
            LegalTrigger::Misrepresentation => "Cross-reference with independent records before relying on either account.",
            LegalTrigger::Concealment => "Request clarifying detail or supporting evidence directly from the speaker.",
            LegalTrigger::PerjuryRisk => "Compare against the formal record under oath, if one exists.",
            LegalTrigger::BreachOfContract => "Review the underlying agreement for the actual obligations owed.",
            LegalTrigger::TimelineInconsistency => "Reconstruct the sequence of events from independently dated evidence.",
            LegalTrigger::UnreliableTestimony => "Weigh this speaker's later statements against their earlier ones.",
            LegalTrigger::FinancialDiscrepancy => "Reconcile the disputed amount against invoices, receipts, or transfers.",
            LegalTrigger::ConflictOfInterest => "Examine the entity's relationships across all involved parties.",
            LegalTrigger::Negligence => "Assess whether a reasonable duty of care was met.",
        }
    }
}

/// A bucket over the 1..10 severity scale (spec glossary).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeverityBucket {
    Low,
    Medium,
    High,
    Critical,
}

pub fn severity_bucket(severity: u8) -> SeverityBucket {
    match severity {
        9..=10 => SeverityBucket::Critical,
        7..=8 => SeverityBucket::High,
        4..=6 => SeverityBucket::Medium,
        _ => SeverityBucket::Low,
    }
}

/// A finding tying two statements (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contradiction {
    pub id: String,
    pub contradiction_type: ContradictionType,
    pub source_statement: String,
    pub target_statement: String,
    pub source_document: String,
    pub source_line_number: u64,
    pub severity: u8,
    pub description: String,
    pub legal_trigger: Option<LegalTrigger>,
    pub affected_entities: Vec<String>,
    pub similarity_score: Option<f64>,
    pass_number: u8,
}

fn sev_from_score(score: f64) -> u8 {
    if score > 0.9 {
        10
    } else if score > 0.8 {
        9
    } else if score > 0.7 {
        8
    } else if score > 0.6 {
        7
    } else if score > 0.5 {
        6
    } else {
        5
    }
}

fn pair_trigger(reason: &str, same_speaker: bool, same_document: bool) -> LegalTrigger {
    let lower = reason.to_lowercase();
    if lower.contains("negation") {
        LegalTrigger::Misrepresentation
    } else if lower.contains("conflicting") {
        LegalTrigger::Fraud
    } else if same_speaker {
        LegalTrigger::UnreliableTestimony
    } else if !same_document {
        LegalTrigger::Misrepresentation
    } else {
        LegalTrigger::Concealment
    }
}

fn affected_entities_of(a: &Statement, b: &Statement) -> Vec<String> {
    let mut set = BTreeSet::new();
    set.insert(a.normalized_speaker());
    set.insert(b.normalized_speaker());
    set.into_iter().collect()
}

fn contradiction_id(source_id: &str, target_id: &str, pass_number: u8) -> String {
    let (lo, hi) = if source_id <= target_id {
        (source_id, target_id)
    } else {
        (target_id, source_id)
    };
    format!("contra-{}-{}-p{}", lo, hi, pass_number)
}

fn run_semantic_pass(
    statements: &[&Statement],
    vocabulary: &Vocabulary,
    config: &EngineConfig,
    restrict_same_document: bool,
    contradiction_type: ContradictionType,
    pass_number: u8,
) -> Vec<Contradiction> {
    let negation_pairs = config.lexicons.negation_pairs();
    let mut out = Vec::new();

    for i in 0..statements.len() {
        for j in (i + 1)..statements.len() {
            let a = statements[i];
            let b = statements[j];
            let same_document = a.document_id == b.document_id;
            if same_document != restrict_same_document {
                continue;
            }
            let (Some(emb_a), Some(emb_b)) = (&a.embedding, &b.embedding) else {
                continue;
            };
            let Some(found) = embedding::detect_semantic_contradiction(
                emb_a,
                emb_b,
                &a.text,
                &b.text,
                a.sentiment,
                b.sentiment,
                negation_pairs,
                config.similarity_threshold,
                config.high_similarity_threshold,
            ) else {
                continue;
            };

            let severity = sev_from_score(found.contradiction_score);
            let same_speaker = a.normalized_speaker() == b.normalized_speaker();
            let trigger = pair_trigger(found.reason, same_speaker, same_document);

            out.push(Contradiction {
                id: contradiction_id(&a.id, &b.id, pass_number),
                contradiction_type,
                source_statement: a.id.clone(),
                target_statement: b.id.clone(),
                source_document: a.document_id.clone(),
                source_line_number: a.line_number,
                severity,
                description: format!("{} (similarity {:.2})", found.reason, found.similarity),
                legal_trigger: Some(trigger),
                affected_entities: affected_entities_of(a, b),
                similarity_score: Some(found.similarity),
                pass_number,
            });
        }
    }
    out
}

/// Pass 3a: an entity whose statements disagree across documents about
/// emails, amounts, or dates.
fn run_entity_fact_pass(index: &StatementIndex, entities: &[Entity]) -> Vec<Contradiction> {
    let mut out = Vec::new();

    for e in entities {
        let statements: Vec<&Statement> = e
            .statement_ids
            .iter()
            .filter_map(|id| index.get(id))
            .collect();

        for i in 0..statements.len() {
            for j in (i + 1)..statements.len() {
                let a = statements[i];
                let b = statements[j];
                if a.document_id == b.document_id {
                    continue;
                }
                if let Some(c) = amount_conflict(a, b) {
                    out.push(c);
                } else if let Some(c) = date_conflict(a, b) {
                    out.push(c);
                }
            }
        }
    }
    out
}

fn amount_conflict(a: &Statement, b: &Statement) -> Option<Contradiction> {
    let amounts_a = crate::lexicon::extract_money(&a.text);
    let amounts_b = crate::lexicon::extract_money(&b.text);
    if amounts_a.is_empty() || amounts_b.is_empty() || amounts_a == amounts_b {
        return None;
    }
    Some(Contradiction {
        id: contradiction_id(&a.id, &b.id, 3),
        contradiction_type: ContradictionType::CrossDocument,
        source_statement: a.id.clone(),
        target_statement: b.id.clone(),
        source_document: a.document_id.clone(),
        source_line_number: a.line_number,
        severity: 7,
        description: "Entity's statements disagree on amount across documents".to_string(),
        legal_trigger: Some(LegalTrigger::FinancialDiscrepancy),
        affected_entities: affected_entities_of(a, b),
        similarity_score: None,
        pass_number: 3,
    })
}

fn date_conflict(a: &Statement, b: &Statement) -> Option<Contradiction> {
    let dates_a = crate::lexicon::extract_dates(&a.text);
    let dates_b = crate::lexicon::extract_dates(&b.text);
    if dates_a.is_empty() || dates_b.is_empty() || dates_a == dates_b {
        return None;
    }
    Some(Contradiction {
        id: contradiction_id(&a.id, &b.id, 3),
        contradiction_type: ContradictionType::CrossDocument,
        source_statement: a.id.clone(),
        target_statement: b.id.clone(),
        source_document: a.document_id.clone(),
        source_line_number: a.line_number,
        severity: 6,
        description: "Entity's statements disagree on date across documents".to_string(),
        legal_trigger: Some(LegalTrigger::TimelineInconsistency),
        affected_entities: affected_entities_of(a, b),
        similarity_score: None,
        pass_number: 3,
    })
}

/// Pass 3b: timeline events about the same subject whose event types
/// imply opposite outcomes (e.g. one document's payment/admission against
/// another's denial of the same subject).
fn run_timeline_subject_pass(index: &StatementIndex, timeline: &Timeline) -> Vec<Contradiction> {
    use crate::timeline::EventType;
    let mut out = Vec::new();

    for i in 0..timeline.events.len() {
        for j in (i + 1)..timeline.events.len() {
            let ea = &timeline.events[i];
            let eb = &timeline.events[j];
            if ea.document_id == eb.document_id {
                continue;
            }
            if shared_significant_tokens(&ea.description, &eb.description) < 3 {
                continue;
            }
            let conflicts = matches!(
                (ea.event_type, eb.event_type),
                (EventType::Payment, EventType::Denial)
                    | (EventType::Denial, EventType::Payment)
                    | (EventType::Admission, EventType::Denial)
                    | (EventType::Denial, EventType::Admission)
            );
            if !conflicts {
                continue;
            }
            let (Some(a), Some(b)) = (index.get(&ea.source_evidence_id), index.get(&eb.source_evidence_id)) else {
                continue;
            };
            out.push(Contradiction {
                id: contradiction_id(&a.id, &b.id, 3),
                contradiction_type: ContradictionType::Timeline,
                source_statement: a.id.clone(),
                target_statement: b.id.clone(),
                source_document: a.document_id.clone(),
                source_line_number: a.line_number,
                severity: 7,
                description: "Timeline events about the same subject imply opposite outcomes".to_string(),
                legal_trigger: Some(LegalTrigger::TimelineInconsistency),
                affected_entities: affected_entities_of(a, b),
                similarity_score: None,
                pass_number: 3,
            });
        }
    }
    out
}

/// Pass 3c: a statement references a timeline event about the same
/// subject but the two disagree on timing by more than the configured
/// tolerance.
fn run_timeline_statement_pass(
    index: &StatementIndex,
    timeline: &Timeline,
    timeline_conflict_days: i64,
) -> Vec<Contradiction> {
    let mut out = Vec::new();
    let tolerance_millis = timeline_conflict_days * 86_400_000;
    let all_statements = index.all();

    for event in &timeline.events {
        for statement in &all_statements {
            if statement.id == event.source_evidence_id {
                continue;
            }
            let Some(ts) = statement.timestamp_millis else {
                continue;
            };
            if shared_word_tokens(&event.description, &statement.text) < 3 {
                continue;
            }
            let delta = (ts - event.timestamp_millis).abs();
            if delta > tolerance_millis {
                let Some(source) = index.get(&event.source_evidence_id) else {
                    continue;
                };
                out.push(Contradiction {
                    id: contradiction_id(&source.id, &statement.id, 3),
                    contradiction_type: ContradictionType::Timeline,
                    source_statement: source.id.clone(),
                    target_statement: statement.id.clone(),
                    source_document: source.document_id.clone(),
                    source_line_number: source.line_number,
                    severity: 6,
                    description: "Statement timing disagrees with a referenced timeline event".to_string(),
                    legal_trigger: Some(LegalTrigger::TimelineInconsistency),
                    affected_entities: affected_entities_of(source, statement),
                    similarity_score: None,
                    pass_number: 3,
                });
            }
        }
    }
    out
}

fn shared_significant_tokens(text_a: &str, text_b: &str) -> usize {
    let a = crate::lexicon::significant_words(text_a);
    let b = crate::lexicon::significant_words(text_b);
    a.intersection(&b).count()
}

fn shared_word_tokens(text_a: &str, text_b: &str) -> usize {
    let a: BTreeSet<String> = crate::lexicon::tokenize(text_a).into_iter().filter(|t| t.len() > 3).collect();
    let b: BTreeSet<String> = crate::lexicon::tokenize(text_b).into_iter().filter(|t| t.len() > 3).collect();
    a.intersection(&b).count()
}

/// Pass 4: lift each behavioral anomaly into a contradiction between the
/// first and last statement it cites.
fn run_behavioral_pass(index: &StatementIndex, anomalies: &[BehavioralAnomaly]) -> Vec<Contradiction> {
    let mut out = Vec::new();
    for anomaly in anomalies {
        let (Some(first_id), Some(last_id)) = (anomaly.statement_ids.first(), anomaly.statement_ids.last()) else {
            continue;
        };
        let (Some(a), Some(b)) = (index.get(first_id), index.get(last_id)) else {
            continue;
        };
        let trigger = behavioral_trigger(anomaly.pattern);
        out.push(Contradiction {
            id: contradiction_id(&a.id, &b.id, 4),
            contradiction_type: ContradictionType::Behavioral,
            source_statement: a.id.clone(),
            target_statement: b.id.clone(),
            source_document: a.document_id.clone(),
            source_line_number: a.line_number,
            severity: anomaly.severity,
            description: anomaly.description.clone(),
            legal_trigger: Some(trigger),
            affected_entities: affected_entities_of(a, b),
            similarity_score: None,
            pass_number: 4,
        });
    }
    out
}

fn behavioral_trigger(pattern: PatternTag) -> LegalTrigger {
    match pattern {
        PatternTag::Gaslighting => LegalTrigger::Fraud,
        PatternTag::OverExplaining => LegalTrigger::Concealment,
        PatternTag::BlameShifting => LegalTrigger::Misrepresentation,
        PatternTag::DeflectionPattern => LegalTrigger::Concealment,
        PatternTag::SuddenDenial => LegalTrigger::UnreliableTestimony,
        PatternTag::ToneShift | PatternTag::CertaintyDecline => LegalTrigger::UnreliableTestimony,
        PatternTag::SentimentShift => LegalTrigger::UnreliableTestimony,
    }
}

/// Drop duplicate (source, target) pairs, keeping the earliest pass
/// number's entry (spec §5: "Pass 1 wins over Pass 2; earlier pass wins
/// over later").
fn dedup_contradictions(mut contradictions: Vec<Contradiction>) -> Vec<Contradiction> {
    contradictions.sort_by(|a, b| {
        let key_a = pair_key(a);
        let key_b = pair_key(b);
        key_a.cmp(&key_b).then_with(|| a.pass_number.cmp(&b.pass_number))
    });
    let mut seen = BTreeSet::new();
    let mut out = Vec::new();
    for c in contradictions {
        let key = pair_key(&c);
        if seen.insert(key) {
            out.push(c);
        }
    }
    out
}

fn pair_key(c: &Contradiction) -> (String, String) {
    if c.source_statement <= c.target_statement {
        (c.source_statement.clone(), c.target_statement.clone())
    } else {
        (c.target_statement.clone(), c.source_statement.clone())
    }
}

/// `entity_involvement` entry (spec §4.6 post-processing).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityInvolvement {
    pub count: u32,
    pub contradiction_ids: Vec<String>,
    pub liability: f64,
    pub primary_role: String,
}

fn build_entity_involvement(index: &StatementIndex, contradictions: &[Contradiction]) -> BTreeMap<String, EntityInvolvement> {
    let mut per_entity: BTreeMap<String, (Vec<String>, Vec<u8>, u32, u32)> = BTreeMap::new();

    for c in contradictions {
        let source_speaker = index.get(&c.source_statement).map(|s| s.normalized_speaker());
        for entity in &c.affected_entities {
            let entry = per_entity.entry(entity.clone()).or_insert_with(|| (Vec::new(), Vec::new(), 0, 0));
            entry.0.push(c.id.clone());
            entry.1.push(c.severity);
            if source_speaker.as_deref() == Some(entity.as_str()) {
                entry.2 += 1;
            } else {
                entry.3 += 1;
            }
        }
    }

    per_entity
        .into_iter()
        .map(|(entity, (ids, severities, as_source, as_target))| {
            let count = ids.len() as u32;
            let avg_severity = severities.iter().map(|&s| s as f64).sum::<f64>() / severities.len().max(1) as f64;
            let liability = (avg_severity * 5.0 + count as f64 * 3.0).clamp(0.0, 100.0);
            let primary_role = if as_source > as_target {
                "initiator".to_string()
            } else {
                "participant".to_string()
            };
            (
                entity,
                EntityInvolvement {
                    count,
                    contradiction_ids: ids,
                    liability,
                    primary_role,
                },
            )
        })
        .collect()
}

fn build_document_links(contradictions: &[Contradiction]) -> BTreeMap<String, Vec<String>> {
    let mut out: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for c in contradictions {
        out.entry(c.source_document.clone()).or_default().push(c.id.clone());
    }
    out
}

fn build_severity_breakdown(contradictions: &[Contradiction]) -> BTreeMap<u8, u32> {
    let mut out: BTreeMap<u8, u32> = (1..=10).map(|s| (s, 0)).collect();
    for c in contradictions {
        *out.entry(c.severity).or_insert(0) += 1;
    }
    out
}

/// `legal_trigger_evidence` entry (spec §4.6 post-processing).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegalTriggerEvidence {
    pub contradiction_ids: Vec<String>,
    pub confidence: f64,
    pub description: String,
    pub recommendation: String,
}

fn build_legal_trigger_evidence(contradictions: &[Contradiction]) -> BTreeMap<String, LegalTriggerEvidence> {
    let mut by_trigger: BTreeMap<LegalTrigger, (Vec<String>, Vec<u8>)> = BTreeMap::new();
    for c in contradictions {
        if let Some(trigger) = c.legal_trigger {
            let entry = by_trigger.entry(trigger).or_insert_with(|| (Vec::new(), Vec::new()));
            entry.0.push(c.id.clone());
            entry.1.push(c.severity);
        }
    }
    by_trigger
        .into_iter()
        .map(|(trigger, (ids, severities))| {
            let confidence = severities.iter().map(|&s| s as f64 / 10.0).sum::<f64>() / severities.len().max(1) as f64;
            (
                trigger.as_str().to_string(),
                LegalTriggerEvidence {
                    contradiction_ids: ids,
                    confidence,
                    description: trigger.description().to_string(),
                    recommendation: trigger.recommendation().to_string(),
                },
            )
        })
        .collect()
}

impl LegalTrigger {
    pub const ALL: [LegalTrigger; 10] = [
        LegalTrigger::Fraud,
        LegalTrigger::Misrepresentation,
        LegalTrigger::Concealment,
        LegalTrigger::PerjuryRisk,
        LegalTrigger::BreachOfContract,
        LegalTrigger::TimelineInconsistency,
        LegalTrigger::UnreliableTestimony,
        LegalTrigger::FinancialDiscrepancy,
        LegalTrigger::ConflictOfInterest,
        LegalTrigger::Negligence,
    ];
}

/// Construction-time engine over a fixed configuration. One instance may
/// run many independent cases; each `run` call is fully isolated.
#[derive(Debug, Clone)]
pub struct ContradictionEngine {
    config: EngineConfig,
}

impl ContradictionEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Run the full pipeline over `statements` and produce a report.
    /// `hints`/`causal_inputs`/`consistency_inputs`/`evidence_inputs` are
    /// externally supplied per normalized-speaker-key liability inputs
    /// (spec §9's open questions) — omit entries for entities with no
    /// known values; they default to zero contribution.
    pub fn run(
        &self,
        case_id: &str,
        statements: Vec<Statement>,
        hints: &BTreeMap<String, EntityHints>,
        causal_inputs: &BTreeMap<String, CausalInputs>,
        consistency_inputs: &BTreeMap<String, ConsistencyInputs>,
        evidence_inputs: &BTreeMap<String, EvidenceInputs>,
    ) -> EngineResult<ContradictionReport> {
        let lexicons = self.config.lexicons.compile()?;

        if statements.is_empty() {
            log::warn!("{}", EngineError::EmptyCorpus("no statements supplied".to_string()));
            return Ok(ContradictionReport::empty(case_id));
        }

        let mut index = StatementIndex::new();
        let statement_count = statements.len();
        index.add(statements)?;
        index.freeze();
        log::info!("case {}: indexed {} statements, index frozen", case_id, statement_count);

        let texts: Vec<&str> = index.all().iter().map(|s| s.text.as_str()).collect();
        let vocabulary = Vocabulary::build(&texts, self.config.embedding_dimension);

        let ids: Vec<String> = index.all().iter().map(|s| s.id.clone()).collect();
        for id in &ids {
            let text = index.get(id).expect("id from index.all() exists").text.clone();
            let vector = vocabulary.generate(&text);
            index.update_embedding(id, vector)?;
        }
        log::debug!("case {}: assigned {}-dim embeddings to all statements", case_id, vocabulary.dimension());

        let entities = entity::build_entities(&index, hints, &lexicons, self.config.min_entity_mentions);
        log::info!(
            "case {}: resolved {} speakers into {} entities (min_mentions={})",
            case_id,
            index.speakers().len(),
            entities.len(),
            self.config.min_entity_mentions
        );
        let timeline = timeline::build_timeline(&index, self.config.cluster_window_hours, self.config.gap_unusual_multiple);
        let (anomalies, profiles) = behavior::analyze_all(&index, &lexicons);
        log::debug!(
            "case {}: built {} timeline events, detected {} behavioral anomalies",
            case_id,
            timeline.events.len(),
            anomalies.len()
        );

        let all_sorted: Vec<&Statement> = index.all();

        let mut contradictions = Vec::new();
        contradictions.extend(run_semantic_pass(&all_sorted, &vocabulary, &self.config, true, ContradictionType::Direct, 1));
        log::debug!("case {}: pass 1 (intra-document) complete, {} findings so far", case_id, contradictions.len());
        contradictions.extend(run_semantic_pass(&all_sorted, &vocabulary, &self.config, false, ContradictionType::CrossDocument, 2));
        log::debug!("case {}: pass 2 (cross-document) complete, {} findings so far", case_id, contradictions.len());
        contradictions.extend(run_entity_fact_pass(&index, &entities));
        contradictions.extend(run_timeline_subject_pass(&index, &timeline));
        contradictions.extend(run_timeline_statement_pass(&index, &timeline, self.config.timeline_conflict_days));
        log::debug!("case {}: pass 3 (cross-modal) complete, {} findings so far", case_id, contradictions.len());
        contradictions.extend(run_behavioral_pass(&index, &anomalies));
        log::debug!("case {}: pass 4 (behavioral) complete, {} findings before dedup", case_id, contradictions.len());

        let contradictions = dedup_contradictions(contradictions);
        log::info!("case {}: {} contradictions after deduplication", case_id, contradictions.len());

        let entity_involvement = build_entity_involvement(&index, &contradictions);
        let document_links = build_document_links(&contradictions);
        let severity_breakdown = build_severity_breakdown(&contradictions);
        let legal_trigger_evidence = build_legal_trigger_evidence(&contradictions);

        let mut entities_with_scores = entities;
        let liability_scores = liability::score_all(
            &entities_with_scores,
            &contradictions,
            &anomalies,
            &lexicons,
            &index,
            causal_inputs,
            consistency_inputs,
            evidence_inputs,
        );
        for e in entities_with_scores.iter_mut() {
            e.liability_score = liability_scores.get(&e.primary_name.to_lowercase()).cloned();
        }

        let narrative = narrative::compose(
            &index,
            &timeline,
            &contradictions,
            &anomalies,
            &entities_with_scores,
            &profiles,
        );

        let verification_status = VerificationStatus {
            statements_indexed: true,
            embeddings_assigned: true,
            timeline_built: true,
            entities_profiled: true,
            warnings: Vec::new(),
            auto_corrections: Vec::new(),
        };

        Ok(crate::report::assemble(
            case_id,
            contradictions,
            anomalies,
            entity_involvement,
            document_links,
            severity_breakdown,
            legal_trigger_evidence,
            entities_with_scores,
            narrative,
            verification_status,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::Statement;

    fn engine() -> ContradictionEngine {
        ContradictionEngine::new(EngineConfig::default())
    }

    #[test]
    fn empty_corpus_yields_empty_report() {
        let report = engine()
            .run("case-1", vec![], &BTreeMap::new(), &BTreeMap::new(), &BTreeMap::new(), &BTreeMap::new())
            .unwrap();
        assert_eq!(report.total_contradictions, 0);
        assert!(!report.verification_status.statements_indexed);
    }

    #[test]
    fn s1_direct_negation_same_speaker_same_document() {
        let statements = vec![
            Statement::new("S1", "John", "I paid the full amount", "D1", 1).with_timestamp(0),
            Statement::new("S2", "John", "I never paid", "D1", 2).with_timestamp(1_000),
        ];
        let report = engine()
            .run("case-s1", statements, &BTreeMap::new(), &BTreeMap::new(), &BTreeMap::new(), &BTreeMap::new())
            .unwrap();
        assert_eq!(report.total_contradictions, 1);
        let c = &report.contradictions[0];
        assert_eq!(c.contradiction_type, ContradictionType::Direct);
        assert!(c.severity >= 8);
        assert_eq!(c.legal_trigger, Some(LegalTrigger::Misrepresentation));
        assert_eq!(c.affected_entities, vec!["john".to_string()]);
    }

    #[test]
    fn s4_amount_mismatch_across_documents() {
        let statements = vec![
            Statement::new("S1", "Bob", "The invoice was $10,000.", "D1", 1).with_timestamp(0),
            Statement::new("S2", "Bob", "The amount was always $5,000.", "D2", 1).with_timestamp(1_000),
        ];
        let report = engine()
            .run("case-s4", statements, &BTreeMap::new(), &BTreeMap::new(), &BTreeMap::new(), &BTreeMap::new())
            .unwrap();
        let cross_doc = report
            .contradictions
            .iter()
            .find(|c| c.description.contains("Conflicting factual claims") || c.description.contains("disagree on amount"));
        assert!(cross_doc.is_some());
        assert!(cross_doc.unwrap().severity >= 6);
    }

    #[test]
    fn s6_consistent_corpus_yields_no_contradictions() {
        let statements = vec![
            Statement::new("S1", "Sarah", "Yes, Tuesday works for the meeting.", "D1", 1)
                .with_timestamp(0)
                .with_sentiment(0.5),
            Statement::new("S2", "Sarah", "Yes, Tuesday works for the meeting.", "D2", 1)
                .with_timestamp(1_000)
                .with_sentiment(0.5),
        ];
        let report = engine()
            .run("case-s6", statements, &BTreeMap::new(), &BTreeMap::new(), &BTreeMap::new(), &BTreeMap::new())
            .unwrap();
        assert_eq!(report.total_contradictions, 0);
    }

    #[test]
    fn entity_involvement_only_includes_mentioned_entities() {
        let statements = vec![
            Statement::new("S1", "John", "I paid the full amount", "D1", 1).with_timestamp(0),
            Statement::new("S2", "John", "I never paid", "D1", 2).with_timestamp(1_000),
        ];
        let report = engine()
            .run("case-inv", statements, &BTreeMap::new(), &BTreeMap::new(), &BTreeMap::new(), &BTreeMap::new())
            .unwrap();
        assert!(report.affected_entities.contains_key("john"));
    }
}
