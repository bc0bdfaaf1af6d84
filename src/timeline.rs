//! TIMELINE BUILDER (C5)
//!
//! Projects statements with timestamps into a chronologically ordered
//! sequence of events, clusters events that fall within a configurable
//! window, and flags gaps whose size is an outlier relative to the mean.
//!
//! Core Question: what happened, in what order, and where are the silences?

use serde::{Deserialize, Serialize};

use crate::index::StatementIndex;

/// What kind of occurrence a timeline event represents (spec §3).
///
/// Only `Communication`, `Payment`, `Promise`, `Denial`, `Admission`, and
/// `Other` are ever produced by [`classify`] below; `Document`,
/// `Contradiction`, and `BehaviorChange` are reachable variants reserved
/// for synthetic events other components may attach to a rendered
/// timeline (none currently do).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Communication,
    Payment,
    Promise,
    Document,
    Contradiction,
    Admission,
    Denial,
    BehaviorChange,
    Other,
}

/// How significant an event is (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Significance {
    Low,
    Normal,
    High,
    Critical,
}

fn classify(lowered_text: &str) -> EventType {
    const PAYMENT: &[&str] = &["paid", "payment", "invoice", "wired", "transferred", "refund"];
    const PROMISE: &[&str] = &["promise", "will do", "i will", "guarantee", "commit to", "swear"];
    const DENIAL: &[&str] = &["never", "didn't", "did not", "not true"];
    const ADMISSION: &[&str] = &["i admit", "yes i did", "i did do", "i confess"];

    let hits = |set: &[&str]| set.iter().any(|w| crate::lexicon::word_boundary_contains(lowered_text, w));

    if hits(ADMISSION) {
        EventType::Admission
    } else if hits(DENIAL) {
        EventType::Denial
    } else if hits(PAYMENT) {
        EventType::Payment
    } else if hits(PROMISE) {
        EventType::Promise
    } else {
        EventType::Communication
    }
}

fn significance_of(event_type: EventType) -> Significance {
    match event_type {
        EventType::Denial | EventType::Admission => Significance::Critical,
        EventType::Payment => Significance::High,
        _ => Significance::Normal,
    }
}

/// One dated occurrence derived from a statement (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub id: String,
    pub timestamp_millis: i64,
    pub description: String,
    pub event_type: EventType,
    pub entity_ids: Vec<String>,
    pub source_evidence_id: String,
    pub significance: Significance,
    pub document_id: String,
}

/// A run of events within `cluster_window_hours` of one another.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventCluster {
    pub event_indices: Vec<usize>,
    pub start_millis: i64,
    pub end_millis: i64,
}

/// An unusually large silence between two consecutive events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuietPeriod {
    pub before_index: usize,
    pub after_index: usize,
    pub gap_millis: i64,
    pub multiple_of_mean: f64,
}

/// The full derived timeline (spec §4.5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Timeline {
    pub events: Vec<TimelineEvent>,
    pub clusters: Vec<EventCluster>,
    pub quiet_periods: Vec<QuietPeriod>,
}

impl Timeline {
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn get(&self, statement_id: &str) -> Option<&TimelineEvent> {
        self.events.iter().find(|e| e.source_evidence_id == statement_id)
    }
}

/// Build the timeline over every timestamped statement in `index`.
/// Statements without a timestamp are excluded — events require a
/// timestamp (spec §4.5).
pub fn build_timeline(index: &StatementIndex, cluster_window_hours: i64, gap_unusual_multiple: f64) -> Timeline {
    let mut events: Vec<TimelineEvent> = index
        .all()
        .into_iter()
        .filter_map(|s| {
            let ts = s.timestamp_millis?;
            let lowered = s.text.to_lowercase();
            let event_type = classify(&lowered);
            Some(TimelineEvent {
                id: format!("evt-{}", s.id),
                timestamp_millis: ts,
                description: summarize(&s.text),
                event_type,
                entity_ids: vec![s.normalized_speaker()],
                source_evidence_id: s.id.clone(),
                significance: significance_of(event_type),
                document_id: s.document_id.clone(),
            })
        })
        .collect();

    events.sort_by(|a, b| {
        a.timestamp_millis
            .cmp(&b.timestamp_millis)
            .then_with(|| a.source_evidence_id.cmp(&b.source_evidence_id))
    });

    let clusters = cluster_events(&events, cluster_window_hours);
    let quiet_periods = find_quiet_periods(&events, gap_unusual_multiple);

    Timeline {
        events,
        clusters,
        quiet_periods,
    }
}

fn summarize(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= 120 {
        trimmed.to_string()
    } else {
        let truncated: String = trimmed.chars().take(117).collect();
        format!("{}...", truncated)
    }
}

fn cluster_events(events: &[TimelineEvent], window_hours: i64) -> Vec<EventCluster> {
    if events.is_empty() {
        return Vec::new();
    }
    let window_millis = window_hours * 3_600_000;
    let mut clusters = Vec::new();
    let mut current: Vec<usize> = vec![0];
    let mut cluster_start = events[0].timestamp_millis;

    for i in 1..events.len() {
        if events[i].timestamp_millis - events[i - 1].timestamp_millis <= window_millis {
            current.push(i);
        } else {
            clusters.push(finish_cluster(events, &current, cluster_start));
            current = vec![i];
            cluster_start = events[i].timestamp_millis;
        }
    }
    clusters.push(finish_cluster(events, &current, cluster_start));
    clusters.into_iter().filter(|c| c.event_indices.len() > 1).collect()
}

fn finish_cluster(events: &[TimelineEvent], indices: &[usize], start: i64) -> EventCluster {
    let end = indices
        .iter()
        .map(|&i| events[i].timestamp_millis)
        .max()
        .unwrap_or(start);
    EventCluster {
        event_indices: indices.to_vec(),
        start_millis: start,
        end_millis: end,
    }
}

fn find_quiet_periods(events: &[TimelineEvent], unusual_multiple: f64) -> Vec<QuietPeriod> {
    if events.len() < 2 {
        return Vec::new();
    }
    let gaps: Vec<i64> = events
        .windows(2)
        .map(|pair| pair[1].timestamp_millis - pair[0].timestamp_millis)
        .collect();
    let mean = gaps.iter().sum::<i64>() as f64 / gaps.len() as f64;
    if mean <= 0.0 {
        return Vec::new();
    }

    gaps.iter()
        .enumerate()
        .filter_map(|(i, &gap)| {
            let multiple = gap as f64 / mean;
            if multiple > unusual_multiple {
                Some(QuietPeriod {
                    before_index: i,
                    after_index: i + 1,
                    gap_millis: gap,
                    multiple_of_mean: multiple,
                })
            } else {
                None
            }
        })
        .collect()
}
