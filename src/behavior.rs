//! BEHAVIORAL / LINGUISTIC DRIFT DETECTOR (C7)
//!
//! For each speaker with at least two statements, ordered by timestamp
//! then id, runs eight independent sub-detectors over sentiment,
//! certainty, tone, and lexicon hits, and folds their output into a
//! per-speaker [`BehavioralProfile`].
//!
//! Core Question: does this speaker's story change in how it's told, not
//! just in what it claims?

use serde::{Deserialize, Serialize};

use crate::index::{Statement, StatementIndex};
use crate::lexicon::{CompiledLexicons, LexiconTag};

/// A manipulation or drift pattern tag (spec §4.7/§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternTag {
    SentimentShift,
    CertaintyDecline,
    ToneShift,
    DeflectionPattern,
    OverExplaining,
    BlameShifting,
    Gaslighting,
    SuddenDenial,
}

impl PatternTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatternTag::SentimentShift => "sentiment_shift",
            PatternTag::CertaintyDecline => "certainty_decline",
            PatternTag::ToneShift => "tone_shift",
            PatternTag::DeflectionPattern => "deflection_pattern",
            PatternTag::OverExplaining => "over_explaining",
            PatternTag::BlameShifting => "blame_shifting",
            PatternTag::Gaslighting => "gaslighting",
            PatternTag::SuddenDenial => "sudden_denial",
        }
    }
}

/// One detected behavioral signal (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BehavioralAnomaly {
    pub id: String,
    pub entity: String,
    pub pattern: PatternTag,
    pub description: String,
    pub severity: u8,
    pub statement_ids: Vec<String>,
    pub before_state: String,
    pub after_state: String,
}

/// `(timestamp, value, source_statement_id)`.
pub type TrendPoint = (i64, f64, String);

/// `(before_id, after_id, before_tone, after_tone)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToneShift {
    pub before_id: String,
    pub after_id: String,
    pub before_tone: &'static str,
    pub after_tone: &'static str,
}

/// Per-entity time-series view (spec §3).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BehavioralProfile {
    pub sentiment_trend: Vec<TrendPoint>,
    pub certainty_trend: Vec<TrendPoint>,
    pub deflection_count: u32,
    pub tone_shifts: Vec<ToneShift>,
    pub patterns: std::collections::BTreeSet<PatternTag>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tone {
    Cooperative,
    Defensive,
    Neutral,
}

fn tone_of(lowered_text: &str, lexicons: &CompiledLexicons) -> Tone {
    let cooperative = lexicons.count(LexiconTag::Cooperative, lowered_text);
    let defensive = lexicons.count(LexiconTag::Defensive, lowered_text);
    if cooperative > 0 && cooperative > defensive {
        Tone::Cooperative
    } else if defensive > 0 && defensive >= cooperative {
        Tone::Defensive
    } else {
        Tone::Neutral
    }
}

fn tone_label(tone: Tone) -> &'static str {
    match tone {
        Tone::Cooperative => "cooperative",
        Tone::Defensive => "defensive",
        Tone::Neutral => "neutral",
    }
}

fn anomaly_id(entity: &str, pattern: PatternTag, statement_ids: &[String]) -> String {
    format!("anomaly-{}-{}-{}", entity, pattern.as_str(), statement_ids.join("_"))
}

/// Run all eight sub-detectors for a single speaker's statements, already
/// sorted by timestamp then id. Statements without a timestamp are kept
/// in their supplied (id-sorted) relative order, per [`StatementIndex::by_speaker`].
pub fn analyze_speaker(
    entity: &str,
    statements: &[&Statement],
    lexicons: &CompiledLexicons,
) -> (Vec<BehavioralAnomaly>, BehavioralProfile) {
    let mut anomalies = Vec::new();
    let mut profile = BehavioralProfile::default();

    if statements.is_empty() {
        return (anomalies, profile);
    }

    for s in statements {
        if let (Some(ts), Some(sentiment)) = (s.timestamp_millis, s.sentiment) {
            profile.sentiment_trend.push((ts, sentiment, s.id.clone()));
        }
        if let (Some(ts), Some(certainty)) = (s.timestamp_millis, s.certainty) {
            profile.certainty_trend.push((ts, certainty, s.id.clone()));
        }
    }

    // Gaslighting fires on a single statement; every other sub-detector
    // needs a pair or a multi-statement count to compare against.
    detect_gaslighting(entity, statements, lexicons, &mut anomalies);

    if statements.len() >= 2 {
        detect_sentiment_shift(entity, statements, &mut anomalies);
        detect_certainty_decline(entity, statements, &mut anomalies);
        detect_tone_shift(entity, statements, lexicons, &mut anomalies, &mut profile);
        detect_deflection_pattern(entity, statements, lexicons, &mut anomalies, &mut profile);
        detect_over_explaining(entity, statements, lexicons, &mut anomalies);
        detect_blame_shifting(entity, statements, lexicons, &mut anomalies);
        detect_sudden_denial(entity, statements, lexicons, &mut anomalies);
    }

    for anomaly in &anomalies {
        profile.patterns.insert(anomaly.pattern);
    }

    (anomalies, profile)
}

fn detect_sentiment_shift(entity: &str, statements: &[&Statement], out: &mut Vec<BehavioralAnomaly>) {
    for pair in statements.windows(2) {
        let (prev, next) = (pair[0], pair[1]);
        if let (Some(sp), Some(sn)) = (prev.sentiment, next.sentiment) {
            let delta = sn - sp;
            if delta < -0.5 {
                let magnitude = delta.abs();
                let severity = if magnitude > 1.5 {
                    9
                } else if magnitude > 1.0 {
                    7
                } else if magnitude > 0.5 {
                    5
                } else {
                    3
                };
                let ids = vec![prev.id.clone(), next.id.clone()];
                out.push(BehavioralAnomaly {
                    id: anomaly_id(entity, PatternTag::SentimentShift, &ids),
                    entity: entity.to_string(),
                    pattern: PatternTag::SentimentShift,
                    description: format!(
                        "{}'s sentiment dropped by {:.2} between consecutive statements",
                        entity, magnitude
                    ),
                    severity,
                    statement_ids: ids,
                    before_state: format!("sentiment={:.2}", sp),
                    after_state: format!("sentiment={:.2}", sn),
                });
            }
        }
    }
}

fn detect_certainty_decline(entity: &str, statements: &[&Statement], out: &mut Vec<BehavioralAnomaly>) {
    for pair in statements.windows(2) {
        let (prev, next) = (pair[0], pair[1]);
        if let (Some(cp), Some(cn)) = (prev.certainty, next.certainty) {
            let drop = cp - cn;
            if drop > 0.3 {
                let severity = if drop > 0.7 {
                    8
                } else if drop > 0.5 {
                    6
                } else if drop > 0.3 {
                    4
                } else {
                    2
                };
                let ids = vec![prev.id.clone(), next.id.clone()];
                out.push(BehavioralAnomaly {
                    id: anomaly_id(entity, PatternTag::CertaintyDecline, &ids),
                    entity: entity.to_string(),
                    pattern: PatternTag::CertaintyDecline,
                    description: format!("{}'s certainty dropped by {:.2}", entity, drop),
                    severity,
                    statement_ids: ids,
                    before_state: format!("certainty={:.2}", cp),
                    after_state: format!("certainty={:.2}", cn),
                });
            }
        }
    }
}

fn detect_tone_shift(
    entity: &str,
    statements: &[&Statement],
    lexicons: &CompiledLexicons,
    out: &mut Vec<BehavioralAnomaly>,
    profile: &mut BehavioralProfile,
) {
    for pair in statements.windows(2) {
        let (prev, next) = (pair[0], pair[1]);
        let tone_prev = tone_of(&prev.text.to_lowercase(), lexicons);
        let tone_next = tone_of(&next.text.to_lowercase(), lexicons);
        if tone_prev == Tone::Cooperative && tone_next == Tone::Defensive {
            profile.tone_shifts.push(ToneShift {
                before_id: prev.id.clone(),
                after_id: next.id.clone(),
                before_tone: tone_label(tone_prev),
                after_tone: tone_label(tone_next),
            });
            let ids = vec![prev.id.clone(), next.id.clone()];
            out.push(BehavioralAnomaly {
                id: anomaly_id(entity, PatternTag::ToneShift, &ids),
                entity: entity.to_string(),
                pattern: PatternTag::ToneShift,
                description: format!("{} shifted from cooperative to defensive tone", entity),
                severity: 6,
                statement_ids: ids,
                before_state: "cooperative".to_string(),
                after_state: "defensive".to_string(),
            });
        }
    }
}

fn detect_deflection_pattern(
    entity: &str,
    statements: &[&Statement],
    lexicons: &CompiledLexicons,
    out: &mut Vec<BehavioralAnomaly>,
    profile: &mut BehavioralProfile,
) {
    let qualifying: Vec<&&Statement> = statements
        .iter()
        .filter(|s| lexicons.count(LexiconTag::Deflection, &s.text.to_lowercase()) >= 2)
        .collect();
    profile.deflection_count = qualifying.len() as u32;
    if qualifying.len() >= 2 {
        let ids: Vec<String> = qualifying.iter().map(|s| s.id.clone()).collect();
        let severity = (4 + qualifying.len() as u8).min(8);
        out.push(BehavioralAnomaly {
            id: anomaly_id(entity, PatternTag::DeflectionPattern, &ids),
            entity: entity.to_string(),
            pattern: PatternTag::DeflectionPattern,
            description: format!("{} repeatedly deflects across {} statements", entity, ids.len()),
            severity,
            statement_ids: ids,
            before_state: String::new(),
            after_state: String::new(),
        });
    }
}

fn detect_over_explaining(
    entity: &str,
    statements: &[&Statement],
    lexicons: &CompiledLexicons,
    out: &mut Vec<BehavioralAnomaly>,
) {
    let qualifying: Vec<&&Statement> = statements
        .iter()
        .filter(|s| {
            lexicons.count(LexiconTag::OverExplaining, &s.text.to_lowercase()) >= 3 || s.text.len() > 500
        })
        .collect();
    if qualifying.len() >= 2 {
        let ids: Vec<String> = qualifying.iter().map(|s| s.id.clone()).collect();
        out.push(BehavioralAnomaly {
            id: anomaly_id(entity, PatternTag::OverExplaining, &ids),
            entity: entity.to_string(),
            pattern: PatternTag::OverExplaining,
            description: format!("{} over-explains across {} statements", entity, ids.len()),
            severity: 7,
            statement_ids: ids,
            before_state: String::new(),
            after_state: String::new(),
        });
    }
}

fn detect_blame_shifting(
    entity: &str,
    statements: &[&Statement],
    lexicons: &CompiledLexicons,
    out: &mut Vec<BehavioralAnomaly>,
) {
    let qualifying: Vec<&&Statement> = statements
        .iter()
        .filter(|s| lexicons.count(LexiconTag::BlameShifting, &s.text.to_lowercase()) >= 1)
        .collect();
    if qualifying.len() >= 2 {
        let ids: Vec<String> = qualifying.iter().map(|s| s.id.clone()).collect();
        out.push(BehavioralAnomaly {
            id: anomaly_id(entity, PatternTag::BlameShifting, &ids),
            entity: entity.to_string(),
            pattern: PatternTag::BlameShifting,
            description: format!("{} shifts blame across {} statements", entity, ids.len()),
            severity: 6,
            statement_ids: ids,
            before_state: String::new(),
            after_state: String::new(),
        });
    }
}

fn detect_gaslighting(
    entity: &str,
    statements: &[&Statement],
    lexicons: &CompiledLexicons,
    out: &mut Vec<BehavioralAnomaly>,
) {
    for s in statements {
        if lexicons.count(LexiconTag::Gaslighting, &s.text.to_lowercase()) >= 1 {
            let ids = vec![s.id.clone()];
            out.push(BehavioralAnomaly {
                id: anomaly_id(entity, PatternTag::Gaslighting, &ids),
                entity: entity.to_string(),
                pattern: PatternTag::Gaslighting,
                description: format!("{} uses gaslighting language", entity),
                severity: 8,
                statement_ids: ids,
                before_state: String::new(),
                after_state: String::new(),
            });
        }
    }
}

/// Bare denial markers a "sudden denial" pair can hinge on, independent of
/// the broader `Defensive` lexicon ("I never agreed to anything" denies
/// without using any of that lexicon's confrontational phrases).
const DENIAL_MARKERS: &[&str] = &["never", "didn't", "did not", "not true", "deny", "denied"];

fn is_denial_language(lowered_text: &str) -> bool {
    DENIAL_MARKERS
        .iter()
        .any(|m| crate::lexicon::word_boundary_contains(lowered_text, m))
}

fn detect_sudden_denial(
    entity: &str,
    statements: &[&Statement],
    lexicons: &CompiledLexicons,
    out: &mut Vec<BehavioralAnomaly>,
) {
    for pair in statements.windows(2) {
        let (prev, next) = (pair[0], pair[1]);
        let prev_lower = prev.text.to_lowercase();
        let next_lower = next.text.to_lowercase();
        let prev_confident = lexicons.any_match(LexiconTag::Certainty, &prev_lower)
            && prev.certainty.map(|c| c > 0.7).unwrap_or(false);
        let next_denies = (lexicons.any_match(LexiconTag::Defensive, &next_lower) || is_denial_language(&next_lower))
            && next.certainty.map(|c| c < 0.5).unwrap_or(false);
        if prev_confident && next_denies {
            let ids = vec![prev.id.clone(), next.id.clone()];
            out.push(BehavioralAnomaly {
                id: anomaly_id(entity, PatternTag::SuddenDenial, &ids),
                entity: entity.to_string(),
                pattern: PatternTag::SuddenDenial,
                description: format!("{} suddenly denies a previously confident claim", entity),
                severity: 8,
                statement_ids: ids,
                before_state: format!("certainty={:.2}", prev.certainty.unwrap_or(0.0)),
                after_state: format!("certainty={:.2}", next.certainty.unwrap_or(0.0)),
            });
        }
    }
}

/// Run the detector for every speaker in `index` with at least two
/// statements. Returns all anomalies in speaker order, and a map from
/// normalized speaker key to their profile.
pub fn analyze_all(
    index: &StatementIndex,
    lexicons: &CompiledLexicons,
) -> (Vec<BehavioralAnomaly>, std::collections::BTreeMap<String, BehavioralProfile>) {
    let mut all_anomalies = Vec::new();
    let mut profiles = std::collections::BTreeMap::new();

    for speaker in index.speakers() {
        let statements = index.by_speaker(&speaker);
        if statements.is_empty() {
            continue;
        }
        let (anomalies, profile) = analyze_speaker(&speaker, &statements, lexicons);
        all_anomalies.extend(anomalies);
        profiles.insert(speaker, profile);
    }

    (all_anomalies, profiles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon::LexiconSet;

    #[test]
    fn gaslighting_fires_on_single_statement() {
        let s = Statement::new(
            "S1",
            "M",
            "You're imagining things. That never happened. You're confused.",
            "D1",
            1,
        );
        let statements = vec![&s];
        let lexicons = LexiconSet::default().compile().unwrap();
        let (anomalies, _) = analyze_speaker("m", &statements, &lexicons);
        assert!(anomalies.iter().any(|a| a.pattern == PatternTag::Gaslighting && a.severity == 8));
    }

    #[test]
    fn sudden_denial_pattern_s2() {
        let s1 = Statement::new("S1", "Jane", "I definitely signed the deal", "D1", 1)
            .with_timestamp(0)
            .with_certainty(0.9);
        let s2 = Statement::new("S2", "Jane", "I never agreed to anything", "D1", 2)
            .with_timestamp(1_000)
            .with_certainty(0.3);
        let statements = vec![&s1, &s2];
        let lexicons = LexiconSet::default().compile().unwrap();
        let (anomalies, _) = analyze_speaker("jane", &statements, &lexicons);
        assert!(anomalies.iter().any(|a| a.pattern == PatternTag::SuddenDenial && a.severity == 8));
    }

    #[test]
    fn sentiment_shift_severity_bands() {
        let s1 = Statement::new("S1", "A", "things are great", "D1", 1).with_sentiment(0.9);
        let s2 = Statement::new("S2", "A", "things are terrible", "D1", 2).with_sentiment(-0.9);
        let statements = vec![&s1, &s2];
        let lexicons = LexiconSet::default().compile().unwrap();
        let (anomalies, _) = analyze_speaker("a", &statements, &lexicons);
        let found = anomalies.iter().find(|a| a.pattern == PatternTag::SentimentShift).unwrap();
        assert_eq!(found.severity, 9);
    }

    #[test]
    fn analyze_all_still_detects_gaslighting_for_a_lone_statement() {
        let mut idx = StatementIndex::new();
        idx.add(vec![Statement::new(
            "S1",
            "M",
            "You're imagining things. That never happened.",
            "D1",
            1,
        )])
        .unwrap();
        idx.freeze();
        let lexicons = LexiconSet::default().compile().unwrap();
        let (anomalies, profiles) = analyze_all(&idx, &lexicons);
        assert!(anomalies.iter().any(|a| a.pattern == PatternTag::Gaslighting));
        assert!(profiles.contains_key("m"));
    }
}
