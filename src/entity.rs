//! ENTITY PROFILER (C4)
//!
//! Groups statements by normalized speaker into `Entity` records, merges
//! entities that evidently refer to the same participant (shared email,
//! phone, or one primary name containing the other), and derives a
//! per-entity profile: themes present, representative key phrases, average
//! certainty, and a coarse communication style.
//!
//! Core Question: who said what, and how do they tend to say it?

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::index::StatementIndex;
use crate::lexicon::{significant_words, CompiledLexicons, LexiconTag};
use crate::liability::LiabilityScore;

/// A topical tag an entity's statements touch on (spec §4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    Financial,
    Agreement,
    Communication,
    Timing,
    Location,
    Dispute,
    Evidence,
}

impl Theme {
    pub const ALL: [Theme; 7] = [
        Theme::Financial,
        Theme::Agreement,
        Theme::Communication,
        Theme::Timing,
        Theme::Location,
        Theme::Dispute,
        Theme::Evidence,
    ];

    fn keywords(&self) -> &'static [&'static str] {
        match self {
            Theme::Financial => &["payment", "invoice", "money", "paid", "owe", "debt", "fund", "account"],
            Theme::Agreement => &["agreed", "contract", "deal", "promise", "consented", "signed"],
            Theme::Communication => &["called", "emailed", "texted", "told", "wrote", "said", "message"],
            Theme::Timing => &["schedule", "deadline", "late", "delayed", "on time", "date"],
            Theme::Location => &["office", "home", "site", "address", "location", "building"],
            Theme::Dispute => &["disagree", "dispute", "conflict", "argument", "complaint", "objection"],
            Theme::Evidence => &["document", "record", "proof", "witness", "photo", "recording"],
        }
    }

    fn present_in(&self, lowered_text: &str) -> bool {
        self.keywords()
            .iter()
            .any(|kw| crate::lexicon::word_boundary_contains(lowered_text, kw))
    }
}

/// A coarse communication style derived from lexicon-hit thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommunicationStyle {
    Neutral,
    Cooperative,
    Defensive,
    Aggressive,
    Evasive,
}

/// A participant referenced across statements (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: String,
    pub primary_name: String,
    pub aliases: BTreeSet<String>,
    pub emails: BTreeSet<String>,
    pub phones: BTreeSet<String>,
    pub mention_count: u32,
    pub statement_ids: Vec<String>,
    pub profile: Option<EntityProfile>,
    pub liability_score: Option<LiabilityScore>,
}

/// The themes/style/phrase view over one entity's statements (spec §4.4).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityProfile {
    pub themes: BTreeSet<Theme>,
    pub key_phrases: Vec<String>,
    pub average_certainty: f64,
    pub communication_style: CommunicationStyle,
}

/// Caller-supplied identity hints for one normalized speaker key. Ingestion
/// (email/phone extraction from raw evidence) is out of this engine's
/// scope (spec §1); callers that already know an entity's contact details
/// pass them here so merge-on-overlap has something to merge on.
#[derive(Debug, Clone, Default)]
pub struct EntityHints {
    pub aliases: Vec<String>,
    pub emails: Vec<String>,
    pub phones: Vec<String>,
}

struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, x: usize) -> usize {
        if self.parent[x] != x {
            let root = self.find(self.parent[x]);
            self.parent[x] = root;
        }
        self.parent[x]
    }

    fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra != rb {
            // Always point the larger root at the smaller one so the
            // resulting grouping is independent of call order.
            let (lo, hi) = if ra < rb { (ra, rb) } else { (rb, ra) };
            self.parent[hi] = lo;
        }
    }
}

/// Build merged, profiled entities over everything in `index`. Entities
/// with fewer than `min_mentions` total mentions are dropped.
pub fn build_entities(
    index: &StatementIndex,
    hints: &BTreeMap<String, EntityHints>,
    lexicons: &CompiledLexicons,
    min_mentions: u32,
) -> Vec<Entity> {
    let speakers = index.speakers();
    if speakers.is_empty() {
        return Vec::new();
    }

    let empty_hints = EntityHints::default();
    let hints_for = |key: &str| -> &EntityHints { hints.get(key).unwrap_or(&empty_hints) };

    let mut dsu = DisjointSet::new(speakers.len());
    for i in 0..speakers.len() {
        for j in (i + 1)..speakers.len() {
            if candidates_merge(&speakers[i], hints_for(&speakers[i]), &speakers[j], hints_for(&speakers[j])) {
                dsu.union(i, j);
            }
        }
    }

    let mut groups: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for i in 0..speakers.len() {
        let root = dsu.find(i);
        groups.entry(root).or_default().push(i);
    }
    for members in groups.values() {
        if members.len() > 1 {
            let merged: Vec<&str> = members.iter().map(|&i| speakers[i].as_str()).collect();
            log::debug!("merged speakers into one entity: {}", merged.join(", "));
        }
    }

    let mut entities: Vec<Entity> = groups
        .into_values()
        .map(|members| build_merged_entity(&members, &speakers, index, &hints_for, lexicons))
        .filter(|e| {
            let keep = e.mention_count >= min_mentions;
            if !keep {
                log::debug!(
                    "dropped entity '{}' below min_entity_mentions ({} < {})",
                    e.primary_name,
                    e.mention_count,
                    min_mentions
                );
            }
            keep
        })
        .collect();

    entities.sort_by(|a, b| a.primary_name.to_lowercase().cmp(&b.primary_name.to_lowercase()));
    for (idx, entity) in entities.iter_mut().enumerate() {
        entity.id = format!("entity-{:04}", idx);
    }
    entities
}

fn candidates_merge(
    speaker_a: &str,
    hints_a: &EntityHints,
    speaker_b: &str,
    hints_b: &EntityHints,
) -> bool {
    let emails_a: BTreeSet<String> = hints_a.emails.iter().map(|e| e.to_lowercase()).collect();
    let emails_b: BTreeSet<String> = hints_b.emails.iter().map(|e| e.to_lowercase()).collect();
    if !emails_a.is_disjoint(&emails_b) && !emails_a.is_empty() {
        return true;
    }

    let phones_a: BTreeSet<&String> = hints_a.phones.iter().collect();
    let phones_b: BTreeSet<&String> = hints_b.phones.iter().collect();
    if !phones_a.is_disjoint(&phones_b) && !phones_a.is_empty() {
        return true;
    }

    let a = speaker_a.to_lowercase();
    let b = speaker_b.to_lowercase();
    if a != b && (a.contains(&b) || b.contains(&a)) {
        return true;
    }

    false
}

fn build_merged_entity(
    members: &[usize],
    speakers: &[String],
    index: &StatementIndex,
    hints_for: &impl Fn(&str) -> &EntityHints,
    lexicons: &CompiledLexicons,
) -> Entity {
    let mut aliases = BTreeSet::new();
    let mut emails = BTreeSet::new();
    let mut phones = BTreeSet::new();
    let mut statement_ids = Vec::new();
    let mut all_text = String::new();

    for &member in members {
        let key = &speakers[member];
        aliases.insert(key.clone());
        let hints = hints_for(key);
        for alias in &hints.aliases {
            aliases.insert(alias.clone());
        }
        for email in &hints.emails {
            emails.insert(email.to_lowercase());
        }
        for phone in &hints.phones {
            phones.insert(phone.clone());
        }
        for statement in index.by_speaker(key) {
            statement_ids.push(statement.id.clone());
            all_text.push_str(&statement.text);
            all_text.push('\n');
        }
    }
    statement_ids.sort();
    statement_ids.dedup();

    let mention_count = statement_ids.len() as u32;

    let primary_name = members
        .iter()
        .map(|&m| &speakers[m])
        .max_by_key(|key| index.by_speaker(key).len())
        .cloned()
        .unwrap_or_default();

    let profile = compute_profile(&all_text, lexicons);

    Entity {
        id: String::new(),
        primary_name,
        aliases,
        emails,
        phones,
        mention_count,
        statement_ids,
        profile: Some(profile),
        liability_score: None,
    }
}

fn compute_profile(all_text: &str, lexicons: &CompiledLexicons) -> EntityProfile {
    let lowered = all_text.to_lowercase();

    let themes: BTreeSet<Theme> = Theme::ALL
        .iter()
        .copied()
        .filter(|theme| theme.present_in(&lowered))
        .collect();

    let key_phrases = extract_key_phrases(all_text);

    let average_certainty = certainty_ratio(&lowered, lexicons);

    let defensive = lexicons.count(LexiconTag::Defensive, &lowered);
    let evasive = lexicons.count(LexiconTag::Deflection, &lowered);
    let aggressive = lexicons.count(LexiconTag::Threatening, &lowered)
        + lexicons.count(LexiconTag::PressureTactics, &lowered);
    let cooperative = lexicons.count(LexiconTag::Cooperative, &lowered);

    let communication_style = classify_style(defensive, evasive, aggressive, cooperative);

    EntityProfile {
        themes,
        key_phrases,
        average_certainty,
        communication_style,
    }
}

fn classify_style(defensive: usize, evasive: usize, aggressive: usize, cooperative: usize) -> CommunicationStyle {
    let highest = defensive.max(evasive).max(aggressive).max(cooperative);
    if defensive >= 3 && defensive == highest {
        CommunicationStyle::Defensive
    } else if evasive >= 3 {
        CommunicationStyle::Evasive
    } else if aggressive >= 2 {
        CommunicationStyle::Aggressive
    } else if cooperative >= 2 {
        CommunicationStyle::Cooperative
    } else {
        CommunicationStyle::Neutral
    }
}

/// Ratio of certainty-lexicon hits to uncertainty+certainty hits across
/// all of a speaker's text, used as a 0..1 average-certainty estimate.
fn certainty_ratio(lowered_text: &str, lexicons: &CompiledLexicons) -> f64 {
    let certain = lexicons.count(LexiconTag::Certainty, lowered_text) as f64;
    let uncertain = lexicons.count(LexiconTag::Uncertainty, lowered_text) as f64;
    let total = certain + uncertain;
    if total == 0.0 {
        0.5
    } else {
        certain / total
    }
}

/// Quoted fragments and numeric+unit matches, deduplicated, first 10.
fn extract_key_phrases(text: &str) -> Vec<String> {
    let mut phrases = Vec::new();
    let mut seen = BTreeSet::new();

    for quoted in extract_quoted(text) {
        if seen.insert(quoted.clone()) {
            phrases.push(quoted);
        }
        if phrases.len() >= 10 {
            return phrases;
        }
    }

    for amount in crate::lexicon::extract_money(text) {
        if seen.insert(amount.clone()) {
            phrases.push(amount);
        }
        if phrases.len() >= 10 {
            return phrases;
        }
    }

    phrases
}

fn extract_quoted(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut chars = text.char_indices().peekable();
    while let Some((start, c)) = chars.next() {
        if c == '"' {
            let mut end = None;
            for (i, c2) in chars.by_ref() {
                if c2 == '"' {
                    end = Some(i);
                    break;
                }
            }
            if let Some(end) = end {
                let fragment = &text[start + 1..end];
                if !fragment.trim().is_empty() {
                    out.push(fragment.trim().to_string());
                }
            }
        }
    }
    out
}

/// Exposed for callers that want the raw significant-word overlap used by
/// the cross-modal entity-contradiction checks in C6.
pub fn topic_tokens(text: &str) -> BTreeSet<String> {
    significant_words(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::Statement;
    use crate::lexicon::LexiconSet;

    fn index_with(statements: Vec<Statement>) -> StatementIndex {
        let mut idx = StatementIndex::new();
        idx.add(statements).unwrap();
        idx.freeze();
        idx
    }

    #[test]
    fn merges_entities_sharing_email() {
        let idx = index_with(vec![
            Statement::new("S1", "J. Smith", "hello", "D1", 1),
            Statement::new("S2", "John Smith", "hi there", "D1", 2),
        ]);
        let mut hints = BTreeMap::new();
        hints.insert(
            "j. smith".to_string(),
            EntityHints {
                aliases: vec![],
                emails: vec!["j@example.com".to_string()],
                phones: vec![],
            },
        );
        hints.insert(
            "john smith".to_string(),
            EntityHints {
                aliases: vec![],
                emails: vec!["J@Example.com".to_string()],
                phones: vec![],
            },
        );
        let lexicons = LexiconSet::default().compile().unwrap();
        let entities = build_entities(&idx, &hints, &lexicons, 1);
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].mention_count, 2);
    }

    #[test]
    fn drops_entities_below_min_mentions() {
        let idx = index_with(vec![Statement::new("S1", "Solo", "hello", "D1", 1)]);
        let lexicons = LexiconSet::default().compile().unwrap();
        let entities = build_entities(&idx, &BTreeMap::new(), &lexicons, 2);
        assert!(entities.is_empty());
    }

    #[test]
    fn classifies_defensive_style() {
        let text = "i did nothing wrong. you are wrong. i refuse. i object.";
        let lexicons = LexiconSet::default().compile().unwrap();
        let profile = compute_profile(text, &lexicons);
        assert_eq!(profile.communication_style, CommunicationStyle::Defensive);
    }
}
