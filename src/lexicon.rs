//! LEXICONS & TEXT UTILITIES (C1)
//!
//! Curated English keyword sets, word-boundary matching, and the primitive
//! text operations (tokenization, extraction) every other component builds
//! on. All keyword matching uses word-boundary matching against lowercased
//! text — substring matching is forbidden here, which is what keeps
//! `"not"` from firing inside `"another"`.
//!
//! Core Question: does this text contain one of our fixed keyword forms?

use std::collections::{BTreeMap, BTreeSet};

use once_cell::sync::Lazy;
use regex::{Regex, RegexSet};

use crate::error::{EngineError, EngineResult};

/// One of the fixed lexicon tags enumerated in spec §4.1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LexiconTag {
    Deflection,
    Certainty,
    Uncertainty,
    Defensive,
    Cooperative,
    OverExplaining,
    BlameShifting,
    Gaslighting,
    PressureTactics,
    FinancialManipulation,
    EmotionalManipulation,
    PassiveAdmission,
    Minimization,
    Threatening,
}

impl LexiconTag {
    pub const ALL: [LexiconTag; 14] = [
        LexiconTag::Deflection,
        LexiconTag::Certainty,
        LexiconTag::Uncertainty,
        LexiconTag::Defensive,
        LexiconTag::Cooperative,
        LexiconTag::OverExplaining,
        LexiconTag::BlameShifting,
        LexiconTag::Gaslighting,
        LexiconTag::PressureTactics,
        LexiconTag::FinancialManipulation,
        LexiconTag::EmotionalManipulation,
        LexiconTag::PassiveAdmission,
        LexiconTag::Minimization,
        LexiconTag::Threatening,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LexiconTag::Deflection => "deflection",
            LexiconTag::Certainty => "certainty",
            LexiconTag::Uncertainty => "uncertainty",
            LexiconTag::Defensive => "defensive",
            LexiconTag::Cooperative => "cooperative",
            LexiconTag::OverExplaining => "over_explaining",
            LexiconTag::BlameShifting => "blame_shifting",
            LexiconTag::Gaslighting => "gaslighting",
            LexiconTag::PressureTactics => "pressure_tactics",
            LexiconTag::FinancialManipulation => "financial_manipulation",
            LexiconTag::EmotionalManipulation => "emotional_manipulation",
            LexiconTag::PassiveAdmission => "passive_admission",
            LexiconTag::Minimization => "minimization",
            LexiconTag::Threatening => "threatening",
        }
    }

    fn default_phrases(&self) -> &'static [&'static str] {
        match self {
            LexiconTag::Deflection => &[
                "not my problem", "not my fault", "ask someone else", "talk to", "not my job",
                "above my pay grade", "not my department", "not my responsibility",
            ],
            LexiconTag::Certainty => &[
                "definitely", "absolutely", "certainly", "without a doubt", "100 percent",
                "i am sure", "i am certain", "for a fact", "no question",
            ],
            LexiconTag::Uncertainty => &[
                "maybe", "perhaps", "i think", "not sure", "possibly", "i guess",
                "could be", "might have", "i believe",
            ],
            LexiconTag::Defensive => &[
                "i did nothing wrong", "you are wrong", "that is not true", "i refuse",
                "i will not", "how dare you", "i object", "that is unfair",
            ],
            LexiconTag::Cooperative => &[
                "happy to help", "of course", "no problem", "i understand", "let me explain",
                "i will send", "here is", "as requested", "glad to assist",
            ],
            LexiconTag::OverExplaining => &[
                "let me explain in detail", "to clarify", "what i meant was", "in other words",
                "to be clear", "just to explain", "let me be more specific", "to elaborate",
            ],
            LexiconTag::BlameShifting => &[
                "it is your fault", "you made me", "because of you", "you are to blame",
                "if you had not", "that is on you", "you caused this",
            ],
            LexiconTag::Gaslighting => &[
                "you are imagining", "that never happened", "you are confused",
                "you are overreacting", "you are being dramatic", "that is not what happened",
                "you are making this up", "i never said that",
            ],
            LexiconTag::PressureTactics => &[
                "you need to decide now", "time is running out", "last chance", "act now",
                "or else", "you have no choice", "final warning",
            ],
            LexiconTag::FinancialManipulation => &[
                "wire the funds", "send payment immediately", "keep this between us",
                "off the books", "cash only", "do not tell", "under the table",
            ],
            LexiconTag::EmotionalManipulation => &[
                "if you loved me", "after all i have done", "you owe me", "i am disappointed in you",
                "you are hurting me", "nobody else will", "think about how i feel",
            ],
            LexiconTag::PassiveAdmission => &[
                "mistakes were made", "i may have", "it is possible that i", "i might have",
                "in hindsight", "looking back i", "i suppose i could have",
            ],
            LexiconTag::Minimization => &[
                "it was not a big deal", "just a misunderstanding", "no harm done",
                "it was nothing", "barely happened", "blown out of proportion",
            ],
            LexiconTag::Threatening => &[
                "you will regret", "i will make sure", "watch yourself", "there will be consequences",
                "you will pay for this", "i am warning you",
            ],
        }
    }
}

/// The fixed negation-pair table (spec §4.1): a negated token mapped to its positive form.
pub static NEGATION_PAIRS: Lazy<Vec<(&'static str, &'static str)>> = Lazy::new(|| {
    vec![
        ("never", "always"),
        ("did not", "did"),
        ("didn't", "did"),
        ("was not", "was"),
        ("wasn't", "was"),
        ("is not", "is"),
        ("isn't", "is"),
        ("false", "true"),
        ("deny", "admit"),
        ("denied", "admitted"),
        ("not true", "true"),
        ("no", "yes"),
        ("refused", "agreed"),
        ("never agreed", "agreed"),
        ("did not pay", "paid"),
        ("not received", "received"),
    ]
});

/// A fixed English stop-list used by the significant-words extractor.
static STOPWORDS: Lazy<BTreeSet<&'static str>> = Lazy::new(|| {
    [
        "the", "and", "for", "that", "this", "with", "from", "have", "has", "had", "was", "were",
        "are", "is", "be", "been", "being", "not", "but", "you", "your", "they", "them", "their",
        "what", "which", "who", "whom", "when", "where", "why", "how", "all", "any", "both",
        "each", "few", "more", "most", "other", "some", "such", "only", "own", "same", "than",
        "too", "very", "can", "will", "just", "should", "now", "about", "into", "over", "after",
        "before", "above", "below", "out", "off", "again", "further", "then", "once", "here",
        "there", "our", "its", "his", "her", "him", "she", "did", "does", "doing", "yes",
    ]
    .into_iter()
    .collect()
});

/// A caller-configurable, wholesale-replaceable collection of lexicons.
///
/// `EngineConfig::with_lexicons` is the only way to change these — there is
/// no incremental/merge path, matching the "overridden wholesale" rule in
/// spec §6.
#[derive(Debug, Clone)]
pub struct LexiconSet {
    phrases: BTreeMap<LexiconTag, Vec<String>>,
    negation_pairs: Vec<(String, String)>,
}

impl Default for LexiconSet {
    fn default() -> Self {
        let phrases = LexiconTag::ALL
            .iter()
            .map(|tag| {
                (
                    *tag,
                    tag.default_phrases().iter().map(|s| s.to_string()).collect(),
                )
            })
            .collect();
        let negation_pairs = NEGATION_PAIRS
            .iter()
            .map(|(a, b)| (a.to_string(), b.to_string()))
            .collect();
        Self {
            phrases,
            negation_pairs,
        }
    }
}

impl LexiconSet {
    /// Construct an empty lexicon set, then fill it with [`LexiconSet::set`].
    pub fn empty() -> Self {
        Self {
            phrases: BTreeMap::new(),
            negation_pairs: Vec::new(),
        }
    }

    pub fn set(&mut self, tag: LexiconTag, phrases: Vec<String>) {
        self.phrases.insert(tag, phrases);
    }

    pub fn set_negation_pairs(&mut self, pairs: Vec<(String, String)>) {
        self.negation_pairs = pairs;
    }

    pub fn phrases(&self, tag: LexiconTag) -> &[String] {
        self.phrases.get(&tag).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn negation_pairs(&self) -> &[(String, String)] {
        &self.negation_pairs
    }

    /// Compile this set into word-boundary regex matchers. Returns
    /// `InvalidLexicon` if a caller-supplied phrase cannot be turned into a
    /// valid pattern (should not happen for well-formed input since phrases
    /// are regex-escaped before compilation).
    pub fn compile(&self) -> EngineResult<CompiledLexicons> {
        let mut matchers = BTreeMap::new();
        for tag in LexiconTag::ALL {
            let phrases = self.phrases(tag).to_vec();
            matchers.insert(tag, CompiledLexicon::compile(tag, phrases)?);
        }
        Ok(CompiledLexicons { matchers })
    }
}

/// A single lexicon tag compiled into a `RegexSet` of word-boundary patterns.
#[derive(Debug, Clone)]
pub struct CompiledLexicon {
    tag: LexiconTag,
    phrases: Vec<String>,
    set: Option<RegexSet>,
}

impl CompiledLexicon {
    fn compile(tag: LexiconTag, phrases: Vec<String>) -> EngineResult<Self> {
        if phrases.is_empty() {
            return Ok(Self {
                tag,
                phrases,
                set: None,
            });
        }
        let patterns: Vec<String> = phrases
            .iter()
            .map(|p| format!(r"(?i)\b{}\b", regex::escape(p)))
            .collect();
        let set = RegexSet::new(&patterns)
            .map_err(|e| EngineError::InvalidLexicon(format!("{}: {}", tag.as_str(), e)))?;
        Ok(Self {
            tag,
            phrases,
            set: Some(set),
        })
    }

    pub fn tag(&self) -> LexiconTag {
        self.tag
    }

    /// All phrases from this lexicon that match `text` under word-boundary
    /// rules, in lexicon order.
    pub fn matched_phrases(&self, text: &str) -> Vec<&str> {
        match &self.set {
            Some(set) => set
                .matches(text)
                .into_iter()
                .map(|i| self.phrases[i].as_str())
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn count(&self, text: &str) -> usize {
        match &self.set {
            Some(set) => set.matches(text).iter().count(),
            None => 0,
        }
    }

    pub fn any_match(&self, text: &str) -> bool {
        match &self.set {
            Some(set) => set.is_match(text),
            None => false,
        }
    }
}

/// All fourteen lexicons compiled and ready for matching.
#[derive(Debug, Clone)]
pub struct CompiledLexicons {
    matchers: BTreeMap<LexiconTag, CompiledLexicon>,
}

impl CompiledLexicons {
    pub fn get(&self, tag: LexiconTag) -> &CompiledLexicon {
        self.matchers.get(&tag).expect("all tags compiled")
    }

    pub fn count(&self, tag: LexiconTag, text: &str) -> usize {
        self.get(tag).count(text)
    }

    pub fn any_match(&self, tag: LexiconTag, text: &str) -> bool {
        self.get(tag).any_match(text)
    }
}

/// Returns true iff `positive`/`negative` negation pair is satisfied
/// between the two texts: one text contains the negative form and the
/// other the positive form (word-boundary, case-insensitive).
///
/// Falls back to [`bare_negator_conflict`] when no fixed pair matches —
/// the table can't enumerate every verb a negator might attach to
/// ("I never paid" has no entry for "paid", only for "did not pay").
pub fn negation_conflict(pairs: &[(String, String)], text_a: &str, text_b: &str) -> bool {
    let lower_a = text_a.to_lowercase();
    let lower_b = text_b.to_lowercase();
    let pair_match = pairs.iter().any(|(neg, pos)| {
        (word_boundary_contains(&lower_a, neg) && word_boundary_contains(&lower_b, pos))
            || (word_boundary_contains(&lower_b, neg) && word_boundary_contains(&lower_a, pos))
    });
    pair_match || bare_negator_conflict(&lower_a, &lower_b)
}

/// A bare negation marker, unattached to any specific verb in
/// [`NEGATION_PAIRS`].
const BARE_NEGATORS: &[&str] = &["never", "not", "no", "didn't", "don't", "doesn't", "won't", "deny", "denied"];

/// True when exactly one of the two (already-lowercased) texts carries a
/// bare negator and the two texts share a significant word — e.g. "I paid
/// the full amount" vs "I never paid" share "paid", with the negator only
/// on the second side. Symmetric negators (both or neither side negated)
/// don't count as a conflict: "Yes Tuesday works" vs itself has neither.
fn bare_negator_conflict(lower_a: &str, lower_b: &str) -> bool {
    let a_negated = BARE_NEGATORS.iter().any(|n| word_boundary_contains(lower_a, n));
    let b_negated = BARE_NEGATORS.iter().any(|n| word_boundary_contains(lower_b, n));
    if a_negated == b_negated {
        return false;
    }
    let (negated, affirmed) = if a_negated { (lower_a, lower_b) } else { (lower_b, lower_a) };
    !significant_words(negated).is_disjoint(&significant_words(affirmed))
}

/// Word-boundary substring test: `needle` must occur in `haystack`
/// surrounded by non-alphanumeric characters or string boundaries. Both
/// strings are assumed already lowercased.
pub fn word_boundary_contains(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    let hb = haystack.as_bytes();
    let nb = needle.as_bytes();
    let mut start = 0;
    while let Some(pos) = find_from(hb, nb, start) {
        let before_ok = pos == 0 || !is_alphanumeric_byte(hb[pos - 1]);
        let end = pos + nb.len();
        let after_ok = end == hb.len() || !is_alphanumeric_byte(hb[end]);
        if before_ok && after_ok {
            return true;
        }
        start = pos + 1;
    }
    false
}

fn find_from(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if from >= haystack.len() || needle.is_empty() || needle.len() > haystack.len() - from {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|p| p + from)
}

fn is_alphanumeric_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric()
}

/// Lowercase `text`, replacing every character outside `[a-z0-9]` with a
/// space, then split on whitespace keeping only tokens longer than 2
/// characters. Used by both the embedding generator (C3) and the
/// significant-words extractor below.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let mut normalized = String::with_capacity(lowered.len());
    for c in lowered.chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            normalized.push(c);
        } else {
            normalized.push(' ');
        }
    }
    normalized
        .split_whitespace()
        .filter(|t| t.len() > 2)
        .map(|t| t.to_string())
        .collect()
}

/// Significant words: tokenize, then drop the fixed stop-list.
pub fn significant_words(text: &str) -> BTreeSet<String> {
    tokenize(text)
        .into_iter()
        .filter(|t| !STOPWORDS.contains(t.as_str()))
        .collect()
}

static MONEY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(?:[$€£¥]|\bR\b)\s?\d[\d,]*(?:\.\d+)?|\d[\d,]*(?:\.\d+)?\s?(?:dollars?|euros?|pounds?|rand)",
    )
    .expect("static money pattern compiles")
});

static DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b\d{1,2}/\d{1,2}/\d{4}\b|\b\d{4}-\d{2}-\d{2}\b|\b\d{1,2}\s+(?:january|february|march|april|may|june|july|august|september|october|november|december)\s+\d{4}\b",
    )
    .expect("static date pattern compiles")
});

static NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[A-Z][a-z]+(?:\s[A-Z][a-z]+)+\b").expect("static name pattern compiles")
});

/// Extract currency amounts from `text`. Returns a sorted, deduplicated set
/// of the exact matched forms. Never raises — an absence of matches yields
/// an empty set.
pub fn extract_money(text: &str) -> BTreeSet<String> {
    MONEY_RE.find_iter(text).map(|m| m.as_str().to_string()).collect()
}

/// Extract date-like substrings (`DD/MM/YYYY`, `YYYY-MM-DD`, `D Month YYYY`).
pub fn extract_dates(text: &str) -> BTreeSet<String> {
    DATE_RE.find_iter(text).map(|m| m.as_str().to_string()).collect()
}

/// Extract capitalized bigram/trigram name candidates.
pub fn extract_names(text: &str) -> BTreeSet<String> {
    NAME_RE.find_iter(text).map(|m| m.as_str().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_boundary_rejects_substring_match() {
        assert!(!word_boundary_contains("another day", "not"));
        assert!(word_boundary_contains("i did not pay", "not"));
    }

    #[test]
    fn tokenize_drops_short_and_punctuation() {
        let tokens = tokenize("I paid $10,000 on 5/5!");
        assert!(tokens.contains(&"paid".to_string()));
        assert!(tokens.contains(&"000".to_string()) || tokens.contains(&"10".to_string()));
        assert!(!tokens.iter().any(|t| t.len() <= 2));
    }

    #[test]
    fn significant_words_drops_stopwords() {
        let words = significant_words("The payment was never received from them");
        assert!(words.contains("payment"));
        assert!(words.contains("received"));
        assert!(!words.contains("the"));
        assert!(!words.contains("was"));
    }

    #[test]
    fn extract_money_matches_currency_forms() {
        let found = extract_money("The invoice was $10,000 and later 500 dollars more.");
        assert!(found.iter().any(|s| s.contains("10,000")));
        assert!(found.iter().any(|s| s.to_lowercase().contains("dollars")));
    }

    #[test]
    fn extract_dates_matches_all_three_forms() {
        assert_eq!(extract_dates("seen on 12/01/2024").len(), 1);
        assert_eq!(extract_dates("dated 2024-01-12").len(), 1);
        assert_eq!(extract_dates("occurred 5 January 2024").len(), 1);
        assert!(extract_dates("no date here").is_empty());
    }

    #[test]
    fn extract_names_matches_capitalized_bigrams() {
        let names = extract_names("John Smith met with Jane Doe yesterday.");
        assert!(names.contains("John Smith"));
        assert!(names.contains("Jane Doe"));
    }

    #[test]
    fn negation_conflict_detects_direct_negation() {
        let pairs: Vec<(String, String)> = NEGATION_PAIRS
            .iter()
            .map(|(a, b)| (a.to_string(), b.to_string()))
            .collect();
        assert!(negation_conflict(&pairs, "I paid the full amount", "I never paid"));
        assert!(!negation_conflict(&pairs, "Yes Tuesday works", "Yes Tuesday works"));
    }

    #[test]
    fn lexicon_set_compiles_and_matches_gaslighting() {
        let compiled = LexiconSet::default().compile().unwrap();
        let text = "you're imagining things. that never happened. you're confused.";
        assert!(compiled.any_match(LexiconTag::Gaslighting, text));
    }

    #[test]
    fn empty_lexicon_set_never_matches() {
        let compiled = LexiconSet::empty().compile().unwrap();
        assert!(!compiled.any_match(LexiconTag::Gaslighting, "you're imagining things"));
    }
}
