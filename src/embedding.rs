//! EMBEDDING GENERATOR (C3)
//!
//! A deliberately weak, explainable surrogate for a learned sentence
//! embedding: a TF-IDF vocabulary built once over the whole corpus, and a
//! per-statement unit-normalized vector used only for cosine similarity.
//! Nothing here is a trained model — every number traces back to a token
//! count and a document frequency.
//!
//! Core Question: how similar are two statements, and if they're similar,
//! do they actually agree?

use std::collections::BTreeMap;

use crate::lexicon::{extract_money, significant_words, tokenize};

/// A TF-IDF vocabulary built once over the corpus (spec §4.3).
#[derive(Debug, Clone)]
pub struct Vocabulary {
    tokens: Vec<String>,
    index_of: BTreeMap<String, usize>,
    idf: Vec<f64>,
}

impl Vocabulary {
    /// Build a vocabulary of at most `dimension` tokens, selected by
    /// descending document frequency with lexicographic tie-breaking for
    /// determinism.
    pub fn build(texts: &[&str], dimension: usize) -> Self {
        let n = texts.len().max(1) as f64;
        let mut df: BTreeMap<String, usize> = BTreeMap::new();
        for text in texts {
            let unique: std::collections::BTreeSet<String> = tokenize(text).into_iter().collect();
            for token in unique {
                *df.entry(token).or_insert(0) += 1;
            }
        }

        let mut entries: Vec<(String, usize)> = df.into_iter().collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        entries.truncate(dimension);

        let tokens: Vec<String> = entries.iter().map(|(t, _)| t.clone()).collect();
        let idf: Vec<f64> = entries
            .iter()
            .map(|(_, document_freq)| (n / (1.0 + *document_freq as f64)).ln())
            .collect();
        let index_of = tokens
            .iter()
            .enumerate()
            .map(|(i, t)| (t.clone(), i))
            .collect();

        Self {
            tokens,
            index_of,
            idf,
        }
    }

    pub fn dimension(&self) -> usize {
        self.tokens.len()
    }

    /// Build a unit-norm TF-IDF vector for `text`. Zero vector if no
    /// vocabulary token appears in the text.
    pub fn generate(&self, text: &str) -> Vec<f64> {
        let tokens = tokenize(text);
        let total_tokens = tokens.len().max(1) as f64;

        let mut counts: BTreeMap<usize, usize> = BTreeMap::new();
        for token in &tokens {
            if let Some(&idx) = self.index_of.get(token) {
                *counts.entry(idx).or_insert(0) += 1;
            }
        }

        let mut vector = vec![0.0_f64; self.dimension()];
        for (idx, count) in counts {
            let tf = count as f64 / total_tokens;
            vector[idx] = tf * self.idf[idx];
        }
        unit_normalize(&mut vector);
        vector
    }
}

fn unit_normalize(vector: &mut [f64]) {
    let norm = vector.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm > 0.0 {
        for x in vector.iter_mut() {
            *x /= norm;
        }
    }
}

pub fn norm(vector: &[f64]) -> f64 {
    vector.iter().map(|x| x * x).sum::<f64>().sqrt()
}

/// Numerically safe cosine similarity, clamped to `[-1, 1]`. Returns 0 if
/// either vector has zero norm.
pub fn cosine(a: &[f64], b: &[f64]) -> f64 {
    let na = norm(a);
    let nb = norm(b);
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    let dot: f64 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    (dot / (na * nb)).clamp(-1.0, 1.0)
}

/// A detected semantic contradiction between two statements' embeddings.
#[derive(Debug, Clone, PartialEq)]
pub struct SemanticMatch {
    pub similarity: f64,
    pub contradiction_score: f64,
    pub reason: &'static str,
}

/// Apply the four rules of spec §4.3 in order, keeping the best
/// `contradiction_score` and the reason that produced it. Returns `None`
/// when the statements are unrelated or no rule clears the emit threshold.
///
/// The "conflicting facts" rule (step 3) uses the token-set-overlap
/// deviation recommended in spec §9 (≥2 shared significant, non-numeric
/// tokens) rather than the original's fragile common-context-by-digit-split
/// heuristic — see DESIGN.md.
#[allow(clippy::too_many_arguments)]
pub fn detect_semantic_contradiction(
    embedding_a: &[f64],
    embedding_b: &[f64],
    text_a: &str,
    text_b: &str,
    sentiment_a: Option<f64>,
    sentiment_b: Option<f64>,
    negation_pairs: &[(String, String)],
    similarity_threshold: f64,
    high_similarity_threshold: f64,
) -> Option<SemanticMatch> {
    let similarity = cosine(embedding_a, embedding_b);

    // Rule 1: unrelated statements never contradict.
    if similarity < similarity_threshold {
        return None;
    }

    let mut best_score = 0.0_f64;
    let mut best_reason: Option<&'static str> = None;

    // Rule 2: high similarity with opposite sentiment.
    if similarity > high_similarity_threshold {
        if let (Some(sa), Some(sb)) = (sentiment_a, sentiment_b) {
            let delta = (sa - sb).abs();
            if delta > 1.0 {
                let score = similarity * (delta / 2.0);
                if score > best_score {
                    best_score = score;
                    best_reason = Some("High similarity with opposite sentiment");
                }
            }
        }
    }

    // Rule 3: shared context but conflicting numeric claims.
    if shares_non_numeric_context(text_a, text_b) {
        let nums_a = extract_money(text_a);
        let nums_b = extract_money(text_b);
        if !nums_a.is_empty() && !nums_b.is_empty() && nums_a != nums_b {
            let score = similarity * 0.9;
            if score > best_score {
                best_score = score;
                best_reason = Some("Conflicting factual claims");
            }
        }
    }

    // Rule 4: direct negation.
    if crate::lexicon::negation_conflict(negation_pairs, text_a, text_b) {
        let score = similarity * 0.95;
        if score > best_score {
            best_score = score;
            best_reason = Some("Direct negation detected");
        }
    }

    let reason = best_reason?;
    if best_score > 0.5 {
        Some(SemanticMatch {
            similarity,
            contradiction_score: best_score,
            reason,
        })
    } else {
        None
    }
}

/// Token-set-overlap check: do the two texts share at least two
/// significant, non-numeric tokens?
fn shares_non_numeric_context(text_a: &str, text_b: &str) -> bool {
    let is_numeric = |w: &String| w.chars().all(|c| c.is_ascii_digit());
    let sig_a: std::collections::BTreeSet<String> = significant_words(text_a)
        .into_iter()
        .filter(|w| !is_numeric(w))
        .collect();
    let sig_b: std::collections::BTreeSet<String> = significant_words(text_b)
        .into_iter()
        .filter(|w| !is_numeric(w))
        .collect();
    sig_a.intersection(&sig_b).count() >= 2
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon::LexiconSet;

    fn pairs() -> Vec<(String, String)> {
        LexiconSet::default().negation_pairs().to_vec()
    }

    #[test]
    fn vocabulary_selects_top_d_by_df_with_lexicographic_tiebreak() {
        let texts = vec!["alpha beta", "alpha gamma", "alpha delta"];
        let vocab = Vocabulary::build(&texts, 2);
        assert_eq!(vocab.dimension(), 2);
    }

    #[test]
    fn embedding_is_unit_norm() {
        let texts = vec!["the invoice was paid in full", "the invoice was never paid"];
        let vocab = Vocabulary::build(&texts, 16);
        let v = vocab.generate(texts[0]);
        let n = norm(&v);
        assert!((n - 1.0).abs() < 1e-6 || n == 0.0);
    }

    #[test]
    fn cosine_is_bounded_and_self_similar() {
        let texts = vec!["the invoice was paid in full", "the invoice was never paid"];
        let vocab = Vocabulary::build(&texts, 16);
        let a = vocab.generate(texts[0]);
        let c = cosine(&a, &a);
        assert!(c <= 1.0 + 1e-9 && c >= -1.0 - 1e-9);
        if norm(&a) > 0.0 {
            assert!((c - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn cosine_handles_zero_vectors_safely() {
        let zero = vec![0.0, 0.0, 0.0];
        let other = vec![1.0, 0.0, 0.0];
        assert_eq!(cosine(&zero, &other), 0.0);
    }

    #[test]
    fn direct_negation_detected_for_same_topic() {
        let texts = vec!["I paid the full amount", "I never paid"];
        let vocab = Vocabulary::build(&texts, 64);
        let a = vocab.generate(texts[0]);
        let b = vocab.generate(texts[1]);
        let result =
            detect_semantic_contradiction(&a, &b, texts[0], texts[1], None, None, &pairs(), 0.5, 0.7);
        assert!(result.is_some());
        assert_eq!(result.unwrap().reason, "Direct negation detected");
    }

    #[test]
    fn unrelated_statements_yield_no_match() {
        let texts = vec!["the weather was sunny today", "quarterly revenue grew sharply"];
        let vocab = Vocabulary::build(&texts, 64);
        let a = vocab.generate(texts[0]);
        let b = vocab.generate(texts[1]);
        let result =
            detect_semantic_contradiction(&a, &b, texts[0], texts[1], None, None, &pairs(), 0.5, 0.7);
        assert!(result.is_none());
    }

    #[test]
    fn conflicting_amount_detected_with_shared_context() {
        let texts = vec![
            "The invoice total was $10,000 for the contract work",
            "The invoice total was always $5,000 for the contract work",
        ];
        let vocab = Vocabulary::build(&texts, 64);
        let a = vocab.generate(texts[0]);
        let b = vocab.generate(texts[1]);
        let result =
            detect_semantic_contradiction(&a, &b, texts[0], texts[1], None, None, &pairs(), 0.5, 0.7);
        assert!(result.is_some());
        assert_eq!(result.unwrap().reason, "Conflicting factual claims");
    }

    #[test]
    fn opposite_sentiment_detected_at_high_similarity() {
        let texts = vec![
            "the meeting went very well and everyone agreed",
            "the meeting went very well and everyone agreed again",
        ];
        let vocab = Vocabulary::build(&texts, 64);
        let a = vocab.generate(texts[0]);
        let b = vocab.generate(texts[1]);
        let result = detect_semantic_contradiction(
            &a,
            &b,
            texts[0],
            texts[1],
            Some(0.9),
            Some(-0.9),
            &pairs(),
            0.5,
            0.7,
        );
        assert!(result.is_some());
        assert_eq!(result.unwrap().reason, "High similarity with opposite sentiment");
    }
}
