//! BM25 keyword scoring searcher.
//!
//! Okapi BM25 over Unicode-aware tokens. Hangul words are also split into
//! character bigrams, so "국물" matches "국물요리를" without a morphological
//! analyser.

use std::collections::HashMap;
use std::sync::RwLock;

use super::traits::MemorySearcher;

/// BM25 tuning parameters.
const K1: f32 = 1.2;
const B: f32 = 0.75;

/// Normalization ceiling. Scores are divided by
/// `query_terms.len() * MAX_BM25_SCORE_PER_TERM` and clamped to 0.0..1.0.
const MAX_BM25_SCORE_PER_TERM: f32 = 3.0;

/// BM25 keyword scoring searcher.
///
/// Maintains an inverted index of term frequencies for indexed documents.
/// Scoring without a populated index still works, without IDF weighting.
pub struct Bm25Searcher {
    index: RwLock<Bm25Index>,
}

struct Bm25Index {
    /// term -> { key -> count }
    term_docs: HashMap<String, HashMap<String, u32>>,
    /// key -> total token count
    doc_lengths: HashMap<String, u32>,
    doc_count: u32,
}

impl Bm25Index {
    fn new() -> Self {
        Self {
            term_docs: HashMap::new(),
            doc_lengths: HashMap::new(),
            doc_count: 0,
        }
    }

    fn avg_doc_length(&self) -> f32 {
        if self.doc_count == 0 {
            return 1.0;
        }
        let total: u32 = self.doc_lengths.values().sum();
        total as f32 / self.doc_count as f32
    }

    fn drop_doc(&mut self, key: &str) {
        if self.doc_lengths.remove(key).is_some() {
            for docs in self.term_docs.values_mut() {
                docs.remove(key);
            }
            self.term_docs.retain(|_, docs| !docs.is_empty());
            self.doc_count = self.doc_count.saturating_sub(1);
        }
    }
}

impl Default for Bm25Searcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Bm25Searcher {
    pub fn new() -> Self {
        Self {
            index: RwLock::new(Bm25Index::new()),
        }
    }

    /// Tokenize text into lowercase terms.
    ///
    /// ASCII words shorter than two characters are dropped. Non-ASCII words
    /// are kept whole and additionally emitted as character bigrams.
    pub fn tokenize(text: &str) -> Vec<String> {
        let mut tokens = Vec::new();
        for word in text
            .to_lowercase()
            .split(|ch: char| !ch.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            if word.is_ascii() {
                if word.len() >= 2 {
                    tokens.push(word.to_string());
                }
                continue;
            }

            tokens.push(word.to_string());
            let chars: Vec<char> = word.chars().collect();
            if chars.len() > 2 {
                for pair in chars.windows(2) {
                    tokens.push(pair.iter().collect());
                }
            }
        }
        tokens
    }

    /// Number of indexed documents.
    pub fn doc_count(&self) -> u32 {
        self.index
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .doc_count
    }
}

impl MemorySearcher for Bm25Searcher {
    fn name(&self) -> &str {
        "bm25"
    }

    fn score(&self, chunk: &str, query: &str) -> f32 {
        let query_terms = Self::tokenize(query);
        if query_terms.is_empty() {
            return 0.0;
        }

        let chunk_tokens = Self::tokenize(chunk);
        let doc_len = chunk_tokens.len() as f32;
        if doc_len == 0.0 {
            return 0.0;
        }

        let mut tf_map: HashMap<&str, u32> = HashMap::new();
        for token in &chunk_tokens {
            *tf_map.entry(token.as_str()).or_insert(0) += 1;
        }

        let index = self.index.read().unwrap_or_else(|e| e.into_inner());
        let avg_dl = index.avg_doc_length();
        let n = index.doc_count.max(1) as f32;

        let mut score = 0.0f32;
        for term in &query_terms {
            let tf = *tf_map.get(term.as_str()).unwrap_or(&0) as f32;
            if tf == 0.0 {
                continue;
            }

            // IDF: log((N - df + 0.5) / (df + 0.5) + 1)
            let df = index
                .term_docs
                .get(term)
                .map(|docs| docs.len() as f32)
                .unwrap_or(0.0);
            let idf = ((n - df + 0.5) / (df + 0.5) + 1.0).ln();

            let tf_norm = (tf * (K1 + 1.0)) / (tf + K1 * (1.0 - B + B * doc_len / avg_dl));

            score += idf * tf_norm;
        }

        let max_possible = query_terms.len() as f32 * MAX_BM25_SCORE_PER_TERM;
        (score / max_possible).clamp(0.0, 1.0)
    }

    fn index(&self, key: &str, text: &str) {
        let tokens = Self::tokenize(text);
        let mut index = self.index.write().unwrap_or_else(|e| e.into_inner());
        index.drop_doc(key);

        let mut tf_map: HashMap<String, u32> = HashMap::new();
        for token in &tokens {
            *tf_map.entry(token.clone()).or_insert(0) += 1;
        }

        for (term, count) in tf_map {
            index
                .term_docs
                .entry(term)
                .or_default()
                .insert(key.to_string(), count);
        }

        index
            .doc_lengths
            .insert(key.to_string(), tokens.len() as u32);
        index.doc_count += 1;
    }

    fn remove(&self, key: &str) {
        let mut index = self.index.write().unwrap_or_else(|e| e.into_inner());
        index.drop_doc(key);
    }
}
