//! Lexical search and rank fusion.
//!
//! [`Bm25Index`] ranks documents by term-frequency statistics (BM25,
//! k1 = 1.2, b = 0.75). [`RrfFusion`] merges multiple ranked lists with
//! weighted reciprocal-rank fusion; it is the documented, deterministic
//! fusion rule used by the ensemble retriever.

use std::collections::{HashMap, HashSet};

/// BM25 keyword index.
///
/// Built once from the full chunk corpus; not incrementally updated by
/// the QA pipeline after construction.
#[derive(Debug, Clone, Default)]
pub struct Bm25Index {
    /// Document id -> (term -> in-document frequency).
    term_frequencies: HashMap<String, HashMap<String, usize>>,
    /// Document id -> token count.
    doc_lengths: HashMap<String, usize>,
    /// Term -> ids of documents containing it.
    postings: HashMap<String, HashSet<String>>,
    avg_doc_length: f32,
    k1: f32,
    b: f32,
}

impl Bm25Index {
    pub fn new() -> Self {
        Self {
            k1: 1.2,
            b: 0.75,
            ..Default::default()
        }
    }

    /// Lowercase alphanumeric tokens; single-character tokens are dropped.
    fn tokenize(text: &str) -> Vec<String> {
        text.to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|s| s.len() > 1)
            .map(String::from)
            .collect()
    }

    pub fn add_document(&mut self, id: &str, content: &str) {
        let tokens = Self::tokenize(content);

        let mut freqs: HashMap<String, usize> = HashMap::new();
        for token in &tokens {
            *freqs.entry(token.clone()).or_insert(0) += 1;
        }
        for term in freqs.keys() {
            self.postings
                .entry(term.clone())
                .or_default()
                .insert(id.to_string());
        }

        self.doc_lengths.insert(id.to_string(), tokens.len());
        self.term_frequencies.insert(id.to_string(), freqs);

        let total: usize = self.doc_lengths.values().sum();
        self.avg_doc_length = total as f32 / self.doc_lengths.len() as f32;
    }

    fn idf(&self, term: &str) -> f32 {
        let df = self.postings.get(term).map(|d| d.len()).unwrap_or(0) as f32;
        let n = self.doc_lengths.len() as f32;
        if df == 0.0 || n == 0.0 {
            return 0.0;
        }
        ((n - df + 0.5) / (df + 0.5) + 1.0).ln()
    }

    fn score(&self, doc_id: &str, query_terms: &[String]) -> f32 {
        let (Some(freqs), Some(&doc_len)) = (
            self.term_frequencies.get(doc_id),
            self.doc_lengths.get(doc_id),
        ) else {
            return 0.0;
        };

        let doc_len = doc_len as f32;
        let mut score = 0.0;
        for term in query_terms {
            let tf = freqs.get(term).copied().unwrap_or(0) as f32;
            if tf == 0.0 {
                continue;
            }
            let numerator = tf * (self.k1 + 1.0);
            let denominator =
                tf + self.k1 * (1.0 - self.b + self.b * doc_len / self.avg_doc_length);
            score += self.idf(term) * numerator / denominator;
        }
        score
    }

    /// Rank documents for `query`, best first.
    pub fn search(&self, query: &str, top_k: usize) -> Vec<(String, f32)> {
        let query_terms = Self::tokenize(query);
        if query_terms.is_empty() {
            return Vec::new();
        }

        let mut candidates: HashSet<&String> = HashSet::new();
        for term in &query_terms {
            if let Some(docs) = self.postings.get(term) {
                candidates.extend(docs.iter());
            }
        }

        let mut results: Vec<(String, f32)> = candidates
            .into_iter()
            .map(|id| (id.clone(), self.score(id, &query_terms)))
            .filter(|(_, score)| *score > 0.0)
            .collect();

        results.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(top_k);
        results
    }

    pub fn len(&self) -> usize {
        self.doc_lengths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.doc_lengths.is_empty()
    }
}

/// Weighted reciprocal-rank fusion.
///
/// Each document's fused score is `sum(weight_i / (k + rank_i + 1))`
/// over the lists that contain it. Only ranks matter; member scores are
/// deliberately ignored since they are not comparable across retrievers.
#[derive(Debug, Clone)]
pub struct RrfFusion {
    k: f32,
}

impl Default for RrfFusion {
    fn default() -> Self {
        Self { k: 60.0 }
    }
}

impl RrfFusion {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fuse ranked lists, each paired with its weight. Returns the union
    /// of all listed ids ranked by fused score, best first.
    pub fn fuse(&self, ranked_lists: &[(&[(String, f32)], f32)]) -> Vec<(String, f32)> {
        let mut fused: HashMap<String, f32> = HashMap::new();

        for (results, weight) in ranked_lists {
            for (rank, (doc_id, _)) in results.iter().enumerate() {
                *fused.entry(doc_id.clone()).or_insert(0.0) +=
                    weight / (self.k + rank as f32 + 1.0);
            }
        }

        let mut results: Vec<_> = fused.into_iter().collect();
        results.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        results
    }
}
