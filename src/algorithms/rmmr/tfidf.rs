//! Identifier splitting and TF-IDF vectors over class documents.

use std::collections::{BTreeMap, HashMap, HashSet};

/// Sparse term-weight vector
pub type TermVector = BTreeMap<String, f64>;

fn is_separator(ch: char) -> bool {
    matches!(ch, '_' | '-' | '.' | '/' | '$') || ch.is_ascii_digit() || ch.is_whitespace()
}

fn flush_token(tokens: &mut Vec<String>, current: &mut String) {
    if !current.is_empty() {
        tokens.push(current.to_lowercase());
        current.clear();
    }
}

/// Split an identifier on `_`, digits and camelCase boundaries.
///
/// Tokens are lower-cased; tokens shorter than 2 characters are dropped.
pub fn split_identifier(identifier: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();

    for ch in identifier.chars() {
        if is_separator(ch) {
            flush_token(&mut tokens, &mut current);
        } else if ch.is_uppercase() && !current.is_empty() && !current.ends_with(char::is_uppercase) {
            flush_token(&mut tokens, &mut current);
            current.push(ch);
        } else if ch.is_lowercase() && current.chars().count() > 1 && current.chars().all(char::is_uppercase) {
            // HTTPRequest -> http, request
            if let Some(last) = current.pop() {
                flush_token(&mut tokens, &mut current);
                current.push(last);
            }
            current.push(ch);
        } else {
            current.push(ch);
        }
    }

    flush_token(&mut tokens, &mut current);
    tokens.into_iter().filter(|t| t.chars().count() >= 2).collect()
}

/// Terms of a bag of raw identifiers
pub fn terms<'a, I>(identifiers: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a String>,
{
    identifiers
        .into_iter()
        .flat_map(|identifier| split_identifier(identifier))
        .collect()
}

/// Term counts of a document
pub fn term_counts(terms: &[String]) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for term in terms {
        *counts.entry(term.clone()).or_insert(0) += 1;
    }
    counts
}

/// Document frequencies over a fixed document set.
#[derive(Debug, Clone, Default)]
pub struct TfIdfIndex {
    document_frequencies: HashMap<String, usize>,
    total_documents: usize,
}

impl TfIdfIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one document for IDF calculation.
    pub fn add_document<'a, I>(&mut self, terms: I)
    where
        I: IntoIterator<Item = &'a String>,
    {
        self.total_documents += 1;
        let unique: HashSet<&String> = terms.into_iter().collect();
        for term in unique {
            *self.document_frequencies.entry(term.clone()).or_insert(0) += 1;
        }
    }

    /// Number of documents seen
    pub fn total_documents(&self) -> usize {
        self.total_documents
    }

    fn document_frequency(&self, term: &str) -> usize {
        self.document_frequencies.get(term).copied().unwrap_or(0)
    }

    fn idf_from(&self, df: usize) -> f64 {
        let n = self.total_documents as f64;
        ((1.0 + n) / (1.0 + df as f64)).ln() + 1.0
    }

    /// Smoothed IDF: `ln((1 + N) / (1 + df)) + 1`
    pub fn inverse_document_frequency(&self, term: &str) -> f64 {
        self.idf_from(self.document_frequency(term))
    }

    /// Weighted vector for a document given as term counts; sublinear TF.
    pub fn vector(&self, counts: &HashMap<String, usize>) -> TermVector {
        self.vector_excluding(counts, &HashSet::new())
    }

    /// Like [`vector`](Self::vector), but every term in `vanished` counts one
    /// document fewer: a document lost those terms after it was indexed.
    pub fn vector_excluding(&self, counts: &HashMap<String, usize>, vanished: &HashSet<&str>) -> TermVector {
        counts
            .iter()
            .filter(|(_, &count)| count > 0)
            .map(|(term, &count)| {
                let mut df = self.document_frequency(term);
                if vanished.contains(term.as_str()) {
                    df = df.saturating_sub(1);
                }
                let tf = 1.0 + (count as f64).ln();
                (term.clone(), tf * self.idf_from(df))
            })
            .collect()
    }
}

/// Cosine similarity of two sparse vectors; 0 when either is empty.
pub fn cosine_similarity(a: &TermVector, b: &TermVector) -> f64 {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let dot: f64 = small
        .iter()
        .filter_map(|(term, x)| large.get(term).map(|y| x * y))
        .sum();
    let norm_a = a.values().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b = b.values().map(|x| x * x).sum::<f64>().sqrt();

    if norm_a < 1e-10 || norm_b < 1e-10 {
        0.0
    } else {
        (dot / (norm_a * norm_b)).clamp(-1.0, 1.0)
    }
}
