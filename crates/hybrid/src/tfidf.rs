//! TF-IDF vectorization of pipe-delimited genre tags
//!
//! Each document is a genre string such as `Adventure|Children|Fantasy`.
//! Tags are lowercased and treated as whole terms, so `Sci-Fi` stays one
//! term. Weights are raw counts times smoothed IDF, rows L2-normalized.

use crate::features::FeatureMatrix;
use std::collections::{BTreeSet, HashMap, HashSet};

/// Split a genre string into lowercase tag terms
pub fn tokenize_tags(document: &str) -> Vec<String> {
    document
        .split('|')
        .map(|tag| tag.trim().to_lowercase())
        .filter(|tag| !tag.is_empty())
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct TfidfVectorizer {
    /// Term -> column index, assigned in sorted term order
    vocabulary: HashMap<String, usize>,
    /// Column index -> term
    feature_names: Vec<String>,
    /// Column index -> smoothed IDF
    idf: Vec<f32>,
}

impl TfidfVectorizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Learn vocabulary and IDF weights from a corpus
    pub fn fit<S: AsRef<str>>(&mut self, documents: &[S]) -> &mut Self {
        let mut doc_frequencies: HashMap<String, usize> = HashMap::new();

        for doc in documents {
            let unique: HashSet<String> = tokenize_tags(doc.as_ref()).into_iter().collect();
            for term in unique {
                *doc_frequencies.entry(term).or_insert(0) += 1;
            }
        }

        let sorted: BTreeSet<&String> = doc_frequencies.keys().collect();
        self.feature_names = sorted.into_iter().cloned().collect();
        self.vocabulary = self
            .feature_names
            .iter()
            .enumerate()
            .map(|(idx, term)| (term.clone(), idx))
            .collect();

        let n = documents.len() as f32;
        self.idf = self
            .feature_names
            .iter()
            .map(|term| {
                let df = doc_frequencies[term] as f32;
                ((1.0 + n) / (1.0 + df)).ln() + 1.0
            })
            .collect();

        tracing::debug!(
            "Fitted TF-IDF vocabulary of {} terms over {} documents",
            self.feature_names.len(),
            documents.len()
        );

        self
    }

    /// Vectorize documents with the fitted vocabulary; unknown terms are ignored
    pub fn transform<S: AsRef<str>>(&self, documents: &[S]) -> FeatureMatrix {
        let mut matrix = FeatureMatrix::new(self.feature_names.len());

        for doc in documents {
            let mut counts: HashMap<usize, f32> = HashMap::new();
            for term in tokenize_tags(doc.as_ref()) {
                if let Some(&col) = self.vocabulary.get(&term) {
                    *counts.entry(col).or_insert(0.0) += 1.0;
                }
            }

            let mut row: Vec<(usize, f32)> = counts
                .into_iter()
                .map(|(col, tf)| (col, tf * self.idf[col]))
                .collect();
            row.sort_by_key(|&(col, _)| col);

            let norm = row.iter().map(|(_, w)| w * w).sum::<f32>().sqrt();
            if norm > 0.0 {
                for (_, w) in row.iter_mut() {
                    *w /= norm;
                }
            }

            matrix.push_row(row);
        }

        matrix
    }

    pub fn fit_transform<S: AsRef<str>>(&mut self, documents: &[S]) -> FeatureMatrix {
        self.fit(documents);
        self.transform(documents)
    }

    pub fn vocabulary(&self) -> &HashMap<String, usize> {
        &self.vocabulary
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn idf(&self, term: &str) -> Option<f32> {
        self.vocabulary.get(term).map(|&col| self.idf[col])
    }

    /// Terms with a nonzero weight in the given row
    pub fn nonzero_terms(&self, matrix: &FeatureMatrix, row: usize) -> Vec<&str> {
        matrix
            .row(row)
            .unwrap_or(&[])
            .iter()
            .filter_map(|&(col, _)| self.feature_names.get(col).map(String::as_str))
            .collect()
    }
}
