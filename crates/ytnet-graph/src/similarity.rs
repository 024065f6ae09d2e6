//! Video-video similarity from TF-IDF vectors of `title + " " + description`.
//!
//! Vectorization follows a conventional word n-gram TF-IDF setup:
//!
//! - lowercase, tokens matching `\b\w\w+\b` (two or more word characters);
//! - word n-grams of length `1..=ngram_max`;
//! - vocabulary restricted to terms with document frequency `>= min_df`, then
//!   to the `max_features` most frequent terms across the batch;
//! - raw counts times smoothed idf `ln((1 + n) / (1 + df)) + 1`;
//! - L2 normalization.
//!
//! Document frequency is computed over the given batch only.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

use regex::Regex;
use ytnet_core::{SimilarityEdge, Video};

use crate::error::GraphError;

static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\w\w+\b").expect("valid token regex"));

#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityConfig {
    /// Maximum outgoing edges kept per video before symmetrization.
    pub top_k: usize,
    /// Minimum cosine similarity for an edge, in `[0, 1]`.
    pub min_sim: f64,
    pub min_df: usize,
    pub ngram_max: usize,
    pub max_features: usize,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            min_sim: 0.25,
            min_df: 2,
            ngram_max: 2,
            max_features: 20_000,
        }
    }
}

impl SimilarityConfig {
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidParameter`] for a zero `top_k`,
    /// `min_df`, `ngram_max` or `max_features`, or a `min_sim` outside
    /// `[0, 1]`.
    pub fn validate(&self) -> Result<(), GraphError> {
        let positive = [
            ("top_k", self.top_k),
            ("min_df", self.min_df),
            ("ngram_max", self.ngram_max),
            ("max_features", self.max_features),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(GraphError::InvalidParameter {
                    name,
                    reason: "must be greater than 0".to_owned(),
                });
            }
        }
        if !(0.0..=1.0).contains(&self.min_sim) {
            return Err(GraphError::InvalidParameter {
                name: "min_sim",
                reason: format!("{} is outside [0, 1]", self.min_sim),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimilarityResult {
    /// Undirected edges, `video_a < video_b`, sorted by `(video_a, video_b)`.
    pub edges: Vec<SimilarityEdge>,
    /// Videos with no usable text after tokenization and vocabulary pruning,
    /// sorted by ID.
    pub excluded: Vec<String>,
    pub vocabulary_size: usize,
}

/// Sparse L2-normalized vector: `(term index, weight)` sorted by index.
type SparseVec = Vec<(usize, f64)>;

/// Builds the similarity edge set for `videos`.
///
/// # Errors
///
/// Returns [`GraphError::InvalidParameter`] if `config` is invalid.
pub fn build_similarity(
    videos: &[Video],
    config: &SimilarityConfig,
) -> Result<SimilarityResult, GraphError> {
    config.validate()?;

    let mut ordered: Vec<&Video> = videos.iter().collect();
    ordered.sort_by(|a, b| a.id.cmp(&b.id));
    ordered.dedup_by(|a, b| a.id == b.id);

    let counts: Vec<HashMap<String, u32>> = ordered
        .iter()
        .map(|v| term_counts(&v.text(), config.ngram_max))
        .collect();
    let vocabulary = build_vocabulary(&counts, config);
    let idf = inverse_document_frequency(&counts, &vocabulary, ordered.len());

    let mut ids = Vec::new();
    let mut vectors: Vec<SparseVec> = Vec::new();
    let mut excluded = Vec::new();
    for (video, doc) in ordered.iter().zip(&counts) {
        match tfidf_vector(doc, &vocabulary, &idf) {
            Some(vector) => {
                ids.push(video.id.as_str());
                vectors.push(vector);
            }
            None => excluded.push(video.id.clone()),
        }
    }
    if !excluded.is_empty() {
        tracing::info!(
            count = excluded.len(),
            "videos excluded from similarity (no usable text)"
        );
    }

    // candidates[i] holds (j, similarity) for every j != i passing min_sim.
    let mut candidates: Vec<Vec<(usize, f64)>> = vec![Vec::new(); vectors.len()];
    for i in 0..vectors.len() {
        for j in (i + 1)..vectors.len() {
            let sim = cosine(&vectors[i], &vectors[j]);
            if sim > 0.0 && sim >= config.min_sim {
                candidates[i].push((j, sim));
                candidates[j].push((i, sim));
            }
        }
    }

    let mut kept: BTreeMap<(usize, usize), f64> = BTreeMap::new();
    for (i, mut row) in candidates.into_iter().enumerate() {
        // Indices follow ID order, so comparing indices breaks ties by ID.
        row.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        row.truncate(config.top_k);
        for (j, sim) in row {
            kept.insert((i.min(j), i.max(j)), sim);
        }
    }

    let edges = kept
        .into_iter()
        .map(|((a, b), weight)| SimilarityEdge {
            video_a: ids[a].to_owned(),
            video_b: ids[b].to_owned(),
            weight,
        })
        .collect::<Vec<_>>();

    tracing::info!(
        videos = ordered.len(),
        vocabulary = vocabulary.len(),
        edges = edges.len(),
        "similarity graph built"
    );
    Ok(SimilarityResult {
        edges,
        excluded,
        vocabulary_size: vocabulary.len(),
    })
}

fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    TOKEN_RE
        .find_iter(&lowered)
        .map(|m| m.as_str().to_owned())
        .collect()
}

fn term_counts(text: &str, ngram_max: usize) -> HashMap<String, u32> {
    let tokens = tokenize(text);
    let mut counts = HashMap::new();
    for n in 1..=ngram_max {
        for window in tokens.windows(n) {
            *counts.entry(window.join(" ")).or_insert(0) += 1;
        }
    }
    counts
}

/// Maps each kept term to its column index. Columns follow alphabetical term
/// order.
fn build_vocabulary(
    docs: &[HashMap<String, u32>],
    config: &SimilarityConfig,
) -> BTreeMap<String, usize> {
    let mut stats: HashMap<&str, (usize, u64)> = HashMap::new();
    for doc in docs {
        for (term, &count) in doc {
            let entry = stats.entry(term.as_str()).or_insert((0, 0));
            entry.0 += 1;
            entry.1 += u64::from(count);
        }
    }

    let mut terms: Vec<(&str, u64)> = stats
        .into_iter()
        .filter(|(_, (df, _))| *df >= config.min_df)
        .map(|(term, (_, total))| (term, total))
        .collect();
    if terms.len() > config.max_features {
        terms.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        terms.truncate(config.max_features);
    }

    let mut names: Vec<&str> = terms.into_iter().map(|(term, _)| term).collect();
    names.sort_unstable();
    names
        .into_iter()
        .enumerate()
        .map(|(idx, term)| (term.to_owned(), idx))
        .collect()
}

fn inverse_document_frequency(
    docs: &[HashMap<String, u32>],
    vocabulary: &BTreeMap<String, usize>,
    n_docs: usize,
) -> Vec<f64> {
    let mut df = vec![0usize; vocabulary.len()];
    for doc in docs {
        for term in doc.keys() {
            if let Some(&idx) = vocabulary.get(term) {
                df[idx] += 1;
            }
        }
    }
    #[allow(clippy::cast_precision_loss)]
    let n = n_docs as f64;
    df.into_iter()
        .map(|d| {
            #[allow(clippy::cast_precision_loss)]
            let d = d as f64;
            ((1.0 + n) / (1.0 + d)).ln() + 1.0
        })
        .collect()
}

/// `None` when no term of `doc` survived vocabulary pruning.
fn tfidf_vector(
    doc: &HashMap<String, u32>,
    vocabulary: &BTreeMap<String, usize>,
    idf: &[f64],
) -> Option<SparseVec> {
    let mut vector: SparseVec = doc
        .iter()
        .filter_map(|(term, &count)| {
            vocabulary
                .get(term)
                .map(|&idx| (idx, f64::from(count) * idf[idx]))
        })
        .collect();
    vector.sort_unstable_by_key(|&(idx, _)| idx);

    let norm = vector.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
    if norm == 0.0 {
        return None;
    }
    for (_, w) in &mut vector {
        *w /= norm;
    }
    Some(vector)
}

/// Dot product of two index-sorted unit vectors, clamped to `[0, 1]`.
fn cosine(a: &SparseVec, b: &SparseVec) -> f64 {
    let (mut i, mut j) = (0, 0);
    let mut dot = 0.0;
    while i < a.len() && j < b.len() {
        match a[i].0.cmp(&b[j].0) {
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                dot += a[i].1 * b[j].1;
                i += 1;
                j += 1;
            }
        }
    }
    dot.clamp(0.0, 1.0)
}

#[cfg(test)]
#[path = "similarity_test.rs"]
mod tests;
