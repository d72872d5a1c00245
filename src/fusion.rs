//! Rank fusion strategies
//!
//! Combines ranked candidate lists from multiple retrievers into a single
//! ranking. Three algorithms are provided:
//! - Reciprocal Rank Fusion (RRF): rank-based, needs no score calibration
//! - Weighted score fusion: sums reported scores, assumes comparable scales
//! - Round robin: alternates between sources, ignoring score strength

use crate::types::{FusionKey, ScoredDocument};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Damping constant for the RRF formula (`1 / (rank + k)`)
///
/// Keeps rank-1 candidates from dominating the fused ranking regardless of
/// which retriever produced them.
pub const DEFAULT_RRF_K: f32 = 60.0;

/// Fusion algorithm selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FusionMethod {
    /// Reciprocal Rank Fusion (default). Robust when the underlying score
    /// scales are incomparable, which is the case for BM25 vs. cosine.
    #[default]
    ReciprocalRank,
    /// Weighted sum of each retriever's own reported scores. Only appropriate
    /// when the score scales are known to be comparable.
    WeightedScore,
    /// Alternate between retriever lists, guaranteeing representation from
    /// every retriever.
    RoundRobin,
}

impl FusionMethod {
    /// Parse a method name, falling back to RRF for unrecognized names
    ///
    /// The permissive fallback is deliberate: an unknown method degrades to
    /// the default algorithm instead of erroring.
    pub fn parse(name: &str) -> Self {
        match name {
            "reciprocal_rank" => Self::ReciprocalRank,
            "weighted_score" => Self::WeightedScore,
            "round_robin" => Self::RoundRobin,
            other => {
                debug!("Unknown fusion method '{}', using reciprocal_rank", other);
                Self::ReciprocalRank
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ReciprocalRank => "reciprocal_rank",
            Self::WeightedScore => "weighted_score",
            Self::RoundRobin => "round_robin",
        }
    }
}

// Deserialization goes through `parse` so an unrecognized method name in
// configuration degrades to the default instead of failing the load
impl<'de> Deserialize<'de> for FusionMethod {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let name = String::deserialize(deserializer)?;
        Ok(Self::parse(&name))
    }
}

/// Per-document fusion accumulator
struct FusionEntry {
    document: ScoredDocument,
    score: f32,
    /// Position of first observation across all input lists, used as a
    /// deterministic tie-break when aggregate scores are equal
    first_seen: usize,
}

/// Combine ranked lists using Reciprocal Rank Fusion
///
/// A candidate at 0-based rank `r` in its retriever's list contributes
/// `weight * 1/(r + rrf_k)` to that document's aggregate. Candidates are
/// grouped by fusion identity, sorted by aggregate score descending, and the
/// fused value becomes the result score.
pub fn reciprocal_rank_fusion(
    ranked_lists: &[(Vec<ScoredDocument>, f32)],
    top_k: usize,
    rrf_k: f32,
) -> Vec<ScoredDocument> {
    fuse_by_contribution(ranked_lists, top_k, |rank, weight, _doc| {
        weight * (1.0 / (rank as f32 + rrf_k))
    })
}

/// Combine ranked lists by weighted sum of reported scores
pub fn weighted_score_fusion(
    ranked_lists: &[(Vec<ScoredDocument>, f32)],
    top_k: usize,
) -> Vec<ScoredDocument> {
    fuse_by_contribution(ranked_lists, top_k, |_rank, weight, doc| {
        weight * doc.score
    })
}

fn fuse_by_contribution(
    ranked_lists: &[(Vec<ScoredDocument>, f32)],
    top_k: usize,
    contribution: impl Fn(usize, f32, &ScoredDocument) -> f32,
) -> Vec<ScoredDocument> {
    let mut entries: HashMap<FusionKey, FusionEntry> = HashMap::new();
    let mut observed = 0usize;

    for (results, weight) in ranked_lists {
        for (rank, doc) in results.iter().enumerate() {
            let key = doc.document.fusion_key();
            let value = contribution(rank, *weight, doc);

            entries
                .entry(key)
                .and_modify(|entry| entry.score += value)
                .or_insert_with(|| {
                    let entry = FusionEntry {
                        document: doc.clone(),
                        score: value,
                        first_seen: observed,
                    };
                    observed += 1;
                    entry
                });
        }
    }

    let mut fused: Vec<FusionEntry> = entries.into_values().collect();
    fused.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.first_seen.cmp(&b.first_seen))
    });
    fused.truncate(top_k);

    fused
        .into_iter()
        .map(|entry| ScoredDocument::new(entry.document.document, entry.score))
        .collect()
}

/// Combine ranked lists by cycling through them
///
/// Takes the next not-yet-selected document from list 0, then list 1, and so
/// on, until `top_k` unique documents are collected or every list is
/// exhausted. Each list is read through its own cursor; the input lists are
/// never mutated, so they stay safe to share across concurrent readers.
pub fn round_robin_fusion(
    ranked_lists: &[(Vec<ScoredDocument>, f32)],
    top_k: usize,
) -> Vec<ScoredDocument> {
    let mut cursors = vec![0usize; ranked_lists.len()];
    let mut seen: HashSet<FusionKey> = HashSet::new();
    let mut results = Vec::new();

    while results.len() < top_k {
        let mut advanced = false;

        for (i, (list, _weight)) in ranked_lists.iter().enumerate() {
            let Some(doc) = list.get(cursors[i]) else {
                continue;
            };
            cursors[i] += 1;
            advanced = true;

            if seen.insert(doc.document.fusion_key()) {
                results.push(doc.clone());
                if results.len() >= top_k {
                    break;
                }
            }
        }

        if !advanced {
            break;
        }
    }

    results
}
