//! Pairwise user similarity over co-rated items

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::store::RatingStore;
use crate::UserId;

/// Pairs sharing fewer co-rated items than this have no defined similarity
pub const MIN_CO_RATED_ITEMS: usize = 2;

/// Similarity metric for collaborative filtering
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimilarityMetric {
    #[default]
    Pearson,
    Cosine,
    Jaccard,
}

impl fmt::Display for SimilarityMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimilarityMetric::Pearson => write!(f, "pearson"),
            SimilarityMetric::Cosine => write!(f, "cosine"),
            SimilarityMetric::Jaccard => write!(f, "jaccard"),
        }
    }
}

impl FromStr for SimilarityMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pearson" => Ok(SimilarityMetric::Pearson),
            "cosine" => Ok(SimilarityMetric::Cosine),
            "jaccard" => Ok(SimilarityMetric::Jaccard),
            other => Err(format!(
                "unknown similarity metric '{}', expected pearson, cosine or jaccard",
                other
            )),
        }
    }
}

/// Computes user-user similarity on demand from a store snapshot
#[derive(Debug, Clone, Copy)]
pub struct SimilarityEngine<'a> {
    store: &'a RatingStore,
    metric: SimilarityMetric,
}

impl<'a> SimilarityEngine<'a> {
    pub fn new(store: &'a RatingStore, metric: SimilarityMetric) -> Self {
        Self { store, metric }
    }

    pub fn metric(&self) -> SimilarityMetric {
        self.metric
    }

    pub fn store(&self) -> &'a RatingStore {
        self.store
    }

    /// Similarity in [-1, 1], or `None` when undefined.
    ///
    /// Undefined for a user paired with itself, for unknown users, for pairs
    /// with fewer than [`MIN_CO_RATED_ITEMS`] co-rated items, and wherever the
    /// metric's denominator vanishes.
    pub fn similarity(&self, user_a: UserId, user_b: UserId) -> Option<f64> {
        if user_a == user_b {
            return None;
        }

        // Canonical order makes the result bit-for-bit symmetric
        let (low, high) = if user_a < user_b {
            (user_a, user_b)
        } else {
            (user_b, user_a)
        };
        let ratings_low = self.store.ratings_of(low)?;
        let ratings_high = self.store.ratings_of(high)?;

        let pairs: Vec<(f64, f64)> = ratings_low
            .iter()
            .filter_map(|(item, x)| ratings_high.get(item).map(|y| (*x, *y)))
            .collect();

        if pairs.len() < MIN_CO_RATED_ITEMS {
            return None;
        }

        let value = match self.metric {
            SimilarityMetric::Pearson => pearson_correlation(&pairs)?,
            SimilarityMetric::Cosine => cosine_similarity(&pairs)?,
            SimilarityMetric::Jaccard => {
                let union = ratings_low.len() + ratings_high.len() - pairs.len();
                pairs.len() as f64 / union as f64
            }
        };

        if value.is_finite() {
            Some(value.clamp(-1.0, 1.0))
        } else {
            None
        }
    }
}

/// Pearson correlation coefficient of paired samples
///
/// Formula: r = Σ(x - x̄)(y - ȳ) / sqrt(Σ(x - x̄)² · Σ(y - ȳ)²)
pub fn pearson_correlation(pairs: &[(f64, f64)]) -> Option<f64> {
    if pairs.len() < 2
        || is_constant(pairs.iter().map(|p| p.0))
        || is_constant(pairs.iter().map(|p| p.1))
    {
        return None;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;

    let mut covariance = 0.0;
    let mut variance_x = 0.0;
    let mut variance_y = 0.0;
    for &(x, y) in pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        covariance += dx * dy;
        variance_x += dx * dx;
        variance_y += dy * dy;
    }

    // Square roots taken separately so tiny variances do not underflow to zero
    let denominator = variance_x.sqrt() * variance_y.sqrt();
    if denominator == 0.0 {
        None
    } else {
        Some(covariance / denominator)
    }
}

/// Cosine similarity of paired samples
///
/// Formula: cos(A, B) = (A · B) / (||A|| × ||B||)
pub fn cosine_similarity(pairs: &[(f64, f64)]) -> Option<f64> {
    let dot_product: f64 = pairs.iter().map(|(a, b)| a * b).sum();
    let norm_a: f64 = pairs.iter().map(|(a, _)| a * a).sum::<f64>().sqrt();
    let norm_b: f64 = pairs.iter().map(|(_, b)| b * b).sum::<f64>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        None
    } else {
        Some(dot_product / (norm_a * norm_b))
    }
}

fn is_constant(mut values: impl Iterator<Item = f64>) -> bool {
    match values.next() {
        Some(first) => values.all(|v| v == first),
        None => true,
    }
}
