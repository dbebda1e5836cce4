//! User-based collaborative filtering recommender
//!
//! Algorithm:
//! 1. Find the top-K users most similar to the target user
//! 2. Collect items those neighbors rated that the target has not
//! 3. Predict each item as the similarity-weighted average of neighbor ratings
//! 4. Return the top-N items by predicted score
//!
//! Formula: score[item] = Σ(similarity[u] × rating[u, item]) / Σ|similarity[u]|

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::debug;

use crate::error::{RecommenderError, Result};
use crate::neighborhood::{Neighbor, NeighborhoodConfig, NeighborhoodSelector};
use crate::similarity::{SimilarityEngine, SimilarityMetric};
use crate::store::RatingStore;
use crate::{ItemId, UserId};

/// Neighborhood size used when none is configured
pub const DEFAULT_NEIGHBORHOOD_SIZE: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub item_id: ItemId,
    pub score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecommenderConfig {
    #[serde(default = "default_neighborhood_size")]
    pub neighborhood_size: usize,
    #[serde(default)]
    pub metric: SimilarityMetric,
    #[serde(default)]
    pub min_similarity: Option<f64>,
}

fn default_neighborhood_size() -> usize {
    DEFAULT_NEIGHBORHOOD_SIZE
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            neighborhood_size: default_neighborhood_size(),
            metric: SimilarityMetric::default(),
            min_similarity: None,
        }
    }
}

impl RecommenderConfig {
    pub fn validate(&self) -> Result<()> {
        if self.neighborhood_size == 0 {
            return Err(RecommenderError::invalid_query(
                "neighborhood size must be at least 1",
            ));
        }
        if let Some(threshold) = self.min_similarity {
            if !(-1.0..=1.0).contains(&threshold) {
                return Err(RecommenderError::invalid_query(format!(
                    "minimum similarity must lie in [-1, 1], got {}",
                    threshold
                )));
            }
        }
        Ok(())
    }
}

/// Recommender bound to one store snapshot
#[derive(Debug, Clone, Copy)]
pub struct UserBasedRecommender<'a> {
    store: &'a RatingStore,
    selector: NeighborhoodSelector<'a>,
    neighborhood_size: usize,
}

impl<'a> UserBasedRecommender<'a> {
    pub fn new(store: &'a RatingStore, config: &RecommenderConfig) -> Result<Self> {
        config.validate()?;

        let engine = SimilarityEngine::new(store, config.metric);
        let selector = NeighborhoodSelector::new(
            engine,
            NeighborhoodConfig {
                min_similarity: config.min_similarity,
            },
        );

        Ok(Self {
            store,
            selector,
            neighborhood_size: config.neighborhood_size,
        })
    }

    pub fn neighbors(&self, user_id: UserId) -> Result<Vec<Neighbor>> {
        self.selector.neighbors(user_id, self.neighborhood_size)
    }

    /// Top-`n` unrated items for `user_id`, best first, ties by ascending item id
    pub fn recommend(&self, user_id: UserId, n: usize) -> Result<Vec<Recommendation>> {
        if n == 0 {
            return Err(RecommenderError::invalid_query(
                "recommendation count must be at least 1",
            ));
        }

        let own_items = self
            .store
            .ratings_of(user_id)
            .ok_or(RecommenderError::UnknownUser(user_id))?;
        let neighbors = self.neighbors(user_id)?;

        if neighbors.is_empty() {
            debug!(user_id, "No similar users found for user-based CF");
            return Ok(Vec::new());
        }

        // item → (Σ sim·rating, Σ |sim|)
        let mut accumulated: BTreeMap<ItemId, (f64, f64)> = BTreeMap::new();
        for neighbor in &neighbors {
            let Some(ratings) = self.store.ratings_of(neighbor.user_id) else {
                continue;
            };
            for (&item_id, &rating) in ratings {
                if own_items.contains_key(&item_id) {
                    continue;
                }
                let entry = accumulated.entry(item_id).or_insert((0.0, 0.0));
                entry.0 += neighbor.similarity * rating;
                entry.1 += neighbor.similarity.abs();
            }
        }

        let candidate_count = accumulated.len();
        let mut ranked: Vec<Recommendation> = accumulated
            .into_iter()
            .filter_map(|(item_id, (weighted, weights))| {
                weighted_average(weighted, weights).map(|score| Recommendation { item_id, score })
            })
            .collect();

        ranked.sort_by(compare_recommendations);
        ranked.truncate(n);

        debug!(
            user_id,
            neighbors = neighbors.len(),
            candidates = candidate_count,
            returned = ranked.len(),
            "User-based CF recommendations generated"
        );

        Ok(ranked)
    }

    /// Predicted preference of `user_id` for `item_id`.
    ///
    /// Returns the stored rating when the user already rated the item and
    /// `None` when no neighbor rated it.
    pub fn estimate_preference(&self, user_id: UserId, item_id: ItemId) -> Result<Option<f64>> {
        let own_items = self
            .store
            .ratings_of(user_id)
            .ok_or(RecommenderError::UnknownUser(user_id))?;
        if let Some(rating) = own_items.get(&item_id) {
            return Ok(Some(*rating));
        }

        let mut weighted = 0.0;
        let mut weights = 0.0;
        for neighbor in self.neighbors(user_id)? {
            if let Some(rating) = self.store.rating(neighbor.user_id, item_id) {
                weighted += neighbor.similarity * rating;
                weights += neighbor.similarity.abs();
            }
        }

        Ok(weighted_average(weighted, weights))
    }
}

fn weighted_average(weighted: f64, weights: f64) -> Option<f64> {
    if weights <= 0.0 {
        return None;
    }
    let score = weighted / weights;
    score.is_finite().then_some(score)
}

fn compare_recommendations(a: &Recommendation, b: &Recommendation) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.item_id.cmp(&b.item_id))
}
