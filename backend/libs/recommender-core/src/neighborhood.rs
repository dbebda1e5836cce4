//! Nearest-N user neighborhoods

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::debug;

use crate::error::{RecommenderError, Result};
use crate::similarity::SimilarityEngine;
use crate::UserId;

/// A similar user and how similar they are to the target
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Neighbor {
    pub user_id: UserId,
    pub similarity: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NeighborhoodConfig {
    /// Candidates below this similarity are dropped; `None` keeps every defined value
    #[serde(default)]
    pub min_similarity: Option<f64>,
}

#[derive(Debug, Clone, Copy)]
pub struct NeighborhoodSelector<'a> {
    engine: SimilarityEngine<'a>,
    config: NeighborhoodConfig,
}

impl<'a> NeighborhoodSelector<'a> {
    pub fn new(engine: SimilarityEngine<'a>, config: NeighborhoodConfig) -> Self {
        Self { engine, config }
    }

    pub fn engine(&self) -> &SimilarityEngine<'a> {
        &self.engine
    }

    /// Find the top-K users most similar to `user_id`.
    ///
    /// Only users who rated at least one item the target has not rated are
    /// considered. Ordered by similarity descending, then user id ascending.
    pub fn neighbors(&self, user_id: UserId, k: usize) -> Result<Vec<Neighbor>> {
        let store = self.engine.store();
        let own_items = store
            .ratings_of(user_id)
            .ok_or(RecommenderError::UnknownUser(user_id))?;

        if k == 0 {
            return Ok(Vec::new());
        }

        let mut candidates: Vec<Neighbor> = store
            .all_user_ids()
            .into_iter()
            .filter(|&other| other != user_id)
            .filter(|&other| {
                store
                    .ratings_of(other)
                    .is_some_and(|items| items.keys().any(|item| !own_items.contains_key(item)))
            })
            .filter_map(|other| {
                self.engine.similarity(user_id, other).map(|similarity| Neighbor {
                    user_id: other,
                    similarity,
                })
            })
            .filter(|neighbor| {
                self.config
                    .min_similarity
                    .map_or(true, |threshold| neighbor.similarity >= threshold)
            })
            .collect();

        candidates.sort_by(compare_neighbors);
        let considered = candidates.len();
        candidates.truncate(k);

        debug!(
            user_id,
            k,
            considered,
            selected = candidates.len(),
            metric = %self.engine.metric(),
            "Neighborhood selected"
        );

        Ok(candidates)
    }
}

fn compare_neighbors(a: &Neighbor, b: &Neighbor) -> Ordering {
    b.similarity
        .total_cmp(&a.similarity)
        .then_with(|| a.user_id.cmp(&b.user_id))
}
