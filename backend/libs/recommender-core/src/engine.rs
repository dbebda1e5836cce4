//! Query facade used by front ends
//!
//! Validates caller input, takes a store snapshot per query and runs the
//! user-based recommender against it.

use std::path::Path;
use tracing::{info, warn};

use crate::error::{RecommenderError, Result};
use crate::recommender::{Recommendation, RecommenderConfig, UserBasedRecommender};
use crate::store::{LoadOptions, LoadStats, Rating, RatingStore, SharedRatingStore, StoreMetadata};
use crate::{ItemId, UserId};

/// Upper bound on a single query's result count
pub const MAX_RECOMMENDATIONS: i64 = 1000;

#[derive(Debug, Clone)]
pub struct RecommendationEngine {
    store: SharedRatingStore,
    config: RecommenderConfig,
}

impl RecommendationEngine {
    pub fn new(store: RatingStore, config: RecommenderConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            store: SharedRatingStore::new(store),
            config,
        })
    }

    /// Load the rating file at `path` and build an engine over it
    pub fn open(
        path: impl AsRef<Path>,
        options: &LoadOptions,
        config: RecommenderConfig,
    ) -> Result<(Self, LoadStats)> {
        let (store, stats) = RatingStore::load(path, options)?;
        Ok((Self::new(store, config)?, stats))
    }

    pub fn config(&self) -> &RecommenderConfig {
        &self.config
    }

    pub fn store(&self) -> &SharedRatingStore {
        &self.store
    }

    pub fn recommend(&self, user_id: i64, count: i64) -> Result<Vec<Recommendation>> {
        let user_id = validate_id("user", user_id)?;
        if !(1..=MAX_RECOMMENDATIONS).contains(&count) {
            return Err(RecommenderError::invalid_query(format!(
                "recommendation count must be between 1 and {}, got {}",
                MAX_RECOMMENDATIONS, count
            )));
        }

        let snapshot = self.store.snapshot();
        UserBasedRecommender::new(&snapshot, &self.config)?.recommend(user_id, count as usize)
    }

    pub fn estimate(&self, user_id: i64, item_id: i64) -> Result<Option<f64>> {
        let user_id = validate_id("user", user_id)?;
        let item_id: ItemId = validate_id("item", item_id)?;

        let snapshot = self.store.snapshot();
        UserBasedRecommender::new(&snapshot, &self.config)?.estimate_preference(user_id, item_id)
    }

    pub fn list_user_ids(&self) -> Vec<UserId> {
        self.store.snapshot().all_user_ids()
    }

    pub fn metadata(&self) -> StoreMetadata {
        self.store.snapshot().metadata()
    }

    /// Record a rating; later queries see it, in-flight ones do not
    pub fn rate(&self, user_id: i64, item_id: i64, value: f64) -> Result<Option<f64>> {
        self.store.upsert(Rating::new(user_id, item_id, value))
    }

    /// Re-read `path` and publish it. The current snapshot stays live if loading fails.
    pub fn reload(&self, path: impl AsRef<Path>, options: &LoadOptions) -> Result<LoadStats> {
        match RatingStore::load(path.as_ref(), options) {
            Ok((store, stats)) => {
                self.store.replace(store);
                info!(path = %path.as_ref().display(), "Rating store reloaded");
                Ok(stats)
            }
            Err(err) => {
                warn!(error = %err, "Reload failed, keeping current ratings");
                Err(err)
            }
        }
    }
}

fn validate_id(what: &str, id: i64) -> Result<i64> {
    if id < 0 {
        return Err(RecommenderError::invalid_query(format!(
            "{} id must be non-negative, got {}",
            what, id
        )));
    }
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn engine() -> RecommendationEngine {
        let store: RatingStore = [
            Rating::new(1, 101, 5.0),
            Rating::new(1, 102, 3.0),
            Rating::new(2, 101, 5.0),
            Rating::new(2, 102, 3.0),
            Rating::new(2, 103, 4.0),
            Rating::new(3, 101, 1.0),
            Rating::new(3, 102, 1.0),
        ]
        .into_iter()
        .collect();
        RecommendationEngine::new(store, RecommenderConfig::default()).unwrap()
    }

    #[test]
    fn test_recommend_validates_input() {
        let engine = engine();

        for (user, count) in [(-1, 5), (1, 0), (1, -3), (1, MAX_RECOMMENDATIONS + 1)] {
            let err = engine.recommend(user, count).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidQuery, "({user}, {count})");
        }
    }

    #[test]
    fn test_recommend_and_list() {
        let engine = engine();

        assert_eq!(engine.list_user_ids(), vec![1, 2, 3]);
        let recommendations = engine.recommend(1, 5).unwrap();
        assert_eq!(recommendations[0].item_id, 103);
        assert_eq!(
            engine.recommend(4, 5).unwrap_err().kind(),
            ErrorKind::UnknownUser
        );
    }

    #[test]
    fn test_rate_changes_later_queries() {
        let engine = engine();
        assert!(engine.recommend(4, 5).is_err());

        engine.rate(4, 101, 4.0).unwrap();
        engine.rate(4, 102, 2.0).unwrap();

        let recommendations = engine.recommend(4, 5).unwrap();
        assert_eq!(recommendations.len(), 1);
        assert_eq!(recommendations[0].item_id, 103);
        assert_eq!(engine.metadata().user_count, 4);
    }

    #[test]
    fn test_rate_rejects_invalid() {
        let engine = engine();

        assert!(engine.rate(-4, 101, 4.0).is_err());
        assert!(engine.rate(4, 101, f64::INFINITY).is_err());
        assert_eq!(engine.metadata().user_count, 3);
    }

    #[test]
    fn test_failed_reload_keeps_snapshot() {
        let engine = engine();

        let err = engine
            .reload("/no/such/ratings.csv", &LoadOptions::default())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SourceUnavailable);
        assert_eq!(engine.metadata().rating_count, 7);
    }

    #[test]
    fn test_estimate() {
        let engine = engine();

        let estimate = engine.estimate(1, 103).unwrap().unwrap();
        assert!((estimate - 4.0).abs() < 1e-9);
        assert!(engine.estimate(1, -103).is_err());
    }
}
