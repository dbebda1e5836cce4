//! User-based collaborative filtering core
//!
//! Loads `user,item,rating` records into an in-memory store and answers
//! top-N recommendation queries from k-nearest-neighbor user neighborhoods.
//!
//! # Data flow
//!
//! ```text
//! RatingStore ──> SimilarityEngine ──> NeighborhoodSelector ──> UserBasedRecommender
//!   (ratings)      (pearson/cosine/      (top-K similar users)     (weighted average,
//!                   jaccard per pair)                                top-N items)
//! ```
//!
//! # Example
//!
//! ```
//! use recommender_core::{Rating, RatingStore, RecommenderConfig, UserBasedRecommender};
//!
//! let store: RatingStore = [
//!     Rating::new(1, 101, 5.0),
//!     Rating::new(1, 102, 3.0),
//!     Rating::new(2, 101, 5.0),
//!     Rating::new(2, 102, 3.0),
//!     Rating::new(2, 103, 4.0),
//! ]
//! .into_iter()
//! .collect();
//!
//! let recommender = UserBasedRecommender::new(&store, &RecommenderConfig::default())?;
//! let top = recommender.recommend(1, 1)?;
//! assert_eq!(top[0].item_id, 103);
//! # Ok::<(), recommender_core::RecommenderError>(())
//! ```

pub mod engine;
pub mod error;
pub mod neighborhood;
pub mod recommender;
pub mod similarity;
pub mod store;

pub type UserId = i64;
pub type ItemId = i64;

pub use engine::{RecommendationEngine, MAX_RECOMMENDATIONS};
pub use error::{ErrorKind, ErrorReport, RecommenderError, Result};
pub use neighborhood::{Neighbor, NeighborhoodConfig, NeighborhoodSelector};
pub use recommender::{
    Recommendation, RecommenderConfig, UserBasedRecommender, DEFAULT_NEIGHBORHOOD_SIZE,
};
pub use similarity::{SimilarityEngine, SimilarityMetric, MIN_CO_RATED_ITEMS};
pub use store::{
    DuplicatePolicy, LoadOptions, LoadStats, MalformedPolicy, Rating, RatingStore,
    SharedRatingStore, StoreMetadata,
};
