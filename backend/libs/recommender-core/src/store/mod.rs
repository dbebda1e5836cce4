//! In-memory rating store
//!
//! Holds `user → item → rating` associations together with the inverse
//! `item → users` index. Both maps are ordered so every traversal (and therefore
//! every floating point accumulation built on top of it) is deterministic.

mod loader;
mod shared;

pub use loader::{DuplicatePolicy, LoadOptions, LoadStats, MalformedPolicy};
pub use shared::SharedRatingStore;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::error::{RecommenderError, Result};
use crate::{ItemId, UserId};

/// A single preference of a user for an item
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub user_id: UserId,
    pub item_id: ItemId,
    pub value: f64,
}

impl Rating {
    pub fn new(user_id: UserId, item_id: ItemId, value: f64) -> Self {
        Self {
            user_id,
            item_id,
            value,
        }
    }

    /// Check the store invariants: non-negative ids and a finite value
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.user_id < 0 {
            return Err(format!("user id must be non-negative, got {}", self.user_id));
        }
        if self.item_id < 0 {
            return Err(format!("item id must be non-negative, got {}", self.item_id));
        }
        if !self.value.is_finite() {
            return Err(format!("rating value must be finite, got {}", self.value));
        }
        Ok(())
    }
}

/// Summary counts of a store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StoreMetadata {
    pub user_count: usize,
    pub item_count: usize,
    pub rating_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RatingStore {
    by_user: BTreeMap<UserId, BTreeMap<ItemId, f64>>,
    by_item: BTreeMap<ItemId, BTreeSet<UserId>>,
    rating_count: usize,
}

impl RatingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a rating, returning the previous value for the pair
    pub fn insert(&mut self, rating: Rating) -> Result<Option<f64>> {
        rating
            .validate()
            .map_err(RecommenderError::invalid_query)?;
        Ok(self.insert_unchecked(rating))
    }

    pub(crate) fn insert_unchecked(&mut self, rating: Rating) -> Option<f64> {
        let previous = self
            .by_user
            .entry(rating.user_id)
            .or_default()
            .insert(rating.item_id, rating.value);

        self.by_item
            .entry(rating.item_id)
            .or_default()
            .insert(rating.user_id);

        if previous.is_none() {
            self.rating_count += 1;
        }
        previous
    }

    pub fn rating(&self, user_id: UserId, item_id: ItemId) -> Option<f64> {
        self.by_user
            .get(&user_id)
            .and_then(|items| items.get(&item_id))
            .copied()
    }

    pub fn contains(&self, user_id: UserId, item_id: ItemId) -> bool {
        self.rating(user_id, item_id).is_some()
    }

    /// Items rated by `user_id` with their values, ascending by item id
    pub fn ratings_of(&self, user_id: UserId) -> Option<&BTreeMap<ItemId, f64>> {
        self.by_user.get(&user_id)
    }

    pub fn items_rated_by(&self, user_id: UserId) -> BTreeSet<ItemId> {
        self.by_user
            .get(&user_id)
            .map(|items| items.keys().copied().collect())
            .unwrap_or_default()
    }

    pub fn users_who_rated(&self, item_id: ItemId) -> BTreeSet<UserId> {
        self.by_item.get(&item_id).cloned().unwrap_or_default()
    }

    pub fn has_user(&self, user_id: UserId) -> bool {
        self.by_user.contains_key(&user_id)
    }

    /// All user ids in ascending order
    pub fn all_user_ids(&self) -> Vec<UserId> {
        self.by_user.keys().copied().collect()
    }

    /// All item ids in ascending order
    pub fn all_item_ids(&self) -> Vec<ItemId> {
        self.by_item.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.rating_count
    }

    pub fn is_empty(&self) -> bool {
        self.rating_count == 0
    }

    pub fn metadata(&self) -> StoreMetadata {
        StoreMetadata {
            user_count: self.by_user.len(),
            item_count: self.by_item.len(),
            rating_count: self.rating_count,
        }
    }
}

impl FromIterator<Rating> for RatingStore {
    /// Build a store from ratings already known to be valid; invalid ones are dropped
    fn from_iter<T: IntoIterator<Item = Rating>>(iter: T) -> Self {
        let mut store = RatingStore::new();
        for rating in iter {
            if rating.validate().is_ok() {
                store.insert_unchecked(rating);
            }
        }
        store
    }
}
