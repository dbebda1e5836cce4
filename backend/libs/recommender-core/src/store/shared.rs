//! Snapshot-swapped rating store for online updates
//!
//! Readers take an `Arc` snapshot and never observe a half-applied write.
//! Writers build the next store off to the side and install it under the
//! write lock.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

use super::{Rating, RatingStore};
use crate::error::{RecommenderError, Result};

#[derive(Debug, Clone, Default)]
pub struct SharedRatingStore {
    current: Arc<RwLock<Arc<RatingStore>>>,
}

impl SharedRatingStore {
    pub fn new(store: RatingStore) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(store))),
        }
    }

    /// Current immutable snapshot
    pub fn snapshot(&self) -> Arc<RatingStore> {
        let guard = self.read();
        Arc::clone(&*guard)
    }

    /// Install a fully built store, returning the one it replaced
    pub fn replace(&self, store: RatingStore) -> Arc<RatingStore> {
        let mut guard = self.write();
        std::mem::replace(&mut *guard, Arc::new(store))
    }

    /// Apply `f` to a copy of the current store and publish the result.
    ///
    /// Nothing is published when `f` fails.
    pub fn update<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut RatingStore) -> Result<T>,
    {
        let mut guard = self.write();
        let mut next = RatingStore::clone(&**guard);
        let out = f(&mut next)?;
        *guard = Arc::new(next);
        Ok(out)
    }

    /// Insert or overwrite a single rating
    pub fn upsert(&self, rating: Rating) -> Result<Option<f64>> {
        let previous = self.update(|store| store.insert(rating))?;
        debug!(
            user_id = rating.user_id,
            item_id = rating.item_id,
            value = rating.value,
            replaced = previous.is_some(),
            "Rating upserted"
        );
        Ok(previous)
    }

    /// Insert a batch atomically: either every rating is published or none is
    pub fn upsert_all<I>(&self, ratings: I) -> Result<usize>
    where
        I: IntoIterator<Item = Rating>,
    {
        self.update(|store| {
            let mut count = 0;
            for rating in ratings {
                store.insert(rating).map_err(|e| match e {
                    RecommenderError::InvalidQuery(reason) => RecommenderError::InvalidQuery(
                        format!("rating #{} rejected: {}", count + 1, reason),
                    ),
                    other => other,
                })?;
                count += 1;
            }
            Ok(count)
        })
    }

    // The guarded value is only ever swapped whole, so a poisoned lock still
    // holds a consistent snapshot.
    fn read(&self) -> RwLockReadGuard<'_, Arc<RatingStore>> {
        self.current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Arc<RatingStore>> {
        self.current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn base_store() -> RatingStore {
        [Rating::new(1, 101, 5.0), Rating::new(2, 101, 3.0)]
            .into_iter()
            .collect()
    }

    #[test]
    fn test_snapshot_is_isolated_from_later_writes() {
        let shared = SharedRatingStore::new(base_store());
        let before = shared.snapshot();

        shared.upsert(Rating::new(1, 102, 4.0)).unwrap();

        assert_eq!(before.rating(1, 102), None);
        assert_eq!(shared.snapshot().rating(1, 102), Some(4.0));
    }

    #[test]
    fn test_failed_batch_publishes_nothing() {
        let shared = SharedRatingStore::new(base_store());

        let result = shared.upsert_all(vec![
            Rating::new(3, 101, 1.0),
            Rating::new(-3, 101, 1.0),
        ]);

        assert!(result.is_err());
        assert!(!shared.snapshot().has_user(3));
    }

    #[test]
    fn test_replace_returns_previous() {
        let shared = SharedRatingStore::new(base_store());
        let old = shared.replace(RatingStore::new());

        assert_eq!(old.len(), 2);
        assert!(shared.snapshot().is_empty());
    }

    #[test]
    fn test_concurrent_readers_see_complete_snapshots() {
        let shared = SharedRatingStore::new(RatingStore::new());

        let writer = {
            let shared = shared.clone();
            thread::spawn(move || {
                for item in 0..50 {
                    shared
                        .upsert_all(vec![Rating::new(1, item, 1.0), Rating::new(2, item, 1.0)])
                        .unwrap();
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let shared = shared.clone();
                thread::spawn(move || {
                    for _ in 0..100 {
                        let snapshot = shared.snapshot();
                        // Batches always add one rating for each user
                        assert_eq!(
                            snapshot.items_rated_by(1).len(),
                            snapshot.items_rated_by(2).len()
                        );
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }
        assert_eq!(shared.snapshot().len(), 100);
    }
}
