//! Sparse rating storage (Rating, SparseRatingMatrix).
//!
//! These types provide the foundation for the recommendation algorithms.
//! A [`SparseRatingMatrix`] is a logical users×items matrix where a cell is
//! either an observed rating or unobserved. Unobserved is never represented
//! as zero; absence is absence.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;

use crate::error::{RecomendarError, Result};

/// A single observed rating. Source of truth, immutable once loaded.
///
/// # Examples
///
/// ```
/// use recomendar::ratings::Rating;
///
/// let r = Rating::new(1, 10, 4.5);
/// assert_eq!(r.user, 1);
/// assert_eq!(r.item, 10);
/// assert!(r.timestamp.is_none());
///
/// let r = Rating::new(1, 11, 3.0).with_timestamp(964_982_703);
/// assert_eq!(r.timestamp, Some(964_982_703));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rating {
    /// User id
    pub user: u32,
    /// Item id
    pub item: u32,
    /// Rating value
    pub value: f32,
    /// Optional epoch timestamp of the rating event
    pub timestamp: Option<i64>,
}

impl Rating {
    /// Create a rating without a timestamp.
    #[must_use]
    pub fn new(user: u32, item: u32, value: f32) -> Self {
        Self {
            user,
            item,
            value,
            timestamp: None,
        }
    }

    /// Attach an epoch timestamp.
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}

/// Per-item aggregate statistics over all users who rated the item.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ItemStats {
    /// Item id
    pub item: u32,
    /// Number of users who rated the item
    pub count: usize,
    /// Mean rating across those users
    pub mean: f32,
}

/// Compact storage for a users×items rating matrix with missing entries.
///
/// Rows are per-user sparse vectors sorted by item id, so cell lookup is a
/// hash probe plus a binary search. The distinct user and item id sets are
/// fixed at construction and never shrink implicitly.
///
/// # Examples
///
/// ```
/// use recomendar::ratings::{Rating, SparseRatingMatrix};
///
/// let matrix = SparseRatingMatrix::from_ratings(&[
///     Rating::new(1, 10, 5.0),
///     Rating::new(1, 11, 3.0),
///     Rating::new(2, 10, 4.0),
/// ]).unwrap();
///
/// assert_eq!(matrix.n_users(), 2);
/// assert_eq!(matrix.n_items(), 2);
/// assert_eq!(matrix.get(1, 10), Some(5.0));
/// assert_eq!(matrix.get(2, 11), None); // unobserved, not zero
/// ```
#[derive(Debug, Clone)]
pub struct SparseRatingMatrix {
    user_ids: Vec<u32>,
    item_ids: Vec<u32>,
    user_index: HashMap<u32, usize>,
    item_index: HashMap<u32, usize>,
    rows: Vec<Vec<(u32, f32)>>,
    n_ratings: usize,
}

impl SparseRatingMatrix {
    /// Build a matrix from a sequence of ratings.
    ///
    /// Construction is atomic: on error nothing is observable.
    ///
    /// # Errors
    ///
    /// - [`RecomendarError::EmptyInput`] if `ratings` is empty.
    /// - [`RecomendarError::DuplicateEntry`] if two ratings share a
    ///   (user, item) cell. Duplicates are rejected rather than resolved
    ///   last-write-wins, so data-preparation bugs surface instead of
    ///   silently overwriting.
    pub fn from_ratings(ratings: &[Rating]) -> Result<Self> {
        if ratings.is_empty() {
            return Err(RecomendarError::empty_input("no ratings supplied"));
        }

        let mut row_map: BTreeMap<u32, Vec<(u32, f32)>> = BTreeMap::new();
        let mut item_set: BTreeSet<u32> = BTreeSet::new();
        for r in ratings {
            row_map.entry(r.user).or_default().push((r.item, r.value));
            item_set.insert(r.item);
        }

        let mut rows = Vec::with_capacity(row_map.len());
        let mut user_ids = Vec::with_capacity(row_map.len());
        for (user, mut row) in row_map {
            row.sort_unstable_by_key(|&(item, _)| item);
            for pair in row.windows(2) {
                if pair[0].0 == pair[1].0 {
                    return Err(RecomendarError::DuplicateEntry {
                        user,
                        item: pair[0].0,
                    });
                }
            }
            user_ids.push(user);
            rows.push(row);
        }

        let item_ids: Vec<u32> = item_set.into_iter().collect();
        let user_index = user_ids.iter().enumerate().map(|(i, &u)| (u, i)).collect();
        let item_index = item_ids.iter().enumerate().map(|(i, &t)| (t, i)).collect();

        Ok(Self {
            user_ids,
            item_ids,
            user_index,
            item_index,
            rows,
            n_ratings: ratings.len(),
        })
    }

    /// Look up the rating for a cell; `None` means unobserved or unknown ids.
    #[must_use]
    pub fn get(&self, user: u32, item: u32) -> Option<f32> {
        let row = &self.rows[*self.user_index.get(&user)?];
        row.binary_search_by_key(&item, |&(i, _)| i)
            .ok()
            .map(|pos| row[pos].1)
    }

    /// A user's sparse rating vector as item-sorted `(item, value)` pairs.
    #[must_use]
    pub fn user_ratings(&self, user: u32) -> Option<&[(u32, f32)]> {
        self.user_index.get(&user).map(|&i| self.rows[i].as_slice())
    }

    /// Number of observed ratings in a user's row.
    #[must_use]
    pub fn user_rating_count(&self, user: u32) -> Option<usize> {
        self.user_index.get(&user).map(|&i| self.rows[i].len())
    }

    /// Distinct user ids in ascending order.
    #[must_use]
    pub fn users(&self) -> &[u32] {
        &self.user_ids
    }

    /// Distinct item ids in ascending order.
    #[must_use]
    pub fn items(&self) -> &[u32] {
        &self.item_ids
    }

    /// Number of distinct users.
    #[must_use]
    pub fn n_users(&self) -> usize {
        self.user_ids.len()
    }

    /// Number of distinct items.
    #[must_use]
    pub fn n_items(&self) -> usize {
        self.item_ids.len()
    }

    /// Total number of observed ratings.
    #[must_use]
    pub fn n_ratings(&self) -> usize {
        self.n_ratings
    }

    /// Whether a user id was seen at construction.
    #[must_use]
    pub fn contains_user(&self, user: u32) -> bool {
        self.user_index.contains_key(&user)
    }

    /// Whether an item id was seen at construction.
    #[must_use]
    pub fn contains_item(&self, item: u32) -> bool {
        self.item_index.contains_key(&item)
    }

    /// Iterate over every observed cell as `(user, item, value)`.
    pub fn iter(&self) -> impl Iterator<Item = (u32, u32, f32)> + '_ {
        self.user_ids
            .iter()
            .zip(self.rows.iter())
            .flat_map(|(&user, row)| row.iter().map(move |&(item, value)| (user, item, value)))
    }

    /// New matrix keeping only users with at least `min_ratings` observed
    /// ratings. The surviving item set is recomputed from the surviving rows.
    ///
    /// # Errors
    ///
    /// [`RecomendarError::EmptyInput`] if no user survives the filter.
    ///
    /// # Examples
    ///
    /// ```
    /// use recomendar::ratings::{Rating, SparseRatingMatrix};
    ///
    /// let matrix = SparseRatingMatrix::from_ratings(&[
    ///     Rating::new(1, 10, 5.0),
    ///     Rating::new(1, 11, 3.0),
    ///     Rating::new(2, 10, 4.0),
    /// ]).unwrap();
    ///
    /// let dense_users = matrix.filter_users(2).unwrap();
    /// assert_eq!(dense_users.users(), &[1]);
    /// assert_eq!(dense_users.n_items(), 2);
    /// ```
    pub fn filter_users(&self, min_ratings: usize) -> Result<Self> {
        let kept: Vec<Rating> = self
            .user_ids
            .iter()
            .zip(self.rows.iter())
            .filter(|(_, row)| row.len() >= min_ratings)
            .flat_map(|(&user, row)| {
                row.iter()
                    .map(move |&(item, value)| Rating::new(user, item, value))
            })
            .collect();

        if kept.is_empty() {
            return Err(RecomendarError::empty_input(
                "no users satisfy the minimum rating count",
            ));
        }
        Self::from_ratings(&kept)
    }

    /// Observed (min, max) rating values.
    #[must_use]
    pub fn rating_bounds(&self) -> (f32, f32) {
        let mut lo = f32::INFINITY;
        let mut hi = f32::NEG_INFINITY;
        for row in &self.rows {
            for &(_, v) in row {
                lo = lo.min(v);
                hi = hi.max(v);
            }
        }
        (lo, hi)
    }

    /// Per-item rating count and mean, in ascending item order.
    ///
    /// Items with zero raters cannot occur: the item set is derived from
    /// observed ratings at construction.
    #[must_use]
    pub fn item_stats(&self) -> Vec<ItemStats> {
        let mut sums = vec![(0usize, 0.0f32); self.item_ids.len()];
        for row in &self.rows {
            for &(item, value) in row {
                let idx = self.item_index[&item];
                sums[idx].0 += 1;
                sums[idx].1 += value;
            }
        }
        self.item_ids
            .iter()
            .zip(sums)
            .map(|(&item, (count, sum))| ItemStats {
                item,
                count,
                mean: sum / count as f32,
            })
            .collect()
    }

    /// Distribution of observed rating values as `(value, count)` pairs in
    /// ascending value order. Exported for reporting collaborators.
    #[must_use]
    pub fn rating_distribution(&self) -> Vec<(f32, usize)> {
        let mut counts: HashMap<u32, usize> = HashMap::new();
        for row in &self.rows {
            for &(_, v) in row {
                *counts.entry(v.to_bits()).or_insert(0) += 1;
            }
        }
        let mut dist: Vec<(f32, usize)> = counts
            .into_iter()
            .map(|(bits, count)| (f32::from_bits(bits), count))
            .collect();
        dist.sort_by(|a, b| a.0.total_cmp(&b.0));
        dist
    }

    /// Per-user observed rating counts as `(user, count)` pairs in ascending
    /// user order.
    #[must_use]
    pub fn user_rating_counts(&self) -> Vec<(u32, usize)> {
        self.user_ids
            .iter()
            .zip(self.rows.iter())
            .map(|(&user, row)| (user, row.len()))
            .collect()
    }
}
