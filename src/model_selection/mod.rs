//! Train/test partitioning under the given-k hidden-ratings protocol.
//!
//! An [`EvaluationScheme`] partitions users into train and test sets, then
//! hides all but `given` of each test user's ratings. Predictors are fitted
//! on the resulting "given-only" view; the hidden remainder is the ground
//! truth the evaluator scores against and is never reachable from the train
//! view.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::{RecomendarError, Result};
use crate::ratings::{Rating, SparseRatingMatrix};

/// Deterministic train/test splitter with the given-k protocol.
///
/// All randomness flows from one explicit seed, so the same (matrix,
/// parameters, seed) triple always produces the identical split.
///
/// A test user whose row cannot yield both `given` visible ratings *and* at
/// least one held-out rating is excluded from the test set and reported via
/// [`RatingSplit::skipped_users`]; evaluation proceeds on the rest. Only
/// when the exclusion empties the whole test set does `split` fail with
/// [`RecomendarError::InsufficientData`].
///
/// # Examples
///
/// ```
/// use recomendar::prelude::*;
///
/// let ratings: Vec<Rating> = (0..10u32)
///     .flat_map(|u| (0..8u32).map(move |i| Rating::new(u, i, f32::from(((u + i) % 5 + 1) as u8))))
///     .collect();
/// let matrix = SparseRatingMatrix::from_ratings(&ratings).unwrap();
///
/// let scheme = EvaluationScheme::new(0.8, 5, 4.0).with_random_state(42);
/// let split = scheme.split(&matrix).unwrap();
///
/// for &user in split.test_users() {
///     assert_eq!(split.train().user_rating_count(user), Some(5));
///     assert!(!split.held_out(user).unwrap().is_empty());
/// }
/// ```
#[derive(Debug, Clone)]
pub struct EvaluationScheme {
    train_fraction: f32,
    given: usize,
    good_rating: f32,
    seed: u64,
}

impl EvaluationScheme {
    /// Create a scheme. `train_fraction` is the share of users whose full
    /// rows stay visible; `given` is the number of visible ratings per test
    /// user; `good_rating` is the relevance threshold consumed by ranking
    /// metrics. Seed defaults to 0.
    #[must_use]
    pub fn new(train_fraction: f32, given: usize, good_rating: f32) -> Self {
        Self {
            train_fraction,
            given,
            good_rating,
            seed: 0,
        }
    }

    /// Set the random seed for reproducible partitioning.
    #[must_use]
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Partition `matrix` into the given-only train view plus held-out
    /// ground truth.
    ///
    /// # Errors
    ///
    /// - [`RecomendarError::InvalidParameter`] if `train_fraction` is outside
    ///   (0, 1), `given` is zero, `good_rating` is not finite, or the user
    ///   partition would leave train or test empty.
    /// - [`RecomendarError::InsufficientData`] if every test user had to be
    ///   skipped.
    pub fn split(&self, matrix: &SparseRatingMatrix) -> Result<RatingSplit> {
        if !(self.train_fraction > 0.0 && self.train_fraction < 1.0) {
            return Err(RecomendarError::invalid_parameter(
                "train_fraction",
                self.train_fraction,
                "a value in (0, 1)",
            ));
        }
        if self.given == 0 {
            return Err(RecomendarError::invalid_parameter("given", self.given, ">= 1"));
        }
        if !self.good_rating.is_finite() {
            return Err(RecomendarError::invalid_parameter(
                "good_rating",
                self.good_rating,
                "a finite value",
            ));
        }

        let mut users = matrix.users().to_vec();
        let n_users = users.len();
        let mut rng = StdRng::seed_from_u64(self.seed);
        users.shuffle(&mut rng);

        let n_train = (n_users as f32 * self.train_fraction).round() as usize;
        if n_train == 0 || n_train == n_users {
            return Err(RecomendarError::invalid_parameter(
                "train_fraction",
                self.train_fraction,
                "a partition with at least one train and one test user",
            ));
        }
        let (train_users, test_candidates) = users.split_at(n_train);

        let mut train_ratings: Vec<Rating> = Vec::with_capacity(matrix.n_ratings());
        for &user in train_users {
            let row = matrix
                .user_ratings(user)
                .expect("user id comes from the matrix itself");
            train_ratings.extend(
                row.iter()
                    .map(|&(item, value)| Rating::new(user, item, value)),
            );
        }

        let mut held_out: BTreeMap<u32, Vec<(u32, f32)>> = BTreeMap::new();
        let mut test_users = Vec::new();
        let mut skipped_users = Vec::new();
        let mut max_available = 0usize;

        for &user in test_candidates {
            let row = matrix
                .user_ratings(user)
                .expect("user id comes from the matrix itself");
            max_available = max_available.max(row.len());
            // Needs `given` visible ratings plus a non-empty held-out rest.
            if row.len() <= self.given {
                skipped_users.push(user);
                continue;
            }

            let mut indices: Vec<usize> = (0..row.len()).collect();
            indices.shuffle(&mut rng);
            let (given_idx, held_idx) = indices.split_at(self.given);

            for &i in given_idx {
                train_ratings.push(Rating::new(user, row[i].0, row[i].1));
            }
            let mut held: Vec<(u32, f32)> = held_idx.iter().map(|&i| row[i]).collect();
            held.sort_unstable_by_key(|&(item, _)| item);
            held_out.insert(user, held);
            test_users.push(user);
        }

        if test_users.is_empty() {
            return Err(RecomendarError::InsufficientData {
                context: "every test user was skipped: no row can satisfy the given \
                          constraint and still retain a held-out rating"
                    .to_string(),
                required: self.given + 1,
                available: max_available,
            });
        }

        test_users.sort_unstable();
        skipped_users.sort_unstable();
        let train = SparseRatingMatrix::from_ratings(&train_ratings)?;

        Ok(RatingSplit {
            train,
            held_out,
            test_users,
            skipped_users,
            good_rating: self.good_rating,
        })
    }
}

/// The outcome of an [`EvaluationScheme`] split.
///
/// Owns the given-only train view and the held-out ground truth; nothing in
/// `train` reveals a held-out rating.
#[derive(Debug, Clone)]
pub struct RatingSplit {
    train: SparseRatingMatrix,
    held_out: BTreeMap<u32, Vec<(u32, f32)>>,
    test_users: Vec<u32>,
    skipped_users: Vec<u32>,
    good_rating: f32,
}

impl RatingSplit {
    /// The matrix predictors fit on: train users' full rows plus test users'
    /// given ratings.
    #[must_use]
    pub fn train(&self) -> &SparseRatingMatrix {
        &self.train
    }

    /// A test user's held-out ground truth as item-sorted `(item, value)`
    /// pairs.
    #[must_use]
    pub fn held_out(&self, user: u32) -> Option<&[(u32, f32)]> {
        self.held_out.get(&user).map(Vec::as_slice)
    }

    /// Test users that survived the given constraint, ascending.
    #[must_use]
    pub fn test_users(&self) -> &[u32] {
        &self.test_users
    }

    /// Test-set candidates excluded for lacking `given + 1` ratings.
    #[must_use]
    pub fn skipped_users(&self) -> &[u32] {
        &self.skipped_users
    }

    /// Threshold above which a held-out rating counts as relevant.
    #[must_use]
    pub fn good_rating(&self) -> f32 {
        self.good_rating
    }

    /// Total number of held-out ground-truth cells.
    #[must_use]
    pub fn n_held_out(&self) -> usize {
        self.held_out.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dense_matrix(n_users: u32, n_items: u32) -> SparseRatingMatrix {
        let ratings: Vec<Rating> = (0..n_users)
            .flat_map(|u| {
                (0..n_items).map(move |i| Rating::new(u, i, ((u + i) % 5 + 1) as f32))
            })
            .collect();
        SparseRatingMatrix::from_ratings(&ratings).expect("valid ratings")
    }

    #[test]
    fn test_split_partitions_users() {
        let m = dense_matrix(10, 8);
        let scheme = EvaluationScheme::new(0.8, 5, 4.0).with_random_state(42);
        let split = scheme.split(&m).expect("valid split");

        assert_eq!(split.test_users().len(), 2);
        assert!(split.skipped_users().is_empty());
        // Train view holds all 10 users: 8 full rows + 2 given-only rows.
        assert_eq!(split.train().n_users(), 10);
        assert_eq!(split.train().n_ratings(), 8 * 8 + 2 * 5);
    }

    #[test]
    fn test_given_rows_have_exactly_given_ratings() {
        let m = dense_matrix(10, 8);
        let scheme = EvaluationScheme::new(0.8, 5, 4.0).with_random_state(42);
        let split = scheme.split(&m).expect("valid split");
        for &user in split.test_users() {
            assert_eq!(split.train().user_rating_count(user), Some(5));
            assert_eq!(split.held_out(user).expect("test user").len(), 3);
        }
    }

    #[test]
    fn test_held_out_never_in_train() {
        let m = dense_matrix(12, 10);
        let scheme = EvaluationScheme::new(0.75, 4, 4.0).with_random_state(7);
        let split = scheme.split(&m).expect("valid split");
        for &user in split.test_users() {
            for &(item, _) in split.held_out(user).expect("test user") {
                assert_eq!(
                    split.train().get(user, item),
                    None,
                    "held-out cell ({user}, {item}) leaked into the train view"
                );
            }
        }
    }

    #[test]
    fn test_same_seed_identical_split() {
        let m = dense_matrix(10, 8);
        let scheme = EvaluationScheme::new(0.8, 5, 4.0).with_random_state(42);
        let a = scheme.split(&m).expect("valid split");
        let b = scheme.split(&m).expect("valid split");

        assert_eq!(a.test_users(), b.test_users());
        for &user in a.test_users() {
            assert_eq!(a.held_out(user), b.held_out(user));
            assert_eq!(
                a.train().user_ratings(user),
                b.train().user_ratings(user)
            );
        }
    }

    #[test]
    fn test_different_seeds_differ() {
        let m = dense_matrix(20, 8);
        let a = EvaluationScheme::new(0.5, 5, 4.0)
            .with_random_state(1)
            .split(&m)
            .expect("valid split");
        let b = EvaluationScheme::new(0.5, 5, 4.0)
            .with_random_state(2)
            .split(&m)
            .expect("valid split");
        // With 20 users split 10/10, identical partitions under two seeds
        // would be astonishing.
        assert_ne!(a.test_users(), b.test_users());
    }

    #[test]
    fn test_short_rows_skipped_and_counted() {
        let mut ratings = Vec::new();
        // Users 0..=7 rate 8 items; users 8 and 9 rate only 3.
        for u in 0..8u32 {
            for i in 0..8u32 {
                ratings.push(Rating::new(u, i, 3.0 + (i % 3) as f32));
            }
        }
        for u in 8..10u32 {
            for i in 0..3u32 {
                ratings.push(Rating::new(u, i, 4.0));
            }
        }
        let m = SparseRatingMatrix::from_ratings(&ratings).expect("valid ratings");

        // Probe seeds until the test partition contains a short-row user;
        // skipped users must then be reported, not silently dropped.
        for seed in 0..50u64 {
            let scheme = EvaluationScheme::new(0.8, 5, 4.0).with_random_state(seed);
            match scheme.split(&m) {
                Ok(split) => {
                    for &u in split.skipped_users() {
                        assert!(u >= 8, "user {u} has enough ratings to split");
                        assert!(!split.test_users().contains(&u));
                    }
                }
                // Both sampled test users can be short-row users, which
                // legitimately empties the test set.
                Err(e) => {
                    assert!(matches!(e, RecomendarError::InsufficientData { .. }));
                }
            }
        }
    }

    #[test]
    fn test_all_test_users_skipped_is_insufficient_data() {
        // Every user has exactly `given` ratings: nothing can be held out.
        let m = dense_matrix(10, 5);
        let scheme = EvaluationScheme::new(0.8, 5, 4.0).with_random_state(3);
        let err = scheme.split(&m).unwrap_err();
        assert!(matches!(
            err,
            RecomendarError::InsufficientData {
                required: 6,
                available: 5,
                ..
            }
        ));
    }

    #[test]
    fn test_invalid_parameters_rejected() {
        let m = dense_matrix(10, 8);
        for bad_fraction in [0.0, 1.0, -0.5, 1.5] {
            let err = EvaluationScheme::new(bad_fraction, 5, 4.0)
                .split(&m)
                .unwrap_err();
            assert!(matches!(err, RecomendarError::InvalidParameter { .. }));
        }
        let err = EvaluationScheme::new(0.8, 0, 4.0).split(&m).unwrap_err();
        assert!(matches!(err, RecomendarError::InvalidParameter { .. }));
        let err = EvaluationScheme::new(0.8, 5, f32::NAN).split(&m).unwrap_err();
        assert!(matches!(err, RecomendarError::InvalidParameter { .. }));
    }

    #[test]
    fn test_tiny_partition_rejected() {
        // Two users at 0.9 rounds to 2 train users and an empty test set.
        let m = dense_matrix(2, 8);
        let err = EvaluationScheme::new(0.9, 3, 4.0).split(&m).unwrap_err();
        assert!(matches!(err, RecomendarError::InvalidParameter { .. }));
    }

    #[test]
    fn test_n_held_out() {
        let m = dense_matrix(10, 8);
        let scheme = EvaluationScheme::new(0.8, 5, 4.0).with_random_state(42);
        let split = scheme.split(&m).expect("valid split");
        assert_eq!(split.n_held_out(), 2 * 3);
    }
}
