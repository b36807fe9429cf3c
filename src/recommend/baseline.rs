//! Non-personalized baseline predictors.

use std::collections::HashMap;

use crate::error::{RecomendarError, Result};
use crate::ratings::SparseRatingMatrix;
use crate::traits::Recommender;

/// Item-popularity baseline.
///
/// Scores every item by its mean rating across all raters, so the ranking is
/// identical for every user except that already-rated items are suppressed.
///
/// # Examples
///
/// ```
/// use recomendar::prelude::*;
///
/// let matrix = SparseRatingMatrix::from_ratings(&[
///     Rating::new(1, 10, 5.0), Rating::new(1, 11, 2.0),
///     Rating::new(2, 10, 4.0), Rating::new(2, 12, 3.0),
/// ]).unwrap();
///
/// let mut model = Popularity::new();
/// model.fit(&matrix).unwrap();
///
/// // Item 10 has mean 4.5 but user 1 already rated it.
/// assert_eq!(model.top_n(1, 1).unwrap(), vec![12]);
/// assert_eq!(model.predict(1, 12).unwrap(), Some(3.0));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Popularity {
    fitted: Option<PopularityFitted>,
}

#[derive(Debug, Clone)]
struct PopularityFitted {
    matrix: SparseRatingMatrix,
    means: HashMap<u32, f32>,
}

impl Popularity {
    /// Create an unfitted popularity predictor.
    #[must_use]
    pub fn new() -> Self {
        Self { fitted: None }
    }

    fn fitted(&self) -> Result<&PopularityFitted> {
        self.fitted
            .as_ref()
            .ok_or_else(|| RecomendarError::from("Popularity model is not fitted"))
    }
}

impl Recommender for Popularity {
    fn fit(&mut self, matrix: &SparseRatingMatrix) -> Result<()> {
        let means = matrix
            .item_stats()
            .into_iter()
            .map(|s| (s.item, s.mean))
            .collect();
        self.fitted = Some(PopularityFitted {
            matrix: matrix.clone(),
            means,
        });
        Ok(())
    }

    fn predict(&self, user: u32, item: u32) -> Result<Option<f32>> {
        let fitted = self.fitted()?;
        if !fitted.matrix.contains_user(user) {
            return Err(RecomendarError::unknown_user(user));
        }
        if !fitted.matrix.contains_item(item) {
            return Err(RecomendarError::unknown_item(item));
        }
        // Already-rated items are suppressed, matching the top-N behavior.
        if fitted.matrix.get(user, item).is_some() {
            return Ok(None);
        }
        Ok(fitted.means.get(&item).copied())
    }

    fn top_n(&self, user: u32, n: usize) -> Result<Vec<u32>> {
        let fitted = self.fitted()?;
        super::rank_unseen(&fitted.matrix, user, n, |item| {
            fitted.means.get(&item).copied()
        })
    }

    fn name(&self) -> &'static str {
        "POPULAR"
    }
}

/// Seeded uniform-random baseline.
///
/// Scores each cell with a uniform draw from the observed rating range. The
/// value is a pure function of (seed, user, item), a hash rather than a
/// stateful RNG stream, so predictions do not depend on query order and a
/// fixed seed reproduces identical top-N lists across runs.
///
/// # Examples
///
/// ```
/// use recomendar::prelude::*;
///
/// let matrix = SparseRatingMatrix::from_ratings(&[
///     Rating::new(1, 10, 1.0), Rating::new(1, 11, 5.0),
///     Rating::new(2, 12, 3.0),
/// ]).unwrap();
///
/// let mut model = RandomRating::new().with_random_state(42);
/// model.fit(&matrix).unwrap();
///
/// let v = model.predict(1, 12).unwrap().unwrap();
/// assert!((1.0..=5.0).contains(&v));
/// assert_eq!(model.predict(1, 12).unwrap(), Some(v)); // reproducible
/// ```
#[derive(Debug, Clone)]
pub struct RandomRating {
    seed: u64,
    fitted: Option<RandomFitted>,
}

#[derive(Debug, Clone)]
struct RandomFitted {
    matrix: SparseRatingMatrix,
    lo: f32,
    hi: f32,
}

impl Default for RandomRating {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomRating {
    /// Create a random predictor with seed 0.
    #[must_use]
    pub fn new() -> Self {
        Self {
            seed: 0,
            fitted: None,
        }
    }

    /// Set the seed that fixes every cell's draw.
    #[must_use]
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    fn fitted(&self) -> Result<&RandomFitted> {
        self.fitted
            .as_ref()
            .ok_or_else(|| RecomendarError::from("RandomRating model is not fitted"))
    }

    fn draw(&self, fitted: &RandomFitted, user: u32, item: u32) -> f32 {
        fitted.lo + cell_unit(self.seed, user, item) * (fitted.hi - fitted.lo)
    }
}

/// SplitMix64 finalizer over (seed, user, item), mapped into [0, 1).
fn cell_unit(seed: u64, user: u32, item: u32) -> f32 {
    let mut z = seed ^ ((u64::from(user) << 32) | u64::from(item));
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^= z >> 31;
    // Top 24 bits give a clean f32 fraction.
    (z >> 40) as f32 / (1u64 << 24) as f32
}

impl Recommender for RandomRating {
    fn fit(&mut self, matrix: &SparseRatingMatrix) -> Result<()> {
        let (lo, hi) = matrix.rating_bounds();
        self.fitted = Some(RandomFitted {
            matrix: matrix.clone(),
            lo,
            hi,
        });
        Ok(())
    }

    fn predict(&self, user: u32, item: u32) -> Result<Option<f32>> {
        let fitted = self.fitted()?;
        if !fitted.matrix.contains_user(user) {
            return Err(RecomendarError::unknown_user(user));
        }
        if !fitted.matrix.contains_item(item) {
            return Err(RecomendarError::unknown_item(item));
        }
        Ok(Some(self.draw(fitted, user, item)))
    }

    fn top_n(&self, user: u32, n: usize) -> Result<Vec<u32>> {
        let fitted = self.fitted()?;
        super::rank_unseen(&fitted.matrix, user, n, |item| {
            Some(self.draw(fitted, user, item))
        })
    }

    fn name(&self) -> &'static str {
        "RANDOM"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ratings::Rating;

    fn matrix() -> SparseRatingMatrix {
        SparseRatingMatrix::from_ratings(&[
            Rating::new(1, 10, 5.0),
            Rating::new(1, 11, 2.0),
            Rating::new(2, 10, 4.0),
            Rating::new(2, 12, 3.0),
            Rating::new(3, 11, 1.0),
            Rating::new(3, 12, 5.0),
        ])
        .expect("valid ratings")
    }

    #[test]
    fn test_popularity_predicts_item_mean() {
        let mut model = Popularity::new();
        model.fit(&matrix()).expect("fit succeeds");
        // Item 12 mean = (3 + 5) / 2 = 4, unseen by user 1.
        assert_eq!(model.predict(1, 12).expect("valid query"), Some(4.0));
    }

    #[test]
    fn test_popularity_suppresses_rated_items() {
        let mut model = Popularity::new();
        model.fit(&matrix()).expect("fit succeeds");
        assert_eq!(model.predict(1, 10).expect("valid query"), None);
    }

    #[test]
    fn test_popularity_ranking_is_global() {
        let mut model = Popularity::new();
        model.fit(&matrix()).expect("fit succeeds");
        // Means: item 10 → 4.5, item 11 → 1.5, item 12 → 4.0.
        // User 3's only unseen item is 10.
        assert_eq!(model.top_n(3, 2).expect("valid query"), vec![10]);
        // User 1's unseen set is only item 12.
        assert_eq!(model.top_n(1, 3).expect("valid query"), vec![12]);
    }

    #[test]
    fn test_popularity_unknown_entities() {
        let mut model = Popularity::new();
        model.fit(&matrix()).expect("fit succeeds");
        assert!(model.predict(42, 10).is_err());
        assert!(model.predict(1, 42).is_err());
    }

    #[test]
    fn test_random_within_bounds() {
        let mut model = RandomRating::new().with_random_state(7);
        model.fit(&matrix()).expect("fit succeeds");
        for &user in matrix().users() {
            for &item in matrix().items() {
                if let Some(v) = model.predict(user, item).expect("valid query") {
                    assert!((1.0..=5.0).contains(&v), "out of range: {v}");
                }
            }
        }
    }

    #[test]
    fn test_random_fixed_seed_reproducible() {
        let m = matrix();
        let mut a = RandomRating::new().with_random_state(42);
        let mut b = RandomRating::new().with_random_state(42);
        a.fit(&m).expect("fit succeeds");
        b.fit(&m).expect("fit succeeds");
        assert_eq!(
            a.top_n(1, 3).expect("valid query"),
            b.top_n(1, 3).expect("valid query")
        );
        assert_eq!(
            a.predict(2, 11).expect("valid query"),
            b.predict(2, 11).expect("valid query")
        );
    }

    #[test]
    fn test_random_different_seeds_diverge() {
        let m = matrix();
        let mut a = RandomRating::new().with_random_state(1);
        let mut b = RandomRating::new().with_random_state(2);
        a.fit(&m).expect("fit succeeds");
        b.fit(&m).expect("fit succeeds");
        let va: Vec<Option<f32>> = m
            .items()
            .iter()
            .map(|&i| a.predict(3, i).expect("valid query"))
            .collect();
        let vb: Vec<Option<f32>> = m
            .items()
            .iter()
            .map(|&i| b.predict(3, i).expect("valid query"))
            .collect();
        assert_ne!(va, vb);
    }

    #[test]
    fn test_random_order_independent() {
        let m = matrix();
        let mut model = RandomRating::new().with_random_state(9);
        model.fit(&m).expect("fit succeeds");
        let first = model.predict(1, 12).expect("valid query");
        // Interleave other queries; the cell's value must not drift.
        let _ = model.predict(3, 10);
        let _ = model.top_n(2, 2);
        assert_eq!(model.predict(1, 12).expect("valid query"), first);
    }

    #[test]
    fn test_unfitted_baselines_error() {
        assert!(Popularity::new().predict(1, 10).is_err());
        assert!(RandomRating::new().top_n(1, 3).is_err());
    }

    #[test]
    fn test_names() {
        assert_eq!(Popularity::new().name(), "POPULAR");
        assert_eq!(RandomRating::new().name(), "RANDOM");
    }
}
