//! Per-user rating normalization.
//!
//! Z-score centering/scaling of each user's row over **observed** entries
//! only, with an exact inverse for mapping predictions back into rating
//! space, and a binarize variant for exploratory representations.
//! Unobserved cells stay unobserved through every transform.

use std::collections::HashMap;

use crate::error::{RecomendarError, Result};
use crate::ratings::{Rating, SparseRatingMatrix};

/// Row normalization strategy for predictors that support it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Normalization {
    /// Use raw ratings unchanged.
    #[default]
    None,
    /// Per-user z-score over observed entries.
    ZScore,
}

/// Per-user normalization statistics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowStats {
    /// Mean of the user's observed ratings
    pub mean: f32,
    /// Population standard deviation of the user's observed ratings
    pub std: f32,
}

/// A z-score normalized view over a [`SparseRatingMatrix`].
///
/// Owns a normalized copy plus the per-user `(mean, std)` pairs needed to
/// invert the transform. The source matrix is never mutated.
///
/// Rows whose ratings are all identical (`std == 0`) normalize to `0.0` for
/// every observed cell rather than dividing by zero; `denormalize` maps those
/// rows back to their mean. This is a documented edge case, not an error.
///
/// # Examples
///
/// ```
/// use recomendar::ratings::{Rating, SparseRatingMatrix};
/// use recomendar::preprocessing::NormalizedMatrix;
///
/// let matrix = SparseRatingMatrix::from_ratings(&[
///     Rating::new(1, 10, 1.0),
///     Rating::new(1, 11, 3.0),
///     Rating::new(1, 12, 5.0),
/// ]).unwrap();
///
/// let normalized = NormalizedMatrix::normalize(&matrix);
/// assert_eq!(normalized.matrix().get(1, 11), Some(0.0)); // 3.0 is the row mean
///
/// let stats = normalized.stats(1).unwrap();
/// assert!((stats.mean - 3.0).abs() < 1e-6);
/// ```
#[derive(Debug, Clone)]
pub struct NormalizedMatrix {
    matrix: SparseRatingMatrix,
    stats: HashMap<u32, RowStats>,
}

impl NormalizedMatrix {
    /// Z-score normalize every user row of `source`.
    #[must_use]
    pub fn normalize(source: &SparseRatingMatrix) -> Self {
        let mut stats = HashMap::with_capacity(source.n_users());
        let mut transformed = Vec::with_capacity(source.n_ratings());

        for &user in source.users() {
            let row = source
                .user_ratings(user)
                .expect("user id comes from the matrix itself");
            let n = row.len() as f32;
            let mean = row.iter().map(|&(_, v)| v).sum::<f32>() / n;
            // Population std, matching the scaler convention used elsewhere.
            let var = row.iter().map(|&(_, v)| (v - mean).powi(2)).sum::<f32>() / n;
            let std = var.sqrt();
            stats.insert(user, RowStats { mean, std });

            for &(item, value) in row {
                let z = if std > 1e-10 { (value - mean) / std } else { 0.0 };
                transformed.push(Rating::new(user, item, z));
            }
        }

        let matrix = SparseRatingMatrix::from_ratings(&transformed)
            .expect("source matrix is non-empty and duplicate-free");
        Self { matrix, stats }
    }

    /// The normalized matrix. Same shape and observed cells as the source.
    #[must_use]
    pub fn matrix(&self) -> &SparseRatingMatrix {
        &self.matrix
    }

    /// Normalization statistics for one user.
    #[must_use]
    pub fn stats(&self, user: u32) -> Option<&RowStats> {
        self.stats.get(&user)
    }

    /// Map a value in a user's normalized space back into rating space.
    ///
    /// Inverts the forward transform: `value * std + mean`, with zero-std
    /// rows inverting to the row mean.
    ///
    /// # Errors
    ///
    /// [`RecomendarError::UnknownEntity`] if the user has no stats.
    pub fn denormalize(&self, user: u32, value: f32) -> Result<f32> {
        let stats = self
            .stats
            .get(&user)
            .ok_or_else(|| RecomendarError::unknown_user(user))?;
        if stats.std > 1e-10 {
            Ok(value * stats.std + stats.mean)
        } else {
            Ok(stats.mean)
        }
    }
}

/// Map observed ratings to 1.0 (≥ threshold) or 0.0, preserving unobserved
/// cells as unobserved.
///
/// Exploratory representation only; the collaborative-filtering predictors
/// consume raw or z-score ratings.
///
/// # Errors
///
/// [`RecomendarError::InvalidParameter`] if `threshold` is not finite.
///
/// # Examples
///
/// ```
/// use recomendar::ratings::{Rating, SparseRatingMatrix};
/// use recomendar::preprocessing::binarize;
///
/// let matrix = SparseRatingMatrix::from_ratings(&[
///     Rating::new(1, 10, 5.0),
///     Rating::new(1, 11, 2.0),
/// ]).unwrap();
///
/// let binary = binarize(&matrix, 3.0).unwrap();
/// assert_eq!(binary.get(1, 10), Some(1.0));
/// assert_eq!(binary.get(1, 11), Some(0.0));
/// assert_eq!(binary.get(1, 12), None);
/// ```
pub fn binarize(matrix: &SparseRatingMatrix, threshold: f32) -> Result<SparseRatingMatrix> {
    if !threshold.is_finite() {
        return Err(RecomendarError::invalid_parameter(
            "threshold",
            threshold,
            "a finite value",
        ));
    }
    let ratings: Vec<Rating> = matrix
        .iter()
        .map(|(user, item, value)| {
            Rating::new(user, item, if value >= threshold { 1.0 } else { 0.0 })
        })
        .collect();
    SparseRatingMatrix::from_ratings(&ratings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix() -> SparseRatingMatrix {
        SparseRatingMatrix::from_ratings(&[
            Rating::new(1, 10, 1.0),
            Rating::new(1, 11, 3.0),
            Rating::new(1, 12, 5.0),
            Rating::new(2, 10, 4.0),
            Rating::new(2, 11, 4.0),
        ])
        .expect("valid ratings")
    }

    #[test]
    fn test_normalized_rows_have_mean_zero() {
        let normalized = NormalizedMatrix::normalize(&matrix());
        let row = normalized.matrix().user_ratings(1).expect("user exists");
        let mean: f32 = row.iter().map(|&(_, v)| v).sum::<f32>() / row.len() as f32;
        assert!(mean.abs() < 1e-6);
    }

    #[test]
    fn test_constant_row_normalizes_to_zero() {
        let normalized = NormalizedMatrix::normalize(&matrix());
        // user 2 rated everything 4.0
        let row = normalized.matrix().user_ratings(2).expect("user exists");
        for &(_, v) in row {
            assert_eq!(v, 0.0);
            assert!(!v.is_nan());
        }
    }

    #[test]
    fn test_unobserved_stays_unobserved() {
        let normalized = NormalizedMatrix::normalize(&matrix());
        assert_eq!(normalized.matrix().get(2, 12), None);
        assert_eq!(normalized.matrix().n_ratings(), 5);
    }

    #[test]
    fn test_source_not_mutated() {
        let m = matrix();
        let _ = NormalizedMatrix::normalize(&m);
        assert_eq!(m.get(1, 10), Some(1.0));
    }

    #[test]
    fn test_denormalize_round_trip() {
        let m = matrix();
        let normalized = NormalizedMatrix::normalize(&m);
        for (user, item, original) in m.iter() {
            let z = normalized.matrix().get(user, item).expect("cell observed");
            let back = normalized.denormalize(user, z).expect("user known");
            assert!(
                (back - original).abs() < 1e-5,
                "round trip failed for ({user}, {item}): {back} vs {original}"
            );
        }
    }

    #[test]
    fn test_denormalize_constant_row_returns_mean() {
        let normalized = NormalizedMatrix::normalize(&matrix());
        let back = normalized.denormalize(2, 0.0).expect("user known");
        assert!((back - 4.0).abs() < 1e-6);
    }

    #[test]
    fn test_denormalize_unknown_user() {
        let normalized = NormalizedMatrix::normalize(&matrix());
        let err = normalized.denormalize(99, 0.0).unwrap_err();
        assert!(matches!(
            err,
            RecomendarError::UnknownEntity { id: 99, .. }
        ));
    }

    #[test]
    fn test_binarize() {
        let binary = binarize(&matrix(), 4.0).expect("finite threshold");
        assert_eq!(binary.get(1, 10), Some(0.0));
        assert_eq!(binary.get(1, 12), Some(1.0));
        assert_eq!(binary.get(2, 10), Some(1.0));
        assert_eq!(binary.get(2, 12), None);
    }

    #[test]
    fn test_binarize_rejects_non_finite_threshold() {
        let err = binarize(&matrix(), f32::NAN).unwrap_err();
        assert!(matches!(err, RecomendarError::InvalidParameter { .. }));
    }

    #[test]
    fn test_normalization_default() {
        assert_eq!(Normalization::default(), Normalization::None);
    }
}
