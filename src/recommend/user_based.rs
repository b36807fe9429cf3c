//! User-based collaborative filtering.

use crate::error::{RecomendarError, Result};
use crate::preprocessing::{Normalization, NormalizedMatrix};
use crate::ratings::SparseRatingMatrix;
use crate::similarity::{neighbors, Similarity};
use crate::traits::Recommender;

/// User-based collaborative filtering (UBCF).
///
/// For a target user and item, the predicted rating is the
/// similarity-weighted average of the target's k nearest neighbors' ratings
/// for that item, restricted to neighbors who actually rated it. With
/// z-score normalization the averaging happens in each neighbor's normalized
/// space and the result is mapped back through the *target* user's row
/// statistics.
///
/// Neighbors with non-positive similarity carry no usable signal for a
/// weighted average and are skipped at accumulation time. A cell with no
/// contributing neighbor yields `Ok(None)`: "no prediction" is a countable
/// result, never coerced to a default.
///
/// # Examples
///
/// ```
/// use recomendar::prelude::*;
/// use recomendar::preprocessing::Normalization;
/// use recomendar::similarity::Similarity;
///
/// let matrix = SparseRatingMatrix::from_ratings(&[
///     Rating::new(1, 10, 5.0), Rating::new(1, 11, 3.0),
///     Rating::new(2, 10, 5.0), Rating::new(2, 11, 4.0), Rating::new(2, 12, 2.0),
///     Rating::new(3, 10, 1.0), Rating::new(3, 11, 1.0),
/// ]).unwrap();
///
/// let mut model = UserBased::new()
///     .with_k(2)
///     .with_similarity(Similarity::Cosine)
///     .with_normalization(Normalization::None);
/// model.fit(&matrix).unwrap();
///
/// assert!(model.predict(1, 12).unwrap().is_some());
/// ```
#[derive(Debug, Clone)]
pub struct UserBased {
    k: usize,
    similarity: Similarity,
    normalization: Normalization,
    fitted: Option<Fitted>,
}

#[derive(Debug, Clone)]
struct Fitted {
    matrix: SparseRatingMatrix,
    normalized: Option<NormalizedMatrix>,
}

impl Default for UserBased {
    fn default() -> Self {
        Self::new()
    }
}

impl UserBased {
    /// Create a UBCF predictor with default settings: k = 5, cosine
    /// similarity, no normalization.
    #[must_use]
    pub fn new() -> Self {
        Self {
            k: 5,
            similarity: Similarity::Cosine,
            normalization: Normalization::None,
            fitted: None,
        }
    }

    /// Set the neighborhood size.
    #[must_use]
    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    /// Set the similarity method.
    #[must_use]
    pub fn with_similarity(mut self, similarity: Similarity) -> Self {
        self.similarity = similarity;
        self
    }

    /// Set the rating normalization applied before similarity and averaging.
    #[must_use]
    pub fn with_normalization(mut self, normalization: Normalization) -> Self {
        self.normalization = normalization;
        self
    }

    fn fitted(&self) -> Result<&Fitted> {
        self.fitted
            .as_ref()
            .ok_or_else(|| RecomendarError::from("UserBased model is not fitted"))
    }

    /// The matrix neighborhoods and averages are computed over.
    fn working_matrix(fitted: &Fitted) -> &SparseRatingMatrix {
        match &fitted.normalized {
            Some(normalized) => normalized.matrix(),
            None => &fitted.matrix,
        }
    }

    /// Weighted average over neighbors who rated `item`, in working space.
    fn accumulate(
        working: &SparseRatingMatrix,
        nbrs: &[(u32, f32)],
        item: u32,
    ) -> Option<f32> {
        let mut num = 0.0f32;
        let mut den = 0.0f32;
        for &(nbr, sim) in nbrs {
            if sim <= 0.0 {
                continue;
            }
            if let Some(value) = working.get(nbr, item) {
                num += sim * value;
                den += sim;
            }
        }
        if den > 0.0 {
            Some(num / den)
        } else {
            None
        }
    }

    fn into_rating_space(fitted: &Fitted, user: u32, value: f32) -> Result<f32> {
        match &fitted.normalized {
            Some(normalized) => normalized.denormalize(user, value),
            None => Ok(value),
        }
    }
}

impl Recommender for UserBased {
    fn fit(&mut self, matrix: &SparseRatingMatrix) -> Result<()> {
        if self.k == 0 {
            return Err(RecomendarError::invalid_parameter("k", self.k, ">= 1"));
        }
        let normalized = match self.normalization {
            Normalization::None => None,
            Normalization::ZScore => Some(NormalizedMatrix::normalize(matrix)),
        };
        self.fitted = Some(Fitted {
            matrix: matrix.clone(),
            normalized,
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

        let working = Self::working_matrix(fitted);
        let nbrs = neighbors(working, user, self.k, self.similarity)?;
        match Self::accumulate(working, &nbrs, item) {
            Some(value) => Ok(Some(Self::into_rating_space(fitted, user, value)?)),
            None => Ok(None),
        }
    }

    fn top_n(&self, user: u32, n: usize) -> Result<Vec<u32>> {
        let fitted = self.fitted()?;
        if !fitted.matrix.contains_user(user) {
            return Err(RecomendarError::unknown_user(user));
        }

        let working = Self::working_matrix(fitted);
        // One neighborhood per user, shared across all candidate items.
        let nbrs = neighbors(working, user, self.k, self.similarity)?;
        super::rank_unseen(&fitted.matrix, user, n, |item| {
            Self::accumulate(working, &nbrs, item)
        })
    }

    fn name(&self) -> &'static str {
        "UBCF"
    }
}
