//! Core trait for rating predictors.
//!
//! This trait defines the API contract shared by all recommenders.

use crate::error::Result;
use crate::ratings::SparseRatingMatrix;

/// Capability set shared by every predictor: fit on a rating matrix, then
/// predict per-cell ratings and rank top-N lists.
///
/// Predictors are immutable after `fit` and hold no interior mutability, so
/// distinct users may be scored concurrently over shared references; the
/// `Send + Sync` bound encodes that contract.
///
/// # Examples
///
/// ```
/// use recomendar::prelude::*;
///
/// let matrix = SparseRatingMatrix::from_ratings(&[
///     Rating::new(1, 10, 5.0), Rating::new(1, 11, 3.0),
///     Rating::new(2, 10, 5.0), Rating::new(2, 11, 4.0), Rating::new(2, 12, 2.0),
/// ]).unwrap();
///
/// let mut model = UserBased::new().with_k(1);
/// model.fit(&matrix).unwrap();
///
/// let predicted = model.predict(1, 12).unwrap();
/// assert_eq!(predicted, Some(2.0));
/// ```
pub trait Recommender: Send + Sync {
    /// Fits the predictor to a rating matrix.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid for the matrix.
    fn fit(&mut self, matrix: &SparseRatingMatrix) -> Result<()>;

    /// Predicted rating for one cell.
    ///
    /// `Ok(None)` means "no prediction available" for this cell: an
    /// expected, countable outcome, not a failure.
    ///
    /// # Errors
    ///
    /// [`crate::error::RecomendarError::UnknownEntity`] if the user or item
    /// is absent from the fitted matrix, or an error if the predictor is not
    /// fitted.
    fn predict(&self, user: u32, item: u32) -> Result<Option<f32>>;

    /// The top-`n` items for `user` among items the user has not rated,
    /// ranked by predicted score descending, ties broken by ascending item
    /// id. Returns fewer than `n` items when fewer are scoreable.
    ///
    /// # Errors
    ///
    /// [`crate::error::RecomendarError::InvalidParameter`] for `n == 0`,
    /// [`crate::error::RecomendarError::UnknownEntity`] for an unknown user.
    fn top_n(&self, user: u32, n: usize) -> Result<Vec<u32>>;

    /// Short predictor label used in evaluation tables.
    fn name(&self) -> &'static str;
}
