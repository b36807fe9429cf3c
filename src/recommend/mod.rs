//! Rating predictors.
//!
//! Three interchangeable predictors behind the [`Recommender`](crate::traits::Recommender)
//! trait:
//!
//! - [`UserBased`]: user-based collaborative filtering (neighborhood-weighted
//!   averages over the k most similar users)
//! - [`Popularity`]: item-mean baseline, identical ranking for every user
//! - [`RandomRating`]: seeded uniform baseline, the lower bound any real
//!   predictor must beat
//!
//! # Quick Start
//!
//! ```
//! use recomendar::prelude::*;
//!
//! let matrix = SparseRatingMatrix::from_ratings(&[
//!     Rating::new(1, 10, 5.0), Rating::new(1, 11, 3.0),
//!     Rating::new(2, 10, 5.0), Rating::new(2, 11, 4.0), Rating::new(2, 12, 2.0),
//!     Rating::new(3, 10, 1.0), Rating::new(3, 11, 1.0),
//! ]).unwrap();
//!
//! let mut ubcf = UserBased::new().with_k(1);
//! ubcf.fit(&matrix).unwrap();
//!
//! // User 1's sole nearest neighbor is user 2, the only rater of item 12.
//! assert_eq!(ubcf.predict(1, 12).unwrap(), Some(2.0));
//! assert_eq!(ubcf.top_n(1, 1).unwrap(), vec![12]);
//! ```

mod baseline;
mod user_based;

pub use baseline::{Popularity, RandomRating};
pub use user_based::UserBased;

use crate::error::{RecomendarError, Result};
use crate::ratings::SparseRatingMatrix;

/// Rank the items `user` has not rated by a per-item score, descending,
/// ties broken by ascending item id, truncated to `n`. Items the scorer
/// cannot score are left out.
pub(crate) fn rank_unseen<F>(
    matrix: &SparseRatingMatrix,
    user: u32,
    n: usize,
    score: F,
) -> Result<Vec<u32>>
where
    F: Fn(u32) -> Option<f32>,
{
    if n == 0 {
        return Err(RecomendarError::invalid_parameter("n", n, ">= 1"));
    }
    let rated = matrix
        .user_ratings(user)
        .ok_or_else(|| RecomendarError::unknown_user(user))?;

    let mut scored: Vec<(u32, f32)> = matrix
        .items()
        .iter()
        .filter(|&&item| rated.binary_search_by_key(&item, |&(i, _)| i).is_err())
        .filter_map(|&item| score(item).map(|s| (item, s)))
        .collect();

    scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    scored.truncate(n);
    Ok(scored.into_iter().map(|(item, _)| item).collect())
}
