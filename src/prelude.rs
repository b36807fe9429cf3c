//! Convenience re-exports for common usage.
//!
//! # Usage
//!
//! ```
//! use recomendar::prelude::*;
//! ```

pub use crate::error::{RecomendarError, Result};
pub use crate::evaluate::{EvaluationResult, Evaluator};
pub use crate::metrics::{mae, mse, rmse};
pub use crate::model_selection::{EvaluationScheme, RatingSplit};
pub use crate::ratings::{Rating, SparseRatingMatrix};
pub use crate::recommend::{Popularity, RandomRating, UserBased};
pub use crate::similarity::Similarity;
pub use crate::traits::Recommender;
