//! Recomendar: collaborative-filtering recommendation engine in pure Rust.
//!
//! Recomendar turns a sparse user–item rating matrix into predicted ratings
//! and ranked top-N item lists, and measures both against held-out data
//! under the given-k evaluation protocol.
//!
//! # Quick Start
//!
//! ```
//! use recomendar::prelude::*;
//!
//! // A tiny rating matrix: users 1-3, items 10-12.
//! let matrix = SparseRatingMatrix::from_ratings(&[
//!     Rating::new(1, 10, 5.0), Rating::new(1, 11, 3.0),
//!     Rating::new(2, 10, 5.0), Rating::new(2, 11, 4.0), Rating::new(2, 12, 2.0),
//!     Rating::new(3, 10, 1.0), Rating::new(3, 11, 1.0),
//! ]).unwrap();
//!
//! // User-based collaborative filtering with a single nearest neighbor.
//! let mut model = UserBased::new().with_k(1);
//! model.fit(&matrix).unwrap();
//!
//! // User 2 is user 1's nearest neighbor and rated item 12 with 2.0.
//! assert_eq!(model.predict(1, 12).unwrap(), Some(2.0));
//! assert_eq!(model.top_n(1, 3).unwrap(), vec![12]);
//! ```
//!
//! # Modules
//!
//! - [`ratings`]: the sparse rating matrix and its accessors
//! - [`preprocessing`]: per-user z-score normalization and binarization
//! - [`similarity`]: cosine/Pearson similarity and neighborhood selection
//! - [`recommend`]: UBCF, popularity, and random predictors
//! - [`model_selection`]: deterministic train/test splitting (given-k protocol)
//! - [`metrics`]: RMSE/MAE accuracy metrics
//! - [`evaluate`]: the evaluation framework (accuracy + ranking tables)
//!
//! # Evaluation
//!
//! ```
//! use recomendar::prelude::*;
//!
//! let ratings: Vec<Rating> = (0..12u32)
//!     .flat_map(|u| (0..10u32).map(move |i| Rating::new(u, i, ((u * 3 + i) % 5 + 1) as f32)))
//!     .collect();
//! let matrix = SparseRatingMatrix::from_ratings(&ratings).unwrap();
//!
//! // 75/25 user split, 5 given ratings per test user, relevant = rating >= 4.
//! let split = EvaluationScheme::new(0.75, 5, 4.0)
//!     .with_random_state(42)
//!     .split(&matrix)
//!     .unwrap();
//!
//! let mut predictors: Vec<Box<dyn Recommender>> = vec![
//!     Box::new(UserBased::new().with_k(5)),
//!     Box::new(Popularity::new()),
//!     Box::new(RandomRating::new().with_random_state(42)),
//! ];
//! let results = Evaluator::new(&split).evaluate(&mut predictors, &[1, 3, 5]).unwrap();
//!
//! for result in &results {
//!     println!("{}", result.accuracy.report());
//!     println!("{}", result.ranking.report());
//! }
//! ```

pub mod error;
pub mod evaluate;
pub mod metrics;
pub mod model_selection;
pub mod prelude;
pub mod preprocessing;
pub mod ratings;
pub mod recommend;
pub mod similarity;
pub mod traits;
