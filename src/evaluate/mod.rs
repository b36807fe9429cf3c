//! Evaluation of predictors against held-out ground truth.
//!
//! The [`Evaluator`] runs one or more fitted predictors over a
//! [`RatingSplit`](crate::model_selection::RatingSplit) and produces:
//!
//! - **Ratings accuracy**: RMSE/MAE over every held-out cell the predictor
//!   could score. Cells with no prediction are excluded from the error and
//!   counted in `n_unpredicted`; silent exclusion would hide systematic
//!   prediction gaps.
//! - **Ranking accuracy**: precision, recall, TPR, and FPR per top-N cutoff,
//!   averaged unweighted across test users; the (FPR, TPR) pairs across the
//!   cutoff sweep trace the ROC curve.
//!
//! Per-user work shares no mutable state, so the per-user loops run under
//! rayon when the `parallel` feature is enabled.

use std::collections::HashSet;
use std::fmt::Write as _;

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::Serialize;

use crate::error::{RecomendarError, Result};
use crate::metrics::{mae, rmse};
use crate::model_selection::RatingSplit;
use crate::traits::Recommender;

/// RMSE/MAE over the evaluable held-out cells of one predictor.
///
/// `rmse`/`mae` are `None` when not a single held-out cell was predictable.
#[derive(Debug, Clone, Serialize)]
pub struct AccuracyReport {
    /// Predictor label
    pub predictor: String,
    /// Root mean squared error over evaluated cells
    pub rmse: Option<f32>,
    /// Mean absolute error over evaluated cells
    pub mae: Option<f32>,
    /// Held-out cells that received a prediction
    pub n_evaluated: usize,
    /// Held-out cells the predictor could not score
    pub n_unpredicted: usize,
}

impl AccuracyReport {
    /// Formatted table for terminal reporting.
    #[must_use]
    pub fn report(&self) -> String {
        let fmt = |v: Option<f32>| match v {
            Some(x) => format!("{x:.4}"),
            None => "n/a".to_string(),
        };
        format!(
            "Ratings accuracy ({})\n\
             ─────────────────────\n\
             RMSE:         {}\n\
             MAE:          {}\n\
             evaluated:    {}\n\
             unpredicted:  {}",
            self.predictor,
            fmt(self.rmse),
            fmt(self.mae),
            self.n_evaluated,
            self.n_unpredicted
        )
    }
}

/// Ranking quality at one top-N cutoff, averaged across test users.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RankingRow {
    /// The cutoff
    pub n: usize,
    /// Mean relevant-in-list / n
    pub precision: f32,
    /// Mean relevant-in-list / total-relevant, over users with ≥1 relevant
    pub recall: f32,
    /// True-positive rate (equals recall by construction)
    pub tpr: f32,
    /// Mean false positives / total non-relevant candidates
    pub fpr: f32,
}

/// Per-cutoff ranking table for one predictor.
#[derive(Debug, Clone, Serialize)]
pub struct RankingReport {
    /// Predictor label
    pub predictor: String,
    /// One row per requested cutoff, in request order
    pub rows: Vec<RankingRow>,
    /// Test users evaluated
    pub n_users: usize,
    /// Test users with no relevant held-out item (skipped for recall/TPR)
    pub n_users_without_relevant: usize,
}

impl RankingReport {
    /// Formatted per-cutoff table for terminal reporting.
    #[must_use]
    pub fn report(&self) -> String {
        let mut out = format!(
            "Ranking accuracy ({}, users={})\n\
             ──────────────────────────────────────────\n\
             {:>5} {:>10} {:>10} {:>10} {:>10}\n",
            self.predictor, self.n_users, "n", "precision", "recall", "tpr", "fpr"
        );
        for row in &self.rows {
            let _ = writeln!(
                out,
                "{:>5} {:>10.4} {:>10.4} {:>10.4} {:>10.4}",
                row.n, row.precision, row.recall, row.tpr, row.fpr
            );
        }
        out.pop();
        out
    }
}

/// Both metric families for one predictor.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationResult {
    /// Predictor label
    pub predictor: String,
    /// Ratings-accuracy table
    pub accuracy: AccuracyReport,
    /// Per-cutoff ranking table
    pub ranking: RankingReport,
}

/// Per-user accumulation for the accuracy pass.
struct UserAccuracy {
    pairs: Vec<(f32, f32)>,
    unpredicted: usize,
}

/// Per-user, per-cutoff counts for the ranking pass.
struct UserRanking {
    // (precision, recall-if-defined, fpr-if-defined) per cutoff
    per_cutoff: Vec<(f32, Option<f32>, Option<f32>)>,
    has_relevant: bool,
}

/// Runs predictors against a split and aggregates metrics across test users.
///
/// # Examples
///
/// ```
/// use recomendar::prelude::*;
///
/// let ratings: Vec<Rating> = (0..12u32)
///     .flat_map(|u| (0..10u32).map(move |i| Rating::new(u, i, ((u * 3 + i) % 5 + 1) as f32)))
///     .collect();
/// let matrix = SparseRatingMatrix::from_ratings(&ratings).unwrap();
/// let split = EvaluationScheme::new(0.75, 5, 4.0)
///     .with_random_state(42)
///     .split(&matrix)
///     .unwrap();
///
/// let evaluator = Evaluator::new(&split);
/// let mut predictors: Vec<Box<dyn Recommender>> = vec![
///     Box::new(UserBased::new().with_k(5)),
///     Box::new(Popularity::new()),
/// ];
/// let results = evaluator.evaluate(&mut predictors, &[1, 3, 5]).unwrap();
/// assert_eq!(results.len(), 2);
/// assert_eq!(results[0].ranking.rows.len(), 3);
/// ```
pub struct Evaluator<'a> {
    split: &'a RatingSplit,
}

impl<'a> Evaluator<'a> {
    /// Create an evaluator over a split.
    #[must_use]
    pub fn new(split: &'a RatingSplit) -> Self {
        Self { split }
    }

    /// Fit each predictor on the split's given-only train view, then run
    /// both metric families.
    ///
    /// # Errors
    ///
    /// Propagates fit failures and invalid cutoffs.
    pub fn evaluate(
        &self,
        predictors: &mut [Box<dyn Recommender>],
        cutoffs: &[usize],
    ) -> Result<Vec<EvaluationResult>> {
        let mut results = Vec::with_capacity(predictors.len());
        for predictor in predictors {
            predictor.fit(self.split.train())?;
            let accuracy = self.accuracy(predictor.as_ref())?;
            let ranking = self.ranking(predictor.as_ref(), cutoffs)?;
            results.push(EvaluationResult {
                predictor: predictor.name().to_string(),
                accuracy,
                ranking,
            });
        }
        Ok(results)
    }

    /// RMSE/MAE for one fitted predictor over all evaluable held-out cells.
    ///
    /// # Errors
    ///
    /// Propagates predictor errors other than per-cell absence (absence is
    /// counted, not fatal).
    pub fn accuracy(&self, predictor: &dyn Recommender) -> Result<AccuracyReport> {
        let per_user = |user: &u32| -> Result<UserAccuracy> {
            let user = *user;
            let mut pairs = Vec::new();
            let mut unpredicted = 0usize;
            let held_out = self
                .split
                .held_out(user)
                .expect("test user always has held-out ratings");
            for &(item, truth) in held_out {
                // An item rated only in held-out rows is invisible to the
                // fitted model; that is a counted gap, not an error.
                if !self.split.train().contains_item(item) {
                    unpredicted += 1;
                    continue;
                }
                match predictor.predict(user, item)? {
                    Some(pred) => pairs.push((pred, truth)),
                    None => unpredicted += 1,
                }
            }
            Ok(UserAccuracy { pairs, unpredicted })
        };

        #[cfg(feature = "parallel")]
        let collected: Result<Vec<UserAccuracy>> =
            self.split.test_users().par_iter().map(per_user).collect();
        #[cfg(not(feature = "parallel"))]
        let collected: Result<Vec<UserAccuracy>> =
            self.split.test_users().iter().map(per_user).collect();

        let mut preds = Vec::new();
        let mut truths = Vec::new();
        let mut n_unpredicted = 0usize;
        for user_result in collected? {
            n_unpredicted += user_result.unpredicted;
            for (p, t) in user_result.pairs {
                preds.push(p);
                truths.push(t);
            }
        }

        let (rmse_value, mae_value) = if preds.is_empty() {
            (None, None)
        } else {
            (Some(rmse(&preds, &truths)), Some(mae(&preds, &truths)))
        };

        Ok(AccuracyReport {
            predictor: predictor.name().to_string(),
            rmse: rmse_value,
            mae: mae_value,
            n_evaluated: preds.len(),
            n_unpredicted,
        })
    }

    /// Per-cutoff ranking metrics for one fitted predictor.
    ///
    /// Top-N lists range over items outside each user's given set. A listed
    /// item is relevant iff it has a held-out rating ≥ the scheme's
    /// `good_rating`. Precision divides by the cutoff `n`; users without any
    /// relevant held-out item are skipped for recall/TPR and counted.
    ///
    /// # Errors
    ///
    /// [`RecomendarError::InvalidParameter`] for an empty cutoff list or a
    /// zero cutoff; predictor errors propagate.
    pub fn ranking(
        &self,
        predictor: &dyn Recommender,
        cutoffs: &[usize],
    ) -> Result<RankingReport> {
        if cutoffs.is_empty() {
            return Err(RecomendarError::invalid_parameter(
                "cutoffs",
                "[]",
                "at least one cutoff",
            ));
        }
        if let Some(&zero) = cutoffs.iter().find(|&&n| n == 0) {
            return Err(RecomendarError::invalid_parameter("cutoffs", zero, ">= 1"));
        }
        let max_n = *cutoffs.iter().max().expect("cutoffs is non-empty");

        let per_user = |user: &u32| -> Result<UserRanking> {
            let user = *user;
            let top = predictor.top_n(user, max_n)?;
            let held_out = self
                .split
                .held_out(user)
                .expect("test user always has held-out ratings");
            let relevant: HashSet<u32> = held_out
                .iter()
                .filter(|&&(_, value)| value >= self.split.good_rating())
                .map(|&(item, _)| item)
                .collect();
            let given_count = self
                .split
                .train()
                .user_rating_count(user)
                .unwrap_or(0);
            let candidates = self.split.train().n_items().saturating_sub(given_count);
            let negatives = candidates.saturating_sub(relevant.len());

            let per_cutoff = cutoffs
                .iter()
                .map(|&n| {
                    let list = &top[..n.min(top.len())];
                    let tp = list.iter().filter(|item| relevant.contains(item)).count();
                    let fp = list.len() - tp;
                    let precision = tp as f32 / n as f32;
                    let recall = if relevant.is_empty() {
                        None
                    } else {
                        Some(tp as f32 / relevant.len() as f32)
                    };
                    let fpr = if negatives == 0 {
                        None
                    } else {
                        Some(fp as f32 / negatives as f32)
                    };
                    (precision, recall, fpr)
                })
                .collect();

            Ok(UserRanking {
                per_cutoff,
                has_relevant: !relevant.is_empty(),
            })
        };

        #[cfg(feature = "parallel")]
        let collected: Result<Vec<UserRanking>> =
            self.split.test_users().par_iter().map(per_user).collect();
        #[cfg(not(feature = "parallel"))]
        let collected: Result<Vec<UserRanking>> =
            self.split.test_users().iter().map(per_user).collect();
        let collected = collected?;

        let n_users = collected.len();
        let n_users_without_relevant =
            collected.iter().filter(|u| !u.has_relevant).count();

        let rows = cutoffs
            .iter()
            .enumerate()
            .map(|(idx, &n)| {
                let mut precision_sum = 0.0f32;
                let mut recall_sum = 0.0f32;
                let mut recall_count = 0usize;
                let mut fpr_sum = 0.0f32;
                let mut fpr_count = 0usize;
                for user_result in &collected {
                    let (precision, recall, fpr) = user_result.per_cutoff[idx];
                    precision_sum += precision;
                    if let Some(r) = recall {
                        recall_sum += r;
                        recall_count += 1;
                    }
                    if let Some(f) = fpr {
                        fpr_sum += f;
                        fpr_count += 1;
                    }
                }
                let precision = precision_sum / n_users as f32;
                let recall = if recall_count > 0 {
                    recall_sum / recall_count as f32
                } else {
                    0.0
                };
                let fpr = if fpr_count > 0 {
                    fpr_sum / fpr_count as f32
                } else {
                    0.0
                };
                RankingRow {
                    n,
                    precision,
                    recall,
                    tpr: recall,
                    fpr,
                }
            })
            .collect();

        Ok(RankingReport {
            predictor: predictor.name().to_string(),
            rows,
            n_users,
            n_users_without_relevant,
        })
    }
}
