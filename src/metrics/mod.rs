//! Rating-prediction accuracy metrics.
//!
//! Slice-based MSE, RMSE, and MAE over aligned prediction/ground-truth
//! pairs. These operate on already-matched cells; pairing predictions with
//! held-out truth (and counting the unpredictable cells) is the evaluator's
//! job.

/// Computes the Mean Squared Error (MSE).
///
/// MSE = (1/n) * `Σ(truth - pred)²`
///
/// # Examples
///
/// ```
/// use recomendar::metrics::mse;
///
/// let error = mse(&[2.5, 0.0, 2.0], &[3.0, -0.5, 2.0]);
/// assert!(error < 1.0);
/// ```
///
/// # Panics
///
/// Panics if slices have different lengths or are empty.
#[must_use]
pub fn mse(pred: &[f32], truth: &[f32]) -> f32 {
    assert_eq!(pred.len(), truth.len(), "Slices must have same length");
    assert!(!truth.is_empty(), "Slices cannot be empty");

    let n = truth.len() as f32;
    let sum_sq: f32 = truth
        .iter()
        .zip(pred.iter())
        .map(|(t, p)| (t - p).powi(2))
        .sum();
    sum_sq / n
}

/// Computes the Root Mean Squared Error (RMSE).
///
/// RMSE = sqrt(MSE). Always ≥ MAE on the same input.
///
/// # Examples
///
/// ```
/// use recomendar::metrics::{mae, rmse};
///
/// let pred = [2.5, 0.0, 2.0, 8.0];
/// let truth = [3.0, -0.5, 2.0, 7.0];
/// assert!(rmse(&pred, &truth) >= mae(&pred, &truth));
/// ```
///
/// # Panics
///
/// Panics if slices have different lengths or are empty.
#[must_use]
pub fn rmse(pred: &[f32], truth: &[f32]) -> f32 {
    mse(pred, truth).sqrt()
}

/// Computes the Mean Absolute Error (MAE).
///
/// MAE = (1/n) * `Σ|truth - pred|`
///
/// # Panics
///
/// Panics if slices have different lengths or are empty.
#[must_use]
pub fn mae(pred: &[f32], truth: &[f32]) -> f32 {
    assert_eq!(pred.len(), truth.len(), "Slices must have same length");
    assert!(!truth.is_empty(), "Slices cannot be empty");

    let n = truth.len() as f32;
    let sum_abs: f32 = truth
        .iter()
        .zip(pred.iter())
        .map(|(t, p)| (t - p).abs())
        .sum();
    sum_abs / n
}
