//! Pairwise similarity between sparse rating vectors.
//!
//! Similarities are computed **only over pairwise-complete observations**:
//! the set of items (or users, for column similarity) both vectors have
//! observed. Pairs with no overlap have undefined similarity, represented
//! as `None` rather than a fabricated zero, and are never selected as
//! neighbors.

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use std::collections::HashMap;

use crate::error::{RecomendarError, Result};
use crate::ratings::SparseRatingMatrix;

/// Similarity method. Typed selection, no string dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Similarity {
    /// Cosine of the angle between the overlapping observed values.
    #[default]
    Cosine,
    /// Cosine after subtracting each vector's own mean over the overlap.
    Pearson,
}

impl Similarity {
    /// Similarity between two item-sorted sparse vectors, in `[-1, 1]`.
    ///
    /// Returns `None` when the vectors share no observed entries, or when a
    /// norm (cosine) or variance (Pearson) over the overlap degenerates to
    /// zero and the ratio is undefined.
    ///
    /// # Examples
    ///
    /// ```
    /// use recomendar::similarity::Similarity;
    ///
    /// let a = [(10, 5.0), (11, 3.0)];
    /// let b = [(10, 5.0), (11, 3.0), (12, 1.0)];
    /// let sim = Similarity::Cosine.between(&a, &b).unwrap();
    /// assert!((sim - 1.0).abs() < 1e-6);
    ///
    /// let disjoint = [(99, 4.0)];
    /// assert!(Similarity::Cosine.between(&a, &disjoint).is_none());
    /// ```
    #[must_use]
    pub fn between(self, a: &[(u32, f32)], b: &[(u32, f32)]) -> Option<f32> {
        let pairs = overlap(a, b);
        if pairs.is_empty() {
            return None;
        }
        let (xs, ys): (Vec<f32>, Vec<f32>) = pairs.into_iter().unzip();
        match self {
            Similarity::Cosine => cosine(&xs, &ys),
            Similarity::Pearson => {
                let n = xs.len() as f32;
                let mx = xs.iter().sum::<f32>() / n;
                let my = ys.iter().sum::<f32>() / n;
                let cx: Vec<f32> = xs.iter().map(|v| v - mx).collect();
                let cy: Vec<f32> = ys.iter().map(|v| v - my).collect();
                cosine(&cx, &cy)
            }
        }
    }
}

/// Cosine over already-aligned value slices; `None` if a norm is zero.
fn cosine(xs: &[f32], ys: &[f32]) -> Option<f32> {
    let mut dot = 0.0f32;
    let mut nx = 0.0f32;
    let mut ny = 0.0f32;
    for (x, y) in xs.iter().zip(ys.iter()) {
        dot += x * y;
        nx += x * x;
        ny += y * y;
    }
    if nx <= 0.0 || ny <= 0.0 {
        return None;
    }
    Some((dot / (nx.sqrt() * ny.sqrt())).clamp(-1.0, 1.0))
}

/// Merge-walk two item-sorted sparse vectors, collecting co-observed values.
fn overlap(a: &[(u32, f32)], b: &[(u32, f32)]) -> Vec<(f32, f32)> {
    let mut pairs = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].0.cmp(&b[j].0) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                pairs.push((a[i].1, b[j].1));
                i += 1;
                j += 1;
            }
        }
    }
    pairs
}

/// The up-to-k most similar other users for `user`.
///
/// Ordered by similarity descending, ties broken by ascending user id.
/// The user itself and candidates with undefined similarity are excluded;
/// fewer than `k` valid neighbors is not an error.
///
/// # Errors
///
/// - [`RecomendarError::InvalidParameter`] for `k == 0`.
/// - [`RecomendarError::UnknownEntity`] for a user absent from the matrix.
///
/// # Examples
///
/// ```
/// use recomendar::ratings::{Rating, SparseRatingMatrix};
/// use recomendar::similarity::{neighbors, Similarity};
///
/// let matrix = SparseRatingMatrix::from_ratings(&[
///     Rating::new(1, 10, 5.0), Rating::new(1, 11, 3.0),
///     Rating::new(2, 10, 5.0), Rating::new(2, 11, 4.0),
///     Rating::new(3, 10, 1.0), Rating::new(3, 11, 1.0),
/// ]).unwrap();
///
/// let nearest = neighbors(&matrix, 1, 1, Similarity::Cosine).unwrap();
/// assert_eq!(nearest[0].0, 2);
/// ```
pub fn neighbors(
    matrix: &SparseRatingMatrix,
    user: u32,
    k: usize,
    method: Similarity,
) -> Result<Vec<(u32, f32)>> {
    if k == 0 {
        return Err(RecomendarError::invalid_parameter("k", k, ">= 1"));
    }
    let row = matrix
        .user_ratings(user)
        .ok_or_else(|| RecomendarError::unknown_user(user))?;

    let mut scored: Vec<(u32, f32)> = matrix
        .users()
        .iter()
        .filter(|&&other| other != user)
        .filter_map(|&other| {
            let other_row = matrix
                .user_ratings(other)
                .expect("user id comes from the matrix itself");
            method.between(row, other_row).map(|sim| (other, sim))
        })
        .collect();

    scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    scored.truncate(k);
    Ok(scored)
}

/// A full square, symmetric similarity matrix over users or items.
///
/// The diagonal is excluded (an entity is never its own neighbor) and
/// undefined pairs answer `None`. Intended as a per-evaluation-run cache;
/// it carries no identity independent of the matrix it was built from.
#[derive(Debug, Clone)]
pub struct SimilarityMatrix {
    ids: Vec<u32>,
    index: HashMap<u32, usize>,
    // Upper triangle (i < j) in row-major condensed order; NaN = undefined.
    values: Vec<f32>,
}

impl SimilarityMatrix {
    /// Pairwise user–user similarities.
    #[must_use]
    pub fn users(matrix: &SparseRatingMatrix, method: Similarity) -> Self {
        let rows: Vec<&[(u32, f32)]> = matrix
            .users()
            .iter()
            .map(|&u| matrix.user_ratings(u).expect("user id from matrix"))
            .collect();
        Self::from_rows(matrix.users().to_vec(), &rows, method)
    }

    /// Pairwise item–item similarities over the matrix columns.
    #[must_use]
    pub fn items(matrix: &SparseRatingMatrix, method: Similarity) -> Self {
        let mut index: HashMap<u32, usize> = HashMap::with_capacity(matrix.n_items());
        for (i, &item) in matrix.items().iter().enumerate() {
            index.insert(item, i);
        }
        // matrix.iter() walks users in ascending order, so columns come out
        // user-sorted without an extra sort.
        let mut columns: Vec<Vec<(u32, f32)>> = vec![Vec::new(); matrix.n_items()];
        for (user, item, value) in matrix.iter() {
            columns[index[&item]].push((user, value));
        }
        let column_refs: Vec<&[(u32, f32)]> = columns.iter().map(Vec::as_slice).collect();
        Self::from_rows(matrix.items().to_vec(), &column_refs, method)
    }

    fn from_rows(ids: Vec<u32>, rows: &[&[(u32, f32)]], method: Similarity) -> Self {
        let n = ids.len();

        #[cfg(feature = "parallel")]
        let triangle: Vec<Vec<f32>> = (0..n)
            .into_par_iter()
            .map(|i| {
                ((i + 1)..n)
                    .map(|j| method.between(rows[i], rows[j]).unwrap_or(f32::NAN))
                    .collect()
            })
            .collect();

        #[cfg(not(feature = "parallel"))]
        let triangle: Vec<Vec<f32>> = (0..n)
            .map(|i| {
                ((i + 1)..n)
                    .map(|j| method.between(rows[i], rows[j]).unwrap_or(f32::NAN))
                    .collect()
            })
            .collect();

        let index = ids.iter().enumerate().map(|(i, &id)| (id, i)).collect();
        Self {
            ids,
            index,
            values: triangle.concat(),
        }
    }

    /// Similarity between two entities; `None` for the diagonal, unknown
    /// ids, or undefined pairs.
    #[must_use]
    pub fn get(&self, a: u32, b: u32) -> Option<f32> {
        let i = *self.index.get(&a)?;
        let j = *self.index.get(&b)?;
        if i == j {
            return None;
        }
        let (lo, hi) = if i < j { (i, j) } else { (j, i) };
        let n = self.ids.len();
        let pos = lo * n - lo * (lo + 1) / 2 + (hi - lo - 1);
        let v = self.values[pos];
        if v.is_nan() {
            None
        } else {
            Some(v)
        }
    }

    /// Entity ids covered by this matrix, ascending.
    #[must_use]
    pub fn ids(&self) -> &[u32] {
        &self.ids
    }
}
