//! Integration tests for the recomendar engine.
//!
//! These tests verify end-to-end workflows combining multiple components.

use recomendar::prelude::*;
use recomendar::preprocessing::Normalization;

/// Synthetic rating table with per-user taste offsets, dense enough that
/// every split survives the given constraint.
fn movie_ratings(n_users: u32, n_items: u32) -> Vec<Rating> {
    let mut ratings = Vec::new();
    for u in 0..n_users {
        for i in 0..n_items {
            // Leave some cells unobserved to keep the matrix sparse.
            if (u + i) % 4 == 3 {
                continue;
            }
            let value = ((u * 7 + i * 3) % 9) as f32 / 2.0 + 1.0; // 1.0..=5.0
            ratings.push(Rating::new(u, i, value));
        }
    }
    ratings
}

#[test]
fn test_full_evaluation_workflow() {
    let matrix = SparseRatingMatrix::from_ratings(&movie_ratings(20, 15)).unwrap();

    // Keep only users with a reasonably dense profile.
    let dense = matrix.filter_users(8).expect("enough dense users");
    assert!(dense.n_users() > 0);

    let split = EvaluationScheme::new(0.8, 5, 4.0)
        .with_random_state(42)
        .split(&dense)
        .expect("split succeeds");

    let mut predictors: Vec<Box<dyn Recommender>> = vec![
        Box::new(UserBased::new().with_k(5).with_similarity(Similarity::Cosine)),
        Box::new(Popularity::new()),
        Box::new(RandomRating::new().with_random_state(42)),
    ];
    let results = Evaluator::new(&split)
        .evaluate(&mut predictors, &[1, 3, 5, 10])
        .expect("evaluation succeeds");

    assert_eq!(results.len(), 3);
    for result in &results {
        // Every held-out cell is either evaluated or counted as a gap.
        assert_eq!(
            result.accuracy.n_evaluated + result.accuracy.n_unpredicted,
            split.n_held_out()
        );
        assert_eq!(result.ranking.rows.len(), 4);
        if let (Some(r), Some(m)) = (result.accuracy.rmse, result.accuracy.mae) {
            assert!(r >= m - 1e-6, "{}: RMSE < MAE", result.predictor);
        }
    }
}

#[test]
fn test_evaluation_is_reproducible() {
    let matrix = SparseRatingMatrix::from_ratings(&movie_ratings(16, 12)).unwrap();

    let run = || {
        let split = EvaluationScheme::new(0.75, 4, 4.0)
            .with_random_state(7)
            .split(&matrix)
            .expect("split succeeds");
        let mut predictors: Vec<Box<dyn Recommender>> = vec![
            Box::new(UserBased::new().with_k(3)),
            Box::new(RandomRating::new().with_random_state(7)),
        ];
        Evaluator::new(&split)
            .evaluate(&mut predictors, &[2, 5])
            .expect("evaluation succeeds")
    };

    let first = run();
    let second = run();
    for (a, b) in first.iter().zip(second.iter()) {
        assert_eq!(a.accuracy.rmse, b.accuracy.rmse);
        assert_eq!(a.accuracy.mae, b.accuracy.mae);
        for (x, y) in a.ranking.rows.iter().zip(b.ranking.rows.iter()) {
            assert_eq!(x.precision, y.precision);
            assert_eq!(x.recall, y.recall);
            assert_eq!(x.tpr, y.tpr);
            assert_eq!(x.fpr, y.fpr);
        }
    }
}

#[test]
fn test_ubcf_normalization_variants_both_work() {
    let matrix = SparseRatingMatrix::from_ratings(&movie_ratings(20, 15)).unwrap();
    let split = EvaluationScheme::new(0.8, 6, 4.0)
        .with_random_state(11)
        .split(&matrix)
        .expect("split succeeds");

    for normalization in [Normalization::None, Normalization::ZScore] {
        let mut model = UserBased::new()
            .with_k(4)
            .with_similarity(Similarity::Pearson)
            .with_normalization(normalization);
        model.fit(split.train()).expect("fit succeeds");
        let report = Evaluator::new(&split).accuracy(&model).expect("evaluates");
        if let Some(r) = report.rmse {
            assert!(r.is_finite(), "{normalization:?}: non-finite RMSE");
        }
    }
}

#[test]
fn test_single_neighbor_prediction_end_to_end() {
    // Users {1,2,3}, items {A=10,B=11,C=12}; user1's nearest neighbor under
    // cosine is user2, the only rater of C.
    let matrix = SparseRatingMatrix::from_ratings(&[
        Rating::new(1, 10, 5.0),
        Rating::new(1, 11, 3.0),
        Rating::new(2, 10, 5.0),
        Rating::new(2, 11, 4.0),
        Rating::new(2, 12, 2.0),
        Rating::new(3, 10, 1.0),
        Rating::new(3, 11, 1.0),
    ])
    .unwrap();

    let mut model = UserBased::new().with_k(1).with_similarity(Similarity::Cosine);
    model.fit(&matrix).unwrap();
    assert_eq!(model.predict(1, 12).unwrap(), Some(2.0));
}

#[test]
fn test_error_paths_across_components() {
    let matrix = SparseRatingMatrix::from_ratings(&movie_ratings(10, 8)).unwrap();

    // Duplicate rejection at construction.
    let err = SparseRatingMatrix::from_ratings(&[
        Rating::new(1, 1, 2.0),
        Rating::new(1, 1, 3.0),
    ])
    .unwrap_err();
    assert!(matches!(err, RecomendarError::DuplicateEntry { .. }));

    // Unknown item at prediction.
    let mut model = Popularity::new();
    model.fit(&matrix).unwrap();
    assert!(matches!(
        model.predict(0, 9999).unwrap_err(),
        RecomendarError::UnknownEntity { .. }
    ));

    // Zero-length top-N.
    assert!(matches!(
        model.top_n(0, 0).unwrap_err(),
        RecomendarError::InvalidParameter { .. }
    ));

    // Degenerate split fraction.
    assert!(matches!(
        EvaluationScheme::new(1.0, 3, 4.0).split(&matrix).unwrap_err(),
        RecomendarError::InvalidParameter { .. }
    ));
}

#[test]
fn test_top_n_lists_exclude_given_items() {
    let matrix = SparseRatingMatrix::from_ratings(&movie_ratings(20, 15)).unwrap();
    let split = EvaluationScheme::new(0.8, 5, 4.0)
        .with_random_state(3)
        .split(&matrix)
        .expect("split succeeds");

    let mut model = Popularity::new();
    model.fit(split.train()).expect("fit succeeds");

    for &user in split.test_users() {
        let given: Vec<u32> = split
            .train()
            .user_ratings(user)
            .expect("test user is in the train view")
            .iter()
            .map(|&(item, _)| item)
            .collect();
        let top = model.top_n(user, 10).expect("valid query");
        for item in &top {
            assert!(!given.contains(item), "given item {item} recommended");
        }
    }
}

#[test]
fn test_report_tables_exported_for_collaborators() {
    let matrix = SparseRatingMatrix::from_ratings(&movie_ratings(16, 12)).unwrap();
    let split = EvaluationScheme::new(0.75, 4, 4.0)
        .with_random_state(5)
        .split(&matrix)
        .expect("split succeeds");

    let mut predictors: Vec<Box<dyn Recommender>> = vec![Box::new(Popularity::new())];
    let results = Evaluator::new(&split)
        .evaluate(&mut predictors, &[1, 5])
        .expect("evaluation succeeds");

    // The reporting boundary is plain serializable tables.
    let json = serde_json::to_string(&results).expect("results serialize");
    assert!(json.contains("precision"));
    assert!(json.contains("rmse"));

    // Exploratory distribution tables from the matrix itself.
    let dist = matrix.rating_distribution();
    assert!(!dist.is_empty());
    let total: usize = dist.iter().map(|&(_, count)| count).sum();
    assert_eq!(total, matrix.n_ratings());
}
