// This file is part of cfknn.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

use ndarray::array;

use cfknn::knn::similarity::{cosine_similarity, filter_co_rated, pearson_correlation};
use cfknn::knn::weighting::round_and_clamp;
use cfknn::types::vector_from_dense;
use cfknn::{Algorithm, BatchRunner, PoolKind, PredictorConfig, Query, QueryBatch, RatingMatrix, Session};

fn training() -> RatingMatrix {
    RatingMatrix::from_dense(&array![
        [5, 3, 0, 1, 4],
        [4, 0, 0, 1, 5],
        [1, 1, 0, 5, 2],
        [1, 0, 4, 4, 0],
        [0, 1, 5, 4, 1],
    ])
}

fn request(user: usize, item: usize) -> Query {
    Query {
        user,
        item,
        rating: None,
    }
}

fn known(user: usize, item: usize, rating: u8) -> Query {
    Query {
        user,
        item,
        rating: Some(rating),
    }
}

#[test]
fn similarity_reference_values() {
    let a = vector_from_dense(&[9, 3, 0, 0, 5]);
    let b = vector_from_dense(&[10, 3, 8, 0, 5]);
    assert!((cosine_similarity(a.view(), b.view()) - 0.9989).abs() < 5e-4);

    let a = vector_from_dense(&[1, 0, -1]);
    let b = vector_from_dense(&[-1, 0, 1]);
    assert_eq!(cosine_similarity(a.view(), b.view()), -1.0);

    let a = vector_from_dense(&[4, 4, 1, 4, 3]);
    let b = vector_from_dense(&[5, 4, 2, 0, 3]);
    let p = pearson_correlation(a.view(), b.view());
    assert!((p - 0.91287093).abs() < 1e-8);
    assert_eq!(p, pearson_correlation(b.view(), a.view()));

    let a = vector_from_dense(&[0, 1, 2, 4, 5]);
    let b = vector_from_dense(&[1, 2, 3, 0, 4]);
    let (fa, fb) = filter_co_rated(a.view(), b.view());
    assert_eq!(fa.to_vec(), vec![1.0, 2.0, 5.0]);
    assert_eq!(fb.to_vec(), vec![2.0, 3.0, 4.0]);
}

#[test]
fn similarity_symmetric_and_bounded() {
    let m = training();
    for i in 0..m.n_users() {
        for j in 0..m.n_users() {
            for sim in [cosine_similarity, pearson_correlation] {
                let ab = sim(m.user(i), m.user(j));
                let ba = sim(m.user(j), m.user(i));
                assert_eq!(ab, ba);
                assert!((-1.0..=1.0).contains(&ab));
            }
        }
    }
}

#[test]
fn rounding_idempotent() {
    for x in [-3.2, 0.4, 1.5, 2.5, 2.51, 3.49, 4.5, 5.5, 17.0] {
        let once = round_and_clamp(x);
        assert!((1..=5).contains(&once));
        assert_eq!(round_and_clamp(once as f64), once);
    }
}

#[test]
fn all_variants_in_scale() {
    let m = training();
    let queries = vec![
        known(5, 0, 5),
        known(5, 3, 1),
        request(5, 1),
        request(5, 2),
        request(5, 4),
        request(6, 0),
        request(6, 2),
        known(7, 2, 5),
        request(7, 0),
        request(7, 4),
    ];
    for algorithm in Algorithm::ALL {
        for progressive in [false, true] {
            let config = PredictorConfig {
                progressive,
                ..PredictorConfig::with_algorithm(algorithm)
            };
            let mut runner = BatchRunner::new(&m, config);
            let preds = runner.run_queries(queries.clone()).unwrap();
            assert_eq!(preds.len(), 7, "{}", algorithm);
            for p in &preds {
                assert!((1..=5).contains(&p.rating), "{} gave {:?}", algorithm, p);
            }
        }
    }
}

#[test]
fn empty_user_no_neighbors_is_midpoint() {
    let m = RatingMatrix::from_dense(&array![[5, 3, 0], [4, 0, 0], [1, 1, 0]]);
    let mut runner = BatchRunner::new(&m, PredictorConfig::with_algorithm(Algorithm::UserCosine));
    let preds = runner.run_queries(vec![request(3, 2)]).unwrap();
    assert_eq!(preds[0].rating, 3);
}

#[test]
fn golden_item_centered() {
    // item 2 has no ratings at all, so every weight is 0 and the
    // prediction falls back to the item mean fallback of 3
    let m = RatingMatrix::from_dense(&array![[5, 3, 0], [4, 0, 0], [1, 1, 0]]);
    let mut runner = BatchRunner::new(&m, PredictorConfig::default());
    let preds = runner
        .run_queries(vec![known(0, 0, 5), known(0, 1, 3), request(0, 2)])
        .unwrap();
    assert_eq!(preds.len(), 1);
    assert_eq!(preds[0].rating, 3);
    assert_eq!(runner.anomalies(), 0);
}

#[test]
fn iuf_applied_once_per_session() {
    let m = training();
    let mut session = Session::new(&m);
    assert!(session.apply_inverse_user_frequency());
    let profiles = session.profiles().clone();
    assert!(!session.apply_inverse_user_frequency());
    assert_eq!(session.profiles(), &profiles);
    assert_eq!(session.ratings(), &m);
}

#[test]
fn training_untouched_by_run() {
    let m = training();
    let before = m.clone();
    let config = PredictorConfig {
        progressive: true,
        ..PredictorConfig::with_algorithm(Algorithm::UserPearsonCaseIuf)
    };
    let mut runner = BatchRunner::new(&m, config);
    runner
        .run_queries(vec![known(5, 0, 4), request(5, 1), request(6, 2)])
        .unwrap();
    assert_eq!(m, before);
    assert_eq!(runner.session().ratings().n_users(), 7);
}

#[test]
fn progressive_shares_predictions() {
    // one training user, who never rated item 1
    let m = RatingMatrix::from_dense(&array![[5, 0, 1, 3]]);
    let config = PredictorConfig {
        progressive: true,
        pool: PoolKind::Preceding,
        ..PredictorConfig::with_algorithm(Algorithm::UserCosine)
    };
    let batches = vec![
        QueryBatch {
            user: 1,
            known: vec![(0, 1.0), (1, 2.0), (2, 5.0)],
            targets: vec![3],
        },
        QueryBatch {
            user: 2,
            known: vec![(0, 1.0), (2, 5.0)],
            targets: vec![1],
        },
    ];

    // without write-back nobody has rated item 1
    let mut plain = BatchRunner::new(
        &m,
        PredictorConfig {
            progressive: false,
            ..config.clone()
        },
    );
    let preds = plain.run(&batches).unwrap();
    assert_eq!(preds[1].rating, 3);

    // user 1 is written back and agrees perfectly with user 2 on items 0 and 2
    let mut runner = BatchRunner::new(&m, config);
    let preds = runner.run(&batches).unwrap();
    assert_eq!(preds[0].rating, 3);
    assert_eq!(preds[1].rating, 2);
    assert_eq!(runner.session().ratings().get(1, 3), Some(3.0));
    assert_eq!(m.n_users(), 1);
}
