// This file is part of cfknn.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

//! Pairwise similarity between rating vectors.
//!
//! Every function here works on the co-rated set only: the positions where
//! both vectors hold a known rating. Co-rated sets with fewer than
//! [`MIN_CO_RATED`] entries, and vectors with zero norm, have similarity 0.
use ndarray::{Array1, ArrayView1};

use crate::types::Rating;

/// Smallest co-rated set that yields a non-zero similarity.
pub const MIN_CO_RATED: usize = 2;

/// Signature shared by the user-to-user similarity functions.
pub type SimilarityFn = fn(ArrayView1<'_, Rating>, ArrayView1<'_, Rating>) -> f64;

/// Restrict two vectors to the positions where both are known.
///
/// Order is preserved. Returns two empty arrays if no position qualifies.
pub fn filter_co_rated(
    a: ArrayView1<'_, Rating>,
    b: ArrayView1<'_, Rating>,
) -> (Array1<f64>, Array1<f64>) {
    assert_eq!(a.len(), b.len(), "rating vectors must have equal length");
    let (left, right): (Vec<f64>, Vec<f64>) = a
        .iter()
        .zip(b.iter())
        .filter_map(|pair| match pair {
            (Some(x), Some(y)) => Some((*x, *y)),
            _ => None,
        })
        .unzip();
    (Array1::from(left), Array1::from(right))
}

/// Cosine of two already-filtered vectors.
fn cosine_known(a: &Array1<f64>, b: &Array1<f64>) -> f64 {
    if a.len() < MIN_CO_RATED {
        return 0.0;
    }

    let denom = (a.dot(a) * b.dot(b)).sqrt();
    if denom == 0.0 {
        return 0.0;
    }

    // floating-point drift can push this slightly past ±1
    (a.dot(b) / denom).clamp(-1.0, 1.0)
}

/// Cosine similarity over the co-rated set.
pub fn cosine_similarity(a: ArrayView1<'_, Rating>, b: ArrayView1<'_, Rating>) -> f64 {
    let (a, b) = filter_co_rated(a, b);
    cosine_known(&a, &b)
}

/// Pearson correlation over the co-rated set.
///
/// Each side is centered on its own co-rated mean.
pub fn pearson_correlation(a: ArrayView1<'_, Rating>, b: ArrayView1<'_, Rating>) -> f64 {
    let (a, b) = filter_co_rated(a, b);
    if a.len() < MIN_CO_RATED {
        return 0.0;
    }

    let a_mean = a.mean().unwrap_or(0.0);
    let b_mean = b.mean().unwrap_or(0.0);
    let a = &a - a_mean;
    let b = &b - b_mean;
    cosine_known(&a, &b)
}

/// Adjusted cosine similarity between two item columns.
///
/// Each user's mean rating is subtracted from both columns before taking the
/// cosine. The co-rated set is taken from the known mask of the original
/// columns, so an unknown rating never re-enters as `0 - mean`.
pub fn adjusted_cosine_similarity(
    item_a: ArrayView1<'_, Rating>,
    item_b: ArrayView1<'_, Rating>,
    user_means: ArrayView1<'_, Rating>,
) -> f64 {
    assert_eq!(item_a.len(), user_means.len(), "one mean is needed per user");
    let a = center_on_users(item_a, user_means);
    let b = center_on_users(item_b, user_means);
    cosine_similarity(a.view(), b.view())
}

fn center_on_users(item: ArrayView1<'_, Rating>, user_means: ArrayView1<'_, Rating>) -> Array1<Rating> {
    item.iter()
        .zip(user_means.iter())
        .map(|(r, m)| r.map(|r| r - m.unwrap_or(0.0)))
        .collect()
}
