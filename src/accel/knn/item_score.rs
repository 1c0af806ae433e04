// This file is part of cfknn.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

//! Item-based neighborhood scoring.
use log::*;

use crate::data::{PopulationStats, RatingMatrix};
use crate::errors::PredictError;

use super::accum::NeighborAccumulator;
use super::similarity::adjusted_cosine_similarity;
use super::weighting::{AnomalyCounter, RatingScale};

/// Parameters for item-based scoring.
#[derive(Debug, Clone, Copy)]
pub struct ItemScoreParams {
    /// Aggregate offsets from item means and add back the target item's mean.
    pub mean_center: bool,
    pub max_neighbors: Option<usize>,
    pub scale: RatingScale,
}

/// Predict a user's ratings for `items` from the items they already rated.
///
/// Item-item weights are adjusted cosine similarities over the columns of
/// `ratings`, using the user means in `stats`. Item means fall back to the
/// scale midpoint for items nobody rated.
pub fn predict_item_based(
    ratings: &RatingMatrix,
    stats: &PopulationStats,
    user: usize,
    known: &[(usize, f64)],
    items: &[usize],
    params: &ItemScoreParams,
    anomalies: &mut AnomalyCounter,
) -> Result<Vec<u8>, PredictError> {
    let n_items = ratings.n_items();
    let user_means = stats.user_means();
    if user_means.len() != ratings.n_users() {
        return Err(PredictError::Dimension {
            expected: ratings.n_users(),
            found: user_means.len(),
        });
    }
    let bad_item = known
        .iter()
        .map(|(i, _)| i)
        .chain(items)
        .find(|i| **i >= n_items);
    if let Some(item) = bad_item {
        return Err(PredictError::ItemOutOfBounds {
            item: *item,
            n_items,
        });
    }

    trace!(
        "scoring {} items for user {} from {} reference items",
        items.len(),
        user,
        known.len()
    );

    let midpoint = params.scale.midpoint();
    let item_mean = |item: usize| stats.item_mean(item).unwrap_or(midpoint);
    let mut heaps = vec![NeighborAccumulator::new(); items.len()];

    // we loop reference items, looking for targets
    for &(ri, rv) in known {
        let reference = ratings.item(ri);
        let value = if params.mean_center {
            rv - item_mean(ri)
        } else {
            rv
        };

        for (acc, ti) in heaps.iter_mut().zip(items) {
            let sim = adjusted_cosine_similarity(ratings.item(*ti), reference, user_means);
            acc.add_value(params.max_neighbors, sim, value)?;
        }
    }

    items
        .iter()
        .zip(&heaps)
        .map(|(ti, acc)| {
            let raw = if params.mean_center {
                item_mean(*ti) + acc.average_or(0.0)
            } else {
                acc.average_or(midpoint)
            };
            params.scale.finish(user, *ti, raw, anomalies)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    fn params(mean_center: bool) -> ItemScoreParams {
        ItemScoreParams {
            mean_center,
            max_neighbors: None,
            scale: RatingScale::default(),
        }
    }

    fn predict(
        ratings: &RatingMatrix,
        known: &[(usize, f64)],
        items: &[usize],
        mean_center: bool,
    ) -> (Vec<u8>, usize) {
        let stats = PopulationStats::build(ratings);
        let mut anomalies = AnomalyCounter::default();
        let preds = predict_item_based(
            ratings,
            &stats,
            0,
            known,
            items,
            &params(mean_center),
            &mut anomalies,
        )
        .unwrap();
        (preds, anomalies.count())
    }

    #[test]
    fn unrated_item_gets_midpoint() {
        let m = RatingMatrix::from_dense(&array![[5, 3, 0], [4, 0, 0], [1, 1, 0]]);
        let (preds, _) = predict(&m, &[(0, 5.0), (1, 3.0)], &[2], true);
        assert_eq!(preds, vec![3]);
        let (preds, _) = predict(&m, &[(0, 5.0), (1, 3.0)], &[2], false);
        assert_eq!(preds, vec![3]);
    }

    #[test]
    fn centered_by_hand() {
        // user means: 4, 3, 4/3; both reference items have weight -1/sqrt(10)
        // item means: 10/3, 2, 5/2
        // 5/2 + (-(5 - 10/3) - (3 - 2)) / 2 = 7/6
        let m = RatingMatrix::from_dense(&array![[5, 3, 0], [4, 2, 3], [1, 1, 2]]);
        let (preds, anomalies) = predict(&m, &[(0, 5.0), (1, 3.0)], &[2], true);
        assert_eq!(preds, vec![1]);
        assert_eq!(anomalies, 0);
    }

    #[test]
    fn uncentered_by_hand() {
        // -(5 + 3) / 2 = -4, clamped from below
        let m = RatingMatrix::from_dense(&array![[5, 3, 0], [4, 2, 3], [1, 1, 2]]);
        let (preds, anomalies) = predict(&m, &[(0, 5.0), (1, 3.0)], &[2], false);
        assert_eq!(preds, vec![1]);
        assert_eq!(anomalies, 1);
    }

    #[test]
    fn no_known_ratings() {
        let m = RatingMatrix::from_dense(&array![[5, 3], [4, 2]]);
        let (preds, _) = predict(&m, &[], &[0, 1], true);
        // item means 4.5 and 2.5, rounded half to even
        assert_eq!(preds, vec![4, 2]);
    }

    #[test]
    fn rejects_bad_item() {
        let m = RatingMatrix::from_dense(&array![[5, 3]]);
        let stats = PopulationStats::build(&m);
        let mut anomalies = AnomalyCounter::default();
        let res = predict_item_based(&m, &stats, 0, &[(4, 2.0)], &[0], &params(true), &mut anomalies);
        assert!(matches!(res, Err(PredictError::ItemOutOfBounds { item: 4, n_items: 2 })));
    }
}
