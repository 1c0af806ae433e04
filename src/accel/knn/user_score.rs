// This file is part of cfknn.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

//! User-based neighborhood scoring.
use log::*;
use ndarray::{ArrayView1, ArrayView2};

use crate::data::Session;
use crate::errors::PredictError;
use crate::types::Rating;

use super::accum::NeighborAccumulator;
use super::similarity::SimilarityFn;
use super::weighting::{case_amplify, restricted_mean, AnomalyCounter, RatingScale};

/// Parameters for user-based scoring.
#[derive(Clone, Copy)]
pub struct UserScoreParams {
    pub similarity: SimilarityFn,
    /// Case-amplification exponent applied to every weight.
    pub case_exponent: Option<f64>,
    /// Aggregate offsets from neighbor means and add back the target's mean.
    pub mean_center: bool,
    pub max_neighbors: Option<usize>,
    pub scale: RatingScale,
}

/// The candidate neighbors for a user-based prediction.
///
/// Similarities are computed on `profiles`; ratings are aggregated from
/// `ratings`. Both share the same shape.
pub struct NeighborPool<'a> {
    profiles: ArrayView2<'a, Rating>,
    ratings: ArrayView2<'a, Rating>,
    members: Vec<usize>,
}

impl<'a> NeighborPool<'a> {
    pub fn new(
        profiles: ArrayView2<'a, Rating>,
        ratings: ArrayView2<'a, Rating>,
        members: Vec<usize>,
    ) -> Self {
        assert_eq!(profiles.shape(), ratings.shape());
        assert!(members.iter().all(|m| *m < ratings.nrows()));
        NeighborPool {
            profiles,
            ratings,
            members,
        }
    }

    /// Every user in the session, except the target user's own row.
    pub fn all(session: &'a Session, exclude: Option<usize>) -> Self {
        let members = (0..session.ratings().n_users())
            .filter(|u| Some(*u) != exclude)
            .collect();
        NeighborPool::new(session.profiles().view(), session.ratings().view(), members)
    }

    /// Only the users whose ids precede `user`.
    pub fn preceding(session: &'a Session, user: usize) -> Self {
        let end = user.min(session.ratings().n_users());
        NeighborPool::new(
            session.profiles().view(),
            session.ratings().view(),
            (0..end).collect(),
        )
    }

    pub fn members(&self) -> &[usize] {
        &self.members
    }

    pub fn n_items(&self) -> usize {
        self.ratings.ncols()
    }
}

/// The user a prediction is made for.
pub struct UserTarget<'a> {
    pub user: usize,
    /// Known ratings in profile space, compared against neighbor profiles.
    pub profile: ArrayView1<'a, Rating>,
    /// Known ratings on the original scale.
    pub ratings: ArrayView1<'a, Rating>,
}

/// Predict ratings for `items` from the target user's neighbors.
pub fn predict_user_based(
    pool: &NeighborPool<'_>,
    target: &UserTarget<'_>,
    items: &[usize],
    params: &UserScoreParams,
    anomalies: &mut AnomalyCounter,
) -> Result<Vec<u8>, PredictError> {
    let n_items = pool.n_items();
    for v in [&target.profile, &target.ratings] {
        if v.len() != n_items {
            return Err(PredictError::Dimension {
                expected: n_items,
                found: v.len(),
            });
        }
    }
    if let Some(item) = items.iter().find(|i| **i >= n_items) {
        return Err(PredictError::ItemOutOfBounds {
            item: *item,
            n_items,
        });
    }

    trace!(
        "scoring {} items for user {} from {} candidate neighbors",
        items.len(),
        target.user,
        pool.members.len()
    );

    let midpoint = params.scale.midpoint();
    let mut heaps = vec![NeighborAccumulator::new(); items.len()];

    // we loop neighbors, looking for targets, so each weight is computed once
    for &nbr in &pool.members {
        let mut weight = (params.similarity)(target.profile, pool.profiles.row(nbr));
        if let Some(p) = params.case_exponent {
            weight = case_amplify(weight, p);
        }

        let row = pool.ratings.row(nbr);
        let offset = if params.mean_center {
            restricted_mean(row).unwrap_or(0.0)
        } else {
            0.0
        };

        for (acc, item) in heaps.iter_mut().zip(items) {
            if let Some(rating) = row[*item] {
                acc.add_value(params.max_neighbors, weight, rating - offset)?;
            }
        }
    }

    let baseline = if params.mean_center {
        restricted_mean(target.ratings).unwrap_or(midpoint)
    } else {
        midpoint
    };

    items
        .iter()
        .zip(&heaps)
        .map(|(item, acc)| {
            let raw = if params.mean_center {
                baseline + acc.average_or(0.0)
            } else {
                acc.average_or(baseline)
            };
            params.scale.finish(target.user, *item, raw, anomalies)
        })
        .collect()
}
