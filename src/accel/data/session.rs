// This file is part of cfknn.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

//! Mutable working state for one prediction run.
use log::*;
use ndarray::{Array1, ArrayView1};

use crate::errors::PredictError;
use crate::knn::weighting::{inverse_user_frequency, iuf_scale};
use crate::types::Rating;

use super::{PopulationStats, RatingMatrix};

/// Working copy of the training data for a run.
///
/// The session owns its own ratings, so the training matrix it was
/// created from is never modified. Two destructive operations are
/// available: the inverse user frequency transform, which is applied at
/// most once, and progressive write-back of finished predictions.
#[derive(Debug, Clone)]
pub struct Session {
    ratings: RatingMatrix,
    profiles: Option<RatingMatrix>,
    iuf: Option<Vec<Option<f64>>>,
    stats: PopulationStats,
}

impl Session {
    pub fn new(training: &RatingMatrix) -> Self {
        let ratings = training.clone();
        let stats = PopulationStats::build(&ratings);
        Session {
            ratings,
            profiles: None,
            iuf: None,
            stats,
        }
    }

    /// The ratings predictions are aggregated from.
    pub fn ratings(&self) -> &RatingMatrix {
        &self.ratings
    }

    /// The vectors similarities are computed on. These are the ratings,
    /// scaled by inverse user frequency once it has been applied.
    ///
    /// Predictions always aggregate the unscaled [`Session::ratings`], even
    /// for inverse user frequency variants.
    pub fn profiles(&self) -> &RatingMatrix {
        self.profiles.as_ref().unwrap_or(&self.ratings)
    }

    pub fn stats(&self) -> &PopulationStats {
        &self.stats
    }

    pub fn n_items(&self) -> usize {
        self.ratings.n_items()
    }

    pub fn iuf_applied(&self) -> bool {
        self.iuf.is_some()
    }

    /// Scale the similarity profiles by inverse user frequency.
    ///
    /// Returns `false` without touching anything if the transform was
    /// already applied to this session.
    pub fn apply_inverse_user_frequency(&mut self) -> bool {
        if self.iuf.is_some() {
            warn!("inverse user frequency already applied to this session, skipping");
            return false;
        }

        let weights = inverse_user_frequency(self.ratings.view());
        let n_scaled = weights.iter().flatten().count();
        debug!(
            "applying inverse user frequency to {} of {} items",
            n_scaled,
            weights.len()
        );
        let mut profiles = self.ratings.clone();
        profiles.scale_items(&weights);
        self.profiles = Some(profiles);
        self.iuf = Some(weights);
        true
    }

    /// Project a user's ratings into profile space.
    pub fn profile_of(&self, ratings: ArrayView1<'_, Rating>) -> Array1<Rating> {
        match &self.iuf {
            Some(weights) => ratings
                .iter()
                .zip(weights)
                .map(|(r, w)| r.and_then(|r| iuf_scale(r, *w)))
                .collect(),
            None => ratings.to_owned(),
        }
    }

    /// Write a finished user's known and predicted ratings back into the
    /// working copy, so that later users can use them.
    ///
    /// The population statistics are rebuilt afterwards. Inverse user
    /// frequency weights are not recomputed.
    pub fn record(
        &mut self,
        user: usize,
        known: &[(usize, f64)],
        predicted: &[(usize, u8)],
    ) -> Result<(), PredictError> {
        let n_items = self.n_items();
        let cells = known
            .iter()
            .copied()
            .chain(predicted.iter().map(|(i, r)| (*i, *r as f64)));
        let cells: Vec<(usize, f64)> = cells.collect();
        if let Some((item, _)) = cells.iter().find(|(i, _)| *i >= n_items) {
            return Err(PredictError::ItemOutOfBounds {
                item: *item,
                n_items,
            });
        }

        self.ratings.ensure_users(user + 1)?;
        for (item, rating) in &cells {
            self.ratings.set(user, *item, Some(*rating));
        }

        if let (Some(profiles), Some(weights)) = (self.profiles.as_mut(), self.iuf.as_ref()) {
            profiles.ensure_users(user + 1)?;
            for (item, rating) in &cells {
                profiles.set(user, *item, iuf_scale(*rating, weights[*item]));
            }
        }

        self.stats = PopulationStats::build(&self.ratings);
        trace!("recorded {} ratings for user {}", cells.len(), user);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    fn training() -> RatingMatrix {
        RatingMatrix::from_dense(&array![[5, 3, 0], [4, 0, 0], [1, 1, 0]])
    }

    #[test]
    fn iuf_applied_once() {
        let training = training();
        let mut session = Session::new(&training);
        assert!(!session.iuf_applied());
        assert!(session.apply_inverse_user_frequency());
        let first = session.profiles().clone();
        assert!(!session.apply_inverse_user_frequency());
        assert_eq!(session.profiles(), &first);

        // item 1 is rated by 2 of 3 users
        let w = (3.0f64 / 2.0).ln();
        assert!((first.get(0, 1).unwrap() - 3.0 * w).abs() < 1e-12);
        // item 0 is rated by everyone, so it drops out of the profiles
        assert_eq!(first.get(0, 0), None);
        assert_eq!(first.get(2, 0), None);
    }

    #[test]
    fn iuf_leaves_training_alone() {
        let training = training();
        let before = training.clone();
        let mut session = Session::new(&training);
        session.apply_inverse_user_frequency();
        assert_eq!(training, before);
        assert_eq!(session.ratings(), &before);
    }

    #[test]
    fn profile_of_scales_known() {
        let mut session = Session::new(&training());
        let target = array![Some(2.0), None, Some(4.0)];
        assert_eq!(session.profile_of(target.view()), target);
        session.apply_inverse_user_frequency();
        let w = (3.0f64 / 2.0).ln();
        let profile = session.profile_of(array![Some(5.0), Some(2.0), Some(4.0)].view());
        assert_eq!(profile[0], None);
        assert!((profile[1].unwrap() - 2.0 * w).abs() < 1e-12);
        assert_eq!(profile[2], Some(4.0));
    }

    #[test]
    fn pearson_ignores_universal_items() {
        use crate::knn::similarity::pearson_correlation;

        let training = RatingMatrix::from_dense(&array![
            [5, 4, 0, 2, 1],
            [1, 2, 3, 4, 5],
            [3, 0, 4, 0, 2]
        ]);
        let mut session = Session::new(&training);
        session.apply_inverse_user_frequency();
        let profiles = session.profiles();
        assert_eq!(profiles.get(0, 0), None);
        assert_eq!(profiles.get(0, 4), None);

        // only items 1 and 3 are co-rated, and they are ranked oppositely
        let sim = pearson_correlation(profiles.user(0), profiles.user(1));
        assert!((sim + 1.0).abs() < 1e-12);
    }

    #[test]
    fn record_scales_written_back_rows() {
        let training = training();
        let mut session = Session::new(&training);
        session.apply_inverse_user_frequency();
        session.record(3, &[(0, 2.0)], &[(1, 4)]).unwrap();
        let w = (3.0f64 / 2.0).ln();
        assert_eq!(session.profiles().get(3, 0), None);
        assert!((session.profiles().get(3, 1).unwrap() - 4.0 * w).abs() < 1e-12);
        assert_eq!(session.ratings().get(3, 0), Some(2.0));
    }

    #[test]
    fn record_grows_and_rebuilds_stats() {
        let training = training();
        let mut session = Session::new(&training);
        session.record(4, &[(0, 2.0)], &[(2, 4)]).unwrap();
        assert_eq!(session.ratings().n_users(), 5);
        assert_eq!(session.ratings().get(4, 2), Some(4.0));
        assert_eq!(session.ratings().get(3, 0), None);
        assert_eq!(session.stats().user_mean(4), Some(3.0));
        assert_eq!(session.stats().item_mean(2), Some(4.0));
        assert_eq!(training.n_users(), 3);
    }

    #[test]
    fn record_rejects_bad_item() {
        let mut session = Session::new(&training());
        let res = session.record(0, &[], &[(3, 4)]);
        assert!(matches!(res, Err(PredictError::ItemOutOfBounds { item: 3, n_items: 3 })));
    }
}
