// This file is part of cfknn.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

//! Neighborhood collaborative filtering.
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::{PoolKind, PredictorConfig};
use crate::data::{Prediction, QueryBatch, Session};
use crate::errors::PredictError;

mod accum;
pub mod item_score;
pub mod similarity;
pub mod user_score;
pub mod weighting;

pub use item_score::{predict_item_based, ItemScoreParams};
pub use user_score::{predict_user_based, NeighborPool, UserScoreParams, UserTarget};

use similarity::{cosine_similarity, pearson_correlation, SimilarityFn};
use weighting::AnomalyCounter;

/// The prediction variants.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum Algorithm {
    /// User-based, cosine weights, plain weighted average.
    UserCosine,
    /// User-based, Pearson weights, mean-centered.
    UserPearson,
    /// User-based Pearson with case amplification.
    UserPearsonCase,
    /// User-based Pearson on IUF-scaled profiles.
    UserPearsonIuf,
    /// User-based Pearson with case amplification on IUF-scaled profiles.
    UserPearsonCaseIuf,
    /// Item-based, adjusted cosine weights, plain weighted average.
    Item,
    /// Item-based, adjusted cosine weights, mean-centered.
    #[default]
    ItemCentered,
}

impl Algorithm {
    pub const ALL: [Algorithm; 7] = [
        Algorithm::UserCosine,
        Algorithm::UserPearson,
        Algorithm::UserPearsonCase,
        Algorithm::UserPearsonIuf,
        Algorithm::UserPearsonCaseIuf,
        Algorithm::Item,
        Algorithm::ItemCentered,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Algorithm::UserCosine => "user-cosine",
            Algorithm::UserPearson => "user-pearson",
            Algorithm::UserPearsonCase => "user-pearson-case",
            Algorithm::UserPearsonIuf => "user-pearson-iuf",
            Algorithm::UserPearsonCaseIuf => "user-pearson-case-iuf",
            Algorithm::Item => "item",
            Algorithm::ItemCentered => "item-centered",
        }
    }

    pub fn is_item_based(self) -> bool {
        matches!(self, Algorithm::Item | Algorithm::ItemCentered)
    }

    pub fn uses_iuf(self) -> bool {
        matches!(self, Algorithm::UserPearsonIuf | Algorithm::UserPearsonCaseIuf)
    }

    pub fn case_amplified(self) -> bool {
        matches!(self, Algorithm::UserPearsonCase | Algorithm::UserPearsonCaseIuf)
    }

    pub fn mean_centered(self) -> bool {
        !matches!(self, Algorithm::UserCosine | Algorithm::Item)
    }

    /// The user-to-user similarity function, for user-based variants.
    pub fn user_similarity(self) -> Option<SimilarityFn> {
        match self {
            Algorithm::UserCosine => Some(cosine_similarity),
            Algorithm::Item | Algorithm::ItemCentered => None,
            _ => Some(pearson_correlation),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Algorithm::ALL
            .into_iter()
            .find(|a| a.name() == s)
            .ok_or_else(|| format!("unknown algorithm '{}'", s))
    }
}

/// Predict every requested item of one query batch.
///
/// The session must already be in the state the algorithm expects: IUF
/// variants need [`Session::apply_inverse_user_frequency`] to have run.
pub fn predict_batch(
    session: &Session,
    batch: &QueryBatch,
    config: &PredictorConfig,
    anomalies: &mut AnomalyCounter,
) -> Result<Vec<Prediction>, PredictError> {
    config.scale.validate()?;
    let algorithm = config.algorithm;
    if algorithm.uses_iuf() && !session.iuf_applied() {
        return Err(PredictError::IufRequired(algorithm.name()));
    }

    let ratings = match algorithm.user_similarity() {
        None => {
            let params = ItemScoreParams {
                mean_center: algorithm.mean_centered(),
                max_neighbors: config.max_neighbors,
                scale: config.scale,
            };
            predict_item_based(
                session.ratings(),
                session.stats(),
                batch.user,
                &batch.known,
                &batch.targets,
                &params,
                anomalies,
            )?
        }
        Some(similarity) => {
            let params = UserScoreParams {
                similarity,
                case_exponent: algorithm.case_amplified().then_some(config.case_exponent),
                mean_center: algorithm.mean_centered(),
                max_neighbors: config.max_neighbors,
                scale: config.scale,
            };
            let known = batch.known_vector(session.n_items())?;
            let profile = session.profile_of(known.view());
            let target = UserTarget {
                user: batch.user,
                profile: profile.view(),
                ratings: known.view(),
            };
            let pool = match config.pool {
                PoolKind::All => NeighborPool::all(session, Some(batch.user)),
                PoolKind::Preceding => NeighborPool::preceding(session, batch.user),
            };
            predict_user_based(&pool, &target, &batch.targets, &params, anomalies)?
        }
    };

    Ok(batch
        .targets
        .iter()
        .zip(ratings)
        .map(|(item, rating)| Prediction {
            user: batch.user,
            item: *item,
            rating,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;
    use crate::data::RatingMatrix;

    #[test]
    fn names_roundtrip() {
        for a in Algorithm::ALL {
            assert_eq!(a.name().parse::<Algorithm>().unwrap(), a);
            assert_eq!(a.to_string(), a.name());
        }
        assert!("user-jaccard".parse::<Algorithm>().is_err());
    }

    #[test]
    fn variant_flags() {
        assert!(Algorithm::UserPearsonCaseIuf.uses_iuf());
        assert!(Algorithm::UserPearsonCaseIuf.case_amplified());
        assert!(!Algorithm::UserCosine.mean_centered());
        assert!(!Algorithm::Item.mean_centered());
        assert!(Algorithm::ItemCentered.mean_centered());
        assert!(Algorithm::Item.user_similarity().is_none());
    }

    #[test]
    fn iuf_variant_needs_transform() {
        let m = RatingMatrix::from_dense(&array![[5, 3], [4, 2]]);
        let session = Session::new(&m);
        let batch = QueryBatch {
            user: 2,
            known: vec![(0, 4.0)],
            targets: vec![1],
        };
        let config = PredictorConfig::with_algorithm(Algorithm::UserPearsonIuf);
        let mut anomalies = AnomalyCounter::default();
        let res = predict_batch(&session, &batch, &config, &mut anomalies);
        assert!(matches!(res, Err(PredictError::IufRequired(_))));
    }

    #[test]
    fn golden_item_centered() {
        let m = RatingMatrix::from_dense(&array![[5, 3, 0], [4, 0, 0], [1, 1, 0]]);
        let session = Session::new(&m);
        let batch = QueryBatch {
            user: 0,
            known: vec![(0, 5.0), (1, 3.0)],
            targets: vec![2],
        };
        let config = PredictorConfig::with_algorithm(Algorithm::ItemCentered);
        let mut anomalies = AnomalyCounter::default();
        let preds = predict_batch(&session, &batch, &config, &mut anomalies).unwrap();
        assert_eq!(
            preds,
            vec![Prediction {
                user: 0,
                item: 2,
                rating: 3
            }]
        );
    }
}
