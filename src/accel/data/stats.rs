// This file is part of cfknn.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

//! Population statistics computed once per rating matrix.
use log::*;
use ndarray::{Array1, ArrayView1, Axis};

use crate::knn::weighting::restricted_mean;
use crate::types::Rating;

use super::RatingMatrix;

/// Per-user and per-item mean ratings over known entries.
///
/// These are built from a whole matrix and handed to the similarity and
/// aggregation code explicitly. Mutating the matrix afterwards requires
/// building them again.
#[derive(Debug, Clone, PartialEq)]
pub struct PopulationStats {
    user_means: Array1<Rating>,
    item_means: Array1<Rating>,
}

impl PopulationStats {
    pub fn build(matrix: &RatingMatrix) -> Self {
        let view = matrix.view();
        let user_means: Array1<Rating> = view.axis_iter(Axis(0)).map(|u| restricted_mean(u)).collect();
        let item_means: Array1<Rating> = view.axis_iter(Axis(1)).map(|i| restricted_mean(i)).collect();
        debug!(
            "computed means for {} users and {} items",
            user_means.len(),
            item_means.len()
        );
        PopulationStats {
            user_means,
            item_means,
        }
    }

    pub fn user_means(&self) -> ArrayView1<'_, Rating> {
        self.user_means.view()
    }

    pub fn user_mean(&self, user: usize) -> Rating {
        self.user_means.get(user).copied().flatten()
    }

    pub fn item_mean(&self, item: usize) -> Rating {
        self.item_means.get(item).copied().flatten()
    }
}
