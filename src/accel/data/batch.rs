// This file is part of cfknn.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

//! Queries, per-user query batches, and predictions.
use ndarray::Array1;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::errors::PredictError;
use crate::types::Rating;

/// One line of a query stream, with 0-based ids.
///
/// A known rating is context for the user; an unknown one is a request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Query {
    pub user: usize,
    pub item: usize,
    pub rating: Option<u8>,
}

/// A single user's known ratings and the items to predict for them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryBatch {
    pub user: usize,
    /// Known ratings, in first-seen order.
    pub known: Vec<(usize, f64)>,
    /// Items whose ratings are requested, in request order.
    pub targets: Vec<usize>,
}

/// A finished prediction, with 0-based ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prediction {
    pub user: usize,
    pub item: usize,
    pub rating: u8,
}

impl QueryBatch {
    pub fn new(user: usize) -> Self {
        QueryBatch {
            user,
            ..Default::default()
        }
    }

    /// Group a query stream into batches of contiguous queries for the same
    /// user. A repeated known rating for the same item replaces the earlier
    /// one.
    pub fn group<I: IntoIterator<Item = Query>>(queries: I) -> Vec<QueryBatch> {
        let mut batches = Vec::new();
        let mut current: Option<QueryBatch> = None;
        let mut positions: FxHashMap<usize, usize> = FxHashMap::default();

        for q in queries {
            if current.as_ref().is_some_and(|b| b.user != q.user) {
                batches.extend(current.take());
                positions.clear();
            }
            let batch = current.get_or_insert_with(|| QueryBatch::new(q.user));
            match q.rating {
                Some(r) => {
                    let r = r as f64;
                    if let Some(pos) = positions.get(&q.item) {
                        batch.known[*pos].1 = r;
                    } else {
                        positions.insert(q.item, batch.known.len());
                        batch.known.push((q.item, r));
                    }
                }
                None => batch.targets.push(q.item),
            }
        }
        batches.extend(current);
        batches
    }

    /// The user's known ratings as a dense vector over `n_items`.
    pub fn known_vector(&self, n_items: usize) -> Result<Array1<Rating>, PredictError> {
        let mut vector = Array1::from_elem(n_items, None);
        for (item, rating) in &self.known {
            let cell = vector.get_mut(*item).ok_or(PredictError::ItemOutOfBounds {
                item: *item,
                n_items,
            })?;
            *cell = Some(*rating);
        }
        Ok(vector)
    }
}
