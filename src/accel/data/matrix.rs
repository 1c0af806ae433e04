// This file is part of cfknn.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

//! Dense user × item rating matrix with explicit unknowns.
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

use crate::errors::PredictError;
use crate::knn::weighting::iuf_scale;
use crate::types::{array_from_dense, Rating};

/// User × item ratings. Rows are users, columns are items.
#[derive(Debug, Clone, PartialEq)]
pub struct RatingMatrix {
    ratings: Array2<Rating>,
}

impl RatingMatrix {
    pub fn new(ratings: Array2<Rating>) -> Self {
        RatingMatrix { ratings }
    }

    /// Build a matrix from dense values, where 0 marks an unknown rating.
    pub fn from_dense<T: Into<f64> + Copy>(values: &Array2<T>) -> Self {
        RatingMatrix::new(array_from_dense(values))
    }

    /// Build a matrix from equal-length user rows.
    pub fn from_rows(rows: Vec<Vec<Rating>>) -> Result<Self, PredictError> {
        let n_items = rows.first().map_or(0, Vec::len);
        let n_users = rows.len();
        let mut flat = Vec::with_capacity(n_users * n_items);
        for row in rows {
            if row.len() != n_items {
                return Err(PredictError::Dimension {
                    expected: n_items,
                    found: row.len(),
                });
            }
            flat.extend(row);
        }
        Ok(RatingMatrix::new(Array2::from_shape_vec((n_users, n_items), flat)?))
    }

    pub fn n_users(&self) -> usize {
        self.ratings.nrows()
    }

    pub fn n_items(&self) -> usize {
        self.ratings.ncols()
    }

    pub fn view(&self) -> ArrayView2<'_, Rating> {
        self.ratings.view()
    }

    /// A user's rating vector.
    pub fn user(&self, user: usize) -> ArrayView1<'_, Rating> {
        self.ratings.row(user)
    }

    /// An item's rating vector.
    pub fn item(&self, item: usize) -> ArrayView1<'_, Rating> {
        self.ratings.column(item)
    }

    /// Look up a rating. Out-of-bounds cells are unknown.
    pub fn get(&self, user: usize, item: usize) -> Rating {
        self.ratings.get((user, item)).copied().flatten()
    }

    /// Number of known ratings.
    pub fn nnz(&self) -> usize {
        self.ratings.iter().filter(|r| r.is_some()).count()
    }

    pub(crate) fn set(&mut self, user: usize, item: usize, rating: Rating) {
        self.ratings[[user, item]] = rating;
    }

    /// Grow the matrix with empty users until it has at least `n_users` rows.
    pub(crate) fn ensure_users(&mut self, n_users: usize) -> Result<(), PredictError> {
        if n_users > self.n_users() {
            let empty = Array1::from_elem(self.n_items(), None);
            for _ in self.n_users()..n_users {
                self.ratings.push_row(empty.view())?;
            }
        }
        Ok(())
    }

    /// Scale every known rating in each item column by its inverse user
    /// frequency weight, see [`iuf_scale`].
    pub(crate) fn scale_items(&mut self, weights: &[Option<f64>]) {
        assert_eq!(weights.len(), self.n_items());
        for (mut item, weight) in self.ratings.axis_iter_mut(Axis(1)).zip(weights) {
            item.map_inplace(|r| *r = r.and_then(|v| iuf_scale(v, *weight)));
        }
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    #[test]
    fn from_dense_shape() {
        let m = RatingMatrix::from_dense(&array![[5, 3, 0], [4, 0, 0]]);
        assert_eq!(m.n_users(), 2);
        assert_eq!(m.n_items(), 3);
        assert_eq!(m.nnz(), 3);
        assert_eq!(m.get(0, 1), Some(3.0));
        assert_eq!(m.get(1, 1), None);
        assert_eq!(m.get(7, 1), None);
        assert_eq!(m.item(0).to_vec(), vec![Some(5.0), Some(4.0)]);
    }

    #[test]
    fn from_rows_rejects_ragged() {
        let res = RatingMatrix::from_rows(vec![vec![Some(1.0), None], vec![Some(2.0)]]);
        assert!(matches!(res, Err(PredictError::Dimension { expected: 2, found: 1 })));
    }

    #[test]
    fn ensure_users_appends_empty_rows() {
        let mut m = RatingMatrix::from_dense(&array![[5, 3]]);
        m.ensure_users(3).unwrap();
        assert_eq!(m.n_users(), 3);
        assert_eq!(m.user(2).to_vec(), vec![None, None]);
        assert_eq!(m.get(0, 0), Some(5.0));
    }

    #[test]
    fn scale_items_skips_unknown() {
        let mut m = RatingMatrix::from_dense(&array![[2, 0], [4, 3]]);
        m.scale_items(&[Some(0.5), None]);
        assert_eq!(m.user(0).to_vec(), vec![Some(1.0), None]);
        assert_eq!(m.user(1).to_vec(), vec![Some(2.0), Some(3.0)]);
    }

    #[test]
    fn scale_items_zero_weight_is_unknown() {
        let mut m = RatingMatrix::from_dense(&array![[2, 1], [4, 0]]);
        m.scale_items(&[Some(0.0), Some(2.0)]);
        assert_eq!(m.user(0).to_vec(), vec![None, Some(2.0)]);
        assert_eq!(m.user(1).to_vec(), vec![None, None]);
    }
}
