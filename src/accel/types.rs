// This file is part of cfknn.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

//! Rating cells and conversions from sentinel-coded data.
use ndarray::{Array1, Array2};

/// A single rating cell. `None` is an unknown rating.
pub type Rating = Option<f64>;

/// Decode a sentinel-coded value, where 0 means "not rated".
#[inline]
pub fn decode_sentinel(value: f64) -> Rating {
    if value == 0.0 {
        None
    } else {
        Some(value)
    }
}

/// Build a rating vector from dense values using 0 as the unknown marker.
pub fn vector_from_dense<T: Into<f64> + Copy>(values: &[T]) -> Array1<Rating> {
    values.iter().map(|v| decode_sentinel((*v).into())).collect()
}

/// Build a rating array from dense values using 0 as the unknown marker.
pub fn array_from_dense<T: Into<f64> + Copy>(values: &Array2<T>) -> Array2<Rating> {
    values.mapv(|v| decode_sentinel(v.into()))
}
