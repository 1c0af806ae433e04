// This file is part of cfknn.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

//! Errors raised by the prediction engine.
use thiserror::Error;

/// Fatal conditions while predicting a batch.
///
/// Degenerate similarities and empty neighborhoods are not errors; they
/// resolve to 0 similarity and fallback baselines respectively.
#[derive(Error, Debug)]
pub enum PredictError {
    #[error("prediction {value} for user {user}, item {item} is outside the rating scale after clamping")]
    OutOfRange { user: usize, item: usize, value: u8 },
    #[error("similarity is not a number")]
    NanSimilarity,
    #[error("item {item} is out of bounds for {n_items} items")]
    ItemOutOfBounds { item: usize, n_items: usize },
    #[error("user {user} arrived after user {previous}, but progressive mode requires ascending users")]
    OutOfOrder { user: usize, previous: usize },
    #[error("vector has {found} entries, expected {expected}")]
    Dimension { expected: usize, found: usize },
    #[error("algorithm {0} needs inverse user frequency applied to the session")]
    IufRequired(&'static str),
    #[error("rating scale {min}..={max} is invalid, need 1 <= min <= max")]
    InvalidScale { min: u8, max: u8 },
    #[error("invalid matrix shape: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

#[cfg(feature = "python")]
mod python {
    use pyo3::exceptions::{PyRuntimeError, PyValueError};
    use pyo3::PyErr;

    use super::PredictError;
    use crate::records::RecordError;

    impl From<PredictError> for PyErr {
        fn from(value: PredictError) -> Self {
            match value {
                PredictError::OutOfRange { .. } | PredictError::NanSimilarity => {
                    PyRuntimeError::new_err(format!("{}", value))
                }
                _ => PyValueError::new_err(format!("{}", value)),
            }
        }
    }

    impl From<RecordError> for PyErr {
        fn from(value: RecordError) -> Self {
            PyValueError::new_err(format!("{}", value))
        }
    }
}

