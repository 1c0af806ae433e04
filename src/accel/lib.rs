// This file is part of cfknn.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

//! Neighborhood collaborative filtering for explicit 1–5 ratings.
//!
//! Training data is a dense [`RatingMatrix`] with explicit unknowns. A
//! [`BatchRunner`] works on a private [`Session`] copy of it, so the
//! training matrix is never modified, and predicts one [`QueryBatch`] per
//! user with the configured [`Algorithm`].

pub mod config;
pub mod data;
pub mod errors;
pub mod knn;
mod progress;
pub mod records;
pub mod runner;
pub mod types;

pub use config::{PoolKind, PredictorConfig};
pub use data::{PopulationStats, Prediction, Query, QueryBatch, RatingMatrix, Session};
pub use errors::PredictError;
pub use knn::Algorithm;
pub use records::RecordError;
pub use runner::BatchRunner;
pub use types::Rating;

#[cfg(feature = "python")]
mod python;

#[cfg(feature = "python")]
use pyo3::prelude::*;

/// Entry point for the Python extension module.
#[cfg(feature = "python")]
#[pymodule]
fn _cfknn(m: &Bound<'_, PyModule>) -> PyResult<()> {
    pyo3_log::init();
    python::register_knn(m)?;
    m.add_function(wrap_pyfunction!(python::predict_batches, m)?)?;
    Ok(())
}
