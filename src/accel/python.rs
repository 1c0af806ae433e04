// This file is part of cfknn.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

//! Python bindings.
use ndarray::Array1;
use numpy::{PyReadonlyArray1, PyReadonlyArray2};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::config::PredictorConfig;
use crate::data::RatingMatrix;
use crate::knn::similarity::{adjusted_cosine_similarity, cosine_similarity, pearson_correlation};
use crate::knn::Algorithm;
use crate::records::query_from_triple;
use crate::runner::BatchRunner;
use crate::types::{decode_sentinel, Rating};

pub fn register_knn(parent: &Bound<'_, PyModule>) -> PyResult<()> {
    let knn = PyModule::new(parent.py(), "knn")?;
    parent.add_submodule(&knn)?;
    knn.add_function(wrap_pyfunction!(cosine, &knn)?)?;
    knn.add_function(wrap_pyfunction!(pearson, &knn)?)?;
    knn.add_function(wrap_pyfunction!(adjusted_cosine, &knn)?)?;
    Ok(())
}

/// Predict ratings for a stream of `(user, item, rating)` triples.
///
/// `ratings` is the training matrix with 0 for unknown ratings. Triples use
/// 1-based ids and a rating of 0 to request a prediction; the result holds
/// one 1-based `(user, item, rating)` triple per request.
#[pyfunction]
#[pyo3(signature = (ratings, queries, algorithm="item-centered", progressive=false))]
pub fn predict_batches<'py>(
    py: Python<'py>,
    ratings: PyReadonlyArray2<'py, f64>,
    queries: Vec<(i64, i64, i64)>,
    algorithm: &str,
    progressive: bool,
) -> PyResult<Vec<(usize, usize, u8)>> {
    let algorithm: Algorithm = algorithm.parse().map_err(PyValueError::new_err)?;
    let config = PredictorConfig {
        progressive,
        ..PredictorConfig::with_algorithm(algorithm)
    };
    let training = RatingMatrix::new(ratings.as_array().mapv(decode_sentinel));
    let queries = queries
        .iter()
        .enumerate()
        .map(|(i, (u, it, r))| query_from_triple(i + 1, *u, *it, *r, &config.scale))
        .collect::<Result<Vec<_>, _>>()?;

    let predictions = py.allow_threads(|| {
        let mut runner = BatchRunner::new(&training, config);
        runner.run_queries(queries)
    })?;

    Ok(predictions
        .into_iter()
        .map(|p| (p.user + 1, p.item + 1, p.rating))
        .collect())
}

/// Cosine similarity of two 0-coded rating vectors.
#[pyfunction]
pub fn cosine<'py>(a: PyReadonlyArray1<'py, f64>, b: PyReadonlyArray1<'py, f64>) -> PyResult<f64> {
    let (a, b) = decode_pair(&a, &b)?;
    Ok(cosine_similarity(a.view(), b.view()))
}

/// Pearson correlation of two 0-coded rating vectors.
#[pyfunction]
pub fn pearson<'py>(a: PyReadonlyArray1<'py, f64>, b: PyReadonlyArray1<'py, f64>) -> PyResult<f64> {
    let (a, b) = decode_pair(&a, &b)?;
    Ok(pearson_correlation(a.view(), b.view()))
}

/// Adjusted cosine similarity of two 0-coded item columns, given the
/// users' mean ratings.
#[pyfunction]
pub fn adjusted_cosine<'py>(
    a: PyReadonlyArray1<'py, f64>,
    b: PyReadonlyArray1<'py, f64>,
    user_means: PyReadonlyArray1<'py, f64>,
) -> PyResult<f64> {
    let (a, b) = decode_pair(&a, &b)?;
    let means = user_means.as_array().mapv(decode_sentinel);
    if means.len() != a.len() {
        return Err(PyValueError::new_err(format!(
            "{} user means for {} users",
            means.len(),
            a.len()
        )));
    }
    Ok(adjusted_cosine_similarity(a.view(), b.view(), means.view()))
}

fn decode_pair(
    a: &PyReadonlyArray1<'_, f64>,
    b: &PyReadonlyArray1<'_, f64>,
) -> PyResult<(Array1<Rating>, Array1<Rating>)> {
    let a = a.as_array();
    let b = b.as_array();
    if a.len() != b.len() {
        return Err(PyValueError::new_err(format!(
            "vector lengths differ: {} != {}",
            a.len(),
            b.len()
        )));
    }
    Ok((a.mapv(decode_sentinel), b.mapv(decode_sentinel)))
}
