// This file is part of cfknn.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

//! Drive the prediction engine over a stream of query batches.
use log::*;

use crate::config::PredictorConfig;
use crate::data::{Prediction, Query, QueryBatch, RatingMatrix, Session};
use crate::errors::PredictError;
use crate::knn::predict_batch;
use crate::knn::weighting::AnomalyCounter;
use crate::progress::ProgressHandle;

/// Runs query batches against one working session.
///
/// In progressive mode each finished batch is written back into the
/// session before the next one runs, so batches must arrive in ascending
/// user order.
pub struct BatchRunner {
    session: Session,
    config: PredictorConfig,
    anomalies: AnomalyCounter,
    last_user: Option<usize>,
}

impl BatchRunner {
    /// Set up a session over `training`, applying the transforms the
    /// configured algorithm needs.
    pub fn new(training: &RatingMatrix, config: PredictorConfig) -> Self {
        debug!(
            "preparing {} on {}x{} matrix with {} ratings",
            config.algorithm,
            training.n_users(),
            training.n_items(),
            training.nnz()
        );
        let mut session = Session::new(training);
        if config.algorithm.uses_iuf() {
            session.apply_inverse_user_frequency();
        }
        BatchRunner {
            session,
            config,
            anomalies: AnomalyCounter::default(),
            last_user: None,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn config(&self) -> &PredictorConfig {
        &self.config
    }

    /// Number of raw predictions clamped into the scale so far.
    pub fn anomalies(&self) -> usize {
        self.anomalies.count()
    }

    /// Predict one batch.
    pub fn run_batch(&mut self, batch: &QueryBatch) -> Result<Vec<Prediction>, PredictError> {
        if self.config.progressive {
            if let Some(previous) = self.last_user {
                if batch.user < previous {
                    return Err(PredictError::OutOfOrder {
                        user: batch.user,
                        previous,
                    });
                }
            }
        }
        self.last_user = Some(batch.user);

        if batch.targets.is_empty() {
            return Ok(Vec::new());
        }

        let predictions = predict_batch(&self.session, batch, &self.config, &mut self.anomalies)?;

        if self.config.progressive {
            let predicted: Vec<(usize, u8)> =
                predictions.iter().map(|p| (p.item, p.rating)).collect();
            self.session.record(batch.user, &batch.known, &predicted)?;
        }

        Ok(predictions)
    }

    /// Predict every batch in order. The first fatal error aborts the run.
    pub fn run(&mut self, batches: &[QueryBatch]) -> Result<Vec<Prediction>, PredictError> {
        let n_targets = batches.iter().map(|b| b.targets.len()).sum();
        info!(
            "predicting {} ratings for {} users with {}",
            n_targets,
            batches.len(),
            self.config.algorithm
        );

        let mut progress = ProgressHandle::new("users", batches.len());
        let mut predictions = Vec::with_capacity(n_targets);
        for batch in batches {
            predictions.extend(self.run_batch(batch)?);
            progress.tick();
        }
        progress.finish();

        if self.anomalies() > 0 {
            info!(
                "{} raw predictions were outside the rating scale and clamped",
                self.anomalies()
            );
        }
        Ok(predictions)
    }

    /// Group a query stream and predict it.
    pub fn run_queries<I: IntoIterator<Item = Query>>(
        &mut self,
        queries: I,
    ) -> Result<Vec<Prediction>, PredictError> {
        let batches = QueryBatch::group(queries);
        self.run(&batches)
    }
}
