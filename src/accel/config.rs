// This file is part of cfknn.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

//! Predictor configuration.
use serde::{Deserialize, Serialize};

use crate::knn::weighting::{RatingScale, DEFAULT_CASE_EXPONENT};
use crate::knn::Algorithm;

/// Which users are candidate neighbors in user-based prediction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum PoolKind {
    /// Every user in the working matrix except the target.
    #[default]
    All,
    /// Only users with a smaller id than the target.
    Preceding,
}

/// Options for a prediction run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PredictorConfig {
    pub algorithm: Algorithm,
    /// Exponent for the case-amplified variants.
    pub case_exponent: f64,
    pub pool: PoolKind,
    /// Write each finished user back into the working matrix.
    pub progressive: bool,
    /// Keep only this many strongest neighbors per target.
    pub max_neighbors: Option<usize>,
    pub scale: RatingScale,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        PredictorConfig {
            algorithm: Algorithm::default(),
            case_exponent: DEFAULT_CASE_EXPONENT,
            pool: PoolKind::default(),
            progressive: false,
            max_neighbors: None,
            scale: RatingScale::default(),
        }
    }
}

impl PredictorConfig {
    pub fn with_algorithm(algorithm: Algorithm) -> Self {
        PredictorConfig {
            algorithm,
            ..Default::default()
        }
    }

    /// Parse a configuration from JSON. Missing fields take defaults.
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
