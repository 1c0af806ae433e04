// This file is part of cfknn.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

//! Weighting and normalization helpers.
use log::*;
use ndarray::{ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use crate::errors::PredictError;
use crate::types::Rating;

/// Default case-amplification exponent.
pub const DEFAULT_CASE_EXPONENT: f64 = 2.5;

/// Inverse user frequency of every item column.
///
/// For `m` users and `m_j` users who rated item `j`, the weight is
/// `ln(m / m_j)`. Items nobody rated get `None` (no adjustment).
pub fn inverse_user_frequency(ratings: ArrayView2<'_, Rating>) -> Vec<Option<f64>> {
    let m = ratings.nrows() as f64;
    ratings
        .axis_iter(Axis(1))
        .map(|item| {
            let m_j = item.iter().filter(|r| r.is_some()).count();
            if m_j == 0 {
                None
            } else {
                Some((m / m_j as f64).ln())
            }
        })
        .collect()
}

/// Scale one known rating by its item's inverse user frequency.
///
/// A weight of 0 marks an item every user rated; the scaled cell is
/// unknown, so the item drops out of co-rated sets. A `None` weight leaves
/// the rating alone.
#[inline]
pub fn iuf_scale(rating: f64, weight: Option<f64>) -> Rating {
    match weight {
        Some(w) if w == 0.0 => None,
        Some(w) => Some(rating * w),
        None => Some(rating),
    }
}

/// Case amplification: `w * |w|^(p - 1)`.
#[inline]
pub fn case_amplify(weight: f64, exponent: f64) -> f64 {
    weight * weight.abs().powf(exponent - 1.0)
}

/// Mean of the known ratings, or `None` if nothing is known.
pub fn restricted_mean<'a, I>(ratings: I) -> Option<f64>
where
    I: IntoIterator<Item = &'a Rating>,
{
    let (sum, n) = ratings
        .into_iter()
        .flatten()
        .fold((0.0, 0usize), |(sum, n), r| (sum + r, n + 1));
    if n > 0 {
        Some(sum / n as f64)
    } else {
        None
    }
}

/// Integer rating scale that predictions are clamped to.
///
/// Deserializing checks the bounds; a scale built by hand can be checked
/// with [`RatingScale::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ScaleBounds")]
pub struct RatingScale {
    pub min: u8,
    pub max: u8,
}

#[derive(Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ScaleBounds {
    min: u8,
    max: u8,
}

impl Default for ScaleBounds {
    fn default() -> Self {
        let RatingScale { min, max } = RatingScale::default();
        ScaleBounds { min, max }
    }
}

impl TryFrom<ScaleBounds> for RatingScale {
    type Error = PredictError;

    fn try_from(bounds: ScaleBounds) -> Result<Self, Self::Error> {
        RatingScale::new(bounds.min, bounds.max)
    }
}

impl Default for RatingScale {
    fn default() -> Self {
        RatingScale { min: 1, max: 5 }
    }
}

impl RatingScale {
    /// Create a scale, checking that `1 <= min <= max`.
    pub fn new(min: u8, max: u8) -> Result<Self, PredictError> {
        let scale = RatingScale { min, max };
        scale.validate()?;
        Ok(scale)
    }

    /// Check the bounds. 0 is reserved for unknown ratings in record files.
    pub fn validate(&self) -> Result<(), PredictError> {
        if self.min == 0 || self.min > self.max {
            Err(PredictError::InvalidScale {
                min: self.min,
                max: self.max,
            })
        } else {
            Ok(())
        }
    }

    /// Midpoint of the scale, the fallback for unknown baselines.
    pub fn midpoint(&self) -> f64 {
        (self.min as f64 + self.max as f64) / 2.0
    }

    pub fn contains(&self, value: u8) -> bool {
        (self.min..=self.max).contains(&value)
    }

    /// Round half to even, then clamp into the scale. NaN stays NaN and
    /// converts to 0.
    pub fn round_and_clamp(&self, value: f64) -> u8 {
        let (lo, hi) = (self.min as f64, self.max as f64);
        let rounded = value.round_ties_even();
        let clamped = if rounded < lo {
            lo
        } else if rounded > hi {
            hi
        } else {
            rounded
        };
        clamped as u8
    }

    /// Turn a raw prediction into a checked integer rating.
    ///
    /// Out-of-scale raw values are counted and clamped. A value that is
    /// still outside the scale after clamping is fatal.
    pub fn finish(
        &self,
        user: usize,
        item: usize,
        raw: f64,
        anomalies: &mut AnomalyCounter,
    ) -> Result<u8, PredictError> {
        self.validate()?;
        let rounded = raw.round_ties_even();
        if rounded < self.min as f64 || rounded > self.max as f64 {
            anomalies.record(user, item, raw);
        }

        let value = self.round_and_clamp(raw);
        if self.contains(value) {
            Ok(value)
        } else {
            Err(PredictError::OutOfRange { user, item, value })
        }
    }
}

/// Round and clamp into the default 1..=5 scale.
pub fn round_and_clamp(value: f64) -> u8 {
    RatingScale::default().round_and_clamp(value)
}

/// Counts raw predictions that fell outside the scale before clamping.
#[derive(Debug, Default, Clone)]
pub struct AnomalyCounter {
    count: usize,
}

impl AnomalyCounter {
    pub fn record(&mut self, user: usize, item: usize, raw: f64) {
        self.count += 1;
        warn!(
            "raw prediction {:.3} for user {}, item {} is outside the rating scale",
            raw, user, item
        );
    }

    pub fn count(&self) -> usize {
        self.count
    }
}
