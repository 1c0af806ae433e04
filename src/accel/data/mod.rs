// This file is part of cfknn.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

//! Rating data structures.
mod batch;
mod matrix;
mod session;
mod stats;

pub use batch::{Prediction, Query, QueryBatch};
pub use matrix::RatingMatrix;
pub use session::Session;
pub use stats::PopulationStats;
