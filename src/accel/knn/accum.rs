// This file is part of cfknn.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

//! Accumulator for weighted neighbor ratings in k-NN.
use std::collections::BinaryHeap;

use ordered_float::NotNan;

use crate::errors::PredictError;

/// Accumulate weighted neighbor values for one prediction target.
///
/// Without a limit every neighbor is kept, in insertion order. With a
/// limit, only the neighbors with the largest absolute weight survive.
#[derive(Clone, Default)]
pub(crate) enum NeighborAccumulator {
    #[default]
    Empty,
    Partial(Vec<AccEntry>),
    Full(BinaryHeap<AccEntry>),
}

impl NeighborAccumulator {
    pub fn new() -> Self {
        Self::Empty
    }

    fn heap_mut(&mut self) -> &mut BinaryHeap<AccEntry> {
        match self {
            Self::Full(h) => h,
            Self::Empty => {
                *self = Self::Full(BinaryHeap::new());
                self.heap_mut()
            }
            Self::Partial(vec) => {
                let mut heap = BinaryHeap::with_capacity(vec.len() + 1);
                while let Some(v) = vec.pop() {
                    heap.push(v);
                }
                *self = Self::Full(heap);
                self.heap_mut()
            }
        }
    }

    fn vector_mut(&mut self, limit: Option<usize>) -> Option<&mut Vec<AccEntry>> {
        match self {
            Self::Empty => {
                *self = Self::Partial(Vec::with_capacity(limit.unwrap_or(0)));
                self.vector_mut(limit)
            }
            Self::Partial(vec) if limit.map_or(true, |k| vec.len() < k) => Some(vec),
            _ => None,
        }
    }

    /// Add a neighbor's weight and value.
    pub fn add_value(
        &mut self,
        limit: Option<usize>,
        weight: f64,
        value: f64,
    ) -> Result<(), PredictError> {
        if limit == Some(0) {
            return Ok(());
        }

        let entry = AccEntry::new(weight, value)?;
        if let Some(vec) = self.vector_mut(limit) {
            vec.push(entry);
        } else {
            let heap = self.heap_mut();
            // the heap is full whenever we get here, so peek always succeeds
            if heap.peek().is_some_and(|top| entry.strength > top.strength) {
                heap.push(entry);
                while limit.is_some_and(|k| heap.len() > k) {
                    heap.pop();
                }
            }
        }

        Ok(())
    }

    /// Sum of absolute weights.
    pub fn total_weight(&self) -> f64 {
        self.entries().map(AccEntry::get_strength).sum()
    }

    /// Sum of weight × value.
    pub fn weighted_sum(&self) -> f64 {
        self.entries().map(|a| a.weight * a.value).sum()
    }

    /// Weighted average of the values, or `fallback` when no neighbor
    /// carries any weight.
    pub fn average_or(&self, fallback: f64) -> f64 {
        let total = self.total_weight();
        if total == 0.0 {
            fallback
        } else {
            self.weighted_sum() / total
        }
    }

    fn entries(&self) -> Box<dyn Iterator<Item = &AccEntry> + '_> {
        match self {
            Self::Empty => Box::new(std::iter::empty()),
            Self::Partial(vec) => Box::new(vec.iter()),
            Self::Full(heap) => Box::new(heap.iter()),
        }
    }
}

/// Entries in the accumulator heaps.
#[derive(Debug, Clone, Copy)]
pub(crate) struct AccEntry {
    strength: NotNan<f64>,
    weight: f64,
    value: f64,
}

impl AccEntry {
    fn new(weight: f64, value: f64) -> Result<AccEntry, PredictError> {
        Ok(AccEntry {
            strength: NotNan::new(weight.abs()).map_err(|_e| PredictError::NanSimilarity)?,
            weight,
            value,
        })
    }

    fn get_strength(&self) -> f64 {
        self.strength.into_inner()
    }
}

impl PartialEq for AccEntry {
    fn eq(&self, other: &Self) -> bool {
        self.strength == other.strength
    }
}

impl Eq for AccEntry {}

impl PartialOrd for AccEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for AccEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // reverse the ordering to make a min-heap
        other.strength.cmp(&self.strength)
    }
}
