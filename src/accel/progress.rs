// This file is part of cfknn.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

use std::time::Instant;

use log::*;

const UPDATE_SECS: f64 = 5.0;

#[derive(Clone, Copy)]
struct UpdateState {
    count: usize,
    time: f64,
    rate: f64,
}

/// Throttled progress reporting through the log.
///
/// At most one `info` line is written per [`UPDATE_SECS`].
pub(crate) struct ProgressHandle {
    label: &'static str,
    total: usize,
    start: Instant,
    count: usize,
    last_update: Option<UpdateState>,
}

impl ProgressHandle {
    pub fn new(label: &'static str, total: usize) -> Self {
        ProgressHandle {
            label,
            total,
            start: Instant::now(),
            count: 0,
            last_update: None,
        }
    }

    pub fn tick(&mut self) {
        self.advance(1);
    }

    pub fn advance(&mut self, n: usize) {
        self.count += n;

        let thresh = if let Some(lu) = self.last_update {
            // bail early if the rate estimate says we don't need to update
            let n = (self.count - lu.count) as f64;
            if lu.rate > 0.0 && n / lu.rate < UPDATE_SECS * 0.95 {
                return;
            }
            lu.time
        } else {
            0.0
        };

        let time = self.start.elapsed().as_secs_f64();
        if time < thresh + UPDATE_SECS {
            return;
        }

        let rate = self.count as f64 / time;
        self.last_update = Some(UpdateState {
            count: self.count,
            time,
            rate,
        });
        info!(
            "{}: {}/{} ({:.1}/s)",
            self.label, self.count, self.total, rate
        );
    }

    /// Log the final count and elapsed time.
    pub fn finish(&self) {
        info!(
            "{}: finished {} in {:.2}s",
            self.label,
            self.count,
            self.start.elapsed().as_secs_f64()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_ticks() {
        let mut pb = ProgressHandle::new("test", 3);
        pb.tick();
        pb.advance(2);
        assert_eq!(pb.count, 3);
        pb.finish();
    }
}
