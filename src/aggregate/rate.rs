//! Network throughput estimation from absolute byte counters.

use crate::metrics::data::NetworkSpeed;
use std::collections::VecDeque;
use tokio::time::Instant;

/// Number of raw rate samples averaged into the reported speed.
pub const RATE_WINDOW: usize = 5;

/// One raw throughput measurement in bytes per second.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateSample {
    pub download: f64,
    pub upload: f64,
    pub timestamp: Instant,
}

#[derive(Debug, Clone, Copy)]
struct Counters {
    rx: u64,
    tx: u64,
    at: Instant,
}

/// Converts successive rx/tx totals into a moving-average throughput.
///
/// The divisor is the measured time since the previous update. Counters that
/// go backwards (interface reset, wrap) contribute a rate of zero.
#[derive(Debug, Default)]
pub struct RateEstimator {
    last: Option<Counters>,
    samples: VecDeque<RateSample>,
}

impl RateEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the current totals, measured now.
    pub fn update(&mut self, rx: u64, tx: u64) -> NetworkSpeed {
        self.update_at(rx, tx, Instant::now())
    }

    /// Feed the current totals measured at `now`.
    pub fn update_at(&mut self, rx: u64, tx: u64, now: Instant) -> NetworkSpeed {
        let Some(last) = self.last.replace(Counters { rx, tx, at: now }) else {
            return NetworkSpeed::default();
        };

        let mut elapsed = now.saturating_duration_since(last.at).as_secs_f64();
        if elapsed <= 0.0 {
            // Two updates on the same clock tick: fall back to a one second interval.
            elapsed = 1.0;
        }

        self.samples.push_back(RateSample {
            download: rx.saturating_sub(last.rx) as f64 / elapsed,
            upload: tx.saturating_sub(last.tx) as f64 / elapsed,
            timestamp: now,
        });
        while self.samples.len() > RATE_WINDOW {
            self.samples.pop_front();
        }

        self.average()
    }

    /// Mean of the samples currently in the window.
    pub fn average(&self) -> NetworkSpeed {
        if self.samples.is_empty() {
            return NetworkSpeed::default();
        }

        let n = self.samples.len() as f64;
        let (download, upload) = self
            .samples
            .iter()
            .fold((0.0, 0.0), |(d, u), s| (d + s.download, u + s.upload));

        NetworkSpeed {
            download: download / n,
            upload: upload / n,
        }
    }

    /// Raw samples in the window, oldest first.
    pub fn samples(&self) -> impl Iterator<Item = &RateSample> {
        self.samples.iter()
    }

    pub fn has_baseline(&self) -> bool {
        self.last.is_some()
    }
}
