//! Counters describing load queue behaviour.
//!
//! Each [`crate::pipeline::LoadQueue`] owns a collector; UI diagnostics read it through
//! [`QueueStats::snapshot`].

use std::cmp::Ordering;
use std::collections::VecDeque;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::Serialize;
use tracing::warn;

const DEFAULT_SAMPLE_CAPACITY: usize = 240;

#[derive(Debug, Default)]
struct SampleWindow {
    samples: VecDeque<f32>,
    capacity: usize,
}

impl SampleWindow {
    fn new(capacity: usize) -> Self {
        Self { samples: VecDeque::with_capacity(capacity), capacity }
    }

    fn push(&mut self, value: f32) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(value);
    }

    fn percentile(&self, percentile: f32) -> f32 {
        if self.samples.is_empty() {
            return 0.0;
        }

        let mut sorted: Vec<f32> = self.samples.iter().copied().collect();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

        let rank = percentile.clamp(0.0, 1.0) * (sorted.len() - 1) as f32;
        sorted.get(rank.round() as usize).copied().unwrap_or(0.0)
    }
}

#[derive(Debug)]
struct StatsInner {
    load_times_ms: SampleWindow,
    loads_started: u64,
    loads_completed: u64,
    loads_panicked: u64,
    requests_queued: u64,
    requests_coalesced: u64,
    in_flight: usize,
    pending: usize,
    peak_in_flight: usize,
}

impl Default for StatsInner {
    fn default() -> Self {
        Self {
            load_times_ms: SampleWindow::new(DEFAULT_SAMPLE_CAPACITY),
            loads_started: 0,
            loads_completed: 0,
            loads_panicked: 0,
            requests_queued: 0,
            requests_coalesced: 0,
            in_flight: 0,
            pending: 0,
            peak_in_flight: 0,
        }
    }
}

/// Thread-safe counters for one queue.
#[derive(Debug, Default)]
pub struct QueueStats {
    inner: parking_lot::Mutex<StatsInner>,
}

impl QueueStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_started(&self) {
        let mut guard = self.inner.lock();
        guard.loads_started = guard.loads_started.saturating_add(1);
    }

    pub fn record_queued(&self) {
        let mut guard = self.inner.lock();
        guard.requests_queued = guard.requests_queued.saturating_add(1);
    }

    pub fn record_coalesced(&self) {
        let mut guard = self.inner.lock();
        guard.requests_coalesced = guard.requests_coalesced.saturating_add(1);
    }

    /// Record a settled load. Panicked loads count as completed too.
    pub fn record_finished(&self, duration: Duration, panicked: bool) {
        let mut guard = self.inner.lock();
        guard.loads_completed = guard.loads_completed.saturating_add(1);
        if panicked {
            guard.loads_panicked = guard.loads_panicked.saturating_add(1);
        }
        guard.load_times_ms.push(duration.as_secs_f64() as f32 * 1_000.0);
    }

    pub fn update_occupancy(&self, in_flight: usize, pending: usize) {
        let mut guard = self.inner.lock();
        guard.in_flight = in_flight;
        guard.pending = pending;
        guard.peak_in_flight = guard.peak_in_flight.max(in_flight);
    }

    pub fn snapshot(&self) -> QueueSnapshot {
        let guard = self.inner.lock();
        QueueSnapshot {
            timestamp_ms: now_ms(),
            loads_started: guard.loads_started,
            loads_completed: guard.loads_completed,
            loads_panicked: guard.loads_panicked,
            requests_queued: guard.requests_queued,
            requests_coalesced: guard.requests_coalesced,
            in_flight: guard.in_flight,
            pending: guard.pending,
            peak_in_flight: guard.peak_in_flight,
            load_time_ms_p50: guard.load_times_ms.percentile(0.50),
            load_time_ms_p95: guard.load_times_ms.percentile(0.95),
        }
    }
}

fn now_ms() -> u64 {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(delta) => delta.as_millis() as u64,
        Err(err) => {
            warn!("system clock error: {err}");
            0
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueSnapshot {
    pub timestamp_ms: u64,
    pub loads_started: u64,
    pub loads_completed: u64,
    pub loads_panicked: u64,
    pub requests_queued: u64,
    pub requests_coalesced: u64,
    pub in_flight: usize,
    pub pending: usize,
    pub peak_in_flight: usize,
    pub load_time_ms_p50: f32,
    pub load_time_ms_p95: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_percentiles_are_computed() {
        let stats = QueueStats::new();
        stats.record_finished(Duration::from_millis(10), false);
        stats.record_finished(Duration::from_millis(20), false);
        stats.record_finished(Duration::from_millis(30), true);

        let snap = stats.snapshot();
        assert_eq!(snap.loads_completed, 3);
        assert_eq!(snap.loads_panicked, 1);
        assert!(snap.load_time_ms_p50 >= 19.0 && snap.load_time_ms_p50 <= 21.0);
        assert!(snap.load_time_ms_p95 >= snap.load_time_ms_p50);
    }

    #[test]
    fn occupancy_tracks_peak() {
        let stats = QueueStats::new();
        stats.update_occupancy(3, 7);
        stats.update_occupancy(1, 0);
        stats.record_queued();
        stats.record_coalesced();

        let snap = stats.snapshot();
        assert_eq!(snap.in_flight, 1);
        assert_eq!(snap.pending, 0);
        assert_eq!(snap.peak_in_flight, 3);
        assert_eq!(snap.requests_queued, 1);
        assert_eq!(snap.requests_coalesced, 1);
    }

    #[test]
    fn sample_window_drops_oldest() {
        let mut window = SampleWindow::new(2);
        window.push(1.0);
        window.push(2.0);
        window.push(100.0);
        assert_eq!(window.percentile(0.0), 2.0);
    }
}
