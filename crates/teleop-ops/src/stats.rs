use std::{collections::VecDeque, fmt};

use chrono::Utc;
use teleop_types::telemetry::StatsSnapshot;

pub const DEFAULT_STATS_WINDOW: usize = 100;

/// Fixed-capacity FIFO of recent measurements.
#[derive(Debug, Clone)]
struct Window<T> {
    values: VecDeque<T>,
    capacity: usize,
}

impl<T: Copy + Into<f64>> Window<T> {
    fn new(capacity: usize) -> Self {
        Self {
            values: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    fn push(&mut self, value: T) {
        self.values.push_back(value);
        while self.values.len() > self.capacity {
            self.values.pop_front();
        }
    }

    fn average(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.values.iter().map(|&v| v.into()).sum();
        sum / self.values.len() as f64
    }

    fn len(&self) -> usize {
        self.values.len()
    }
}

/// Rolling averages over the most recent commands plus lifetime counters.
///
/// Not internally synchronised; one driving task owns it.
#[derive(Debug, Clone)]
pub struct LatencyStats {
    latency_ms: Window<f64>,
    decode_us: Window<u32>,
    process_us: Window<u32>,
    encode_us: Window<u32>,
    received_count: u64,
    acknowledged_count: u64,
}

impl LatencyStats {
    pub fn new(window: usize) -> Self {
        let window = window.max(1);
        Self {
            latency_ms: Window::new(window),
            decode_us: Window::new(window),
            process_us: Window::new(window),
            encode_us: Window::new(window),
            received_count: 0,
            acknowledged_count: 0,
        }
    }

    /// Record one received command. Negative or non-finite latencies (clock
    /// skew, unstamped origin) are left out of the latency window only.
    pub fn record(&mut self, latency_ms: f64, decode_us: u32, process_us: u32, encode_us: u32) {
        if latency_ms >= 0.0 && latency_ms.is_finite() {
            self.latency_ms.push(latency_ms);
        }
        self.decode_us.push(decode_us);
        self.process_us.push(process_us);
        self.encode_us.push(encode_us);
        self.received_count += 1;
    }

    /// Called by the driving loop once per acknowledgment actually sent.
    pub fn record_ack(&mut self) {
        self.acknowledged_count += 1;
    }

    pub fn average_latency_ms(&self) -> f64 {
        self.latency_ms.average()
    }

    pub fn average_decode_us(&self) -> f64 {
        self.decode_us.average()
    }

    pub fn average_process_us(&self) -> f64 {
        self.process_us.average()
    }

    pub fn average_encode_us(&self) -> f64 {
        self.encode_us.average()
    }

    pub fn latency_samples(&self) -> usize {
        self.latency_ms.len()
    }

    pub fn received_count(&self) -> u64 {
        self.received_count
    }

    pub fn acknowledged_count(&self) -> u64 {
        self.acknowledged_count
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            received_count: self.received_count,
            acknowledged_count: self.acknowledged_count,
            avg_latency_ms: self.average_latency_ms(),
            avg_decode_us: self.average_decode_us(),
            avg_process_us: self.average_process_us(),
            avg_encode_us: self.average_encode_us(),
            captured_at: Utc::now(),
        }
    }
}

impl Default for LatencyStats {
    fn default() -> Self {
        Self::new(DEFAULT_STATS_WINDOW)
    }
}

impl fmt::Display for LatencyStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rx={} acks={} lat={:.1}ms dec={:.0}μs proc={:.0}μs enc={:.0}μs",
            self.received_count,
            self.acknowledged_count,
            self.average_latency_ms(),
            self.average_decode_us(),
            self.average_process_us(),
            self.average_encode_us()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_stats_average_to_zero() {
        let stats = LatencyStats::default();
        assert_eq!(stats.average_latency_ms(), 0.0);
        assert_eq!(stats.average_decode_us(), 0.0);
        assert_eq!(stats.received_count(), 0);
        assert_eq!(stats.to_string(), "rx=0 acks=0 lat=0.0ms dec=0μs proc=0μs enc=0μs");
    }

    #[test]
    fn window_keeps_only_most_recent_entries() {
        let mut stats = LatencyStats::new(4);
        for value in 1..=5u32 {
            stats.record(value as f64 * 10.0, value, value * 2, value * 3);
        }
        // Entries 2..=5 remain.
        assert_eq!(stats.average_latency_ms(), 35.0);
        assert_eq!(stats.average_decode_us(), 3.5);
        assert_eq!(stats.average_process_us(), 7.0);
        assert_eq!(stats.average_encode_us(), 10.5);
        assert_eq!(stats.received_count(), 5);
    }

    #[test]
    fn negative_latency_is_excluded_but_durations_count() {
        let mut stats = LatencyStats::new(10);
        stats.record(20.0, 100, 10, 1);
        stats.record(-5.0, 300, 30, 3);

        assert_eq!(stats.latency_samples(), 1);
        assert_eq!(stats.average_latency_ms(), 20.0);
        assert_eq!(stats.average_decode_us(), 200.0);
        assert_eq!(stats.average_process_us(), 20.0);
        assert_eq!(stats.average_encode_us(), 2.0);
        assert_eq!(stats.received_count(), 2);
    }

    #[test]
    fn non_finite_latency_is_excluded() {
        let mut stats = LatencyStats::new(10);
        stats.record(f64::NAN, 1, 1, 1);
        stats.record(f64::INFINITY, 1, 1, 1);
        assert_eq!(stats.latency_samples(), 0);
        assert_eq!(stats.received_count(), 2);
    }

    #[test]
    fn zero_latency_counts() {
        let mut stats = LatencyStats::new(10);
        stats.record(0.0, 0, 0, 0);
        assert_eq!(stats.latency_samples(), 1);
    }

    #[test]
    fn windows_evict_independently() {
        let mut stats = LatencyStats::new(2);
        stats.record(10.0, 1, 1, 1);
        stats.record(-1.0, 2, 2, 2);
        stats.record(-1.0, 3, 3, 3);
        // Latency window never filled, so its single entry survives.
        assert_eq!(stats.average_latency_ms(), 10.0);
        assert_eq!(stats.average_decode_us(), 2.5);
    }

    #[test]
    fn acknowledgments_are_counted_by_the_caller() {
        let mut stats = LatencyStats::new(2);
        stats.record(1.0, 1, 1, 1);
        assert_eq!(stats.acknowledged_count(), 0);
        stats.record_ack();
        let snapshot = stats.snapshot();
        assert_eq!(snapshot.acknowledged_count, 1);
        assert_eq!(snapshot.received_count, 1);
        assert_eq!(snapshot.avg_latency_ms, 1.0);
    }
}
