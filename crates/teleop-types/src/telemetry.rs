use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Rolling averages and counters reported by the stats aggregator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub received_count: u64,
    pub acknowledged_count: u64,
    pub avg_latency_ms: f64,
    pub avg_decode_us: f64,
    pub avg_process_us: f64,
    pub avg_encode_us: f64,
    pub captured_at: DateTime<Utc>,
}

/// Smoothed clock correction as seen by correction consumers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
pub struct ClockSyncSnapshot {
    /// Remote clock minus local clock, median over retained samples.
    pub offset_ms: f64,
    /// Median round-trip time over retained samples.
    pub rtt_ms: i64,
    pub samples: usize,
    pub synced: bool,
}
