//! NTP-style clock offset and round-trip estimation with median smoothing.

use std::collections::VecDeque;

use teleop_types::telemetry::ClockSyncSnapshot;
use tracing::trace;

pub const DEFAULT_SAMPLE_CAPACITY: usize = 10;
/// Samples required before the estimate is considered usable.
pub const SYNCED_SAMPLE_THRESHOLD: usize = 3;

/// One request/response exchange reduced to an offset and round-trip time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyncSample {
    pub offset_ms: f64,
    pub rtt_ms: i64,
}

impl SyncSample {
    /// t1/t4 are local send/receive, t2/t3 remote receive/send, all in ms.
    ///
    /// Any four stamps yield a sample; an rtt outside the `i64` range
    /// saturates.
    pub fn from_exchange(t1: u64, t2: u64, t3: u64, t4: u64) -> Self {
        let (t1, t2, t3, t4) = (t1 as i128, t2 as i128, t3 as i128, t4 as i128);
        let rtt = (t4 - t1) - (t3 - t2);
        let offset_ms = ((t2 - t1) + (t3 - t4)) as f64 / 2.0;
        Self {
            offset_ms,
            rtt_ms: rtt.clamp(i64::MIN as i128, i64::MAX as i128) as i64,
        }
    }
}

/// Result of [`ClockSynchronizer::process`].
///
/// The offset is the smoothed median while the round-trip time is the raw
/// value of the exchange just processed; the smoothed round-trip time is
/// available from [`ClockSynchronizer::current_rtt_ms`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyncOutcome {
    pub median_offset_ms: f64,
    pub sample_rtt_ms: i64,
}

/// Bounded FIFO of exchange samples with median-derived offset and rtt.
///
/// Not internally synchronised. Samples must be fed in the order their
/// responses arrived; results depend on call order.
#[derive(Debug, Clone)]
pub struct ClockSynchronizer {
    samples: VecDeque<SyncSample>,
    capacity: usize,
    current_offset_ms: f64,
    current_rtt_ms: i64,
    processed: u64,
}

impl ClockSynchronizer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
            current_offset_ms: 0.0,
            current_rtt_ms: 0,
            processed: 0,
        }
    }

    pub fn process(&mut self, t1: u64, t2: u64, t3: u64, t4: u64) -> SyncOutcome {
        let sample = SyncSample::from_exchange(t1, t2, t3, t4);
        self.push(sample);
        trace!(
            offset_ms = sample.offset_ms,
            rtt_ms = sample.rtt_ms,
            retained = self.samples.len(),
            "clock sample recorded"
        );
        SyncOutcome {
            median_offset_ms: self.current_offset_ms,
            sample_rtt_ms: sample.rtt_ms,
        }
    }

    fn push(&mut self, sample: SyncSample) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);

        let mut offsets: Vec<f64> = self.samples.iter().map(|s| s.offset_ms).collect();
        offsets.sort_by(f64::total_cmp);
        let mut rtts: Vec<i64> = self.samples.iter().map(|s| s.rtt_ms).collect();
        rtts.sort_unstable();

        self.current_offset_ms = middle_element(&offsets);
        self.current_rtt_ms = middle_element(&rtts);
        self.processed += 1;
    }

    /// Median offset (remote minus local) over retained samples.
    pub fn current_offset_ms(&self) -> f64 {
        self.current_offset_ms
    }

    /// Median round-trip time over retained samples.
    pub fn current_rtt_ms(&self) -> i64 {
        self.current_rtt_ms
    }

    /// Latches once enough samples have been processed; eviction never clears it.
    pub fn is_synced(&self) -> bool {
        self.processed >= SYNCED_SAMPLE_THRESHOLD as u64
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn samples(&self) -> impl Iterator<Item = &SyncSample> {
        self.samples.iter()
    }

    /// Map a remote timestamp onto the local clock using the current offset.
    pub fn remote_to_local_ms(&self, remote_ms: u64) -> i64 {
        clamp_ms(remote_ms).saturating_sub(self.current_offset_ms.round() as i64)
    }

    pub fn local_to_remote_ms(&self, local_ms: u64) -> i64 {
        clamp_ms(local_ms).saturating_add(self.current_offset_ms.round() as i64)
    }

    pub fn snapshot(&self) -> ClockSyncSnapshot {
        ClockSyncSnapshot {
            offset_ms: self.current_offset_ms,
            rtt_ms: self.current_rtt_ms,
            samples: self.samples.len(),
            synced: self.is_synced(),
        }
    }
}

impl Default for ClockSynchronizer {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_CAPACITY)
    }
}

/// Element at index `len / 2` of a sorted slice. For even lengths this is the
/// upper of the two middle elements; they are never averaged.
fn middle_element<T: Copy + Default>(sorted: &[T]) -> T {
    sorted.get(sorted.len() / 2).copied().unwrap_or_default()
}

fn clamp_ms(ms: u64) -> i64 {
    i64::try_from(ms).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Exchange producing exactly `(offset, rtt)` with 5ms of remote processing.
    /// Requires `offset + rtt / 2` to be whole.
    fn exchange(offset: f64, rtt: i64) -> (u64, u64, u64, u64) {
        let outbound = offset + rtt as f64 / 2.0;
        assert_eq!(outbound.fract(), 0.0);
        let t1 = 1_000_000i64;
        let t2 = t1 + outbound as i64;
        let t3 = t2 + 5;
        let t4 = t1 + rtt + 5;
        (t1 as u64, t2 as u64, t3 as u64, t4 as u64)
    }

    fn feed(sync: &mut ClockSynchronizer, samples: &[(f64, i64)]) {
        for &(offset, rtt) in samples {
            let (t1, t2, t3, t4) = exchange(offset, rtt);
            let sample = SyncSample::from_exchange(t1, t2, t3, t4);
            assert_eq!(sample.offset_ms, offset);
            assert_eq!(sample.rtt_ms, rtt);
            sync.process(t1, t2, t3, t4);
        }
    }

    #[test]
    fn single_exchange_arithmetic() {
        let sample = SyncSample::from_exchange(1000, 1010, 1012, 1005);
        assert_eq!(sample.rtt_ms, 3);
        assert_eq!(sample.offset_ms, 8.5);

        let mut sync = ClockSynchronizer::default();
        let outcome = sync.process(1000, 1010, 1012, 1005);
        assert_eq!(outcome.sample_rtt_ms, 3);
        assert_eq!(outcome.median_offset_ms, 8.5);
        assert_eq!(sync.current_rtt_ms(), 3);
    }

    #[test]
    fn garbage_remote_stamps_still_produce_a_sample() {
        let mut sync = ClockSynchronizer::default();
        let outcome = sync.process(0, 0x8000_0000_0000_0000, 0, 0x7FFF_FFFF_FFFF_FFFF);
        assert_eq!(outcome.sample_rtt_ms, i64::MAX);
        assert_eq!(outcome.median_offset_ms, 0.5);
        assert_eq!(sync.sample_count(), 1);

        let outcome = sync.process(0, u64::MAX, u64::MAX, 0);
        assert_eq!(outcome.sample_rtt_ms, 0);
        assert!(outcome.median_offset_ms > 0.0);
        assert_eq!(sync.local_to_remote_ms(u64::MAX), i64::MAX);
        assert!(sync.remote_to_local_ms(0) < 0);
    }

    #[test]
    fn negative_offsets_when_remote_is_behind() {
        let sample = SyncSample::from_exchange(2_000, 1_500, 1_501, 2_011);
        assert_eq!(sample.rtt_ms, 10);
        assert_eq!(sample.offset_ms, -505.0);
    }

    #[test]
    fn median_over_odd_sample_count() {
        let mut sync = ClockSynchronizer::default();
        feed(
            &mut sync,
            &[(10.0, 40), (-4.0, 2), (7.5, 101), (3.0, 8), (250.0, 6)],
        );
        assert_eq!(sync.current_offset_ms(), 7.5);
        assert_eq!(sync.current_rtt_ms(), 8);
    }

    #[test]
    fn median_over_even_sample_count_selects_by_index() {
        let mut sync = ClockSynchronizer::default();
        feed(&mut sync, &[(1.0, 10), (4.0, 40), (2.0, 20), (3.0, 30)]);
        assert_eq!(sync.current_offset_ms(), 3.0);
        assert_eq!(sync.current_rtt_ms(), 30);
    }

    #[test]
    fn oldest_sample_is_evicted_at_capacity() {
        let mut sync = ClockSynchronizer::new(5);
        feed(
            &mut sync,
            &[(1000.0, 1000), (1.0, 2), (2.0, 4), (3.0, 6), (4.0, 8)],
        );
        assert_eq!(sync.current_offset_ms(), 3.0);
        assert_eq!(sync.current_rtt_ms(), 6);

        feed(&mut sync, &[(0.0, 0)]);
        assert_eq!(sync.sample_count(), 5);
        assert!(sync.samples().all(|s| s.offset_ms != 1000.0));
        assert_eq!(sync.current_offset_ms(), 2.0);
        assert_eq!(sync.current_rtt_ms(), 4);
    }

    #[test]
    fn process_returns_raw_rtt_but_stores_median() {
        let mut sync = ClockSynchronizer::default();
        feed(&mut sync, &[(0.0, 10), (0.0, 20)]);
        let (t1, t2, t3, t4) = exchange(0.0, 90);
        let outcome = sync.process(t1, t2, t3, t4);
        assert_eq!(outcome.sample_rtt_ms, 90);
        assert_eq!(sync.current_rtt_ms(), 20);
    }

    #[test]
    fn synced_latches_after_third_sample() {
        let mut sync = ClockSynchronizer::new(3);
        assert!(!sync.is_synced());
        feed(&mut sync, &[(1.0, 2)]);
        assert!(!sync.is_synced());
        feed(&mut sync, &[(1.0, 2)]);
        assert!(!sync.is_synced());
        feed(&mut sync, &[(1.0, 2)]);
        assert!(sync.is_synced());
        for _ in 0..10 {
            feed(&mut sync, &[(-300.0, 900)]);
            assert!(sync.is_synced());
        }
    }

    #[test]
    fn synced_latches_even_when_capacity_is_below_threshold() {
        let mut sync = ClockSynchronizer::new(1);
        feed(&mut sync, &[(1.0, 2), (1.0, 2), (1.0, 2)]);
        assert_eq!(sync.sample_count(), 1);
        assert!(sync.is_synced());
    }

    #[test]
    fn correction_helpers_apply_rounded_offset() {
        let mut sync = ClockSynchronizer::default();
        sync.process(1000, 1010, 1012, 1005);
        assert_eq!(sync.local_to_remote_ms(2_000), 2_009);
        assert_eq!(sync.remote_to_local_ms(2_009), 2_000);
        let snapshot = sync.snapshot();
        assert_eq!(snapshot.samples, 1);
        assert!(!snapshot.synced);
    }
}
