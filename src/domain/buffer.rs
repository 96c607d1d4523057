// Time-windowed sample buffer - bounded per-channel history for graphs
use std::collections::VecDeque;

use chrono::Utc;

use super::sample::TelemetrySample;

/// Default retained samples per channel: 60s of history at the default 200ms
/// poll interval.
pub const DEFAULT_CAPACITY: usize = 300;

/// Bounded FIFO of samples for one channel, ordered by insertion. Oldest
/// samples are evicted first once capacity is reached; queries never mutate.
#[derive(Debug)]
pub struct SampleBuffer {
    samples: VecDeque<TelemetrySample>,
    capacity: usize,
}

impl SampleBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, sample: TelemetrySample) {
        self.samples.push_back(sample);
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    /// Retained samples no older than `window_ms` before now, in insertion
    /// order.
    pub fn window(&self, window_ms: i64) -> Vec<TelemetrySample> {
        self.window_at(Utc::now().timestamp_millis(), window_ms)
    }

    /// Same as [`window`](Self::window) with an explicit reference time.
    pub fn window_at(&self, now_ms: i64, window_ms: i64) -> Vec<TelemetrySample> {
        let cutoff = now_ms.saturating_sub(window_ms);
        self.samples
            .iter()
            .filter(|s| s.timestamp_ms >= cutoff)
            .cloned()
            .collect()
    }

    pub fn latest(&self) -> Option<&TelemetrySample> {
        self.samples.back()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl Default for SampleBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(n: i64) -> TelemetrySample {
        TelemetrySample::new("010C", n as f64, n)
    }

    #[test]
    fn test_push_evicts_oldest_beyond_capacity() {
        let mut buf = SampleBuffer::new(5);
        for n in 0..8 {
            buf.push(sample(n));
        }
        assert_eq!(buf.len(), 5);
        let retained: Vec<i64> = buf.window_at(100, 100).iter().map(|s| s.timestamp_ms).collect();
        assert_eq!(retained, vec![3, 4, 5, 6, 7]);
    }

    #[test]
    fn test_window_filters_by_cutoff() {
        let mut buf = SampleBuffer::new(10);
        for n in [100, 200, 300, 400] {
            buf.push(sample(n));
        }
        let recent = buf.window_at(400, 150);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].timestamp_ms, 300);
        assert_eq!(recent[1].timestamp_ms, 400);
        // Query does not mutate
        assert_eq!(buf.len(), 4);
    }

    #[test]
    fn test_window_includes_exact_cutoff() {
        let mut buf = SampleBuffer::new(10);
        buf.push(sample(250));
        assert_eq!(buf.window_at(500, 250).len(), 1);
        assert_eq!(buf.window_at(501, 250).len(), 0);
    }

    #[test]
    fn test_zero_capacity_retains_nothing() {
        let mut buf = SampleBuffer::new(0);
        buf.push(sample(1));
        buf.push(sample(2));
        assert!(buf.is_empty());
        assert!(buf.latest().is_none());
    }

    #[test]
    fn test_capacity_one_keeps_newest() {
        let mut buf = SampleBuffer::new(1);
        buf.push(sample(1));
        buf.push(sample(2));
        assert_eq!(buf.len(), 1);
        assert_eq!(buf.latest().unwrap().timestamp_ms, 2);
    }

    #[test]
    fn test_window_with_huge_span_does_not_overflow() {
        let mut buf = SampleBuffer::new(10);
        buf.push(sample(100));
        assert_eq!(buf.window_at(200, i64::MAX).len(), 1);
        assert_eq!(buf.window(i64::MAX).len(), 1);
    }

    #[test]
    fn test_latest_and_clear() {
        let mut buf = SampleBuffer::default();
        assert!(buf.latest().is_none());
        buf.push(sample(1));
        buf.push(sample(2));
        assert_eq!(buf.latest().unwrap().timestamp_ms, 2);
        buf.clear();
        assert!(buf.is_empty());
    }
}
