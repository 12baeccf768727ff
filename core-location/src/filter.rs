//! Sample freshness filter.
//!
//! The host replays old fixes after resuming from suspension or on a cold
//! dispatch. Those positions are misleading for live tracking, so anything
//! captured too far from "now" (in either direction) is dropped. Dropping is a
//! policy decision, not a failure: nothing is reported to the application.

use core_runtime::config::DEFAULT_MAX_SAMPLE_AGE;
use core_runtime::events::LocationSample;
use std::time::Duration;

/// Accepts samples whose capture time is strictly within `max_age` of now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleFilter {
    max_age_millis: u64,
}

impl SampleFilter {
    pub fn new(max_age: Duration) -> Self {
        Self {
            max_age_millis: max_age.as_millis().min(u64::MAX as u128) as u64,
        }
    }

    pub fn max_age_millis(&self) -> u64 {
        self.max_age_millis
    }

    /// Distance between `now` and the capture time, in milliseconds.
    pub fn age_millis(sample: &LocationSample, now_millis: i64) -> u64 {
        now_millis.abs_diff(sample.captured_at_epoch_millis)
    }

    /// `true` iff `|now - captured_at| < max_age`.
    pub fn accept(&self, sample: &LocationSample, now_millis: i64) -> bool {
        Self::age_millis(sample, now_millis) < self.max_age_millis
    }
}

impl Default for SampleFilter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SAMPLE_AGE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000_000;

    fn captured_at(millis: i64) -> LocationSample {
        LocationSample {
            latitude: 10.7769,
            longitude: 106.7009,
            horizontal_accuracy_meters: 5.0,
            altitude_meters: 0.0,
            speed_meters_per_second: 0.0,
            speed_accuracy: 0.0,
            captured_at_epoch_millis: millis,
        }
    }

    #[test]
    fn test_fresh_sample_accepted() {
        let filter = SampleFilter::default();

        assert!(filter.accept(&captured_at(NOW), NOW));
        assert!(filter.accept(&captured_at(NOW - 4_999), NOW));
    }

    #[test]
    fn test_boundary_is_exclusive() {
        let filter = SampleFilter::default();

        assert!(!filter.accept(&captured_at(NOW - 5_000), NOW));
        assert!(!filter.accept(&captured_at(NOW + 5_000), NOW));
    }

    #[test]
    fn test_future_samples_use_absolute_distance() {
        let filter = SampleFilter::default();

        assert!(filter.accept(&captured_at(NOW + 4_999), NOW));
        assert!(!filter.accept(&captured_at(NOW + 60_000), NOW));
    }

    #[test]
    fn test_stale_replay_rejected() {
        let filter = SampleFilter::default();
        assert!(!filter.accept(&captured_at(NOW - 3_600_000), NOW));
    }

    #[test]
    fn test_extreme_timestamps_do_not_overflow() {
        let filter = SampleFilter::default();

        assert!(!filter.accept(&captured_at(i64::MIN), i64::MAX));
        assert_eq!(SampleFilter::age_millis(&captured_at(i64::MIN), i64::MAX), u64::MAX);
    }

    #[test]
    fn test_custom_window() {
        let filter = SampleFilter::new(Duration::from_millis(250));

        assert_eq!(filter.max_age_millis(), 250);
        assert!(filter.accept(&captured_at(NOW - 249), NOW));
        assert!(!filter.accept(&captured_at(NOW - 250), NOW));
    }
}
