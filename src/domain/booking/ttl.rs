//! Booking TTL buckets.
//!
//! The broker only supports a fixed set of delay queues, one per TTL in
//! minutes. `SupportedTtls` is that set; it drives queue declaration, the
//! routing of expiry messages and event-creation validation.

use crate::domain::foundation::ValidationError;
use std::collections::BTreeSet;
use std::time::Duration;

use super::ScheduleError;

/// Set of booking TTLs (in minutes) that have a delay queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupportedTtls(BTreeSet<u32>);

impl SupportedTtls {
    /// Builds the set, rejecting an empty set or a zero TTL.
    pub fn new(minutes: impl IntoIterator<Item = u32>) -> Result<Self, ValidationError> {
        let set: BTreeSet<u32> = minutes.into_iter().collect();
        if set.is_empty() {
            return Err(ValidationError::empty_field("supported_ttl_minutes"));
        }
        if set.contains(&0) {
            return Err(ValidationError::out_of_range(
                "supported_ttl_minutes",
                1,
                i64::from(u32::MAX),
                0,
            ));
        }
        Ok(Self(set))
    }

    pub fn contains(&self, minutes: u32) -> bool {
        self.0.contains(&minutes)
    }

    /// Iterates buckets in ascending order.
    pub fn buckets(&self) -> impl Iterator<Item = TtlBucket> + '_ {
        self.0.iter().copied().map(TtlBucket)
    }

    /// Maps the time between creation and expiry onto a declared bucket.
    pub fn bucket_for(&self, ttl: chrono::Duration) -> Result<TtlBucket, ScheduleError> {
        let minutes = round_to_minutes(ttl);
        if self.contains(minutes) {
            Ok(TtlBucket(minutes))
        } else {
            Err(ScheduleError::UnsupportedTtl { minutes })
        }
    }
}

/// Rounds to the nearest whole minute, never below one.
pub fn round_to_minutes(ttl: chrono::Duration) -> u32 {
    let secs = ttl.num_seconds().max(0);
    let minutes = (secs + 30) / 60;
    u32::try_from(minutes).unwrap_or(u32::MAX).max(1)
}

/// A single delay bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TtlBucket(u32);

impl TtlBucket {
    pub fn minutes(&self) -> u32 {
        self.0
    }

    /// Routing key on the delay exchange, e.g. `delay_15`.
    pub fn routing_key(&self) -> String {
        format!("delay_{}", self.0)
    }

    /// Name of the delay queue, e.g. `delay_15.queue`.
    pub fn queue_name(&self) -> String {
        format!("delay_{}.queue", self.0)
    }

    /// Per-message TTL applied by the delay queue.
    pub fn message_ttl(&self) -> Duration {
        Duration::from_secs(u64::from(self.0) * 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ttls() -> SupportedTtls {
        SupportedTtls::new([1, 5, 15]).unwrap()
    }

    #[test]
    fn rejects_empty_set() {
        assert!(SupportedTtls::new(Vec::<u32>::new()).is_err());
    }

    #[test]
    fn rejects_zero_minutes() {
        assert!(SupportedTtls::new([0, 5]).is_err());
    }

    #[test]
    fn rounds_to_nearest_minute() {
        assert_eq!(round_to_minutes(chrono::Duration::seconds(14 * 60 + 31)), 15);
        assert_eq!(round_to_minutes(chrono::Duration::seconds(15 * 60 + 29)), 15);
    }

    #[test]
    fn short_or_negative_ttl_clamps_to_one_minute() {
        assert_eq!(round_to_minutes(chrono::Duration::seconds(5)), 1);
        assert_eq!(round_to_minutes(chrono::Duration::seconds(-120)), 1);
    }

    #[test]
    fn unsupported_bucket_is_an_error() {
        let err = ttls().bucket_for(chrono::Duration::minutes(7)).unwrap_err();
        assert_eq!(err, ScheduleError::UnsupportedTtl { minutes: 7 });
    }

    #[test]
    fn bucket_names_follow_topology() {
        let bucket = ttls().bucket_for(chrono::Duration::minutes(15)).unwrap();
        assert_eq!(bucket.routing_key(), "delay_15");
        assert_eq!(bucket.queue_name(), "delay_15.queue");
        assert_eq!(bucket.message_ttl(), Duration::from_millis(900_000));
    }

    #[test]
    fn buckets_iterate_ascending() {
        let minutes: Vec<u32> = SupportedTtls::new([30, 5, 15])
            .unwrap()
            .buckets()
            .map(|b| b.minutes())
            .collect();
        assert_eq!(minutes, vec![5, 15, 30]);
    }

    proptest! {
        #[test]
        fn rounding_stays_within_half_a_minute(secs in 30i64..10_000_000) {
            let minutes = i64::from(round_to_minutes(chrono::Duration::seconds(secs)));
            prop_assert!((minutes * 60 - secs).abs() <= 30);
        }

        #[test]
        fn whole_minutes_round_to_themselves(m in 1u32..100_000) {
            let d = chrono::Duration::minutes(i64::from(m));
            prop_assert_eq!(round_to_minutes(d), m);
        }
    }
}
