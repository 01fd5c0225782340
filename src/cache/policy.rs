//! Freshness classification for cached entries

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

/// How usable a cached entry is at a given moment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Younger than the fresh window: serve as is
    Fresh,
    /// Past the fresh window but inside the stale window: serve and refresh in the background
    Stale,
    /// Past the stale window: refetch before serving
    Expired,
}

/// Error for an inconsistent pair of windows
#[derive(Debug, Error, PartialEq, Eq)]
#[error("stale window ({stale_secs}s) must be longer than fresh window ({fresh_secs}s)")]
pub struct PolicyError {
    pub fresh_secs: i64,
    pub stale_secs: i64,
}

/// Fresh and stale windows for the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreshnessPolicy {
    fresh_ttl: Duration,
    stale_ttl: Duration,
}

impl Default for FreshnessPolicy {
    fn default() -> Self {
        Self {
            fresh_ttl: Duration::minutes(10),
            stale_ttl: Duration::minutes(30),
        }
    }
}

impl FreshnessPolicy {
    /// Creates a policy; `stale_ttl` must exceed `fresh_ttl`
    pub fn new(fresh_ttl: Duration, stale_ttl: Duration) -> Result<Self, PolicyError> {
        if stale_ttl <= fresh_ttl || fresh_ttl < Duration::zero() {
            return Err(PolicyError {
                fresh_secs: fresh_ttl.num_seconds(),
                stale_secs: stale_ttl.num_seconds(),
            });
        }
        Ok(Self {
            fresh_ttl,
            stale_ttl,
        })
    }

    /// Creates a policy from whole seconds
    pub fn from_secs(fresh_secs: u64, stale_secs: u64) -> Result<Self, PolicyError> {
        const MAX_SECS: i64 = i64::MAX / 1000;
        let to_duration =
            |secs: u64| Duration::seconds(i64::try_from(secs).unwrap_or(MAX_SECS).min(MAX_SECS));
        Self::new(to_duration(fresh_secs), to_duration(stale_secs))
    }

    pub fn fresh_ttl(&self) -> Duration {
        self.fresh_ttl
    }

    pub fn stale_ttl(&self) -> Duration {
        self.stale_ttl
    }

    /// Classifies an entry stored at `stored_at` as seen at `now`
    ///
    /// An entry from the future (clock skew) counts as fresh.
    pub fn classify(&self, now: DateTime<Utc>, stored_at: DateTime<Utc>) -> Freshness {
        let age = now - stored_at;
        if age < self.fresh_ttl {
            Freshness::Fresh
        } else if age < self.stale_ttl {
            Freshness::Stale
        } else {
            Freshness::Expired
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 15, 9, 0, 0).unwrap()
    }

    fn policy() -> FreshnessPolicy {
        FreshnessPolicy::new(Duration::minutes(10), Duration::minutes(30)).unwrap()
    }

    #[test]
    fn test_classify_boundaries() {
        let p = policy();
        let stored = t0();

        assert_eq!(p.classify(stored, stored), Freshness::Fresh);
        assert_eq!(
            p.classify(stored + Duration::minutes(10) - Duration::milliseconds(1), stored),
            Freshness::Fresh
        );
        assert_eq!(p.classify(stored + Duration::minutes(10), stored), Freshness::Stale);
        assert_eq!(
            p.classify(stored + Duration::minutes(30) - Duration::milliseconds(1), stored),
            Freshness::Stale
        );
        assert_eq!(p.classify(stored + Duration::minutes(30), stored), Freshness::Expired);
        assert_eq!(p.classify(stored + Duration::days(2), stored), Freshness::Expired);
    }

    #[test]
    fn test_classify_future_entry_is_fresh() {
        let p = policy();
        assert_eq!(p.classify(t0(), t0() + Duration::minutes(5)), Freshness::Fresh);
    }

    #[test]
    fn test_new_rejects_stale_not_longer_than_fresh() {
        let err = FreshnessPolicy::new(Duration::minutes(10), Duration::minutes(10)).unwrap_err();
        assert_eq!(err.fresh_secs, 600);
        assert_eq!(err.stale_secs, 600);

        assert!(FreshnessPolicy::new(Duration::minutes(30), Duration::minutes(10)).is_err());
    }

    #[test]
    fn test_from_secs() {
        let p = FreshnessPolicy::from_secs(60, 120).unwrap();
        assert_eq!(p.fresh_ttl(), Duration::seconds(60));
        assert_eq!(p.stale_ttl(), Duration::seconds(120));
    }

    #[test]
    fn test_default_windows() {
        let p = FreshnessPolicy::default();
        assert_eq!(p.fresh_ttl(), Duration::minutes(10));
        assert_eq!(p.stale_ttl(), Duration::minutes(30));
    }
}
