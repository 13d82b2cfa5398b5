//! Stored entries and the expiry predicate.

use bytes::Bytes;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Represents a stored payload with optional expiry time.
///
/// Expiry is an absolute wall-clock time rather than an `Instant`, because
/// it has to survive a snapshot and be meaningful in another process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// The encoded value
    pub payload: Bytes,
    /// When this entry expires (None = never expires)
    pub expire_at: Option<SystemTime>,
}

impl Entry {
    /// Creates a new entry without expiry.
    pub fn new(payload: Bytes) -> Self {
        Self {
            payload,
            expire_at: None,
        }
    }

    /// Creates a new entry that expires `ttl` from now.
    ///
    /// A `ttl` too large to represent as a wall-clock time never expires.
    pub fn with_ttl(payload: Bytes, ttl: Duration) -> Self {
        Self {
            payload,
            expire_at: SystemTime::now().checked_add(ttl),
        }
    }

    /// Creates an entry with an explicit expiry time.
    pub fn with_expiry(payload: Bytes, expire_at: Option<SystemTime>) -> Self {
        Self { payload, expire_at }
    }

    /// An entry is live until `now` reaches its expiry time.
    #[inline]
    pub fn is_live(&self, now: SystemTime) -> bool {
        match self.expire_at {
            None => true,
            Some(exp) => now < exp,
        }
    }

    /// Returns the remaining time to live, or None if the entry never expires.
    ///
    /// An expired entry reports `Duration::ZERO`.
    pub fn ttl_remaining(&self, now: SystemTime) -> Option<Duration> {
        self.expire_at
            .map(|exp| exp.duration_since(now).unwrap_or(Duration::ZERO))
    }

    /// Expiry as whole unix seconds, the snapshot representation.
    ///
    /// `0` means "never expires". Sub-second precision is floored away.
    pub fn expire_unix_seconds(&self) -> i64 {
        self.expire_at.map(to_unix_seconds).unwrap_or(0)
    }
}

/// Converts a wall-clock time to whole unix seconds, flooring.
pub fn to_unix_seconds(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(since) => i64::try_from(since.as_secs()).unwrap_or(i64::MAX),
        Err(before) => {
            let before = before.duration();
            let secs = i64::try_from(before.as_secs()).unwrap_or(i64::MAX);
            if before.subsec_nanos() > 0 {
                -secs - 1
            } else {
                -secs
            }
        }
    }
}

/// Converts snapshot unix seconds back into an expiry time.
///
/// `0` maps to None (never expires).
pub fn from_unix_seconds(secs: i64) -> Option<SystemTime> {
    if secs == 0 {
        return None;
    }
    let magnitude = Duration::from_secs(secs.unsigned_abs());
    if secs > 0 {
        // Beyond what the platform can represent: effectively never expires
        UNIX_EPOCH.checked_add(magnitude)
    } else {
        Some(UNIX_EPOCH.checked_sub(magnitude).unwrap_or(UNIX_EPOCH))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_without_expiry_is_always_live() {
        let entry = Entry::new(Bytes::from("v"));
        assert!(entry.is_live(SystemTime::now()));
        assert!(entry.is_live(SystemTime::now() + Duration::from_secs(1_000_000)));
        assert_eq!(entry.ttl_remaining(SystemTime::now()), None);
        assert_eq!(entry.expire_unix_seconds(), 0);
    }

    #[test]
    fn test_expiry_boundary() {
        let exp = UNIX_EPOCH + Duration::from_secs(1_000);
        let entry = Entry::with_expiry(Bytes::from("v"), Some(exp));

        assert!(entry.is_live(exp - Duration::from_nanos(1)));
        // Reaching the expiry time is already expired
        assert!(!entry.is_live(exp));
        assert!(!entry.is_live(exp + Duration::from_secs(1)));
    }

    #[test]
    fn test_with_ttl() {
        let entry = Entry::with_ttl(Bytes::from("v"), Duration::from_secs(60));
        let now = SystemTime::now();
        assert!(entry.is_live(now));
        let remaining = entry.ttl_remaining(now).unwrap();
        assert!(remaining > Duration::from_secs(59) && remaining <= Duration::from_secs(60));
        assert!(!entry.is_live(now + Duration::from_secs(61)));
    }

    #[test]
    fn test_unrepresentable_ttl_never_expires() {
        let entry = Entry::with_ttl(Bytes::from("v"), Duration::MAX);
        assert_eq!(entry.expire_at, None);
        assert!(entry.is_live(SystemTime::now()));
        assert_eq!(entry.expire_unix_seconds(), 0);
    }

    #[test]
    fn test_ttl_remaining_saturates() {
        let entry = Entry::with_expiry(Bytes::new(), Some(UNIX_EPOCH + Duration::from_secs(5)));
        assert_eq!(
            entry.ttl_remaining(UNIX_EPOCH + Duration::from_secs(10)),
            Some(Duration::ZERO)
        );
    }

    #[test]
    fn test_unix_seconds_floor() {
        let t = UNIX_EPOCH + Duration::from_millis(12_700);
        assert_eq!(to_unix_seconds(t), 12);
        assert_eq!(to_unix_seconds(UNIX_EPOCH - Duration::from_millis(500)), -1);
        assert_eq!(to_unix_seconds(UNIX_EPOCH - Duration::from_secs(3)), -3);
    }

    #[test]
    fn test_unix_seconds_conversion() {
        assert_eq!(from_unix_seconds(0), None);
        assert_eq!(
            from_unix_seconds(1_700_000_000),
            Some(UNIX_EPOCH + Duration::from_secs(1_700_000_000))
        );
        assert_eq!(
            from_unix_seconds(-10),
            Some(UNIX_EPOCH - Duration::from_secs(10))
        );
    }
}
