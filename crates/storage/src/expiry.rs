//! Store-side interpretation of write-time TTL values.
//!
//! Document stores in the Couchbase family accept a single integer "expiry"
//! on every write and decide its meaning from its magnitude:
//!
//! | TTL (seconds) | Meaning |
//! |---------------|---------|
//! | `0` | never expires |
//! | negative | expires immediately |
//! | `1 ..= 2_592_000` (30 days) | relative offset from now |
//! | `> 2_592_000` | absolute Unix timestamp |
//!
//! [`Expiry::from_ttl_seconds`] applies that rule. Callers hand the raw value
//! through unchanged; only the store decides what it means.

use chrono::{DateTime, TimeDelta, Utc};

/// Largest TTL, in seconds, interpreted as a relative offset (30 days).
pub const MAX_RELATIVE_TTL_SECS: i64 = 30 * 24 * 60 * 60;

/// When a stored document stops being visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    /// The document never expires.
    Never,
    /// The document expires at the given instant.
    At(DateTime<Utc>),
}

impl Expiry {
    /// Interprets a raw TTL value relative to `now`.
    ///
    /// Timestamps that cannot be represented collapse to `now`, i.e. the
    /// document is treated as already expired.
    #[must_use]
    pub fn from_ttl_seconds(ttl_seconds: i64, now: DateTime<Utc>) -> Self {
        match ttl_seconds {
            0 => Self::Never,
            ttl if ttl < 0 => Self::At(now),
            ttl if ttl <= MAX_RELATIVE_TTL_SECS => Self::At(now + TimeDelta::seconds(ttl)),
            ttl => Self::At(DateTime::from_timestamp(ttl, 0).unwrap_or(now)),
        }
    }

    /// Returns `true` if the document is no longer visible at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self {
            Self::Never => false,
            Self::At(at) => *at <= now,
        }
    }

    /// Returns the expiry instant, if any.
    #[must_use]
    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Never => None,
            Self::At(at) => Some(*at),
        }
    }
}
