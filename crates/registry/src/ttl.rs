//! Converts expiration policies into store TTLs.
//!
//! Document stores in the Couchbase family read a TTL above 30 days as an
//! absolute Unix timestamp rather than a relative offset. The resolver passes
//! the policy's value through untouched and flags values in that range so
//! operators can spot tickets the store may expire at the wrong time.

use std::time::Duration;

use crate::ticket::Ticket;

/// Default threshold at which stores switch to absolute timestamps.
pub const DEFAULT_ABSOLUTE_TTL_THRESHOLD: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// A TTL ready to hand to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedTtl {
    /// Seconds, exactly as reported by the policy.
    pub seconds: i64,
    /// The value is at or above the threshold and the store will likely
    /// read it as an absolute timestamp.
    pub presumed_absolute: bool,
}

/// Resolves ticket TTLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TtlResolver {
    threshold: Duration,
}

impl TtlResolver {
    /// Creates a resolver flagging TTLs at or above `threshold`.
    #[must_use]
    pub fn new(threshold: Duration) -> Self {
        Self { threshold }
    }

    /// The flagging threshold.
    #[must_use]
    pub fn threshold(&self) -> Duration {
        self.threshold
    }

    /// Reads the ticket's TTL and flags values at or above the threshold.
    ///
    /// Zero and negative values are returned unchanged.
    pub fn resolve<T: Ticket + ?Sized>(&self, ticket: &T) -> ResolvedTtl {
        let seconds = ticket.expiration_policy().time_to_live_seconds();
        let presumed_absolute = u64::try_from(seconds)
            .is_ok_and(|secs| Duration::from_secs(secs) >= self.threshold);

        if presumed_absolute {
            tracing::warn!(
                ticket_id = ticket.id(),
                ttl_seconds = seconds,
                threshold_seconds = self.threshold.as_secs(),
                "ticket TTL at or above absolute-timestamp threshold"
            );
        }

        ResolvedTtl { seconds, presumed_absolute }
    }
}

impl Default for TtlResolver {
    fn default() -> Self {
        Self::new(DEFAULT_ABSOLUTE_TTL_THRESHOLD)
    }
}
