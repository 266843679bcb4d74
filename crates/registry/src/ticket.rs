//! Ticket model: the [`Ticket`] and [`ExpirationPolicy`] traits and a
//! concrete, serde-friendly [`TicketRecord`].
//!
//! The registry only relies on the traits. [`TicketRecord`] and
//! [`StandardExpirationPolicy`] exist so the built-in
//! [`JsonTicketCodec`](crate::JsonTicketCodec) can be used end-to-end.

use std::{collections::BTreeMap, fmt};

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Separator between a ticket's type prefix and the rest of its ID.
pub const ID_SEPARATOR: char = '-';

/// Decides how long a ticket lives.
pub trait ExpirationPolicy: Send + Sync {
    /// Time to live in seconds, handed to the store as the document TTL.
    fn time_to_live_seconds(&self) -> i64;

    /// Returns `true` if the ticket governed by this policy is expired now.
    fn is_expired(&self) -> bool;
}

/// An authentication grant or service ticket.
///
/// IDs are globally unique and start with a type prefix followed by
/// [`ID_SEPARATOR`] (`TGT-...`, `ST-...`). The registry never generates IDs.
pub trait Ticket: Send + Sync {
    /// Globally unique ticket ID.
    fn id(&self) -> &str;

    /// The policy governing this ticket's lifetime.
    fn expiration_policy(&self) -> &dyn ExpirationPolicy;

    /// Returns `true` if the ticket is expired.
    fn is_expired(&self) -> bool {
        self.expiration_policy().is_expired()
    }
}

/// Built-in expiration policies.
///
/// # Examples
///
/// ```
/// use ticket_registry::{ExpirationPolicy, StandardExpirationPolicy};
///
/// let policy = StandardExpirationPolicy::hard_timeout(600);
/// assert_eq!(policy.time_to_live_seconds(), 600);
/// assert!(!policy.is_expired());
///
/// assert!(StandardExpirationPolicy::AlwaysExpires.is_expired());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StandardExpirationPolicy {
    /// Expires a fixed number of seconds after issue.
    HardTimeout {
        /// Lifetime in seconds.
        time_to_live_seconds: i64,
        /// When the ticket was issued.
        issued_at: DateTime<Utc>,
    },
    /// Never expires. Reports `i32::MAX` as its TTL.
    NeverExpires,
    /// Always expired. Used for revoked tickets.
    AlwaysExpires,
}

impl StandardExpirationPolicy {
    /// A hard timeout starting now.
    #[must_use]
    pub fn hard_timeout(time_to_live_seconds: i64) -> Self {
        Self::HardTimeout { time_to_live_seconds, issued_at: Utc::now() }
    }

    /// Returns `true` if the policy has expired at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self {
            Self::HardTimeout { time_to_live_seconds, issued_at } => {
                // A deadline outside chrono's range is never reached when the
                // TTL is positive and already passed when it is negative.
                match TimeDelta::try_seconds(*time_to_live_seconds)
                    .and_then(|ttl| issued_at.checked_add_signed(ttl))
                {
                    Some(deadline) => deadline <= now,
                    None => *time_to_live_seconds < 0,
                }
            },
            Self::NeverExpires => false,
            Self::AlwaysExpires => true,
        }
    }
}

impl ExpirationPolicy for StandardExpirationPolicy {
    fn time_to_live_seconds(&self) -> i64 {
        match self {
            Self::HardTimeout { time_to_live_seconds, .. } => *time_to_live_seconds,
            Self::NeverExpires => i64::from(i32::MAX),
            Self::AlwaysExpires => 0,
        }
    }

    fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// Ticket categories, identified by their ID prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TicketKind {
    /// `TGT`: a user's single sign-on session.
    TicketGrantingTicket,
    /// `ST`: a one-time ticket for a service.
    ServiceTicket,
    /// `PGT`: lets a service obtain proxy tickets.
    ProxyGrantingTicket,
    /// `PT`: a service ticket issued to a proxy.
    ProxyTicket,
    /// `TST`: short-lived state carried across a redirect.
    TransientSessionTicket,
    /// Any other prefix.
    Custom(String),
}

impl TicketKind {
    /// Type prefix, without separator.
    #[must_use]
    pub fn prefix(&self) -> &str {
        match self {
            Self::TicketGrantingTicket => "TGT",
            Self::ServiceTicket => "ST",
            Self::ProxyGrantingTicket => "PGT",
            Self::ProxyTicket => "PT",
            Self::TransientSessionTicket => "TST",
            Self::Custom(prefix) => prefix,
        }
    }

    /// Prefix plus separator: the start of every ID of this kind.
    #[must_use]
    pub fn id_prefix(&self) -> String {
        format!("{}{ID_SEPARATOR}", self.prefix())
    }

    /// Infers the kind from a ticket ID (`"ST-42"` is a service ticket).
    ///
    /// IDs without a separator are treated as a custom kind named after the
    /// whole ID.
    #[must_use]
    pub fn for_id(id: &str) -> Self {
        let prefix = id.split_once(ID_SEPARATOR).map_or(id, |(prefix, _)| prefix);
        Self::from(prefix.to_owned())
    }
}

impl From<String> for TicketKind {
    fn from(prefix: String) -> Self {
        match prefix.as_str() {
            "TGT" => Self::TicketGrantingTicket,
            "ST" => Self::ServiceTicket,
            "PGT" => Self::ProxyGrantingTicket,
            "PT" => Self::ProxyTicket,
            "TST" => Self::TransientSessionTicket,
            _ => Self::Custom(prefix),
        }
    }
}

impl From<TicketKind> for String {
    fn from(kind: TicketKind) -> Self {
        kind.prefix().to_owned()
    }
}

impl fmt::Display for TicketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// A concrete ticket, serializable with serde.
///
/// # Examples
///
/// ```
/// use ticket_registry::{StandardExpirationPolicy, Ticket, TicketKind, TicketRecord};
///
/// let ticket = TicketRecord::builder()
///     .id("TGT-1")
///     .kind(TicketKind::TicketGrantingTicket)
///     .principal("casuser")
///     .expiration_policy(StandardExpirationPolicy::hard_timeout(600))
///     .build();
///
/// assert_eq!(ticket.id(), "TGT-1");
/// assert!(!ticket.is_expired());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bon::Builder)]
pub struct TicketRecord {
    /// Globally unique ID, starting with the kind's prefix.
    #[builder(into)]
    pub id: String,
    /// Ticket category.
    pub kind: TicketKind,
    /// Authenticated principal, for ticket-granting tickets.
    #[builder(into)]
    pub principal: Option<String>,
    /// Target service, for service and proxy tickets.
    #[builder(into)]
    pub service: Option<String>,
    /// Creation time.
    #[builder(default = Utc::now())]
    pub created_at: DateTime<Utc>,
    /// Lifetime policy.
    pub expiration_policy: StandardExpirationPolicy,
    /// Free-form attributes.
    #[serde(default)]
    #[builder(default)]
    pub attributes: BTreeMap<String, String>,
}

impl Ticket for TicketRecord {
    fn id(&self) -> &str {
        &self.id
    }

    fn expiration_policy(&self) -> &dyn ExpirationPolicy {
        &self.expiration_policy
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::tgt("TGT-1-abc", TicketKind::TicketGrantingTicket)]
    #[case::st("ST-9", TicketKind::ServiceTicket)]
    #[case::pgt("PGT-1", TicketKind::ProxyGrantingTicket)]
    #[case::pt("PT-1", TicketKind::ProxyTicket)]
    #[case::tst("TST-1", TicketKind::TransientSessionTicket)]
    #[case::custom("OC-1", TicketKind::Custom("OC".into()))]
    #[case::no_separator("opaque", TicketKind::Custom("opaque".into()))]
    fn kind_is_inferred_from_id(#[case] id: &str, #[case] expected: TicketKind) {
        assert_eq!(TicketKind::for_id(id), expected);
    }

    #[test]
    fn id_prefix_appends_separator() {
        assert_eq!(TicketKind::ServiceTicket.id_prefix(), "ST-");
        assert_eq!(TicketKind::Custom("OC".into()).id_prefix(), "OC-");
    }

    #[test]
    fn kind_serializes_as_prefix() {
        let json = serde_json::to_string(&TicketKind::ProxyTicket).unwrap();
        assert_eq!(json, "\"PT\"");
        let kind: TicketKind = serde_json::from_str("\"XYZ\"").unwrap();
        assert_eq!(kind, TicketKind::Custom("XYZ".into()));
    }

    #[test]
    fn hard_timeout_expires_after_ttl() {
        let issued_at = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let policy = StandardExpirationPolicy::HardTimeout { time_to_live_seconds: 60, issued_at };

        assert!(!policy.is_expired_at(issued_at + TimeDelta::seconds(59)));
        assert!(policy.is_expired_at(issued_at + TimeDelta::seconds(60)));
    }

    #[rstest]
    #[case::max(i64::MAX, false)]
    #[case::min(i64::MIN, true)]
    #[case::beyond_calendar(i64::MAX / 1000, false)]
    #[case::before_calendar(i64::MIN / 1000, true)]
    fn out_of_range_deadline_does_not_panic(#[case] ttl: i64, #[case] expired: bool) {
        let policy = StandardExpirationPolicy::hard_timeout(ttl);
        assert_eq!(policy.is_expired(), expired);
    }

    #[test]
    fn sentinel_policies() {
        assert_eq!(StandardExpirationPolicy::NeverExpires.time_to_live_seconds(), 2_147_483_647);
        assert!(!StandardExpirationPolicy::NeverExpires.is_expired());
        assert_eq!(StandardExpirationPolicy::AlwaysExpires.time_to_live_seconds(), 0);
        assert!(StandardExpirationPolicy::AlwaysExpires.is_expired());
    }

    #[test]
    fn policy_is_tagged_in_json() {
        let json = serde_json::to_value(StandardExpirationPolicy::NeverExpires).unwrap();
        assert_eq!(json, serde_json::json!({ "type": "never_expires" }));
    }

    #[test]
    fn ticket_delegates_expiry_to_policy() {
        let ticket = TicketRecord::builder()
            .id("ST-1")
            .kind(TicketKind::ServiceTicket)
            .service("https://app.example.org")
            .expiration_policy(StandardExpirationPolicy::AlwaysExpires)
            .build();
        assert!(ticket.is_expired());
        assert_eq!(ticket.expiration_policy().time_to_live_seconds(), 0);
    }
}
