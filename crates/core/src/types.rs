//! Domain types for the Warden access gate.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Opaque numeric token of the actor that issued an event.
///
/// Serialized as a bare JSON integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(pub i64);

impl Identity {
    #[inline]
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl From<i64> for Identity {
    fn from(raw: i64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Identity {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<i64>().map(Self)
    }
}

/// Two-tier role split. There is no deny role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    User,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => f.write_str("admin"),
            Role::User => f.write_str("user"),
        }
    }
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Canonical list entry: `{"id": <integer>}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct IdEntry {
    pub id: Identity,
}

/// Read-only view of the membership state.
///
/// Lists are sorted ascending and duplicate-free, so the serialized form is
/// the exact document written to disk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub admins: Vec<IdEntry>,
    pub users: Vec<IdEntry>,
    pub allow_unknown: bool,
}

impl Snapshot {
    /// Builds a snapshot from arbitrary id sequences, sorting and
    /// deduplicating each list.
    pub fn from_ids<A, U>(admins: A, users: U, allow_unknown: bool) -> Self
    where
        A: IntoIterator<Item = Identity>,
        U: IntoIterator<Item = Identity>,
    {
        Self {
            admins: canonical_entries(admins),
            users: canonical_entries(users),
            allow_unknown,
        }
    }

    pub fn admin_ids(&self) -> impl Iterator<Item = Identity> + '_ {
        self.admins.iter().map(|e| e.id)
    }

    pub fn user_ids(&self) -> impl Iterator<Item = Identity> + '_ {
        self.users.iter().map(|e| e.id)
    }
}

fn canonical_entries(ids: impl IntoIterator<Item = Identity>) -> Vec<IdEntry> {
    let mut ids: Vec<Identity> = ids.into_iter().collect();
    ids.sort_unstable();
    ids.dedup();
    ids.into_iter().map(|id| IdEntry { id }).collect()
}

// ---------------------------------------------------------------------------
// Decision
// ---------------------------------------------------------------------------

/// Which rule of the admission policy produced a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionReason {
    Admin,
    User,
    /// Listed nowhere, `allow_unknown` is set.
    UnknownAllowed,
    UnknownDenied,
    /// No identity could be resolved from the event.
    AnonymousAllowed,
    AnonymousDenied,
}

/// Computed per query, never cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub allowed: bool,
    pub reason: DecisionReason,
}

impl Decision {
    pub const fn new(reason: DecisionReason) -> Self {
        let allowed = matches!(
            reason,
            DecisionReason::Admin
                | DecisionReason::User
                | DecisionReason::UnknownAllowed
                | DecisionReason::AnonymousAllowed
        );
        Self { allowed, reason }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verdict = if self.allowed { "allowed" } else { "denied" };
        let reason = match self.reason {
            DecisionReason::Admin => "listed as admin",
            DecisionReason::User => "listed as user",
            DecisionReason::UnknownAllowed => "not listed, unknown actors allowed",
            DecisionReason::UnknownDenied => "not listed, unknown actors denied",
            DecisionReason::AnonymousAllowed => "no identity, unknown actors allowed",
            DecisionReason::AnonymousDenied => "no identity, unknown actors denied",
        };
        write!(f, "{verdict} ({reason})")
    }
}
