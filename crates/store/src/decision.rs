//! Access decision engine.
//!
//! Rule order:
//!   1. no identity        -> `allow_unknown`
//!   2. listed as admin    -> allow
//!   3. listed as user     -> allow
//!   4. otherwise          -> `allow_unknown`
//!
//! Listing always wins over a `false` flag. There is no deny list: the only
//! way to be rejected is to be unlisted while `allow_unknown` is off.

use crate::membership::Membership;
use warden_core::{Decision, DecisionReason, Identity};

/// Evaluates the admission policy for one actor.
pub fn decide(membership: &Membership, id: Option<Identity>) -> Decision {
    let reason = match id {
        None if membership.allow_unknown => DecisionReason::AnonymousAllowed,
        None => DecisionReason::AnonymousDenied,
        Some(id) if membership.admins.contains(id) => DecisionReason::Admin,
        Some(id) if membership.users.contains(id) => DecisionReason::User,
        Some(_) if membership.allow_unknown => DecisionReason::UnknownAllowed,
        Some(_) => DecisionReason::UnknownDenied,
    };
    Decision::new(reason)
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_core::Role;

    fn membership(allow_unknown: bool) -> Membership {
        let mut m = Membership::new();
        m.add(Role::Admin, Identity(10));
        m.add(Role::User, Identity(20));
        m.allow_unknown = allow_unknown;
        m
    }

    #[test]
    fn policy_table() {
        let cases = [
            (false, Some(99), false, DecisionReason::UnknownDenied),
            (true, Some(99), true, DecisionReason::UnknownAllowed),
            (false, Some(10), true, DecisionReason::Admin),
            (false, Some(20), true, DecisionReason::User),
            (true, None, true, DecisionReason::AnonymousAllowed),
            (false, None, false, DecisionReason::AnonymousDenied),
        ];

        for (flag, id, allowed, reason) in cases {
            let d = decide(&membership(flag), id.map(Identity));
            assert_eq!(d.allowed, allowed, "flag={flag} id={id:?}");
            assert_eq!(d.reason, reason, "flag={flag} id={id:?}");
        }
    }

    #[test]
    fn admin_checked_before_user() {
        let mut m = membership(false);
        m.add(Role::User, Identity(10));
        assert_eq!(decide(&m, Some(Identity(10))).reason, DecisionReason::Admin);
    }
}
