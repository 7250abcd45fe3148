//! In-memory membership state.

use std::collections::HashSet;
use warden_core::{Identity, Role, Snapshot};

/// Duplicate-free identity collection that remembers first-seen order.
///
/// `order` is the iteration order; `index` answers membership in O(1).
#[derive(Debug, Clone, Default)]
pub struct IdentitySet {
    order: Vec<Identity>,
    index: HashSet<Identity>,
}

impl IdentitySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` if `id` was already present.
    pub fn insert(&mut self, id: Identity) -> bool {
        if !self.index.insert(id) {
            return false;
        }
        self.order.push(id);
        true
    }

    /// Returns `false` if `id` was absent.
    pub fn remove(&mut self, id: Identity) -> bool {
        if !self.index.remove(&id) {
            return false;
        }
        self.order.retain(|&x| x != id);
        true
    }

    #[inline]
    pub fn contains(&self, id: Identity) -> bool {
        self.index.contains(&id)
    }

    /// Identities in first-seen order.
    pub fn as_slice(&self) -> &[Identity] {
        &self.order
    }

    pub fn iter(&self) -> impl Iterator<Item = Identity> + '_ {
        self.order.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl FromIterator<Identity> for IdentitySet {
    fn from_iter<I: IntoIterator<Item = Identity>>(iter: I) -> Self {
        let mut set = Self::new();
        for id in iter {
            set.insert(id);
        }
        set
    }
}

/// Business state of the whitelist: both role collections plus the
/// unknown-actor default.
///
/// An identity may sit in both roles; nothing forbids the overlap.
#[derive(Debug, Clone, Default)]
pub struct Membership {
    pub admins: IdentitySet,
    pub users: IdentitySet,
    pub allow_unknown: bool,
}

impl Membership {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_admin(&self, id: Option<Identity>) -> bool {
        id.is_some_and(|id| self.admins.contains(id))
    }

    pub fn is_user(&self, id: Option<Identity>) -> bool {
        id.is_some_and(|id| self.users.contains(id))
    }

    /// Highest role held by `id`. Admin wins over user.
    pub fn role_of(&self, id: Identity) -> Option<Role> {
        if self.admins.contains(id) {
            Some(Role::Admin)
        } else if self.users.contains(id) {
            Some(Role::User)
        } else {
            None
        }
    }

    pub fn add(&mut self, role: Role, id: Identity) -> bool {
        match role {
            Role::Admin => self.admins.insert(id),
            Role::User => self.users.insert(id),
        }
    }

    pub fn remove(&mut self, role: Role, id: Identity) -> bool {
        match role {
            Role::Admin => self.admins.remove(id),
            Role::User => self.users.remove(id),
        }
    }

    /// Distinct identities across both roles.
    pub fn size(&self) -> usize {
        let users_only = self
            .users
            .iter()
            .filter(|&id| !self.admins.contains(id))
            .count();
        self.admins.len() + users_only
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::from_ids(self.admins.iter(), self.users.iter(), self.allow_unknown)
    }
}
