//! File-backed membership store.
//!
//! One `RwLock` scopes everything: queries take the shared lock, mutations and
//! [`MembershipStore::save`] take the exclusive lock, so the file written
//! always matches a state that no writer is halfway through. Mutations never
//! persist on their own; callers batch them and call `save` once.
//!
//! ```ignore
//! let store = MembershipStore::load("whitelist.json")?;
//! store.add_user(Identity::new(6165946917));
//! store.save()?;
//! ```

use crate::codec;
use crate::decision::decide;
use crate::membership::Membership;
use crate::persist;
use parking_lot::RwLock;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use warden_core::error::{WardenError, WardenResult};
use warden_core::{Decision, Identity, Role, Snapshot};

pub struct MembershipStore {
    path: PathBuf,
    state: RwLock<Membership>,
}

impl MembershipStore {
    /// Loads the whitelist at `path`.
    ///
    /// A missing file yields an empty store bound to `path`. A file that
    /// exists but cannot be read or parsed is an error: startup must not
    /// guess a default allow-list.
    pub fn load(path: impl Into<PathBuf>) -> WardenResult<Self> {
        let path = path.into();
        let origin = path.display().to_string();

        let membership = match std::fs::read_to_string(&path) {
            Ok(text) => codec::decode(&text, &origin)?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!(path = %origin, "whitelist not found, starting empty");
                Membership::new()
            }
            Err(e) if e.kind() == ErrorKind::InvalidData => {
                return Err(WardenError::ConfigCorrupt(format!("{origin}: {e}")));
            }
            Err(e) => {
                return Err(WardenError::ConfigUnreadable(format!("{origin}: {e}")));
            }
        };

        tracing::info!(
            path = %origin,
            admins = membership.admins.len(),
            users = membership.users.len(),
            allow_unknown = membership.allow_unknown,
            "whitelist loaded"
        );

        Ok(Self::with_membership(path, membership))
    }

    /// Builds a store from in-memory state without touching the filesystem.
    pub fn with_membership(path: impl Into<PathBuf>, membership: Membership) -> Self {
        Self {
            path: path.into(),
            state: RwLock::new(membership),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the current state to disk atomically.
    ///
    /// On failure the in-memory state is untouched and the previous file, if
    /// any, is still intact.
    pub fn save(&self) -> WardenResult<()> {
        // Exclusive: no mutation can slip in between snapshot and rename.
        let state = self.state.write();
        let snapshot = state.snapshot();
        let bytes = codec::encode(&snapshot)?;
        persist::atomic_write(&self.path, &bytes)?;

        tracing::info!(
            path = %self.path.display(),
            admins = snapshot.admins.len(),
            users = snapshot.users.len(),
            allow_unknown = snapshot.allow_unknown,
            "whitelist saved"
        );
        Ok(())
    }

    // -- Queries -------------------------------------------------------------

    pub fn is_admin(&self, id: Option<Identity>) -> bool {
        self.state.read().is_admin(id)
    }

    pub fn is_user(&self, id: Option<Identity>) -> bool {
        self.state.read().is_user(id)
    }

    pub fn is_allowed(&self, id: Option<Identity>) -> bool {
        self.decide(id).allowed
    }

    /// Policy decision together with the rule that produced it.
    pub fn decide(&self, id: Option<Identity>) -> Decision {
        decide(&self.state.read(), id)
    }

    pub fn role_of(&self, id: Identity) -> Option<Role> {
        self.state.read().role_of(id)
    }

    pub fn allow_unknown(&self) -> bool {
        self.state.read().allow_unknown
    }

    /// Sorted view of the current state, independent of `save`.
    pub fn snapshot(&self) -> Snapshot {
        self.state.read().snapshot()
    }

    /// Number of distinct identities across both roles.
    pub fn size(&self) -> usize {
        self.state.read().size()
    }

    // -- Mutations -----------------------------------------------------------
    //
    // Each returns whether the state changed. None of them persist.

    pub fn add_admin(&self, id: Identity) -> bool {
        self.state.write().add(Role::Admin, id)
    }

    pub fn add_user(&self, id: Identity) -> bool {
        self.state.write().add(Role::User, id)
    }

    pub fn remove_admin(&self, id: Identity) -> bool {
        self.state.write().remove(Role::Admin, id)
    }

    pub fn remove_user(&self, id: Identity) -> bool {
        self.state.write().remove(Role::User, id)
    }

    pub fn set_allow_unknown(&self, value: bool) {
        self.state.write().allow_unknown = value;
    }

    /// Applies a composite change under a single exclusive lock, so readers
    /// see either none or all of it.
    pub fn update<R>(&self, f: impl FnOnce(&mut Membership) -> R) -> R {
        f(&mut self.state.write())
    }
}

impl std::fmt::Debug for MembershipStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MembershipStore")
            .field("path", &self.path)
            .field("state", &*self.state.read())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn id(raw: i64) -> Identity {
        Identity::new(raw)
    }

    #[test]
    fn missing_file_is_empty_store() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("absent.json");
        let store = MembershipStore::load(&path).unwrap();

        assert_eq!(store.size(), 0);
        assert!(!store.allow_unknown());
        assert_eq!(store.path(), path.as_path());
        assert!(!path.exists(), "load must not create the file");
    }

    #[test]
    fn corrupt_file_is_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("wl.json");
        std::fs::write(&path, b"{\"admins\": [").unwrap();

        let err = MembershipStore::load(&path).unwrap_err();
        assert!(matches!(err, WardenError::ConfigCorrupt(_)));
        assert!(err.is_fatal_at_startup());
    }

    #[test]
    fn non_utf8_file_is_corrupt() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("wl.json");
        std::fs::write(&path, [0xff, 0xfe, 0x00]).unwrap();

        let err = MembershipStore::load(&path).unwrap_err();
        assert!(matches!(err, WardenError::ConfigCorrupt(_)));
    }

    #[test]
    fn directory_in_place_of_file_is_unreadable() {
        let tmp = tempfile::tempdir().unwrap();
        let err = MembershipStore::load(tmp.path()).unwrap_err();
        assert!(err.is_fatal_at_startup());
    }

    #[test]
    fn load_concrete_document() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("wl.json");
        std::fs::write(
            &path,
            r#"{"admins":[{"id":10}],"users":[20,20],"allow_unknown":false}"#,
        )
        .unwrap();

        let store = MembershipStore::load(&path).unwrap();
        assert!(store.is_admin(Some(id(10))));
        assert!(store.is_user(Some(id(20))));
        assert!(!store.allow_unknown());
        assert_eq!(store.size(), 2);
        assert_eq!(store.snapshot().users.len(), 1);
    }

    #[test]
    fn membership_holds_until_removed() {
        let store = MembershipStore::with_membership("unused.json", Membership::new());
        assert!(store.add_user(id(5)));
        assert!(store.add_admin(id(6)));
        assert!(store.is_user(Some(id(5))));
        assert!(store.is_admin(Some(id(6))));

        assert!(store.remove_user(id(5)));
        assert!(!store.is_user(Some(id(5))));
        assert!(store.is_admin(Some(id(6))));
    }

    #[test]
    fn add_and_remove_are_idempotent() {
        let store = MembershipStore::with_membership("unused.json", Membership::new());
        store.add_user(id(1));
        let once = store.snapshot();
        assert!(!store.add_user(id(1)));
        assert_eq!(store.snapshot(), once);

        assert!(!store.remove_user(id(42)));
        assert!(!store.remove_admin(id(42)));
        assert_eq!(store.snapshot(), once);
    }

    #[test]
    fn remove_admin_keeps_user_role() {
        let store = MembershipStore::with_membership("unused.json", Membership::new());
        store.add_admin(id(3));
        store.add_user(id(3));
        assert_eq!(store.role_of(id(3)), Some(Role::Admin));

        assert!(store.remove_admin(id(3)));
        assert!(!store.is_admin(Some(id(3))));
        assert!(store.is_user(Some(id(3))));
        assert_eq!(store.role_of(id(3)), Some(Role::User));
        assert!(store.is_allowed(Some(id(3))));
    }

    #[test]
    fn set_allow_unknown_governs_unlisted_and_anonymous() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("wl.json");

        let store = MembershipStore::load(&path).unwrap();
        store.add_user(id(1));
        assert!(!store.is_allowed(Some(id(77))));
        assert!(!store.is_allowed(None));

        store.set_allow_unknown(true);
        assert!(store.allow_unknown());
        assert!(store.is_allowed(Some(id(77))));
        assert!(store.is_allowed(None));
        store.save().unwrap();

        let reloaded = MembershipStore::load(&path).unwrap();
        assert!(reloaded.allow_unknown());
        assert!(reloaded.is_allowed(Some(id(77))));
        assert!(reloaded.is_allowed(None));

        reloaded.set_allow_unknown(false);
        assert!(!reloaded.is_allowed(Some(id(77))));
        assert!(reloaded.is_allowed(Some(id(1))));
    }

    #[test]
    fn size_counts_union() {
        let store = MembershipStore::with_membership("unused.json", Membership::new());
        store.add_admin(id(1));
        store.add_user(id(1));
        store.add_user(id(2));
        assert_eq!(store.size(), 2);
    }

    #[test]
    fn save_then_load_round_trips() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("conf").join("wl.json");

        let store = MembershipStore::load(&path).unwrap();
        store.update(|m| {
            m.add(Role::User, id(300));
            m.add(Role::User, id(100));
            m.add(Role::Admin, id(200));
            m.add(Role::User, id(200));
            m.allow_unknown = true;
        });
        store.save().unwrap();

        let reloaded = MembershipStore::load(&path).unwrap();
        assert_eq!(reloaded.snapshot(), store.snapshot());
        assert!(reloaded.allow_unknown());
        assert_eq!(reloaded.size(), 3);

        let text = std::fs::read_to_string(&path).unwrap();
        let users: Vec<i64> = serde_json::from_str::<Snapshot>(&text)
            .unwrap()
            .user_ids()
            .map(Identity::get)
            .collect();
        assert_eq!(users, vec![100, 200, 300]);
    }

    #[test]
    fn mutations_are_not_persisted_until_save() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("wl.json");

        let store = MembershipStore::load(&path).unwrap();
        store.add_admin(id(1));
        store.save().unwrap();
        store.add_admin(id(2));

        let on_disk = MembershipStore::load(&path).unwrap();
        assert!(on_disk.is_admin(Some(id(1))));
        assert!(!on_disk.is_admin(Some(id(2))));
    }

    #[test]
    fn failed_save_keeps_in_memory_state() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("wl.json");
        std::fs::create_dir(&path).unwrap();

        let store = MembershipStore::with_membership(&path, Membership::new());
        store.add_user(id(7));
        let err = store.save().unwrap_err();

        assert!(matches!(err, WardenError::Persist(_)));
        assert!(store.is_user(Some(id(7))));
        assert!(path.is_dir());
    }

    #[test]
    fn stray_temp_file_does_not_affect_load() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("wl.json");

        let store = MembershipStore::load(&path).unwrap();
        store.add_admin(id(10));
        store.save().unwrap();

        // Leftover of a save interrupted before its rename.
        std::fs::write(tmp.path().join(".tmpAbC123"), b"{\"admins\":[{\"id\"").unwrap();

        let reloaded = MembershipStore::load(&path).unwrap();
        assert!(reloaded.is_admin(Some(id(10))));
        assert_eq!(reloaded.size(), 1);
    }

    #[test]
    fn concurrent_mutations_and_saves_stay_consistent() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("wl.json");
        let store = Arc::new(MembershipStore::load(&path).unwrap());

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for i in 0..25 {
                        let n = t * 100 + i;
                        store.update(|m| {
                            m.add(Role::Admin, id(n));
                            m.add(Role::User, id(n));
                        });
                        assert!(store.is_allowed(Some(id(n))));
                        if i % 5 == 0 {
                            store.save().unwrap();
                        }
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        store.save().unwrap();

        let reloaded = MembershipStore::load(&path).unwrap();
        assert_eq!(reloaded.size(), 200);
        let snap = reloaded.snapshot();
        assert_eq!(snap.admins, snap.users);
    }
}
