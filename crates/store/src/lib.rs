//! Membership store, whitelist document codec, and the access decision engine.

pub mod codec;
pub mod decision;
pub mod membership;
pub mod persist;
pub mod store;

pub use decision::decide;
pub use membership::{IdentitySet, Membership};
pub use store::MembershipStore;
