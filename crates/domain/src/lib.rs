//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod account;
mod identity;
mod role;
mod snapshot;

pub use account::{Account, AccountEmail, AccountId};
pub use identity::{DirectoryMember, IdentityToken, NewAccount, SyncSet};
pub use role::{Role, RoleId, RolePermission, RoleRef};
pub use snapshot::Snapshot;
