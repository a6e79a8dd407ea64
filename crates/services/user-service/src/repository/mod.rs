//! Repository layer for data access.
//!
//! [`UserRepository`] is the seam between the service and storage. Two
//! adapters implement it: [`SqlUserStore`] over SeaORM and [`KvUserStore`]
//! over any [`kv::KvEngine`].

pub mod entities;
pub mod kv;
mod kv_store;
mod sql_store;

pub use kv_store::KvUserStore;
pub use sql_store::SqlUserStore;

use async_trait::async_trait;

use common::AppResult;
use domain::{IdentityScheme, User, UserChanges, UserFilter, UserList};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// User repository trait for dependency injection.
///
/// Implementations make each mutation atomic with respect to the others on the
/// same id: a create never overwrites, and an update never resurrects a record
/// deleted concurrently.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// How this backend keys its records
    fn identity_scheme(&self) -> IdentityScheme;

    /// Insert a new user. Fails with `Conflict` if the id or email is taken.
    async fn create(&self, user: User) -> AppResult<User>;

    /// Find user by ID
    async fn find_by_id(&self, id: &str) -> AppResult<Option<User>>;

    /// Find user by email address. Backends without email always return `None`.
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// List users matching the filter
    async fn list(&self, filter: &UserFilter) -> AppResult<Vec<User>>;

    /// Apply a partial update. Fails with `NotFound` if the user does not exist.
    async fn update(&self, id: &str, changes: UserChanges) -> AppResult<User>;

    /// Delete user by ID together with the lists it owns. Deleting a missing
    /// user is not an error.
    async fn delete(&self, id: &str) -> AppResult<()>;

    /// Store a new list under `owner`. Fails with `NotFound` if the owner does
    /// not exist and `Conflict` if the owner already has a list of that name.
    async fn create_list(&self, owner: &str, list: UserList) -> AppResult<UserList>;

    /// Find one of a user's lists by name
    async fn find_list(&self, owner: &str, name: &str) -> AppResult<Option<UserList>>;

    /// All lists owned by `owner`, ordered by name
    async fn lists_for_user(&self, owner: &str) -> AppResult<Vec<UserList>>;

    /// Check that the backend is reachable
    async fn ping(&self) -> AppResult<()>;
}
