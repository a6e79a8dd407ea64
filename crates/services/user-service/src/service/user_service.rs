//! User service - Handles user-related business logic.
//!
//! Validates input against the active backend's identity scheme, hashes
//! passwords off the async executor and stamps timestamps before handing
//! records to the repository.

use async_trait::async_trait;
use std::sync::Arc;

use common::{AppError, AppResult, OptionExt};
use domain::{
    CreateList, CreateUser, FieldError, IdGenerator, IdentityScheme, PasswordHasher, UpdateUser,
    User, UserChanges, UserFilter, UserList,
};

use crate::repository::UserRepository;

/// User service trait for dependency injection.
#[async_trait]
pub trait UserService: Send + Sync {
    /// Identity scheme of the underlying store
    fn identity_scheme(&self) -> IdentityScheme;

    /// Validate input, hash the password and persist a new user
    async fn create_user(&self, input: CreateUser) -> AppResult<User>;

    /// Get user by ID
    async fn get_user(&self, id: &str) -> AppResult<User>;

    /// Get user by email. Always `NotFound` on backends without email.
    async fn get_user_by_email(&self, email: &str) -> AppResult<User>;

    /// List users, optionally restricted to an id prefix
    async fn list_users(&self, filter: UserFilter) -> AppResult<Vec<User>>;

    /// Apply a partial update
    async fn update_user(&self, id: &str, input: UpdateUser) -> AppResult<User>;

    /// Delete user. Fails with `NotFound` if the user does not exist.
    async fn delete_user(&self, id: &str) -> AppResult<()>;

    /// Create an empty list owned by `owner`
    async fn create_list(&self, owner: &str, input: CreateList) -> AppResult<UserList>;

    /// Get one of a user's lists
    async fn get_list(&self, owner: &str, name: &str) -> AppResult<UserList>;

    /// All lists owned by `owner`. Fails with `NotFound` if the user does not exist.
    async fn lists_for_user(&self, owner: &str) -> AppResult<Vec<UserList>>;

    /// Check a plaintext password against the stored hash
    async fn verify_password(&self, id: &str, password: &str) -> AppResult<bool>;

    /// Check that the storage backend is reachable
    async fn health(&self) -> AppResult<()>;
}

/// Concrete implementation of UserService using repository.
pub struct UserManager {
    repo: Arc<dyn UserRepository>,
    hasher: Arc<dyn PasswordHasher>,
    ids: Arc<dyn IdGenerator>,
}

impl UserManager {
    /// Create new user service instance with its collaborators
    pub fn new(
        repo: Arc<dyn UserRepository>,
        hasher: Arc<dyn PasswordHasher>,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        Self { repo, hasher, ids }
    }

    /// Argon2 is CPU-bound; keep it off the async workers.
    async fn hash_password(&self, plain_text: String) -> AppResult<String> {
        let hasher = Arc::clone(&self.hasher);
        tokio::task::spawn_blocking(move || hasher.hash(&plain_text))
            .await
            .map_err(|e| AppError::internal(format!("Password hash task failed: {}", e)))?
            .map_err(AppError::from)
    }

    fn now() -> i64 {
        chrono::Utc::now().timestamp()
    }
}

#[async_trait]
impl UserService for UserManager {
    fn identity_scheme(&self) -> IdentityScheme {
        self.repo.identity_scheme()
    }

    async fn create_user(&self, input: CreateUser) -> AppResult<User> {
        let scheme = self.repo.identity_scheme();
        input.check(scheme)?;

        let id = match scheme {
            IdentityScheme::Username => input
                .username
                .clone()
                .ok_or_else(|| AppError::Validation(vec![FieldError::required("username")]))?,
            IdentityScheme::Email => self.ids.generate(),
        };
        let name = input.display_name();
        let email = match scheme {
            IdentityScheme::Email => input.email.clone(),
            IdentityScheme::Username => None,
        };

        let password_hash = self.hash_password(input.password).await?;
        let user = User::new(id, name, email, password_hash, Self::now());

        let created = self.repo.create(user).await?;
        tracing::info!(id = %created.id, scheme = %scheme, "User created");
        Ok(created)
    }

    async fn get_user(&self, id: &str) -> AppResult<User> {
        tracing::debug!(id = %id, "Fetching user");
        self.repo.find_by_id(id).await?.ok_or_not_found()
    }

    async fn get_user_by_email(&self, email: &str) -> AppResult<User> {
        self.repo.find_by_email(email).await?.ok_or_not_found()
    }

    async fn list_users(&self, filter: UserFilter) -> AppResult<Vec<User>> {
        tracing::debug!(prefix = ?filter.id_prefix, "Listing users");
        self.repo.list(&filter).await
    }

    async fn update_user(&self, id: &str, input: UpdateUser) -> AppResult<User> {
        input.check()?;

        let password_hash = match input.password {
            Some(password) => Some(self.hash_password(password).await?),
            None => None,
        };
        let changes = UserChanges {
            name: input.name,
            password_hash,
            updated_at: Self::now(),
        };

        let updated = self.repo.update(id, changes).await?;
        tracing::info!(id = %updated.id, "User updated");
        Ok(updated)
    }

    async fn delete_user(&self, id: &str) -> AppResult<()> {
        if self.repo.find_by_id(id).await?.is_none() {
            return Err(AppError::NotFound);
        }
        self.repo.delete(id).await?;
        tracing::info!(id = %id, "User deleted");
        Ok(())
    }

    async fn create_list(&self, owner: &str, input: CreateList) -> AppResult<UserList> {
        input.check()?;

        let list = self.repo.create_list(owner, UserList::new(input.name)).await?;
        tracing::info!(owner = %owner, list = %list.name, "List created");
        Ok(list)
    }

    async fn get_list(&self, owner: &str, name: &str) -> AppResult<UserList> {
        tracing::debug!(owner = %owner, list = %name, "Fetching list");
        self.repo.find_list(owner, name).await?.ok_or_not_found()
    }

    async fn lists_for_user(&self, owner: &str) -> AppResult<Vec<UserList>> {
        if self.repo.find_by_id(owner).await?.is_none() {
            return Err(AppError::NotFound);
        }
        self.repo.lists_for_user(owner).await
    }

    async fn verify_password(&self, id: &str, password: &str) -> AppResult<bool> {
        let user = self.get_user(id).await?;
        let hasher = Arc::clone(&self.hasher);
        let password = password.to_owned();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &user.password_hash))
            .await
            .map_err(|e| AppError::internal(format!("Password verify task failed: {}", e)))
    }

    async fn health(&self) -> AppResult<()> {
        self.repo.ping().await
    }
}
