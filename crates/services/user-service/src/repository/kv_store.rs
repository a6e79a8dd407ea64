//! Key-value user repository.
//!
//! Each user is one JSON document at `user/<username>`, and each of its lists
//! one document at `user/<username>/list/<name>`. The username is the identity
//! and email is not stored.
//!
//! Mutations on one id run as a single blocking task holding that id's stripe
//! lock, from the existence check through the final engine write. Dropping the
//! caller's future detaches the task but cannot release the lock early, so a
//! mutation either lands whole, ordered against the others, or not at all.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::kv::{KvEngine, KvEngineAsync, KvError, KvResult};
use super::UserRepository;
use common::{AppError, AppResult};
use domain::{
    IdentityScheme, User, UserChanges, UserFilter, UserList, LIST_KEY_SEGMENT, USER_KEY_PREFIX,
};

const LOCK_STRIPES: usize = 64;

/// On-disk record layout.
#[derive(Debug, Serialize, Deserialize)]
struct StoredUser {
    id: String,
    #[serde(default)]
    name: Option<String>,
    password_hash: String,
    created_at: i64,
    updated_at: i64,
}

impl From<&User> for StoredUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            password_hash: user.password_hash.clone(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

impl From<StoredUser> for User {
    fn from(stored: StoredUser) -> Self {
        User {
            id: stored.id,
            name: stored.name,
            email: None,
            password_hash: stored.password_hash,
            created_at: stored.created_at,
            updated_at: stored.updated_at,
        }
    }
}

fn encode(user: &User) -> KvResult<Vec<u8>> {
    serde_json::to_vec(&StoredUser::from(user)).map_err(|e| KvError::Serialization(e.to_string()))
}

fn decode(bytes: &[u8]) -> KvResult<User> {
    serde_json::from_slice::<StoredUser>(bytes)
        .map(User::from)
        .map_err(|e| KvError::Serialization(e.to_string()))
}

fn encode_list(list: &UserList) -> KvResult<Vec<u8>> {
    serde_json::to_vec(list).map_err(|e| KvError::Serialization(e.to_string()))
}

fn decode_list(bytes: &[u8]) -> KvResult<UserList> {
    serde_json::from_slice(bytes).map_err(|e| KvError::Serialization(e.to_string()))
}

fn user_key(id: &str) -> Vec<u8> {
    format!("{}{}", USER_KEY_PREFIX, id).into_bytes()
}

/// Everything nested below a user: `user/<id>/`
fn nested_prefix(id: &str) -> Vec<u8> {
    format!("{}{}/", USER_KEY_PREFIX, id).into_bytes()
}

fn lists_prefix(owner: &str) -> Vec<u8> {
    format!("{}{}{}", USER_KEY_PREFIX, owner, LIST_KEY_SEGMENT).into_bytes()
}

fn list_key(owner: &str, name: &str) -> Vec<u8> {
    let mut key = lists_prefix(owner);
    key.extend_from_slice(name.as_bytes());
    key
}

/// Ids that cannot name a top-level user key
fn is_addressable(id: &str) -> bool {
    !id.is_empty() && !id.contains('/')
}

/// [`UserRepository`] over any [`KvEngine`].
pub struct KvUserStore {
    engine: Arc<dyn KvEngine>,
    locks: Arc<Vec<Mutex<()>>>,
}

impl KvUserStore {
    pub fn new(engine: Arc<dyn KvEngine>) -> Self {
        Self {
            engine,
            locks: Arc::new((0..LOCK_STRIPES).map(|_| Mutex::new(())).collect()),
        }
    }

    fn stripe_for(&self, id: &str) -> usize {
        let mut hasher = DefaultHasher::new();
        id.hash(&mut hasher);
        (hasher.finish() as usize) % self.locks.len()
    }

    /// Run `op` on the blocking pool under the stripe lock for `id`.
    ///
    /// The guard lives inside the blocking task, so it is held until the last
    /// engine call of `op` returns even if the awaiting future is dropped.
    async fn locked<T, F>(&self, id: &str, op: F) -> AppResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&dyn KvEngine) -> AppResult<T> + Send + 'static,
    {
        let engine = Arc::clone(&self.engine);
        let locks = Arc::clone(&self.locks);
        let stripe = self.stripe_for(id);

        tokio::task::spawn_blocking(move || {
            // Guards `()`, so a poisoned stripe is still usable
            let _guard = locks[stripe].lock().unwrap_or_else(PoisonError::into_inner);
            op(engine.as_ref())
        })
        .await
        .map_err(|e| AppError::from(KvError::Join(e.to_string())))?
    }

    async fn load(&self, id: &str) -> AppResult<Option<User>> {
        if !is_addressable(id) {
            return Ok(None);
        }
        match self.engine.get_async(user_key(id)).await? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl UserRepository for KvUserStore {
    fn identity_scheme(&self) -> IdentityScheme {
        IdentityScheme::Username
    }

    async fn create(&self, user: User) -> AppResult<User> {
        if !is_addressable(&user.id) {
            return Err(AppError::BadRequest(format!("Invalid username '{}'", user.id)));
        }

        let key = user_key(&user.id);
        let bytes = encode(&user)?;
        self.locked(&user.id, move |engine| {
            if engine.get(&key)?.is_some() {
                return Err(AppError::conflict("Username"));
            }
            engine.put(&key, &bytes)?;
            Ok(())
        })
        .await?;

        tracing::debug!(id = %user.id, "Stored user");
        Ok(user)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<User>> {
        self.load(id).await
    }

    async fn find_by_email(&self, _email: &str) -> AppResult<Option<User>> {
        Ok(None)
    }

    async fn list(&self, filter: &UserFilter) -> AppResult<Vec<User>> {
        let mut prefix = USER_KEY_PREFIX.as_bytes().to_vec();
        if let Some(id_prefix) = filter.id_prefix.as_deref() {
            prefix.extend_from_slice(id_prefix.as_bytes());
        }

        let pairs = self.engine.scan_prefix_async(prefix).await?;
        let mut users = Vec::with_capacity(pairs.len());
        for (key, value) in pairs {
            // Keys nested below a user belong to its lists
            if key[USER_KEY_PREFIX.len()..].contains(&b'/') {
                continue;
            }
            users.push(decode(&value)?);
        }
        Ok(users)
    }

    async fn update(&self, id: &str, changes: UserChanges) -> AppResult<User> {
        if !is_addressable(id) {
            return Err(AppError::NotFound);
        }

        let key = user_key(id);
        self.locked(id, move |engine| {
            let bytes = engine.get(&key)?.ok_or(AppError::NotFound)?;
            let mut user = decode(&bytes)?;
            user.apply(&changes);
            engine.put(&key, &encode(&user)?)?;
            Ok(user)
        })
        .await
    }

    async fn delete(&self, id: &str) -> AppResult<()> {
        if !is_addressable(id) {
            return Ok(());
        }

        let key = user_key(id);
        let nested = nested_prefix(id);
        self.locked(id, move |engine| {
            engine.delete(&key)?;
            for (child, _) in engine.scan_prefix(&nested)? {
                engine.delete(&child)?;
            }
            Ok(())
        })
        .await
    }

    async fn create_list(&self, owner: &str, list: UserList) -> AppResult<UserList> {
        if !is_addressable(owner) {
            return Err(AppError::NotFound);
        }
        if !is_addressable(&list.name) {
            return Err(AppError::BadRequest(format!("Invalid list name '{}'", list.name)));
        }

        // Lists take the owner's stripe so they cannot outlive a concurrent delete
        let owner_key = user_key(owner);
        let key = list_key(owner, &list.name);
        let bytes = encode_list(&list)?;
        self.locked(owner, move |engine| {
            if engine.get(&owner_key)?.is_none() {
                return Err(AppError::NotFound);
            }
            if engine.get(&key)?.is_some() {
                return Err(AppError::conflict("List"));
            }
            engine.put(&key, &bytes)?;
            Ok(())
        })
        .await?;

        tracing::debug!(owner = %owner, list = %list.name, "Stored list");
        Ok(list)
    }

    async fn find_list(&self, owner: &str, name: &str) -> AppResult<Option<UserList>> {
        if !is_addressable(owner) || !is_addressable(name) {
            return Ok(None);
        }
        match self.engine.get_async(list_key(owner, name)).await? {
            Some(bytes) => Ok(Some(decode_list(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn lists_for_user(&self, owner: &str) -> AppResult<Vec<UserList>> {
        if !is_addressable(owner) {
            return Ok(Vec::new());
        }
        let prefix = lists_prefix(owner);
        let pairs = self.engine.scan_prefix_async(prefix.clone()).await?;

        let mut lists = Vec::with_capacity(pairs.len());
        for (key, value) in pairs {
            if key[prefix.len()..].contains(&b'/') {
                continue;
            }
            lists.push(decode_list(&value)?);
        }
        Ok(lists)
    }

    async fn ping(&self) -> AppResult<()> {
        self.engine
            .get_async(USER_KEY_PREFIX.as_bytes().to_vec())
            .await
            .map(|_| ())
            .map_err(AppError::from)
    }
}
