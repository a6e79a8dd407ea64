//! SQL user repository.
//!
//! Users are keyed by a generated id with a unique email column. Mutations
//! run inside a transaction so the existence check and the write commit
//! together; the unique constraint is the final arbiter for racing creates.

use async_trait::async_trait;
use sea_orm::{
    sea_query::LikeExpr, ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait,
    DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder, Set, SqlErr, Statement,
    TransactionTrait,
};

use super::entities::user::{self, ActiveModel, Entity as UserEntity};
use super::entities::user_list::{self, Entity as ListEntity};
use super::UserRepository;
use common::{AppError, AppResult};
use domain::{FieldError, IdentityScheme, User, UserChanges, UserFilter, UserList};

/// SeaORM-backed implementation of [`UserRepository`].
pub struct SqlUserStore {
    db: DatabaseConnection,
}

impl SqlUserStore {
    /// Create new repository instance
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

/// Unique violations become `Conflict` on `entity`; everything else is a
/// database error.
fn map_insert_error(err: DbErr, entity: &str) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::conflict(entity),
        _ => AppError::from(err),
    }
}

/// Read-modify-write of one user on `conn`. The caller owns the transaction.
async fn update_in<C: ConnectionTrait>(
    conn: &C,
    id: &str,
    changes: UserChanges,
) -> AppResult<user::Model> {
    let existing = UserEntity::find_by_id(id)
        .one(conn)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: ActiveModel = existing.into();
    if let Some(name) = changes.name {
        active.name = Set(Some(name));
    }
    if let Some(hash) = changes.password_hash {
        active.password = Set(hash);
    }
    active.updated_at = Set(changes.updated_at);

    // A concurrent delete between the read and the write leaves no row to update
    active.update(conn).await.map_err(|e| match e {
        DbErr::RecordNotUpdated | DbErr::RecordNotFound(_) => AppError::NotFound,
        other => AppError::from(other),
    })
}

/// Escape LIKE wildcards so a prefix matches literally.
fn like_prefix(prefix: &str) -> LikeExpr {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    for c in prefix.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    LikeExpr::new(pattern).escape('\\')
}

#[async_trait]
impl UserRepository for SqlUserStore {
    fn identity_scheme(&self) -> IdentityScheme {
        IdentityScheme::Email
    }

    async fn create(&self, user: User) -> AppResult<User> {
        let email = user
            .email
            .clone()
            .ok_or_else(|| AppError::Validation(vec![FieldError::required("email")]))?;

        let txn = self.db.begin().await?;

        let existing = UserEntity::find()
            .filter(
                Condition::any()
                    .add(user::Column::Id.eq(user.id.as_str()))
                    .add(user::Column::Email.eq(email.as_str())),
            )
            .one(&txn)
            .await?;
        if let Some(existing) = existing {
            let entity = if existing.email == email { "Email" } else { "User" };
            return Err(AppError::conflict(entity));
        }

        let active_model = ActiveModel {
            id: Set(user.id),
            name: Set(user.name),
            email: Set(email),
            password: Set(user.password_hash),
            created_at: Set(user.created_at),
            updated_at: Set(user.updated_at),
        };

        let model = active_model
            .insert(&txn)
            .await
            .map_err(|e| map_insert_error(e, "User"))?;
        txn.commit().await?;

        Ok(User::from(model))
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<User>> {
        let result = UserEntity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(result.map(User::from))
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let result = UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(result.map(User::from))
    }

    async fn list(&self, filter: &UserFilter) -> AppResult<Vec<User>> {
        let mut query = UserEntity::find();
        if let Some(prefix) = filter.id_prefix.as_deref() {
            query = query.filter(user::Column::Id.like(like_prefix(prefix)));
        }

        let models = query
            .order_by_asc(user::Column::CreatedAt)
            .order_by_asc(user::Column::Id)
            .all(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(models.into_iter().map(User::from).collect())
    }

    async fn update(&self, id: &str, changes: UserChanges) -> AppResult<User> {
        let txn = self.db.begin().await?;
        let model = update_in(&txn, id, changes).await?;
        txn.commit().await?;

        Ok(User::from(model))
    }

    async fn delete(&self, id: &str) -> AppResult<()> {
        let txn = self.db.begin().await?;
        ListEntity::delete_many()
            .filter(user_list::Column::OwnerId.eq(id))
            .exec(&txn)
            .await?;
        UserEntity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        Ok(())
    }

    async fn create_list(&self, owner: &str, list: UserList) -> AppResult<UserList> {
        let txn = self.db.begin().await?;

        if UserEntity::find_by_id(owner).one(&txn).await?.is_none() {
            return Err(AppError::NotFound);
        }
        let existing = ListEntity::find_by_id((owner.to_owned(), list.name.clone()))
            .one(&txn)
            .await?;
        if existing.is_some() {
            return Err(AppError::conflict("List"));
        }

        let model = user_list::ActiveModel {
            owner_id: Set(owner.to_owned()),
            name: Set(list.name),
            todo_count: Set(i64::from(list.todo_count)),
        }
        .insert(&txn)
        .await
        .map_err(|e| map_insert_error(e, "List"))?;
        txn.commit().await?;

        Ok(UserList::from(model))
    }

    async fn find_list(&self, owner: &str, name: &str) -> AppResult<Option<UserList>> {
        let result = ListEntity::find_by_id((owner.to_owned(), name.to_owned()))
            .one(&self.db)
            .await?;

        Ok(result.map(UserList::from))
    }

    async fn lists_for_user(&self, owner: &str) -> AppResult<Vec<UserList>> {
        let models = ListEntity::find()
            .filter(user_list::Column::OwnerId.eq(owner))
            .order_by_asc(user_list::Column::Name)
            .all(&self.db)
            .await?;

        Ok(models.into_iter().map(UserList::from).collect())
    }

    async fn ping(&self) -> AppResult<()> {
        self.db
            .execute(Statement::from_string(
                self.db.get_database_backend(),
                "SELECT 1".to_string(),
            ))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::Database;
    use common::DatabaseConfig;
    use tempfile::TempDir;

    async fn store() -> (TempDir, SqlUserStore) {
        let dir = tempfile::tempdir().unwrap();
        let config = DatabaseConfig {
            url: format!("sqlite://{}?mode=rwc", dir.path().join("users.db").display()),
            ..DatabaseConfig::default()
        };
        let db = Database::connect(&config).await.unwrap();
        (dir, SqlUserStore::new(db.get_connection()))
    }

    fn user(id: &str, email: &str) -> User {
        User::new(
            id.into(),
            Some("Jane Doe".into()),
            Some(email.into()),
            "hash-old".into(),
            100,
        )
    }

    #[tokio::test]
    async fn unique_index_violation_is_a_user_conflict() {
        let (_dir, store) = store().await;
        store.create(user("id-1", "jane@example.com")).await.unwrap();

        // Straight to the table so the unique index, not the pre-check, rejects it
        let err = ActiveModel {
            id: Set("id-2".into()),
            name: Set(None),
            email: Set("jane@example.com".into()),
            password: Set("hash".into()),
            created_at: Set(1),
            updated_at: Set(1),
        }
        .insert(&store.db)
        .await
        .unwrap_err();

        match map_insert_error(err, "User") {
            AppError::Conflict(entity) => assert_eq!(entity, "User"),
            other => panic!("expected conflict, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn uncommitted_update_leaves_row_unchanged() {
        let (_dir, store) = store().await;
        store.create(user("id-1", "jane@example.com")).await.unwrap();

        let txn = store.db.begin().await.unwrap();
        let changes = UserChanges {
            name: Some("Alpha".into()),
            password_hash: Some("hash-new".into()),
            updated_at: 300,
        };
        let applied = update_in(&txn, "id-1", changes).await.unwrap();
        assert_eq!(applied.name.as_deref(), Some("Alpha"));
        drop(txn);

        let stored = store.find_by_id("id-1").await.unwrap().unwrap();
        assert_eq!(stored.name.as_deref(), Some("Jane Doe"));
        assert_eq!(stored.password_hash, "hash-old");
        assert_eq!(stored.updated_at, 100);

        let changes = UserChanges {
            name: Some("Bravo".into()),
            password_hash: None,
            updated_at: 400,
        };
        let updated = store.update("id-1", changes).await.unwrap();
        assert_eq!(updated.name.as_deref(), Some("Bravo"));
        assert_eq!(updated.password_hash, "hash-old");
    }

    #[tokio::test]
    async fn deleting_a_user_drops_its_lists() {
        let (_dir, store) = store().await;
        store.create(user("id-1", "jane@example.com")).await.unwrap();
        store.create_list("id-1", UserList::new("chores")).await.unwrap();

        store.delete("id-1").await.unwrap();

        let rows = ListEntity::find().all(&store.db).await.unwrap();
        assert!(rows.is_empty());
    }
}
