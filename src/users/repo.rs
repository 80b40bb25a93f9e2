use async_trait::async_trait;
use sqlx::PgPool;

use crate::users::repo_types::{PublicUser, User, UserChanges};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("email already registered")]
    DuplicateEmail,
    #[error(transparent)]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &e {
            if db.is_unique_violation() {
                return StoreError::DuplicateEmail;
            }
        }
        StoreError::Database(e)
    }
}

/// Persistence for the `users` table.
///
/// `Ok(None)` from the by-id operations means no row matched.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn list(&self) -> Result<Vec<PublicUser>, StoreError>;
    async fn find(&self, id: i32) -> Result<Option<PublicUser>, StoreError>;
    async fn insert(&self, email: &str, password_hash: &str) -> Result<User, StoreError>;
    async fn update(&self, id: i32, changes: &UserChanges)
        -> Result<Option<PublicUser>, StoreError>;
    async fn delete(&self, id: i32) -> Result<Option<User>, StoreError>;
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn list(&self) -> Result<Vec<PublicUser>, StoreError> {
        let rows = sqlx::query_as::<_, PublicUser>(
            r#"
            SELECT id, email, created_at
            FROM users
            ORDER BY id
            "#,
        )
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn find(&self, id: i32) -> Result<Option<PublicUser>, StoreError> {
        let row = sqlx::query_as::<_, PublicUser>(
            r#"
            SELECT id, email, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn insert(&self, email: &str, password_hash: &str) -> Result<User, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password)
            VALUES ($1, $2)
            RETURNING id, email, password, created_at
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.db)
        .await?;
        Ok(user)
    }

    async fn update(
        &self,
        id: i32,
        changes: &UserChanges,
    ) -> Result<Option<PublicUser>, StoreError> {
        let mut qb = changes.update_query(id);
        let row = qb
            .build_query_as::<PublicUser>()
            .fetch_optional(&self.db)
            .await?;
        Ok(row)
    }

    async fn delete(&self, id: i32) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, User>(
            r#"
            DELETE FROM users
            WHERE id = $1
            RETURNING id, email, password, created_at
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }
}
