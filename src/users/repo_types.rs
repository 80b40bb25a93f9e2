use serde::Serialize;
use sqlx::{FromRow, Postgres, QueryBuilder};
use time::OffsetDateTime;

/// Full row of the `users` table.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i32,
    pub email: String,
    pub password: String, // argon2 PHC string, never plaintext
    pub created_at: OffsetDateTime,
}

/// The columns safe to hand back to a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct PublicUser {
    pub id: i32,
    pub email: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            created_at: u.created_at,
        }
    }
}

/// Columns an update will write. The password is already hashed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserChanges {
    pub email: Option<String>,
    pub password_hash: Option<String>,
}

impl UserChanges {
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.password_hash.is_none()
    }

    /// Builds `UPDATE users SET ... WHERE id = $n RETURNING ...`.
    ///
    /// Each column is pushed together with its bind, so placeholder numbers
    /// always follow the order values were added; the id is bound last.
    /// Callers must check [`UserChanges::is_empty`] first.
    pub fn update_query(&self, id: i32) -> QueryBuilder<'_, Postgres> {
        let mut qb = QueryBuilder::new("UPDATE users SET ");
        {
            let mut set = qb.separated(", ");
            if let Some(email) = &self.email {
                set.push("email = ").push_bind_unseparated(email);
            }
            if let Some(hash) = &self.password_hash {
                set.push("password = ").push_bind_unseparated(hash);
            }
        }
        qb.push(" WHERE id = ")
            .push_bind(id)
            .push(" RETURNING id, email, created_at");
        qb
    }
}
