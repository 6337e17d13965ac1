/// User model and database operations
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     user_id UUID PRIMARY KEY,
///     first_name VARCHAR(100) NOT NULL,
///     last_name VARCHAR(100) NOT NULL,
///     email VARCHAR(255) NOT NULL,
///     password_hash VARCHAR(255) NOT NULL,
///     phone VARCHAR(20),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT users_email_key UNIQUE (email)
/// );
/// ```
///
/// Email uniqueness is enforced by `users_email_key`. Any application-level
/// lookup before an insert is only a fast path; the constraint decides.
///
/// # Example
///
/// ```no_run
/// use orgauth_shared::models::user::{NewUser, User};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let user = User::create(&pool, NewUser {
///     user_id: Uuid::new_v4(),
///     first_name: "John".to_string(),
///     last_name: "Doe".to_string(),
///     email: "john.doe@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     phone: None,
/// }).await?;
///
/// let found = User::find_by_email(&pool, "john.doe@example.com").await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

/// A registered user
///
/// The password hash never leaves the server: it is skipped on serialization
/// and absent from [`UserProfile`].
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID v4, generated at registration)
    pub user_id: Uuid,

    pub first_name: String,

    pub last_name: String,

    /// Email address, unique and case-sensitive as stored
    pub email: String,

    /// Argon2id password hash
    #[serde(skip_serializing)]
    pub password_hash: String,

    pub phone: Option<String>,

    /// When the user registered
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new user
///
/// The caller generates the ID so it is known before the row exists.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub user_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,

    /// Argon2id password hash (NOT the plaintext password)
    pub password_hash: String,

    pub phone: Option<String>,
}

impl NewUser {
    /// Materialises the row as the store would return it
    pub fn into_user(self, created_at: DateTime<Utc>) -> User {
        User {
            user_id: self.user_id,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            password_hash: self.password_hash,
            phone: self.phone,
            created_at,
        }
    }
}

/// Public view of a user, safe to return to any caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub user_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.user_id,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
        }
    }
}

impl User {
    /// Inserts a new user
    ///
    /// # Errors
    ///
    /// Returns a database error carrying the `users_email_key` constraint when
    /// the email is already registered.
    pub async fn create<'e, E>(executor: E, data: NewUser) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (user_id, first_name, last_name, email, password_hash, phone)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING user_id, first_name, last_name, email, password_hash, phone, created_at
            "#,
        )
        .bind(data.user_id)
        .bind(data.first_name)
        .bind(data.last_name)
        .bind(data.email)
        .bind(data.password_hash)
        .bind(data.phone)
        .fetch_one(executor)
        .await?;

        Ok(user)
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, user_id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT user_id, first_name, last_name, email, password_hash, phone, created_at
            FROM users
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by exact email
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT user_id, first_name, last_name, email, password_hash, phone, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Deletes a user by ID
    ///
    /// Not reachable over HTTP. Cascades to owned organisations and
    /// memberships.
    pub async fn delete(pool: &PgPool, user_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE user_id = $1")
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Public view of this user
    pub fn profile(&self) -> UserProfile {
        UserProfile::from(self)
    }
}
