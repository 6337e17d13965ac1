/// Organisation membership records
///
/// A membership says a user was added to an organisation, distinct from
/// owning it. Duplicate rows are allowed. The only read is the access check
/// in [`Organisation::find_for_user`](super::organisation::Organisation::find_for_user).
///
/// # Schema
///
/// ```sql
/// CREATE TABLE organisation_members (
///     id BIGSERIAL PRIMARY KEY,
///     org_id UUID NOT NULL REFERENCES organisations(org_id) ON DELETE CASCADE,
///     user_id UUID NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use sqlx::PgPool;
use uuid::Uuid;

/// Membership operations
pub struct Membership;

impl Membership {
    /// Records that a user was added to an organisation
    ///
    /// # Errors
    ///
    /// Returns a foreign key violation if either side does not exist.
    pub async fn add(pool: &PgPool, user_id: Uuid, org_id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO organisation_members (org_id, user_id)
            VALUES ($1, $2)
            "#,
        )
        .bind(org_id)
        .bind(user_id)
        .execute(pool)
        .await?;

        Ok(())
    }
}
