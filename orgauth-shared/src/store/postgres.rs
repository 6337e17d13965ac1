/// PostgreSQL credential store

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{CredentialStore, StoreError};
use crate::db::pool::health_check;
use crate::models::membership::Membership;
use crate::models::organisation::{NewOrganisation, Organisation};
use crate::models::user::{NewUser, User};

/// SQLSTATE for unique_violation
const UNIQUE_VIOLATION: &str = "23505";

/// SQLSTATE for foreign_key_violation
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Credential store backed by a `PgPool`
#[derive(Debug, Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Underlying pool, for shutdown
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            let constraint = db_err.constraint().unwrap_or("unknown").to_string();
            match db_err.code().as_deref() {
                Some(UNIQUE_VIOLATION) => return StoreError::Conflict(constraint),
                Some(FOREIGN_KEY_VIOLATION) => return StoreError::InvalidReference(constraint),
                _ => {}
            }
        }

        StoreError::Database(err)
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(User::find_by_email(&self.pool, email).await?)
    }

    async fn find_user_by_id(&self, user_id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(User::find_by_id(&self.pool, user_id).await?)
    }

    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError> {
        Ok(User::create(&self.pool, user).await?)
    }

    async fn register_user(
        &self,
        user: NewUser,
        org: NewOrganisation,
    ) -> Result<(User, Organisation), StoreError> {
        let mut tx = self.pool.begin().await?;

        // Dropping the transaction on error rolls the user back
        let user = User::create(&mut *tx, user).await?;
        let org = Organisation::create(&mut *tx, org).await?;

        tx.commit().await?;
        Ok((user, org))
    }

    async fn insert_organisation(
        &self,
        org: NewOrganisation,
    ) -> Result<Organisation, StoreError> {
        Ok(Organisation::create(&self.pool, org).await?)
    }

    async fn find_organisations_by_owner(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<Organisation>, StoreError> {
        Ok(Organisation::list_by_owner(&self.pool, user_id).await?)
    }

    async fn find_organisation_by_id_for_user(
        &self,
        org_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Organisation>, StoreError> {
        Ok(Organisation::find_for_user(&self.pool, org_id, user_id).await?)
    }

    async fn add_membership(&self, user_id: Uuid, org_id: Uuid) -> Result<(), StoreError> {
        Ok(Membership::add(&self.pool, user_id, org_id).await?)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(health_check(&self.pool).await?)
    }
}
