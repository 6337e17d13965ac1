/// Credential store contract
///
/// Every read and write of users, organisations and memberships goes through
/// [`CredentialStore`]. Two implementations ship with the crate:
///
/// - [`PgCredentialStore`]: PostgreSQL, delegating to the `models` functions
/// - [`MemoryCredentialStore`]: in-process maps with the same constraints
///
/// # Example
///
/// ```
/// use orgauth_shared::models::user::NewUser;
/// use orgauth_shared::store::{CredentialStore, MemoryCredentialStore, StoreError};
/// use uuid::Uuid;
///
/// # tokio_test_block(async {
/// let store = MemoryCredentialStore::new();
/// let new_user = |id| NewUser {
///     user_id: id,
///     first_name: "Ada".to_string(),
///     last_name: "Lovelace".to_string(),
///     email: "ada@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     phone: None,
/// };
///
/// store.insert_user(new_user(Uuid::new_v4())).await.unwrap();
/// let again = store.insert_user(new_user(Uuid::new_v4())).await;
/// assert!(matches!(again, Err(StoreError::Conflict(_))));
/// # });
/// # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
/// # }
/// ```

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::organisation::{NewOrganisation, Organisation};
use crate::models::user::{NewUser, User};

pub use memory::MemoryCredentialStore;
pub use postgres::PgCredentialStore;

/// Error type for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A referenced row does not exist
    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    /// Any other database failure
    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

/// Persistence operations needed by the API
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Looks up a user by exact email
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Looks up a user by ID
    async fn find_user_by_id(&self, user_id: Uuid) -> Result<Option<User>, StoreError>;

    /// Inserts a user
    ///
    /// Returns [`StoreError::Conflict`] when the email is already registered.
    /// This is decided atomically by the store, so two concurrent inserts of
    /// the same email never both succeed.
    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError>;

    /// Inserts a user together with their first organisation
    ///
    /// Both rows are written or neither is. Conflicts are reported as by
    /// [`insert_user`](Self::insert_user).
    async fn register_user(
        &self,
        user: NewUser,
        org: NewOrganisation,
    ) -> Result<(User, Organisation), StoreError>;

    /// Inserts an organisation
    ///
    /// Returns [`StoreError::InvalidReference`] when the owner does not exist.
    async fn insert_organisation(
        &self,
        org: NewOrganisation,
    ) -> Result<Organisation, StoreError>;

    /// Organisations owned by the user, oldest first
    async fn find_organisations_by_owner(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<Organisation>, StoreError>;

    /// The organisation, if it exists and the user owns it or is a member
    async fn find_organisation_by_id_for_user(
        &self,
        org_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Organisation>, StoreError>;

    /// Records a membership
    ///
    /// Returns [`StoreError::InvalidReference`] when the user or the
    /// organisation does not exist.
    async fn add_membership(&self, user_id: Uuid, org_id: Uuid) -> Result<(), StoreError>;

    /// Checks that the store is reachable
    async fn ping(&self) -> Result<(), StoreError>;
}
