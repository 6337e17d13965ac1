/// In-memory credential store
///
/// Enforces the same constraints as the PostgreSQL schema: unique email,
/// organisation owner must exist, membership endpoints must exist. All state
/// sits behind one lock, so each operation is atomic.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{CredentialStore, StoreError};
use crate::models::organisation::{NewOrganisation, Organisation};
use crate::models::user::{NewUser, User};

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    emails: HashMap<String, Uuid>,
    /// Insertion order doubles as creation order
    organisations: Vec<Organisation>,
    members: Vec<(Uuid, Uuid)>,
}

impl Tables {
    fn organisation(&self, org_id: Uuid) -> Option<&Organisation> {
        self.organisations.iter().find(|o| o.org_id == org_id)
    }

    fn check_user(&self, user: &NewUser) -> Result<(), StoreError> {
        if self.emails.contains_key(&user.email) {
            return Err(StoreError::Conflict("users_email_key".to_string()));
        }
        if self.users.contains_key(&user.user_id) {
            return Err(StoreError::Conflict("users_pkey".to_string()));
        }
        Ok(())
    }

    /// `pending_owner` is a user being inserted in the same operation
    fn check_organisation(
        &self,
        org: &NewOrganisation,
        pending_owner: Option<Uuid>,
    ) -> Result<(), StoreError> {
        if pending_owner != Some(org.owner_id) && !self.users.contains_key(&org.owner_id) {
            return Err(StoreError::InvalidReference(
                "organisations_owner_id_fkey".to_string(),
            ));
        }
        if self.organisation(org.org_id).is_some() {
            return Err(StoreError::Conflict("organisations_pkey".to_string()));
        }
        Ok(())
    }

    fn push_user(&mut self, user: NewUser) -> User {
        let user = user.into_user(Utc::now());
        self.emails.insert(user.email.clone(), user.user_id);
        self.users.insert(user.user_id, user.clone());
        user
    }

    fn push_organisation(&mut self, org: NewOrganisation) -> Organisation {
        let org = org.into_organisation(Utc::now());
        self.organisations.push(org.clone());
        org
    }
}

/// Credential store held in process memory
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    tables: RwLock<Tables>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered users
    pub async fn user_count(&self) -> usize {
        self.tables.read().await.users.len()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .emails
            .get(email)
            .and_then(|id| tables.users.get(id))
            .cloned())
    }

    async fn find_user_by_id(&self, user_id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.tables.read().await.users.get(&user_id).cloned())
    }

    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError> {
        let mut tables = self.tables.write().await;

        tables.check_user(&user)?;
        Ok(tables.push_user(user))
    }

    async fn register_user(
        &self,
        user: NewUser,
        org: NewOrganisation,
    ) -> Result<(User, Organisation), StoreError> {
        let mut tables = self.tables.write().await;

        // Both checks run before either write
        tables.check_user(&user)?;
        tables.check_organisation(&org, Some(user.user_id))?;

        let user = tables.push_user(user);
        let org = tables.push_organisation(org);
        Ok((user, org))
    }

    async fn insert_organisation(
        &self,
        org: NewOrganisation,
    ) -> Result<Organisation, StoreError> {
        let mut tables = self.tables.write().await;

        tables.check_organisation(&org, None)?;
        Ok(tables.push_organisation(org))
    }

    async fn find_organisations_by_owner(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<Organisation>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .organisations
            .iter()
            .filter(|o| o.owner_id == user_id)
            .cloned()
            .collect())
    }

    async fn find_organisation_by_id_for_user(
        &self,
        org_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Organisation>, StoreError> {
        let tables = self.tables.read().await;

        Ok(tables
            .organisation(org_id)
            .filter(|o| {
                o.owner_id == user_id || tables.members.contains(&(org_id, user_id))
            })
            .cloned())
    }

    async fn add_membership(&self, user_id: Uuid, org_id: Uuid) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;

        if !tables.users.contains_key(&user_id) {
            return Err(StoreError::InvalidReference(
                "organisation_members_user_id_fkey".to_string(),
            ));
        }
        if tables.organisation(org_id).is_none() {
            return Err(StoreError::InvalidReference(
                "organisation_members_org_id_fkey".to_string(),
            ));
        }

        tables.members.push((org_id, user_id));
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
