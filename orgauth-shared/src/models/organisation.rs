/// Organisation model and database operations
///
/// Every organisation has exactly one owner, set at creation and never
/// changed. Other users gain access through the membership table.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE organisations (
///     org_id UUID PRIMARY KEY,
///     name VARCHAR(100) NOT NULL,
///     description TEXT,
///     owner_id UUID NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

/// An organisation owned by a single user
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Organisation {
    /// Unique organisation ID (UUID v4)
    pub org_id: Uuid,

    pub name: String,

    pub description: Option<String>,

    /// Creating user, immutable
    pub owner_id: Uuid,

    pub created_at: DateTime<Utc>,
}

/// Input for creating an organisation
#[derive(Debug, Clone)]
pub struct NewOrganisation {
    pub org_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub owner_id: Uuid,
}

impl NewOrganisation {
    /// New organisation with a fresh ID
    pub fn new(name: impl Into<String>, description: Option<String>, owner_id: Uuid) -> Self {
        Self {
            org_id: Uuid::new_v4(),
            name: name.into(),
            description,
            owner_id,
        }
    }

    /// The organisation created for every user at registration
    pub fn default_for(first_name: &str, owner_id: Uuid) -> Self {
        Self::new(default_name(first_name), None, owner_id)
    }

    /// Materialises the row as the store would return it
    pub fn into_organisation(self, created_at: DateTime<Utc>) -> Organisation {
        Organisation {
            org_id: self.org_id,
            name: self.name,
            description: self.description,
            owner_id: self.owner_id,
            created_at,
        }
    }
}

/// Name of the organisation created at registration
pub fn default_name(first_name: &str) -> String {
    format!("{}'s Organisation", first_name)
}

/// Public view of an organisation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganisationView {
    pub org_id: Uuid,
    pub name: String,
    pub description: Option<String>,
}

impl From<&Organisation> for OrganisationView {
    fn from(org: &Organisation) -> Self {
        Self {
            org_id: org.org_id,
            name: org.name.clone(),
            description: org.description.clone(),
        }
    }
}

impl Organisation {
    /// Inserts a new organisation
    ///
    /// # Errors
    ///
    /// Returns a foreign key violation if the owner does not exist.
    pub async fn create<'e, E>(executor: E, data: NewOrganisation) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let org = sqlx::query_as::<_, Organisation>(
            r#"
            INSERT INTO organisations (org_id, name, description, owner_id)
            VALUES ($1, $2, $3, $4)
            RETURNING org_id, name, description, owner_id, created_at
            "#,
        )
        .bind(data.org_id)
        .bind(data.name)
        .bind(data.description)
        .bind(data.owner_id)
        .fetch_one(executor)
        .await?;

        Ok(org)
    }

    /// Lists organisations owned by a user, oldest first
    pub async fn list_by_owner(pool: &PgPool, owner_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let orgs = sqlx::query_as::<_, Organisation>(
            r#"
            SELECT org_id, name, description, owner_id, created_at
            FROM organisations
            WHERE owner_id = $1
            ORDER BY created_at ASC, org_id ASC
            "#,
        )
        .bind(owner_id)
        .fetch_all(pool)
        .await?;

        Ok(orgs)
    }

    /// Finds an organisation the user may see
    ///
    /// Returns `None` both when the organisation does not exist and when the
    /// user is neither its owner nor a recorded member, so callers cannot tell
    /// the two apart.
    pub async fn find_for_user(
        pool: &PgPool,
        org_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let org = sqlx::query_as::<_, Organisation>(
            r#"
            SELECT o.org_id, o.name, o.description, o.owner_id, o.created_at
            FROM organisations o
            WHERE o.org_id = $1
              AND (
                  o.owner_id = $2
                  OR EXISTS (
                      SELECT 1 FROM organisation_members m
                      WHERE m.org_id = o.org_id AND m.user_id = $2
                  )
              )
            "#,
        )
        .bind(org_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(org)
    }

    /// Public view of this organisation
    pub fn view(&self) -> OrganisationView {
        OrganisationView::from(self)
    }
}
