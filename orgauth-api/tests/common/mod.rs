//! Common test utilities for integration tests
//!
//! The router is driven in-process over `MemoryCredentialStore`, so these
//! tests need no database:
//! - Test app construction with a fast password hasher
//! - A store wrapper that counts every call
//! - Request helpers returning status and parsed JSON

#![allow(dead_code)]

use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc,
};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use orgauth_api::{
    app::{build_router, AppState},
    config::{ApiConfig, Config, DatabaseConfig, JwtConfig},
};
use orgauth_shared::{
    auth::{jwt::TokenService, password::PasswordHasherConfig},
    models::{
        organisation::{NewOrganisation, Organisation},
        user::{NewUser, User},
    },
    store::{CredentialStore, MemoryCredentialStore, StoreError},
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_SECRET: &str = "integration-test-secret-at-least-32-bytes";

/// Cheap Argon2 parameters so tests stay fast
pub const FAST_HASHER: PasswordHasherConfig = PasswordHasherConfig {
    memory_kib: 1024,
    iterations: 1,
    parallelism: 1,
};

pub fn test_config() -> Config {
    Config {
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: vec!["*".to_string()],
            production: false,
        },
        database: DatabaseConfig {
            url: String::new(),
            max_connections: 1,
        },
        jwt: JwtConfig {
            secret: TEST_SECRET.to_string(),
        },
        password: FAST_HASHER,
        log_json: false,
    }
}

/// Test context containing the router and its store
pub struct TestContext<S = MemoryCredentialStore> {
    pub app: Router,
    pub store: Arc<S>,
    pub tokens: TokenService,
}

impl TestContext<MemoryCredentialStore> {
    pub fn new() -> Self {
        Self::with_store(MemoryCredentialStore::new())
    }
}

impl<S> TestContext<S>
where
    S: CredentialStore + 'static,
{
    pub fn with_store(store: S) -> Self {
        let store = Arc::new(store);
        let state = AppState::new(store.clone(), test_config());

        Self {
            app: build_router(state),
            store,
            tokens: TokenService::new(TEST_SECRET),
        }
    }

    /// Sends a request and returns status plus JSON body (`Null` if empty)
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        self.send_request(request).await
    }

    pub async fn send_request(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        (status, body)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, token, Some(body)).await
    }

    /// Registers a user through the API and returns (user_id, token)
    pub async fn register(&self, first_name: &str, email: &str) -> (Uuid, String) {
        let (status, body) = self
            .post("/auth/register", None, registration(first_name, email, "password123"))
            .await;
        assert_eq!(status, StatusCode::CREATED, "registration failed: {}", body);

        let user_id = body["data"]["user"]["userId"]
            .as_str()
            .and_then(|s| Uuid::parse_str(s).ok())
            .unwrap();
        let token = body["data"]["accessToken"].as_str().unwrap().to_string();

        (user_id, token)
    }

    /// Creates an organisation through the API and returns its ID
    pub async fn create_org(&self, token: &str, name: &str) -> Uuid {
        let (status, body) = self
            .post("/api/organisations", Some(token), json!({ "name": name }))
            .await;
        assert_eq!(status, StatusCode::CREATED, "create failed: {}", body);

        Uuid::parse_str(body["data"]["orgId"].as_str().unwrap()).unwrap()
    }
}

pub fn registration(first_name: &str, email: &str, password: &str) -> Value {
    json!({
        "firstName": first_name,
        "lastName": "Tester",
        "email": email,
        "password": password,
    })
}

/// Store wrapper that counts every call
#[derive(Default)]
pub struct CountingStore {
    inner: MemoryCredentialStore,
    calls: AtomicUsize,
}

impl CountingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl CredentialStore for CountingStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        self.hit();
        self.inner.find_user_by_email(email).await
    }

    async fn find_user_by_id(&self, user_id: Uuid) -> Result<Option<User>, StoreError> {
        self.hit();
        self.inner.find_user_by_id(user_id).await
    }

    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError> {
        self.hit();
        self.inner.insert_user(user).await
    }

    async fn register_user(
        &self,
        user: NewUser,
        org: NewOrganisation,
    ) -> Result<(User, Organisation), StoreError> {
        self.hit();
        self.inner.register_user(user, org).await
    }

    async fn insert_organisation(
        &self,
        org: NewOrganisation,
    ) -> Result<Organisation, StoreError> {
        self.hit();
        self.inner.insert_organisation(org).await
    }

    async fn find_organisations_by_owner(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<Organisation>, StoreError> {
        self.hit();
        self.inner.find_organisations_by_owner(user_id).await
    }

    async fn find_organisation_by_id_for_user(
        &self,
        org_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Organisation>, StoreError> {
        self.hit();
        self.inner
            .find_organisation_by_id_for_user(org_id, user_id)
            .await
    }

    async fn add_membership(&self, user_id: Uuid, org_id: Uuid) -> Result<(), StoreError> {
        self.hit();
        self.inner.add_membership(user_id, org_id).await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.hit();
        self.inner.ping().await
    }
}

/// Store whose every operation fails, for the generic 400 path
pub struct FailingStore;

#[async_trait]
impl CredentialStore for FailingStore {
    async fn find_user_by_email(&self, _email: &str) -> Result<Option<User>, StoreError> {
        Err(StoreError::Database(sqlx::Error::PoolTimedOut))
    }

    async fn find_user_by_id(&self, _user_id: Uuid) -> Result<Option<User>, StoreError> {
        Err(StoreError::Database(sqlx::Error::PoolTimedOut))
    }

    async fn insert_user(&self, _user: NewUser) -> Result<User, StoreError> {
        Err(StoreError::Database(sqlx::Error::PoolTimedOut))
    }

    async fn register_user(
        &self,
        _user: NewUser,
        _org: NewOrganisation,
    ) -> Result<(User, Organisation), StoreError> {
        Err(StoreError::Database(sqlx::Error::PoolTimedOut))
    }

    async fn insert_organisation(
        &self,
        _org: NewOrganisation,
    ) -> Result<Organisation, StoreError> {
        Err(StoreError::Database(sqlx::Error::PoolTimedOut))
    }

    async fn find_organisations_by_owner(
        &self,
        _user_id: Uuid,
    ) -> Result<Vec<Organisation>, StoreError> {
        Err(StoreError::Database(sqlx::Error::PoolTimedOut))
    }

    async fn find_organisation_by_id_for_user(
        &self,
        _org_id: Uuid,
        _user_id: Uuid,
    ) -> Result<Option<Organisation>, StoreError> {
        Err(StoreError::Database(sqlx::Error::PoolTimedOut))
    }

    async fn add_membership(&self, _user_id: Uuid, _org_id: Uuid) -> Result<(), StoreError> {
        Err(StoreError::Database(sqlx::Error::PoolTimedOut))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Err(StoreError::Database(sqlx::Error::PoolTimedOut))
    }
}

/// Memory store whose first registration fails on the organisation row
///
/// The organisation is pointed at an owner that does not exist, so the inner
/// store rejects it after the user row has passed its checks.
#[derive(Default)]
pub struct OrganisationFailsOnceStore {
    pub inner: MemoryCredentialStore,
    failed: AtomicBool,
}

impl OrganisationFailsOnceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for OrganisationFailsOnceStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        self.inner.find_user_by_email(email).await
    }

    async fn find_user_by_id(&self, user_id: Uuid) -> Result<Option<User>, StoreError> {
        self.inner.find_user_by_id(user_id).await
    }

    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError> {
        self.inner.insert_user(user).await
    }

    async fn register_user(
        &self,
        user: NewUser,
        mut org: NewOrganisation,
    ) -> Result<(User, Organisation), StoreError> {
        if !self.failed.swap(true, Ordering::SeqCst) {
            org.owner_id = Uuid::new_v4();
        }
        self.inner.register_user(user, org).await
    }

    async fn insert_organisation(
        &self,
        org: NewOrganisation,
    ) -> Result<Organisation, StoreError> {
        self.inner.insert_organisation(org).await
    }

    async fn find_organisations_by_owner(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<Organisation>, StoreError> {
        self.inner.find_organisations_by_owner(user_id).await
    }

    async fn find_organisation_by_id_for_user(
        &self,
        org_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Organisation>, StoreError> {
        self.inner
            .find_organisation_by_id_for_user(org_id, user_id)
            .await
    }

    async fn add_membership(&self, user_id: Uuid, org_id: Uuid) -> Result<(), StoreError> {
        self.inner.add_membership(user_id, org_id).await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.inner.ping().await
    }
}
