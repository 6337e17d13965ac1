/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use orgauth_api::{app::{build_router, AppState}, config::Config};
/// use orgauth_shared::db::pool::{create_pool, DatabaseConfig};
/// use orgauth_shared::store::PgCredentialStore;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = create_pool(DatabaseConfig {
///     url: config.database.url.clone(),
///     ..Default::default()
/// })
/// .await?;
///
/// let state = AppState::new(Arc::new(PgCredentialStore::new(pool)), config);
/// let app = build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, error::ApiError, middleware::security::SecurityHeadersLayer};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{get, post},
    Router,
};
use chrono::Utc;
use orgauth_shared::{
    auth::{jwt::TokenService, middleware::authenticate, password::PasswordHasherConfig},
    store::CredentialStore,
};
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Built once in `main` and cloned into every handler. Nothing in it changes
/// after startup.
#[derive(Clone)]
pub struct AppState {
    /// Persistence for users, organisations and memberships
    pub store: Arc<dyn CredentialStore>,

    /// Token signing and verification with the process secret
    pub tokens: Arc<TokenService>,

    /// Argon2 cost used for new password hashes
    pub hasher: PasswordHasherConfig,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates application state, deriving the token service and hasher
    /// settings from `config`
    pub fn new(store: Arc<dyn CredentialStore>, config: Config) -> Self {
        Self {
            store,
            tokens: Arc::new(TokenService::new(&config.jwt.secret)),
            hasher: config.password,
            config: Arc::new(config),
        }
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET  /health                           # public
/// ├── /auth/                                 # public
/// │   ├── POST /register
/// │   └── POST /login
/// └── /api/                                  # bearer token required
///     ├── GET  /organisations
///     ├── POST /organisations
///     ├── GET  /organisations/:org_id
///     ├── POST /organisations/:org_id/users
///     └── GET  /users/:id
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Security headers
/// 2. CORS (tower-http CorsLayer)
/// 3. Logging (tower-http TraceLayer)
/// 4. Authentication (`/api` only), rejecting before any handler runs
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login));

    let api_routes = Router::new()
        .route(
            "/organisations",
            get(routes::organisations::list_organisations)
                .post(routes::organisations::create_organisation),
        )
        .route(
            "/organisations/:org_id",
            get(routes::organisations::get_organisation),
        )
        .route(
            "/organisations/:org_id/users",
            post(routes::organisations::add_user_to_organisation),
        )
        .route("/users/:id", get(routes::users::get_user))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    let cors = cors_layer(&state.config.api.cors_origins);

    Router::new()
        .merge(health_routes)
        .nest("/auth", auth_routes)
        .nest("/api", api_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .max_age(std::time::Duration::from_secs(3600))
}

/// Bearer token guard
///
/// Verifies the `Authorization` header and injects the caller's
/// `AuthContext` into request extensions. Missing and invalid credentials get
/// the same 401 response.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    // A non-ASCII header counts as present but invalid
    let header = req
        .headers()
        .get(header::AUTHORIZATION)
        .map(|v| v.to_str().unwrap_or_default());

    let auth = authenticate(header, &state.tokens, Utc::now())?;

    req.extensions_mut().insert(auth);

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiConfig, DatabaseConfig, JwtConfig};
    use axum::{body::Body, http::StatusCode};
    use orgauth_shared::store::MemoryCredentialStore;
    use tower::ServiceExt;

    fn test_state(cors_origins: Vec<String>) -> AppState {
        let config = Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors_origins,
                production: false,
            },
            database: DatabaseConfig {
                url: String::new(),
                max_connections: 1,
            },
            jwt: JwtConfig {
                secret: "app-test-secret-at-least-32-bytes-long".to_string(),
            },
            password: PasswordHasherConfig::default(),
            log_json: false,
        };

        AppState::new(Arc::new(MemoryCredentialStore::new()), config)
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let app = build_router(test_state(vec!["*".to_string()]));

        let response = app
            .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_api_routes_require_auth() {
        let app = build_router(test_state(vec!["*".to_string()]));

        for uri in ["/api/organisations", "/api/users/123"] {
            let response = app
                .clone()
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", uri);
        }
    }

    #[tokio::test]
    async fn test_restricted_cors_origin() {
        let app = build_router(test_state(vec!["https://app.example".to_string()]));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .header(header::ORIGIN, "https://app.example")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "https://app.example"
        );
    }
}
