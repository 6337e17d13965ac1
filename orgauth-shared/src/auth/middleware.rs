/// Authorization guard for bearer-token protected routes
///
/// The guard turns the value of the `Authorization` header into a verified
/// [`AuthContext`]. [`authenticate`] is a pure function of the header value,
/// the current time and the signing secret held by the [`TokenService`]; it
/// performs no I/O. The API crate wraps it in an Axum middleware that inserts
/// the context into request extensions before any handler runs.
///
/// # Outcomes
///
/// - header absent: `AuthError::MissingCredentials`, no verification attempted
/// - header present but not a valid bearer token: `AuthError::InvalidToken`
///
/// The reason a token was rejected (bad signature, expiry, garbage) is kept
/// for logging only and is never rendered to the caller.
///
/// # Example
///
/// ```
/// use orgauth_shared::auth::middleware::AuthContext;
///
/// async fn handler(auth: AuthContext) -> String {
///     format!("Hello, {}!", auth.email)
/// }
/// ```

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use super::jwt::{JwtError, TokenService, VerifiedIdentity};

/// Header scheme expected in front of the token
pub const BEARER_PREFIX: &str = "Bearer ";

/// Authenticated caller, attached to request extensions by the guard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated user ID
    pub user_id: Uuid,

    /// Email the token was issued with
    pub email: String,
}

impl From<VerifiedIdentity> for AuthContext {
    fn from(identity: VerifiedIdentity) -> Self {
        Self {
            user_id: identity.user_id,
            email: identity.email,
        }
    }
}

/// Error type for the authorization guard
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No `Authorization` header on the request
    #[error("Missing credentials")]
    MissingCredentials,

    /// Header present but does not carry a valid bearer token
    #[error("Invalid token: {0}")]
    InvalidToken(String),
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        AuthError::InvalidToken(err.to_string())
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        tracing::debug!(reason = %self, "Rejected unauthenticated request");

        // Every rejection looks the same from the outside
        let body = json!({
            "status": "Unauthorized",
            "message": "Authentication required",
            "statusCode": StatusCode::UNAUTHORIZED.as_u16(),
        });

        (StatusCode::UNAUTHORIZED, Json(body)).into_response()
    }
}

/// Verifies the `Authorization` header value and returns the caller
///
/// # Arguments
///
/// * `header` - Raw header value, `None` when the header is absent
/// * `tokens` - Token service holding the signing secret
/// * `now` - Clock used for the expiry check
///
/// # Example
///
/// ```
/// use chrono::Utc;
/// use orgauth_shared::auth::{jwt::TokenService, middleware::authenticate};
/// use uuid::Uuid;
///
/// let tokens = TokenService::new("your-secret-key-at-least-32-bytes");
/// let token = tokens.issue(Uuid::new_v4(), "user@example.com").unwrap();
/// let header = format!("Bearer {}", token);
///
/// let auth = authenticate(Some(&header), &tokens, Utc::now()).unwrap();
/// assert_eq!(auth.email, "user@example.com");
/// ```
pub fn authenticate(
    header: Option<&str>,
    tokens: &TokenService,
    now: DateTime<Utc>,
) -> Result<AuthContext, AuthError> {
    let header = header.ok_or(AuthError::MissingCredentials)?;

    let token = header
        .strip_prefix(BEARER_PREFIX)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AuthError::InvalidToken("Expected Bearer token".to_string()))?;

    let identity = tokens.verify_at(token, now)?;

    Ok(identity.into())
}

/// Lets handlers take `AuthContext` directly as an argument
///
/// Rejects with 401 when the guard did not run for this route.
#[async_trait]
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .ok_or(AuthError::MissingCredentials)
    }
}
