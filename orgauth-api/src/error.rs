/// Error handling for the API server
///
/// `ApiError` is the only error type turned into an HTTP response. Handlers
/// return `ApiResult<T>`; shared-library errors convert with `?`.
///
/// | Variant | Status | Body |
/// |---|---|---|
/// | `ValidationError` | 422 | `{"errors":[{"field","message"}]}` |
/// | `Conflict` | 422 | `{"errors":[{"field","message"}]}` |
/// | `Unauthenticated` | 401 | `{"status":"Unauthorized","message","statusCode":401}` |
/// | `Forbidden` | 403 | `{"status":"Forbidden","message","statusCode":403}` |
/// | `NotFound` | 404 | `{"status":"Not found","message","statusCode":404}` |
/// | `Internal` | 400 | `{"status":"Bad request","message","statusCode":400}` |
///
/// # Example
///
/// ```
/// use orgauth_api::error::{ApiError, ApiResult};
/// use axum::Json;
/// use serde_json::{json, Value};
///
/// async fn handler(found: bool) -> ApiResult<Json<Value>> {
///     if !found {
///         return Err(ApiError::NotFound("User not found".to_string()));
///     }
///     Ok(Json(json!({ "status": "success" })))
/// }
/// ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use orgauth_shared::{
    auth::{jwt::JwtError, middleware::AuthError, password::PasswordError},
    store::StoreError,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Message of every 403 response
pub const FORBIDDEN_MESSAGE: &str = "You do not have access to this organisation";

/// Message of a 401 from the request guard
pub const AUTH_REQUIRED_MESSAGE: &str = "Authentication required";

/// Message of a 401 from login
pub const AUTH_FAILED_MESSAGE: &str = "Authentication failed";

/// Fallback message when no operation-specific one was attached
const DEFAULT_INTERNAL_MESSAGE: &str = "Request could not be completed";

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Request shape is invalid (422)
    ValidationError(Vec<ValidationErrorDetail>),

    /// A unique value is already taken (422)
    Conflict { field: String, message: String },

    /// Missing or failed credentials (401)
    Unauthenticated(String),

    /// Caller may not see this organisation (403)
    Forbidden,

    /// Resource does not exist (404)
    NotFound(String),

    /// Unexpected failure (400)
    ///
    /// `message` is what the caller sees; `context` is only logged.
    Internal { message: &'static str, context: String },
}

/// Validation error detail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

impl ValidationErrorDetail {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl ApiError {
    /// Duplicate email at registration
    pub fn email_in_use() -> Self {
        ApiError::Conflict {
            field: "email".to_string(),
            message: "Email already in use".to_string(),
        }
    }

    /// Unexpected failure with the message the caller will see
    pub fn internal(message: &'static str, context: impl fmt::Display) -> Self {
        ApiError::Internal {
            message,
            context: context.to_string(),
        }
    }

    /// Replaces the caller-facing message of an `Internal` error
    pub fn with_message(self, message: &'static str) -> Self {
        match self {
            ApiError::Internal { context, .. } => ApiError::Internal { message, context },
            other => other,
        }
    }

    /// HTTP status for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::ValidationError(_) | ApiError::Conflict { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal { .. } => StatusCode::BAD_REQUEST,
        }
    }
}

/// Attaches an operation-specific message to failures
///
/// ```
/// use orgauth_api::error::{ApiError, ApiResult, OperationContext};
///
/// fn load() -> Result<u32, ApiError> {
///     Err(ApiError::internal("ignored", "connection reset"))
/// }
///
/// let err = load().or_fail_with("Could not fetch organisations").unwrap_err();
/// assert!(err.to_string().contains("Could not fetch organisations"));
/// ```
pub trait OperationContext<T> {
    fn or_fail_with(self, message: &'static str) -> ApiResult<T>;
}

impl<T, E> OperationContext<T> for Result<T, E>
where
    E: Into<ApiError>,
{
    fn or_fail_with(self, message: &'static str) -> ApiResult<T> {
        self.map_err(|e| e.into().with_message(message))
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::Conflict { field, message } => write!(f, "Conflict on {}: {}", field, message),
            ApiError::Unauthenticated(msg) => write!(f, "Unauthenticated: {}", msg),
            ApiError::Forbidden => write!(f, "Forbidden: {}", FORBIDDEN_MESSAGE),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Internal { message, context } => write!(f, "{}: {}", message, context),
        }
    }
}

impl std::error::Error for ApiError {}

fn status_body(status: StatusCode, label: &str, message: &str) -> Response {
    let body = json!({
        "status": label,
        "message": message,
        "statusCode": status.as_u16(),
    });

    (status, Json(body)).into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match self {
            ApiError::ValidationError(errors) => {
                (status, Json(json!({ "errors": errors }))).into_response()
            }
            ApiError::Conflict { field, message } => {
                let errors = vec![ValidationErrorDetail { field, message }];
                (status, Json(json!({ "errors": errors }))).into_response()
            }
            ApiError::Unauthenticated(msg) => status_body(status, "Unauthorized", &msg),
            ApiError::Forbidden => status_body(status, "Forbidden", FORBIDDEN_MESSAGE),
            ApiError::NotFound(msg) => status_body(status, "Not found", &msg),
            ApiError::Internal { message, context } => {
                // Details stay in the logs
                tracing::error!(error = %context, "{}", message);
                status_body(status, "Bad request", message)
            }
        }
    }
}

/// Convert store errors to API errors
impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(constraint) if constraint.contains("email") => {
                ApiError::email_in_use()
            }
            other => ApiError::internal(DEFAULT_INTERNAL_MESSAGE, other),
        }
    }
}

/// Convert guard rejections to API errors
impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        tracing::debug!(reason = %err, "Rejected unauthenticated request");
        ApiError::Unauthenticated(AUTH_REQUIRED_MESSAGE.to_string())
    }
}

/// Convert password errors to API errors
impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::internal(DEFAULT_INTERNAL_MESSAGE, format!("Password operation failed: {}", err))
    }
}

/// Convert token errors to API errors
///
/// Reached only when signing fails; verification failures go through the
/// guard.
impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        ApiError::internal(DEFAULT_INTERNAL_MESSAGE, format!("Token operation failed: {}", err))
    }
}

/// A panicked or cancelled blocking task
impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        ApiError::internal(DEFAULT_INTERNAL_MESSAGE, format!("Blocking task failed: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    async fn render(err: ApiError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[test]
    fn test_error_display() {
        let err = ApiError::NotFound("User not found".to_string());
        assert_eq!(err.to_string(), "Not found: User not found");

        let errors = vec![
            ValidationErrorDetail::new("email", "Invalid email format"),
            ValidationErrorDetail::new("password", "Password is required"),
        ];
        assert_eq!(
            ApiError::ValidationError(errors).to_string(),
            "Validation failed: 2 errors"
        );
    }

    #[tokio::test]
    async fn test_validation_body() {
        let (status, body) = render(ApiError::ValidationError(vec![ValidationErrorDetail::new(
            "firstName",
            "First name is required",
        )]))
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            body,
            json!({ "errors": [{ "field": "firstName", "message": "First name is required" }] })
        );
    }

    #[tokio::test]
    async fn test_conflict_body() {
        let (status, body) = render(StoreError::Conflict("users_email_key".to_string()).into()).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            body,
            json!({ "errors": [{ "field": "email", "message": "Email already in use" }] })
        );
    }

    #[tokio::test]
    async fn test_status_bodies() {
        let (status, body) = render(ApiError::Forbidden).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(
            body,
            json!({ "status": "Forbidden", "message": FORBIDDEN_MESSAGE, "statusCode": 403 })
        );

        let (status, body) = render(ApiError::NotFound("User not found".to_string())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["status"], "Not found");
        assert_eq!(body["statusCode"], 404);

        let (status, body) = render(AuthError::MissingCredentials.into()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(
            body,
            json!({ "status": "Unauthorized", "message": AUTH_REQUIRED_MESSAGE, "statusCode": 401 })
        );
    }

    #[tokio::test]
    async fn test_internal_hides_context() {
        let err: ApiError = StoreError::Database(sqlx::Error::PoolTimedOut).into();
        let (status, body) = render(err.with_message("Could not fetch user")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            json!({ "status": "Bad request", "message": "Could not fetch user", "statusCode": 400 })
        );
    }

    #[test]
    fn test_with_message_keeps_other_variants() {
        let err = ApiError::email_in_use().with_message("Registration unsuccessful");
        assert!(matches!(err, ApiError::Conflict { .. }));
    }
}
