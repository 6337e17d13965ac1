/// Authentication endpoints
///
/// - `POST /auth/register` - Register a user and their default organisation
/// - `POST /auth/login` - Exchange email and password for a token
///
/// Both return the same envelope:
///
/// ```json
/// {
///   "status": "success",
///   "message": "Registration successful",
///   "data": {
///     "accessToken": "eyJ...",
///     "user": {
///       "userId": "uuid",
///       "firstName": "John",
///       "lastName": "Doe",
///       "email": "john@example.com",
///       "phone": null
///     }
///   }
/// }
/// ```

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, OperationContext, AUTH_FAILED_MESSAGE},
    extract::ValidatedJson,
    routes::ApiResponse,
};
use axum::{extract::State, http::StatusCode, Json};
use orgauth_shared::{
    auth::password::verify_password,
    models::{
        organisation::NewOrganisation,
        user::{NewUser, UserProfile},
    },
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

const REGISTRATION_FAILED: &str = "Registration unsuccessful";

/// Register request
///
/// Missing required fields deserialize as empty strings so they are reported
/// per field by validation.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 100, message = "First name is required"))]
    pub first_name: String,

    #[serde(default)]
    #[validate(length(min = 1, max = 100, message = "Last name is required"))]
    pub last_name: String,

    #[serde(default)]
    #[validate(
        email(message = "Email must be a valid email"),
        length(max = 255, message = "Email must be at most 255 characters")
    )]
    pub email: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,

    #[validate(length(max = 20, message = "Phone must be at most 20 characters"))]
    pub phone: Option<String>,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[serde(default)]
    #[validate(email(message = "Email must be a valid email"))]
    pub email: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Token plus the authenticated user
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthData {
    pub access_token: String,
    pub user: UserProfile,
}

/// Register a new user
///
/// Creates the user and an organisation named `"<firstName>'s Organisation"`
/// owned by them in one store operation, and returns a token.
///
/// # Errors
///
/// - `422`: Validation failed, or the email is already registered
/// - `400`: Unexpected failure
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<AuthData>>)> {
    // Fast path only; the store's unique constraint decides
    let existing = state
        .store
        .find_user_by_email(&req.email)
        .await
        .or_fail_with(REGISTRATION_FAILED)?;
    if existing.is_some() {
        return Err(ApiError::email_in_use());
    }

    let hasher = state.hasher;
    let password = req.password;
    let password_hash = tokio::task::spawn_blocking(move || hasher.hash(&password))
        .await
        .or_fail_with(REGISTRATION_FAILED)?
        .or_fail_with(REGISTRATION_FAILED)?;

    let user_id = Uuid::new_v4();
    let default_org = NewOrganisation::default_for(&req.first_name, user_id);

    let (user, org) = state
        .store
        .register_user(
            NewUser {
                user_id,
                first_name: req.first_name,
                last_name: req.last_name,
                email: req.email,
                password_hash,
                phone: req.phone,
            },
            default_org,
        )
        .await
        .or_fail_with(REGISTRATION_FAILED)?;

    let access_token = state
        .tokens
        .issue(user.user_id, &user.email)
        .or_fail_with(REGISTRATION_FAILED)?;

    info!(user_id = %user.user_id, org_id = %org.org_id, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            "Registration successful",
            AuthData {
                access_token,
                user: user.profile(),
            },
        )),
    ))
}

/// Login
///
/// Unknown email and wrong password produce the identical 401.
///
/// # Errors
///
/// - `422`: Validation failed
/// - `401`: Authentication failed
/// - `400`: Unexpected failure
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> ApiResult<Json<ApiResponse<AuthData>>> {
    let failed = || ApiError::Unauthenticated(AUTH_FAILED_MESSAGE.to_string());

    let user = state
        .store
        .find_user_by_email(&req.email)
        .await
        .or_fail_with(AUTH_FAILED_MESSAGE)?;

    // An unknown email still pays for one verification
    let hash = match &user {
        Some(user) => user.password_hash.clone(),
        None => state.hasher.dummy_hash(),
    };
    let password = req.password;
    let valid = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .or_fail_with(AUTH_FAILED_MESSAGE)?;

    let user = match user {
        Some(user) if valid => user,
        Some(user) => {
            info!(user_id = %user.user_id, "Login rejected");
            return Err(failed());
        }
        None => return Err(failed()),
    };

    let access_token = state
        .tokens
        .issue(user.user_id, &user.email)
        .or_fail_with(AUTH_FAILED_MESSAGE)?;

    info!(user_id = %user.user_id, "User logged in");

    Ok(Json(ApiResponse::success(
        "Login successful",
        AuthData {
            access_token,
            user: user.profile(),
        },
    )))
}
