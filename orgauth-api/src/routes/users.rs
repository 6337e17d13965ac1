/// User lookup endpoint (bearer token required)
///
/// ```text
/// GET /api/users/:id
/// ```
///
/// Any authenticated caller may look up any user's public profile. The
/// password hash is never part of the response.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, OperationContext},
    routes::ApiResponse,
};
use axum::{
    extract::{Path, State},
    Json,
};
use orgauth_shared::{auth::middleware::AuthContext, models::user::UserProfile};
use uuid::Uuid;

/// Fetches a user's public profile
///
/// # Errors
///
/// - `404`: Malformed ID or unknown user
pub async fn get_user(
    State(state): State<AppState>,
    _auth: AuthContext,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<UserProfile>>> {
    let not_found = || ApiError::NotFound("User not found".to_string());

    let user_id = Uuid::parse_str(&id).map_err(|_| not_found())?;

    let user = state
        .store
        .find_user_by_id(user_id)
        .await
        .or_fail_with("Could not fetch user")?
        .ok_or_else(not_found)?;

    Ok(Json(ApiResponse::success(
        "User fetched successfully",
        user.profile(),
    )))
}
