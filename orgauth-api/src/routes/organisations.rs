/// Organisation endpoints (bearer token required)
///
/// - `GET  /api/organisations` - Organisations the caller owns
/// - `GET  /api/organisations/:org_id` - One organisation the caller owns or belongs to
/// - `POST /api/organisations` - Create an organisation owned by the caller
/// - `POST /api/organisations/:org_id/users` - Add a user to an organisation
///
/// A caller without access to an organisation gets the same 403 whether or
/// not it exists.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, OperationContext, ValidationErrorDetail},
    extract::ValidatedJson,
    routes::ApiResponse,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use orgauth_shared::{
    auth::middleware::AuthContext,
    models::organisation::{NewOrganisation, Organisation, OrganisationView},
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

/// Create organisation request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrganisationRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 100, message = "Name is required and must be at most 100 characters"))]
    pub name: String,

    pub description: Option<String>,
}

/// Add user request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddUserRequest {
    /// Kept as a string so a bad value is a validation error, not a body error
    #[serde(default)]
    pub user_id: Option<String>,
}

impl AddUserRequest {
    fn parse_user_id(&self) -> ApiResult<Uuid> {
        let raw = self
            .user_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                ApiError::ValidationError(vec![ValidationErrorDetail::new(
                    "userId",
                    "User ID is required",
                )])
            })?;

        Uuid::parse_str(raw).map_err(|_| {
            ApiError::ValidationError(vec![ValidationErrorDetail::new(
                "userId",
                "User ID must be a valid UUID",
            )])
        })
    }
}

/// Organisation list payload
#[derive(Debug, Serialize, Deserialize)]
pub struct OrganisationList {
    pub organisations: Vec<OrganisationView>,
}

/// Resolves an organisation the caller may access, or `Forbidden`
async fn accessible_organisation(
    state: &AppState,
    auth: &AuthContext,
    raw_org_id: &str,
    failure: &'static str,
) -> ApiResult<Organisation> {
    let org_id = Uuid::parse_str(raw_org_id).map_err(|_| ApiError::Forbidden)?;

    state
        .store
        .find_organisation_by_id_for_user(org_id, auth.user_id)
        .await
        .or_fail_with(failure)?
        .ok_or(ApiError::Forbidden)
}

/// Lists organisations owned by the caller
pub async fn list_organisations(
    State(state): State<AppState>,
    auth: AuthContext,
) -> ApiResult<Json<ApiResponse<OrganisationList>>> {
    let organisations = state
        .store
        .find_organisations_by_owner(auth.user_id)
        .await
        .or_fail_with("Could not fetch organisations")?
        .iter()
        .map(Organisation::view)
        .collect();

    Ok(Json(ApiResponse::success(
        "Organisations fetched successfully",
        OrganisationList { organisations },
    )))
}

/// Fetches one organisation
///
/// # Errors
///
/// - `403`: Malformed ID, unknown organisation, or caller has no access
pub async fn get_organisation(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(org_id): Path<String>,
) -> ApiResult<Json<ApiResponse<OrganisationView>>> {
    let org = accessible_organisation(&state, &auth, &org_id, "Could not fetch organisation").await?;

    Ok(Json(ApiResponse::success(
        "Organisation fetched successfully",
        org.view(),
    )))
}

/// Creates an organisation owned by the caller
pub async fn create_organisation(
    State(state): State<AppState>,
    auth: AuthContext,
    ValidatedJson(req): ValidatedJson<CreateOrganisationRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<OrganisationView>>)> {
    let org = state
        .store
        .insert_organisation(NewOrganisation::new(req.name, req.description, auth.user_id))
        .await
        .or_fail_with("Could not create organisation")?;

    info!(org_id = %org.org_id, owner_id = %auth.user_id, "Organisation created");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            "Organisation created successfully",
            org.view(),
        )),
    ))
}

/// Adds a user to an organisation the caller can access
///
/// # Errors
///
/// - `403`: Caller has no access to the organisation
/// - `422`: `userId` missing or not a UUID
/// - `404`: Target user does not exist
pub async fn add_user_to_organisation(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(org_id): Path<String>,
    ValidatedJson(req): ValidatedJson<AddUserRequest>,
) -> ApiResult<Json<ApiResponse<()>>> {
    const FAILURE: &str = "Could not add user to organisation";

    let org = accessible_organisation(&state, &auth, &org_id, FAILURE).await?;
    let user_id = req.parse_user_id()?;

    state
        .store
        .find_user_by_id(user_id)
        .await
        .or_fail_with(FAILURE)?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    state
        .store
        .add_membership(user_id, org.org_id)
        .await
        .or_fail_with(FAILURE)?;

    info!(org_id = %org.org_id, user_id = %user_id, added_by = %auth.user_id, "User added to organisation");

    Ok(Json(ApiResponse::message(
        "User added to organisation successfully",
    )))
}
