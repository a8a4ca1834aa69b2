//! User CRUD request handlers.

use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::api::doc::USER_TAG;
use crate::api::dto::{ApiResponse, CreateUserRequest, ErrorResponse, UpdateUserRequest, UserResponse};
use crate::error::{AppError, AppResult};
use crate::state::AppState;
use crate::utils::validate::{EntityId, ValidatedJson};

const ENTITY: &str = "User";

/// Routes:
/// - GET /api/users        - List all users
/// - POST /api/users       - Create a user
/// - GET /api/users/{id}   - Get user by ID
/// - PUT /api/users/{id}   - Replace user by ID
/// - DELETE /api/users/{id} - Delete user by ID
pub fn user_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(list_users, create_user))
        .routes(routes!(get_user, update_user, delete_user))
}

/// GET /api/users - List all users, ordered by id
#[utoipa::path(
    get,
    path = "/api/users",
    tag = USER_TAG,
    responses(
        (status = 200, description = "All users", body = Vec<UserResponse>),
        (status = 500, description = "Unexpected error", body = ErrorResponse)
    )
)]
async fn list_users(State(state): State<AppState>) -> AppResult<Json<Vec<UserResponse>>> {
    Ok(Json(state.services.users.get_all().await?))
}

/// GET /api/users/{id} - Get user by ID
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    tag = USER_TAG,
    params(("id" = uuid::Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "User found", body = ApiResponse<UserResponse>),
        (status = 400, description = "Malformed id", body = ErrorResponse),
        (status = 404, description = "No user with this id", body = ErrorResponse)
    )
)]
async fn get_user(
    State(state): State<AppState>,
    EntityId(id): EntityId,
) -> AppResult<Json<ApiResponse<UserResponse>>> {
    let user = state
        .services
        .users
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found(ENTITY, id))?;
    Ok(Json(ApiResponse::ok("User retrieved successfully.", user)))
}

/// POST /api/users - Create a user
///
/// Answers 201 with a `Location` header pointing at the new user.
#[utoipa::path(
    post,
    path = "/api/users",
    tag = USER_TAG,
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = ApiResponse<UserResponse>,
            headers(("Location" = String, description = "URL of the new user"))),
        (status = 400, description = "Invalid payload", body = ErrorResponse)
    )
)]
async fn create_user(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreateUserRequest>,
) -> AppResult<impl IntoResponse> {
    let user = state.services.users.create(payload).await?;
    let location = format!("/api/users/{}", user.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(ApiResponse::created("User created successfully.", user)),
    ))
}

/// PUT /api/users/{id} - Replace a user's fields
#[utoipa::path(
    put,
    path = "/api/users/{id}",
    tag = USER_TAG,
    params(("id" = uuid::Uuid, Path, description = "User id")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = ApiResponse<UserResponse>),
        (status = 400, description = "Invalid payload", body = ErrorResponse),
        (status = 404, description = "No user with this id", body = ErrorResponse)
    )
)]
async fn update_user(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    ValidatedJson(payload): ValidatedJson<UpdateUserRequest>,
) -> AppResult<Json<ApiResponse<UserResponse>>> {
    let user = state
        .services
        .users
        .update(id, payload)
        .await?
        .ok_or_else(|| AppError::not_found(ENTITY, id))?;
    Ok(Json(ApiResponse::ok("User updated successfully.", user)))
}

/// DELETE /api/users/{id} - Delete a user
///
/// The user's posts are kept.
#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    tag = USER_TAG,
    params(("id" = uuid::Uuid, Path, description = "User id")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 404, description = "No user with this id", body = ErrorResponse)
    )
)]
async fn delete_user(State(state): State<AppState>, EntityId(id): EntityId) -> AppResult<StatusCode> {
    if state.services.users.delete(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found(ENTITY, id))
    }
}
