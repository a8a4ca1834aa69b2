//! Post CRUD request handlers.

use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::api::doc::POST_TAG;
use crate::api::dto::{
    ApiResponse, CreatePostRequest, ErrorResponse, PageQuery, PostResponse, UpdatePostRequest,
};
use crate::error::{AppError, AppResult};
use crate::state::AppState;
use crate::utils::validate::{EntityId, ValidatedJson, ValidatedQuery};

const ENTITY: &str = "Post";

/// Routes:
/// - GET /api/posts?pageNumber=&pageSize= - One page of posts
/// - POST /api/posts       - Create a post with its attachments
/// - GET /api/posts/{id}   - Get post by ID
/// - PUT /api/posts/{id}   - Replace post fields and attachments
/// - DELETE /api/posts/{id} - Delete post and attachments
pub fn post_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(list_posts, create_post))
        .routes(routes!(get_post, update_post, delete_post))
}

/// GET /api/posts - One page of posts, ordered by id
///
/// Page parameters are passed through as given.
#[utoipa::path(
    get,
    path = "/api/posts",
    tag = POST_TAG,
    params(PageQuery),
    responses(
        (status = 200, description = "Requested page of posts", body = Vec<PostResponse>),
        (status = 400, description = "Malformed page parameters", body = ErrorResponse)
    )
)]
async fn list_posts(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<PageQuery>,
) -> AppResult<Json<Vec<PostResponse>>> {
    Ok(Json(state.services.posts.get_all(query.into()).await?))
}

/// GET /api/posts/{id} - Get post by ID, with attachments
#[utoipa::path(
    get,
    path = "/api/posts/{id}",
    tag = POST_TAG,
    params(("id" = uuid::Uuid, Path, description = "Post id")),
    responses(
        (status = 200, description = "Post found", body = ApiResponse<PostResponse>),
        (status = 400, description = "Malformed id", body = ErrorResponse),
        (status = 404, description = "No post with this id", body = ErrorResponse)
    )
)]
async fn get_post(
    State(state): State<AppState>,
    EntityId(id): EntityId,
) -> AppResult<Json<ApiResponse<PostResponse>>> {
    let post = state
        .services
        .posts
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found(ENTITY, id))?;
    Ok(Json(ApiResponse::ok("Post retrieved successfully.", post)))
}

/// POST /api/posts - Create a post
#[utoipa::path(
    post,
    path = "/api/posts",
    tag = POST_TAG,
    request_body = CreatePostRequest,
    responses(
        (status = 201, description = "Post created", body = ApiResponse<PostResponse>,
            headers(("Location" = String, description = "URL of the new post"))),
        (status = 400, description = "Invalid payload", body = ErrorResponse)
    )
)]
async fn create_post(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreatePostRequest>,
) -> AppResult<impl IntoResponse> {
    let post = state.services.posts.create(payload).await?;
    let location = format!("/api/posts/{}", post.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(ApiResponse::created("Post created successfully.", post)),
    ))
}

/// PUT /api/posts/{id} - Replace a post
///
/// The attachment list in the body replaces the stored one entirely.
#[utoipa::path(
    put,
    path = "/api/posts/{id}",
    tag = POST_TAG,
    params(("id" = uuid::Uuid, Path, description = "Post id")),
    request_body = UpdatePostRequest,
    responses(
        (status = 200, description = "Post updated", body = ApiResponse<PostResponse>),
        (status = 400, description = "Invalid payload", body = ErrorResponse),
        (status = 404, description = "No post with this id", body = ErrorResponse)
    )
)]
async fn update_post(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    ValidatedJson(payload): ValidatedJson<UpdatePostRequest>,
) -> AppResult<Json<ApiResponse<PostResponse>>> {
    let post = state
        .services
        .posts
        .update(id, payload)
        .await?
        .ok_or_else(|| AppError::not_found(ENTITY, id))?;
    Ok(Json(ApiResponse::ok("Post updated successfully.", post)))
}

/// DELETE /api/posts/{id} - Delete a post and its attachments
#[utoipa::path(
    delete,
    path = "/api/posts/{id}",
    tag = POST_TAG,
    params(("id" = uuid::Uuid, Path, description = "Post id")),
    responses(
        (status = 204, description = "Post deleted"),
        (status = 404, description = "No post with this id", body = ErrorResponse)
    )
)]
async fn delete_post(State(state): State<AppState>, EntityId(id): EntityId) -> AppResult<StatusCode> {
    if state.services.posts.delete(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found(ENTITY, id))
    }
}
