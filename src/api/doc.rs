use utoipa::OpenApi;

pub const USER_TAG: &str = "Users";
pub const POST_TAG: &str = "Posts";
pub const HEALTH_TAG: &str = "Health";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "pghub",
        description = "REST backend for users and their posts",
    ),
    components(
        schemas(
            crate::api::dto::ErrorResponse,
            crate::error::ValidationFieldError,
        )
    ),
    tags(
        (name = USER_TAG, description = "User management endpoints"),
        (name = POST_TAG, description = "Post and attachment endpoints"),
        (name = HEALTH_TAG, description = "Health check endpoints"),
    )
)]
pub struct ApiDoc;
