//! OpenAPI documentation.

use utoipa::OpenApi;

use crate::handlers::health_handler::HealthResponse;
use domain::{CreateList, CreateUser, FieldError, UpdateUser, UserList, UserResponse};

/// API documentation struct.
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::user_handler::create_user,
        crate::handlers::user_handler::list_users,
        crate::handlers::user_handler::get_user,
        crate::handlers::user_handler::update_user,
        crate::handlers::user_handler::delete_user,
        crate::handlers::list_handler::create_list,
        crate::handlers::list_handler::lists_for_user,
        crate::handlers::list_handler::get_list,
        crate::handlers::health_handler::health_check,
    ),
    components(
        schemas(
            CreateUser,
            UpdateUser,
            UserResponse,
            CreateList,
            UserList,
            FieldError,
            HealthResponse,
        )
    ),
    tags(
        (name = "Users", description = "User management endpoints"),
        (name = "Lists", description = "Lists owned by a user"),
        (name = "Health", description = "Service health"),
    )
)]
pub struct ApiDoc;
