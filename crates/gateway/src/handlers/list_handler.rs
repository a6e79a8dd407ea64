//! Per-user list handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};

use common::AppResult;
use domain::{CreateList, UserList};

use crate::extractors::ValidatedJson;
use crate::state::AppState;

/// List routes, nested under `/api/v1/users` next to the user routes
pub fn list_routes() -> Router<AppState> {
    Router::new()
        .route("/:id/lists", get(lists_for_user).post(create_list))
        .route("/:id/lists/:name", get(get_list))
}

/// Create a list for a user
#[utoipa::path(
    post,
    path = "/api/v1/users/{id}/lists",
    tag = "Lists",
    params(("id" = String, Path, description = "Owner ID or username")),
    request_body = CreateList,
    responses(
        (status = 201, description = "List created", body = UserList),
        (status = 400, description = "Validation failed or list already exists"),
        (status = 404, description = "Owner not found")
    )
)]
pub async fn create_list(
    State(state): State<AppState>,
    Path(owner): Path<String>,
    ValidatedJson(input): ValidatedJson<CreateList>,
) -> AppResult<(StatusCode, Json<UserList>)> {
    let list = state.users.create_list(&owner, input).await?;
    Ok((StatusCode::CREATED, Json(list)))
}

/// All lists owned by a user
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}/lists",
    tag = "Lists",
    params(("id" = String, Path, description = "Owner ID or username")),
    responses(
        (status = 200, description = "Lists ordered by name", body = Vec<UserList>),
        (status = 404, description = "Owner not found")
    )
)]
pub async fn lists_for_user(
    State(state): State<AppState>,
    Path(owner): Path<String>,
) -> AppResult<Json<Vec<UserList>>> {
    Ok(Json(state.users.lists_for_user(&owner).await?))
}

/// Get one list by name
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}/lists/{name}",
    tag = "Lists",
    params(
        ("id" = String, Path, description = "Owner ID or username"),
        ("name" = String, Path, description = "List name")
    ),
    responses(
        (status = 200, description = "List found", body = UserList),
        (status = 404, description = "List not found")
    )
)]
pub async fn get_list(
    State(state): State<AppState>,
    Path((owner, name)): Path<(String, String)>,
) -> AppResult<Json<UserList>> {
    Ok(Json(state.users.get_list(&owner, &name).await?))
}
