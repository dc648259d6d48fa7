use std::collections::BTreeMap;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde_json::json;

use crate::state::AppState;
use crate::utils::errors::{AppError, parse_id};
use crate::utils::query::{QuerySpec, ResultPage};
use crate::utils::response::DataResponse;
use crate::validator::ValidatedJson;

use super::model::{CreateUserRequest, UpdateUserRequest, User};
use super::service::UserService;

/// List users with filtering, sorting, field selection and pagination.
#[utoipa::path(
    get,
    path = "/api/v1/users",
    responses(
        (status = 200, description = "Paginated list of users"),
        (status = 400, description = "Invalid query parameters"),
        (status = 401, description = "Not authorized or not an admin")
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
pub async fn get_users(
    State(state): State<AppState>,
    Query(params): Query<BTreeMap<String, String>>,
) -> Result<Json<ResultPage>, AppError> {
    let spec = QuerySpec::from_params(&params)?;
    let page = UserService::list(&state.db, &spec).await?;
    Ok(Json(page))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    params(("id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "Single user", body = User),
        (status = 401, description = "Not authorized or not an admin"),
        (status = 404, description = "User not found")
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DataResponse<User>>, AppError> {
    let user_id = parse_id("User", &id)?;
    let user = UserService::get(&state.db, user_id).await?;
    Ok(Json(DataResponse::new(user)))
}

#[utoipa::path(
    post,
    path = "/api/v1/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 400, description = "Validation error or duplicate email"),
        (status = 401, description = "Not authorized or not an admin")
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
pub async fn create_user(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<DataResponse<User>>), AppError> {
    let user = UserService::create(&state.db, dto).await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(user))))
}

#[utoipa::path(
    put,
    path = "/api/v1/users/{id}",
    params(("id" = String, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = User),
        (status = 401, description = "Not authorized or not an admin"),
        (status = 404, description = "User not found")
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(dto): ValidatedJson<UpdateUserRequest>,
) -> Result<Json<DataResponse<User>>, AppError> {
    let user_id = parse_id("User", &id)?;
    let user = UserService::update(&state.db, user_id, dto).await?;
    Ok(Json(DataResponse::new(user)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}",
    params(("id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "User deleted"),
        (status = 401, description = "Not authorized or not an admin"),
        (status = 404, description = "User not found")
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DataResponse<serde_json::Value>>, AppError> {
    let user_id = parse_id("User", &id)?;
    UserService::delete(&state.db, user_id).await?;
    Ok(Json(DataResponse::new(json!({}))))
}
