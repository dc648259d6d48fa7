use std::collections::BTreeMap;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde_json::json;

use crate::middleware::auth::AuthUser;
use crate::state::AppState;
use crate::utils::errors::{AppError, parse_id};
use crate::utils::query::{QuerySpec, ResultPage};
use crate::utils::response::DataResponse;
use crate::validator::ValidatedJson;

use super::model::{Course, CreateCourseRequest, UpdateCourseRequest};
use super::service::CourseService;

/// List all courses with filtering, sorting, field selection and
/// pagination.
#[utoipa::path(
    get,
    path = "/api/v1/courses",
    responses(
        (status = 200, description = "Paginated list of courses"),
        (status = 400, description = "Invalid query parameters")
    ),
    tag = "Courses"
)]
pub async fn get_courses(
    State(state): State<AppState>,
    Query(params): Query<BTreeMap<String, String>>,
) -> Result<Json<ResultPage>, AppError> {
    let spec = QuerySpec::from_params(&params)?;
    let page = CourseService::list(&state.db, &spec, None).await?;
    Ok(Json(page))
}

/// List the courses of one bootcamp.
#[utoipa::path(
    get,
    path = "/api/v1/bootcamps/{id}/courses",
    params(("id" = String, Path, description = "Bootcamp ID")),
    responses(
        (status = 200, description = "Paginated list of the bootcamp's courses"),
        (status = 400, description = "Invalid query parameters"),
        (status = 404, description = "Bootcamp not found")
    ),
    tag = "Courses"
)]
pub async fn get_bootcamp_courses(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<BTreeMap<String, String>>,
) -> Result<Json<ResultPage>, AppError> {
    let bootcamp_id = parse_id("Bootcamp", &id)?;
    let spec = QuerySpec::from_params(&params)?;
    let page = CourseService::list(&state.db, &spec, Some(bootcamp_id)).await?;
    Ok(Json(page))
}

#[utoipa::path(
    get,
    path = "/api/v1/courses/{id}",
    params(("id" = String, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Single course with its bootcamp summary"),
        (status = 404, description = "Course not found")
    ),
    tag = "Courses"
)]
pub async fn get_course(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DataResponse<serde_json::Value>>, AppError> {
    let course_id = parse_id("Course", &id)?;
    let course = CourseService::get(&state.db, course_id).await?;
    Ok(Json(DataResponse::new(course)))
}

/// Add a course to a bootcamp.
#[utoipa::path(
    post,
    path = "/api/v1/bootcamps/{id}/courses",
    params(("id" = String, Path, description = "Bootcamp ID")),
    request_body = CreateCourseRequest,
    responses(
        (status = 201, description = "Course created", body = Course),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Not the bootcamp owner"),
        (status = 404, description = "Bootcamp not found")
    ),
    tag = "Courses",
    security(("bearer_auth" = []))
)]
pub async fn create_course(
    State(state): State<AppState>,
    Path(id): Path<String>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<CreateCourseRequest>,
) -> Result<(StatusCode, Json<DataResponse<Course>>), AppError> {
    let bootcamp_id = parse_id("Bootcamp", &id)?;
    let course = CourseService::create(&state.db, bootcamp_id, &auth_user, dto).await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(course))))
}

#[utoipa::path(
    put,
    path = "/api/v1/courses/{id}",
    params(("id" = String, Path, description = "Course ID")),
    request_body = UpdateCourseRequest,
    responses(
        (status = 200, description = "Course updated", body = Course),
        (status = 401, description = "Not the course owner"),
        (status = 404, description = "Course not found")
    ),
    tag = "Courses",
    security(("bearer_auth" = []))
)]
pub async fn update_course(
    State(state): State<AppState>,
    Path(id): Path<String>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<UpdateCourseRequest>,
) -> Result<Json<DataResponse<Course>>, AppError> {
    let course_id = parse_id("Course", &id)?;
    let course = CourseService::update(&state.db, course_id, &auth_user, dto).await?;
    Ok(Json(DataResponse::new(course)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/courses/{id}",
    params(("id" = String, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Course deleted"),
        (status = 401, description = "Not the course owner"),
        (status = 404, description = "Course not found")
    ),
    tag = "Courses",
    security(("bearer_auth" = []))
)]
pub async fn delete_course(
    State(state): State<AppState>,
    Path(id): Path<String>,
    auth_user: AuthUser,
) -> Result<Json<DataResponse<serde_json::Value>>, AppError> {
    let course_id = parse_id("Course", &id)?;
    CourseService::delete(&state.db, course_id, &auth_user).await?;
    Ok(Json(DataResponse::new(json!({}))))
}
