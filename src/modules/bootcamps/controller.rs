use std::collections::BTreeMap;

use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
};
use serde_json::json;

use crate::middleware::auth::AuthUser;
use crate::state::AppState;
use crate::utils::errors::{AppError, parse_id};
use crate::utils::geocode::Geocoder;
use crate::utils::query::{QuerySpec, ResultPage};
use crate::utils::response::DataResponse;
use crate::validator::ValidatedJson;

use super::model::{Bootcamp, CreateBootcampRequest, UpdateBootcampRequest};
use super::service::BootcampService;

/// List bootcamps with filtering, sorting, field selection and
/// pagination. Each item carries its courses.
#[utoipa::path(
    get,
    path = "/api/v1/bootcamps",
    responses(
        (status = 200, description = "Paginated list of bootcamps"),
        (status = 400, description = "Invalid query parameters")
    ),
    tag = "Bootcamps"
)]
pub async fn get_bootcamps(
    State(state): State<AppState>,
    Query(params): Query<BTreeMap<String, String>>,
) -> Result<Json<ResultPage>, AppError> {
    let spec = QuerySpec::from_params(&params)?;
    let page = BootcampService::list(&state.db, &spec).await?;
    Ok(Json(page))
}

#[utoipa::path(
    get,
    path = "/api/v1/bootcamps/{id}",
    params(("id" = String, Path, description = "Bootcamp ID")),
    responses(
        (status = 200, description = "Single bootcamp", body = Bootcamp),
        (status = 404, description = "Bootcamp not found")
    ),
    tag = "Bootcamps"
)]
pub async fn get_bootcamp(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DataResponse<Bootcamp>>, AppError> {
    let bootcamp_id = parse_id("Bootcamp", &id)?;
    let bootcamp = BootcampService::get(&state.db, bootcamp_id).await?;
    Ok(Json(DataResponse::new(bootcamp)))
}

#[utoipa::path(
    post,
    path = "/api/v1/bootcamps",
    request_body = CreateBootcampRequest,
    responses(
        (status = 201, description = "Bootcamp created", body = Bootcamp),
        (status = 400, description = "Validation error or caller already owns a bootcamp"),
        (status = 401, description = "Not authorized")
    ),
    tag = "Bootcamps",
    security(("bearer_auth" = []))
)]
pub async fn create_bootcamp(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<CreateBootcampRequest>,
) -> Result<(StatusCode, Json<DataResponse<Bootcamp>>), AppError> {
    let geocoder = Geocoder::new(state.geocoder_config.clone());
    let bootcamp = BootcampService::create(&state.db, &geocoder, &auth_user, dto).await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(bootcamp))))
}

#[utoipa::path(
    put,
    path = "/api/v1/bootcamps/{id}",
    params(("id" = String, Path, description = "Bootcamp ID")),
    request_body = UpdateBootcampRequest,
    responses(
        (status = 200, description = "Bootcamp updated", body = Bootcamp),
        (status = 401, description = "Not the owner"),
        (status = 404, description = "Bootcamp not found")
    ),
    tag = "Bootcamps",
    security(("bearer_auth" = []))
)]
pub async fn update_bootcamp(
    State(state): State<AppState>,
    Path(id): Path<String>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<UpdateBootcampRequest>,
) -> Result<Json<DataResponse<Bootcamp>>, AppError> {
    let bootcamp_id = parse_id("Bootcamp", &id)?;
    let geocoder = Geocoder::new(state.geocoder_config.clone());
    let bootcamp =
        BootcampService::update(&state.db, &geocoder, bootcamp_id, &auth_user, dto).await?;
    Ok(Json(DataResponse::new(bootcamp)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/bootcamps/{id}",
    params(("id" = String, Path, description = "Bootcamp ID")),
    responses(
        (status = 200, description = "Bootcamp and its courses deleted"),
        (status = 401, description = "Not the owner"),
        (status = 404, description = "Bootcamp not found")
    ),
    tag = "Bootcamps",
    security(("bearer_auth" = []))
)]
pub async fn delete_bootcamp(
    State(state): State<AppState>,
    Path(id): Path<String>,
    auth_user: AuthUser,
) -> Result<Json<DataResponse<serde_json::Value>>, AppError> {
    let bootcamp_id = parse_id("Bootcamp", &id)?;
    BootcampService::delete(&state.db, bootcamp_id, &auth_user).await?;
    Ok(Json(DataResponse::new(json!({}))))
}

/// Bootcamps within a radius of a zipcode.
#[utoipa::path(
    get,
    path = "/api/v1/bootcamps/radius/{zipcode}/{distance}",
    params(
        ("zipcode" = String, Path, description = "Center zipcode"),
        ("distance" = f64, Path, description = "Radius in miles")
    ),
    responses(
        (status = 200, description = "Bootcamps inside the radius"),
        (status = 400, description = "Zipcode could not be geocoded")
    ),
    tag = "Bootcamps"
)]
pub async fn get_bootcamps_in_radius(
    State(state): State<AppState>,
    Path((zipcode, distance)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, AppError> {
    let distance: f64 = distance
        .parse()
        .map_err(|_| AppError::bad_request(anyhow::anyhow!("Invalid distance parameter")))?;

    let geocoder = Geocoder::new(state.geocoder_config.clone());
    let bootcamps =
        BootcampService::in_radius(&state.db, &geocoder, &zipcode, distance).await?;

    Ok(Json(json!({
        "success": true,
        "count": bootcamps.len(),
        "data": bootcamps,
    })))
}

/// Upload a photo for a bootcamp. Expects a multipart field named `file`.
#[utoipa::path(
    put,
    path = "/api/v1/bootcamps/{id}/photo",
    params(("id" = String, Path, description = "Bootcamp ID")),
    responses(
        (status = 200, description = "Photo stored; returns the filename"),
        (status = 400, description = "Missing, non-image or oversized file"),
        (status = 401, description = "Not the owner"),
        (status = 404, description = "Bootcamp not found")
    ),
    tag = "Bootcamps",
    security(("bearer_auth" = []))
)]
pub async fn upload_bootcamp_photo(
    State(state): State<AppState>,
    Path(id): Path<String>,
    auth_user: AuthUser,
    mut multipart: Multipart,
) -> Result<Json<DataResponse<String>>, AppError> {
    let bootcamp_id = parse_id("Bootcamp", &id)?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| AppError::bad_request(anyhow::anyhow!("Please upload a file")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let content_type = field.content_type().map(str::to_owned);
        let data = field
            .bytes()
            .await
            .map_err(|_| AppError::bad_request(anyhow::anyhow!("Please upload a file")))?;

        let filename = BootcampService::upload_photo(
            &state.db,
            &state.upload_config,
            bootcamp_id,
            &auth_user,
            content_type.as_deref(),
            &data,
        )
        .await?;

        return Ok(Json(DataResponse::new(filename)));
    }

    Err(AppError::bad_request(anyhow::anyhow!(
        "Please upload a file"
    )))
}
