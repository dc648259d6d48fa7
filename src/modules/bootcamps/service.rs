use std::collections::HashMap;

use sqlx::PgPool;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::config::uploads::UploadConfig;
use crate::middleware::auth::AuthUser;
use crate::modules::courses::model::Course;
use crate::utils::errors::AppError;
use crate::utils::geocode::Geocoder;
use crate::utils::query::{self, QuerySpec, ResultPage};

use super::model::{
    BOOTCAMP_TARGET, Bootcamp, CreateBootcampRequest, PhotoValidator, UpdateBootcampRequest,
    slugify,
};

/// Earth radius in miles, for the radius search.
const EARTH_RADIUS_MILES: f64 = 3963.0;

pub struct BootcampService;

impl BootcampService {
    /// Lists bootcamps through the query translator and resolves each
    /// bootcamp's courses into the page items.
    #[instrument(skip(db, spec))]
    pub async fn list(db: &PgPool, spec: &QuerySpec) -> Result<ResultPage, AppError> {
        let mut page = query::run::<Bootcamp>(db, &BOOTCAMP_TARGET, spec, None).await?;

        let ids: Vec<Uuid> = page
            .data
            .iter()
            .filter_map(|item| item.get("id")?.as_str()?.parse().ok())
            .collect();

        if !ids.is_empty() {
            let courses = sqlx::query_as::<_, Course>(
                "SELECT * FROM courses WHERE bootcamp_id = ANY($1)",
            )
            .bind(&ids)
            .fetch_all(db)
            .await
            .map_err(AppError::database)?;

            let mut by_bootcamp: HashMap<Uuid, Vec<serde_json::Value>> = HashMap::new();
            for course in courses {
                by_bootcamp
                    .entry(course.bootcamp_id)
                    .or_default()
                    .push(serde_json::to_value(course).map_err(AppError::internal)?);
            }

            for item in &mut page.data {
                let Some(id) = item.get("id").and_then(|v| v.as_str()?.parse().ok()) else {
                    continue;
                };
                if let serde_json::Value::Object(map) = item {
                    map.insert(
                        "courses".to_string(),
                        serde_json::Value::Array(by_bootcamp.remove(&id).unwrap_or_default()),
                    );
                }
            }
        }

        Ok(page)
    }

    #[instrument(skip(db))]
    pub async fn get(db: &PgPool, bootcamp_id: Uuid) -> Result<Bootcamp, AppError> {
        sqlx::query_as::<_, Bootcamp>("SELECT * FROM bootcamps WHERE id = $1")
            .bind(bootcamp_id)
            .fetch_optional(db)
            .await
            .map_err(AppError::database)?
            .ok_or_else(|| {
                AppError::not_found(anyhow::anyhow!(
                    "Bootcamp not found with id of {bootcamp_id}"
                ))
            })
    }

    /// Creates a bootcamp stamped with the caller's id. The address,
    /// when given, is geocoded so the bootcamp shows up in radius
    /// searches. Publishers may only own one bootcamp; admins are
    /// exempt.
    #[instrument(skip(db, geocoder, auth_user, dto), fields(bootcamp.name = %dto.name))]
    pub async fn create(
        db: &PgPool,
        geocoder: &Geocoder,
        auth_user: &AuthUser,
        dto: CreateBootcampRequest,
    ) -> Result<Bootcamp, AppError> {
        let owner_id = auth_user.user_id()?;

        if !auth_user.is_admin() {
            let existing: Option<Uuid> =
                sqlx::query_scalar("SELECT id FROM bootcamps WHERE owner_id = $1")
                    .bind(owner_id)
                    .fetch_optional(db)
                    .await
                    .map_err(AppError::database)?;

            if existing.is_some() {
                return Err(AppError::bad_request(anyhow::anyhow!(
                    "The user with ID {owner_id} has already published a bootcamp"
                )));
            }
        }

        let coordinates = match dto.address.as_deref() {
            Some(address) => Some(geocoder.geocode(address).await?),
            None => None,
        };

        let bootcamp = sqlx::query_as::<_, Bootcamp>(
            "INSERT INTO bootcamps (name, slug, description, website, phone, email, address,
                                    latitude, longitude, careers, average_cost, housing,
                                    job_assistance, job_guarantee, accept_gi, owner_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
             RETURNING *",
        )
        .bind(&dto.name)
        .bind(slugify(&dto.name))
        .bind(&dto.description)
        .bind(dto.website.as_deref())
        .bind(dto.phone.as_deref())
        .bind(dto.email.as_deref())
        .bind(dto.address.as_deref())
        .bind(coordinates.map(|(lat, _)| lat))
        .bind(coordinates.map(|(_, lng)| lng))
        .bind(&dto.careers)
        .bind(dto.average_cost)
        .bind(dto.housing)
        .bind(dto.job_assistance)
        .bind(dto.job_guarantee)
        .bind(dto.accept_gi)
        .bind(owner_id)
        .fetch_one(db)
        .await
        .map_err(AppError::database)?;

        info!(bootcamp.id = %bootcamp.id, "bootcamp created");

        Ok(bootcamp)
    }

    /// Updates a bootcamp; a changed address is re-geocoded.
    #[instrument(skip(db, geocoder, auth_user, dto))]
    pub async fn update(
        db: &PgPool,
        geocoder: &Geocoder,
        bootcamp_id: Uuid,
        auth_user: &AuthUser,
        dto: UpdateBootcampRequest,
    ) -> Result<Bootcamp, AppError> {
        let bootcamp = Self::get(db, bootcamp_id).await?;

        if !auth_user.owns_or_admin(bootcamp.owner_id)? {
            return Err(AppError::unauthorized(anyhow::anyhow!(
                "User {} is not authorized to update this bootcamp",
                auth_user.user_id()?
            )));
        }

        let slug = dto.name.as_deref().map(slugify);
        let coordinates = match dto.address.as_deref() {
            Some(address) => Some(geocoder.geocode(address).await?),
            None => None,
        };

        sqlx::query_as::<_, Bootcamp>(
            "UPDATE bootcamps
             SET name = COALESCE($2, name),
                 slug = COALESCE($3, slug),
                 description = COALESCE($4, description),
                 website = COALESCE($5, website),
                 phone = COALESCE($6, phone),
                 email = COALESCE($7, email),
                 address = COALESCE($8, address),
                 latitude = COALESCE($9, latitude),
                 longitude = COALESCE($10, longitude),
                 careers = COALESCE($11, careers),
                 average_cost = COALESCE($12, average_cost),
                 housing = COALESCE($13, housing),
                 job_assistance = COALESCE($14, job_assistance),
                 job_guarantee = COALESCE($15, job_guarantee),
                 accept_gi = COALESCE($16, accept_gi)
             WHERE id = $1
             RETURNING *",
        )
        .bind(bootcamp_id)
        .bind(dto.name.as_deref())
        .bind(slug)
        .bind(dto.description.as_deref())
        .bind(dto.website.as_deref())
        .bind(dto.phone.as_deref())
        .bind(dto.email.as_deref())
        .bind(dto.address.as_deref())
        .bind(coordinates.map(|(lat, _)| lat))
        .bind(coordinates.map(|(_, lng)| lng))
        .bind(dto.careers.as_deref())
        .bind(dto.average_cost)
        .bind(dto.housing)
        .bind(dto.job_assistance)
        .bind(dto.job_guarantee)
        .bind(dto.accept_gi)
        .fetch_one(db)
        .await
        .map_err(AppError::database)
    }

    #[instrument(skip(db, auth_user))]
    pub async fn delete(
        db: &PgPool,
        bootcamp_id: Uuid,
        auth_user: &AuthUser,
    ) -> Result<(), AppError> {
        let bootcamp = Self::get(db, bootcamp_id).await?;

        if !auth_user.owns_or_admin(bootcamp.owner_id)? {
            return Err(AppError::unauthorized(anyhow::anyhow!(
                "User {} is not authorized to delete this bootcamp",
                auth_user.user_id()?
            )));
        }

        // Courses cascade at the database level
        sqlx::query("DELETE FROM bootcamps WHERE id = $1")
            .bind(bootcamp_id)
            .execute(db)
            .await
            .map_err(AppError::database)?;

        Ok(())
    }

    /// Bootcamps within `distance` miles of a zipcode's centroid.
    #[instrument(skip(db, geocoder))]
    pub async fn in_radius(
        db: &PgPool,
        geocoder: &Geocoder,
        zipcode: &str,
        distance: f64,
    ) -> Result<Vec<Bootcamp>, AppError> {
        let (lat, lng) = geocoder.geocode(zipcode).await?;

        debug!(lat, lng, distance, "radius search");

        sqlx::query_as::<_, Bootcamp>(
            "SELECT * FROM bootcamps
             WHERE latitude IS NOT NULL AND longitude IS NOT NULL
               AND acos(LEAST(1.0,
                     sin(radians($1)) * sin(radians(latitude))
                   + cos(radians($1)) * cos(radians(latitude))
                   * cos(radians(longitude - $2)))) * $3 <= $4
             ORDER BY created_at DESC",
        )
        .bind(lat)
        .bind(lng)
        .bind(EARTH_RADIUS_MILES)
        .bind(distance)
        .fetch_all(db)
        .await
        .map_err(AppError::database)
    }

    /// Stores an uploaded photo as `photo_<id>.<ext>` and persists the
    /// filename on the bootcamp.
    #[instrument(skip(db, upload_config, auth_user, data))]
    pub async fn upload_photo(
        db: &PgPool,
        upload_config: &UploadConfig,
        bootcamp_id: Uuid,
        auth_user: &AuthUser,
        content_type: Option<&str>,
        data: &[u8],
    ) -> Result<String, AppError> {
        let bootcamp = Self::get(db, bootcamp_id).await?;

        if !auth_user.owns_or_admin(bootcamp.owner_id)? {
            return Err(AppError::unauthorized(anyhow::anyhow!(
                "User {} is not authorized to update this bootcamp",
                auth_user.user_id()?
            )));
        }

        PhotoValidator::validate(content_type, data.len(), upload_config.max_file_upload)?;

        let extension = PhotoValidator::extension(content_type.unwrap_or_default());
        let filename = format!("photo_{bootcamp_id}.{extension}");
        let path = format!("{}/{}", upload_config.file_upload_path, filename);

        tokio::fs::create_dir_all(&upload_config.file_upload_path)
            .await
            .map_err(|e| AppError::internal(anyhow::anyhow!("Problem with file upload: {e}")))?;
        tokio::fs::write(&path, data)
            .await
            .map_err(|e| AppError::internal(anyhow::anyhow!("Problem with file upload: {e}")))?;

        sqlx::query("UPDATE bootcamps SET photo = $2 WHERE id = $1")
            .bind(bootcamp_id)
            .bind(&filename)
            .execute(db)
            .await
            .map_err(AppError::database)?;

        Ok(filename)
    }
}
