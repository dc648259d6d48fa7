use std::collections::HashMap;

use serde_json::Value;
use sqlx::PgPool;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::middleware::auth::AuthUser;
use crate::utils::errors::AppError;
use crate::utils::query::{self, QuerySpec, ResultPage};

use super::model::{
    BootcampSummary, COURSE_TARGET, Course, CreateCourseRequest, UpdateCourseRequest,
};

pub struct CourseService;

impl CourseService {
    /// Lists courses, optionally scoped to one bootcamp, and swaps each
    /// item's bootcamp id for a name/description summary.
    #[instrument(skip(db, spec))]
    pub async fn list(
        db: &PgPool,
        spec: &QuerySpec,
        bootcamp_id: Option<Uuid>,
    ) -> Result<ResultPage, AppError> {
        let scope = bootcamp_id.map(|id| ("bootcamp_id", id));
        let mut page = query::run::<Course>(db, &COURSE_TARGET, spec, scope).await?;

        attach_bootcamp_summaries(db, &mut page.data).await?;

        Ok(page)
    }

    /// A single course with its bootcamp summary embedded.
    #[instrument(skip(db))]
    pub async fn get(db: &PgPool, course_id: Uuid) -> Result<Value, AppError> {
        let course = Self::fetch(db, course_id).await?;

        let mut items = vec![serde_json::to_value(course).map_err(AppError::internal)?];
        attach_bootcamp_summaries(db, &mut items).await?;

        Ok(items.remove(0))
    }

    /// Adds a course to a bootcamp. The caller must own the bootcamp
    /// or be an admin.
    #[instrument(skip(db, auth_user, dto), fields(course.title = %dto.title))]
    pub async fn create(
        db: &PgPool,
        bootcamp_id: Uuid,
        auth_user: &AuthUser,
        dto: CreateCourseRequest,
    ) -> Result<Course, AppError> {
        let bootcamp_owner: Option<Uuid> =
            sqlx::query_scalar("SELECT owner_id FROM bootcamps WHERE id = $1")
                .bind(bootcamp_id)
                .fetch_optional(db)
                .await
                .map_err(AppError::database)?;

        let bootcamp_owner = bootcamp_owner.ok_or_else(|| {
            AppError::not_found(anyhow::anyhow!(
                "Bootcamp not found with id of {bootcamp_id}"
            ))
        })?;

        if !auth_user.owns_or_admin(bootcamp_owner)? {
            return Err(AppError::unauthorized(anyhow::anyhow!(
                "User {} is not authorized to add a course to bootcamp {bootcamp_id}",
                auth_user.user_id()?
            )));
        }

        let course = sqlx::query_as::<_, Course>(
            "INSERT INTO courses (title, description, weeks, tuition, minimum_skill,
                                  scholarship_available, bootcamp_id, owner_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING *",
        )
        .bind(&dto.title)
        .bind(&dto.description)
        .bind(dto.weeks)
        .bind(dto.tuition)
        .bind(dto.minimum_skill.as_str())
        .bind(dto.scholarship_available)
        .bind(bootcamp_id)
        .bind(auth_user.user_id()?)
        .fetch_one(db)
        .await
        .map_err(AppError::database)?;

        info!(course.id = %course.id, bootcamp.id = %bootcamp_id, "course created");

        Ok(course)
    }

    #[instrument(skip(db, auth_user, dto))]
    pub async fn update(
        db: &PgPool,
        course_id: Uuid,
        auth_user: &AuthUser,
        dto: UpdateCourseRequest,
    ) -> Result<Course, AppError> {
        let course = Self::fetch(db, course_id).await?;

        if !auth_user.owns_or_admin(course.owner_id)? {
            return Err(AppError::unauthorized(anyhow::anyhow!(
                "User {} is not authorized to update course {course_id}",
                auth_user.user_id()?
            )));
        }

        sqlx::query_as::<_, Course>(
            "UPDATE courses
             SET title = COALESCE($2, title),
                 description = COALESCE($3, description),
                 weeks = COALESCE($4, weeks),
                 tuition = COALESCE($5, tuition),
                 minimum_skill = COALESCE($6, minimum_skill),
                 scholarship_available = COALESCE($7, scholarship_available)
             WHERE id = $1
             RETURNING *",
        )
        .bind(course_id)
        .bind(dto.title.as_deref())
        .bind(dto.description.as_deref())
        .bind(dto.weeks)
        .bind(dto.tuition)
        .bind(dto.minimum_skill.map(|s| s.as_str()))
        .bind(dto.scholarship_available)
        .fetch_one(db)
        .await
        .map_err(AppError::database)
    }

    #[instrument(skip(db, auth_user))]
    pub async fn delete(
        db: &PgPool,
        course_id: Uuid,
        auth_user: &AuthUser,
    ) -> Result<(), AppError> {
        let course = Self::fetch(db, course_id).await?;

        if !auth_user.owns_or_admin(course.owner_id)? {
            return Err(AppError::unauthorized(anyhow::anyhow!(
                "User {} is not authorized to delete course {course_id}",
                auth_user.user_id()?
            )));
        }

        sqlx::query("DELETE FROM courses WHERE id = $1")
            .bind(course_id)
            .execute(db)
            .await
            .map_err(AppError::database)?;

        Ok(())
    }

    async fn fetch(db: &PgPool, course_id: Uuid) -> Result<Course, AppError> {
        sqlx::query_as::<_, Course>("SELECT * FROM courses WHERE id = $1")
            .bind(course_id)
            .fetch_optional(db)
            .await
            .map_err(AppError::database)?
            .ok_or_else(|| {
                AppError::not_found(anyhow::anyhow!("Course not found with id of {course_id}"))
            })
    }
}

/// Replaces each item's `bootcamp` id with an id/name/description
/// object. Items where the field was deselected are left alone.
async fn attach_bootcamp_summaries(db: &PgPool, items: &mut [Value]) -> Result<(), AppError> {
    let ids: Vec<Uuid> = items
        .iter()
        .filter_map(|item| item.get("bootcamp")?.as_str()?.parse().ok())
        .collect();

    if ids.is_empty() {
        return Ok(());
    }

    let summaries = sqlx::query_as::<_, BootcampSummary>(
        "SELECT id, name, description FROM bootcamps WHERE id = ANY($1)",
    )
    .bind(&ids)
    .fetch_all(db)
    .await
    .map_err(AppError::database)?;

    let mut by_id: HashMap<Uuid, Value> = HashMap::new();
    for summary in summaries {
        by_id.insert(
            summary.id,
            serde_json::to_value(&summary).map_err(AppError::internal)?,
        );
    }

    for item in items {
        let Some(id) = item.get("bootcamp").and_then(|v| v.as_str()?.parse().ok()) else {
            continue;
        };
        if let (Value::Object(map), Some(summary)) = (&mut *item, by_id.get(&id)) {
            map.insert("bootcamp".to_string(), summary.clone());
        }
    }

    Ok(())
}
