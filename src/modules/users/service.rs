use sqlx::PgPool;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::utils::errors::AppError;
use crate::utils::password::hash_password;
use crate::utils::query::{self, QuerySpec, ResultPage};

use super::model::{CreateUserRequest, UpdateUserRequest, USER_TARGET, User, UserRole};

pub struct UserService;

impl UserService {
    #[instrument(skip(db, spec))]
    pub async fn list(db: &PgPool, spec: &QuerySpec) -> Result<ResultPage, AppError> {
        query::run::<User>(db, &USER_TARGET, spec, None).await
    }

    #[instrument(skip(db))]
    pub async fn get(db: &PgPool, user_id: Uuid) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(
            "SELECT id, name, email, role, created_at FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(db)
        .await
        .map_err(AppError::database)?
        .ok_or_else(|| {
            AppError::not_found(anyhow::anyhow!("User not found with id of {user_id}"))
        })
    }

    #[instrument(skip(db, dto), fields(user.email = %dto.email))]
    pub async fn create(db: &PgPool, dto: CreateUserRequest) -> Result<User, AppError> {
        let hashed = hash_password(&dto.password)?;
        let role = dto.role.unwrap_or(UserRole::User);

        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (name, email, role, password)
             VALUES ($1, $2, $3, $4)
             RETURNING id, name, email, role, created_at",
        )
        .bind(&dto.name)
        .bind(&dto.email)
        .bind(role.as_str())
        .bind(&hashed)
        .fetch_one(db)
        .await
        .map_err(AppError::database)?;

        debug!(user.id = %user.id, "user created");

        Ok(user)
    }

    #[instrument(skip(db, dto))]
    pub async fn update(
        db: &PgPool,
        user_id: Uuid,
        dto: UpdateUserRequest,
    ) -> Result<User, AppError> {
        let hashed = dto.password.as_deref().map(hash_password).transpose()?;

        sqlx::query_as::<_, User>(
            "UPDATE users
             SET name = COALESCE($2, name),
                 email = COALESCE($3, email),
                 role = COALESCE($4, role),
                 password = COALESCE($5, password)
             WHERE id = $1
             RETURNING id, name, email, role, created_at",
        )
        .bind(user_id)
        .bind(dto.name.as_deref())
        .bind(dto.email.as_deref())
        .bind(dto.role.map(UserRole::as_str))
        .bind(hashed.as_deref())
        .fetch_optional(db)
        .await
        .map_err(AppError::database)?
        .ok_or_else(|| {
            AppError::not_found(anyhow::anyhow!("User not found with id of {user_id}"))
        })
    }

    #[instrument(skip(db))]
    pub async fn delete(db: &PgPool, user_id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(db)
            .await
            .map_err(AppError::database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow::anyhow!(
                "User not found with id of {user_id}"
            )));
        }

        Ok(())
    }
}
