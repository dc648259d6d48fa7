use chrono::{Duration, Utc};
use rand::Rng;
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::modules::users::model::{User, UserRole};
use crate::utils::email::EmailService;
use crate::utils::errors::AppError;
use crate::utils::password::{hash_password, verify_password};

use super::model::{
    ForgotPasswordRequest, LoginRequest, RegisterRequest, ResetPasswordRequest,
    UpdateDetailsRequest, UpdatePasswordRequest,
};

/// Reset tokens live for ten minutes.
const RESET_TOKEN_TTL_MINUTES: i64 = 10;

#[derive(sqlx::FromRow)]
struct UserWithPassword {
    id: Uuid,
    password: String,
}

pub struct AuthService;

impl AuthService {
    #[instrument(skip(db, dto), fields(user.email = %dto.email))]
    pub async fn register(db: &PgPool, dto: RegisterRequest) -> Result<User, AppError> {
        let role = dto.role.unwrap_or(UserRole::User);
        if role == UserRole::Admin {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "Cannot register with role admin"
            )));
        }

        let hashed = hash_password(&dto.password)?;

        sqlx::query_as::<_, User>(
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
        .map_err(AppError::database)
    }

    #[instrument(skip(db, dto), fields(user.email = %dto.email))]
    pub async fn login(db: &PgPool, dto: LoginRequest) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, UserWithPassword>(
            "SELECT id, password FROM users WHERE email = $1",
        )
        .bind(&dto.email)
        .fetch_optional(db)
        .await
        .map_err(AppError::database)?
        .ok_or_else(|| AppError::unauthorized(anyhow::anyhow!("Invalid credentials")))?;

        if !verify_password(&dto.password, &user.password)? {
            return Err(AppError::unauthorized(anyhow::anyhow!("Invalid credentials")));
        }

        Self::get_me(db, user.id).await
    }

    #[instrument(skip(db))]
    pub async fn get_me(db: &PgPool, user_id: Uuid) -> Result<User, AppError> {
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

    #[instrument(skip(db, dto))]
    pub async fn update_details(
        db: &PgPool,
        user_id: Uuid,
        dto: UpdateDetailsRequest,
    ) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(
            "UPDATE users
             SET name = COALESCE($2, name),
                 email = COALESCE($3, email)
             WHERE id = $1
             RETURNING id, name, email, role, created_at",
        )
        .bind(user_id)
        .bind(dto.name.as_deref())
        .bind(dto.email.as_deref())
        .fetch_optional(db)
        .await
        .map_err(AppError::database)?
        .ok_or_else(|| {
            AppError::not_found(anyhow::anyhow!("User not found with id of {user_id}"))
        })
    }

    #[instrument(skip(db, dto))]
    pub async fn update_password(
        db: &PgPool,
        user_id: Uuid,
        dto: UpdatePasswordRequest,
    ) -> Result<User, AppError> {
        let current: String = sqlx::query_scalar("SELECT password FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(db)
            .await
            .map_err(AppError::database)?
            .ok_or_else(|| {
                AppError::not_found(anyhow::anyhow!("User not found with id of {user_id}"))
            })?;

        if !verify_password(&dto.current_password, &current)? {
            return Err(AppError::unauthorized(anyhow::anyhow!("Password is incorrect")));
        }

        let hashed = hash_password(&dto.new_password)?;
        sqlx::query("UPDATE users SET password = $2 WHERE id = $1")
            .bind(user_id)
            .bind(&hashed)
            .execute(db)
            .await
            .map_err(AppError::database)?;

        Self::get_me(db, user_id).await
    }

    /// Generates an opaque reset token, stores only its digest with a
    /// short expiry, and mails the raw token. The token fields are
    /// cleared again when sending fails.
    #[instrument(skip(db, email_service, dto), fields(user.email = %dto.email))]
    pub async fn forgot_password(
        db: &PgPool,
        email_service: &EmailService,
        dto: ForgotPasswordRequest,
    ) -> Result<(), AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, name, email, role, created_at FROM users WHERE email = $1",
        )
        .bind(&dto.email)
        .fetch_optional(db)
        .await
        .map_err(AppError::database)?
        .ok_or_else(|| {
            AppError::not_found(anyhow::anyhow!("There is no user with that email"))
        })?;

        let raw_token = generate_reset_token();
        let digest = hash_reset_token(&raw_token);
        let expires = Utc::now() + Duration::minutes(RESET_TOKEN_TTL_MINUTES);

        sqlx::query(
            "UPDATE users SET reset_password_token = $2, reset_password_expire = $3 WHERE id = $1",
        )
        .bind(user.id)
        .bind(&digest)
        .bind(expires)
        .execute(db)
        .await
        .map_err(AppError::database)?;

        if let Err(e) = email_service
            .send_password_reset_email(&user.email, &user.name, &raw_token)
            .await
        {
            sqlx::query(
                "UPDATE users SET reset_password_token = NULL, reset_password_expire = NULL
                 WHERE id = $1",
            )
            .bind(user.id)
            .execute(db)
            .await
            .map_err(AppError::database)?;

            warn!(error = ?e.error, "reset email failed, token cleared");
            return Err(AppError::internal(anyhow::anyhow!("Email could not be sent")));
        }

        Ok(())
    }

    #[instrument(skip_all)]
    pub async fn reset_password(
        db: &PgPool,
        email_service: &EmailService,
        raw_token: &str,
        dto: ResetPasswordRequest,
    ) -> Result<User, AppError> {
        let digest = hash_reset_token(raw_token);

        let user = sqlx::query_as::<_, User>(
            "SELECT id, name, email, role, created_at FROM users
             WHERE reset_password_token = $1 AND reset_password_expire > NOW()",
        )
        .bind(&digest)
        .fetch_optional(db)
        .await
        .map_err(AppError::database)?
        .ok_or_else(|| AppError::bad_request(anyhow::anyhow!("Invalid token")))?;

        let hashed = hash_password(&dto.password)?;
        sqlx::query(
            "UPDATE users
             SET password = $2, reset_password_token = NULL, reset_password_expire = NULL
             WHERE id = $1",
        )
        .bind(user.id)
        .bind(&hashed)
        .execute(db)
        .await
        .map_err(AppError::database)?;

        // Confirmation mail is best effort
        if let Err(e) = email_service
            .send_password_reset_confirmation(&user.email, &user.name)
            .await
        {
            warn!(error = ?e.error, "reset confirmation email failed");
        }

        Ok(user)
    }
}

fn generate_reset_token() -> String {
    let mut bytes = [0u8; 20];
    rand::thread_rng().fill(&mut bytes);
    hex::encode(bytes)
}

fn hash_reset_token(raw: &str) -> String {
    hex::encode(Sha256::digest(raw.as_bytes()))
}
