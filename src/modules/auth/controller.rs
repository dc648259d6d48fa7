use axum::{
    Json,
    extract::{Path, State},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use time::Duration;

use crate::middleware::auth::AuthUser;
use crate::modules::users::model::{User, UserRole};
use crate::state::AppState;
use crate::utils::email::EmailService;
use crate::utils::errors::AppError;
use crate::utils::jwt::create_access_token;
use crate::utils::response::DataResponse;
use crate::validator::ValidatedJson;

use super::model::{
    ForgotPasswordRequest, LoginRequest, RegisterRequest, ResetPasswordRequest, TokenResponse,
    UpdateDetailsRequest, UpdatePasswordRequest,
};
use super::service::AuthService;

/// Issues the credential and sets it as an HTTP-only cookie alongside
/// the JSON body.
fn token_response(
    state: &AppState,
    jar: CookieJar,
    user_id: uuid::Uuid,
    role: UserRole,
) -> Result<(CookieJar, Json<TokenResponse>), AppError> {
    let token = create_access_token(user_id, role, &state.jwt_config)?;

    let cookie = Cookie::build(("token", token.clone()))
        .path("/")
        .http_only(true)
        .max_age(Duration::days(state.jwt_config.cookie_expiry_days))
        .build();

    Ok((
        jar.add(cookie),
        Json(TokenResponse {
            success: true,
            token,
        }),
    ))
}

/// Register a new user and log them in.
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Registered; credential issued", body = TokenResponse),
        (status = 400, description = "Validation error or duplicate email")
    ),
    tag = "Auth"
)]
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidatedJson(dto): ValidatedJson<RegisterRequest>,
) -> Result<(CookieJar, Json<TokenResponse>), AppError> {
    let user = AuthService::register(&state.db, dto).await?;
    token_response(&state, jar, user.id, user.role)
}

/// Log in with email and password.
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Credential issued", body = TokenResponse),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidatedJson(dto): ValidatedJson<LoginRequest>,
) -> Result<(CookieJar, Json<TokenResponse>), AppError> {
    let user = AuthService::login(&state.db, dto).await?;
    token_response(&state, jar, user.id, user.role)
}

/// The currently authenticated user.
#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    responses(
        (status = 200, description = "Current user", body = User),
        (status = 401, description = "Not authorized")
    ),
    tag = "Auth",
    security(("bearer_auth" = []))
)]
pub async fn get_me(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<DataResponse<User>>, AppError> {
    let user = AuthService::get_me(&state.db, auth_user.user_id()?).await?;
    Ok(Json(DataResponse::new(user)))
}

#[utoipa::path(
    put,
    path = "/api/v1/auth/updatedetails",
    request_body = UpdateDetailsRequest,
    responses(
        (status = 200, description = "Details updated", body = User),
        (status = 401, description = "Not authorized")
    ),
    tag = "Auth",
    security(("bearer_auth" = []))
)]
pub async fn update_details(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<UpdateDetailsRequest>,
) -> Result<Json<DataResponse<User>>, AppError> {
    let user = AuthService::update_details(&state.db, auth_user.user_id()?, dto).await?;
    Ok(Json(DataResponse::new(user)))
}

/// Change password; re-issues the credential on success.
#[utoipa::path(
    put,
    path = "/api/v1/auth/updatepassword",
    request_body = UpdatePasswordRequest,
    responses(
        (status = 200, description = "Password updated; credential re-issued", body = TokenResponse),
        (status = 401, description = "Current password incorrect")
    ),
    tag = "Auth",
    security(("bearer_auth" = []))
)]
pub async fn update_password(
    State(state): State<AppState>,
    auth_user: AuthUser,
    jar: CookieJar,
    ValidatedJson(dto): ValidatedJson<UpdatePasswordRequest>,
) -> Result<(CookieJar, Json<TokenResponse>), AppError> {
    let user = AuthService::update_password(&state.db, auth_user.user_id()?, dto).await?;
    token_response(&state, jar, user.id, user.role)
}

/// Send a password-reset token to the given email.
#[utoipa::path(
    post,
    path = "/api/v1/auth/forgetpassword",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "Reset email sent"),
        (status = 404, description = "No user with that email"),
        (status = 500, description = "Email could not be sent")
    ),
    tag = "Auth"
)]
pub async fn forgot_password(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<ForgotPasswordRequest>,
) -> Result<Json<DataResponse<&'static str>>, AppError> {
    let email_service = EmailService::new(state.email_config.clone());
    AuthService::forgot_password(&state.db, &email_service, dto).await?;
    Ok(Json(DataResponse::new("Email sent")))
}

/// Reset the password with an emailed token; logs the user in.
#[utoipa::path(
    put,
    path = "/api/v1/auth/resetpassword/{resettoken}",
    params(("resettoken" = String, Path, description = "Reset token from the email")),
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password reset; credential issued", body = TokenResponse),
        (status = 400, description = "Invalid or expired token")
    ),
    tag = "Auth"
)]
pub async fn reset_password(
    State(state): State<AppState>,
    Path(resettoken): Path<String>,
    jar: CookieJar,
    ValidatedJson(dto): ValidatedJson<ResetPasswordRequest>,
) -> Result<(CookieJar, Json<TokenResponse>), AppError> {
    let email_service = EmailService::new(state.email_config.clone());
    let user = AuthService::reset_password(&state.db, &email_service, &resettoken, dto).await?;
    token_response(&state, jar, user.id, user.role)
}
