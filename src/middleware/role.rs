//! Role-based authorization middleware.
//!
//! Applied with `axum::middleware::from_fn_with_state` as a
//! `route_layer` on protected route groups. Authentication and role
//! checks both respond 401 and stop the pipeline.

use axum::{
    extract::{FromRequestParts, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::middleware::auth::AuthUser;
use crate::modules::users::model::UserRole;
use crate::state::AppState;
use crate::utils::errors::AppError;

/// Checks that the authenticated caller holds one of `allowed_roles`.
///
/// A role mismatch responds 401, matching the system's observed wire
/// contract (see DESIGN.md on 401 vs 403).
pub async fn require_roles(
    State(state): State<AppState>,
    req: Request,
    next: Next,
    allowed_roles: Vec<UserRole>,
) -> Result<Response, AppError> {
    let (mut parts, body) = req.into_parts();

    let auth_user = AuthUser::from_request_parts(&mut parts, &state).await?;

    if !allowed_roles.contains(&auth_user.role()) {
        return Err(AppError::unauthorized(anyhow::anyhow!(
            "User role {} is not authorized to access this route",
            auth_user.role()
        )));
    }

    Ok(next.run(Request::from_parts(parts, body)).await)
}

/// Publisher routes: publishers and admins.
pub async fn require_publisher(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    match require_roles(
        State(state),
        req,
        next,
        vec![UserRole::Publisher, UserRole::Admin],
    )
    .await
    {
        Ok(response) => response,
        Err(err) => err.into_response(),
    }
}

/// Admin-only routes.
pub async fn require_admin(State(state): State<AppState>, req: Request, next: Next) -> Response {
    match require_roles(State(state), req, next, vec![UserRole::Admin]).await {
        Ok(response) => response,
        Err(err) => err.into_response(),
    }
}
