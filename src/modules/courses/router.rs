use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
};

use crate::middleware::role::require_publisher;
use crate::state::AppState;

use super::controller::{
    create_course, delete_course, get_bootcamp_courses, get_course, get_courses, update_course,
};

/// Top-level `/api/v1/courses` routes.
pub fn init_courses_router(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/", get(get_courses))
        .route("/{id}", get(get_course));

    let publisher_only = Router::new()
        .route("/{id}", put(update_course))
        .route("/{id}", delete(delete_course))
        .route_layer(from_fn_with_state(state, require_publisher));

    public.merge(publisher_only)
}

/// Routes nested under `/api/v1/bootcamps/{id}/courses`.
pub fn init_bootcamp_courses_router(state: AppState) -> Router<AppState> {
    let public = Router::new().route("/", get(get_bootcamp_courses));

    let publisher_only = Router::new()
        .route("/", post(create_course))
        .route_layer(from_fn_with_state(state, require_publisher));

    public.merge(publisher_only)
}
