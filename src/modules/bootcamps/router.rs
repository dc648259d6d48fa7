use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
};

use crate::middleware::role::require_publisher;
use crate::modules::courses::router::init_bootcamp_courses_router;
use crate::state::AppState;

use super::controller::{
    create_bootcamp, delete_bootcamp, get_bootcamp, get_bootcamps, get_bootcamps_in_radius,
    update_bootcamp, upload_bootcamp_photo,
};

pub fn init_bootcamps_router(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/", get(get_bootcamps))
        .route("/radius/{zipcode}/{distance}", get(get_bootcamps_in_radius))
        .route("/{id}", get(get_bootcamp));

    let publisher_only = Router::new()
        .route("/", post(create_bootcamp))
        .route("/{id}", put(update_bootcamp))
        .route("/{id}", delete(delete_bootcamp))
        .route("/{id}/photo", put(upload_bootcamp_photo))
        .route_layer(from_fn_with_state(state.clone(), require_publisher));

    public
        .merge(publisher_only)
        .nest("/{id}/courses", init_bootcamp_courses_router(state))
}
