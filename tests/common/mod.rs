#[allow(unused_imports)]
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use codecamp::config::cors::CorsConfig;
use codecamp::config::email::EmailConfig;
use codecamp::config::geocoder::GeocoderConfig;
use codecamp::config::jwt::JwtConfig;
use codecamp::config::uploads::UploadConfig;
use codecamp::router::init_router;
use codecamp::state::AppState;
use codecamp::utils::password::hash_password;

pub async fn setup_test_app(pool: PgPool) -> axum::Router {
    dotenvy::dotenv().ok();
    let state = AppState {
        db: pool.clone(),
        jwt_config: JwtConfig::from_env(),
        email_config: EmailConfig::from_env(),
        cors_config: CorsConfig::from_env(),
        upload_config: UploadConfig::from_env(),
        geocoder_config: GeocoderConfig::from_env(),
    };
    init_router(state)
}

/// Like [`setup_test_app`], but with the geocoder pointed at a local
/// provider double (see [`spawn_geocoder_stub`]).
#[allow(dead_code)]
pub async fn setup_test_app_with_geocoder(pool: PgPool, geocoder_url: &str) -> axum::Router {
    dotenvy::dotenv().ok();
    let state = AppState {
        db: pool.clone(),
        jwt_config: JwtConfig::from_env(),
        email_config: EmailConfig::from_env(),
        cors_config: CorsConfig::from_env(),
        upload_config: UploadConfig::from_env(),
        geocoder_config: GeocoderConfig {
            base_url: geocoder_url.to_string(),
            api_key: String::new(),
        },
    };
    init_router(state)
}

/// Spawns a geocoding-provider double answering `/address` lookups
/// from a fixed location table, in the provider's response shape.
/// Returns its base URL.
#[allow(dead_code)]
pub async fn spawn_geocoder_stub(locations: &[(&str, f64, f64)]) -> String {
    use axum::extract::Query;
    use axum::routing::get;
    use std::collections::HashMap;

    let table: HashMap<String, (f64, f64)> = locations
        .iter()
        .map(|(location, lat, lng)| (location.to_string(), (*lat, *lng)))
        .collect();

    let router = axum::Router::new().route(
        "/address",
        get(move |Query(params): Query<HashMap<String, String>>| {
            let table = table.clone();
            async move {
                let hits = params
                    .get("location")
                    .and_then(|location| table.get(location))
                    .map(|(lat, lng)| serde_json::json!([{"latLng": {"lat": lat, "lng": lng}}]))
                    .unwrap_or_else(|| serde_json::json!([]));
                axum::Json(serde_json::json!({"results": [{"locations": hits}]}))
            }
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    format!("http://{addr}")
}

#[allow(dead_code)]
pub struct TestUser {
    pub id: Uuid,
    pub email: String,
    pub password: String,
    pub role: String,
}

/// Create a test user. `role` is one of "user", "publisher", "admin".
pub async fn create_test_user(
    tx: &mut Transaction<'_, Postgres>,
    email: &str,
    password: &str,
    role: &str,
) -> TestUser {
    let hashed = hash_password(password).unwrap();

    let id: Uuid = sqlx::query_scalar(
        "INSERT INTO users (name, email, role, password)
         VALUES ($1, $2, $3, $4)
         RETURNING id",
    )
    .bind("Test User")
    .bind(email)
    .bind(role)
    .bind(&hashed)
    .fetch_one(&mut **tx)
    .await
    .unwrap();

    TestUser {
        id,
        email: email.to_string(),
        password: password.to_string(),
        role: role.to_string(),
    }
}

#[allow(dead_code)]
pub async fn create_test_bootcamp(
    tx: &mut Transaction<'_, Postgres>,
    name: &str,
    owner_id: Uuid,
    average_cost: Option<f64>,
) -> Uuid {
    sqlx::query_scalar(
        "INSERT INTO bootcamps (name, slug, description, careers, average_cost, owner_id)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING id",
    )
    .bind(name)
    .bind(name.to_lowercase().replace(' ', "-"))
    .bind("A test bootcamp")
    .bind(vec!["Web Development".to_string()])
    .bind(average_cost)
    .bind(owner_id)
    .fetch_one(&mut **tx)
    .await
    .unwrap()
}

#[allow(dead_code)]
pub async fn create_test_course(
    tx: &mut Transaction<'_, Postgres>,
    title: &str,
    bootcamp_id: Uuid,
    owner_id: Uuid,
    tuition: f64,
) -> Uuid {
    sqlx::query_scalar(
        "INSERT INTO courses (title, description, weeks, tuition, minimum_skill,
                              bootcamp_id, owner_id)
         VALUES ($1, $2, $3, $4, $5, $6, $7)
         RETURNING id",
    )
    .bind(title)
    .bind("A test course")
    .bind(8)
    .bind(tuition)
    .bind("beginner")
    .bind(bootcamp_id)
    .bind(owner_id)
    .fetch_one(&mut **tx)
    .await
    .unwrap()
}

/// Log in through the API and return the issued token.
pub async fn get_auth_token(app: axum::Router, email: &str, password: &str) -> String {
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/api/v1/auth/login")
        .header("content-type", "application/json")
        .body(axum::body::Body::from(
            serde_json::json!({
                "email": email,
                "password": password
            })
            .to_string(),
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
    body["token"].as_str().unwrap().to_string()
}

pub fn generate_unique_email() -> String {
    format!("test-{}@test.com", Uuid::new_v4())
}

#[allow(dead_code)]
pub fn generate_unique_name(prefix: &str) -> String {
    format!("{prefix} {}", Uuid::new_v4())
}
