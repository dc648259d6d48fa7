mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{
    create_test_bootcamp, create_test_course, create_test_user, generate_unique_email,
    get_auth_token, setup_test_app, setup_test_app_with_geocoder, spawn_geocoder_stub,
};
use http_body_util::BodyExt;
use serde_json::json;
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

async fn get_json(app: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&body).unwrap())
}

/// Seed bootcamps with distinct owners (publishers may only own one).
async fn seed_bootcamps(pool: &PgPool, specs: &[(&str, Option<f64>)]) -> Vec<Uuid> {
    let mut tx = pool.begin().await.unwrap();
    let mut ids = Vec::new();
    for (name, cost) in specs {
        let owner = create_test_user(&mut tx, &generate_unique_email(), "123456", "publisher").await;
        ids.push(create_test_bootcamp(&mut tx, name, owner.id, *cost).await);
    }
    tx.commit().await.unwrap();
    ids
}

#[sqlx::test(migrations = "./migrations")]
async fn test_list_filters_sorts_and_paginates(pool: PgPool) {
    seed_bootcamps(
        &pool,
        &[
            ("Alpha Camp", Some(1500.0)),
            ("Bravo Camp", Some(1200.0)),
            ("Charlie Camp", Some(2000.0)),
            ("Delta Camp", Some(1000.0)),
            ("Echo Camp", Some(3000.0)),
            ("Foxtrot Camp", Some(500.0)),
        ],
    )
    .await;

    let app = setup_test_app(pool).await;
    let (status, body) = get_json(
        app,
        "/api/v1/bootcamps?averageCost[gte]=1000&sort=-name&page=2&limit=2",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["count"], 2);
    assert_eq!(body["pagination"]["total"], 5);
    assert_eq!(body["pagination"]["prev"], json!({"page": 1, "limit": 2}));
    assert_eq!(body["pagination"]["next"], json!({"page": 3, "limit": 2}));

    // Name-descending: Echo, Delta | Charlie, Bravo | Alpha
    assert_eq!(body["data"][0]["name"], "Charlie Camp");
    assert_eq!(body["data"][1]["name"], "Bravo Camp");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_list_last_page_omits_next(pool: PgPool) {
    seed_bootcamps(&pool, &[("Alpha Camp", None), ("Bravo Camp", None)]).await;

    let app = setup_test_app(pool).await;
    let (status, body) = get_json(app, "/api/v1/bootcamps?page=1&limit=25").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["total"], 2);
    assert!(body["pagination"].get("prev").is_none());
    assert!(body["pagination"].get("next").is_none());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_list_select_prunes_fields_but_keeps_id(pool: PgPool) {
    seed_bootcamps(&pool, &[("Alpha Camp", Some(1500.0))]).await;

    let app = setup_test_app(pool).await;
    let (status, body) = get_json(app, "/api/v1/bootcamps?select=name,housing").await;

    assert_eq!(status, StatusCode::OK);
    let item = &body["data"][0];
    assert!(item["id"].is_string());
    assert_eq!(item["name"], "Alpha Camp");
    assert!(item["housing"].is_boolean());
    assert!(item.get("description").is_none());
    assert!(item.get("averageCost").is_none());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_list_embeds_courses(pool: PgPool) {
    let mut tx = pool.begin().await.unwrap();
    let owner = create_test_user(&mut tx, &generate_unique_email(), "123456", "publisher").await;
    let bootcamp_id = create_test_bootcamp(&mut tx, "Alpha Camp", owner.id, None).await;
    create_test_course(&mut tx, "Rust Basics", bootcamp_id, owner.id, 5000.0).await;
    create_test_course(&mut tx, "Advanced Rust", bootcamp_id, owner.id, 8000.0).await;
    tx.commit().await.unwrap();

    let app = setup_test_app(pool).await;
    let (status, body) = get_json(app, "/api/v1/bootcamps").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["courses"].as_array().unwrap().len(), 2);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_list_rejects_unknown_filter_field(pool: PgPool) {
    let app = setup_test_app(pool).await;
    let (status, body) = get_json(app, "/api/v1/bootcamps?secretColumn[gte]=1").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_list_rejects_non_numeric_page(pool: PgPool) {
    let app = setup_test_app(pool).await;
    let (status, _) = get_json(app, "/api/v1/bootcamps?page=abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_get_missing_bootcamp_is_not_found(pool: PgPool) {
    let missing = Uuid::new_v4();
    let app = setup_test_app(pool).await;
    let (status, body) = get_json(app, &format!("/api/v1/bootcamps/{missing}")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body["error"],
        format!("Bootcamp not found with id of {missing}")
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn test_get_malformed_id_is_not_found(pool: PgPool) {
    let app = setup_test_app(pool).await;
    let (status, body) = get_json(app, "/api/v1/bootcamps/not-a-uuid").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Bootcamp not found with id of not-a-uuid");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_create_requires_publisher_role(pool: PgPool) {
    let mut tx = pool.begin().await.unwrap();
    let email = generate_unique_email();
    create_test_user(&mut tx, &email, "123456", "user").await;
    tx.commit().await.unwrap();

    let token = get_auth_token(setup_test_app(pool.clone()).await, &email, "123456").await;

    let app = setup_test_app(pool).await;
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/bootcamps")
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {token}"))
        .body(Body::from(
            json!({"name": "My Camp", "description": "Great camp"}).to_string(),
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(
        body["error"],
        "User role user is not authorized to access this route"
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn test_publisher_can_only_create_one_bootcamp(pool: PgPool) {
    let mut tx = pool.begin().await.unwrap();
    let email = generate_unique_email();
    let publisher = create_test_user(&mut tx, &email, "123456", "publisher").await;
    tx.commit().await.unwrap();

    let token = get_auth_token(setup_test_app(pool.clone()).await, &email, "123456").await;

    for (name, expected) in [
        ("First Camp", StatusCode::CREATED),
        ("Second Camp", StatusCode::BAD_REQUEST),
    ] {
        let app = setup_test_app(pool.clone()).await;
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/bootcamps")
            .header("content-type", "application/json")
            .header("authorization", format!("Bearer {token}"))
            .body(Body::from(
                json!({"name": name, "description": "Great camp"}).to_string(),
            ))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), expected);

        if expected == StatusCode::BAD_REQUEST {
            let body = response.into_body().collect().await.unwrap().to_bytes();
            let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
            assert_eq!(
                body["error"],
                format!(
                    "The user with ID {} has already published a bootcamp",
                    publisher.id
                )
            );
        }
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn test_create_slugifies_name_and_stamps_owner(pool: PgPool) {
    let mut tx = pool.begin().await.unwrap();
    let email = generate_unique_email();
    let publisher = create_test_user(&mut tx, &email, "123456", "publisher").await;
    tx.commit().await.unwrap();

    let token = get_auth_token(setup_test_app(pool.clone()).await, &email, "123456").await;

    let app = setup_test_app(pool).await;
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/bootcamps")
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {token}"))
        .body(Body::from(
            json!({"name": "Devworks Bootcamp", "description": "Great camp"}).to_string(),
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["data"]["slug"], "devworks-bootcamp");
    assert_eq!(body["data"]["user"], publisher.id.to_string());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_update_by_non_owner_is_unauthorized(pool: PgPool) {
    let mut tx = pool.begin().await.unwrap();
    let owner = create_test_user(&mut tx, &generate_unique_email(), "123456", "publisher").await;
    let bootcamp_id = create_test_bootcamp(&mut tx, "Alpha Camp", owner.id, None).await;
    let other_email = generate_unique_email();
    let other = create_test_user(&mut tx, &other_email, "123456", "publisher").await;
    tx.commit().await.unwrap();

    let token = get_auth_token(setup_test_app(pool.clone()).await, &other_email, "123456").await;

    let app = setup_test_app(pool).await;
    let request = Request::builder()
        .method("PUT")
        .uri(format!("/api/v1/bootcamps/{bootcamp_id}"))
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {token}"))
        .body(Body::from(json!({"name": "Stolen Camp"}).to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(
        body["error"],
        format!("User {} is not authorized to update this bootcamp", other.id)
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn test_admin_can_update_any_bootcamp(pool: PgPool) {
    let mut tx = pool.begin().await.unwrap();
    let owner = create_test_user(&mut tx, &generate_unique_email(), "123456", "publisher").await;
    let bootcamp_id = create_test_bootcamp(&mut tx, "Alpha Camp", owner.id, None).await;
    let admin_email = generate_unique_email();
    create_test_user(&mut tx, &admin_email, "123456", "admin").await;
    tx.commit().await.unwrap();

    let token = get_auth_token(setup_test_app(pool.clone()).await, &admin_email, "123456").await;

    let app = setup_test_app(pool).await;
    let request = Request::builder()
        .method("PUT")
        .uri(format!("/api/v1/bootcamps/{bootcamp_id}"))
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {token}"))
        .body(Body::from(json!({"housing": true}).to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["data"]["housing"], true);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_delete_cascades_to_courses(pool: PgPool) {
    let mut tx = pool.begin().await.unwrap();
    let email = generate_unique_email();
    let owner = create_test_user(&mut tx, &email, "123456", "publisher").await;
    let bootcamp_id = create_test_bootcamp(&mut tx, "Alpha Camp", owner.id, None).await;
    create_test_course(&mut tx, "Rust Basics", bootcamp_id, owner.id, 5000.0).await;
    tx.commit().await.unwrap();

    let token = get_auth_token(setup_test_app(pool.clone()).await, &email, "123456").await;

    let app = setup_test_app(pool.clone()).await;
    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/api/v1/bootcamps/{bootcamp_id}"))
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM courses WHERE bootcamp_id = $1")
        .bind(bootcamp_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(remaining, 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_create_geocodes_address_and_radius_search_finds_it(pool: PgPool) {
    let geocoder_url = spawn_geocoder_stub(&[
        ("02118", 42.3382, -71.0709),
        ("233 Bay State Rd Boston MA", 42.3504, -71.1053),
        ("85 South Prospect St Burlington VT", 44.4759, -73.1959),
    ])
    .await;

    let near_email = generate_unique_email();
    let far_email = generate_unique_email();
    let mut tx = pool.begin().await.unwrap();
    create_test_user(&mut tx, &near_email, "123456", "publisher").await;
    create_test_user(&mut tx, &far_email, "123456", "publisher").await;
    tx.commit().await.unwrap();

    for (email, name, address) in [
        (&near_email, "Boston Camp", "233 Bay State Rd Boston MA"),
        (&far_email, "Burlington Camp", "85 South Prospect St Burlington VT"),
    ] {
        let token = get_auth_token(
            setup_test_app_with_geocoder(pool.clone(), &geocoder_url).await,
            email,
            "123456",
        )
        .await;

        let app = setup_test_app_with_geocoder(pool.clone(), &geocoder_url).await;
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/bootcamps")
            .header("content-type", "application/json")
            .header("authorization", format!("Bearer {token}"))
            .body(Body::from(
                json!({"name": name, "description": "Great camp", "address": address})
                    .to_string(),
            ))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(body["data"]["latitude"].is_f64());
        assert!(body["data"]["longitude"].is_f64());
    }

    // Boston camp is a couple of miles from the 02118 centroid; the
    // Burlington camp is well over a hundred
    let app = setup_test_app_with_geocoder(pool.clone(), &geocoder_url).await;
    let (status, body) = get_json(app, "/api/v1/bootcamps/radius/02118/50").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["count"], 1);
    assert_eq!(body["data"][0]["name"], "Boston Camp");

    let app = setup_test_app_with_geocoder(pool.clone(), &geocoder_url).await;
    let (_, body) = get_json(app, "/api/v1/bootcamps/radius/02118/500").await;
    assert_eq!(body["count"], 2);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_update_address_refreshes_coordinates(pool: PgPool) {
    let geocoder_url = spawn_geocoder_stub(&[
        ("233 Bay State Rd Boston MA", 42.3504, -71.1053),
        ("85 South Prospect St Burlington VT", 44.4759, -73.1959),
    ])
    .await;

    let email = generate_unique_email();
    let mut tx = pool.begin().await.unwrap();
    create_test_user(&mut tx, &email, "123456", "publisher").await;
    tx.commit().await.unwrap();

    let token = get_auth_token(
        setup_test_app_with_geocoder(pool.clone(), &geocoder_url).await,
        &email,
        "123456",
    )
    .await;

    let app = setup_test_app_with_geocoder(pool.clone(), &geocoder_url).await;
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/bootcamps")
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {token}"))
        .body(Body::from(
            json!({
                "name": "Moving Camp",
                "description": "Great camp",
                "address": "233 Bay State Rd Boston MA"
            })
            .to_string(),
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
    let bootcamp_id = body["data"]["id"].as_str().unwrap().to_string();
    assert!((body["data"]["latitude"].as_f64().unwrap() - 42.3504).abs() < 1e-9);

    let app = setup_test_app_with_geocoder(pool.clone(), &geocoder_url).await;
    let request = Request::builder()
        .method("PUT")
        .uri(format!("/api/v1/bootcamps/{bootcamp_id}"))
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {token}"))
        .body(Body::from(
            json!({"address": "85 South Prospect St Burlington VT"}).to_string(),
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert!((body["data"]["latitude"].as_f64().unwrap() - 44.4759).abs() < 1e-9);
    assert!((body["data"]["longitude"].as_f64().unwrap() + 73.1959).abs() < 1e-9);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_photo_upload_rejects_non_image(pool: PgPool) {
    let mut tx = pool.begin().await.unwrap();
    let email = generate_unique_email();
    let owner = create_test_user(&mut tx, &email, "123456", "publisher").await;
    let bootcamp_id = create_test_bootcamp(&mut tx, "Alpha Camp", owner.id, None).await;
    tx.commit().await.unwrap();

    let token = get_auth_token(setup_test_app(pool.clone()).await, &email, "123456").await;

    let boundary = "testboundary";
    let multipart_body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"notes.txt\"\r\n\
         Content-Type: text/plain\r\n\r\n\
         not an image\r\n\
         --{boundary}--\r\n"
    );

    let app = setup_test_app(pool.clone()).await;
    let request = Request::builder()
        .method("PUT")
        .uri(format!("/api/v1/bootcamps/{bootcamp_id}/photo"))
        .header(
            "content-type",
            format!("multipart/form-data; boundary={boundary}"),
        )
        .header("authorization", format!("Bearer {token}"))
        .body(Body::from(multipart_body))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["error"], "Please upload an image file");

    // The bootcamp keeps no photo reference
    let photo: Option<String> = sqlx::query_scalar("SELECT photo FROM bootcamps WHERE id = $1")
        .bind(bootcamp_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert!(photo.is_none());
}
