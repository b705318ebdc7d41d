use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use cms_server::auth::AuthGate;
use cms_server::store::JsonContentStore;
use cms_server::{app, AppState, CmsServerConfig};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::{tempdir, TempDir};
use tower::ServiceExt;

const PASSWORD: &str = "open-sesame";

async fn test_app() -> (TempDir, Router) {
    let dir = tempdir().unwrap();
    let mut config = CmsServerConfig::with_base_dir(dir.path());
    config.site_passwords.insert("acme".into(), PASSWORD.into());
    config.site_passwords.insert("jw-cafe".into(), "latte".into());
    config.admin_password = Some("master".into());
    config.token_secret = "integration-secret".into();
    config.bcrypt_cost = 4;

    let state = AppState::new(config).await.unwrap();
    (dir, app(state))
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("X-Auth-Token", token);
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Method::GET, uri, None, None).await
}

async fn put(app: &Router, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
    send(app, Method::PUT, uri, Some(token), Some(body)).await
}

async fn login(app: &Router, site_id: &str, password: &str) -> (StatusCode, Value) {
    send(
        app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "site_id": site_id, "password": password })),
    )
    .await
}

async fn token(app: &Router) -> String {
    let (status, body) = login(app, "acme", PASSWORD).await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_login_scenario() {
    let (_dir, app) = test_app().await;

    let (status, _) = login(&app, "acme", "wrong").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = login(&app, "acme", PASSWORD).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["site_id"], "acme");
    assert!(!body["token"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_login_failures_look_identical() {
    let (_dir, app) = test_app().await;

    let wrong_password = login(&app, "acme", "wrong").await;
    let unknown_site = login(&app, "ghost", PASSWORD).await;
    assert_eq!(wrong_password.0, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password, unknown_site);
}

#[tokio::test]
async fn test_configured_sites_are_provisioned() {
    let (_dir, app) = test_app().await;

    let (status, body) = get(&app, "/api/sites/jw-cafe").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["business_name"], "Jw Cafe");
    assert_eq!(body["hours"].as_object().unwrap().len(), 7);

    let (status, body) = get(&app, "/api/sites").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_unknown_site_is_not_found() {
    let (_dir, app) = test_app().await;

    let (status, _) = get(&app, "/api/sites/ghost").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = get(&app, "/api/sites/ghost/hours").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = get(&app, "/api/sites/acme/gallery").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_whole_document_round_trip() {
    let (_dir, app) = test_app().await;
    let token = token(&app).await;

    let document = json!({
        "site_id": "acme",
        "business_name": "Acme Jewelers",
        "tagline": "Since 1952",
        "phone": "555-0100",
        "email": null,
        "address": "1 Main St",
        "hours": {
            "monday": "10am - 6pm", "tuesday": "10am - 6pm", "wednesday": "10am - 6pm",
            "thursday": "10am - 8pm", "friday": "10am - 8pm", "saturday": "9am - 5pm",
            "sunday": "Closed"
        },
        "services": [
            {
                "id": "svc-1",
                "title": "Ring sizing",
                "description": "",
                "price": "Starting at $40"
            },
            { "id": "svc-2", "title": "Appraisal", "description": "Certified", "price": null }
        ],
        "staff": [{ "id": "staff-1", "name": "Ann", "role": "Owner", "bio": null }],
        "menu_items": [],
        "promotions": [
            { "id": "promo-1", "title": "Sale", "description": "20% off", "active": false }
        ]
    });

    let (status, body) = put(&app, "/api/admin/acme", &token, document.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "saved");

    let (status, body) = get(&app, "/api/sites/acme").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, document);
}

#[tokio::test]
async fn test_token_is_bound_to_its_site() {
    let (_dir, app) = test_app().await;
    let token = token(&app).await;
    let document = json!({ "business_name": "Hijacked" });

    let (status, _) = put(&app, "/api/admin/jw-cafe", &token, document.clone()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        Method::PUT,
        "/api/admin/acme",
        None,
        Some(document.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = put(&app, "/api/admin/acme", "bogus", document).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (_, body) = get(&app, "/api/sites/jw-cafe").await;
    assert_eq!(body["business_name"], "Jw Cafe");
}

#[tokio::test]
async fn test_bearer_header_is_accepted() {
    let (_dir, app) = test_app().await;
    let token = token(&app).await;

    let request = Request::builder()
        .method(Method::PUT)
        .uri("/api/admin/acme/hours")
        .header("Authorization", format!("Bearer {}", token))
        .header("content-type", "application/json")
        .body(Body::from(json!({ "monday": "9-5" }).to_string()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_missing_weekdays_read_back_empty() {
    let (_dir, app) = test_app().await;
    let token = token(&app).await;

    let (status, _) = put(
        &app,
        "/api/admin/acme/hours",
        &token,
        json!({ "monday": "9am - 5pm", "friday": "9am - 9pm" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, hours) = get(&app, "/api/sites/acme/hours").await;
    assert_eq!(
        hours,
        json!({
            "monday": "9am - 5pm", "tuesday": "", "wednesday": "", "thursday": "",
            "friday": "9am - 9pm", "saturday": "", "sunday": ""
        })
    );
}

#[tokio::test]
async fn test_promotions_scenario() {
    let (_dir, app) = test_app().await;
    let token = token(&app).await;

    let (status, _) = put(
        &app,
        "/api/admin/acme/promotions",
        &token,
        json!([{ "title": "Sale", "description": "20% off", "active": true }]),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, promos) = get(&app, "/api/sites/acme/promotions").await;
    assert_eq!(status, StatusCode::OK);
    let promos = promos.as_array().unwrap();
    assert_eq!(promos.len(), 1);
    assert_eq!(promos[0]["title"], "Sale");
    assert_eq!(promos[0]["description"], "20% off");
    assert_eq!(promos[0]["active"], true);
    assert!(!promos[0]["id"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_promotion_without_active_flag_is_active() {
    let (_dir, app) = test_app().await;
    let token = token(&app).await;

    let (status, _) = put(
        &app,
        "/api/admin/acme/promotions",
        &token,
        json!([
            { "title": "Spring", "description": "10% off" },
            { "title": "Winter", "description": "Gone", "active": false }
        ]),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, promos) = get(&app, "/api/sites/acme/promotions").await;
    assert_eq!(promos[0]["active"], true);
    assert_eq!(promos[1]["active"], false);
}

#[tokio::test]
async fn test_section_put_changes_only_that_section() {
    let (_dir, app) = test_app().await;
    let token = token(&app).await;

    let (status, _) = put(
        &app,
        "/api/admin/acme",
        &token,
        json!({
            "business_name": "Acme",
            "services": [{ "title": "Cleaning", "description": "Ultrasonic" }],
            "staff": [{ "name": "Ann", "role": "Owner" }]
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (_, before) = get(&app, "/api/sites/acme").await;

    let (status, _) = put(
        &app,
        "/api/admin/acme/menu",
        &token,
        json!([{ "name": "Espresso", "price": "$3", "category": "Coffee" }]),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, after) = get(&app, "/api/sites/acme").await;
    let untouched = [
        "site_id",
        "business_name",
        "hours",
        "services",
        "staff",
        "promotions",
        "tagline",
    ];
    for key in untouched {
        assert_eq!(after[key], before[key], "{} changed", key);
    }
    assert_eq!(after["menu_items"][0]["name"], "Espresso");

    let (_, menu) = get(&app, "/api/sites/acme/menu").await;
    assert_eq!(menu, after["menu_items"]);
}

#[tokio::test]
async fn test_invalid_payloads_are_rejected() {
    let (_dir, app) = test_app().await;
    let token = token(&app).await;

    let nameless = json!({ "tagline": "no name" });
    let (status, _) = put(&app, "/api/admin/acme", &token, nameless).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let blank_name = json!({ "business_name": " " });
    let (status, _) = put(&app, "/api/admin/acme", &token, blank_name).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let wrong_shape = json!({ "monday": "x" });
    let (status, _) = put(&app, "/api/admin/acme/services", &token, wrong_shape).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = get(&app, "/api/sites/acme").await;
    assert_eq!(body["business_name"], "Acme");
}

#[tokio::test]
async fn test_valid_token_for_missing_document_is_not_found() {
    let dir = tempdir().unwrap();
    let mut config = CmsServerConfig::with_base_dir(dir.path());
    config.bcrypt_cost = 4;
    let store = Arc::new(JsonContentStore::new(&config).await.unwrap());

    // The gate knows "ghost" but the store never provisioned it.
    config.site_passwords.insert("ghost".into(), "boo".into());
    let auth = Arc::new(AuthGate::new(&config).await.unwrap());
    let token = auth.login("ghost", "boo").await.unwrap();
    let app = app(AppState {
        config,
        store,
        auth,
    });

    let document = json!({ "business_name": "Ghost" });
    let (status, _) = put(&app, "/api/admin/ghost", &token, document).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = put(&app, "/api/admin/ghost/hours", &token, json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

fn provision_request() -> Value {
    json!({
        "site_id": "fritz-salon",
        "business_name": "Fritz Salon",
        "password": "scissors"
    })
}

async fn provision(app: &Router, master: &str) -> (StatusCode, Value) {
    send(
        app,
        Method::POST,
        "/api/admin/sites",
        Some(master),
        Some(provision_request()),
    )
    .await
}

#[tokio::test]
async fn test_provisioning_flow() {
    let (_dir, app) = test_app().await;

    let (status, _) = provision(&app, "wrong").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = provision(&app, "master").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["site_id"], "fritz-salon");

    let (status, _) = provision(&app, "master").await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = login(&app, "fritz-salon", "scissors").await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap();

    let (status, _) = put(
        &app,
        "/api/admin/fritz-salon/staff",
        token,
        json!([{ "name": "Fritz", "role": "Stylist", "bio": "20 years" }]),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, staff) = get(&app, "/api/sites/fritz-salon/staff").await;
    assert_eq!(staff[0]["name"], "Fritz");
}

#[tokio::test]
async fn test_provisioning_can_be_retried_after_credential_write_fails() {
    let (dir, app) = test_app().await;

    // A non-empty directory where the credential file belongs makes the rename fail.
    let blocker = dir.path().join("credentials.json");
    std::fs::create_dir_all(blocker.join("occupied")).unwrap();

    let (status, _) = provision(&app, "master").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let (status, _) = get(&app, "/api/sites/fritz-salon").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(!dir.path().join("sites").join("fritz-salon.json").exists());

    std::fs::remove_dir_all(&blocker).unwrap();

    let (status, _) = provision(&app, "master").await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = login(&app, "fritz-salon", "scissors").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_health() {
    let (_dir, app) = test_app().await;
    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}
