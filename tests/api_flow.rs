// End-to-end tests driving the full router with tower's oneshot

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use sheet_server::core::config::Config;
use sheet_server::core::routes::build_router;
use sheet_server::core::state::AppState;
use sheet_server::security::gate::AuthStrategy;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

const INDEX_PAGE: &str = "<html><body>sheets</body></html>";

fn create_app(strategy: AuthStrategy) -> (Router, TempDir) {
    let temp_dir = TempDir::new().unwrap();

    let mut config = Config::default();
    config.store.uri = temp_dir.path().join("sheets.wal").display().to_string();
    config.auth.strategy = strategy;
    config.auth.jwt_secret = "integration-jwt-secret".to_string();
    config.auth.session_secret = "integration-session-secret".to_string();
    config.auth.index_file = temp_dir.path().join("index.html");
    std::fs::write(&config.auth.index_file, INDEX_PAGE).unwrap();

    let state = Arc::new(AppState::new(config));
    (build_router(state), temp_dir)
}

fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, bytes.to_vec())
}

async fn send_json(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let (status, bytes) = send(app, request).await;
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn signup(app: &Router, username: &str, password: &str) -> StatusCode {
    let (status, _) = send(
        app,
        json_request(
            Method::POST,
            "/api/signup",
            json!({"username": username, "password": password}),
        ),
    )
    .await;
    status
}

#[tokio::test]
async fn test_end_to_end_sheet_flow() {
    let (app, _temp_dir) = create_app(AuthStrategy::Token);

    assert_eq!(signup(&app, "alice", "pw1").await, StatusCode::CREATED);

    let (status, body) = send_json(
        &app,
        json_request(
            Method::POST,
            "/api/login",
            json!({"username": "alice", "password": "pw1"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(body["token"].as_str().is_some_and(|token| !token.is_empty()));

    // Sheet routes are open, no Authorization header needed
    let (status, body) = send_json(
        &app,
        json_request(Method::POST, "/api/addSheet", json!({"sheetName": "Budget"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (status, body) = send_json(
        &app,
        json_request(Method::POST, "/api/setCollection", json!({"collection": "Budget"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Active collection set to Budget");

    let (status, body) = send_json(
        &app,
        json_request(
            Method::POST,
            "/api/saveTable",
            json!({"rows": 3, "columns": 3, "data": [{"row": 0, "col": 0, "value": "10"}]}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Table data saved successfully");

    let (status, body) = send_json(&app, get("/api/getTable")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "metadata": {"rows": 3, "columns": 3},
            "data": [{"row": 0, "col": 0, "value": "10"}]
        })
    );

    let (status, body) = send_json(&app, get("/api/getSheets")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"sheets": ["Budget"]}));
}

#[tokio::test]
async fn test_duplicate_signup_and_bad_login() {
    let (app, _temp_dir) = create_app(AuthStrategy::Token);

    assert_eq!(signup(&app, "alice", "pw1").await, StatusCode::CREATED);

    let (status, body) = send_json(
        &app,
        json_request(
            Method::POST,
            "/api/signup",
            json!({"username": "alice", "password": "pw2"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "User already exists");

    let (status, body) = send_json(
        &app,
        json_request(
            Method::POST,
            "/api/login",
            json!({"username": "alice", "password": "pw2"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Invalid credentials");
}

#[tokio::test]
async fn test_protected_route_requires_token() {
    let (app, _temp_dir) = create_app(AuthStrategy::Token);
    signup(&app, "alice", "pw1").await;

    let (status, body) = send_json(&app, get("/api/protected-route")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Access denied");

    let request = Request::builder()
        .uri("/api/protected-route")
        .header(header::AUTHORIZATION, "Bearer forged.token")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send_json(&app, request).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Invalid token");

    let (_, login) = send_json(
        &app,
        json_request(
            Method::POST,
            "/api/login",
            json!({"username": "alice", "password": "pw1"}),
        ),
    )
    .await;
    let token = login["token"].as_str().unwrap();

    let request = Request::builder()
        .uri("/api/index")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let (status, bytes) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bytes, INDEX_PAGE.as_bytes());
}

#[tokio::test]
async fn test_session_login_flow() {
    let (app, _temp_dir) = create_app(AuthStrategy::Session);
    signup(&app, "alice", "pw1").await;

    let (status, bytes) = send(&app, get("/api/index")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(bytes, b"Access denied. Please log in.");

    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/login",
            json!({"username": "alice", "password": "pw1"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/api/index");

    let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
    let session_pair = set_cookie.split(';').next().unwrap().to_string();

    let request = Request::builder()
        .uri("/api/index")
        .header(header::COOKIE, &session_pair)
        .body(Body::empty())
        .unwrap();
    let (status, bytes) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bytes, INDEX_PAGE.as_bytes());

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/logout")
        .header(header::COOKIE, &session_pair)
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);

    let request = Request::builder()
        .uri("/api/index")
        .header(header::COOKIE, &session_pair)
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_client_selections_are_isolated() {
    let (app, _temp_dir) = create_app(AuthStrategy::Token);

    let select = |client: &str, collection: &str| {
        Request::builder()
            .method(Method::POST)
            .uri("/api/setCollection")
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-client-id", client)
            .body(Body::from(json!({"collection": collection}).to_string()))
            .unwrap()
    };
    let save = |client: &str, value: &str| {
        Request::builder()
            .method(Method::POST)
            .uri("/api/saveTable")
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-client-id", client)
            .body(Body::from(
                json!({"rows": 1, "columns": 1, "data": [{"row": 0, "col": 0, "value": value}]})
                    .to_string(),
            ))
            .unwrap()
    };

    send(&app, select("tab-a", "Alpha")).await;
    send(&app, select("tab-b", "Beta")).await;
    send(&app, save("tab-a", "from a")).await;
    send(&app, save("tab-b", "from b")).await;

    let (_, alpha) = send_json(&app, get("/api/getTable?collection=Alpha")).await;
    assert_eq!(alpha["data"][0]["value"], "from a");

    let (_, beta) = send_json(&app, get("/api/getTable?collection=Beta")).await;
    assert_eq!(beta["data"][0]["value"], "from b");

    // A caller with no selection still reads the default collection
    let (_, default) = send_json(&app, get("/api/getTable")).await;
    assert_eq!(default, json!({"metadata": {"rows": 5, "columns": 5}, "data": []}));
}

#[tokio::test]
async fn test_delete_sheet() {
    let (app, _temp_dir) = create_app(AuthStrategy::Token);

    let (status, body) = send_json(
        &app,
        json_request(Method::DELETE, "/api/deleteSheet", json!({"sheetName": "Ghost"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Sheet not found!");

    let (status, _) = send_json(
        &app,
        json_request(Method::DELETE, "/api/deleteSheet", json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    send(
        &app,
        json_request(Method::POST, "/api/addSheet", json!({"sheetName": "Budget"})),
    )
    .await;
    send(
        &app,
        json_request(
            Method::POST,
            "/api/saveTable?collection=Budget",
            json!({"rows": 2, "columns": 2, "data": []}),
        ),
    )
    .await;

    let (status, body) = send_json(
        &app,
        json_request(Method::DELETE, "/api/deleteSheet", json!({"sheetName": "Budget"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Sheet \"Budget\" deleted.");

    let (_, sheets) = send_json(&app, get("/api/getSheets")).await;
    assert_eq!(sheets, json!({"sheets": []}));

    let (_, table) = send_json(&app, get("/api/getTable?collection=Budget")).await;
    assert_eq!(table["metadata"], json!({"rows": 5, "columns": 5}));
}

#[tokio::test]
async fn test_unknown_route_and_health() {
    let (app, _temp_dir) = create_app(AuthStrategy::Token);

    let (status, body) = send_json(&app, get("/api/nope")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);

    let (status, body) = send_json(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_missing_body_is_validation_error() {
    let (app, _temp_dir) = create_app(AuthStrategy::Token);

    for (method, uri) in [
        (Method::DELETE, "/api/deleteSheet"),
        (Method::POST, "/api/addSheet"),
    ] {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let (status, body) = send_json(&app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(body, json!({"success": false, "message": "Sheet name required!"}));
    }

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/setCollection")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send_json(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_malformed_body_uses_error_envelope() {
    let (app, _temp_dir) = create_app(AuthStrategy::Token);

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/addSheet")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send_json(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().is_some_and(|m| !m.is_empty()));

    let (status, body) = send_json(
        &app,
        json_request(Method::POST, "/api/saveTable", json!({"rows": "three"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    // Nothing was registered by the rejected request
    let (_, sheets) = send_json(&app, get("/api/getSheets")).await;
    assert_eq!(sheets, json!({"sheets": []}));
}
