// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use streamhub_accounts::config::Config;
use streamhub_accounts::db::{Database, FirestoreStore};
use streamhub_accounts::routes::create_router;
use streamhub_accounts::services::MediaService;
use streamhub_accounts::AppState;
use tower::ServiceExt;

pub const BOUNDARY: &str = "streamhub-test-boundary";

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Connect to the Firestore emulator.
#[allow(dead_code)]
pub async fn test_firestore() -> FirestoreStore {
    FirestoreStore::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a test app with offline mock dependencies.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let config = Config::test_default();
    let state = Arc::new(AppState::new(
        config,
        Database::in_memory(),
        MediaService::new_mock(),
    ));
    (create_router(state.clone()), state)
}

/// One part of a multipart body.
#[allow(dead_code)]
pub enum Part<'a> {
    Text(&'a str, &'a str),
    File(&'a str, &'a str, &'a [u8]),
}

/// Encode `parts` as a `multipart/form-data` body using [`BOUNDARY`].
#[allow(dead_code)]
pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name)
                        .as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File(name, file_name, bytes) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                         Content-Type: image/png\r\n\r\n",
                        name, file_name
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

/// Build a multipart request.
#[allow(dead_code)]
pub fn multipart_request(method: &str, uri: &str, parts: &[Part<'_>]) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

/// Build a JSON request, optionally with a bearer token.
#[allow(dead_code)]
pub fn json_request(method: &str, uri: &str, body: Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// Build a bodyless request, optionally with a bearer token.
#[allow(dead_code)]
pub fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// All `Set-Cookie` header values on a response.
#[allow(dead_code)]
pub fn set_cookies(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(str::to_string)
        .collect()
}

/// Register a user with an avatar through the API.
#[allow(dead_code)]
pub async fn register(app: &axum::Router, username: &str, email: &str, password: &str) -> Value {
    let response = app
        .clone()
        .oneshot(multipart_request(
            "POST",
            "/api/v1/users/register",
            &[
                Part::Text("fullName", "Test User"),
                Part::Text("email", email),
                Part::Text("username", username),
                Part::Text("password", password),
                Part::File("avatar", "avatar.png", b"\x89PNG fake avatar"),
            ],
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await
}

/// Log in by username and return the response body.
#[allow(dead_code)]
pub async fn login(app: &axum::Router, username: &str, password: &str) -> Value {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/users/login",
            serde_json::json!({ "username": username, "password": password }),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await
}

/// Register then log in; returns `(user_id, access_token, refresh_token)`.
#[allow(dead_code)]
pub async fn signed_in_user(app: &axum::Router, username: &str) -> (String, String, String) {
    let email = format!("{}@example.com", username);
    register(app, username, &email, "secret-pass").await;
    let body = login(app, username, "secret-pass").await;
    let data = &body["data"];
    (
        data["user"]["_id"].as_str().unwrap().to_string(),
        data["accessToken"].as_str().unwrap().to_string(),
        data["refreshToken"].as_str().unwrap().to_string(),
    )
}
