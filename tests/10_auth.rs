mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use anyhow::Result;
use axum::http::{Method, StatusCode};
use serde_json::json;

use common::{FaultyStore, TestApp, PASSWORD};

#[tokio::test]
async fn health_and_root_respond() -> Result<()> {
    let app = TestApp::new()?;

    let res = app.get("/health").await?;
    assert_eq!(res.status, StatusCode::OK, "unexpected: {}", res.body);
    assert_eq!(res.data()["status"], "ok");

    let res = app.get("/").await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.data()["name"], "DevCamper API");
    Ok(())
}

#[tokio::test]
async fn register_then_me() -> Result<()> {
    let app = TestApp::new()?;
    let token = app.register("John Doe", "John@Gmail.com", "publisher").await?;

    let res = app.send(Method::GET, "/api/v1/auth/me", Some(&token), None).await?;
    assert_eq!(res.status, StatusCode::OK, "unexpected: {}", res.body);
    assert_eq!(res.body["success"], true);
    assert_eq!(res.data()["email"], "john@gmail.com");
    assert_eq!(res.data()["role"], "publisher");
    assert!(res.data().get("password").is_none(), "password leaked: {}", res.body);
    Ok(())
}

#[tokio::test]
async fn login_checks_credentials() -> Result<()> {
    let app = TestApp::new()?;
    app.register("Jane", "jane@gmail.com", "user").await?;

    let res = app
        .post("/api/v1/auth/login", None, json!({ "email": "jane@gmail.com", "password": PASSWORD }))
        .await?;
    assert_eq!(res.status, StatusCode::OK);
    assert!(res.body["token"].as_str().is_some());

    let res = app
        .post("/api/v1/auth/login", None, json!({ "email": "jane@gmail.com", "password": "wrong-one" }))
        .await?;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.body, json!({ "status": false, "error": "Invalid credentials" }));

    let res = app
        .post("/api/v1/auth/login", None, json!({ "email": "nobody@gmail.com", "password": PASSWORD }))
        .await?;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);

    let res = app.post("/api/v1/auth/login", None, json!({ "email": "jane@gmail.com" })).await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.error(), "Please provide an email and password");
    Ok(())
}

#[tokio::test]
async fn registration_rules() -> Result<()> {
    let app = TestApp::new()?;

    let res = app
        .post(
            "/api/v1/auth/register",
            None,
            json!({ "name": "Mallory", "email": "mallory@gmail.com", "password": PASSWORD, "role": "admin" }),
        )
        .await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.error(), "Please choose a role of user or publisher");

    let res = app
        .post("/api/v1/auth/register", None, json!({ "email": "not-an-email", "password": "123" }))
        .await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        res.error(),
        "Please add a name, Please add a valid email, Password must be at least 6 characters"
    );

    app.register("First", "dup@gmail.com", "user").await?;
    let res = app
        .post(
            "/api/v1/auth/register",
            None,
            json!({ "name": "Second", "email": "DUP@gmail.com", "password": PASSWORD }),
        )
        .await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.error(), "Duplicate field value entered");
    Ok(())
}

#[tokio::test]
async fn protected_routes_need_a_valid_token() -> Result<()> {
    let app = TestApp::new()?;

    let res = app.send(Method::GET, "/api/v1/auth/me", None, None).await?;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.body, json!({ "status": false, "error": "Not authorized to access this route" }));

    let res = app.send(Method::GET, "/api/v1/auth/me", Some("garbage"), None).await?;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);

    let res = app.post("/api/v1/bootcamps", None, common::bootcamp_body("Devworks")).await?;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() -> Result<()> {
    let app = TestApp::new()?;
    let request = axum::http::Request::builder()
        .method(Method::POST)
        .uri("/api/v1/auth/register")
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{not json"))?;

    let res = app.dispatch(request).await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["status"], false);
    Ok(())
}

#[tokio::test]
async fn store_outage_during_auth_is_a_server_error() -> Result<()> {
    let store = Arc::new(FaultyStore::default());
    let app = TestApp::with_store(store.clone())?;
    let token = app.register("John Doe", "john@gmail.com", "user").await?;

    store.fail_user_lookups.store(true, Ordering::SeqCst);
    let res = app.send(Method::GET, "/api/v1/auth/me", Some(&token), None).await?;
    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.body, json!({ "status": false, "error": "Server Error" }));

    store.fail_user_lookups.store(false, Ordering::SeqCst);
    let res = app.send(Method::GET, "/api/v1/auth/me", Some(&token), None).await?;
    assert_eq!(res.status, StatusCode::OK);
    Ok(())
}
