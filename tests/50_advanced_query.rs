mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::{json, Value};

use common::{id_of, TestApp};

fn tuitions(page: &Value) -> Vec<f64> {
    page["data"]
        .as_array()
        .map(|docs| docs.iter().filter_map(|d| d["tuition"].as_f64()).collect())
        .unwrap_or_default()
}

/// One bootcamp with courses costing 500, 600, ... 2000
async fn catalog(app: &TestApp) -> Result<String> {
    let owner = app.register("Owner", "owner@gmail.com", "publisher").await?;
    let bootcamp_id = id_of(&app.create_bootcamp(&owner, "Devworks Bootcamp").await?);
    for step in 5..=20 {
        let tuition = f64::from(step * 100);
        app.create_course(&owner, &bootcamp_id, &format!("Course {}", step), tuition).await?;
    }
    Ok(bootcamp_id)
}

#[tokio::test]
async fn filter_sort_and_second_page() -> Result<()> {
    let app = TestApp::new()?;
    catalog(&app).await?;

    let res = app
        .get("/api/v1/courses?tuition%5Bgte%5D=1000&sort=-tuition&page=2&limit=5")
        .await?;
    assert_eq!(res.status, StatusCode::OK, "unexpected: {}", res.body);
    assert_eq!(res.body["success"], true);
    assert_eq!(res.body["total"], 11);
    assert_eq!(res.body["count"], 5);
    assert_eq!(tuitions(&res.body), vec![1500.0, 1400.0, 1300.0, 1200.0, 1100.0]);
    assert_eq!(res.body["pagination"]["prev"], json!({ "page": 1, "limit": 5 }));
    assert_eq!(res.body["pagination"]["next"], json!({ "page": 3, "limit": 5 }));

    let res = app
        .get("/api/v1/courses?tuition%5Bgte%5D=1000&sort=-tuition&page=3&limit=5")
        .await?;
    assert_eq!(tuitions(&res.body), vec![1000.0]);
    assert!(res.body["pagination"].get("next").is_none());
    Ok(())
}

#[tokio::test]
async fn ranges_and_membership() -> Result<()> {
    let app = TestApp::new()?;
    catalog(&app).await?;

    let res = app.get("/api/v1/courses?tuition%5Bgt%5D=600&tuition%5Blte%5D=900&sort=tuition").await?;
    assert_eq!(tuitions(&res.body), vec![700.0, 800.0, 900.0]);

    let res = app.get("/api/v1/courses?tuition%5Bin%5D=500,2000&sort=tuition").await?;
    assert_eq!(tuitions(&res.body), vec![500.0, 2000.0]);

    let res = app.get("/api/v1/courses?tuition%5Blt%5D=500").await?;
    assert_eq!(res.body["total"], 0);
    assert_eq!(res.body["pagination"], json!({}));
    Ok(())
}

#[tokio::test]
async fn default_page_size_and_newest_first() -> Result<()> {
    let app = TestApp::new()?;
    catalog(&app).await?;

    let res = app.get("/api/v1/courses").await?;
    assert_eq!(res.body["count"], 16);
    assert_eq!(res.data()[0]["title"], "Course 20");
    assert!(res.body["pagination"].get("prev").is_none());
    Ok(())
}

#[tokio::test]
async fn select_projects_fields_and_keeps_population() -> Result<()> {
    let app = TestApp::new()?;
    let owner = app.register("Owner", "owner@gmail.com", "publisher").await?;
    let bootcamp_id = id_of(&app.create_bootcamp(&owner, "Devworks Bootcamp").await?);
    app.create_course(&owner, &bootcamp_id, "Front End", 950.0).await?;

    let res = app.get("/api/v1/bootcamps?select=name,housing&careers=Business").await?;
    assert_eq!(res.status, StatusCode::OK, "unexpected: {}", res.body);
    let doc = &res.data()[0];
    assert_eq!(doc["name"], "Devworks Bootcamp");
    assert_eq!(doc["housing"], true);
    assert!(doc.get("description").is_none());
    assert_eq!(doc["courses"][0]["title"], "Front End");

    let res = app.get("/api/v1/bootcamps?careers=Data%20Science").await?;
    assert_eq!(res.body["total"], 0);
    Ok(())
}

#[tokio::test]
async fn bad_query_parameters_are_rejected() -> Result<()> {
    let app = TestApp::new()?;

    for uri in [
        "/api/v1/courses?price=10",
        "/api/v1/courses?sort=-price",
        "/api/v1/courses?select=title,secret",
        "/api/v1/courses?page=0",
        "/api/v1/courses?limit=abc",
        "/api/v1/courses?tuition%5Bne%5D=5",
    ] {
        let res = app.get(uri).await?;
        assert_eq!(res.status, StatusCode::BAD_REQUEST, "{} -> {}", uri, res.body);
        assert_eq!(res.body["status"], false);
    }
    Ok(())
}

#[tokio::test]
async fn page_beyond_any_row_offset_is_rejected() -> Result<()> {
    let app = TestApp::new()?;
    catalog(&app).await?;

    let res = app.get("/api/v1/courses?page=18446744073709551615&limit=25").await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST, "unexpected: {}", res.body);
    assert_eq!(res.body["status"], false);

    let res = app.get("/api/v1/courses?page=1000&limit=5").await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["count"], 0);
    assert_eq!(res.body["pagination"]["prev"], json!({ "page": 999, "limit": 5 }));
    Ok(())
}

#[tokio::test]
async fn values_follow_the_field_type() -> Result<()> {
    let app = TestApp::new()?;
    let owner = app.register("Owner", "owner@gmail.com", "publisher").await?;
    let bootcamp_id = id_of(&app.create_bootcamp(&owner, "Devworks Bootcamp").await?);
    app.create_course(&owner, &bootcamp_id, "2024", 950.0).await?;
    app.create_course(&owner, &bootcamp_id, "Front End", 1200.0).await?;

    // Numeric-looking text still matches a text field
    let res = app.get("/api/v1/courses?title=2024").await?;
    assert_eq!(res.status, StatusCode::OK, "unexpected: {}", res.body);
    assert_eq!(res.body["total"], 1);
    assert_eq!(res.data()[0]["title"], "2024");

    let res = app.get("/api/v1/courses?createdAt%5Bgt%5D=2000-01-01").await?;
    assert_eq!(res.status, StatusCode::OK, "unexpected: {}", res.body);
    assert_eq!(res.body["total"], 2);

    let res = app.get("/api/v1/courses?createdAt%5Blt%5D=2000-01-01T00:00:00Z").await?;
    assert_eq!(res.body["total"], 0);

    for uri in [
        "/api/v1/courses?tuition=cheap",
        "/api/v1/courses?scholarshipsAvailable=yes",
        "/api/v1/courses?createdAt%5Bgt%5D=last-week",
    ] {
        let res = app.get(uri).await?;
        assert_eq!(res.status, StatusCode::BAD_REQUEST, "{} -> {}", uri, res.body);
    }
    Ok(())
}
