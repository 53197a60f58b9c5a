mod common;

use anyhow::Result;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};

use common::{id_of, TestApp, TestResponse};

const BOUNDARY: &str = "devcamper-test-boundary";

fn multipart(field: &str, file_name: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
    let mut body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n",
        b = BOUNDARY
    )
    .into_bytes();
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

async fn upload(app: &TestApp, bootcamp_id: &str, token: &str, body: Vec<u8>) -> Result<TestResponse> {
    let request = Request::builder()
        .method(Method::PUT)
        .uri(format!("/api/v1/bootcamps/{}/photo", bootcamp_id))
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={}", BOUNDARY))
        .body(Body::from(body))?;
    app.dispatch(request).await
}

#[tokio::test]
async fn image_is_stored_under_the_bootcamp_id() -> Result<()> {
    let app = TestApp::new()?;
    let owner = app.register("Owner", "owner@gmail.com", "publisher").await?;
    let bootcamp_id = id_of(&app.create_bootcamp(&owner, "Devworks Bootcamp").await?);

    let res = upload(&app, &bootcamp_id, &owner, multipart("file", "Campus.JPG", "image/jpeg", b"\xff\xd8\xff\xe0jpeg")).await?;
    assert_eq!(res.status, StatusCode::OK, "unexpected: {}", res.body);

    let expected = format!("photo_{}.jpg", bootcamp_id);
    assert_eq!(res.data(), expected.as_str());
    assert_eq!(app.bootcamp(&bootcamp_id).await?["photo"], expected.as_str());
    assert_eq!(std::fs::read(app.upload_dir().join(&expected))?, b"\xff\xd8\xff\xe0jpeg");
    Ok(())
}

#[tokio::test]
async fn non_image_is_rejected_without_mutation() -> Result<()> {
    let app = TestApp::new()?;
    let owner = app.register("Owner", "owner@gmail.com", "publisher").await?;
    let bootcamp_id = id_of(&app.create_bootcamp(&owner, "Devworks Bootcamp").await?);

    let res = upload(&app, &bootcamp_id, &owner, multipart("file", "notes.txt", "text/plain", b"hello")).await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.error(), "Please upload an image file");

    assert_eq!(app.bootcamp(&bootcamp_id).await?["photo"], "no-photo.jpg");
    assert_eq!(std::fs::read_dir(app.upload_dir())?.count(), 0);
    Ok(())
}

#[tokio::test]
async fn missing_file_field_and_oversized_image() -> Result<()> {
    let app = TestApp::new()?;
    let owner = app.register("Owner", "owner@gmail.com", "publisher").await?;
    let bootcamp_id = id_of(&app.create_bootcamp(&owner, "Devworks Bootcamp").await?);

    let res = upload(&app, &bootcamp_id, &owner, multipart("avatar", "me.png", "image/png", b"png")).await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.error(), "Please upload a file");

    let max = app.state.config.upload.max_file_upload;
    let res = upload(&app, &bootcamp_id, &owner, multipart("file", "big.png", "image/png", &vec![0u8; max + 1])).await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.error(), format!("Please upload an image less than {} bytes", max));

    assert_eq!(app.bootcamp(&bootcamp_id).await?["photo"], "no-photo.jpg");
    Ok(())
}

#[tokio::test]
async fn only_the_owner_uploads() -> Result<()> {
    let app = TestApp::new()?;
    let owner = app.register("Owner", "owner@gmail.com", "publisher").await?;
    let other = app.register("Other", "other@gmail.com", "publisher").await?;
    let bootcamp_id = id_of(&app.create_bootcamp(&owner, "Devworks Bootcamp").await?);

    let res = upload(&app, &bootcamp_id, &other, multipart("file", "me.png", "image/png", b"png")).await?;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
    Ok(())
}
