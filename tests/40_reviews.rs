mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::{json, Value};

use common::{id_of, TestApp};

fn review(title: &str, rating: i64) -> Value {
    json!({ "title": title, "text": "Worth the money", "rating": rating })
}

#[tokio::test]
async fn average_rating_follows_review_writes() -> Result<()> {
    let app = TestApp::new()?;
    let owner = app.register("Owner", "owner@gmail.com", "publisher").await?;
    let alice = app.register("Alice", "alice@gmail.com", "user").await?;
    let bob = app.register("Bob", "bob@gmail.com", "user").await?;
    let bootcamp_id = id_of(&app.create_bootcamp(&owner, "Devworks Bootcamp").await?);
    let uri = format!("/api/v1/bootcamps/{}/reviews", bootcamp_id);

    let res = app.post(&uri, Some(&alice), review("Great", 8)).await?;
    assert_eq!(res.status, StatusCode::CREATED, "unexpected: {}", res.body);
    let alice_review = id_of(res.data());
    let res = app.post(&uri, Some(&bob), review("Okay", 5)).await?;
    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(app.bootcamp(&bootcamp_id).await?["averageRating"], json!(6.5));

    let res = app.delete(&format!("/api/v1/reviews/{}", alice_review), &alice).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(app.bootcamp(&bootcamp_id).await?["averageRating"], json!(5.0));

    let res = app.get(&uri).await?;
    assert_eq!(res.body["count"], 1);
    assert_eq!(res.data()[0]["title"], "Okay");
    Ok(())
}

#[tokio::test]
async fn one_review_per_user_per_bootcamp() -> Result<()> {
    let app = TestApp::new()?;
    let owner = app.register("Owner", "owner@gmail.com", "publisher").await?;
    let alice = app.register("Alice", "alice@gmail.com", "user").await?;
    let bootcamp_id = id_of(&app.create_bootcamp(&owner, "Devworks Bootcamp").await?);
    let uri = format!("/api/v1/bootcamps/{}/reviews", bootcamp_id);

    assert_eq!(app.post(&uri, Some(&alice), review("First", 9)).await?.status, StatusCode::CREATED);

    let res = app.post(&uri, Some(&alice), review("Second", 1)).await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.error(), "Duplicate field value entered");
    assert_eq!(app.bootcamp(&bootcamp_id).await?["averageRating"], json!(9.0));
    Ok(())
}

#[tokio::test]
async fn review_access_rules() -> Result<()> {
    let app = TestApp::new()?;
    let owner = app.register("Owner", "owner@gmail.com", "publisher").await?;
    let alice = app.register("Alice", "alice@gmail.com", "user").await?;
    let bob = app.register("Bob", "bob@gmail.com", "user").await?;
    let admin = app.admin("admin@gmail.com").await?;
    let bootcamp_id = id_of(&app.create_bootcamp(&owner, "Devworks Bootcamp").await?);
    let uri = format!("/api/v1/bootcamps/{}/reviews", bootcamp_id);

    // Publishers do not review
    let res = app.post(&uri, Some(&owner), review("Mine is best", 10)).await?;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    let res = app.post(&uri, Some(&alice), review("Too high", 11)).await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.error(), "Please add a rating between 1 and 10");

    let res = app.post(&uri, Some(&alice), review("Good", 7)).await?;
    let review_uri = format!("/api/v1/reviews/{}", id_of(res.data()));

    let res = app.put(&review_uri, &bob, json!({ "rating": 1 })).await?;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    let res = app.put(&review_uri, &alice, json!({ "rating": 9 })).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.data()["rating"], 9);
    assert_eq!(res.data()["title"], "Good");
    assert_eq!(app.bootcamp(&bootcamp_id).await?["averageRating"], json!(9.0));

    let res = app.get(&review_uri).await?;
    assert_eq!(res.data()["bootcamp"]["name"], "Devworks Bootcamp");

    let res = app.delete(&review_uri, &admin).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert!(app.bootcamp(&bootcamp_id).await?["averageRating"].is_null());
    Ok(())
}

#[tokio::test]
async fn reviews_need_an_existing_bootcamp() -> Result<()> {
    let app = TestApp::new()?;
    let alice = app.register("Alice", "alice@gmail.com", "user").await?;
    let missing = uuid::Uuid::new_v4().to_string();

    let res = app
        .post(&format!("/api/v1/bootcamps/{}/reviews", missing), Some(&alice), review("Ghost", 3))
        .await?;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    Ok(())
}
