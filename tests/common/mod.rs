#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use devcamper_api::auth::hash_password;
use devcamper_api::config::AppConfig;
use devcamper_api::database::collection::{Collection, USERS};
use devcamper_api::database::models::User;
use devcamper_api::database::{MemoryStore, Store, StoreError};
use devcamper_api::filter::FilterData;
use devcamper_api::{app, AppState};

pub const PASSWORD: &str = "123456";

/// The full router over a fresh memory store and a throwaway upload dir
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    uploads: TempDir,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestResponse {
    pub fn data(&self) -> &Value {
        &self.body["data"]
    }

    pub fn error(&self) -> &str {
        self.body["error"].as_str().unwrap_or_default()
    }
}

/// Memory store whose averages and user lookups can be switched to fail
#[derive(Default)]
pub struct FaultyStore {
    inner: MemoryStore,
    pub fail_averages: AtomicBool,
    pub fail_user_lookups: AtomicBool,
}

impl FaultyStore {
    fn outage() -> StoreError {
        StoreError::Corrupt("store offline".to_string())
    }
}

#[async_trait]
impl Store for FaultyStore {
    async fn insert(&self, collection: &Collection, doc: Map<String, Value>) -> Result<Value, StoreError> {
        self.inner.insert(collection, doc).await
    }

    async fn find(&self, collection: &Collection, filter: FilterData) -> Result<Vec<Value>, StoreError> {
        self.inner.find(collection, filter).await
    }

    async fn find_by_id(&self, collection: &Collection, id: &str) -> Result<Option<Value>, StoreError> {
        if collection.name == USERS.name && self.fail_user_lookups.load(Ordering::SeqCst) {
            return Err(Self::outage());
        }
        self.inner.find_by_id(collection, id).await
    }

    async fn count(&self, collection: &Collection, filter: FilterData) -> Result<u64, StoreError> {
        self.inner.count(collection, filter).await
    }

    async fn update(&self, collection: &Collection, id: &str, patch: Map<String, Value>) -> Result<Option<Value>, StoreError> {
        self.inner.update(collection, id, patch).await
    }

    async fn delete(&self, collection: &Collection, id: &str) -> Result<Option<Value>, StoreError> {
        self.inner.delete(collection, id).await
    }

    async fn delete_all(&self, collection: &Collection) -> Result<u64, StoreError> {
        self.inner.delete_all(collection).await
    }

    async fn average(&self, collection: &Collection, field: &str, filter: FilterData) -> Result<Option<f64>, StoreError> {
        if self.fail_averages.load(Ordering::SeqCst) {
            return Err(Self::outage());
        }
        self.inner.average(collection, field, filter).await
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        self.inner.health_check().await
    }
}

impl TestApp {
    pub fn new() -> Result<Self> {
        Self::with_store(Arc::new(MemoryStore::new()))
    }

    pub fn with_store(store: Arc<dyn Store>) -> Result<Self> {
        let uploads = TempDir::new()?;
        let config = AppConfig::testing(uploads.path());
        let state = AppState::new(config, store);
        Ok(Self {
            router: app(state.clone()),
            state,
            uploads,
        })
    }

    pub fn upload_dir(&self) -> &Path {
        self.uploads.path()
    }

    pub async fn dispatch(&self, request: Request<Body>) -> Result<TestResponse> {
        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        Ok(TestResponse { status, body })
    }

    pub async fn send(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Result<TestResponse> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))?,
            None => builder.body(Body::empty())?,
        };
        self.dispatch(request).await
    }

    pub async fn get(&self, uri: &str) -> Result<TestResponse> {
        self.send(Method::GET, uri, None, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> Result<TestResponse> {
        self.send(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Value) -> Result<TestResponse> {
        self.send(Method::PUT, uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> Result<TestResponse> {
        self.send(Method::DELETE, uri, Some(token), None).await
    }

    /// Register through the API and return the issued token
    pub async fn register(&self, name: &str, email: &str, role: &str) -> Result<String> {
        let res = self
            .post(
                "/api/v1/auth/register",
                None,
                json!({ "name": name, "email": email, "password": PASSWORD, "role": role }),
            )
            .await?;
        anyhow::ensure!(res.status == StatusCode::OK, "register failed: {} {}", res.status, res.body);
        token_of(&res)
    }

    /// Admins cannot self-register, so they are written straight to the store
    pub async fn admin(&self, email: &str) -> Result<String> {
        let mut doc = Map::new();
        doc.insert("name".into(), json!("Admin"));
        doc.insert("email".into(), json!(email));
        doc.insert("role".into(), json!("admin"));
        doc.insert("password".into(), json!(hash_password(&self.state.config.security, PASSWORD)?));
        self.state.repository::<User>().create(doc).await?;

        let res = self
            .post("/api/v1/auth/login", None, json!({ "email": email, "password": PASSWORD }))
            .await?;
        token_of(&res)
    }

    pub async fn create_bootcamp(&self, token: &str, name: &str) -> Result<Value> {
        let res = self.post("/api/v1/bootcamps", Some(token), bootcamp_body(name)).await?;
        anyhow::ensure!(res.status == StatusCode::CREATED, "bootcamp create failed: {} {}", res.status, res.body);
        Ok(res.data().clone())
    }

    pub async fn create_course(&self, token: &str, bootcamp_id: &str, title: &str, tuition: f64) -> Result<Value> {
        let res = self
            .post(
                &format!("/api/v1/bootcamps/{}/courses", bootcamp_id),
                Some(token),
                course_body(title, tuition),
            )
            .await?;
        anyhow::ensure!(res.status == StatusCode::CREATED, "course create failed: {} {}", res.status, res.body);
        Ok(res.data().clone())
    }

    pub async fn bootcamp(&self, id: &str) -> Result<Value> {
        let res = self.get(&format!("/api/v1/bootcamps/{}", id)).await?;
        anyhow::ensure!(res.status == StatusCode::OK, "bootcamp fetch failed: {} {}", res.status, res.body);
        Ok(res.data().clone())
    }
}

pub fn token_of(res: &TestResponse) -> Result<String> {
    res.body["token"]
        .as_str()
        .map(str::to_string)
        .with_context(|| format!("no token in {}", res.body))
}

pub fn id_of(doc: &Value) -> String {
    doc["id"].as_str().unwrap_or_default().to_string()
}

pub fn bootcamp_body(name: &str) -> Value {
    json!({
        "name": name,
        "description": "Full stack web development with a focus on JavaScript",
        "website": "https://devworks.com",
        "phone": "(111) 111-1111",
        "email": "enroll@devworks.com",
        "address": "233 Bay State Rd Boston MA 02215",
        "careers": ["Web Development", "UI/UX", "Business"],
        "housing": true,
        "jobAssistance": true
    })
}

pub fn course_body(title: &str, tuition: f64) -> Value {
    json!({
        "title": title,
        "description": "Learn the fundamentals",
        "weeks": 8,
        "tuition": tuition,
        "minimumSkill": "beginner",
        "scholarshipsAvailable": true
    })
}
