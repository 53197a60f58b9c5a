use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, State},
    http::{HeaderValue, StatusCode},
    middleware::from_fn_with_state,
    response::{IntoResponse, Json},
    routing::{get, post, put},
    Router,
};
use serde_json::{json, Value};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::config::{AppConfig, StoreBackend};
use crate::database::models::Model;
use crate::database::{DatabaseManager, MemoryStore, PgStore, Repository, Store, StoreError};
use crate::handlers::{auth, bootcamps, courses, reviews};
use crate::middleware::protect;
use crate::observer::ObserverPipeline;
use crate::services::file_storage::{FileStorage, LocalBackend};

/// Shared handles every request needs
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub pipeline: Arc<ObserverPipeline>,
    pub config: Arc<AppConfig>,
    pub files: Arc<dyn FileStorage>,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn Store>) -> Self {
        let pipeline = Arc::new(ObserverPipeline::standard(&config));
        let files: Arc<dyn FileStorage> = Arc::new(LocalBackend::new(config.upload.file_upload_path.clone()));
        Self {
            store,
            pipeline,
            config: Arc::new(config),
            files,
        }
    }

    /// State over the backend named in `config.database`
    pub async fn connect(config: AppConfig) -> Result<Self, StoreError> {
        let store: Arc<dyn Store> = match config.database.backend {
            StoreBackend::Postgres => {
                let pool = DatabaseManager::connect(&config.database).await?;
                Arc::new(PgStore::new(pool, config.database.enable_query_logging))
            }
            StoreBackend::Memory => {
                tracing::warn!("Using the in-memory store; data is lost on exit");
                Arc::new(MemoryStore::new())
            }
        };
        Ok(Self::new(config, store))
    }

    pub fn repository<T: Model>(&self) -> Repository<T> {
        Repository::new(self.store.clone(), self.pipeline.clone())
    }
}

pub fn app(state: AppState) -> Router {
    let auth_layer = || from_fn_with_state(state.clone(), protect);
    let photo_limit = DefaultBodyLimit::max(state.config.upload.max_file_upload + 64 * 1024);

    let api = Router::new()
        // Bootcamps
        .route(
            "/bootcamps",
            get(bootcamps::list).merge(post(bootcamps::create).route_layer(auth_layer())),
        )
        .route(
            "/bootcamps/:id",
            get(bootcamps::show).merge(put(bootcamps::update).delete(bootcamps::remove).route_layer(auth_layer())),
        )
        .route(
            "/bootcamps/:id/photo",
            put(bootcamps::upload_photo).layer(photo_limit).route_layer(auth_layer()),
        )
        // Nested under a bootcamp
        .route(
            "/bootcamps/:id/courses",
            get(courses::list_for_bootcamp).merge(post(courses::create).route_layer(auth_layer())),
        )
        .route(
            "/bootcamps/:id/reviews",
            get(reviews::list_for_bootcamp).merge(post(reviews::create).route_layer(auth_layer())),
        )
        // Courses
        .route("/courses", get(courses::list))
        .route(
            "/courses/:id",
            get(courses::show).merge(put(courses::update).delete(courses::remove).route_layer(auth_layer())),
        )
        // Reviews
        .route("/reviews", get(reviews::list))
        .route(
            "/reviews/:id",
            get(reviews::show).merge(put(reviews::update).delete(reviews::remove).route_layer(auth_layer())),
        )
        // Auth
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::me).route_layer(auth_layer()));

    let cors = cors_layer(&state.config);
    let mut router = Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .nest("/api/v1", api);

    if state.config.security.enable_cors {
        router = router.layer(cors);
    }
    if state.config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }
    router.with_state(state)
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    if origins.is_empty() || config.security.cors_origins.iter().any(|o| o == "*") {
        CorsLayer::permissive()
    } else {
        CorsLayer::permissive().allow_origin(AllowOrigin::list(origins))
    }
}

async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "DevCamper API",
            "version": version,
            "description": "Bootcamp directory with courses, reviews and role-based access",
            "endpoints": {
                "bootcamps": "/api/v1/bootcamps[/:id] (public read, publisher/admin write)",
                "courses": "/api/v1/courses[/:id], /api/v1/bootcamps/:id/courses",
                "reviews": "/api/v1/reviews[/:id], /api/v1/bootcamps/:id/reviews",
                "auth": "/api/v1/auth/register, /api/v1/auth/login, /api/v1/auth/me",
            }
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.store.health_check().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": false,
                    "error": "database unavailable",
                    "data": {
                        "status": "degraded",
                        "timestamp": now
                    }
                })),
            )
        }
    }
}
