//! KYC Server
//!
//! HTTP CRUD service for identity-verification (KYC) records. Records live
//! in SQLite and are fronted by an in-memory cache that is snapshotted to a
//! JSON file, so restarts come up warm without reading the whole table.

mod config;
mod error;
mod handlers;
mod services;
mod storage;

use anyhow::{Context, Result};
use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::config::Settings;
use crate::services::KycService;
use crate::storage::{Database, KycCache};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<KycCache>,
    pub kyc_service: Arc<KycService>,
}

#[tokio::main]
async fn main() {
    // Set up panic hook to log crashes
    std::panic::set_hook(Box::new(|info| {
        let location = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()));
        let payload = if let Some(s) = info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };
        eprintln!("[PANIC] at {:?}: {}", location, payload);
        tracing::error!("PANIC at {:?}: {}", location, payload);
    }));

    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("[FATAL] Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize tracing; RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_level));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("[FATAL] Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    info!("Starting KYC Server v{}", env!("CARGO_PKG_VERSION"));
    info!("PID: {}", std::process::id());

    if let Err(e) = run_server(settings).await {
        error!("Server failed: {:#}", e);
        std::process::exit(1);
    }
}

async fn run_server(settings: Settings) -> Result<()> {
    info!(
        "Config loaded: bind={}, db={}, snapshot={}",
        settings.bind_address,
        settings.database_path,
        settings.snapshot_path.display()
    );

    let db = Arc::new(
        Database::new(&settings.database_path)
            .await
            .context("Failed to initialize database")?,
    );
    info!("SQLite database initialized at: {}", settings.database_path);

    let cache = Arc::new(KycCache::new(&settings.snapshot_path));
    info!("Loading cache (snapshot: {})", cache.snapshot_path().display());
    if let Err(e) = cache.initialize(db.as_ref()).await {
        error!("Cache initialization failed, serving with an empty cache: {}", e);
    }

    let snapshot_task = settings
        .snapshot_interval()
        .map(|period| {
            info!("Periodic snapshot every {:?}", period);
            cache.start_snapshot_task(period)
        });

    let kyc_service = Arc::new(KycService::new(db.clone(), cache.clone()));
    let state = AppState {
        cache: cache.clone(),
        kyc_service,
    };

    let app = build_router(state);

    let addr: SocketAddr = settings
        .bind_address
        .parse()
        .context("Failed to parse bind address")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    if let Some(task) = snapshot_task {
        task.abort();
    }
    match cache.flush_if_dirty().await {
        Ok(true) => info!("Final snapshot written"),
        Ok(false) => {}
        Err(e) => warn!("Final snapshot failed: {}", e),
    }

    info!("Server stopped");
    Ok(())
}

fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/create-kyc", post(handlers::kyc::create))
        .route(
            "/kyc/:merchant_id",
            get(handlers::kyc::get).patch(handlers::kyc::update),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn test_app() -> (Router, Arc<KycCache>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = Arc::new(Database::in_memory().await.unwrap());
        let cache = Arc::new(KycCache::new(dir.path().join("kycDetails.json")));
        let state = AppState {
            cache: cache.clone(),
            kyc_service: Arc::new(KycService::new(db, cache.clone())),
        };
        (build_router(state), cache, dir)
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _cache, _dir) = test_app().await;
        let (status, body) = send(&app, "GET", "/health", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["cached_records"], 0);
    }

    #[tokio::test]
    async fn test_create_update_get() {
        let (app, cache, _dir) = test_app().await;

        let (status, body) = send(
            &app,
            "POST",
            "/create-kyc",
            Some(json!({"name": "Acme", "panNumber": "ABCDE1234F", "aadharNumber": "123412341234"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "KYC created successfully");
        assert_eq!(body["data"]["panNumber"], "ABCDE1234F");
        let merchant_id = body["data"]["merchant_id"].as_str().unwrap().to_string();
        assert!(cache.get(&merchant_id).is_some());

        let (status, body) = send(
            &app,
            "PATCH",
            &format!("/kyc/{}", merchant_id),
            Some(json!({"panNumber": "ZZZZZ9999Z"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "KYC updated successfully");
        assert_eq!(body["panNumber"], "ZZZZZ9999Z");

        let (status, body) = send(&app, "GET", &format!("/kyc/{}", merchant_id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["name"], "Acme");
        assert_eq!(body["data"]["panNumber"], "ZZZZZ9999Z");
    }

    #[tokio::test]
    async fn test_update_unknown_merchant_is_404() {
        let (app, cache, _dir) = test_app().await;

        let (status, body) = send(
            &app,
            "PATCH",
            "/kyc/11111111-1111-1111-1111-111111111111",
            Some(json!({"panNumber": "ZZZZZ9999Z"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "not_found");
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_update_requires_a_field() {
        let (app, _cache, _dir) = test_app().await;

        let (status, body) = send(
            &app,
            "PATCH",
            "/kyc/11111111-1111-1111-1111-111111111111",
            Some(json!({"panNumber": "", "aadharNumber": ""})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "invalid_request");
    }

    #[tokio::test]
    async fn test_bad_inputs_are_400() {
        let (app, _cache, _dir) = test_app().await;

        let (status, _) = send(&app, "GET", "/kyc/not-a-uuid", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let request = Request::builder()
            .method("POST")
            .uri("/create-kyc")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let (status, body) = send(&app, "POST", "/create-kyc", Some(json!({"name": "Acme"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "invalid_request");
    }

    #[tokio::test]
    async fn test_duplicate_pan_is_500_and_cache_unchanged() {
        let (app, cache, _dir) = test_app().await;
        let body = json!({"name": "Acme", "panNumber": "ABCDE1234F"});

        let (status, _) = send(&app, "POST", "/create-kyc", Some(body.clone())).await;
        assert_eq!(status, StatusCode::OK);
        let before = cache.snapshot();

        let (status, body) = send(&app, "POST", "/create-kyc", Some(body)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["code"], "database_error");
        assert_eq!(cache.snapshot(), before);
    }
}
