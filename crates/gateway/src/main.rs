//! AlumNet API Gateway
//!
//! HTTP entry point for the recommendation engine.
//! Handles:
//! - Request routing and query validation
//! - Per-request cancellation on client disconnect
//! - Observability (logging, metrics)

mod handlers;
mod middleware;

use alumnet_common::{
    config::AppConfig,
    db::{DbPool, Repository},
    metrics,
};
use alumnet_recommender::{EngineSettings, RecommendationEngine, ScoringWeights, SeaOrmStore};
use anyhow::Context;
use axum::{routing::get, Router};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::future::{Future, IntoFuture};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::{signal, sync::Notify};
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub engine: Arc<RecommendationEngine>,
    /// Database checked by the readiness probe; `None` for in-memory engines
    pub db: Option<DbPool>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Arc::new(AppConfig::load().context("Failed to load configuration")?);

    init_tracing(&config);
    info!("Starting AlumNet API Gateway v{}", alumnet_common::VERSION);

    // Initialize metrics
    if config.observability.metrics_port != 0 {
        let metrics_addr = SocketAddr::from(([0, 0, 0, 0], config.observability.metrics_port));
        PrometheusBuilder::new()
            .with_http_listener(metrics_addr)
            .set_buckets(metrics::LATENCY_BUCKETS)?
            .install()
            .context("Failed to install Prometheus exporter")?;
        info!("Metrics exporter listening on {}", metrics_addr);
    }
    metrics::register_metrics();

    // Initialize database connection
    info!("Connecting to database...");
    let db = DbPool::new(&config.database).await?;

    // Build the engine
    let weights: ScoringWeights = AppConfig::load_section("recommendation.weights")
        .context("Invalid recommendation.weights section")?
        .unwrap_or_default();
    let store = Arc::new(SeaOrmStore::new(Repository::new(db.clone())));
    let engine = RecommendationEngine::new(
        store,
        weights,
        EngineSettings::from(&config.recommendation),
    );

    let state = AppState {
        config: config.clone(),
        engine: Arc::new(engine),
        db: Some(db),
    };

    // Build the router
    let app = create_router(state);

    // Start the server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    let signalled = Arc::new(Notify::new());
    let notify = signalled.clone();
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            notify.notify_one();
        })
        .into_future();

    drain_with_deadline(
        server,
        async move { signalled.notified().await },
        config.shutdown_timeout(),
    )
    .await?;

    info!("Server shutdown complete");
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.observability.log_level));

    if config.observability.json_logging {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    let timeout = TimeoutLayer::new(state.config.request_timeout());

    // API routes
    let api_routes = Router::new()
        // Health endpoints
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))

        // Recommendation endpoints
        .route(
            "/recommendations/events/{profile_id}",
            get(handlers::recommendations::recommend_events),
        )
        .route(
            "/recommendations/users/{profile_id}",
            get(handlers::recommendations::recommend_users),
        )
        .route(
            "/recommendations/jobs/{profile_id}",
            get(handlers::recommendations::recommend_jobs),
        )

        // Connection discovery
        .route(
            "/connections/{profile_id}",
            get(handlers::connections::discover_connections),
        );

    // Compose the app
    Router::new()
        .nest("/v1", api_routes)
        .layer(axum::middleware::from_fn(middleware::metrics::track_requests))
        .layer(TraceLayer::new_for_http())
        .layer(timeout)
        .layer(cors)
        .layer(request_id)
        .layer(propagate_id)
        .with_state(state)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}

/// Run `server` to completion, giving it at most `grace` once `signalled` fires
async fn drain_with_deadline<F, S>(server: F, signalled: S, grace: Duration) -> std::io::Result<()>
where
    F: Future<Output = std::io::Result<()>>,
    S: Future<Output = ()>,
{
    tokio::pin!(server);

    tokio::select! {
        result = &mut server => return result,
        _ = signalled => {}
    }

    match tokio::time::timeout(grace, server).await {
        Ok(result) => result,
        Err(_) => {
            warn!(grace_secs = grace.as_secs(), "Shutdown deadline reached, dropping open connections");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alumnet_recommender::{FixedClock, InMemoryStore};
    use alumnet_recommender::types::ProfileFeatures;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    fn app() -> Router {
        let store = InMemoryStore::new()
            .with_profile(ProfileFeatures::new(1).with_skills(["rust"]).with_faculty("CS"))
            .with_profile(
                ProfileFeatures::new(2)
                    .with_name("Asha", "Gurung")
                    .with_skills(["rust"])
                    .with_faculty("CS"),
            )
            .with_profile(ProfileFeatures::new(3))
            .with_follow(1, 2)
            .with_follow(2, 3);

        let engine = RecommendationEngine::with_clock(
            Arc::new(store),
            ScoringWeights::default(),
            EngineSettings::default(),
            Arc::new(FixedClock(Default::default())),
        );

        create_router(AppState {
            config: Arc::new(AppConfig::default()),
            engine: Arc::new(engine),
            db: None,
        })
    }

    async fn get(uri: &str) -> (StatusCode, Option<String>, Value) {
        let response = app()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let cache = response
            .headers()
            .get(header::CACHE_CONTROL)
            .map(|v| v.to_str().unwrap().to_string());
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, cache, body)
    }

    #[tokio::test]
    async fn test_user_recommendations() {
        let (status, cache, body) = get("/v1/recommendations/users/1?limit=5").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(cache.as_deref(), Some("no-store"));
        assert_eq!(body[0]["profileId"], 2);
        assert_eq!(body[0]["firstName"], "Asha");
        assert_eq!(body[0]["lastName"], "Gurung");
        assert!(body[0]["score"].as_f64().unwrap() >= 0.05);
    }

    #[tokio::test]
    async fn test_empty_event_recommendations() {
        let (status, _, body) = get("/v1/recommendations/events/1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_limit_out_of_range_rejected() {
        let (status, _, body) = get("/v1/recommendations/jobs/1?limit=0").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

        let (status, _, _) = get("/v1/recommendations/jobs/1?limit=101").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_profile_is_not_found() {
        let (status, _, body) = get("/v1/recommendations/users/42").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "PROFILE_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_connections() {
        let (status, _, body) = get("/v1/connections/1?maxDegree=2").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["profileId"], 1);
        assert_eq!(body["maxDegree"], 2);
        assert_eq!(body["total"], 2);
        assert_eq!(body["degrees"]["2"], 1);
        assert_eq!(body["degrees"]["3"], 2);
    }

    #[tokio::test]
    async fn test_connections_degree_validation() {
        let (status, _, _) = get("/v1/connections/1?maxDegree=4").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _, _) = get("/v1/connections/1?maxDegree=0").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_health() {
        let (status, _, body) = get("/v1/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");

        let (status, _, body) = get("/v1/ready").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ready");
    }

    #[tokio::test]
    async fn test_drain_stops_at_deadline() {
        let stuck = std::future::pending::<std::io::Result<()>>();
        let started = std::time::Instant::now();

        let result = drain_with_deadline(stuck, async {}, Duration::from_millis(20)).await;

        assert!(result.is_ok());
        assert!(started.elapsed() >= Duration::from_millis(20));
    }

    #[tokio::test]
    async fn test_drain_returns_server_result() {
        let finished = async { Err(std::io::Error::other("listener closed")) };

        let result =
            drain_with_deadline(finished, std::future::pending(), Duration::from_secs(30)).await;

        assert_eq!(result.unwrap_err().to_string(), "listener closed");
    }
}
