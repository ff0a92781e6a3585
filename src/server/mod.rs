pub mod handlers;
pub mod rate_limit;
pub mod state;

use crate::{config::Config, metrics};
use axum::{
    Router,
    extract::Request,
    http::HeaderValue,
    middleware::{self, Next},
    response::Response,
    routing::get,
};
use state::AppState;
use tower_http::cors::CorsLayer;
use tracing::{debug, error, info, warn};

/// Build the router for the given state
pub fn build_router(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/", get(handlers::health::health_check))
        .route("/health", get(handlers::health::health_check))
        .route("/clip/", get(handlers::missing_channel))
        .route("/clip/{channel}", get(handlers::clip::serve_clip))
        .route("/preview/", get(handlers::missing_channel))
        .route("/preview/{channel}", get(handlers::preview::serve_preview));

    if state.metrics.is_some() {
        router = router.route("/metrics", get(handlers::metrics::serve_metrics));
    }

    router
        .layer(middleware::from_fn(version_header))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Tag every response with the running version
async fn version_header(req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;
    response.headers_mut().insert(
        "x-streamclip-version",
        HeaderValue::from_static(env!("CARGO_PKG_VERSION")),
    );
    response
}

/// Periodically drop stale cache entries and expired rate-limit windows
fn spawn_maintenance(state: &AppState) {
    let cache = state.cache.clone();
    let limiter = state.rate_limiter.clone();
    let every = state.config.cache_sweep_interval();

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let evicted = cache.evict_stale();
            if evicted > 0 {
                debug!("Evicted {} stale playlist cache entries", evicted);
            }
            if let Some(limiter) = &limiter {
                limiter.cleanup();
            }
        }
    });
}

/// Start the Axum HTTP server
pub async fn start(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("0.0.0.0:{}", config.port);

    let mut state = AppState::new(config);
    match metrics::init() {
        Ok(handle) => state = state.with_metrics(handle),
        Err(e) => warn!("Prometheus recorder unavailable: {}", e),
    }

    spawn_maintenance(&state);
    let app = build_router(state);

    let listener = match tokio::net::TcpListener::bind(addr.as_str()).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to address {}: {}", addr, e);
            return Err(e.into());
        }
    };

    info!("Server listening on http://{}", addr);

    if let Err(e) = axum::serve(listener, app).await {
        error!("Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
