//! API module
//!
//! HTTP application: shared state, middleware stack and endpoints.

pub mod middleware;
pub mod routes;

use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderName;
use axum::Router;
use tower::Layer;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::services::ServeDir;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::model::Models;
use crate::store::Store;

pub use routes::create_router;

/// State shared by every handler
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Store,
    pub models: Models,
}

impl AppState {
    pub fn new(config: Config, store: Store) -> Self {
        let models = Models::new(store.clone());
        Self {
            config: Arc::new(config),
            store,
            models,
        }
    }
}

/// The complete HTTP application, trailing slashes trimmed before routing
pub type App = NormalizePath<Router>;

pub fn build_app(state: AppState) -> App {
    NormalizePathLayer::trim_trailing_slash().layer(build_router(state))
}

/// Build the application router with its middleware stack.
///
/// Layers run outermost first: request id, tracing, panic recovery,
/// timeout, request logging, handler.
pub fn build_router(state: AppState) -> Router {
    with_middleware(create_router(), state)
}

fn with_middleware(mut router: Router<AppState>, state: AppState) -> Router {
    let config = state.config.clone();
    let request_id = HeaderName::from_static(middleware::REQUEST_ID_HEADER);

    if config.options.log_requests {
        router = router.layer(axum::middleware::from_fn(middleware::logging_middleware));
    }

    if config.options.timeout > 0 {
        router = router.layer(TimeoutLayer::new(Duration::from_secs(config.options.timeout)));
    }

    if config.folders.public.is_dir() && config.public_url.len() > 1 {
        router = router.nest_service(&config.public_url, ServeDir::new(&config.folders.public));
    }

    router
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::routing::get;
    use tower::util::ServiceExt;

    async fn panicking_handler() -> StatusCode {
        panic!("handler failed")
    }

    #[tokio::test]
    async fn test_panic_becomes_internal_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open_file("panic.db", dir.path(), 1).await.unwrap();
        let config = Config::from_lookup(|_| None).unwrap();

        let router = Router::new().route("/boom", get(panicking_handler));
        let app = with_middleware(router, AppState::new(config, store));

        let response = app
            .oneshot(Request::builder().uri("/boom").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.headers().contains_key(middleware::REQUEST_ID_HEADER));
    }
}
