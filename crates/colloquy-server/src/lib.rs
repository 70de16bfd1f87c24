//! colloquy-server
//!
//! Axum HTTP surface for the Colloquy chat backend: chat and agent routes,
//! the orchestration service behind them, error translation and request
//! audit logging. The `colloquy` binary runs the router on a local listener
//! or under the Lambda runtime.

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod service;
pub mod state;

use axum::Router;
use axum::middleware as axum_mw;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};

use state::AppState;

/// Build the application router.
pub fn app(state: AppState) -> Router {
    let chat = routes::chat::router();

    let routes = Router::new()
        .nest("/chat", chat.clone())
        // The bundled chat UI calls the /api-prefixed paths.
        .nest("/api/chat", chat)
        .nest("/api/agent", routes::agent::router());

    with_layers(routes).with_state(state)
}

/// CORS, request audit logging and panic recovery, outermost first.
fn with_layers<S>(routes: Router<S>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    routes.layer(
        ServiceBuilder::new()
            .layer(cors)
            .layer(axum_mw::from_fn(middleware::audit::audit_log))
            .layer(CatchPanicLayer::custom(error::panic_response)),
    )
}
