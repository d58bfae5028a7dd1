pub mod error;
pub mod extract;
pub mod routes;
pub mod state;

use axum::http::{header, HeaderValue};
use axum::routing::get;
use axum::Router;
use taskboard_core::config::ServerConfig;
use taskboard_core::Store;
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the axum Router with all API routes and middleware.
/// Used by `serve()` and available for integration testing.
pub fn build_router(app_state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let actions_route = app_state.config.actions_route;

    Router::new()
        // Health
        .route("/api/health", get(routes::health::health))
        // Projects
        .route(
            "/api/projects",
            get(routes::projects::list_projects).post(routes::projects::create_project),
        )
        .route(
            "/api/projects/",
            get(routes::projects::list_projects).post(routes::projects::create_project),
        )
        .route(
            "/api/projects/{id}",
            get(routes::projects::get_project)
                .put(routes::projects::update_project)
                .delete(routes::projects::delete_project),
        )
        .route(
            actions_route.path(),
            get(routes::projects::list_project_actions),
        )
        // Actions
        .route(
            "/api/actions",
            get(routes::actions::list_actions).post(routes::actions::create_action),
        )
        .route(
            "/api/actions/",
            get(routes::actions::list_actions).post(routes::actions::create_action),
        )
        .route(
            "/api/actions/{id}",
            get(routes::actions::get_action)
                .put(routes::actions::update_action)
                .delete(routes::actions::delete_action),
        )
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("SAMEORIGIN"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::REFERRER_POLICY,
            HeaderValue::from_static("no-referrer"),
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

/// Open the store named in `config` and serve the API on its port.
pub async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    let store = Store::connect(&config.database_url, config.max_connections).await?;
    let listener = tokio::net::TcpListener::bind(config.listen_addr()).await?;
    serve_on(AppState::new(store, config), listener).await
}

/// Serve the API on a pre-bound listener.
///
/// Unlike `serve`, this accepts a `TcpListener` that was already bound so the
/// caller can read the actual port before starting (useful when `port = 0` and
/// the OS picks a free port).
pub async fn serve_on(
    app_state: AppState,
    listener: tokio::net::TcpListener,
) -> anyhow::Result<()> {
    let actual_port = listener.local_addr()?.port();
    tracing::info!(
        actions_route = %app_state.config.actions_route,
        "taskboard API listening on http://localhost:{actual_port}"
    );

    let app = build_router(app_state);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to install Ctrl-C handler: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
