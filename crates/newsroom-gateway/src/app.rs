use axum::{
    routing::get,
    Router,
};
use dashmap::DashMap;
use newsroom_core::config::NewsroomConfig;
use newsroom_events::EventBroadcaster;
use newsroom_store::SqliteStore;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Central shared state — passed as Arc<AppState> to all Axum handlers.
pub struct AppState {
    pub config: NewsroomConfig,
    pub store: Arc<SqliteStore>,
    pub broadcaster: EventBroadcaster,
    /// Live WS connections: conn_id -> connect time (RFC 3339). Observability
    /// only; event delivery goes through the broadcaster.
    pub ws_clients: DashMap<String, String>,
}

impl AppState {
    pub fn new(
        config: NewsroomConfig,
        store: Arc<SqliteStore>,
        broadcaster: EventBroadcaster,
    ) -> Self {
        Self {
            config,
            store,
            broadcaster,
            ws_clients: DashMap::new(),
        }
    }
}

/// Assemble the full Axum router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(crate::http::health::health_handler))
        .route("/ws", get(crate::ws::connection::ws_handler))
        .route(
            "/news",
            get(crate::http::news::list).post(crate::http::news::create),
        )
        .route(
            "/news/{id}",
            get(crate::http::news::get_one)
                .put(crate::http::news::update)
                .delete(crate::http::news::delete),
        )
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
