// Main entry point - Dependency injection and server setup
mod domain;
mod application;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc};
use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{compression::CompressionLayer, trace::TraceLayer};
use tracing_subscriber::EnvFilter;

use crate::application::dashboard_service::DashboardService;
use crate::application::key_value_store::KeyValueStore;
use crate::application::registry::DashboardRegistry;
use crate::application::snapshot::SnapshotRenderer;
use crate::infrastructure::config::{load_app_config, StoreBackend};
use crate::infrastructure::file_store::FileStore;
use crate::infrastructure::memory_store::MemoryStore;
use crate::infrastructure::png_snapshot::PngSnapshotRenderer;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    cancel_cell_delete, cancel_dashboard_delete, close_session, confirm_cell_delete,
    confirm_dashboard_delete, edit_session, get_dashboard, get_session, health_check,
    list_dashboards, list_widgets, request_cell_delete, request_dashboard_delete, save_session,
    start_session, update_layout,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let app_config = load_app_config()?;

    // Initialize tracing; RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&app_config.log.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Create store (infrastructure layer)
    let store: Arc<dyn KeyValueStore> = match app_config.store.backend {
        StoreBackend::File => Arc::new(FileStore::open(&app_config.store.path)?),
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; dashboards will not survive a restart");
            Arc::new(MemoryStore::new())
        }
    };
    let snapshots: Option<Arc<dyn SnapshotRenderer>> = app_config.snapshot.enabled.then(|| {
        Arc::new(PngSnapshotRenderer::new(
            app_config.snapshot.cell_width,
            app_config.snapshot.cell_height,
        )) as Arc<dyn SnapshotRenderer>
    });

    // Create services (application layer)
    let registry = Arc::new(DashboardRegistry::new(store));
    let dashboard_service =
        DashboardService::new(registry, snapshots, app_config.grid.columns);

    // Create application state
    let state = Arc::new(AppState { dashboard_service });

    // Build router (presentation layer)
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/widgets", get(list_widgets))
        .route("/dashboards", get(list_dashboards))
        .route("/dashboards/:id", get(get_dashboard))
        .route("/dashboards/:id/delete", post(request_dashboard_delete))
        .route("/dashboard-deletion/confirm", post(confirm_dashboard_delete))
        .route("/dashboard-deletion/cancel", post(cancel_dashboard_delete))
        .route("/sessions", post(start_session))
        .route("/sessions/edit/:id", post(edit_session))
        .route("/sessions/:id", get(get_session).delete(close_session))
        .route("/sessions/:id/layout", put(update_layout))
        .route("/sessions/:id/cells/:cell_id/delete", post(request_cell_delete))
        .route("/sessions/:id/cell-deletion/confirm", post(confirm_cell_delete))
        .route("/sessions/:id/cell-deletion/cancel", post(cancel_cell_delete))
        .route("/sessions/:id/save", post(save_session))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = app_config.server.bind.parse()?;
    tracing::info!("Starting dashboard-registry service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
