// HTTP request handlers
use crate::application::dashboard_service::SessionView;
use crate::domain::dashboard::{CellRect, DashboardRecord, IconSymbol};
use crate::domain::widget::ChartSpec;
use crate::presentation::app_state::AppState;
use crate::presentation::error::ApiError;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Deserialize)]
pub struct SaveRequest {
    pub name: String,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct DeletionStatus {
    pub pending: Option<String>,
    pub deleted: Option<String>,
}

/// Listing row; symbolic icons are resolved so unknown tags show the default
#[derive(Debug, Serialize, PartialEq)]
pub struct ListedDashboard {
    #[serde(flatten)]
    pub record: DashboardRecord,
    pub icon_symbol: Option<IconSymbol>,
}

impl From<DashboardRecord> for ListedDashboard {
    fn from(record: DashboardRecord) -> Self {
        let icon_symbol = record.icon.as_ref().and_then(|icon| icon.symbol());
        Self {
            record,
            icon_symbol,
        }
    }
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Chart bindings for every widget kind
pub async fn list_widgets(State(state): State<Arc<AppState>>) -> Json<Vec<ChartSpec>> {
    Json(state.dashboard_service.widgets())
}

/// List all saved dashboards
pub async fn list_dashboards(State(state): State<Arc<AppState>>) -> Json<Vec<ListedDashboard>> {
    Json(
        state
            .dashboard_service
            .list_dashboards()
            .into_iter()
            .map(ListedDashboard::from)
            .collect(),
    )
}

pub async fn get_dashboard(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<DashboardRecord>, ApiError> {
    Ok(Json(state.dashboard_service.get_dashboard(&id)?))
}

/// First click of a listing delete; nothing is removed yet
pub async fn request_dashboard_delete(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<(StatusCode, Json<DeletionStatus>), ApiError> {
    state.dashboard_service.request_dashboard_delete(&id).await?;
    let pending = state.dashboard_service.pending_dashboard_delete().await;
    Ok((
        StatusCode::ACCEPTED,
        Json(DeletionStatus {
            pending,
            deleted: None,
        }),
    ))
}

pub async fn confirm_dashboard_delete(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DeletionStatus>, ApiError> {
    let deleted = state.dashboard_service.confirm_dashboard_delete().await?;
    Ok(Json(DeletionStatus {
        pending: None,
        deleted,
    }))
}

pub async fn cancel_dashboard_delete(State(state): State<Arc<AppState>>) -> Json<DeletionStatus> {
    state.dashboard_service.cancel_dashboard_delete().await;
    Json(DeletionStatus {
        pending: None,
        deleted: None,
    })
}

/// Start editing a brand new dashboard
pub async fn start_session(
    State(state): State<Arc<AppState>>,
) -> Result<(StatusCode, Json<SessionView>), ApiError> {
    let view = state.dashboard_service.start_new().await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// Start editing a stored dashboard
pub async fn edit_session(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<SessionView>, ApiError> {
    Ok(Json(state.dashboard_service.open_existing(&id).await?))
}

pub async fn get_session(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<SessionView>, ApiError> {
    Ok(Json(state.dashboard_service.session(&id).await?))
}

pub async fn close_session(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> StatusCode {
    if state.dashboard_service.close(&id).await {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

/// Rectangles as reported by the grid engine after a drag or resize
pub async fn update_layout(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(rects): Json<Vec<CellRect>>,
) -> Result<Json<SessionView>, ApiError> {
    Ok(Json(state.dashboard_service.apply_layout(&id, rects).await?))
}

pub async fn request_cell_delete(
    Path((id, cell_id)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<SessionView>, ApiError> {
    Ok(Json(
        state
            .dashboard_service
            .request_cell_removal(&id, &cell_id)
            .await?,
    ))
}

pub async fn confirm_cell_delete(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<SessionView>, ApiError> {
    Ok(Json(state.dashboard_service.confirm_cell_removal(&id).await?))
}

pub async fn cancel_cell_delete(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<SessionView>, ApiError> {
    Ok(Json(state.dashboard_service.cancel_cell_removal(&id).await?))
}

pub async fn save_session(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(body): Json<SaveRequest>,
) -> Result<Json<DashboardRecord>, ApiError> {
    Ok(Json(state.dashboard_service.save(&id, &body.name).await?))
}
