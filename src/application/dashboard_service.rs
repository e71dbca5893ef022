// Dashboard service - Use cases for listing, editing and deleting dashboards
use crate::application::registry::{DashboardRegistry, RegistryError};
use crate::application::snapshot::SnapshotRenderer;
use crate::domain::confirmation::ConfirmationGate;
use crate::domain::dashboard::{CellRect, DashboardRecord, Icon, generate_id};
use crate::domain::layout::{EditState, LayoutController, LayoutError};
use crate::domain::widget::{ChartSpec, WidgetKind};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

const MAX_ID_ATTEMPTS: usize = 16;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("no edit session for dashboard `{0}`")]
    SessionNotFound(String),
    #[error("dashboard name must not be empty")]
    EmptyName,
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Layout(#[from] LayoutError),
}

/// One in-progress edit of a dashboard.
#[derive(Debug)]
struct EditSession {
    name: String,
    persisted: bool,
    controller: LayoutController,
    removal: ConfirmationGate<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CellView {
    #[serde(flatten)]
    pub rect: CellRect,
    pub widget: Option<WidgetKind>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub id: String,
    pub name: String,
    pub state: EditState,
    pub persisted: bool,
    pub cells: Vec<CellView>,
    pub pending_removal: Option<String>,
}

impl SessionView {
    fn of(id: &str, session: &EditSession) -> Self {
        let cells = session
            .controller
            .widget_bindings()
            .into_iter()
            .map(|(rect, widget)| CellView {
                rect: rect.clone(),
                widget,
            })
            .collect();
        Self {
            id: id.to_string(),
            name: session.name.clone(),
            state: session.controller.state(),
            persisted: session.persisted,
            cells,
            pending_removal: session.removal.pending().cloned(),
        }
    }
}

pub struct DashboardService {
    registry: Arc<DashboardRegistry>,
    snapshots: Option<Arc<dyn SnapshotRenderer>>,
    columns: u32,
    sessions: Mutex<HashMap<String, EditSession>>,
    deletion: Mutex<ConfirmationGate<String>>,
}

impl DashboardService {
    pub fn new(
        registry: Arc<DashboardRegistry>,
        snapshots: Option<Arc<dyn SnapshotRenderer>>,
        columns: u32,
    ) -> Self {
        Self {
            registry,
            snapshots,
            columns,
            sessions: Mutex::new(HashMap::new()),
            deletion: Mutex::new(ConfirmationGate::new()),
        }
    }

    pub fn list_dashboards(&self) -> Vec<DashboardRecord> {
        self.registry.list_all()
    }

    pub fn get_dashboard(&self, id: &str) -> Result<DashboardRecord, ServiceError> {
        self.registry
            .find_by_id(id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()).into())
    }

    pub fn widgets(&self) -> Vec<ChartSpec> {
        WidgetKind::ALL.into_iter().map(ChartSpec::from).collect()
    }

    /// Start a new dashboard with a fresh id and the default grid. Nothing is
    /// stored until the first save.
    pub async fn start_new(&self) -> Result<SessionView, ServiceError> {
        let mut sessions = self.sessions.lock().await;
        let id = self.fresh_id(&sessions)?;

        let mut controller = LayoutController::new();
        controller.initialize(None);
        let session = EditSession {
            name: String::new(),
            persisted: false,
            controller,
            removal: ConfirmationGate::new(),
        };
        let view = SessionView::of(&id, &session);
        tracing::debug!("Started new dashboard session {}", id);
        sessions.insert(id, session);
        Ok(view)
    }

    /// Open an edit session over a stored dashboard, replacing any open one.
    pub async fn open_existing(&self, id: &str) -> Result<SessionView, ServiceError> {
        let Some(record) = self.registry.find_by_id(id) else {
            tracing::warn!("Dashboard data not found for id {}", id);
            return Err(RegistryError::NotFound(id.to_string()).into());
        };

        let mut controller = LayoutController::new();
        controller.initialize(Some(record.layout));
        let session = EditSession {
            name: record.name,
            persisted: true,
            controller,
            removal: ConfirmationGate::new(),
        };
        let view = SessionView::of(id, &session);
        self.sessions.lock().await.insert(id.to_string(), session);
        Ok(view)
    }

    pub async fn session(&self, id: &str) -> Result<SessionView, ServiceError> {
        let sessions = self.sessions.lock().await;
        let session = sessions
            .get(id)
            .ok_or_else(|| ServiceError::SessionNotFound(id.to_string()))?;
        Ok(SessionView::of(id, session))
    }

    /// Drops the in-memory draft. Returns whether a session was open.
    pub async fn close(&self, id: &str) -> bool {
        self.sessions.lock().await.remove(id).is_some()
    }

    pub async fn apply_layout(
        &self,
        id: &str,
        rects: Vec<CellRect>,
    ) -> Result<SessionView, ServiceError> {
        self.with_session(id, |session| {
            session.controller.on_rectangles_changed(rects)?;
            Ok(())
        })
        .await
    }

    pub async fn request_cell_removal(
        &self,
        id: &str,
        cell_id: &str,
    ) -> Result<SessionView, ServiceError> {
        self.with_session(id, |session| {
            session.removal.request(cell_id.to_string());
            Ok(())
        })
        .await
    }

    pub async fn cancel_cell_removal(&self, id: &str) -> Result<SessionView, ServiceError> {
        self.with_session(id, |session| {
            session.removal.cancel();
            Ok(())
        })
        .await
    }

    pub async fn confirm_cell_removal(&self, id: &str) -> Result<SessionView, ServiceError> {
        self.with_session(id, |session| {
            if let Some(cell_id) = session.removal.confirm() {
                if session.controller.remove_cell(&cell_id)? {
                    tracing::debug!("Removed cell {} from dashboard {}", cell_id, id);
                }
            }
            Ok(())
        })
        .await
    }

    /// Persist the session under `name`. The snapshot is taken first; if it
    /// fails the record is saved without an icon. The session lock is not held
    /// while the snapshot renders.
    pub async fn save(&self, id: &str, name: &str) -> Result<DashboardRecord, ServiceError> {
        if name.trim().is_empty() {
            return Err(ServiceError::EmptyName);
        }

        let fields = {
            let sessions = self.sessions.lock().await;
            let session = sessions
                .get(id)
                .ok_or_else(|| ServiceError::SessionNotFound(id.to_string()))?;
            session
                .controller
                .to_record_fields(chrono::Utc::now().date_naive())?
        };
        let icon = self.capture_icon(id, &fields.layout).await;
        let record = DashboardRecord::new(
            id.to_string(),
            name.to_string(),
            fields.date,
            icon,
            fields.layout,
        );

        let mut sessions = self.sessions.lock().await;
        let session = sessions
            .get_mut(id)
            .ok_or_else(|| ServiceError::SessionNotFound(id.to_string()))?;
        if session.persisted {
            self.registry.upsert(id, record.clone())?;
        } else {
            self.registry.create(record.clone())?;
        }
        if let Err(e) = self.registry.record_cell_sizes(&record.layout) {
            tracing::warn!("Failed to record cell sizes for {}: {}", id, e);
        }

        session.persisted = true;
        session.name = record.name.clone();
        // edits made while the snapshot rendered are still unsaved
        if session.controller.cells() == record.layout.as_slice() {
            session.controller.mark_saved()?;
        }
        tracing::info!("Dashboard {} saved with {} cells", id, record.layout.len());
        Ok(record)
    }

    /// First step of deleting a dashboard from the listing.
    pub async fn request_dashboard_delete(&self, id: &str) -> Result<(), ServiceError> {
        if self.registry.find_by_id(id).is_none() {
            return Err(RegistryError::NotFound(id.to_string()).into());
        }
        self.deletion.lock().await.request(id.to_string());
        Ok(())
    }

    pub async fn cancel_dashboard_delete(&self) {
        self.deletion.lock().await.cancel();
    }

    /// Deletes the pending dashboard, if any. Returns the id that was targeted.
    pub async fn confirm_dashboard_delete(&self) -> Result<Option<String>, ServiceError> {
        let Some(id) = self.deletion.lock().await.confirm() else {
            return Ok(None);
        };
        self.registry.delete(&id)?;
        Ok(Some(id))
    }

    pub async fn pending_dashboard_delete(&self) -> Option<String> {
        self.deletion.lock().await.pending().cloned()
    }

    async fn with_session<F>(&self, id: &str, f: F) -> Result<SessionView, ServiceError>
    where
        F: FnOnce(&mut EditSession) -> Result<(), ServiceError>,
    {
        let mut sessions = self.sessions.lock().await;
        let session = sessions
            .get_mut(id)
            .ok_or_else(|| ServiceError::SessionNotFound(id.to_string()))?;
        f(session)?;
        Ok(SessionView::of(id, session))
    }

    async fn capture_icon(&self, id: &str, layout: &[CellRect]) -> Option<Icon> {
        let renderer = self.snapshots.as_ref()?;
        match renderer.capture(layout, self.columns).await {
            Ok(uri) => Icon::from_payload(uri),
            Err(e) => {
                tracing::warn!("Error capturing snapshot for {}: {}", id, e);
                None
            }
        }
    }

    fn fresh_id(&self, sessions: &HashMap<String, EditSession>) -> Result<String, ServiceError> {
        let mut last = String::new();
        for _ in 0..MAX_ID_ATTEMPTS {
            let id = generate_id(&mut rand::thread_rng());
            if !sessions.contains_key(&id) && self.registry.find_by_id(&id).is_none() {
                return Ok(id);
            }
            last = id;
        }
        Err(RegistryError::DuplicateId(last).into())
    }
}
