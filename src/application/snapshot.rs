// Snapshot capture - renders a dashboard grid into an image payload
use crate::domain::dashboard::CellRect;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot rendering failed: {0}")]
    Render(String),
    #[error("snapshot worker stopped: {0}")]
    Worker(String),
}

#[async_trait]
pub trait SnapshotRenderer: Send + Sync {
    /// Render `layout` on a grid with `columns` columns and return an image data URI
    async fn capture(&self, layout: &[CellRect], columns: u32) -> Result<String, SnapshotError>;
}
