// Maps service failures onto HTTP responses
use crate::application::dashboard_service::ServiceError;
use crate::application::registry::RegistryError;
use crate::domain::layout::LayoutError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

#[derive(Debug)]
pub struct ApiError(pub ServiceError);

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            ServiceError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::EmptyName => StatusCode::UNPROCESSABLE_ENTITY,
            ServiceError::Layout(LayoutError::Uninitialized) => StatusCode::CONFLICT,
            ServiceError::Registry(err) => match err {
                RegistryError::NotFound(_) => StatusCode::NOT_FOUND,
                RegistryError::DuplicateId(_) => StatusCode::CONFLICT,
                RegistryError::InvalidRecord(_) => StatusCode::UNPROCESSABLE_ENTITY,
                RegistryError::CorruptStore(_)
                | RegistryError::Encode(_)
                | RegistryError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self.0);
        } else {
            tracing::debug!("Request rejected ({}): {}", status, self.0);
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}
