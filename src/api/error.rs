use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::error::PetError;

/// Failure of an HTTP handler.
#[derive(Debug)]
pub enum ApiError {
    /// The request could not be read into a valid command.
    BadRequest(String),
    Pet(PetError),
}

impl From<PetError> for ApiError {
    fn from(err: PetError) -> Self {
        Self::Pet(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Pet(err) => match err {
                PetError::OrgNotFound | PetError::PetNotFound => StatusCode::NOT_FOUND,
                PetError::Unauthorized => StatusCode::UNAUTHORIZED,
                PetError::EmailTaken => StatusCode::CONFLICT,
                PetError::UploadFailure { .. }
                | PetError::RemovalFailure { .. }
                | PetError::InvalidPhoto { .. } => StatusCode::BAD_REQUEST,
                PetError::Hashing { .. } | PetError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::BadRequest(msg) => msg.clone(),
            ApiError::Pet(err) if status.is_server_error() => {
                tracing::error!("request failed: {:?}", err);
                "Internal server error".to_string()
            }
            ApiError::Pet(err) => err.to_string(),
        };

        tracing::Span::current().record("error", message.as_str());

        (status, Json(json!({ "error": message }))).into_response()
    }
}
