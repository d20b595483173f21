//! Errores de la aplicación y su traducción a respuestas HTTP.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Petición no válida: {0}")]
    InvalidRequest(String),

    #[error("No existe el periódico '{0}'")]
    NotFound(String),

    #[error("Almacén de documentos no disponible: {0}")]
    StoreUnavailable(String),

    #[error("Error de configuración: {0}")]
    Configuration(String),

    #[error("Error generando la respuesta: {0}")]
    Generation(String),

    #[error("Tiempo de espera agotado: {0}")]
    Timeout(String),
}

pub type AppResult<T> = std::result::Result<T, AppError>;

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::StoreUnavailable(_)
            | Self::Configuration(_)
            | Self::Generation(_)
            | Self::Timeout(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<neo4rs::Error> for AppError {
    fn from(err: neo4rs::Error) -> Self {
        Self::StoreUnavailable(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
