use axum::{
    extract::multipart::MultipartRejection,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::services::calculadora::CalculoError;
use crate::utils::jwt::TokenError;

/// Error común de los handlers. Toda respuesta de error lleva `{"message": ...}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Conflict(String),
    #[error("error de base de datos: {0}")]
    Database(#[from] sqlx::Error),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        ApiError::Unauthorized(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        ApiError::Forbidden(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        ApiError::NotFound(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        ApiError::BadRequest(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Database(e) => {
                tracing::error!("Error de base de datos: {:?}", e);
                "Error interno".to_string()
            }
            ApiError::Internal(msg) => {
                tracing::error!("Error interno: {}", msg);
                "Error interno".to_string()
            }
            otro => otro.to_string(),
        };
        (status, Json(json!({ "message": message }))).into_response()
    }
}

impl From<CalculoError> for ApiError {
    fn from(e: CalculoError) -> Self {
        ApiError::BadRequest(e.to_string())
    }
}

impl From<TokenError> for ApiError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::Firma(_) | TokenError::Duracion(_) => ApiError::Internal(e.to_string()),
            TokenError::Invalido => ApiError::Unauthorized(e.to_string()),
        }
    }
}

// Rechazos de los extractores de axum: mismo cuerpo JSON que el resto.
macro_rules! rechazo_como_bad_request {
    ($($rechazo:ty),+) => {
        $(
            impl From<$rechazo> for ApiError {
                fn from(e: $rechazo) -> Self {
                    ApiError::BadRequest(e.body_text())
                }
            }
        )+
    };
}

rechazo_como_bad_request!(JsonRejection, QueryRejection, PathRejection, MultipartRejection);

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mapea_codigos_http() {
        assert_eq!(ApiError::unauthorized("x").status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::forbidden("x").status(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::not_found("x").status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::Conflict("x".into()).status(), StatusCode::CONFLICT);
        assert_eq!(
            ApiError::Database(sqlx::Error::RowNotFound).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn errores_de_calculo_son_400() {
        let e: ApiError = CalculoError::SinUnidades.into();
        assert_eq!(e.status(), StatusCode::BAD_REQUEST);
    }
}
