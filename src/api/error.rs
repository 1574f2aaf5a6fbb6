//! HTTP error responses

use crate::core::error::ServiceError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use log::error;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Error interno del servidor")]
    Internal,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> ApiError {
        ApiError::BadRequest(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::UnknownUser | ServiceError::InvalidCredentials => {
                ApiError::Unauthorized("Credenciales inválidas".to_owned())
            }
            ServiceError::InactiveUser => ApiError::Unauthorized("Usuario inactivo".to_owned()),
            ServiceError::InvalidSession => {
                ApiError::Unauthorized("Sesión inválida o expirada".to_owned())
            }
            ServiceError::InvalidResetToken => ApiError::bad_request("Token inválido"),
            ServiceError::ExpiredResetToken => ApiError::bad_request("El token ha expirado"),
            ServiceError::SamePassword => {
                ApiError::bad_request("La nueva contraseña debe ser diferente a la actual")
            }
            ServiceError::Validation(message) => ApiError::BadRequest(message),
            ServiceError::ConversationNotFound => {
                ApiError::NotFound("Conversación no encontrada".to_owned())
            }
            e @ (ServiceError::Database(_) | ServiceError::Hashing(_) | ServiceError::Token(_)) => {
                error!("{e}");
                ApiError::Internal
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "message": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_failures_are_unauthorized() {
        for e in [
            ServiceError::UnknownUser,
            ServiceError::InvalidCredentials,
            ServiceError::InactiveUser,
            ServiceError::InvalidSession,
        ] {
            assert_eq!(ApiError::from(e).status(), StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn test_reset_token_failures_are_bad_requests() {
        for e in [
            ServiceError::InvalidResetToken,
            ServiceError::ExpiredResetToken,
            ServiceError::SamePassword,
        ] {
            assert_eq!(ApiError::from(e).status(), StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn test_unknown_and_wrong_password_look_the_same() {
        assert_eq!(
            ApiError::from(ServiceError::UnknownUser).to_string(),
            ApiError::from(ServiceError::InvalidCredentials).to_string()
        );
    }

    #[test]
    fn test_internal_errors_hide_their_cause() {
        let e = ApiError::from(ServiceError::Hashing("salt too short".to_owned()));
        assert_eq!(e.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!e.to_string().contains("salt"));
    }
}
