use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use playsync_store::{AuthError, DatabaseError, MediaError};
use serde::Serialize;
use thiserror::Error;

use crate::uploads::UploadError;

pub type ServerResult<T> = Result<T, ServerError>;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("{0}")]
    Validation(String),
    #[error("Missing authorization")]
    MissingToken,
    #[error("Token has expired")]
    TokenExpired,
    #[error("Token is invalid")]
    TokenInvalid,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("{0}")]
    Forbidden(&'static str),
    #[error("{resource}:{identifier} not found")]
    NotFound {
        resource: &'static str,
        identifier: &'static str,
    },
    #[error("{resource} with {field} of value {value} already exists")]
    Conflict {
        resource: &'static str,
        field: &'static str,
        value: String,
    },
    #[error("File type {0} is not allowed")]
    UnsupportedMedia(String),
    #[error("Unknown internal error: {0}")]
    Unknown(String),
}

/// The error body every failed request responds with
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    status_code: u16,
    message: String,
    success: bool,
    errors: Vec<String>,
}

impl ServerError {
    fn as_status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::UnsupportedMedia(_) => StatusCode::BAD_REQUEST,
            Self::MissingToken => StatusCode::UNAUTHORIZED,
            Self::TokenExpired => StatusCode::UNAUTHORIZED,
            Self::TokenInvalid => StatusCode::UNAUTHORIZED,
            Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.as_status_code();

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            log::error!("{}", self);
        }

        let body = ErrorBody {
            status_code: status.as_u16(),
            message: self.to_string(),
            success: false,
            errors: vec![],
        };

        (status, Json(body)).into_response()
    }
}

impl From<AuthError> for ServerError {
    fn from(value: AuthError) -> Self {
        match value {
            AuthError::InvalidCredentials => Self::InvalidCredentials,
            AuthError::TokenExpired => Self::TokenExpired,
            AuthError::TokenInvalid => Self::TokenInvalid,
            AuthError::Db(e) => e.into(),
            e => Self::Unknown(e.to_string()),
        }
    }
}

impl From<DatabaseError> for ServerError {
    fn from(value: DatabaseError) -> Self {
        match value {
            DatabaseError::NotFound {
                resource,
                identifier,
            } => Self::NotFound {
                resource,
                identifier,
            },
            DatabaseError::Conflict {
                resource,
                field,
                value,
            } => Self::Conflict {
                resource,
                field,
                value,
            },
            e => Self::Unknown(e.to_string()),
        }
    }
}

impl From<MediaError> for ServerError {
    fn from(value: MediaError) -> Self {
        Self::Unknown(value.to_string())
    }
}

impl From<UploadError> for ServerError {
    fn from(value: UploadError) -> Self {
        match value {
            UploadError::UnsupportedType(mime) => Self::UnsupportedMedia(mime),
            UploadError::Multipart(e) => Self::Validation(e),
            e => Self::Unknown(e.to_string()),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let not_found = ServerError::NotFound {
            resource: "video",
            identifier: "id",
        };

        let conflict = ServerError::Conflict {
            resource: "user",
            field: "username",
            value: "taken".to_string(),
        };

        assert_eq!(not_found.as_status_code(), StatusCode::NOT_FOUND);
        assert_eq!(conflict.as_status_code(), StatusCode::CONFLICT);
        assert_eq!(
            ServerError::TokenExpired.as_status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ServerError::Forbidden("nope").as_status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ServerError::Validation("bad".to_string()).as_status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_unsupported_media_message_is_not_doubled() {
        let error: ServerError = UploadError::UnsupportedType("video/ogg".to_string()).into();

        assert!(matches!(error, ServerError::UnsupportedMedia(_)));
        assert_eq!(error.to_string(), "File type video/ogg is not allowed");
    }

    #[test]
    fn test_auth_error_conversion() {
        let expired: ServerError = AuthError::TokenExpired.into();
        let invalid: ServerError = AuthError::InvalidCredentials.into();

        assert!(matches!(expired, ServerError::TokenExpired));
        assert!(matches!(invalid, ServerError::InvalidCredentials));
    }
}
