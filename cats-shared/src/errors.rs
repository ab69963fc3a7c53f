use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::types::ApiErrorResponse;

/// Application error codes following the pattern E{area}{sequence}
///
/// Ranges:
/// - E0xxx: Shared/infrastructure errors
/// - E1xxx: User errors
/// - E2xxx: Cat errors
/// - E3xxx: Cat match errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Shared (E0xxx)
    InternalError,
    ValidationError,
    NotFound,
    Unauthorized,
    BadRequest,
    Conflict,
    TokenExpired,
    TokenInvalid,

    // User (E1xxx)
    EmailAlreadyExists,
    UserNotFound,
    WrongPassword,

    // Cat (E2xxx)
    CatNotFound,
    CatSexLocked,

    // Cat match (E3xxx)
    CatMatchNotFound,
    CatUnavailable,
    CatsSameSex,
    CannotMatchOwnCat,
    CatAlreadyMatched,
    MatchNotWaiting,
}

impl ErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            // Shared
            Self::InternalError => "E0001",
            Self::ValidationError => "E0002",
            Self::NotFound => "E0003",
            Self::Unauthorized => "E0004",
            Self::BadRequest => "E0005",
            Self::Conflict => "E0006",
            Self::TokenExpired => "E0007",
            Self::TokenInvalid => "E0008",

            // User
            Self::EmailAlreadyExists => "E1001",
            Self::UserNotFound => "E1002",
            Self::WrongPassword => "E1003",

            // Cat
            Self::CatNotFound => "E2001",
            Self::CatSexLocked => "E2002",

            // Cat match
            Self::CatMatchNotFound => "E3001",
            Self::CatUnavailable => "E3002",
            Self::CatsSameSex => "E3003",
            Self::CannotMatchOwnCat => "E3004",
            Self::CatAlreadyMatched => "E3005",
            Self::MatchNotWaiting => "E3006",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ValidationError | Self::BadRequest | Self::WrongPassword
            | Self::CatSexLocked | Self::CatUnavailable | Self::CatsSameSex
            | Self::CannotMatchOwnCat | Self::CatAlreadyMatched
            | Self::MatchNotWaiting => StatusCode::BAD_REQUEST,
            Self::NotFound | Self::UserNotFound | Self::CatNotFound
            | Self::CatMatchNotFound => StatusCode::NOT_FOUND,
            Self::Unauthorized | Self::TokenExpired | Self::TokenInvalid => StatusCode::UNAUTHORIZED,
            Self::Conflict | Self::EmailAlreadyExists => StatusCode::CONFLICT,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{message}")]
    Known {
        code: ErrorCode,
        message: String,
        details: Option<serde_json::Value>,
    },

    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),
}

impl AppError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Known {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(code: ErrorCode, message: impl Into<String>, details: serde_json::Value) -> Self {
        Self::Known {
            code,
            message: message.into(),
            details: Some(details),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Conflict, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// The error code this error is reported under.
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Known { code, .. } => *code,
            AppError::Database(diesel::result::Error::NotFound) => ErrorCode::NotFound,
            AppError::Database(_) => ErrorCode::InternalError,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_response) = match &self {
            AppError::Known { code, message, details } => {
                let status = code.status_code();
                if status.is_server_error() {
                    tracing::error!(code = code.code(), "{message}");
                }
                let mut resp = ApiErrorResponse::new(code.code(), message);
                if let Some(d) = details {
                    resp = resp.with_details(d.clone());
                }
                (status, resp)
            }
            AppError::Database(err) => {
                tracing::error!(error = %err, "database error");
                match err {
                    diesel::result::Error::NotFound => (
                        StatusCode::NOT_FOUND,
                        ApiErrorResponse::new("E0003", "resource not found"),
                    ),
                    _ => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ApiErrorResponse::new("E0001", "database error"),
                    ),
                }
            }
        };

        (status, Json(error_response)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
