use std::collections::BTreeMap;

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    response::{IntoResponse, Response},
    Json,
};
use http::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

pub type ApiResult<T, E = ApiError> = std::result::Result<T, E>;

/// Messages per field of rejected input
pub type FieldErrors = BTreeMap<String, Vec<String>>;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid input: {message}")]
    InvalidInput {
        message: String,
        fields: Option<FieldErrors>,
    },

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Authentication required")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        ApiError::InvalidInput {
            message: message.into(),
            fields: None,
        }
    }

    pub fn invalid_field(field: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        let mut fields = FieldErrors::new();
        fields.insert(field.to_string(), vec![message.clone()]);
        ApiError::InvalidInput {
            message,
            fields: Some(fields),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput { .. } | ApiError::InvalidQuery(_) | ApiError::Conflict(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidInput { .. } => "VALIDATION_ERROR",
            ApiError::InvalidQuery(_) => "INVALID_QUERY",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::Unauthorized => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

/// JSON body of every error response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<FieldErrors>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code().to_string();
        let body = match self {
            ApiError::InvalidInput { message, fields } => ErrorBody {
                code,
                message,
                fields,
            },
            ApiError::Internal(msg) => {
                error!("Internal error: {msg}");
                ErrorBody {
                    code,
                    message: "Internal server error".to_string(),
                    fields: None,
                }
            }
            ApiError::Unauthorized => ErrorBody {
                code,
                message: "Authentication credentials were not provided or are invalid".to_string(),
                fields: None,
            },
            ApiError::InvalidQuery(msg)
            | ApiError::Conflict(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg) => ErrorBody {
                code,
                message: msg,
                fields: None,
            },
        };
        (status, Json(body)).into_response()
    }
}

impl From<yamdb_dal::Error> for ApiError {
    fn from(e: yamdb_dal::Error) -> Self {
        use yamdb_dal::Error as DalError;
        match e {
            DalError::RecordNotFound(what) => ApiError::NotFound(format!("{what} not found")),
            DalError::Conflict(msg) => ApiError::Conflict(msg),
            DalError::InvalidReference(msg) => ApiError::invalid_input(msg),
            DalError::InvalidOrderByField(field) => {
                ApiError::InvalidQuery(format!("Cannot sort by {field}"))
            }
            DalError::InvalidCredentials => {
                ApiError::invalid_field("confirmation_code", "Invalid confirmation code")
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<yamdb_auth::Error> for ApiError {
    fn from(e: yamdb_auth::Error) -> Self {
        ApiError::Internal(format!("Token error: {e}"))
    }
}

impl From<garde::Report> for ApiError {
    fn from(report: garde::Report) -> Self {
        let mut fields = FieldErrors::new();
        for (path, error) in report.iter() {
            let field = path.to_string();
            let field = if field.is_empty() {
                "non_field_errors".to_string()
            } else {
                field
            };
            fields
                .entry(field)
                .or_default()
                .push(error.message().to_string());
        }
        debug!("Validation failed: {report}");
        ApiError::InvalidInput {
            message: "Invalid input".to_string(),
            fields: Some(fields),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::invalid_input(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::InvalidQuery(rejection.body_text())
    }
}
