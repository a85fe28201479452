//! HTTP mapping for everything a handler can fail with.
//!
//! Every failure becomes a JSON object: either the field-to-message map of a
//! validation failure or a single `Error` / `errorMessage` entry.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use domain::DomainError;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, error};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Bad HTTP request or malformed JSON")]
    MalformedJson,

    #[error("Date should be in the format YYYY-MM-DD")]
    MalformedDate,

    #[error("Bad url argument")]
    BadUrlArgument,
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        debug!(%rejection, "Rejected request body");
        ApiError::MalformedJson
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        debug!(%rejection, "Rejected path argument");
        ApiError::BadUrlArgument
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        debug!(%rejection, "Rejected query string");
        ApiError::BadUrlArgument
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        match self {
            ApiError::Domain(DomainError::Validation(errors)) => {
                (StatusCode::BAD_REQUEST, Json(errors)).into_response()
            }
            ApiError::Domain(DomainError::UserNotFound(_)) => {
                error_body(StatusCode::NOT_FOUND, "Error", message)
            }
            ApiError::Domain(DomainError::RepositoryError(detail)) => {
                // Don't expose internal error details to clients
                error!(error = %detail, "Repository failure");
                error_body(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Error",
                    "Internal server error".to_string(),
                )
            }
            ApiError::MalformedDate => error_body(StatusCode::BAD_REQUEST, "errorMessage", message),
            ApiError::Domain(_) | ApiError::MalformedJson | ApiError::BadUrlArgument => {
                error_body(StatusCode::BAD_REQUEST, "Error", message)
            }
        }
    }
}

fn error_body(status: StatusCode, key: &'static str, message: String) -> Response {
    (status, Json(BTreeMap::from([(key, message)]))).into_response()
}
