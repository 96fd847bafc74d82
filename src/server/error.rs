use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use crate::errors::DrugError;

/// Message returned for unhandled failures (panics, unexpected faults)
pub const GENERIC_ERROR: &str = "Something went wrong!";

/// JSON error response: `{"error": "<message>"}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// Map a domain error. Store faults are logged and reduced to `fallback`
    /// so no internal detail reaches the client.
    pub fn from_drug_error(err: DrugError, fallback: &str) -> Self {
        match err {
            DrugError::NotFound(_) => Self::not_found("Drug not found"),
            DrugError::DuplicateCode(_) => Self::bad_request("Drug code already exists"),
            DrugError::InvalidQuery(message) | DrugError::Validation(message) => {
                Self::bad_request(message)
            }
            DrugError::Store(err) => {
                error!("{}: {}", fallback, err);
                Self::internal(fallback)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::StoreError;

    #[test]
    fn store_faults_do_not_leak() {
        let err = DrugError::Store(StoreError::Database(sea_orm::DbErr::Custom(
            "disk I/O error at /var/lib/drugs.db".into(),
        )));
        let api = ApiError::from_drug_error(err, "Failed to fetch drugs");
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api.message, "Failed to fetch drugs");
    }

    #[test]
    fn client_errors_keep_their_message() {
        let api = ApiError::from_drug_error(DrugError::NotFound(3), "unused");
        assert_eq!(api, ApiError::not_found("Drug not found"));

        let api = ApiError::from_drug_error(DrugError::DuplicateCode("X".into()), "unused");
        assert_eq!(api, ApiError::bad_request("Drug code already exists"));

        let api = ApiError::from_drug_error(DrugError::InvalidQuery("page must be a positive integer".into()), "unused");
        assert_eq!(api.message, "page must be a positive integer");
    }
}
