use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Failures a people route can report.
///
/// Every variant renders as 400 with `{ "error": kind, "message": text }`.
/// A missing record is not an error; the store returns `None` instead.
#[derive(Debug, Error)]
pub enum PeopleError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    StoreUnavailable(String),
}

impl PeopleError {
    pub fn kind(&self) -> &'static str {
        match self {
            PeopleError::Validation(_) => "ValidationError",
            PeopleError::StoreUnavailable(_) => "StoreUnavailable",
        }
    }
}

impl From<mongodb::error::Error> for PeopleError {
    fn from(err: mongodb::error::Error) -> Self {
        PeopleError::StoreUnavailable(err.to_string())
    }
}

impl IntoResponse for PeopleError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: &'static str,
            message: String,
        }

        tracing::warn!(kind = self.kind(), error = %self, "People request failed");

        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: self.kind(),
                message: self.to_string(),
            }),
        )
            .into_response()
    }
}
