//! Mapping of pipeline failures onto HTTP responses.
//!
//! Full error detail stays in the server log; clients only ever see one of
//! the fixed messages below.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

use larder_ai::AiError;
use larder_document::RenderError;

pub const INGREDIENTS_REQUIRED: &str = "Please provide an array of ingredients";
pub const RENDER_FIELDS_REQUIRED: &str = "Please provide both ingredients and recipe";
pub const CREDENTIAL_MESSAGE: &str =
    "Invalid or missing AI API key. Please check your configuration.";
pub const QUOTA_MESSAGE: &str = "API quota exceeded. Please try again later.";
pub const TIMEOUT_MESSAGE: &str =
    "The recipe service took too long to respond. Please try again.";
pub const RECIPE_FAILED: &str = "Failed to generate recipe. Please try again.";
pub const RECIPE_PDF_FAILED: &str = "Failed to generate recipe and PDF. Please try again.";
pub const PDF_FAILED: &str = "Failed to generate PDF. Please try again.";

#[derive(Debug, Error)]
pub enum ApiError {
    /// The client sent a missing or malformed field.
    #[error("invalid request: {0}")]
    Validation(&'static str),

    /// The model call failed. `fallback` is shown for unclassified failures.
    #[error("recipe generation failed: {source}")]
    Generation {
        #[source]
        source: AiError,
        fallback: &'static str,
    },

    #[error("document rendering failed: {0}")]
    Render(#[from] RenderError),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
}

impl ApiError {
    pub fn generation(source: AiError, fallback: &'static str) -> Self {
        ApiError::Generation { source, fallback }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Generation { .. } | ApiError::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The user-safe message sent in the response body.
    pub fn client_message(&self) -> &'static str {
        match self {
            ApiError::Validation(message) => message,
            ApiError::Generation { source, fallback } => match source {
                AiError::Credential { .. } => CREDENTIAL_MESSAGE,
                AiError::Quota { .. } => QUOTA_MESSAGE,
                AiError::Timeout { .. } => TIMEOUT_MESSAGE,
                AiError::Upstream { .. } => fallback,
            },
            ApiError::Render(_) => PDF_FAILED,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Validation(_) => warn!("Rejected request: {}", self),
            _ => error!("Request failed: {}", self),
        }

        let body = ErrorBody {
            error: self.client_message(),
        };
        (self.status(), Json(body)).into_response()
    }
}
