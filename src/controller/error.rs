use std::fmt;

use actix_web::error::{JsonPayloadError, QueryPayloadError};
use actix_web::http::header::ContentType;
use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, ResponseError};

use serde::Serialize;

use crate::error::{error_chain_fmt, WorkflowError};
use crate::templates::pages;

pub type RestResult<T> = Result<T, RestError>;

/// JSON error returned by the subscribe/unsubscribe family of endpoints.
/// Only the opaque message reaches the client, the cause is logged.
#[derive(thiserror::Error)]
#[error("{message}")]
pub struct RestError {
    status: StatusCode,
    message: String,
    #[source]
    cause: WorkflowError,
}

impl From<WorkflowError> for RestError {
    fn from(e: WorkflowError) -> Self {
        let (status, message) = match &e {
            WorkflowError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            WorkflowError::InvalidLink | WorkflowError::ExpiredLink => {
                (StatusCode::BAD_REQUEST, e.to_string())
            }
            WorkflowError::NotFound => (StatusCode::NOT_FOUND, e.to_string()),
            WorkflowError::Delivery { context, .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, context.to_string())
            }
            WorkflowError::Persistence(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to save subscription".to_string(),
            ),
        };
        if status.is_server_error() {
            tracing::error!(error.cause_chain = ?e, "Subscription request failed");
        }
        Self {
            status,
            message: format!("Error: {}", message),
            cause: e,
        }
    }
}

impl fmt::Debug for RestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        error_chain_fmt(self, f)
    }
}

#[derive(Debug, Serialize)]
pub struct MessageBody {
    pub message: String,
}

impl ResponseError for RestError {
    fn status_code(&self) -> StatusCode {
        self.status
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status).json(MessageBody {
            message: self.message.clone(),
        })
    }
}

/// `JsonConfig` error handler, keeping malformed bodies on the JSON error contract
pub fn json_error(e: JsonPayloadError, _: &HttpRequest) -> actix_web::Error {
    tracing::warn!(error = %e, "Rejected malformed request body");
    RestError::from(WorkflowError::Validation("Invalid request body".into())).into()
}

/// `QueryConfig` error handler, keeping malformed query strings on the JSON error contract
pub fn query_error(e: QueryPayloadError, _: &HttpRequest) -> actix_web::Error {
    tracing::warn!(error = %e, "Rejected malformed query string");
    RestError::from(WorkflowError::Validation("Invalid query parameters".into())).into()
}

/// HTML error page returned by the confirmation endpoint
#[derive(thiserror::Error)]
#[error(transparent)]
pub struct PageError(#[from] WorkflowError);

impl fmt::Debug for PageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for PageError {
    fn status_code(&self) -> StatusCode {
        match self.0 {
            WorkflowError::Validation(_)
            | WorkflowError::InvalidLink
            | WorkflowError::ExpiredLink => StatusCode::BAD_REQUEST,
            WorkflowError::NotFound
            | WorkflowError::Persistence(_)
            | WorkflowError::Delivery { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self.0 {
            WorkflowError::Validation(_) => pages::missing_parameters(),
            WorkflowError::InvalidLink => pages::invalid_link(),
            WorkflowError::ExpiredLink => pages::expired_link(),
            _ => {
                tracing::error!(error.cause_chain = ?self, "Subscription confirmation failed");
                pages::generic_error()
            }
        };
        HttpResponse::build(self.status_code())
            .content_type(ContentType::html())
            .body(body)
    }
}
