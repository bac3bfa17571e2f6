mod audience_client;
mod email_client;

pub use audience_client::{AudienceClient, AudienceContact, AudienceManager, ContactUpdate, NewContact};
pub use email_client::{Email, EmailClient, Notifier};

use reqwest::{Response, StatusCode};

use serde::Deserialize;

use crate::retry::RateLimited;

/// Failures talking to the email/audience provider
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Provider rate limit reached: {0}")]
    RateLimited(String),

    #[error("Provider responded with {status}: {message}")]
    Api { status: StatusCode, message: String },

    #[error("Provider responded without data")]
    MissingData,

    #[error("Provider base URL cannot hold a path")]
    InvalidBaseUrl,

    #[error("Failed to reach provider")]
    Http(#[from] reqwest::Error),
}

impl RateLimited for ClientError {
    fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited(_))
    }
}

/// Error payload returned by the provider on non-2xx responses
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
}

/// Turn a non-2xx provider response into a `ClientError`, keeping the provider's message
async fn check_status(res: Response) -> Result<Response, ClientError> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }

    let message = res
        .json::<ApiErrorBody>()
        .await
        .ok()
        .and_then(|body| body.message)
        .unwrap_or_else(|| status.to_string());

    if status == StatusCode::TOO_MANY_REQUESTS {
        Err(ClientError::RateLimited(message))
    } else {
        Err(ClientError::Api { status, message })
    }
}
