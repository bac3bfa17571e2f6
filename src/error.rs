use crate::client::ClientError;
use crate::repo::StoreError;

pub type WorkflowResult<T> = Result<T, WorkflowError>;

/// Every way a subscription workflow transition can fail
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    // Input errors, never retried
    #[error("{0}")]
    Validation(String),
    // Confirmation link outcomes
    #[error("No pending subscription matches this link")]
    InvalidLink,
    #[error("The confirmation link has expired")]
    ExpiredLink,
    // Pending subscription store
    #[error("Failed to access pending subscriptions")]
    Persistence(#[from] StoreError),
    // Email/audience provider, after retries
    #[error("{context}")]
    Delivery {
        context: &'static str,
        #[source]
        source: Option<ClientError>,
    },
    #[error("Email address not found in the mailing list")]
    NotFound,
}

impl WorkflowError {
    pub(crate) fn delivery(context: &'static str) -> impl FnOnce(ClientError) -> Self {
        move |source| Self::Delivery {
            context,
            source: Some(source),
        }
    }
}

/// Format an error along with its chain of causes, for logging
pub fn error_chain_fmt(e: &impl std::error::Error, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    writeln!(f, "{}\n", e)?;
    let mut current = e.source();
    while let Some(cause) = current {
        writeln!(f, "Caused by:\n\t{}", cause)?;
        current = cause.source();
    }
    Ok(())
}
