use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::Context;

use reqwest::Client;

use serde::{Deserialize, Serialize};

use secrecy::Secret;

use url::Url;

use crate::domain::EmailAddress;

use super::{check_status, ClientError};

/// Sends transactional emails.
/// NOTE: Success is signalled by the provider returning a message id, not just a 2xx status
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    /// Send an email, returning the provider's message id
    async fn send(&self, email: &Email) -> Result<String, ClientError>;
}

/// REST client for the email delivery API
#[derive(Debug)]
pub struct EmailClient {
    client: Client,
    sender: EmailAddress,

    api_send_email_url: Url,
    api_auth_token: Secret<String>,
}

impl EmailClient {
    pub fn new(
        sender: EmailAddress,
        api_timeout: Duration,
        api_base_url: Url,
        api_auth_token: Secret<String>,
    ) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(api_timeout)
            .build()
            .context("Failed to build http client")?;

        let mut api_send_email_url = api_base_url;
        api_send_email_url
            .path_segments_mut()
            .map_err(|_| anyhow::anyhow!("Email API base URL cannot hold a path"))?
            .pop_if_empty()
            .push("emails");

        Ok(Self {
            client,
            sender,
            api_send_email_url,
            api_auth_token,
        })
    }
}

#[async_trait::async_trait]
impl Notifier for EmailClient {
    #[tracing::instrument(name = "Send an email via API", skip(self, email), fields(subject = %email.subject))]
    async fn send(&self, email: &Email) -> Result<String, ClientError> {
        use secrecy::ExposeSecret;

        let body = email.as_request(&self.sender);

        let res = self
            .client
            .post(self.api_send_email_url.clone())
            .bearer_auth(self.api_auth_token.expose_secret())
            .json(&body)
            .send()
            .await?;

        let sent: SendEmailResponse = check_status(res).await?.json().await?;
        sent.id.ok_or(ClientError::MissingData)
    }
}

/// A rendered email ready to be sent
#[derive(Debug, Clone)]
pub struct Email {
    pub recipient: EmailAddress,
    pub subject: String,
    pub html_body: String,
    pub text_body: String,
    pub headers: BTreeMap<String, String>,
}

impl Email {
    fn as_request<'e>(&'e self, sender: &'e EmailAddress) -> SendEmailRequest<'e> {
        SendEmailRequest {
            from: sender.as_ref(),
            to: [self.recipient.as_ref()],
            subject: &self.subject,
            html: &self.html_body,
            text: &self.text_body,
            headers: &self.headers,
        }
    }
}

#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    headers: &'a BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct SendEmailResponse {
    id: Option<String>,
}
