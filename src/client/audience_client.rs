use std::time::Duration;

use anyhow::Context;

use reqwest::Client;

use serde::{Deserialize, Serialize};

use secrecy::Secret;

use url::Url;

use super::{check_status, ClientError};

/// A contact in a mailing-list audience, as stored by the provider
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AudienceContact {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub unsubscribed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewContact {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub unsubscribed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContactUpdate {
    pub unsubscribed: bool,
}

/// Mailing-list contacts owned by the provider.
/// NOTE: The provider does not offer a lookup by email, callers list and filter
#[async_trait::async_trait]
pub trait AudienceManager: Send + Sync {
    /// List every contact in an audience
    async fn list(&self, audience_id: &str) -> Result<Vec<AudienceContact>, ClientError>;

    /// Create a contact, returning its id when the provider echoes one back
    async fn create(
        &self,
        audience_id: &str,
        contact: &NewContact,
    ) -> Result<Option<String>, ClientError>;

    /// Update an existing contact by provider id
    async fn update(
        &self,
        audience_id: &str,
        contact_id: &str,
        update: &ContactUpdate,
    ) -> Result<(), ClientError>;
}

/// REST client for the provider's audience API
#[derive(Debug)]
pub struct AudienceClient {
    client: Client,

    api_base_url: Url,
    api_auth_token: Secret<String>,
}

impl AudienceClient {
    pub fn new(
        api_timeout: Duration,
        api_base_url: Url,
        api_auth_token: Secret<String>,
    ) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(api_timeout)
            .build()
            .context("Failed to build http client")?;

        if api_base_url.cannot_be_a_base() {
            anyhow::bail!("{} cannot be used as an audience API base URL", api_base_url);
        }

        Ok(Self {
            client,
            api_base_url,
            api_auth_token,
        })
    }

    fn contacts_url(&self, audience_id: &str, contact_id: Option<&str>) -> Result<Url, ClientError> {
        let mut url = self.api_base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| ClientError::InvalidBaseUrl)?;
            segments
                .pop_if_empty()
                .extend(["audiences", audience_id, "contacts"]);
            if let Some(contact_id) = contact_id {
                segments.push(contact_id);
            }
        }
        Ok(url)
    }
}

#[derive(Debug, Deserialize)]
struct ListContactsResponse {
    #[serde(default)]
    data: Vec<AudienceContact>,
}

#[derive(Debug, Deserialize)]
struct ContactIdResponse {
    id: Option<String>,
}

#[async_trait::async_trait]
impl AudienceManager for AudienceClient {
    #[tracing::instrument(name = "List audience contacts", skip(self))]
    async fn list(&self, audience_id: &str) -> Result<Vec<AudienceContact>, ClientError> {
        use secrecy::ExposeSecret;

        let res = self
            .client
            .get(self.contacts_url(audience_id, None)?)
            .bearer_auth(self.api_auth_token.expose_secret())
            .send()
            .await?;

        let contacts: ListContactsResponse = check_status(res).await?.json().await?;
        Ok(contacts.data)
    }

    #[tracing::instrument(name = "Create audience contact", skip(self, contact))]
    async fn create(
        &self,
        audience_id: &str,
        contact: &NewContact,
    ) -> Result<Option<String>, ClientError> {
        use secrecy::ExposeSecret;

        let res = self
            .client
            .post(self.contacts_url(audience_id, None)?)
            .bearer_auth(self.api_auth_token.expose_secret())
            .json(contact)
            .send()
            .await?;

        // Some create paths answer without a body, the caller falls back to a lookup
        let created = check_status(res).await?.json::<ContactIdResponse>().await;
        Ok(created.ok().and_then(|created| created.id))
    }

    #[tracing::instrument(name = "Update audience contact", skip(self))]
    async fn update(
        &self,
        audience_id: &str,
        contact_id: &str,
        update: &ContactUpdate,
    ) -> Result<(), ClientError> {
        use secrecy::ExposeSecret;

        let res = self
            .client
            .patch(self.contacts_url(audience_id, Some(contact_id))?)
            .bearer_auth(self.api_auth_token.expose_secret())
            .json(update)
            .send()
            .await?;

        check_status(res).await?;
        Ok(())
    }
}
