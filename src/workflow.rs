mod links;

pub use links::LinkBuilder;

use std::sync::Arc;

use chrono::Utc;

use crate::client::{
    AudienceContact, AudienceManager, ClientError, ContactUpdate, NewContact, Notifier,
};
use crate::crypto::{SubscriptionToken, TokenIssuer};
use crate::domain::{EmailAddress, PersonName};
use crate::error::{WorkflowError, WorkflowResult};
use crate::repo::{NewPendingSubscription, PendingSubscriptionStore};
use crate::retry::RetryPolicy;
use crate::templates::emails;

/// Unvalidated subscribe request as submitted by a visitor
#[derive(Debug, Clone, Default)]
pub struct SubscriptionRequest {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

/// Outcome of a successful confirmation
#[derive(Debug, Clone, PartialEq)]
pub struct ConfirmedSubscriber {
    pub contact_id: String,
    pub email: EmailAddress,
    pub first_name: String,
}

/// Workflow parameters fixed at start-up
#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    pub audience_id: String,
    pub links: LinkBuilder,
    pub retry: RetryPolicy,
}

/// Double opt-in mailing-list workflow.
///
/// A subscribe request stores a pending subscription and mails a confirmation
/// link; following the link adds the contact to the audience. Unsubscribing
/// flips the contact's `unsubscribed` flag. Every provider call goes through
/// the retry policy, which only retries on rate limits.
pub struct SubscriptionWorkflow {
    store: Arc<dyn PendingSubscriptionStore>,
    audience: Arc<dyn AudienceManager>,
    notifier: Arc<dyn Notifier>,
    tokens: TokenIssuer,
    config: WorkflowConfig,
}

impl SubscriptionWorkflow {
    pub fn new(
        store: Arc<dyn PendingSubscriptionStore>,
        audience: Arc<dyn AudienceManager>,
        notifier: Arc<dyn Notifier>,
        config: WorkflowConfig,
    ) -> Self {
        Self {
            store,
            audience,
            notifier,
            tokens: TokenIssuer,
            config,
        }
    }

    /// NoRecord -> Pending: store a pending subscription and send the confirmation link
    #[tracing::instrument(name = "Request a subscription", skip(self, request), fields(email = %request.email))]
    pub async fn request_subscription(&self, request: SubscriptionRequest) -> WorkflowResult<()> {
        let email: EmailAddress = request.email.parse().map_err(WorkflowError::Validation)?;
        let first_name: PersonName = request
            .first_name
            .parse()
            .map_err(WorkflowError::Validation)?;
        let last_name: PersonName = request
            .last_name
            .parse()
            .map_err(WorkflowError::Validation)?;

        let issued = self.tokens.issue();
        let pending = NewPendingSubscription {
            email,
            first_name,
            last_name,
            token: issued.token,
            expires_at: issued.expires_at,
        };

        // No email goes out unless the pending row is stored
        self.store.insert(&pending).await?;

        let link = self.config.links.confirmation(&pending.token, &pending.email);
        let email = emails::confirmation(&pending.email, pending.first_name.as_ref(), &link);
        self.config
            .retry
            .call("send confirmation email", || self.notifier.send(&email))
            .await
            .map_err(WorkflowError::delivery("Failed to send confirmation email"))?;

        tracing::info!("Confirmation email sent");
        Ok(())
    }

    /// Pending -> Confirmed: add the contact, welcome them, then drop the pending row.
    ///
    /// The row is deleted last, so a link whose earlier attempt failed part way
    /// can simply be followed again.
    #[tracing::instrument(name = "Confirm a subscription", skip(self, token))]
    pub async fn confirm_subscription(
        &self,
        token: &str,
        email: &str,
    ) -> WorkflowResult<ConfirmedSubscriber> {
        if token.trim().is_empty() || email.trim().is_empty() {
            return Err(WorkflowError::Validation("Missing token or email".into()));
        }
        // A malformed token or address can never match a stored row
        let token: SubscriptionToken = token.parse().map_err(|_| WorkflowError::InvalidLink)?;
        let email: EmailAddress = email.parse().map_err(|_| WorkflowError::InvalidLink)?;

        let pending = self
            .store
            .find_one(&email, &token)
            .await?
            .ok_or(WorkflowError::InvalidLink)?;

        // Expired rows are left in place
        if pending.is_expired_at(Utc::now()) {
            return Err(WorkflowError::ExpiredLink);
        }

        let new_contact = NewContact {
            email: email.to_string(),
            first_name: pending.first_name.clone(),
            last_name: pending.last_name.clone(),
            unsubscribed: false,
        };
        let contact_id = self
            .upsert_contact(&email, &new_contact)
            .await?
            .ok_or(WorkflowError::Delivery {
                context: "Failed to add contact",
                source: None,
            })?;

        let unsubscribe_link = self.config.links.unsubscribe(&email, &contact_id);
        let welcome = emails::welcome(&email, &pending.first_name, &unsubscribe_link);
        self.config
            .retry
            .call("send welcome email", || self.notifier.send(&welcome))
            .await
            .map_err(WorkflowError::delivery("Failed to send welcome email"))?;

        self.store.delete_by_id(pending.id).await?;

        tracing::info!(contact_id = %contact_id, "Subscription confirmed");
        Ok(ConfirmedSubscriber {
            contact_id,
            email,
            first_name: pending.first_name,
        })
    }

    /// Confirmed -> Unsubscribed: flag the contact and send an unsubscribe confirmation.
    /// `first_name` personalizes the email, defaulting to the name stored with the contact.
    #[tracing::instrument(name = "Unsubscribe a contact", skip(self, first_name))]
    pub async fn unsubscribe(&self, email: &str, first_name: Option<&str>) -> WorkflowResult<()> {
        let email: EmailAddress = email.parse().map_err(WorkflowError::Validation)?;

        let contact = self
            .find_contact(&self.config.audience_id, &email)
            .await
            .map_err(WorkflowError::delivery("Failed to look up contact"))?
            .ok_or(WorkflowError::NotFound)?;

        let update = ContactUpdate { unsubscribed: true };
        self.config
            .retry
            .call("unsubscribe contact", || {
                self.audience
                    .update(&self.config.audience_id, &contact.id, &update)
            })
            .await
            .map_err(WorkflowError::delivery("Failed to unsubscribe contact"))?;

        // The flag stays flipped even if this email cannot be sent
        let first_name = first_name
            .filter(|name| !name.trim().is_empty())
            .or(contact.first_name.as_deref())
            .unwrap_or_default();
        let link = self.config.links.resubscribe(&email);
        let email = emails::unsubscribed(&email, first_name, &link);
        self.config
            .retry
            .call("send unsubscribe email", || self.notifier.send(&email))
            .await
            .map_err(WorkflowError::delivery(
                "Failed to send unsubscribe confirmation email",
            ))?;

        tracing::info!(contact_id = %contact.id, "Contact unsubscribed");
        Ok(())
    }

    /// Whether `email` is an active subscriber of `audience_id` (the configured audience by default).
    ///
    /// Fails closed: any error, including an invalid address, reads as not subscribed.
    #[tracing::instrument(name = "Check subscription status", skip(self))]
    pub async fn check_subscription_status(&self, email: &str, audience_id: Option<&str>) -> bool {
        let email: EmailAddress = match email.parse() {
            Ok(email) => email,
            Err(error) => {
                tracing::warn!(error = %error, "Treating invalid email as not subscribed");
                return false;
            }
        };
        let audience_id = audience_id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or(self.config.audience_id.as_str());

        match self.find_contact(audience_id, &email).await {
            Ok(contact) => contact.map_or(false, |contact| !contact.unsubscribed),
            Err(error) => {
                tracing::warn!(error.cause_chain = ?error, "Treating failed lookup as not subscribed");
                false
            }
        }
    }

    /// Find a contact by listing the audience
    async fn find_contact(
        &self,
        audience_id: &str,
        email: &EmailAddress,
    ) -> Result<Option<AudienceContact>, ClientError> {
        let contacts = self
            .config
            .retry
            .call("list contacts", || self.audience.list(audience_id))
            .await?;

        Ok(contacts.into_iter().find(|contact| email.matches(&contact.email)))
    }

    /// Create the contact, or resubscribe it if the audience already has it.
    /// Returns the provider id, `None` when the provider never revealed one.
    async fn upsert_contact(
        &self,
        email: &EmailAddress,
        new_contact: &NewContact,
    ) -> WorkflowResult<Option<String>> {
        let audience_id = &self.config.audience_id;
        let to_delivery = WorkflowError::delivery;

        if let Some(existing) = self
            .find_contact(audience_id, email)
            .await
            .map_err(to_delivery("Failed to add contact"))?
        {
            let update = ContactUpdate {
                unsubscribed: false,
            };
            self.config
                .retry
                .call("resubscribe contact", || {
                    self.audience.update(audience_id, &existing.id, &update)
                })
                .await
                .map_err(to_delivery("Failed to add contact"))?;
            return Ok(Some(existing.id));
        }

        let created = self
            .config
            .retry
            .call("create contact", || self.audience.create(audience_id, new_contact))
            .await
            .map_err(to_delivery("Failed to add contact"))?;
        if created.is_some() {
            return Ok(created);
        }

        // Creation does not always echo the id back, look it up instead
        let contact = self
            .find_contact(audience_id, email)
            .await
            .map_err(to_delivery("Failed to add contact"))?;
        Ok(contact.map(|contact| contact.id))
    }
}
