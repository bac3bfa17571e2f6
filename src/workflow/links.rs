use url::Url;

use crate::crypto::SubscriptionToken;
use crate::domain::EmailAddress;

/// Builds the absolute links embedded in workflow emails
#[derive(Debug, Clone)]
pub struct LinkBuilder {
    base_url: Url,
}

impl LinkBuilder {
    pub fn new(base_url: Url) -> anyhow::Result<Self> {
        if base_url.cannot_be_a_base() {
            anyhow::bail!("{} cannot be used as a link base URL", base_url);
        }
        Ok(Self { base_url })
    }

    /// Append `segments` to the base URL path, keeping any prefix it carries
    fn link(&self, segments: &[&str], query: &[(&str, &str)]) -> Url {
        let mut url = self.base_url.clone();
        url.set_query(None);
        url.set_fragment(None);
        // Checked in `new`
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url.query_pairs_mut().extend_pairs(query);
        url
    }

    pub fn confirmation(&self, token: &SubscriptionToken, email: &EmailAddress) -> Url {
        self.link(
            &["api", "confirm-subscription"],
            &[("token", token.as_ref()), ("email", email.as_ref())],
        )
    }

    pub fn unsubscribe(&self, email: &EmailAddress, contact_id: &str) -> Url {
        self.link(
            &["api", "unsubscribe"],
            &[("email", email.as_ref()), ("id", contact_id)],
        )
    }

    pub fn resubscribe(&self, email: &EmailAddress) -> Url {
        self.link(&["newsletter"], &[("email", email.as_ref())])
    }
}
