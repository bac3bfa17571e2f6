use std::collections::BTreeMap;

use url::Url;

use crate::client::Email;
use crate::domain::EmailAddress;

use super::{escape, greeting};

/// Email asking a new subscriber to confirm their address
pub fn confirmation(recipient: &EmailAddress, first_name: &str, confirmation_link: &Url) -> Email {
    let greeting = greeting(first_name);
    let html_body = format!(
        "<p>{}!</p>\
         <p>Thanks for signing up to our newsletter. Please confirm your subscription by clicking \
         <a href=\"{link}\">this link</a>.</p>\
         <p>The link expires in 24 hours.</p>",
        escape(&greeting),
        link = escape(confirmation_link.as_str()),
    );
    let text_body = format!(
        "{}!\n\nThanks for signing up to our newsletter. \
         To confirm your subscription, visit this web page: {}\n\nThe link expires in 24 hours.",
        greeting, confirmation_link
    );

    Email {
        recipient: recipient.clone(),
        subject: "Please confirm your subscription".into(),
        html_body,
        text_body,
        headers: BTreeMap::new(),
    }
}

/// Welcome email sent once a subscription is confirmed.
/// Carries `List-Unsubscribe` headers so mail clients can offer one-click unsubscribe.
pub fn welcome(recipient: &EmailAddress, first_name: &str, unsubscribe_link: &Url) -> Email {
    let greeting = greeting(first_name);
    let html_body = format!(
        "<p>{}!</p>\
         <p>Your subscription is confirmed. Welcome aboard, you will hear from us soon.</p>\
         <p>Changed your mind? <a href=\"{link}\">Unsubscribe</a> at any time.</p>",
        escape(&greeting),
        link = escape(unsubscribe_link.as_str()),
    );
    let text_body = format!(
        "{}!\n\nYour subscription is confirmed. Welcome aboard, you will hear from us soon.\n\n\
         Changed your mind? Unsubscribe at any time: {}",
        greeting, unsubscribe_link
    );

    let mut headers = BTreeMap::new();
    headers.insert(
        "List-Unsubscribe".to_string(),
        format!("<{}>", unsubscribe_link),
    );
    headers.insert(
        "List-Unsubscribe-Post".to_string(),
        "List-Unsubscribe=One-Click".to_string(),
    );

    Email {
        recipient: recipient.clone(),
        subject: "Welcome to our newsletter!".into(),
        html_body,
        text_body,
        headers,
    }
}

/// Email confirming an unsubscribe, with a way back in
pub fn unsubscribed(recipient: &EmailAddress, first_name: &str, resubscribe_link: &Url) -> Email {
    let greeting = greeting(first_name);
    let html_body = format!(
        "<p>{}!</p>\
         <p>You have been unsubscribed and will no longer receive our newsletter.</p>\
         <p>Unsubscribed by mistake? <a href=\"{link}\">Subscribe again</a>.</p>",
        escape(&greeting),
        link = escape(resubscribe_link.as_str()),
    );
    let text_body = format!(
        "{}!\n\nYou have been unsubscribed and will no longer receive our newsletter.\n\n\
         Unsubscribed by mistake? Subscribe again: {}",
        greeting, resubscribe_link
    );

    Email {
        recipient: recipient.clone(),
        subject: "You have been unsubscribed".into(),
        html_body,
        text_body,
        headers: BTreeMap::new(),
    }
}
