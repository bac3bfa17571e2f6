use super::{escape, greeting};

const LOGO_URL: &str = "/logo.svg";

/// Render the fixed branded page used for every confirmation outcome
fn render(title: &str, heading: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<style>
body {{ font-family: system-ui, sans-serif; background: #f6f7f9; color: #1f2933; margin: 0; }}
main {{ max-width: 36rem; margin: 4rem auto; background: #fff; border-radius: 8px; padding: 2.5rem; text-align: center; }}
img {{ height: 48px; margin-bottom: 1.5rem; }}
h1 {{ font-size: 1.5rem; margin: 0 0 1rem; }}
</style>
</head>
<body>
<main>
<img src="{logo}" alt="Logo">
<h1>{heading}</h1>
<p>{body}</p>
</main>
</body>
</html>"#,
        title = escape(title),
        logo = LOGO_URL,
        heading = escape(heading),
        body = escape(body),
    )
}

pub fn subscription_confirmed(first_name: &str) -> String {
    render(
        "Subscription confirmed",
        &format!("{}, you're subscribed!", greeting(first_name)),
        "Thanks for confirming your email address. A welcome email is on its way.",
    )
}

pub fn missing_parameters() -> String {
    render(
        "Invalid request",
        "Something is missing",
        "The confirmation link is incomplete. Please use the full link from your email.",
    )
}

pub fn invalid_link() -> String {
    render(
        "Invalid link",
        "This link is not valid",
        "We could not find a subscription for this link. It may have already been used.",
    )
}

pub fn expired_link() -> String {
    render(
        "Link expired",
        "This link has expired",
        "Confirmation links are valid for 24 hours. Please subscribe again to receive a new one.",
    )
}

pub fn generic_error() -> String {
    render(
        "Something went wrong",
        "Something went wrong",
        "We could not confirm your subscription right now. Please try the link again later.",
    )
}
