/// Transactional email bodies
pub mod emails;
/// Branded HTML pages shown after following an email link
pub mod pages;

/// Escape user-provided text for interpolation into HTML
fn escape(value: &str) -> String {
    htmlescape::encode_minimal(value)
}

/// Greeting used by every template, falling back to a generic one for blank names
fn greeting(first_name: &str) -> String {
    if first_name.trim().is_empty() {
        "Hi there".to_string()
    } else {
        format!("Hi {}", first_name.trim())
    }
}
