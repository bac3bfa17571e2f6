use reqwest::StatusCode;

use wiremock::matchers::*;
use wiremock::{Mock, ResponseTemplate};

use crate::helpers::{contacts, TestApp, AUDIENCE_ID};

async fn mount_contacts(app: &TestApp, audience_id: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/audiences/{}/contacts", audience_id)))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(contacts(serde_json::json!([
                { "id": "c_1", "email": "ada@example.com", "unsubscribed": false },
                { "id": "c_2", "email": "grace@example.com", "unsubscribed": true }
            ]))),
        )
        .expect(1)
        .mount(&app.provider)
        .await;
}

async fn is_subscribed(app: &TestApp, query: &[(&str, &str)]) -> bool {
    let res = app
        .check_subscription(query)
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::OK, res.status());
    let body: serde_json::Value = res.json().await.unwrap();
    body["isSubscribed"]
        .as_bool()
        .expect("Response has no isSubscribed flag")
}

#[tokio::test]
async fn active_contact_is_subscribed() {
    let app = TestApp::spawn().await;
    mount_contacts(&app, AUDIENCE_ID).await;

    assert!(is_subscribed(&app, &[("email", "ADA@example.com")]).await);
}

#[tokio::test]
async fn unsubscribed_contact_is_not_subscribed() {
    let app = TestApp::spawn().await;
    mount_contacts(&app, AUDIENCE_ID).await;

    assert!(!is_subscribed(&app, &[("email", "grace@example.com")]).await);
}

#[tokio::test]
async fn unknown_contact_is_not_subscribed() {
    let app = TestApp::spawn().await;
    mount_contacts(&app, AUDIENCE_ID).await;

    assert!(!is_subscribed(&app, &[("email", "alan@example.com")]).await);
}

#[tokio::test]
async fn explicit_audience_is_queried() {
    let app = TestApp::spawn().await;
    mount_contacts(&app, "aud_other").await;

    assert!(is_subscribed(&app, &[("email", "ada@example.com"), ("audienceId", "aud_other")]).await);
}

#[tokio::test]
async fn provider_failure_reads_as_not_subscribed() {
    let app = TestApp::spawn().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&app.provider)
        .await;

    assert!(!is_subscribed(&app, &[("email", "ada@example.com")]).await);
}

#[tokio::test]
async fn missing_email_is_json_bad_request() {
    let app = TestApp::spawn().await;

    let res = app
        .check_subscription(&[])
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::BAD_REQUEST, res.status());
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!("Error: Invalid query parameters", body["message"]);
}
