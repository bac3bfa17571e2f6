use chrono::{Duration, Utc};

use reqwest::StatusCode;

use uuid::Uuid;

use wiremock::matchers::*;
use wiremock::{Mock, ResponseTemplate};

use optin::repo::PendingSubscription;

use crate::helpers::{contacts, SubscribeForm, TestApp, AUDIENCE_ID};

async fn mount_email_api(app: &TestApp) {
    Mock::given(method("POST"))
        .and(path("/emails"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "msg_1"})))
        .mount(&app.provider)
        .await;
}

async fn mount_empty_audience(app: &TestApp) {
    Mock::given(method("GET"))
        .and(path(format!("/audiences/{}/contacts", AUDIENCE_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(contacts(serde_json::json!([]))))
        .mount(&app.provider)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("/audiences/{}/contacts", AUDIENCE_ID)))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({"id": "c_1"})))
        .mount(&app.provider)
        .await;
}

#[tokio::test]
async fn subscribe_sends_confirmation_email() {
    let app = TestApp::spawn().await;
    mount_email_api(&app).await;

    let res = app
        .subscribe(&SubscribeForm::ada())
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::OK, res.status());
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!("Confirmation email sent", body["message"]);

    let emails = app.sent_emails().await;
    assert_eq!(1, emails.len());
    assert_eq!(serde_json::json!(["ada@example.com"]), emails[0]["to"]);
    assert_eq!("Please confirm your subscription", emails[0]["subject"]);

    let rows = app.store.rows().unwrap();
    assert_eq!(1, rows.len());
    assert_eq!("ada@example.com", rows[0].email);
    assert_eq!("Ada", rows[0].first_name);
    assert!(rows[0].expires_at > Utc::now() + Duration::hours(23));
}

#[tokio::test]
async fn subscribe_rejects_invalid_input() {
    let app = TestApp::spawn().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.provider)
        .await;

    let test_cases = vec![
        (
            "missing email",
            SubscribeForm {
                email: "".into(),
                ..SubscribeForm::ada()
            },
        ),
        (
            "invalid email",
            SubscribeForm {
                email: "not-an-email".into(),
                ..SubscribeForm::ada()
            },
        ),
        (
            "invalid first name",
            SubscribeForm {
                first_name: "<script>".into(),
                ..SubscribeForm::ada()
            },
        ),
    ];

    for (description, form) in test_cases {
        let res = app.subscribe(&form).await.expect("Failed to execute request");

        assert_eq!(
            StatusCode::BAD_REQUEST,
            res.status(),
            "The API did not reject a request with {}",
            description
        );
        let body: serde_json::Value = res.json().await.unwrap();
        assert!(body["message"].as_str().unwrap().starts_with("Error: "));
    }

    assert!(app.store.rows().unwrap().is_empty());
}

#[tokio::test]
async fn malformed_subscribe_body_is_json_bad_request() {
    let app = TestApp::spawn().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.provider)
        .await;

    let test_cases = vec![
        ("{}", "missing email"),
        ("{\"email\": 42}", "non-string email"),
        ("not json", "invalid JSON"),
    ];

    for (body, description) in test_cases {
        let res = app
            .request(reqwest::Method::POST, "api/subscribe")
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await
            .expect("Failed to execute request");

        assert_eq!(
            StatusCode::BAD_REQUEST,
            res.status(),
            "The API did not reject a body with {}",
            description
        );
        let body: serde_json::Value = res.json().await.unwrap();
        assert_eq!(
            serde_json::json!({"message": "Error: Invalid request body"}),
            body
        );
    }
}

#[tokio::test]
async fn subscribe_reports_failed_email_without_details() {
    let app = TestApp::spawn().await;

    Mock::given(method("POST"))
        .and(path("/emails"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "message": "API key is invalid"
        })))
        .expect(1)
        .mount(&app.provider)
        .await;

    let res = app
        .subscribe(&SubscribeForm::ada())
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::INTERNAL_SERVER_ERROR, res.status());
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(
        serde_json::json!({"message": "Error: Failed to send confirmation email"}),
        body
    );
}

#[tokio::test]
async fn subscribe_retries_rate_limited_email() {
    let app = TestApp::spawn().await;

    Mock::given(method("POST"))
        .and(path("/emails"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .expect(1)
        .mount(&app.provider)
        .await;
    mount_email_api(&app).await;

    let res = app
        .subscribe(&SubscribeForm::ada())
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::OK, res.status());
    assert_eq!(2, app.sent_emails().await.len());
}

#[tokio::test]
async fn confirmation_link_adds_contact_and_sends_welcome() {
    let app = TestApp::spawn().await;
    mount_email_api(&app).await;
    mount_empty_audience(&app).await;

    app.subscribe(&SubscribeForm::ada())
        .await
        .expect("Failed to execute request");
    let confirmation = app.sent_emails().await.remove(0);

    let res = app
        .follow_link(&confirmation)
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::OK, res.status());
    let page = res.text().await.unwrap();
    assert!(page.contains("Ada"));

    let emails = app.sent_emails().await;
    assert_eq!(2, emails.len());
    assert_eq!("Welcome to our newsletter!", emails[1]["subject"]);
    assert!(emails[1]["headers"]["List-Unsubscribe"]
        .as_str()
        .unwrap()
        .contains("/api/unsubscribe"));

    assert!(app.store.rows().unwrap().is_empty());
}

#[tokio::test]
async fn confirmation_link_works_only_once() {
    let app = TestApp::spawn().await;
    mount_email_api(&app).await;
    mount_empty_audience(&app).await;

    app.subscribe(&SubscribeForm::ada())
        .await
        .expect("Failed to execute request");
    let confirmation = app.sent_emails().await.remove(0);

    let first = app.follow_link(&confirmation).await.unwrap();
    let second = app.follow_link(&confirmation).await.unwrap();

    assert_eq!(StatusCode::OK, first.status());
    assert_eq!(StatusCode::BAD_REQUEST, second.status());
}

#[tokio::test]
async fn confirm_without_parameters_is_rejected() {
    let app = TestApp::spawn().await;

    let test_cases = vec![
        ("api/confirm-subscription", "missing token and email"),
        ("api/confirm-subscription?email=ada%40example.com", "missing token"),
        ("api/confirm-subscription?token=abc", "missing email"),
    ];

    for (url, description) in test_cases {
        let res = app
            .request(reqwest::Method::GET, url)
            .send()
            .await
            .expect("Failed to execute request");

        assert_eq!(
            StatusCode::BAD_REQUEST,
            res.status(),
            "The API did not reject a link with {}",
            description
        );
        assert!(res
            .headers()
            .get("Content-Type")
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("text/html"));
    }
}

#[tokio::test]
async fn confirm_with_unknown_token_is_rejected() {
    let app = TestApp::spawn().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.provider)
        .await;

    let token = "a".repeat(64);
    let res = app
        .request(reqwest::Method::GET, "api/confirm-subscription")
        .query(&[("token", token.as_str()), ("email", "ada@example.com")])
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::BAD_REQUEST, res.status());
}

#[tokio::test]
async fn confirm_with_expired_token_keeps_pending_row() {
    let app = TestApp::spawn().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.provider)
        .await;

    let token = "b".repeat(64);
    app.store
        .put(PendingSubscription {
            id: Uuid::new_v4(),
            email: "ada@example.com".into(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            token: token.clone(),
            expires_at: Utc::now() - Duration::minutes(1),
        })
        .unwrap();

    let res = app
        .request(reqwest::Method::GET, "api/confirm-subscription")
        .query(&[("token", token.as_str()), ("email", "ada@example.com")])
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::BAD_REQUEST, res.status());
    assert!(res.text().await.unwrap().contains("subscribe again"));
    assert_eq!(1, app.store.rows().unwrap().len());
}

#[tokio::test]
async fn failed_welcome_keeps_link_usable() {
    let app = TestApp::spawn().await;
    mount_empty_audience(&app).await;

    // Confirmation goes out, the first welcome attempt is rejected
    Mock::given(method("POST"))
        .and(path("/emails"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "msg_1"})))
        .up_to_n_times(1)
        .mount(&app.provider)
        .await;
    Mock::given(method("POST"))
        .and(path("/emails"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&app.provider)
        .await;
    mount_email_api(&app).await;

    app.subscribe(&SubscribeForm::ada())
        .await
        .expect("Failed to execute request");
    let confirmation = app.sent_emails().await.remove(0);

    let failed = app.follow_link(&confirmation).await.unwrap();
    assert_eq!(StatusCode::INTERNAL_SERVER_ERROR, failed.status());
    assert_eq!(1, app.store.rows().unwrap().len());

    let retried = app.follow_link(&confirmation).await.unwrap();
    assert_eq!(StatusCode::OK, retried.status());
    assert!(app.store.rows().unwrap().is_empty());
}
