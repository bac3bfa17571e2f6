use actix_web::dev::HttpServiceFactory;
use actix_web::http::header::ContentType;
use actix_web::{get, post, web, HttpResponse, Responder};

use serde::{Deserialize, Serialize};

use crate::templates::pages;
use crate::workflow::{SubscriptionRequest, SubscriptionWorkflow};

use super::error::{json_error, query_error, MessageBody, PageError, RestResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscribeAction {
    #[default]
    Subscribe,
    Unsubscribe,
}

/// JSON body posted by the newsletter signup form
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeBody {
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    last_name: String,
    email: String,
    #[serde(default)]
    action: SubscribeAction,
}

/// Subscribe (or, with `action=unsubscribe`, unsubscribe) endpoint
#[tracing::instrument(
    name = "Handle a subscription form",
    skip(workflow, body),
    fields(action = ?body.action)
)]
#[post("/subscribe")]
async fn subscribe(
    workflow: web::Data<SubscriptionWorkflow>,
    body: web::Json<SubscribeBody>,
) -> RestResult<impl Responder> {
    let SubscribeBody {
        first_name,
        last_name,
        email,
        action,
    } = body.into_inner();

    let message = match action {
        SubscribeAction::Subscribe => {
            let request = SubscriptionRequest {
                email,
                first_name,
                last_name,
            };
            workflow.request_subscription(request).await?;
            "Confirmation email sent"
        }
        SubscribeAction::Unsubscribe => {
            workflow.unsubscribe(&email, Some(&first_name)).await?;
            "Unsubscribed successfully"
        }
    };

    Ok(HttpResponse::Ok().json(MessageBody {
        message: message.into(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct ConfirmParameters {
    token: Option<String>,
    email: Option<String>,
}

/// Confirmation link endpoint, answers with a human-facing page
#[tracing::instrument(name = "Confirm a subscription link", skip(workflow, parameters))]
#[get("/confirm-subscription")]
async fn confirm(
    workflow: web::Data<SubscriptionWorkflow>,
    parameters: web::Query<ConfirmParameters>,
) -> Result<impl Responder, PageError> {
    let ConfirmParameters { token, email } = parameters.into_inner();

    let confirmed = workflow
        .confirm_subscription(
            token.as_deref().unwrap_or_default(),
            email.as_deref().unwrap_or_default(),
        )
        .await?;

    Ok(HttpResponse::Ok()
        .content_type(ContentType::html())
        .body(pages::subscription_confirmed(&confirmed.first_name)))
}

/// Query of the unsubscribe link embedded in welcome emails
#[derive(Debug, Deserialize)]
pub struct UnsubscribeParameters {
    email: String,
    /// Provider contact id, only recorded on the request span
    id: Option<String>,
}

async fn unsubscribe_by_link(
    workflow: &SubscriptionWorkflow,
    parameters: &UnsubscribeParameters,
) -> RestResult<HttpResponse> {
    workflow.unsubscribe(&parameters.email, None).await?;

    Ok(HttpResponse::Ok().json(MessageBody {
        message: "Unsubscribed successfully".into(),
    }))
}

/// Unsubscribe link endpoint, followed from the welcome email
#[tracing::instrument(
    name = "Unsubscribe via link",
    skip(workflow, parameters),
    fields(contact_id = ?parameters.id)
)]
#[get("/unsubscribe")]
async fn unsubscribe(
    workflow: web::Data<SubscriptionWorkflow>,
    parameters: web::Query<UnsubscribeParameters>,
) -> RestResult<impl Responder> {
    unsubscribe_by_link(&workflow, &parameters).await
}

/// One-click unsubscribe (RFC 8058), posted by mail clients honouring `List-Unsubscribe-Post`.
/// The `List-Unsubscribe=One-Click` form body carries nothing the query does not.
#[tracing::instrument(
    name = "One-click unsubscribe",
    skip(workflow, parameters),
    fields(contact_id = ?parameters.id)
)]
#[post("/unsubscribe")]
async fn one_click_unsubscribe(
    workflow: web::Data<SubscriptionWorkflow>,
    parameters: web::Query<UnsubscribeParameters>,
) -> RestResult<impl Responder> {
    unsubscribe_by_link(&workflow, &parameters).await
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusParameters {
    email: String,
    audience_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusBody {
    is_subscribed: bool,
}

/// Read-only subscription status, used as a UI hint
#[tracing::instrument(name = "Check a subscription", skip(workflow))]
#[get("/check-subscription")]
async fn check(
    workflow: web::Data<SubscriptionWorkflow>,
    parameters: web::Query<StatusParameters>,
) -> impl Responder {
    let is_subscribed = workflow
        .check_subscription_status(&parameters.email, parameters.audience_id.as_deref())
        .await;

    HttpResponse::Ok().json(StatusBody { is_subscribed })
}

/// Subscription workflow API endpoints
pub fn scope() -> impl HttpServiceFactory {
    web::scope("/api")
        .app_data(web::JsonConfig::default().error_handler(json_error))
        .app_data(web::QueryConfig::default().error_handler(query_error))
        .service(subscribe)
        .service(confirm)
        .service(unsubscribe)
        .service(one_click_unsubscribe)
        .service(check)
}
