use actix_web::web;
use actix_web::HttpResponse;
use serde::Deserialize;
use serde::Serialize;

use crate::domain::InvalidReason;
use crate::domain::PopupId;
use crate::domain::SubscriptionOutcome;
use crate::form_token::FormTokens;
use crate::form_token::TokenAction;
use crate::integration::MailchimpIntegration;
use crate::utils::html_fragment;

/// Fields posted by the popup form. Every field defaults to empty, so that a
/// stripped-down request still gets a status fragment back rather than a bare
/// 400.
#[derive(Deserialize)]
pub struct SubscribeForm {
    #[serde(default)]
    popup_id: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    token: String,
}

/// `POST /subscriptions`
///
/// Answers with an HTML fragment for the popup to display, 200 for every
/// classified outcome (including rejections) and 500 when Mailchimp could not
/// be reached.
///
/// ```sh
///     curl --data 'popup_id=42&email=john%40foo.com&token=...' http://127.0.0.1:8000/subscriptions
/// ```
#[tracing::instrument(
    name = "Popup subscription request",
    skip(form, integration, tokens),
    fields(popup_id = %form.popup_id)
)]
pub async fn subscribe(
    form: web::Form<SubscribeForm>,
    integration: web::Data<MailchimpIntegration>,
    tokens: web::Data<FormTokens>,
) -> HttpResponse {
    let form = form.into_inner();
    let messages = integration.messages();

    let popup = match PopupId::try_from(form.popup_id) {
        Ok(popup) => popup,
        Err(e) => {
            tracing::warn!(error.message = %e, "Rejecting subscription for unknown popup");
            let outcome = SubscriptionOutcome::Invalid(InvalidReason::MissingConfig);
            return html_fragment(HttpResponse::Ok(), messages.render(&outcome));
        }
    };

    if !tokens.verify(TokenAction::Subscribe, &popup, &form.token) {
        tracing::warn!("Rejecting subscription with a bad form token");
        let outcome = SubscriptionOutcome::Invalid(InvalidReason::ForgedRequest);
        return html_fragment(HttpResponse::Ok(), messages.render(&outcome));
    }

    match integration.submit(&popup, form.email).await {
        Ok(outcome) => html_fragment(HttpResponse::Ok(), messages.render(&outcome)),
        Err(e) => {
            tracing::error!(
                error.cause_chain = ?e,
                error.message = %e,
                "Mailchimp subscription failed"
            );
            html_fragment(HttpResponse::InternalServerError(), messages.render_failure())
        }
    }
}

#[derive(Serialize)]
struct TokenResponse {
    token: String,
}

/// `GET /popups/{popup_id}/token`
///
/// Token the host embeds in the popup form; `POST /subscriptions` checks it.
pub async fn subscription_token(
    path: web::Path<String>,
    tokens: web::Data<FormTokens>,
) -> HttpResponse {
    match PopupId::try_from(path.into_inner()) {
        Ok(popup) => HttpResponse::Ok().json(TokenResponse {
            token: tokens.issue(TokenAction::Subscribe, &popup),
        }),
        Err(_) => HttpResponse::BadRequest().finish(),
    }
}
