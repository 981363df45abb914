use actix_web::web;
use actix_web::HttpResponse;
use serde::Deserialize;

use crate::domain::PopupId;
use crate::form_token::FormTokens;
use crate::form_token::TokenAction;
use crate::integration::CatalogError;
use crate::integration::CredentialOverrides;
use crate::integration::MailchimpIntegration;

/// Posted by the Refresh button next to the list selector. `apikey` and
/// `serverprefix` carry whatever is currently typed in the form, saved or not.
#[derive(Deserialize)]
pub struct RefreshForm {
    #[serde(default)]
    post_id: String,
    #[serde(default)]
    token: String,
    apikey: Option<String>,
    serverprefix: Option<String>,
}

/// `POST /admin/lists/refresh`
///
/// Always goes to Mailchimp, then answers with the catalog as a JSON object
/// (`{"list id": "list name"}`), or `false` when no credential is available.
/// A bad token or popup id gets `403 false` without any fetch.
#[tracing::instrument(
    name = "Refreshing Mailchimp lists",
    skip(form, integration, tokens),
    fields(post_id = %form.post_id)
)]
pub async fn refresh_list(
    form: web::Form<RefreshForm>,
    integration: web::Data<MailchimpIntegration>,
    tokens: web::Data<FormTokens>,
) -> HttpResponse {
    let form = form.into_inner();

    let popup = match PopupId::try_from(form.post_id) {
        Ok(popup) if tokens.verify(TokenAction::RefreshList, &popup, &form.token) => popup,
        _ => {
            tracing::warn!("Refusing list refresh");
            return HttpResponse::Forbidden().json(false);
        }
    };

    let overrides = CredentialOverrides {
        api_key: form.apikey,
        server_prefix: form.serverprefix,
    };

    match integration.resolve_with(&popup, true, overrides).await {
        Ok(catalog) => HttpResponse::Ok().json(catalog),
        Err(CatalogError::Unavailable) => HttpResponse::Ok().json(false),
        Err(CatalogError::FetchFailed(e)) => {
            tracing::error!(
                error.cause_chain = ?e,
                error.message = %e,
                "Could not refresh Mailchimp lists"
            );
            HttpResponse::BadGateway().json(serde_json::json!({ "error": e.to_string() }))
        }
    }
}
