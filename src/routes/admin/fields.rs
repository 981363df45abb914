use std::collections::BTreeMap;
use std::collections::HashMap;

use actix_web::web;
use actix_web::HttpResponse;
use serde::Serialize;

use crate::domain::PopupId;
use crate::form_token::FormTokens;
use crate::form_token::TokenAction;
use crate::integration::register_integration;
use crate::integration::FieldDefinition;
use crate::integration::MailchimpIntegration;
use crate::store::SettingKey;

#[derive(Serialize)]
struct FieldsResponse {
    fields: Vec<FieldDefinition>,
    /// For the Refresh button (`POST /admin/lists/refresh`)
    refresh_token: String,
    /// For saving the form (`POST /admin/popups/{popup_id}/settings`)
    settings_token: String,
}

/// `GET /admin/integrations`
pub async fn integrations() -> HttpResponse {
    let mut types = BTreeMap::new();
    register_integration(&mut types);
    HttpResponse::Ok().json(types)
}

/// `GET /admin/popups/{popup_id}/fields`
///
/// The Mailchimp part of the popup settings form, with the list selector
/// filled from the cached catalog (fetched on a cache miss).
#[tracing::instrument(name = "Building popup settings form", skip(integration, tokens))]
pub async fn popup_fields(
    path: web::Path<String>,
    integration: web::Data<MailchimpIntegration>,
    tokens: web::Data<FormTokens>,
) -> HttpResponse {
    let popup = match PopupId::try_from(path.into_inner()) {
        Ok(popup) => popup,
        Err(_) => return HttpResponse::BadRequest().finish(),
    };

    let fields = integration.field_schema(Vec::new(), &popup).await;
    HttpResponse::Ok().json(FieldsResponse {
        fields,
        refresh_token: tokens.issue(TokenAction::RefreshList, &popup),
        settings_token: tokens.issue(TokenAction::SaveSettings, &popup),
    })
}

/// `POST /admin/popups/{popup_id}/settings`
///
/// Form keys are the field ids of the schema; unknown keys are ignored and
/// fields left out keep their stored value. Answers with the ids that were
/// saved.
///
/// Saving does not touch the cached catalog: a new API key only shows up in
/// the list selector after a refresh or once the cache expires.
#[tracing::instrument(name = "Saving popup settings", skip(form, integration, tokens))]
pub async fn save_settings(
    path: web::Path<String>,
    form: web::Form<HashMap<String, String>>,
    integration: web::Data<MailchimpIntegration>,
    tokens: web::Data<FormTokens>,
) -> HttpResponse {
    let mut form = form.into_inner();
    let token = form.remove("token").unwrap_or_default();

    let popup = match PopupId::try_from(path.into_inner()) {
        Ok(popup) if tokens.verify(TokenAction::SaveSettings, &popup, &token) => popup,
        _ => return HttpResponse::Forbidden().finish(),
    };

    let mut saved = Vec::new();
    for key in SettingKey::ALL {
        if let Some(value) = form.remove(key.field_id()) {
            integration.settings().set(&popup, key, value);
            saved.push(key.field_id());
        }
    }
    tracing::info!(?saved, "Saved popup settings");
    HttpResponse::Ok().json(saved)
}
