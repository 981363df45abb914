//! The Mailchimp side of the popup newsletter: list lookup (with a per-popup
//! cache), single-address subscription, and the admin field schema.
//!
//! Built once at startup and shared by every request handler.
mod lists;
mod messages;
mod schema;
mod subscribe;

use std::sync::Arc;

use chrono::Duration;
pub use lists::CatalogError;
pub use lists::CredentialOverrides;
pub use messages::Messages;
pub use schema::extend_field_schema;
pub use schema::register_integration;
pub use schema::FieldDefinition;
pub use schema::FieldDeps;
pub use schema::FieldOption;
pub use schema::INTEGRATION_ID;
pub use subscribe::classify;
pub use subscribe::SubscriptionRequest;

use crate::mailchimp_client::MailchimpClient;
use crate::store::CacheStore;
use crate::store::SettingsStore;

pub struct MailchimpIntegration {
    client: MailchimpClient,
    settings: Arc<dyn SettingsStore>,
    cache: Arc<dyn CacheStore>,
    messages: Messages,
    /// How long a fetched catalog is served from cache
    catalog_ttl: Duration,
}

impl MailchimpIntegration {
    pub fn new(
        client: MailchimpClient,
        settings: Arc<dyn SettingsStore>,
        cache: Arc<dyn CacheStore>,
        messages: Messages,
        catalog_ttl: Duration,
    ) -> Self {
        Self {
            client,
            settings,
            cache,
            messages,
            catalog_ttl,
        }
    }

    pub fn settings(&self) -> &dyn SettingsStore { self.settings.as_ref() }

    pub fn messages(&self) -> &Messages { &self.messages }
}
