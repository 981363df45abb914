use super::MailchimpIntegration;
use crate::domain::Credential;
use crate::domain::ListCatalog;
use crate::domain::PopupId;
use crate::mailchimp_client::ProviderError;
use crate::store::SettingKey;

#[derive(thiserror::Error, Debug)]
pub enum CatalogError {
    /// No usable credential; not worth telling anyone about
    #[error("No Mailchimp credential configured")]
    Unavailable,
    #[error("Failed to fetch Mailchimp lists")]
    FetchFailed(#[source] ProviderError),
}

/// Credential values typed into the admin form but not saved yet. A `Some`
/// replaces the stored value for this lookup only, even when empty.
#[derive(Debug, Default, Clone)]
pub struct CredentialOverrides {
    pub api_key: Option<String>,
    pub server_prefix: Option<String>,
}

fn catalog_cache_key(popup: &PopupId) -> String { format!("mailchimp-newsletter-{popup}-list") }

impl MailchimpIntegration {
    /// Lists available to the credential stored for `popup`.
    ///
    /// Served from the popup's cache entry unless `force_update` is set or
    /// the entry has expired; every live fetch rewrites the entry with a
    /// fresh TTL.
    pub async fn resolve(
        &self,
        popup: &PopupId,
        force_update: bool,
    ) -> Result<ListCatalog, CatalogError> {
        self.resolve_with(popup, force_update, CredentialOverrides::default())
            .await
    }

    #[tracing::instrument(name = "Resolving Mailchimp lists", skip(self, overrides))]
    pub async fn resolve_with(
        &self,
        popup: &PopupId,
        force_update: bool,
        overrides: CredentialOverrides,
    ) -> Result<ListCatalog, CatalogError> {
        let api_key = overrides
            .api_key
            .or_else(|| self.settings.get(popup, SettingKey::ApiKey));
        let server_prefix = overrides
            .server_prefix
            .or_else(|| self.settings.get(popup, SettingKey::ServerPrefix));
        let credential = Credential::new(api_key, server_prefix).ok_or(CatalogError::Unavailable)?;

        let key = catalog_cache_key(popup);
        if !force_update {
            if let Some(catalog) = self.cached_catalog(&key) {
                return Ok(catalog);
            }
        }

        self.fetch_catalog(&credential, &key).await
    }

    fn cached_catalog(
        &self,
        key: &str,
    ) -> Option<ListCatalog> {
        let raw = self.cache.get(key)?;
        match serde_json::from_str(&raw) {
            Ok(catalog) => Some(catalog),
            Err(e) => {
                tracing::warn!(error.message = %e, key, "Ignoring unreadable cached catalog");
                None
            }
        }
    }

    async fn fetch_catalog(
        &self,
        credential: &Credential,
        key: &str,
    ) -> Result<ListCatalog, CatalogError> {
        let lists = self
            .client
            .get_all_lists(credential)
            .await
            .map_err(CatalogError::FetchFailed)?;

        let catalog: ListCatalog = lists.into_iter().map(|l| (l.id, l.name)).collect();

        match serde_json::to_string(&catalog) {
            Ok(raw) => self.cache.set(key, raw, self.catalog_ttl),
            Err(e) => tracing::error!(error.message = %e, "Could not cache Mailchimp lists"),
        }
        tracing::info!(lists = catalog.len(), "Fetched Mailchimp lists");
        Ok(catalog)
    }
}
