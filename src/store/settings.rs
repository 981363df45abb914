use std::collections::HashMap;
use std::sync::PoisonError;
use std::sync::RwLock;

use crate::domain::Credential;
use crate::domain::PopupId;

/// Every value the Mailchimp integration keeps per popup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
    ApiKey,
    ServerPrefix,
    List,
    DoubleOptIn,
    EmailLabel,
    AddPrivacyCheckbox,
    PrivacyLabel,
    PrivacyDescription,
    SubmitLabel,
}

impl SettingKey {
    pub const ALL: [SettingKey; 9] = [
        SettingKey::ApiKey,
        SettingKey::ServerPrefix,
        SettingKey::List,
        SettingKey::DoubleOptIn,
        SettingKey::EmailLabel,
        SettingKey::AddPrivacyCheckbox,
        SettingKey::PrivacyLabel,
        SettingKey::PrivacyDescription,
        SettingKey::SubmitLabel,
    ];

    /// Id of the admin form field (and of the field schema entry)
    pub fn field_id(self) -> &'static str {
        match self {
            SettingKey::ApiKey => "mailchimp-apikey",
            SettingKey::ServerPrefix => "mailchimp-serverprefix",
            SettingKey::List => "mailchimp-list",
            SettingKey::DoubleOptIn => "mailchimp-double_opt_in",
            SettingKey::EmailLabel => "mailchimp-email-label",
            SettingKey::AddPrivacyCheckbox => "mailchimp-add-privacy-checkbox",
            SettingKey::PrivacyLabel => "mailchimp-privacy-label",
            SettingKey::PrivacyDescription => "mailchimp-privacy-description",
            SettingKey::SubmitLabel => "mailchimp-submit-label",
        }
    }

    /// Key under which the host persists the value; the field id with a
    /// leading underscore
    pub fn meta_key(self) -> String { format!("_{}", self.field_id()) }
}

/// Per-popup configuration values, as persisted by the host
pub trait SettingsStore: Send + Sync {
    fn get(
        &self,
        popup: &PopupId,
        key: SettingKey,
    ) -> Option<String>;

    fn set(
        &self,
        popup: &PopupId,
        key: SettingKey,
        value: String,
    );
}

#[derive(Default, Debug)]
pub struct MemorySettingsStore {
    values: RwLock<HashMap<(PopupId, SettingKey), String>>,
}

impl MemorySettingsStore {
    pub fn new() -> Self { Self::default() }
}

impl SettingsStore for MemorySettingsStore {
    fn get(
        &self,
        popup: &PopupId,
        key: SettingKey,
    ) -> Option<String> {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(popup.clone(), key))
            .cloned()
    }

    fn set(
        &self,
        popup: &PopupId,
        key: SettingKey,
        value: String,
    ) {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((popup.clone(), key), value);
    }
}

/// `None` unless both the API key and the server prefix are set for `popup`
pub fn load_credential(
    store: &dyn SettingsStore,
    popup: &PopupId,
) -> Option<Credential> {
    Credential::new(
        store.get(popup, SettingKey::ApiKey),
        store.get(popup, SettingKey::ServerPrefix),
    )
}

/// How the host's on/off fields are read back
pub fn is_true(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "yes" | "true" | "1" | "on"
    )
}
