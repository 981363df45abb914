use std::collections::HashMap;
use std::env;
use std::env::current_dir;
use std::fmt::Display;

use config::Config;
use config::ConfigError;
use secrecy::ExposeSecret;
use secrecy::Secret;
use serde::Deserialize;
use serde_aux::field_attributes::deserialize_number_from_string;

use crate::integration::Messages;
use crate::mailchimp_client::MailchimpClient;
use crate::store::SettingKey;

/// Global configuration, loaded from `configuration/*.yaml` and `APP_*` env
/// vars. See `get_configuration`.
#[derive(Deserialize, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub mailchimp: MailchimpSettings,
    pub cache: CacheSettings,
    /// User-facing strings; every field falls back to the built-in text
    #[serde(default)]
    pub messages: Messages,
    /// Popup settings to load into the settings store at startup, keyed by
    /// popup id
    #[serde(default)]
    pub popups: HashMap<String, PopupSeed>,
}

/// Server configuration
#[derive(Deserialize, Clone)]
pub struct ApplicationSettings {
    /// Should be localhost on dev machine, 0.0.0.0 on prod
    pub host: String,

    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,

    /// Key for the anti-forgery form tokens
    pub hmac_secret: Secret<String>,

    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub token_lifetime_seconds: u32,
}

impl ApplicationSettings {
    pub fn token_lifetime(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.token_lifetime_seconds.into())
    }
}

/// Mailchimp Marketing API
#[derive(Deserialize, Clone)]
pub struct MailchimpSettings {
    /// `https://{server}.api.mailchimp.com/3.0` in production; `{server}` is
    /// replaced by each popup's server prefix
    pub base_url: String,

    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_milliseconds: u64,

    /// How many lists to ask for when filling the list selector
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub list_count: u32,
}

impl MailchimpSettings {
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.timeout_milliseconds)
    }

    pub fn client(&self) -> Result<MailchimpClient, reqwest::Error> {
        MailchimpClient::new(self.base_url.clone(), self.timeout(), self.list_count)
    }
}

#[derive(Deserialize, Clone)]
pub struct CacheSettings {
    /// Lifetime of a cached list catalog; one week by default
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub ttl_seconds: u32,
}

impl CacheSettings {
    pub fn ttl(&self) -> chrono::Duration { chrono::Duration::seconds(self.ttl_seconds.into()) }
}

/// Initial values for one popup. Unset fields are left out of the store.
#[derive(Deserialize, Clone, Default)]
pub struct PopupSeed {
    pub api_key: Option<Secret<String>>,
    pub server_prefix: Option<String>,
    pub list: Option<String>,
    pub double_opt_in: Option<String>,
    pub email_label: Option<String>,
    pub add_privacy_checkbox: Option<String>,
    pub privacy_label: Option<String>,
    pub privacy_description: Option<String>,
    pub submit_label: Option<String>,
}

impl PopupSeed {
    pub fn values(&self) -> Vec<(SettingKey, String)> {
        [
            (
                SettingKey::ApiKey,
                self.api_key.as_ref().map(|k| k.expose_secret().clone()),
            ),
            (SettingKey::ServerPrefix, self.server_prefix.clone()),
            (SettingKey::List, self.list.clone()),
            (SettingKey::DoubleOptIn, self.double_opt_in.clone()),
            (SettingKey::EmailLabel, self.email_label.clone()),
            (SettingKey::AddPrivacyCheckbox, self.add_privacy_checkbox.clone()),
            (SettingKey::PrivacyLabel, self.privacy_label.clone()),
            (SettingKey::PrivacyDescription, self.privacy_description.clone()),
            (SettingKey::SubmitLabel, self.submit_label.clone()),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| (key, v)))
        .collect()
    }
}

pub enum Environment {
    Local,
    Production,
}

impl Display for Environment {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Environment::Local => "local",
                Environment::Production => "production",
            }
        )
    }
}

impl TryFrom<String> for Environment {
    type Error = String;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            e => Err(format!("Invalid environment: {e}")),
        }
    }
}

/// Load yaml configuration files at `<project_root>/configuration`:
/// `base.yaml`, then `{APP_ENVIRONMENT}.yaml` (`local` by default), then env
/// vars such as `APP_MAILCHIMP__TIMEOUT_MILLISECONDS=5000`.
///
/// Missing required fields fail startup immediately.
pub fn get_configuration() -> Result<Settings, ConfigError> {
    let cfg_dir = current_dir()
        .map_err(|e| ConfigError::Foreign(Box::new(e)))?
        .join("configuration");

    let env: Environment = env::var("APP_ENVIRONMENT")
        .unwrap_or("local".to_string())
        .try_into()
        .map_err(ConfigError::Message)?;

    let settings = Config::builder()
        .add_source(config::File::from(cfg_dir.join("base.yaml")))
        .add_source(config::File::from(cfg_dir.join(format!("{env}.yaml"))))
        .add_source(
            // env vars are always strings; `serde-aux` turns them back into numbers
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}
