use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use super::CatalogError;
use super::MailchimpIntegration;
use crate::domain::ListCatalog;
use crate::domain::PopupId;
use crate::domain::NO_LIST_SELECTED;
use crate::store::SettingKey;

/// Value of the host's integration-type selector for this integration
pub const INTEGRATION_ID: &str = "mailchimp";

/// Host field that every Mailchimp field depends on
const INTEGRATION_FIELD: &str = "_newsletter-integration";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct FieldOption {
    pub value: String,
    pub label: String,
}

/// Show the field only while `ids` has the value `values`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct FieldDeps {
    pub ids: String,
    pub values: String,
}

/// One entry of the popup settings form, as the host renders it
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct FieldDefinition {
    pub id: String,
    pub label: String,
    pub desc: String,
    #[serde(rename = "type")]
    pub field_type: String,
    pub std: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub button_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<FieldOption>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deps: Option<FieldDeps>,
}

fn field(
    key: SettingKey,
    label: &str,
    desc: &str,
    field_type: &str,
    std: &str,
) -> FieldDefinition {
    FieldDefinition {
        id: key.field_id().to_string(),
        label: label.to_string(),
        desc: desc.to_string(),
        field_type: field_type.to_string(),
        std: std.to_string(),
        class: None,
        button_name: None,
        options: None,
        deps: Some(FieldDeps {
            ids: INTEGRATION_FIELD.to_string(),
            values: INTEGRATION_ID.to_string(),
        }),
    }
}

fn list_options(catalog: Option<&ListCatalog>) -> Vec<FieldOption> {
    let placeholder = FieldOption {
        value: NO_LIST_SELECTED.to_string(),
        label: "Select a list".to_string(),
    };
    std::iter::once(placeholder)
        .chain(catalog.into_iter().flatten().map(|(id, name)| FieldOption {
            value: id.clone(),
            label: name.clone(),
        }))
        .collect()
}

fn mailchimp_fields(catalog: Option<&ListCatalog>) -> Vec<FieldDefinition> {
    let mut list = field(
        SettingKey::List,
        "Mailchimp List",
        "A valid Mailchimp list name. You may need to save your configuration before displaying \
         the correct contents. If the list is not up to date, click the Refresh button",
        "select-mailchimp",
        NO_LIST_SELECTED,
    );
    list.class = Some("mailchimp-list-refresh".to_string());
    list.button_name = Some("Refresh".to_string());
    list.options = Some(list_options(catalog));

    vec![
        field(
            SettingKey::ApiKey,
            "Mailchimp API Key",
            "The Mailchimp API Key, used to connect to the Mailchimp service. If you need help to \
             create a valid API Key, refer to this <a \
             href=\"http://kb.mailchimp.com/article/where-can-i-find-my-api-key\">tutorial</a>",
            "text",
            "",
        ),
        field(
            SettingKey::ServerPrefix,
            "Mailchimp Server prefix",
            "The Mailchimp server prefix, used to connect to the Mailchimp service. You can get \
             the server prefix from your Mailchimp page url. Ex: https://yt34.admin.mailchimp.com/ \
             yt34 will be the server prefix.",
            "text",
            "",
        ),
        list,
        field(
            SettingKey::DoubleOptIn,
            "Double Opt-in",
            "When you check this option, MailChimp will send a confirmation email before adding \
             the user to the list",
            "onoff",
            "yes",
        ),
        field(
            SettingKey::EmailLabel,
            "Email field label",
            "The label for the Email field",
            "text",
            "Email",
        ),
        field(
            SettingKey::AddPrivacyCheckbox,
            "Add Privacy Policy",
            "",
            "onoff",
            "no",
        ),
        field(
            SettingKey::PrivacyLabel,
            "Privacy Policy Label",
            "",
            "text",
            "I have read and agree to the website terms and conditions.",
        ),
        field(
            SettingKey::PrivacyDescription,
            "Privacy Policy Description",
            "You can use the shortcode [privacy_policy] to add the link to privacy policy page",
            "textarea",
            "Your personal data will be used to process your request, support your experience \
             throughout this website, and for other purposes described in our [privacy_policy].",
        ),
        field(
            SettingKey::SubmitLabel,
            "Submit button label",
            "This field is not always used. It depends on the style of the form.",
            "text",
            "Add Me",
        ),
    ]
}

/// Append the Mailchimp fields to the host's `existing` fields. A host field
/// with the same id is replaced, keeping the Mailchimp fields in their own
/// order at the end.
pub fn extend_field_schema(
    mut existing: Vec<FieldDefinition>,
    catalog: Option<&ListCatalog>,
) -> Vec<FieldDefinition> {
    let ours = mailchimp_fields(catalog);
    existing.retain(|f| !ours.iter().any(|o| o.id == f.id));
    existing.extend(ours);
    existing
}

/// Add Mailchimp to the host's integration-type selector
pub fn register_integration(types: &mut BTreeMap<String, String>) {
    types.insert(INTEGRATION_ID.to_string(), "Mailchimp".to_string());
}

impl MailchimpIntegration {
    /// Field schema for `popup`, with the list selector filled from the
    /// (possibly cached) catalog. Lookup problems leave only the placeholder
    /// option.
    pub async fn field_schema(
        &self,
        existing: Vec<FieldDefinition>,
        popup: &PopupId,
    ) -> Vec<FieldDefinition> {
        let catalog = match self.resolve(popup, false).await {
            Ok(catalog) => Some(catalog),
            Err(CatalogError::Unavailable) => None,
            Err(e) => {
                tracing::warn!(error.cause_chain = ?e, "Showing the list selector without lists");
                None
            }
        };
        extend_field_schema(existing, catalog.as_ref())
    }
}
