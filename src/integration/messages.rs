use std::collections::HashMap;

use htmlescape::encode_minimal;
use serde::Deserialize;

use crate::domain::InvalidReason;
use crate::domain::Rejection;
use crate::domain::SubscriptionOutcome;

/// Provider error codes with a dedicated message. Anything else gets
/// `Messages.general_error` followed by the provider's own detail.
const KNOWN_CODES: &[(&str, &str)] = &[("ERROR_CONTACT_EXISTS", "Email is already in the list")];

/// Every user-facing string of the subscribe flow. All fields can be
/// overridden from configuration (`messages:`), and `codes` extends or
/// overrides `KNOWN_CODES`.
#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct Messages {
    pub success: String,
    pub error_start: String,
    pub wrong: String,
    pub notice: String,
    pub general_error: String,
    pub codes: HashMap<String, String>,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            success: "Email successfully registered".to_string(),
            error_start: "Something went wrong:".to_string(),
            wrong: "Ops! Something went wrong".to_string(),
            notice: "Ops! You have to use a valid email address".to_string(),
            general_error: "Mailchimp general error".to_string(),
            codes: HashMap::new(),
        }
    }
}

impl Messages {
    /// Plain-text message for one provider error
    pub fn rejection_message(
        &self,
        rejection: &Rejection,
    ) -> String {
        // `config` lowercases map keys, so configured codes are matched
        // case-insensitively
        let configured = self
            .codes
            .iter()
            .find(|(code, _)| code.eq_ignore_ascii_case(&rejection.code))
            .map(|(_, msg)| msg.as_str());
        let known = || {
            KNOWN_CODES
                .iter()
                .find(|(code, _)| *code == rejection.code)
                .map(|(_, msg)| *msg)
        };

        match configured.or_else(known) {
            Some(msg) => msg.to_string(),
            None => format!("{}: {}", self.general_error, rejection.detail),
        }
    }

    /// HTML fragment the popup script injects as-is into the form
    pub fn render(
        &self,
        outcome: &SubscriptionOutcome,
    ) -> String {
        match outcome {
            SubscriptionOutcome::Success => {
                format!(r#"<span class="success">{}</span>"#, encode_minimal(&self.success))
            }
            SubscriptionOutcome::Rejected(rejections) => {
                let items: String = rejections
                    .iter()
                    .map(|r| format!("<li>{}</li>", encode_minimal(&self.rejection_message(r))))
                    .collect();
                format!(
                    r#"<span class="error">{}<ul>{items}</ul></span>"#,
                    encode_minimal(&self.error_start)
                )
            }
            SubscriptionOutcome::Invalid(InvalidReason::MalformedEmail) => {
                format!(r#"<span class="notice">{}</span>"#, encode_minimal(&self.notice))
            }
            SubscriptionOutcome::Invalid(
                InvalidReason::MissingConfig | InvalidReason::ForgedRequest,
            ) => self.render_failure(),
        }
    }

    /// Fragment for anything that went wrong on our side of the form
    pub fn render_failure(&self) -> String {
        format!(r#"<span class="error">{}</span>"#, encode_minimal(&self.wrong))
    }
}
