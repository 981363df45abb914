use super::MailchimpIntegration;
use crate::domain::Credential;
use crate::domain::InvalidReason;
use crate::domain::PopupId;
use crate::domain::Rejection;
use crate::domain::SubscriberEmail;
use crate::domain::SubscriptionOutcome;
use crate::domain::NO_LIST_SELECTED;
use crate::mailchimp_client::BatchResponse;
use crate::mailchimp_client::EmailType;
use crate::mailchimp_client::MemberStatus;
use crate::mailchimp_client::NewMember;
use crate::mailchimp_client::ProviderError;
use crate::store::is_true;
use crate::store::load_credential;
use crate::store::SettingKey;

/// Everything needed to talk to Mailchimp for one submission. Built fresh for
/// every request, never stored.
#[derive(Debug)]
pub struct SubscriptionRequest {
    pub popup: PopupId,
    pub email: SubscriberEmail,
    pub credential: Credential,
    pub list_id: String,
    pub double_opt_in: bool,
}

impl SubscriptionRequest {
    fn member(&self) -> NewMember {
        NewMember {
            email_address: self.email.as_ref().to_string(),
            email_type: EmailType::Html,
            status: match self.double_opt_in {
                true => MemberStatus::Pending,
                false => MemberStatus::Subscribed,
            },
        }
    }
}

/// Zero member errors means the address is on the list (or waiting for its
/// confirmation email)
pub fn classify(resp: BatchResponse) -> SubscriptionOutcome {
    if resp.errors.is_empty() {
        return SubscriptionOutcome::Success;
    }
    let rejections = resp
        .errors
        .into_iter()
        .map(|e| Rejection {
            code: e.error_code,
            detail: e.error,
        })
        .collect();
    SubscriptionOutcome::Rejected(rejections)
}

impl MailchimpIntegration {
    /// `None` if the popup has no list selected or no usable credential
    fn subscription_request(
        &self,
        popup: &PopupId,
        email: SubscriberEmail,
    ) -> Option<SubscriptionRequest> {
        let credential = load_credential(self.settings.as_ref(), popup)?;
        let list_id = self
            .settings
            .get(popup, SettingKey::List)
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty() && l != NO_LIST_SELECTED)?;
        let double_opt_in = self
            .settings
            .get(popup, SettingKey::DoubleOptIn)
            .is_some_and(|v| is_true(&v));

        Some(SubscriptionRequest {
            popup: popup.clone(),
            email,
            credential,
            list_id,
            double_opt_in,
        })
    }

    /// Subscribe `email` to the list configured for `popup`.
    ///
    /// The list's double opt-in flag is overwritten with the popup's setting
    /// on every call, before the member is added. If that first call succeeds
    /// and the second fails, the flag stays changed.
    ///
    /// Classified outcomes (including provider-side rejections) are `Ok`;
    /// `Err` means Mailchimp could not be asked at all.
    #[tracing::instrument(
        name = "Subscribing popup visitor",
        skip(self, email),
        fields(subscriber_email = %email)
    )]
    pub async fn submit(
        &self,
        popup: &PopupId,
        email: String,
    ) -> Result<SubscriptionOutcome, ProviderError> {
        let email = match SubscriberEmail::parse(email) {
            Ok(email) => email,
            Err(_) => return Ok(SubscriptionOutcome::Invalid(InvalidReason::MalformedEmail)),
        };

        let request = match self.subscription_request(popup, email) {
            Some(request) => request,
            None => {
                tracing::warn!("Popup has no Mailchimp list or credential");
                return Ok(SubscriptionOutcome::Invalid(InvalidReason::MissingConfig));
            }
        };

        self.client
            .update_list(&request.credential, &request.list_id, request.double_opt_in)
            .await?;

        let resp = self
            .client
            .batch_list_members(&request.credential, &request.list_id, &[request.member()])
            .await?;

        tracing::info!(
            created = resp.total_created,
            updated = resp.total_updated,
            errors = resp.errors.len(),
            "Mailchimp answered the member upsert"
        );
        let outcome = classify(resp);
        if let SubscriptionOutcome::Rejected(rejections) = &outcome {
            tracing::info!(?rejections, "Mailchimp rejected the subscription");
        }
        Ok(outcome)
    }
}
