use std::time::Duration;

use reqwest::Client;
use reqwest::Response;
use reqwest::Url;
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde::Serialize;

use crate::domain::Credential;

/// Thin client for the three Mailchimp Marketing API calls the popup needs.
///
/// `base_url` may contain a `{server}` placeholder, which is replaced by the
/// credential's server prefix on every call
/// (`https://{server}.api.mailchimp.com/3.0`). Without a placeholder the URL is
/// used verbatim, which is how tests point the client at a mock server.
// one `Client` (and its connection pool) is shared by every request the app
// makes, so it lives here and the whole struct is handed to actix as `Data`
pub struct MailchimpClient {
    http_client: Client,
    base_url: String,
    list_count: u32,
}

#[derive(thiserror::Error, Debug)]
pub enum ProviderError {
    #[error("Failed to talk to Mailchimp")]
    Transport(#[from] reqwest::Error),
    #[error("Mailchimp answered {status}: {title} ({detail})")]
    Api {
        status: u16,
        title: String,
        detail: String,
    },
    #[error("Cannot build a Mailchimp URL from {0:?}")]
    InvalidUrl(String),
}

/// Problem document returned with every non-2xx response
#[derive(Deserialize, Default)]
struct Problem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    detail: String,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MailchimpList {
    pub id: String,
    pub name: String,
}

#[derive(Deserialize)]
struct ListsResponse {
    #[serde(default)]
    lists: Vec<MailchimpList>,
}

#[derive(Serialize)]
struct UpdateListRequest {
    double_optin: bool,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MemberStatus {
    Subscribed,
    /// Mailchimp sends a confirmation email first
    Pending,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmailType {
    Html,
}

#[derive(Serialize, Debug, Clone)]
pub struct NewMember {
    pub email_address: String,
    pub email_type: EmailType,
    pub status: MemberStatus,
}

#[derive(Serialize)]
struct BatchRequest<'a> {
    members: &'a [NewMember],
}

/// Per-member error of a batch upsert; `error` is the human readable detail
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct BatchError {
    #[serde(default)]
    pub email_address: String,
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub error_code: String,
}

#[derive(Deserialize, Debug)]
pub struct BatchResponse {
    #[serde(default)]
    pub total_created: u32,
    #[serde(default)]
    pub total_updated: u32,
    #[serde(default)]
    pub errors: Vec<BatchError>,
}

impl MailchimpClient {
    pub fn new(
        base_url: String,
        timeout: Duration,
        list_count: u32,
    ) -> Result<Self, reqwest::Error> {
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            base_url,
            list_count,
        })
    }

    fn endpoint(
        &self,
        credential: &Credential,
        segments: &[&str],
    ) -> Result<Url, ProviderError> {
        let base = self.base_url.replace("{server}", credential.server_prefix());
        let mut url = Url::parse(&base).map_err(|_| ProviderError::InvalidUrl(base.clone()))?;
        url.path_segments_mut()
            .map_err(|_| ProviderError::InvalidUrl(base.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// `GET /lists`
    #[tracing::instrument(name = "Fetching Mailchimp lists", skip(self, credential))]
    pub async fn get_all_lists(
        &self,
        credential: &Credential,
    ) -> Result<Vec<MailchimpList>, ProviderError> {
        let url = self.endpoint(credential, &["lists"])?;
        let resp = self
            .http_client
            .get(url)
            .basic_auth("user", Some(credential.api_key().expose_secret()))
            .query(&[
                ("count", self.list_count.to_string()),
                ("fields", "lists.id,lists.name".to_string()),
            ])
            .send()
            .await?;
        let lists: ListsResponse = check(resp).await?.json().await?;
        Ok(lists.lists)
    }

    /// `PATCH /lists/{list_id}`, only touching the double opt-in flag
    #[tracing::instrument(name = "Updating Mailchimp list", skip(self, credential))]
    pub async fn update_list(
        &self,
        credential: &Credential,
        list_id: &str,
        double_optin: bool,
    ) -> Result<(), ProviderError> {
        let url = self.endpoint(credential, &["lists", list_id])?;
        let resp = self
            .http_client
            .patch(url)
            .basic_auth("user", Some(credential.api_key().expose_secret()))
            .json(&UpdateListRequest { double_optin })
            .send()
            .await?;
        check(resp).await?;
        Ok(())
    }

    /// `POST /lists/{list_id}`: add or update members in one go. Member-level
    /// failures do not fail the request; they come back in
    /// `BatchResponse.errors`.
    #[tracing::instrument(name = "Upserting Mailchimp members", skip(self, credential, members))]
    pub async fn batch_list_members(
        &self,
        credential: &Credential,
        list_id: &str,
        members: &[NewMember],
    ) -> Result<BatchResponse, ProviderError> {
        let url = self.endpoint(credential, &["lists", list_id])?;
        let resp = self
            .http_client
            .post(url)
            .basic_auth("user", Some(credential.api_key().expose_secret()))
            .json(&BatchRequest { members })
            .send()
            .await?;
        Ok(check(resp).await?.json().await?)
    }
}

/// Turn a non-2xx response into `ProviderError::Api`, keeping whatever the
/// problem document says
async fn check(resp: Response) -> Result<Response, ProviderError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let problem: Problem = resp.json().await.unwrap_or_default();
    Err(ProviderError::Api {
        status: status.as_u16(),
        title: problem.title,
        detail: problem.detail,
    })
}
