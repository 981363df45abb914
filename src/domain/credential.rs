use secrecy::ExposeSecret;
use secrecy::Secret;

/// Mailchimp API key plus the server prefix of the account's data center
/// (`us21` in `https://us21.admin.mailchimp.com/`).
///
/// Only constructed when both halves are usable; callers treat `None` as "not
/// configured", which is a normal state rather than an error.
#[derive(Clone)]
pub struct Credential {
    api_key: Secret<String>,
    server_prefix: String,
}

impl Credential {
    pub fn new(
        api_key: Option<String>,
        server_prefix: Option<String>,
    ) -> Option<Self> {
        let api_key = api_key.map(|k| k.trim().to_string()).filter(|k| !k.is_empty())?;
        let server_prefix = server_prefix
            .map(|p| p.trim().to_lowercase())
            .filter(|p| !p.is_empty())?;

        // the prefix becomes part of the provider host name
        if !server_prefix.chars().all(|c| c.is_ascii_alphanumeric()) {
            tracing::warn!(%server_prefix, "Ignoring malformed Mailchimp server prefix");
            return None;
        }

        Some(Self {
            api_key: Secret::new(api_key),
            server_prefix,
        })
    }

    pub fn api_key(&self) -> &Secret<String> { &self.api_key }

    pub fn server_prefix(&self) -> &str { &self.server_prefix }
}

impl std::fmt::Debug for Credential {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("api_key", &"[REDACTED]")
            .field("server_prefix", &self.server_prefix)
            .finish()
    }
}

impl PartialEq for Credential {
    fn eq(
        &self,
        other: &Self,
    ) -> bool {
        self.api_key.expose_secret() == other.api_key.expose_secret()
            && self.server_prefix == other.server_prefix
    }
}
