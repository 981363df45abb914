// forms are served by the host and posted back here, possibly much later, so
// tokens are stateless: an HMAC over the action, the popup and a coarse time
// bucket ("tick"). nothing needs to be stored to verify them.

use std::sync::Arc;

use chrono::Duration;
use hmac::Hmac;
use hmac::Mac;
use secrecy::ExposeSecret;
use secrecy::Secret;
use sha2::Sha256;

use crate::clock::Clock;
use crate::domain::PopupId;

type HmacSha256 = Hmac<Sha256>;

/// Leftmost bytes of the MAC that make up a token (20 hex characters)
const TOKEN_BYTES: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenAction {
    /// Visitor submitting a popup form
    Subscribe,
    /// Admin re-fetching the Mailchimp lists
    RefreshList,
    /// Admin saving the popup's Mailchimp fields
    SaveSettings,
}

impl TokenAction {
    fn as_str(self) -> &'static str {
        match self {
            TokenAction::Subscribe => "subscribe",
            TokenAction::RefreshList => "refresh-list",
            TokenAction::SaveSettings => "save-settings",
        }
    }
}

/// Issues and checks anti-forgery tokens. A token stays valid for at least
/// half of `lifetime` and at most all of it.
pub struct FormTokens {
    mac: HmacSha256,
    tick_seconds: i64,
    clock: Arc<dyn Clock>,
}

impl FormTokens {
    pub fn new(
        secret: &Secret<String>,
        lifetime: Duration,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, anyhow::Error> {
        let mac = HmacSha256::new_from_slice(secret.expose_secret().as_bytes())
            .map_err(|e| anyhow::anyhow!("Invalid token secret: {e}"))?;
        Ok(Self {
            mac,
            tick_seconds: (lifetime.num_seconds() / 2).max(1),
            clock,
        })
    }

    fn tick(&self) -> i64 {
        let now = self.clock.now().timestamp();
        // ceil, so that a token never lives less than half a lifetime
        (now + self.tick_seconds - 1).div_euclid(self.tick_seconds)
    }

    fn sign(
        &self,
        tick: i64,
        action: TokenAction,
        popup: &PopupId,
    ) -> HmacSha256 {
        let mut mac = self.mac.clone();
        mac.update(format!("{tick}|{}|{popup}", action.as_str()).as_bytes());
        mac
    }

    pub fn issue(
        &self,
        action: TokenAction,
        popup: &PopupId,
    ) -> String {
        let tag = self.sign(self.tick(), action, popup).finalize().into_bytes();
        hex::encode(&tag[..TOKEN_BYTES])
    }

    /// Accepts tokens issued during the current or the previous tick
    pub fn verify(
        &self,
        action: TokenAction,
        popup: &PopupId,
        token: &str,
    ) -> bool {
        let Ok(supplied) = hex::decode(token.trim()) else {
            return false;
        };
        if supplied.len() != TOKEN_BYTES {
            return false;
        }
        let tick = self.tick();
        [tick, tick - 1].into_iter().any(|t| {
            self.sign(t, action, popup)
                .verify_truncated_left(&supplied)
                .is_ok()
        })
    }
}
