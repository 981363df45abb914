use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use popup_mailchimp::clock::SystemClock;
use popup_mailchimp::configuration::get_configuration;
use popup_mailchimp::configuration::PopupSeed;
use popup_mailchimp::domain::PopupId;
use popup_mailchimp::form_token::FormTokens;
use popup_mailchimp::form_token::TokenAction;
use popup_mailchimp::startup::Application;
use popup_mailchimp::telemetry::get_subscriber;
use popup_mailchimp::telemetry::init_subscriber;
use secrecy::Secret;
use serde::Serialize;
use wiremock::MockServer;

/// Popup with everything needed to subscribe (list `a1`, double opt-in)
pub const READY_POPUP: &str = "42";
/// Popup with a credential but no list picked
pub const NO_LIST_POPUP: &str = "8";
/// Popup nobody configured
pub const BLANK_POPUP: &str = "7";

/// Init the tracing subscriber once for the whole test binary.
///
/// To opt in to verbose logging, use the env var `TEST_LOG`:
///
/// ```sh
///      TEST_LOG=true cargo test [test_name] | bunyan
/// ```
static TRACING: Lazy<()> = Lazy::new(|| {
    // the two sinks are different closure types, hence the match arms
    match std::env::var("TEST_LOG") {
        Ok(_) => init_subscriber(get_subscriber("test", "debug", std::io::stdout)),
        Err(_) => init_subscriber(get_subscriber("test", "debug", std::io::sink)),
    };
});

pub struct TestApp {
    pub addr: String,
    /// Stands in for `https://{server}.api.mailchimp.com/3.0`
    pub mailchimp_server: MockServer,
    /// Shares the app's secret, so tokens issued here are accepted by it
    pub tokens: FormTokens,
    pub api_client: reqwest::Client,
}

impl TestApp {
    pub fn token(
        &self,
        action: TokenAction,
        popup: &str,
    ) -> String {
        let popup = PopupId::try_from(popup.to_string()).unwrap();
        self.tokens.issue(action, &popup)
    }

    async fn post_form(
        &self,
        route: &str,
        body: &impl Serialize,
    ) -> reqwest::Response {
        self.api_client
            .post(format!("{}{route}", self.addr))
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(serde_urlencoded::to_string(body).unwrap())
            .send()
            .await
            .expect("execute request")
    }

    /// `POST /subscriptions` with a valid token for `popup`
    pub async fn subscribe(
        &self,
        popup: &str,
        email: &str,
    ) -> reqwest::Response {
        let token = self.token(TokenAction::Subscribe, popup);
        self.post_subscriptions(&[("popup_id", popup), ("email", email), ("token", token.as_str())])
            .await
    }

    pub async fn post_subscriptions(
        &self,
        body: &impl Serialize,
    ) -> reqwest::Response {
        self.post_form("/subscriptions", body).await
    }

    pub async fn post_refresh(
        &self,
        body: &impl Serialize,
    ) -> reqwest::Response {
        self.post_form("/admin/lists/refresh", body).await
    }

    /// `POST /admin/lists/refresh` with a valid token and no overrides
    pub async fn refresh(
        &self,
        popup: &str,
    ) -> reqwest::Response {
        let token = self.token(TokenAction::RefreshList, popup);
        self.post_refresh(&[("post_id", popup), ("token", token.as_str())])
            .await
    }

    pub async fn post_settings(
        &self,
        popup: &str,
        body: &impl Serialize,
    ) -> reqwest::Response {
        self.post_form(&format!("/admin/popups/{popup}/settings"), body)
            .await
    }

    pub async fn get(
        &self,
        route: &str,
    ) -> reqwest::Response {
        self.api_client
            .get(format!("{}{route}", self.addr))
            .send()
            .await
            .expect("execute request")
    }
}

fn seed(
    api_key: &str,
    server_prefix: &str,
    list: &str,
) -> PopupSeed {
    PopupSeed {
        api_key: Some(Secret::new(api_key.to_string())),
        server_prefix: Some(server_prefix.to_string()),
        list: Some(list.to_string()),
        double_opt_in: Some("yes".to_string()),
        ..Default::default()
    }
}

/// Spawn the app on a random port, talking to a fresh Mailchimp mock
pub async fn spawn_app() -> TestApp {
    Lazy::force(&TRACING);

    let mailchimp_server = MockServer::start().await;

    let cfg = {
        let mut cfg = get_configuration().expect("Failed to read configuration");
        // port 0: the OS picks a free port, `Application` reports it back
        cfg.application.port = 0;
        cfg.mailchimp.base_url = mailchimp_server.uri();
        cfg.mailchimp.timeout_milliseconds = 2000;
        cfg.popups = HashMap::from([
            (READY_POPUP.to_string(), seed("key-us21", "us21", "a1")),
            (NO_LIST_POPUP.to_string(), seed("key-us21", "us21", "-1")),
        ]);
        cfg
    };

    let tokens = FormTokens::new(
        &cfg.application.hmac_secret,
        cfg.application.token_lifetime(),
        Arc::new(SystemClock),
    )
    .unwrap();

    let app = Application::build(cfg).expect("Failed to build application");
    let port = app.get_port();
    tokio::spawn(app.run_until_stopped());

    TestApp {
        addr: format!("http://127.0.0.1:{port}"),
        mailchimp_server,
        tokens,
        api_client: reqwest::Client::new(),
    }
}
