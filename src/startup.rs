use std::collections::HashMap;
use std::net::TcpListener;
use std::sync::Arc;

use actix_web::dev::Server;
use actix_web::web;
use actix_web::App;
use actix_web::HttpServer;
use anyhow::Context;
use tracing_actix_web::TracingLogger;

use crate::clock::Clock;
use crate::clock::SystemClock;
use crate::configuration::PopupSeed;
use crate::configuration::Settings;
use crate::domain::PopupId;
use crate::form_token::FormTokens;
use crate::integration::MailchimpIntegration;
use crate::routes::health_check;
use crate::routes::integrations;
use crate::routes::popup_fields;
use crate::routes::refresh_list;
use crate::routes::save_settings;
use crate::routes::subscribe;
use crate::routes::subscription_token;
use crate::store::MemoryCache;
use crate::store::MemorySettingsStore;
use crate::store::SettingsStore;

/// Wrapper for actix's `Server` with access to the bound port (which is
/// random when the configured port is 0, as in tests)
pub struct Application {
    port: u16,
    server: Server,
}

impl Application {
    /// Bind the listener and build every shared component from `cfg`
    pub fn build(cfg: Settings) -> Result<Self, anyhow::Error> {
        let addr = format!("{}:{}", cfg.application.host, cfg.application.port);
        let listener = TcpListener::bind(&addr).with_context(|| format!("Failed to bind {addr}"))?;
        let port = listener.local_addr()?.port();

        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let settings = seed_settings(&cfg.popups)?;
        let integration = MailchimpIntegration::new(
            cfg.mailchimp.client()?,
            Arc::new(settings),
            Arc::new(MemoryCache::new(clock.clone())),
            cfg.messages.clone(),
            cfg.cache.ttl(),
        );
        let tokens = FormTokens::new(
            &cfg.application.hmac_secret,
            cfg.application.token_lifetime(),
            clock,
        )?;

        let server = run(listener, integration, tokens)?;
        Ok(Self { port, server })
    }

    pub fn get_port(&self) -> u16 { self.port }

    /// Consumes `self`; this should be the final call (or be passed to
    /// `tokio::spawn`)
    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> { self.server.await }
}

fn seed_settings(popups: &HashMap<String, PopupSeed>) -> Result<MemorySettingsStore, anyhow::Error> {
    let store = MemorySettingsStore::new();
    for (id, seed) in popups {
        let popup = PopupId::try_from(id.clone())
            .with_context(|| format!("Invalid popup id in configuration: {id:?}"))?;
        for (key, value) in seed.values() {
            store.set(&popup, key, value);
        }
    }
    Ok(store)
}

/// The server is not responsible for binding to an address, it only listens to
/// an already bound address.
///
/// Declares all API endpoints. The `/admin` scope is meant to sit behind the
/// host's own admin authentication; here it is only guarded by form tokens.
pub fn run(
    listener: TcpListener,
    integration: MailchimpIntegration,
    tokens: FormTokens,
) -> Result<Server, std::io::Error> {
    // `Data` is an `Arc` internally; each worker gets a cheap clone
    let integration = web::Data::new(integration);
    let tokens = web::Data::new(tokens);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .route("/health_check", web::get().to(health_check))
            .route("/subscriptions", web::post().to(subscribe))
            .route("/popups/{popup_id}/token", web::get().to(subscription_token))
            .service(
                web::scope("/admin")
                    .route("/integrations", web::get().to(integrations))
                    .route("/lists/refresh", web::post().to(refresh_list))
                    .route("/popups/{popup_id}/fields", web::get().to(popup_fields))
                    .route("/popups/{popup_id}/settings", web::post().to(save_settings)),
            )
            .app_data(integration.clone())
            .app_data(tokens.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}
