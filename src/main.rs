use popup_mailchimp::configuration::get_configuration;
use popup_mailchimp::startup::Application;
use popup_mailchimp::telemetry::get_subscriber;
use popup_mailchimp::telemetry::init_subscriber;

/// Initialise telemetry, load config, and start the server
#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let subscriber = get_subscriber("popup-mailchimp", "info", std::io::stdout);
    init_subscriber(subscriber);

    let cfg = get_configuration()?;
    let app = Application::build(cfg)?;
    tracing::info!(port = app.get_port(), "Accepting popup submissions");

    app.run_until_stopped().await?;
    Ok(())
}
