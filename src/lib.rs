pub mod clock;
pub mod configuration;
pub mod domain;
pub mod form_token;
pub mod integration;
pub mod mailchimp_client;
pub mod routes;
pub mod startup;
pub mod store;
pub mod telemetry;
pub mod utils;
