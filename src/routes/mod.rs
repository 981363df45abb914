mod admin;
mod health_check;
mod subscriptions;

pub use admin::*;
pub use health_check::*;
pub use subscriptions::*;
