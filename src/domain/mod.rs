mod credential;
mod outcome;
mod popup_id;
mod subscriber_email;
// allow external `use` statements to skip `credential` etc
pub use credential::Credential;
pub use outcome::InvalidReason;
pub use outcome::Rejection;
pub use outcome::SubscriptionOutcome;
pub use popup_id::PopupId;
pub use subscriber_email::SubscriberEmail;

/// Provider list id -> display name, in the order Mailchimp returned them.
/// That order survives the cache and reaches the list selector.
pub type ListCatalog = indexmap::IndexMap<String, String>;

/// Value of the list selector when the admin has not picked a list yet
pub const NO_LIST_SELECTED: &str = "-1";
