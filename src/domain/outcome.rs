/// One member-level error reported by the provider for a batch upsert
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub code: String,
    pub detail: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidReason {
    MalformedEmail,
    /// No credential, no list selected, or no popup at all
    MissingConfig,
    /// The submitted form token did not match the popup's form
    ForgedRequest,
}

/// Result of a single popup submission, once the provider has been asked (or
/// the request was turned away before that).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionOutcome {
    Success,
    Rejected(Vec<Rejection>),
    Invalid(InvalidReason),
}
