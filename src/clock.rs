use chrono::DateTime;
use chrono::Utc;

/// Source of "now" for everything that expires (cache entries, form tokens).
/// Production code uses `SystemClock`; tests swap in a `ManualClock` so that
/// expiry can be checked without sleeping.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> { Utc::now() }
}

#[cfg(test)]
pub use manual::ManualClock;
