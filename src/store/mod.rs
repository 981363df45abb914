//! Stand-ins for the two stores the host application owns: per-popup
//! settings and a key-value cache with expiry. The integration only talks to
//! them through the traits, so a host can plug its own storage in.
mod cache;
mod settings;

pub use cache::CacheStore;
pub use cache::MemoryCache;
pub use settings::is_true;
pub use settings::load_credential;
pub use settings::MemorySettingsStore;
pub use settings::SettingKey;
pub use settings::SettingsStore;
