//! TrelloX configuration management using Figment
//!
//! Settings are layered with a clear precedence (later sources win):
//!
//! 1. Built-in defaults
//! 2. Global file: `~/.trellox/config.{toml,yaml,yml,json}`
//! 3. Project file: `./.trellox/config.{toml,yaml,yml,json}`
//! 4. Environment variables with the `TRELLOX_` prefix, using `__` to separate
//!    sections (e.g. `TRELLOX_IMPORT__MAX_CONCURRENT_REQUESTS=4`)
//!
//! ```no_run
//! use trellox_config::load_configuration;
//!
//! let config = load_configuration()?;
//! println!("boards stored under {}", config.storage.root.display());
//! # Ok::<(), trellox_config::ConfigError>(())
//! ```
//!
//! Notification settings are optional. When the email section is absent or
//! incomplete, invite emails are skipped without error.

mod error;
mod loader;
mod settings;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigFile, ConfigFormat, ConfigLoader};
pub use settings::{
    EmailSettings, ImportSettings, NotificationSettings, PresenceSettings, StorageSettings,
    SyncSettings, TrelloxConfig,
};

/// Load configuration from all sources, discovering project files from the
/// current directory.
pub fn load_configuration() -> ConfigResult<TrelloxConfig> {
    ConfigLoader::new().load()
}
