//! Process-level wiring for an installation: configuration, the session secret, and
//! opening plus bootstrapping the database at startup.

pub mod config;
pub mod host;
pub mod secret;

pub use config::{ConfigError, ConfigResult, RhodiumConfig};
pub use host::{RhodiumHost, StartMode};
pub use secret::{SECRET_HEX_LEN, Secret, SecretError, SecretManager, SecretResult};

use rhodium_store::StoreError;

pub type HostResult<T> = Result<T, HostError>;

#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("secret error: {0}")]
    Secret(#[from] SecretError),
}

impl HostError {
    /// Whether the process must stop rather than report and continue. A store that was
    /// never bootstrapped is a configuration problem, not a fatal one.
    pub fn is_fatal(&self) -> bool {
        match self {
            HostError::Config(_) | HostError::Secret(_) => true,
            HostError::Store(err) => err.is_fatal(),
        }
    }
}
