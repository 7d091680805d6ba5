use rhodium_store::DatabaseOptions;
use std::num::ParseIntError;
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_PATH: &str = "RHODIUM_PATH";
pub const ENV_POOL_SIZE: &str = "RHODIUM_POOL_SIZE";
pub const ENV_BUSY_TIMEOUT_MS: &str = "RHODIUM_BUSY_TIMEOUT_MS";

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var}='{value}' is not a valid number: {source}")]
    InvalidNumber {
        var: &'static str,
        value: String,
        #[source]
        source: ParseIntError,
    },
    #[error("{var} must be greater than zero")]
    Zero { var: &'static str },
}

/// Where an installation keeps its files, and how the database pool is sized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RhodiumConfig {
    pub data_dir: PathBuf,
    pub database_file: String,
    pub secret_file: String,
    pub pool_size: u32,
    pub busy_timeout: Duration,
}

impl Default for RhodiumConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("/home/rhodium/db"),
            database_file: "rhodium.db".into(),
            secret_file: "rhodium_secret".into(),
            pool_size: 10,
            busy_timeout: Duration::from_secs(5),
        }
    }
}

impl RhodiumConfig {
    /// Defaults overridden by `RHODIUM_*` environment variables.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Like [`RhodiumConfig::from_env`], reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(path) = lookup(ENV_PATH).filter(|p| !p.trim().is_empty()) {
            config.data_dir = PathBuf::from(path);
        }
        if let Some(raw) = lookup(ENV_POOL_SIZE) {
            config.pool_size = parse_positive(ENV_POOL_SIZE, &raw)?;
        }
        if let Some(raw) = lookup(ENV_BUSY_TIMEOUT_MS) {
            config.busy_timeout = Duration::from_millis(parse_positive(ENV_BUSY_TIMEOUT_MS, &raw)?);
        }
        Ok(config)
    }

    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.database_file)
    }

    pub fn secret_path(&self) -> PathBuf {
        self.data_dir.join(&self.secret_file)
    }

    pub fn database_options(&self) -> DatabaseOptions {
        DatabaseOptions {
            pool_size: self.pool_size,
            busy_timeout: self.busy_timeout,
        }
    }
}

fn parse_positive<T>(var: &'static str, raw: &str) -> ConfigResult<T>
where
    T: std::str::FromStr<Err = ParseIntError> + Default + PartialEq,
{
    let value = raw
        .trim()
        .parse::<T>()
        .map_err(|source| ConfigError::InvalidNumber {
            var,
            value: raw.to_string(),
            source,
        })?;
    if value == T::default() {
        return Err(ConfigError::Zero { var });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_without_environment() {
        let config = RhodiumConfig::from_lookup(lookup(&[])).expect("config");
        assert_eq!(config, RhodiumConfig::default());
        assert_eq!(config.database_path(), PathBuf::from("/home/rhodium/db/rhodium.db"));
        assert_eq!(config.secret_path(), PathBuf::from("/home/rhodium/db/rhodium_secret"));
    }

    #[test]
    fn environment_overrides() {
        let config = RhodiumConfig::from_lookup(lookup(&[
            (ENV_PATH, "/srv/rhodium"),
            (ENV_POOL_SIZE, "4"),
            (ENV_BUSY_TIMEOUT_MS, "250"),
        ]))
        .expect("config");
        assert_eq!(config.data_dir, PathBuf::from("/srv/rhodium"));
        let options = config.database_options();
        assert_eq!(options.pool_size, 4);
        assert_eq!(options.busy_timeout, Duration::from_millis(250));
    }

    #[test]
    fn malformed_numbers_are_errors() {
        let err = RhodiumConfig::from_lookup(lookup(&[(ENV_POOL_SIZE, "many")])).expect_err("bad");
        assert!(matches!(err, ConfigError::InvalidNumber { var: ENV_POOL_SIZE, .. }));

        let err = RhodiumConfig::from_lookup(lookup(&[(ENV_POOL_SIZE, "0")])).expect_err("zero");
        assert!(matches!(err, ConfigError::Zero { var: ENV_POOL_SIZE }));
    }
}
