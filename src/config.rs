use std::env;
use std::path::PathBuf;

use thiserror::Error;

const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:8080";
const DEFAULT_USERS_FILE: &str = "users.json";
const DEFAULT_TWEETS_FILE: &str = "tweets.json";

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Locations of the two collection files.
#[derive(Debug, Clone, PartialEq)]
pub struct StorageConfig {
    pub users_path: PathBuf,
    pub tweets_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub bind_address: String,
    pub workers: usize,
    pub bcrypt_cost: u32,
    pub storage: StorageConfig,
}

impl Config {
    /// Reads the process environment. Call `dotenv::dotenv()` first to pick up a `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind_address =
            lookup("BIND_ADDRESS").unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let workers = match lookup("WORKERS") {
            Some(value) => match value.parse::<usize>() {
                Ok(0) => return Err(invalid("WORKERS", value, "must be at least 1")),
                Ok(n) => n,
                Err(e) => return Err(invalid("WORKERS", value, e)),
            },
            None => num_cpus::get(),
        };

        let bcrypt_cost = match lookup("BCRYPT_COST") {
            Some(value) => match value.parse::<u32>() {
                Ok(cost) if (4..=31).contains(&cost) => cost,
                Ok(_) => return Err(invalid("BCRYPT_COST", value, "must be between 4 and 31")),
                Err(e) => return Err(invalid("BCRYPT_COST", value, e)),
            },
            None => bcrypt::DEFAULT_COST,
        };

        let storage = StorageConfig {
            users_path: lookup("USERS_FILE")
                .unwrap_or_else(|| DEFAULT_USERS_FILE.to_string())
                .into(),
            tweets_path: lookup("TWEETS_FILE")
                .unwrap_or_else(|| DEFAULT_TWEETS_FILE.to_string())
                .into(),
        };

        Ok(Config {
            bind_address,
            workers,
            bcrypt_cost,
            storage,
        })
    }
}

fn invalid(key: &'static str, value: String, reason: impl ToString) -> ConfigError {
    ConfigError::Invalid {
        key,
        value,
        reason: reason.to_string(),
    }
}
