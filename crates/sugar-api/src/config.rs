//! Server configuration read from the environment.

use std::net::SocketAddr;
use std::path::PathBuf;

use crate::error::AppError;

/// Runtime settings for the API server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// YAML deck to load instead of the bundled one.
    pub word_deck_path: Option<PathBuf>,
    /// Language used when a start request names none.
    pub default_language: String,
    /// Fixed seed for reproducible card draws.
    pub rng_seed: Option<u64>,
}

impl Config {
    /// Reads `HOST`, `PORT`, `WORD_DECK_PATH`, `DEFAULT_LANGUAGE` and
    /// `RNG_SEED` from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a value does not parse.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a value does not parse.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port: u16 = lookup("PORT")
            .unwrap_or_else(|| "3000".to_string())
            .parse()
            .map_err(|e| AppError::Config(format!("PORT must be a valid u16: {e}")))?;
        let word_deck_path = lookup("WORD_DECK_PATH")
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from);
        let default_language = lookup("DEFAULT_LANGUAGE")
            .filter(|language| !language.trim().is_empty())
            .unwrap_or_else(|| "tl".to_string());
        let rng_seed = lookup("RNG_SEED")
            .map(|seed| {
                seed.parse::<u64>()
                    .map_err(|e| AppError::Config(format!("RNG_SEED must be a valid u64: {e}")))
            })
            .transpose()?;

        Ok(Self {
            host,
            port,
            word_deck_path,
            default_language,
            rng_seed,
        })
    }

    /// The socket address to bind.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `host:port` is not a socket address.
    pub fn bind_addr(&self) -> Result<SocketAddr, AppError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))
    }
}
