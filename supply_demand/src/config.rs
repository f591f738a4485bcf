use crate::error::ConfigError;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Deployment ceilings injected into validation.
///
/// The same engine runs under different limits; nothing in the core
/// hard-codes these values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Limits {
    pub max_buyers: usize,
    pub max_sellers: usize,
    /// Maximum segments per side
    pub max_segments: usize,
    pub max_price: i64,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            max_buyers: 100,
            max_sellers: 100,
            max_segments: 3,
            max_price: 1000,
        }
    }
}

impl Limits {
    /// Read `MAX_BUYERS`, `MAX_SELLERS`, `MAX_SEGMENTS` and `MAX_PRICE`.
    /// Unset variables keep their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let defaults = Limits::default();
        Ok(Limits {
            max_buyers: parse_var(&lookup, "MAX_BUYERS", defaults.max_buyers)?,
            max_sellers: parse_var(&lookup, "MAX_SELLERS", defaults.max_sellers)?,
            max_segments: parse_var(&lookup, "MAX_SEGMENTS", defaults.max_segments)?,
            max_price: parse_var(&lookup, "MAX_PRICE", defaults.max_price)?,
        })
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }
}

fn parse_var<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&'static str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidEnv { name, value }),
    }
}
