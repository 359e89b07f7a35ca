use anyhow::{Context, Result};
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use crate::tmdb::TMDB_BASE;

pub const DEFAULT_CAST_LIMIT: usize = 6;
pub const DEFAULT_BATCH_CONCURRENCY: usize = 8;

/// Runtime settings read from the environment (`.env` supported).
#[derive(Debug, Clone)]
pub struct Config {
    /// Absent key is not fatal at startup; provider routes answer with a configuration error.
    pub tmdb_api_key: Option<String>,
    pub tmdb_base_url: String,
    pub tmdb_language: String,
    pub host: String,
    pub port: u16,
    pub cast_limit: usize,
    pub batch_concurrency: usize,
    pub favorites_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tmdb_api_key: None,
            tmdb_base_url: TMDB_BASE.to_string(),
            tmdb_language: "en-US".to_string(),
            host: "0.0.0.0".to_string(),
            port: 3000,
            cast_limit: DEFAULT_CAST_LIMIT,
            batch_concurrency: DEFAULT_BATCH_CONCURRENCY,
            favorites_path: PathBuf::from("favorites.json"),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let text = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Self {
            tmdb_api_key: text("TMDB_API_KEY"),
            tmdb_base_url: text("TMDB_BASE_URL").unwrap_or(defaults.tmdb_base_url),
            tmdb_language: text("TMDB_LANGUAGE").unwrap_or(defaults.tmdb_language),
            host: text("REELVIEW_HOST").unwrap_or(defaults.host),
            port: parse_var::<u16>(text("REELVIEW_PORT"), "REELVIEW_PORT")?
                .unwrap_or(defaults.port),
            cast_limit: parse_var::<usize>(text("REELVIEW_CAST_LIMIT"), "REELVIEW_CAST_LIMIT")?
                .unwrap_or(defaults.cast_limit),
            batch_concurrency: parse_var::<usize>(
                text("REELVIEW_BATCH_CONCURRENCY"),
                "REELVIEW_BATCH_CONCURRENCY",
            )?
            .unwrap_or(defaults.batch_concurrency)
            .max(1),
            favorites_path: text("REELVIEW_FAVORITES_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.favorites_path),
        })
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("Invalid listen address {}:{}", self.host, self.port))
    }
}

fn parse_var<T: FromStr>(value: Option<String>, name: &str) -> Result<Option<T>> {
    value
        .map(|v| {
            v.trim()
                .parse::<T>()
                .map_err(|_| anyhow::anyhow!("{} must be a number, got '{}'", name, v))
        })
        .transpose()
}
