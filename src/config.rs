use std::net::SocketAddr;

use anyhow::{Context, Result};
use dotenvy::dotenv;

use crate::services::content_rules::DEFAULT_FORBIDDEN_CONTENT;

const DEFAULT_ADDR: &str = "127.0.0.1:3000";
const DEFAULT_DATABASE: &str = "csv_stats.db";

fn default_max_body_size() -> usize {
    // 10 MB in bytes
    10 * 1024 * 1024
}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    /// SQLite file path, or `:memory:`.
    pub database: String,
    pub max_body_size: usize,
    pub forbidden_content: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // Load .env file first
        dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let addr = lookup("CSV_STATS_ADDR")
            .unwrap_or_else(|| DEFAULT_ADDR.to_string())
            .parse()
            .context("Failed to parse CSV_STATS_ADDR")?;

        let database = lookup("CSV_STATS_DATABASE").unwrap_or_else(|| DEFAULT_DATABASE.to_string());

        let max_body_size = match lookup("CSV_STATS_MAX_BODY_BYTES") {
            Some(value) => value
                .trim()
                .parse()
                .with_context(|| format!("Failed to parse CSV_STATS_MAX_BODY_BYTES: {}", value))?,
            None => default_max_body_size(),
        };

        let forbidden_content = match lookup("CSV_STATS_FORBIDDEN_CONTENT") {
            Some(list) => list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            None => DEFAULT_FORBIDDEN_CONTENT.iter().map(|s| s.to_string()).collect(),
        };

        Ok(Config {
            addr,
            database,
            max_body_size,
            forbidden_content,
        })
    }
}
