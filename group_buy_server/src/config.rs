use std::{env, str::FromStr};

use gb_common::helpers::parse_boolean_flag;
use group_buy_engine::{RoundingPolicy, SettlementConfig};
use log::*;

const DEFAULT_GB_HOST: &str = "127.0.0.1";
const DEFAULT_GB_PORT: u16 = 8370;
const DEFAULT_GB_DATABASE_URL: &str = "sqlite://data/group_buy.db";
const DEFAULT_MAX_CONNECTIONS: u32 = 25;
const DEFAULT_MAX_SETTLEMENT_ATTEMPTS: usize = 3;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub max_connections: u32,
    /// If true, the join that fills a group triggers its draw straight away. Otherwise draws must be requested via
    /// `POST /groups/{id}/draw`.
    pub auto_draw_on_quorum: bool,
    pub settlement: SettlementConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_GB_HOST.to_string(),
            port: DEFAULT_GB_PORT,
            database_url: DEFAULT_GB_DATABASE_URL.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            auto_draw_on_quorum: true,
            settlement: SettlementConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("GB_HOST").ok().unwrap_or_else(|| DEFAULT_GB_HOST.into());
        let port = parse_env("GB_PORT", DEFAULT_GB_PORT);
        let database_url = env::var("GB_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ GB_DATABASE_URL is not set. Using the default, {DEFAULT_GB_DATABASE_URL}");
            DEFAULT_GB_DATABASE_URL.to_string()
        });
        let max_connections = parse_env("GB_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS);
        let auto_draw_on_quorum = parse_boolean_flag(env::var("GB_AUTO_DRAW_ON_QUORUM").ok(), true);
        let rounding_policy = parse_env("GB_ROUNDING_POLICY", RoundingPolicy::default());
        let max_attempts = parse_env("GB_MAX_SETTLEMENT_ATTEMPTS", DEFAULT_MAX_SETTLEMENT_ATTEMPTS);
        if max_attempts == 0 {
            warn!("🪛️ GB_MAX_SETTLEMENT_ATTEMPTS is zero. Each draw will still be attempted once.");
        }
        Self {
            host,
            port,
            database_url,
            max_connections,
            auto_draw_on_quorum,
            settlement: SettlementConfig { rounding_policy, max_attempts },
        }
    }
}

/// Reads and parses an environment variable. Invalid values are logged and replaced with the default.
fn parse_env<T>(name: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(s) => s.parse::<T>().unwrap_or_else(|e| {
            error!("🪛️ {s} is not a valid value for {name}. {e} Using the default, {default}, instead.");
            default
        }),
        Err(_) => default,
    }
}
